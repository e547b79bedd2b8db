//! Page-creation body rewrite.
//!
//! Browser callers send page properties (and children) as a JSON-encoded
//! string in a single field, e.g.
//!
//! ```text
//! {"parent": {...}, "propertiesAndChildrenString": "{\"properties\":{...},\"children\":[...]}"}
//! ```
//!
//! and the upstream expects them as structured fields:
//!
//! ```text
//! {"parent": {...}, "properties": {...}, "children": [...]}
//! ```
//!
//! Output fields are copied only when present in the source; nothing is
//! null-filled.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{RewriteConfig, RewritePayload};

/// Errors that reject a page request before it reaches the upstream.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// Body is not JSON and strict mode is on.
    #[error("Invalid JSON body")]
    InvalidJson(#[source] serde_json::Error),

    /// The rewrite field does not decode to a JSON value, or decodes to null.
    #[error("Invalid {field}")]
    InvalidField { field: String, details: String },

    /// The rewrite produced no properties and they are required.
    #[error("Missing properties in {field}")]
    MissingProperties { field: String },
}

impl RewriteError {
    /// Human-readable cause, reported as `details` to the caller.
    pub fn details(&self) -> Option<String> {
        match self {
            RewriteError::InvalidJson(e) => Some(e.to_string()),
            RewriteError::InvalidField { details, .. } => Some(details.clone()),
            RewriteError::MissingProperties { .. } => None,
        }
    }
}

/// What to send upstream for a page request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageBody {
    /// No body.
    Empty,
    /// Forward the inbound bytes unchanged (not JSON, lenient mode).
    Raw,
    /// Valid JSON without a rewrite field, re-serialized as-is.
    Json(Value),
    /// The reshaped body.
    Rewritten(Value),
}

/// Rewrite a page request body according to `config`.
pub fn rewrite_page_body(config: &RewriteConfig, body: &[u8]) -> Result<PageBody, RewriteError> {
    if body.is_empty() {
        return Ok(PageBody::Empty);
    }

    let parsed: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) if config.strict_json => return Err(RewriteError::InvalidJson(e)),
        Err(e) => {
            tracing::debug!(error = %e, "Page body is not JSON, forwarding raw");
            return Ok(PageBody::Raw);
        }
    };

    let mut outer = match parsed {
        Value::Object(outer) => outer,
        other => return Ok(PageBody::Json(other)),
    };

    // a field that is not a non-empty string is not a rewrite request
    let encoded = match outer.get(&config.field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };
    let Some(encoded) = encoded else {
        return Ok(PageBody::Json(Value::Object(outer)));
    };

    // a nested scalar or array carries no properties or children; null is
    // rejected
    let inner = match serde_json::from_str::<Value>(&encoded) {
        Ok(Value::Object(inner)) => Some(inner),
        Ok(Value::Null) => {
            return Err(invalid_field(
                config,
                "expected a JSON object, found null".to_string(),
            ))
        }
        Ok(_) => None,
        Err(e) => return Err(invalid_field(config, e.to_string())),
    };

    let (properties, children) = match (config.payload, inner) {
        (RewritePayload::PropertiesAndChildren, Some(mut inner)) => (
            take_present(&mut inner, "properties"),
            take_present(&mut inner, "children"),
        ),
        (RewritePayload::PropertiesAndChildren, None) => (None, None),
        (RewritePayload::Properties, inner) => (
            inner.map(Value::Object),
            take_present(&mut outer, "children"),
        ),
    };

    if config.require_properties && properties.is_none() {
        return Err(RewriteError::MissingProperties {
            field: config.field.clone(),
        });
    }

    let mut out = Map::new();
    if let Some(parent) = take_present(&mut outer, "parent") {
        out.insert("parent".to_string(), parent);
    }
    if let Some(properties) = properties {
        out.insert("properties".to_string(), properties);
    }
    match children {
        Some(children) => {
            out.insert("children".to_string(), children);
        }
        None if config.default_children => {
            out.insert("children".to_string(), Value::Array(Vec::new()));
        }
        None => {}
    }
    // archived is copied whenever the key exists, false and null included
    if let Some(archived) = outer.remove("archived") {
        out.insert("archived".to_string(), archived);
    }

    Ok(PageBody::Rewritten(Value::Object(out)))
}

/// Remove `key` from `map`, treating an explicit null as absent.
fn take_present(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}

fn invalid_field(config: &RewriteConfig, details: String) -> RewriteError {
    RewriteError::InvalidField {
        field: config.field.clone(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rewrite(config: &RewriteConfig, body: Value) -> Result<PageBody, RewriteError> {
        rewrite_page_body(config, body.to_string().as_bytes())
    }

    #[test]
    fn reshapes_properties_and_children() {
        let config = RewriteConfig::default();
        let body = json!({
            "parent": {"database_id": "d1"},
            "propertiesAndChildrenString": "{\"properties\":{\"A\":1},\"children\":[]}"
        });

        let out = rewrite(&config, body).unwrap();

        assert_eq!(
            out,
            PageBody::Rewritten(json!({
                "parent": {"database_id": "d1"},
                "properties": {"A": 1},
                "children": []
            }))
        );
    }

    #[test]
    fn absent_fields_stay_absent() {
        let config = RewriteConfig::default();
        let body = json!({"propertiesAndChildrenString": "{\"properties\":{\"A\":1}}"});

        let out = rewrite(&config, body).unwrap();

        assert_eq!(out, PageBody::Rewritten(json!({"properties": {"A": 1}})));
    }

    #[test]
    fn null_parent_is_treated_as_absent() {
        let config = RewriteConfig::default();
        let body = json!({
            "parent": null,
            "propertiesAndChildrenString": "{\"properties\":{\"A\":1},\"children\":null}"
        });

        let out = rewrite(&config, body).unwrap();

        assert_eq!(out, PageBody::Rewritten(json!({"properties": {"A": 1}})));
    }

    #[test]
    fn archived_is_copied_even_when_false() {
        let config = RewriteConfig::default();
        let body = json!({
            "parent": {"page_id": "p"},
            "archived": false,
            "extra": "dropped",
            "propertiesAndChildrenString": "{\"properties\":{}}"
        });

        let out = rewrite(&config, body).unwrap();

        assert_eq!(
            out,
            PageBody::Rewritten(json!({
                "parent": {"page_id": "p"},
                "properties": {},
                "archived": false
            }))
        );
    }

    #[test]
    fn default_children_fills_empty_list() {
        let config = RewriteConfig {
            default_children: true,
            ..RewriteConfig::default()
        };
        let body = json!({"propertiesAndChildrenString": "{\"properties\":{\"A\":1}}"});

        let out = rewrite(&config, body).unwrap();

        assert_eq!(
            out,
            PageBody::Rewritten(json!({"properties": {"A": 1}, "children": []}))
        );
    }

    #[test]
    fn properties_payload_takes_children_from_outer_body() {
        let config = RewriteConfig {
            field: "propertiesString".into(),
            payload: RewritePayload::Properties,
            ..RewriteConfig::default()
        };
        let body = json!({
            "parent": {"database_id": "d1"},
            "children": [{"type": "paragraph"}],
            "propertiesString": "{\"Name\":{\"title\":[]}}"
        });

        let out = rewrite(&config, body).unwrap();

        assert_eq!(
            out,
            PageBody::Rewritten(json!({
                "parent": {"database_id": "d1"},
                "properties": {"Name": {"title": []}},
                "children": [{"type": "paragraph"}]
            }))
        );
    }

    #[test]
    fn unparsable_nested_string_is_rejected() {
        let config = RewriteConfig::default();
        let body = json!({"propertiesAndChildrenString": "{not json"});

        let err = rewrite(&config, body).unwrap_err();

        assert_eq!(err.to_string(), "Invalid propertiesAndChildrenString");
        assert!(err.details().is_some());
    }

    #[test]
    fn nested_non_object_carries_no_fields() {
        let config = RewriteConfig::default();

        for nested in ["[1,2]", "7", "\"text\""] {
            let body = json!({
                "parent": {"database_id": "d1"},
                "propertiesAndChildrenString": nested
            });
            assert_eq!(
                rewrite(&config, body).unwrap(),
                PageBody::Rewritten(json!({"parent": {"database_id": "d1"}})),
                "nested value {nested}"
            );
        }
    }

    #[test]
    fn nested_non_object_obeys_require_properties() {
        let config = RewriteConfig {
            require_properties: true,
            ..RewriteConfig::default()
        };
        let body = json!({"propertiesAndChildrenString": "[1,2]"});

        let err = rewrite(&config, body).unwrap_err();

        assert!(matches!(err, RewriteError::MissingProperties { .. }));
    }

    #[test]
    fn nested_null_is_rejected() {
        let config = RewriteConfig::default();
        let err = rewrite(&config, json!({"propertiesAndChildrenString": "null"})).unwrap_err();

        assert_eq!(err.to_string(), "Invalid propertiesAndChildrenString");
        assert_eq!(err.details().unwrap(), "expected a JSON object, found null");
    }

    #[test]
    fn non_string_field_is_forwarded_as_json() {
        let config = RewriteConfig::default();

        for field in [json!(7), json!({"properties": {}}), json!(null), json!(true)] {
            let body = json!({
                "parent": {"database_id": "d1"},
                "propertiesAndChildrenString": field
            });
            assert_eq!(rewrite(&config, body.clone()).unwrap(), PageBody::Json(body));
        }
    }

    #[test]
    fn missing_properties_proceeds_unless_required() {
        let body = json!({"propertiesAndChildrenString": "{\"children\":[]}"});

        let lenient = RewriteConfig::default();
        assert_eq!(
            rewrite(&lenient, body.clone()).unwrap(),
            PageBody::Rewritten(json!({"children": []}))
        );

        let strict = RewriteConfig {
            require_properties: true,
            ..RewriteConfig::default()
        };
        let err = rewrite(&strict, body).unwrap_err();
        assert_eq!(err.to_string(), "Missing properties in propertiesAndChildrenString");
    }

    #[test]
    fn body_without_field_is_forwarded_as_json() {
        let config = RewriteConfig::default();
        let body = json!({"parent": {"page_id": "p"}, "properties": {"A": 1}});

        let out = rewrite(&config, body.clone()).unwrap();

        assert_eq!(out, PageBody::Json(body));
    }

    #[test]
    fn empty_field_is_not_rewritten() {
        let config = RewriteConfig::default();
        let body = json!({"propertiesAndChildrenString": ""});
        assert_eq!(rewrite(&config, body.clone()).unwrap(), PageBody::Json(body));
    }

    #[test]
    fn non_json_body_depends_on_strictness() {
        let lenient = RewriteConfig::default();
        assert_eq!(rewrite_page_body(&lenient, b"a=1&b=2").unwrap(), PageBody::Raw);

        let strict = RewriteConfig {
            strict_json: true,
            ..RewriteConfig::default()
        };
        let err = rewrite_page_body(&strict, b"a=1&b=2").unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON body");
        assert!(err.details().is_some());
    }

    #[test]
    fn empty_body_is_empty() {
        let strict = RewriteConfig {
            strict_json: true,
            ..RewriteConfig::default()
        };
        assert_eq!(rewrite_page_body(&strict, b"").unwrap(), PageBody::Empty);
    }
}
