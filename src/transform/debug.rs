//! Debug metadata for upstream error bodies.
//!
//! When enabled, an upstream JSON object whose text contains the configured
//! marker (`invalid_request_url` by default) gets a `debug` object describing
//! how the proxy resolved the request. Anything else passes through untouched.

use serde::Serialize;
use serde_json::Value;

/// How the proxy resolved the request that produced an upstream error.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    /// Inbound URL as seen by the proxy.
    pub original_url: String,
    /// Resolved upstream URL the request was sent to.
    pub processed_url: String,
    /// API path extracted from the inbound URL.
    pub notion_path: String,
}

/// Returns the re-serialized body when the metadata was merged, `None` when
/// the body should be returned byte-for-byte.
pub fn inject_debug(body: &[u8], marker: &str, info: &DebugInfo) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(body).ok()?;
    if !text.contains(marker) {
        return None;
    }

    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(text) else {
        return None;
    };

    let debug = serde_json::to_value(info).ok()?;
    object.insert("debug".to_string(), debug);
    serde_json::to_vec(&Value::Object(object)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> DebugInfo {
        DebugInfo {
            original_url: "http://localhost:8080/v1/nope".into(),
            processed_url: "https://api.notion.com/v1/nope".into(),
            notion_path: "/v1/nope".into(),
        }
    }

    #[test]
    fn merges_debug_into_marked_error() {
        let body = json!({
            "object": "error",
            "status": 400,
            "code": "invalid_request_url",
            "message": "Invalid request URL."
        });

        let out = inject_debug(body.to_string().as_bytes(), "invalid_request_url", &info()).unwrap();
        let out: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(out["code"], "invalid_request_url");
        assert_eq!(
            out["debug"],
            json!({
                "original_url": "http://localhost:8080/v1/nope",
                "processed_url": "https://api.notion.com/v1/nope",
                "notion_path": "/v1/nope"
            })
        );
    }

    #[test]
    fn unmarked_bodies_pass_through() {
        let body = json!({"object": "list", "results": []}).to_string();
        assert!(inject_debug(body.as_bytes(), "invalid_request_url", &info()).is_none());
    }

    #[test]
    fn marked_non_json_passes_through() {
        let body = b"<html>invalid_request_url</html>";
        assert!(inject_debug(body, "invalid_request_url", &info()).is_none());
    }

    #[test]
    fn marked_json_array_passes_through() {
        let body = br#"["invalid_request_url"]"#;
        assert!(inject_debug(body, "invalid_request_url", &info()).is_none());
    }
}
