//! Request/response envelope shapes used by the console API.

use serde::{Deserialize, Serialize};

/// Request envelope: every request body is wrapped as `{ "data": T }`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn wrap(data: T) -> Self {
        Self { data }
    }
}

/// Response envelope: `{ "data": T, "meta": { ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<Meta>,
}

/// Response metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub page: Option<Page>,
}

/// Pagination window carried by list responses.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_envelope_with_page_meta() {
        let json = r#"{
            "data": [1, 2, 3],
            "meta": { "page": { "limit": 10, "offset": 0, "total": 3 } }
        }"#;

        let envelope: ResponseEnvelope<Vec<u32>> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data, vec![1, 2, 3]);

        let page = envelope.meta.unwrap().page.unwrap();
        assert_eq!(page.limit, 10);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_response_envelope_without_meta() {
        let json = r#"{ "data": { "token": "abc" } }"#;
        let envelope: ResponseEnvelope<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(envelope.meta.is_none());
        assert_eq!(envelope.data["token"], "abc");
    }

    #[test]
    fn test_request_envelope_wraps_data() {
        let body = serde_json::to_value(Envelope::wrap(serde_json::json!({
            "email": "admin@example.com"
        })))
        .unwrap();
        assert_eq!(body["data"]["email"], "admin@example.com");
    }
}
