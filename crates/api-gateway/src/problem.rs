//! RFC-7807-style problem objects returned by the console API.

use serde::Deserialize;
use std::fmt;

/// Problem detail object: `{ type?, title, status, code?, detail?,
/// displayLevel? }`, with a validation variant adding `errors`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Problem {
    #[serde(rename = "type")]
    pub problem_type: Option<String>,
    pub title: String,
    pub status: u16,
    pub code: Option<String>,
    pub detail: Option<String>,
    pub display_level: Option<String>,
    /// Structured field errors on validation problems.
    pub errors: Vec<FieldViolation>,
    /// Seconds during which resubmission is server-side throttled
    /// (extension member used by the 2FA verify endpoint).
    pub request_blocking_duration: Option<u64>,
}

/// A single field-level validation error.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldViolation {
    pub path: String,
    pub code: String,
    pub message: String,
}

impl Problem {
    /// Parse a problem from an error response body, synthesizing a
    /// minimal one when the body is not a problem object.
    pub fn from_body(status: u16, body: &str) -> Self {
        let mut problem = serde_json::from_str::<Problem>(body).unwrap_or_default();
        if problem.title.is_empty() {
            problem.title = format!("HTTP {}", status);
        }
        if problem.status == 0 {
            problem.status = status;
        }
        problem
    }

    /// True if the problem carries field-level validation errors.
    pub fn is_validation(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.title, code),
            None => write!(f, "{}", self.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_problem() {
        let body = r#"{
            "type": "https://steward-console.dev/problems/conflict",
            "title": "Node name already taken",
            "status": 409,
            "code": "node_conflict",
            "detail": "A node with this name exists in the cluster",
            "displayLevel": "toast"
        }"#;

        let problem = Problem::from_body(409, body);
        assert_eq!(problem.title, "Node name already taken");
        assert_eq!(problem.status, 409);
        assert_eq!(problem.code.as_deref(), Some("node_conflict"));
        assert_eq!(problem.display_level.as_deref(), Some("toast"));
        assert!(!problem.is_validation());
    }

    #[test]
    fn test_parse_validation_problem() {
        let body = r#"{
            "title": "Validation failed",
            "status": 400,
            "errors": [
                { "path": "email", "code": "invalid_format", "message": "Not an email" },
                { "path": "password", "code": "too_short", "message": "Too short" }
            ]
        }"#;

        let problem = Problem::from_body(400, body);
        assert!(problem.is_validation());
        assert_eq!(problem.errors.len(), 2);
        assert_eq!(problem.errors[0].path, "email");
    }

    #[test]
    fn test_parse_blocking_duration_extension() {
        let body = r#"{
            "title": "Too many attempts",
            "status": 400,
            "requestBlockingDuration": 30
        }"#;

        let problem = Problem::from_body(400, body);
        assert_eq!(problem.request_blocking_duration, Some(30));
    }

    #[test]
    fn test_non_json_body_synthesizes_problem() {
        let problem = Problem::from_body(502, "<html>Bad Gateway</html>");
        assert_eq!(problem.title, "HTTP 502");
        assert_eq!(problem.status, 502);
    }

    #[test]
    fn test_display_includes_code() {
        let problem = Problem {
            title: "Forbidden".to_string(),
            code: Some("no_access".to_string()),
            status: 403,
            ..Default::default()
        };
        assert_eq!(problem.to_string(), "Forbidden (no_access)");
    }
}
