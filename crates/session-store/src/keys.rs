//! Storage key constants.

/// Storage keys used by the console client
pub struct StorageKeys;

impl StorageKeys {
    /// Session bearer token
    pub const SESSION_TOKEN: &'static str = "session_token";

    /// Persisted UI language tag
    pub const UI_LANGUAGE: &'static str = "ui_language";
}
