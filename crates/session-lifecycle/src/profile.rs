//! The signed-in user's identity as reported by the server.

use auth_engine::SecurityOption;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity profile fetched once per session. Absent at boot,
/// populated by [`crate::SessionBootstrap`], cleared on logout or
/// session invalidation. Never cached across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub security_option: SecurityOption,
    /// Whether a TOTP secret is enrolled for this account.
    #[serde(default)]
    pub totp_configured: bool,
    /// Modules this user may open.
    #[serde(default)]
    pub module_access: Vec<String>,
    /// Projects this user may open.
    #[serde(default)]
    pub project_access: Vec<Uuid>,
}

impl Profile {
    /// True when the account mandates a second factor but none is
    /// enrolled yet. Bootstrap raises the one-shot setup flag on it.
    pub fn needs_mfa_setup(&self) -> bool {
        self.security_option == SecurityOption::Password2fa && !self.totp_configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(security_option: SecurityOption, totp_configured: bool) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "ada@steward.test".to_string(),
            role: "admin".to_string(),
            security_option,
            totp_configured,
            module_access: vec![],
            project_access: vec![],
        }
    }

    #[test]
    fn test_mfa_setup_needed_only_without_enrolled_totp() {
        assert!(profile(SecurityOption::Password2fa, false).needs_mfa_setup());
        assert!(!profile(SecurityOption::Password2fa, true).needs_mfa_setup());
        assert!(!profile(SecurityOption::PasswordOnly, false).needs_mfa_setup());
        assert!(!profile(SecurityOption::EnforceSso, false).needs_mfa_setup());
    }

    #[test]
    fn test_deserialize_wire_profile() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "6a1f0f76-6a86-47f4-9f0a-6d0fd2a8c1de",
            "email": "ada@steward.test",
            "role": "operator",
            "securityOption": "password_2fa",
            "totpConfigured": true,
            "moduleAccess": ["cluster", "projects"],
            "projectAccess": []
        }))
        .unwrap();

        assert_eq!(profile.role, "operator");
        assert_eq!(profile.security_option, SecurityOption::Password2fa);
        assert!(!profile.needs_mfa_setup());
        assert_eq!(profile.module_access, vec!["cluster", "projects"]);
    }

    #[test]
    fn test_optional_fields_default() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "6a1f0f76-6a86-47f4-9f0a-6d0fd2a8c1de",
            "email": "ada@steward.test",
            "role": "viewer",
            "securityOption": "password_only"
        }))
        .unwrap();

        assert!(!profile.totp_configured);
        assert!(profile.module_access.is_empty());
    }
}
