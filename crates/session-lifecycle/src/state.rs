//! Single-writer container for per-tab session state.
//!
//! All mutation goes through the named operations here; nothing else
//! assigns to the profile slot.

use crate::Profile;
use std::sync::Mutex;

#[derive(Default)]
struct StateInner {
    profile: Option<Profile>,
    mfa_setup_pending: bool,
    /// Token the current profile was fetched with, so bootstrap can
    /// tell "already done for this token" from "token changed".
    bootstrapped_token: Option<String>,
}

/// Owned session state, injected into the components that need it.
#[derive(Default)]
pub struct SessionState {
    inner: Mutex<StateInner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current profile, if one is installed.
    pub fn profile(&self) -> Option<Profile> {
        self.inner.lock().unwrap().profile.clone()
    }

    pub fn has_profile(&self) -> bool {
        self.inner.lock().unwrap().profile.is_some()
    }

    /// One-shot flag: true at most once after a bootstrap found an
    /// account that must enroll a second factor.
    pub fn take_mfa_setup_flag(&self) -> bool {
        std::mem::take(&mut self.inner.lock().unwrap().mfa_setup_pending)
    }

    /// Drop everything at once; the logout path calls this so no stale
    /// profile survives into the next sign-in.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = StateInner::default();
        tracing::debug!("Session state cleared");
    }

    pub(crate) fn install_profile(&self, profile: Profile, token: &str) {
        let mfa_setup = profile.needs_mfa_setup();
        let mut inner = self.inner.lock().unwrap();
        inner.mfa_setup_pending = mfa_setup;
        inner.bootstrapped_token = Some(token.to_string());
        inner.profile = Some(profile);
    }

    pub(crate) fn clear_profile(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.profile = None;
        inner.bootstrapped_token = None;
        inner.mfa_setup_pending = false;
    }

    pub(crate) fn is_bootstrapped_for(&self, token: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.profile.is_some() && inner.bootstrapped_token.as_deref() == Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_engine::SecurityOption;
    use uuid::Uuid;

    fn sample_profile(security_option: SecurityOption, totp_configured: bool) -> Profile {
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
    fn test_install_and_clear_profile() {
        let state = SessionState::new();
        assert!(!state.has_profile());

        state.install_profile(sample_profile(SecurityOption::PasswordOnly, false), "tok-1");
        assert!(state.has_profile());
        assert!(state.is_bootstrapped_for("tok-1"));
        assert!(!state.is_bootstrapped_for("tok-2"));

        state.clear_profile();
        assert!(!state.has_profile());
        assert!(!state.is_bootstrapped_for("tok-1"));
    }

    #[test]
    fn test_mfa_setup_flag_is_one_shot() {
        let state = SessionState::new();
        state.install_profile(sample_profile(SecurityOption::Password2fa, false), "tok-1");

        assert!(state.take_mfa_setup_flag());
        assert!(!state.take_mfa_setup_flag());
    }

    #[test]
    fn test_enrolled_account_raises_no_setup_flag() {
        let state = SessionState::new();
        state.install_profile(sample_profile(SecurityOption::Password2fa, true), "tok-1");
        assert!(!state.take_mfa_setup_flag());
    }

    #[test]
    fn test_clear_drops_flag_and_fingerprint() {
        let state = SessionState::new();
        state.install_profile(sample_profile(SecurityOption::Password2fa, false), "tok-1");

        state.clear();
        assert!(!state.has_profile());
        assert!(!state.take_mfa_setup_flag());
        assert!(!state.is_bootstrapped_for("tok-1"));
    }
}
