//! Pure routing decision for every navigation.
//!
//! `decide` is total: it always answers allow-or-redirect, and it
//! reads nothing but its inputs.

use crate::Profile;

pub const SIGN_IN_PATH: &str = "/auth/sign-in/";
pub const SIGN_UP_PATH: &str = "/auth/sign-up/";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password/";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password/";
pub const SSO_CALLBACK_PATH: &str = "/auth/sso/callback/";
pub const DEFAULT_LANDING_PATH: &str = "/modules/";

/// What to do with the requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the requested route.
    Allow,
    /// Navigate to this target instead.
    Redirect(String),
}

/// Decide whether `path_and_query` may render for this session.
///
/// * A pending SSO exchange holds the callback route open (loading
///   state) until the exchange settles.
/// * Signed-in users never see auth pages or the bare root; they land
///   on `next` when the sign-in page carried one, else on the default
///   landing page.
/// * Signed-out users are sent to sign-in with the requested location
///   preserved as `next`, except bare aliases of the other auth entry
///   points, which go to their real pages.
pub fn decide(
    profile: Option<&Profile>,
    path_and_query: &str,
    pending_sso_exchange: bool,
    next_param: Option<&str>,
) -> RouteDecision {
    let (path, query) = split_query(path_and_query);
    let path = normalize(path);
    let in_auth_group = path.starts_with("/auth/");

    if pending_sso_exchange && path == SSO_CALLBACK_PATH {
        return RouteDecision::Allow;
    }

    if profile.is_some() {
        if in_auth_group || path == "/" {
            let target = next_param
                .map(str::trim)
                .filter(|next| !next.is_empty())
                .unwrap_or(DEFAULT_LANDING_PATH);
            return RouteDecision::Redirect(target.to_string());
        }
        return RouteDecision::Allow;
    }

    if in_auth_group {
        return RouteDecision::Allow;
    }

    if let Some(entry) = alternate_entry(&path) {
        return RouteDecision::Redirect(match query {
            Some(query) => format!("{entry}?{query}"),
            None => entry.to_string(),
        });
    }

    let next: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", path_and_query)
        .finish();
    RouteDecision::Redirect(format!("{SIGN_IN_PATH}?{next}"))
}

fn split_query(path_and_query: &str) -> (&str, Option<&str>) {
    match path_and_query.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path_and_query, None),
    }
}

/// Leading and trailing slash, so `/auth/sign-in` and `/auth/sign-in/`
/// compare equal.
fn normalize(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Bare aliases of the auth entry points, reachable while signed out.
fn alternate_entry(path: &str) -> Option<&'static str> {
    match path {
        "/sign-up/" => Some(SIGN_UP_PATH),
        "/forgot-password/" => Some(FORGOT_PASSWORD_PATH),
        "/reset-password/" => Some(RESET_PASSWORD_PATH),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_engine::SecurityOption;
    use uuid::Uuid;

    fn signed_in() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "ada@steward.test".to_string(),
            role: "admin".to_string(),
            security_option: SecurityOption::PasswordOnly,
            totp_configured: false,
            module_access: vec![],
            project_access: vec![],
        }
    }

    #[test]
    fn test_signed_out_app_path_redirects_to_sign_in_with_next() {
        let decision = decide(None, "/modules/projects", false, None);
        assert_eq!(
            decision,
            RouteDecision::Redirect("/auth/sign-in/?next=%2Fmodules%2Fprojects".to_string())
        );
    }

    #[test]
    fn test_signed_out_next_preserves_query_string() {
        let decision = decide(None, "/modules/cluster/nodes/?page=2", false, None);
        assert_eq!(
            decision,
            RouteDecision::Redirect(
                "/auth/sign-in/?next=%2Fmodules%2Fcluster%2Fnodes%2F%3Fpage%3D2".to_string()
            )
        );
    }

    #[test]
    fn test_signed_in_auth_path_honors_next_param() {
        let profile = signed_in();
        let decision = decide(
            Some(&profile),
            "/auth/sign-in/?next=/modules/cluster/nodes/",
            false,
            Some("/modules/cluster/nodes/"),
        );
        assert_eq!(
            decision,
            RouteDecision::Redirect("/modules/cluster/nodes/".to_string())
        );
    }

    #[test]
    fn test_signed_in_auth_path_defaults_to_landing_page() {
        let profile = signed_in();
        let decision = decide(Some(&profile), "/auth/sign-in/", false, None);
        assert_eq!(
            decision,
            RouteDecision::Redirect(DEFAULT_LANDING_PATH.to_string())
        );
    }

    #[test]
    fn test_signed_in_root_redirects_to_landing_page() {
        let profile = signed_in();
        let decision = decide(Some(&profile), "/", false, None);
        assert_eq!(
            decision,
            RouteDecision::Redirect(DEFAULT_LANDING_PATH.to_string())
        );
    }

    #[test]
    fn test_signed_in_app_path_is_allowed() {
        let profile = signed_in();
        assert_eq!(
            decide(Some(&profile), "/modules/projects/", false, None),
            RouteDecision::Allow
        );
    }

    #[test]
    fn test_signed_out_auth_path_is_allowed() {
        assert_eq!(decide(None, "/auth/sign-in/", false, None), RouteDecision::Allow);
        assert_eq!(
            decide(None, "/auth/forgot-password/", false, None),
            RouteDecision::Allow
        );
    }

    #[test]
    fn test_pending_sso_exchange_holds_callback_open() {
        assert_eq!(
            decide(None, "/auth/sso/callback/", true, None),
            RouteDecision::Allow
        );
        // Without a pending exchange, the callback is just another
        // auth-group page.
        assert_eq!(
            decide(None, "/auth/sso/callback/", false, None),
            RouteDecision::Allow
        );
    }

    #[test]
    fn test_bare_aliases_redirect_to_their_entry_points() {
        assert_eq!(
            decide(None, "/sign-up", false, None),
            RouteDecision::Redirect(SIGN_UP_PATH.to_string())
        );
        assert_eq!(
            decide(None, "/forgot-password/", false, None),
            RouteDecision::Redirect(FORGOT_PASSWORD_PATH.to_string())
        );
        assert_eq!(
            decide(None, "/reset-password?token=abc", false, None),
            RouteDecision::Redirect("/auth/reset-password/?token=abc".to_string())
        );
    }

    #[test]
    fn test_trailing_slash_does_not_change_the_decision() {
        let profile = signed_in();
        assert_eq!(
            decide(Some(&profile), "/auth/sign-in", false, None),
            decide(Some(&profile), "/auth/sign-in/", false, None)
        );
    }

    #[test]
    fn test_blank_next_param_falls_back_to_landing_page() {
        let profile = signed_in();
        assert_eq!(
            decide(Some(&profile), "/auth/sign-in/", false, Some("  ")),
            RouteDecision::Redirect(DEFAULT_LANDING_PATH.to_string())
        );
    }
}
