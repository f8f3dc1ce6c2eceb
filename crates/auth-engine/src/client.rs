//! Stateless account operations outside the sign-in challenge.

use crate::error::AuthResult;
use api_gateway::ApiGateway;
use serde::{Deserialize, Serialize};

/// How an account is allowed to authenticate, as configured server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityOption {
    /// Password alone signs the user in.
    #[serde(rename = "password_only")]
    PasswordOnly,
    /// Password plus a one-time code.
    #[serde(rename = "password_2fa")]
    Password2fa,
    /// Only the SSO exchange is accepted.
    #[serde(rename = "enforce_sso")]
    EnforceSso,
}

/// Sign-up payload. The two registration paths are distinct variants,
/// so a request can never carry a half-filled mix of both.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SignUpRequest {
    #[serde(rename_all = "camelCase")]
    Email {
        email: String,
        password: String,
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    Invite {
        invite_code: String,
        password: String,
        name: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResetTokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginOptions {
    security_option: SecurityOption,
}

/// Client for account endpoints that carry no protocol state.
#[derive(Clone)]
pub struct AuthClient {
    gateway: ApiGateway,
}

impl AuthClient {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> AuthResult<()> {
        self.gateway.post_no_content("/auth/sign-up", request).await?;
        tracing::info!("Account registered");
        Ok(())
    }

    /// Look up how an account is allowed to authenticate, so the form
    /// can route straight to SSO when passwords are disabled.
    pub async fn login_options(&self, email: &str) -> AuthResult<SecurityOption> {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("email", email)
            .finish();
        let options: LoginOptions = self
            .gateway
            .get(&format!("/auth/login-options?{query}"))
            .await?;
        Ok(options.security_option)
    }

    pub async fn forgot_password(&self, email: &str) -> AuthResult<()> {
        self.gateway
            .post_no_content("/auth/forgot-password", &ForgotPasswordRequest { email })
            .await?;
        Ok(())
    }

    /// Check a reset link's token before showing the new-password form.
    pub async fn validate_reset_token(&self, token: &str) -> AuthResult<()> {
        self.gateway
            .post_no_content(
                "/auth/reset-password/validate-token",
                &ValidateResetTokenRequest { token },
            )
            .await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> AuthResult<()> {
        self.gateway
            .post_no_content("/auth/reset-password", &ResetPasswordRequest { token, password })
            .await?;
        tracing::info!("Password reset completed");
        Ok(())
    }

    /// Best-effort server-side logout. The local token is removed even
    /// when the call fails; a dead session must not survive locally.
    pub async fn sign_out(&self) -> AuthResult<()> {
        if let Err(error) = self
            .gateway
            .post_no_content("/auth/sign-out", &serde_json::json!({}))
            .await
        {
            if !error.is_silent() {
                tracing::warn!(error = %error, "Server-side sign-out failed, clearing local session anyway");
            }
        }
        self.gateway
            .store()
            .remove_token()
            .map_err(session_store::SessionStoreError::from)?;
        tracing::info!("Signed out");
        Ok(())
    }
}
