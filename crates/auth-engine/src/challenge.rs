//! Sign-in challenge state machine using rust-fsm.
//!
//! The protocol is one-directional: credentials are submitted once,
//! an optional second-factor step follows, and the only way back is an
//! explicit abandon. The machine enforces the ordering; the session
//! wrapper holds the step data (pending MFA token, throttle deadline)
//! alongside it.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────────┐ SsoTokenDetected ┌───────────────┐
//! │     Idle     │ ───────────────► │ SsoExchanging │
//! └──────┬───────┘                  └───────┬───────┘
//!        │ MfaChallenged                    │ ExchangeSucceeded / ExchangeFailed
//!        ▼                                  ▼
//! ┌──────────────┐ CodeAccepted      Complete / Failed
//! │  MfaPending  │ ───────────────► Complete
//! └──────┬───────┘
//!        │ Abandon (also from Idle)   CodeRejected loops on MfaPending
//!        ▼
//!      Idle
//! ```
//!
//! `Idle --CredentialsAccepted--> Complete` covers accounts that need
//! no second factor.

use crate::error::{AuthError, AuthResult};
use api_gateway::{ApiError, ApiGateway};
use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub challenge_machine(Idle)

    Idle => {
        CredentialsAccepted => Complete,
        MfaChallenged => MfaPending,
        SsoTokenDetected => SsoExchanging,
        Abandon => Idle
    },
    MfaPending => {
        CodeAccepted => Complete,
        CodeRejected => MfaPending,
        Abandon => Idle
    },
    SsoExchanging => {
        ExchangeSucceeded => Complete,
        ExchangeFailed => Failed
    }
}

use challenge_machine::Input as ChallengeInput;
use challenge_machine::State as ChallengeState;
use challenge_machine::StateMachine as ChallengeMachine;

/// Where the sign-in protocol currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePhase {
    /// Waiting for credentials.
    Idle,
    /// Credentials accepted; a second-factor code is required.
    MfaPending,
    /// An SSO cookie token is being exchanged.
    SsoExchanging,
    /// A session token was minted and persisted.
    Complete,
    /// The SSO exchange failed; the flow must restart from scratch.
    Failed,
}

impl From<&ChallengeState> for ChallengePhase {
    fn from(state: &ChallengeState) -> Self {
        match state {
            ChallengeState::Idle => ChallengePhase::Idle,
            ChallengeState::MfaPending => ChallengePhase::MfaPending,
            ChallengeState::SsoExchanging => ChallengePhase::SsoExchanging,
            ChallengeState::Complete => ChallengePhase::Complete,
            ChallengeState::Failed => ChallengePhase::Failed,
        }
    }
}

/// Outcome of a credentials submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStep {
    /// A token was minted and persisted; the session is live.
    Complete,
    /// The account requires a second factor; submit a code next.
    MfaRequired,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    token: Option<String>,
    mfa_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MfaVerifyRequest<'a> {
    mfa_token: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MfaResendRequest<'a> {
    mfa_token: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SsoExchangeRequest<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// One user's passage through the sign-in protocol.
///
/// The password is never held across an await point: it lives only in
/// the request that carries it. After a successful step the minted
/// token is handed straight to the session store. The throttle
/// deadline is in-memory only; a page reload clears it and the server
/// re-imposes it on the next attempt.
pub struct ChallengeSession {
    gateway: ApiGateway,
    machine: ChallengeMachine,
    mfa_token: Option<String>,
    blocked_until: Option<Instant>,
}

impl ChallengeSession {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            machine: ChallengeMachine::new(),
            mfa_token: None,
            blocked_until: None,
        }
    }

    pub fn phase(&self) -> ChallengePhase {
        ChallengePhase::from(self.machine.state())
    }

    /// Seconds until code resubmission is allowed again, if the server
    /// imposed a throttle.
    pub fn blocked_seconds_remaining(&self) -> Option<u64> {
        let until = self.blocked_until?;
        let now = Instant::now();
        if now >= until {
            None
        } else {
            Some((until - now).as_secs().max(1))
        }
    }

    /// Submit email and password. The server decides whether the
    /// account's security option demands a second factor; the client
    /// never skips a mandated MFA step locally.
    pub async fn submit_credentials(
        &mut self,
        email: &str,
        password: &str,
    ) -> AuthResult<SignInStep> {
        if !matches!(self.machine.state(), ChallengeState::Idle) {
            return Err(AuthError::OutOfOrder("credentials already submitted"));
        }

        let response: SignInResponse = self
            .gateway
            .post("/auth/sign-in", &SignInRequest { email, password })
            .await?;

        if let Some(mfa_token) = response.mfa_token {
            self.consume(ChallengeInput::MfaChallenged)?;
            self.mfa_token = Some(mfa_token);
            tracing::debug!("Credentials accepted, second factor required");
            return Ok(SignInStep::MfaRequired);
        }

        let token = response.token.ok_or_else(|| {
            AuthError::Api(ApiError::Decode(
                "sign-in response carried neither token nor mfaToken".to_string(),
            ))
        })?;
        self.consume(ChallengeInput::CredentialsAccepted)?;
        self.gateway.store().set_token(&token)?;
        tracing::info!("Signed in without second factor");
        Ok(SignInStep::Complete)
    }

    /// Submit the second-factor code for the pending challenge. An
    /// invalid code leaves the challenge pending so the user can retry;
    /// a server-side throttle blocks resubmission without a network
    /// call until it lapses.
    pub async fn submit_mfa_code(&mut self, code: &str) -> AuthResult<()> {
        if let Some(seconds) = self.blocked_seconds_remaining() {
            return Err(AuthError::MfaThrottled { seconds });
        }
        let mfa_token = self
            .mfa_token
            .clone()
            .ok_or(AuthError::OutOfOrder("no second-factor challenge pending"))?;

        let result: Result<TokenResponse, ApiError> = self
            .gateway
            .post(
                "/auth/sign-in/2fa",
                &MfaVerifyRequest {
                    mfa_token: &mfa_token,
                    code,
                },
            )
            .await;

        match result {
            Ok(response) => {
                self.consume(ChallengeInput::CodeAccepted)?;
                self.mfa_token = None;
                self.blocked_until = None;
                self.gateway.store().set_token(&response.token)?;
                tracing::info!("Second factor verified, signed in");
                Ok(())
            }
            Err(error) => {
                self.consume(ChallengeInput::CodeRejected)?;
                if let ApiError::Validation(problem) | ApiError::Api(problem) = &error {
                    if let Some(seconds) = problem.request_blocking_duration {
                        self.blocked_until =
                            Some(Instant::now() + Duration::from_secs(seconds));
                        tracing::warn!(seconds, "Code verification throttled by server");
                    }
                }
                Err(error.into())
            }
        }
    }

    /// Ask the server to send a fresh second-factor code.
    pub async fn resend_mfa_code(&self) -> AuthResult<()> {
        let mfa_token = self
            .mfa_token
            .as_deref()
            .ok_or(AuthError::OutOfOrder("no second-factor challenge pending"))?;
        self.gateway
            .post_no_content("/auth/send-2fa-token", &MfaResendRequest { mfa_token })
            .await?;
        Ok(())
    }

    /// Abandon the flow ("back to sign-in"). Drops the pending MFA
    /// token so it can never be replayed against a later challenge.
    pub fn reset(&mut self) -> AuthResult<()> {
        self.consume(ChallengeInput::Abandon)?;
        self.mfa_token = None;
        self.blocked_until = None;
        Ok(())
    }

    /// Exchange the raw SSO cookie token for a session token. The
    /// caller must delete the cookie whether or not this succeeds, so
    /// a bad cookie can't loop the exchange forever.
    pub async fn exchange_sso_token(&mut self, raw_token: &str) -> AuthResult<()> {
        self.consume(ChallengeInput::SsoTokenDetected)?;

        let result: Result<TokenResponse, ApiError> = self
            .gateway
            .post(
                "/auth/sso/exchange",
                &SsoExchangeRequest {
                    access_token: raw_token,
                },
            )
            .await;

        match result {
            Ok(response) => {
                self.consume(ChallengeInput::ExchangeSucceeded)?;
                self.gateway.store().set_token(&response.token)?;
                tracing::info!("SSO token exchanged, signed in");
                Ok(())
            }
            Err(error) => {
                self.consume(ChallengeInput::ExchangeFailed)?;
                tracing::warn!(error = %error, "SSO token exchange failed");
                Err(error.into())
            }
        }
    }

    fn consume(&mut self, input: ChallengeInput) -> AuthResult<()> {
        self.machine
            .consume(&input)
            .map_err(|_| AuthError::OutOfOrder("transition not allowed from current step"))?;
        Ok(())
    }
}
