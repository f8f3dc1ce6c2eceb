//! At-most-once identity fetch per session token.

use crate::error::LifecycleResult;
use crate::{Profile, SessionState};
use api_gateway::{ApiError, ApiGateway};
use std::sync::Arc;
use tokio::sync::oneshot;

const PROFILE_PATH: &str = "/auth/profile";

/// What a bootstrap attempt settled as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A profile is installed for the current token.
    Ready,
    /// No token is stored; nothing to fetch.
    NoSession,
    /// The token is dead. The profile was cleared; removing the token
    /// is the caller's move.
    SessionInvalid,
    /// The caller aborted the fetch. Nothing changed, nothing to show.
    Cancelled,
}

/// Populates [`SessionState`] from the identity endpoint on startup.
///
/// Concurrent callers serialize on an internal lock; the losers of the
/// race find the profile already installed and return without a second
/// fetch. Re-running with the same token is a no-op.
pub struct SessionBootstrap {
    gateway: ApiGateway,
    state: Arc<SessionState>,
    flight: tokio::sync::Mutex<()>,
}

impl SessionBootstrap {
    pub fn new(gateway: ApiGateway, state: Arc<SessionState>) -> Self {
        Self {
            gateway,
            state,
            flight: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn run(&self) -> LifecycleResult<BootstrapOutcome> {
        self.run_inner(None).await
    }

    /// Bootstrap with a caller-held abort signal; firing it settles as
    /// [`BootstrapOutcome::Cancelled`] with no state change.
    pub async fn run_with_abort(
        &self,
        abort: oneshot::Receiver<()>,
    ) -> LifecycleResult<BootstrapOutcome> {
        self.run_inner(Some(abort)).await
    }

    async fn run_inner(
        &self,
        abort: Option<oneshot::Receiver<()>>,
    ) -> LifecycleResult<BootstrapOutcome> {
        let _flight = self.flight.lock().await;

        let token = match self.gateway.store().token()? {
            Some(token) => token,
            None => return Ok(BootstrapOutcome::NoSession),
        };
        if self.state.is_bootstrapped_for(&token) {
            return Ok(BootstrapOutcome::Ready);
        }

        let result: Result<Profile, ApiError> = match abort {
            Some(abort) => self.gateway.get_with_abort(PROFILE_PATH, abort).await,
            None => self.gateway.get(PROFILE_PATH).await,
        };

        match result {
            Ok(profile) => {
                if profile.needs_mfa_setup() {
                    tracing::info!("Account must enroll a second factor");
                }
                // The gateway may have rotated the token via refresh
                // while fetching; fingerprint whatever is stored now.
                let current = self.gateway.store().token()?.unwrap_or(token);
                self.state.install_profile(profile, &current);
                tracing::debug!("Identity profile installed");
                Ok(BootstrapOutcome::Ready)
            }
            Err(ApiError::SessionInvalid) => {
                self.state.clear_profile();
                tracing::warn!("Identity fetch rejected, session is invalid");
                Ok(BootstrapOutcome::SessionInvalid)
            }
            Err(ApiError::Cancelled) => Ok(BootstrapOutcome::Cancelled),
            // Possibly transient: keep the token, let the caller retry.
            Err(error) => Err(error.into()),
        }
    }
}
