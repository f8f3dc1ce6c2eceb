//! Sign-in protocol for the console client.
//!
//! The multi-step challenge (password, optional second factor, SSO
//! exchange) is modeled as an explicit finite state machine driven by
//! [`ChallengeSession`]; stateless account operations (sign-up,
//! password reset, login options) live on [`AuthClient`].

mod challenge;
mod client;
mod error;

pub use challenge::{ChallengePhase, ChallengeSession, SignInStep};
pub use client::{AuthClient, SecurityOption, SignUpRequest};
pub use error::{AuthError, AuthResult};
