//! Session lifecycle for the console client.
//!
//! Ties the other crates together around one [`SessionState`]: the
//! bootstrap fetches the identity profile at most once per stored
//! token, and the route gate turns `(profile, path)` into a pure
//! allow/redirect decision for every navigation.

mod bootstrap;
mod error;
mod profile;
mod route;
mod state;

pub use bootstrap::{BootstrapOutcome, SessionBootstrap};
pub use error::{LifecycleError, LifecycleResult};
pub use profile::Profile;
pub use route::{
    decide, RouteDecision, DEFAULT_LANDING_PATH, FORGOT_PASSWORD_PATH, RESET_PASSWORD_PATH,
    SIGN_IN_PATH, SIGN_UP_PATH, SSO_CALLBACK_PATH,
};
pub use state::SessionState;
