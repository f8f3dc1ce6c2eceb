//! Lenient reading of the expiry claim embedded in a bearer token.
//!
//! Tokens are opaque to the client except for the `exp` claim, which is
//! read without any signature verification. A token whose expiry cannot
//! be read is treated as "assume valid" and left to the server.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

/// Extract the `exp` claim from a JWT-shaped token.
///
/// Returns `None` for tokens that are not three dot-separated segments,
/// whose payload is not base64url JSON, or that carry no numeric `exp`.
pub fn token_expires_at(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}
