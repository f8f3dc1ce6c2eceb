//! Outbound HTTP surface for the console client.
//!
//! Every call to the console API passes through the [`ApiGateway`]: it
//! signs requests with the stored bearer token, classifies failures
//! into the [`ApiError`] taxonomy, and recovers from 401s with a
//! single-flight token refresh. Concurrent callers that hit a 401 while
//! a refresh is already in flight are queued on the
//! [`RefreshCoordinator`] and settled together with that one call's
//! outcome.

mod coordinator;
mod envelope;
mod error;
mod gateway;
mod problem;
mod transport;

pub use coordinator::{RefreshCoordinator, RefreshFailed, RefreshTicket};
pub use envelope::{Envelope, Meta, Page, ResponseEnvelope};
pub use error::{ApiError, ApiResult};
pub use gateway::ApiGateway;
pub use problem::{FieldViolation, Problem};
pub use transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportRequest, TransportResponse,
};
