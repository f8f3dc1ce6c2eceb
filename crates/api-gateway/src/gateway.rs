//! Authenticated gateway for all outbound console API calls.

use crate::coordinator::{RefreshCoordinator, RefreshTicket};
use crate::envelope::{Envelope, Meta, ResponseEnvelope};
use crate::error::{ApiError, ApiResult};
use crate::problem::Problem;
use crate::transport::{
    HttpTransport, ReqwestTransport, TransportError, TransportRequest, TransportResponse,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use session_store::SessionStore;
use std::sync::Arc;
use tokio::sync::oneshot;

const REFRESH_PATH: &str = "/sessions/refresh";

/// Wire shape of a successful refresh call.
#[derive(Debug, Deserialize)]
struct RefreshedSession {
    token: String,
}

/// The one component allowed to read the token for request signing.
///
/// Classifies every outcome into [`ApiError`]; never decides UI
/// behavior. On a 401 it runs the refresh protocol and retries the
/// original request exactly once.
#[derive(Clone)]
pub struct ApiGateway {
    transport: Arc<dyn HttpTransport>,
    store: Arc<SessionStore>,
    coordinator: Arc<RefreshCoordinator>,
    base_url: String,
}

impl ApiGateway {
    /// Create a gateway over the production reqwest transport.
    pub fn new(base_url: impl Into<String>, store: Arc<SessionStore>) -> Self {
        Self::with_transport(base_url, store, Arc::new(ReqwestTransport::new()))
    }

    /// Create a gateway with a custom transport.
    pub fn with_transport(
        base_url: impl Into<String>,
        store: Arc<SessionStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            transport,
            store,
            coordinator: Arc::new(RefreshCoordinator::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The session store this gateway signs requests from.
    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        Ok(self.request(Method::GET, path, None, None).await?.data)
    }

    /// GET with a caller-held abort signal. Firing the signal resolves
    /// the call as [`ApiError::Cancelled`] without touching any state.
    pub async fn get_with_abort<T: DeserializeOwned>(
        &self,
        path: &str,
        abort: oneshot::Receiver<()>,
    ) -> ApiResult<T> {
        Ok(self
            .request(Method::GET, path, None, Some(abort))
            .await?
            .data)
    }

    /// GET keeping the response metadata (pagination, message code).
    pub async fn get_with_meta<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> ApiResult<(T, Option<Meta>)> {
        let envelope = self.request(Method::GET, path, None, None).await?;
        Ok((envelope.data, envelope.meta))
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = wrap_body(body)?;
        Ok(self
            .request(Method::POST, path, Some(body), None)
            .await?
            .data)
    }

    /// POST with a caller-held abort signal.
    pub async fn post_with_abort<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        abort: oneshot::Receiver<()>,
    ) -> ApiResult<T> {
        let body = wrap_body(body)?;
        Ok(self
            .request(Method::POST, path, Some(body), Some(abort))
            .await?
            .data)
    }

    /// POST for endpoints that answer with an empty body.
    pub async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        self.post_no_content_inner(path, body, None).await
    }

    /// Empty-body POST with a caller-held abort signal.
    pub async fn post_no_content_with_abort<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        abort: oneshot::Receiver<()>,
    ) -> ApiResult<()> {
        self.post_no_content_inner(path, body, Some(abort)).await
    }

    async fn post_no_content_inner<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        abort: Option<oneshot::Receiver<()>>,
    ) -> ApiResult<()> {
        let body = wrap_body(body)?;
        let response = self
            .perform_with_abort(Method::POST, path, Some(body), abort)
            .await?;
        if (200..=299).contains(&response.status) {
            Ok(())
        } else {
            Err(classify_failure(response))
        }
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = wrap_body(body)?;
        Ok(self
            .request(Method::PUT, path, Some(body), None)
            .await?
            .data)
    }

    /// PUT with a caller-held abort signal.
    pub async fn put_with_abort<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        abort: oneshot::Receiver<()>,
    ) -> ApiResult<T> {
        let body = wrap_body(body)?;
        Ok(self
            .request(Method::PUT, path, Some(body), Some(abort))
            .await?
            .data)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        Ok(self.request(Method::DELETE, path, None, None).await?.data)
    }

    /// DELETE with a caller-held abort signal.
    pub async fn delete_with_abort<T: DeserializeOwned>(
        &self,
        path: &str,
        abort: oneshot::Receiver<()>,
    ) -> ApiResult<T> {
        Ok(self
            .request(Method::DELETE, path, None, Some(abort))
            .await?
            .data)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        abort: Option<oneshot::Receiver<()>>,
    ) -> ApiResult<ResponseEnvelope<T>> {
        let response = self.perform_with_abort(method, path, body, abort).await?;
        parse_envelope(response)
    }

    /// Race the pipeline against the caller's abort signal, for every
    /// verb alike. Firing the signal resolves as `Cancelled`; a sender
    /// dropped without firing is ignored.
    async fn perform_with_abort(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        abort: Option<oneshot::Receiver<()>>,
    ) -> ApiResult<TransportResponse> {
        match abort {
            None => self.perform(method, path, body).await,
            Some(mut abort) => {
                let fut = self.perform(method, path, body);
                tokio::pin!(fut);
                tokio::select! {
                    signal = &mut abort => match signal {
                        Ok(()) => Err(ApiError::Cancelled),
                        // The abort sender was dropped without firing;
                        // keep waiting on the request.
                        Err(_) => fut.await,
                    },
                    result = &mut fut => result,
                }
            }
        }
    }

    /// Full pipeline for one call: sign, dispatch, recover from 401
    /// once, and hand back the raw response for classification.
    async fn perform(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<TransportResponse> {
        let url = self.endpoint(path);
        let token = self.store.token()?;
        let had_token = token.is_some();

        let response = self.dispatch(method.clone(), &url, body.clone(), token).await?;
        if response.status != 401 {
            return Ok(response);
        }

        // An anonymous call rejected with 401 has nothing to refresh.
        if !had_token {
            return Err(ApiError::SessionInvalid);
        }

        tracing::debug!(path = %path, "Request rejected with 401, entering refresh protocol");
        let fresh_token = self.recover_session().await?;

        let retried = self.dispatch(method, &url, body, Some(fresh_token)).await?;
        if retried.status == 401 {
            // The refreshed token was rejected too; the session is dead.
            self.store.remove_token()?;
            return Err(ApiError::SessionInvalid);
        }
        Ok(retried)
    }

    /// Join the in-flight refresh or run a new one; resolves with the
    /// fresh token, or `SessionInvalid` when the refresh fails.
    async fn recover_session(&self) -> ApiResult<String> {
        let receiver = match self.coordinator.acquire() {
            RefreshTicket::Leader(rx) => {
                // The refresh runs detached so a cancelled leader can't
                // strand the queued waiters.
                let gateway = self.clone();
                tokio::spawn(async move { gateway.run_refresh().await });
                rx
            }
            RefreshTicket::Waiter(rx) => rx,
        };

        match receiver.await {
            Ok(Ok(token)) => Ok(token),
            _ => Err(ApiError::SessionInvalid),
        }
    }

    async fn run_refresh(&self) {
        match self.call_refresh().await {
            Ok(token) => {
                if let Err(error) = self.store.set_token(&token) {
                    tracing::error!(error = %error, "Failed persisting refreshed token");
                    self.coordinator.failed();
                    return;
                }
                tracing::info!("Session token refreshed");
                self.coordinator.success(token);
            }
            Err(error) => {
                tracing::warn!(error = %error, "Token refresh failed, session is invalid");
                if let Err(error) = self.store.remove_token() {
                    tracing::error!(error = %error, "Failed clearing dead session token");
                }
                self.coordinator.failed();
            }
        }
    }

    async fn call_refresh(&self) -> ApiResult<String> {
        let url = self.endpoint(REFRESH_PATH);
        let token = self.store.token()?;
        let response = self.dispatch(Method::POST, &url, None, token).await?;
        let envelope: ResponseEnvelope<RefreshedSession> = parse_envelope(response)?;
        Ok(envelope.data.token)
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
        bearer_token: Option<String>,
    ) -> ApiResult<TransportResponse> {
        let request = TransportRequest {
            method,
            url: url.to_string(),
            bearer_token,
            language: self.store.language()?,
            body,
        };

        self.transport.execute(request).await.map_err(|e| match e {
            TransportError::Timeout => ApiError::Timeout,
            TransportError::Network(message) => ApiError::Network(message),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn wrap_body<B: Serialize>(body: &B) -> ApiResult<serde_json::Value> {
    serde_json::to_value(Envelope::wrap(body)).map_err(|e| ApiError::Decode(e.to_string()))
}

fn parse_envelope<T: DeserializeOwned>(response: TransportResponse) -> ApiResult<ResponseEnvelope<T>> {
    if (200..=299).contains(&response.status) {
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    } else {
        Err(classify_failure(response))
    }
}

fn classify_failure(response: TransportResponse) -> ApiError {
    let problem = Problem::from_body(response.status, &response.body);
    match response.status {
        401 => ApiError::SessionInvalid,
        400 if problem.is_validation() => ApiError::Validation(problem),
        403 => ApiError::Forbidden(problem),
        404 => ApiError::NotFound(problem),
        _ => ApiError::Api(problem),
    }
}
