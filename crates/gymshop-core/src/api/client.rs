//! API client for communicating with the gymshop REST API.
//!
//! This module provides the `ApiClient` struct, the single request-issuing
//! facade used by all other code. It attaches the stored access token to
//! every non-public request and recovers from one failure class: an expired
//! access token. On a 401 the refresh token is exchanged once (shared between
//! concurrent callers) and the original request is replayed exactly once.

use std::sync::Arc;

use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::refresh::{RefreshCoordinator, RefreshRequest, Recovery, TokenRefresh};
use super::request::{ApiRequest, Attempt, RequestState};
use super::{ApiError, ApiResult};
use crate::auth::{Credentials, ExpiryReason, SessionEvent, SessionEvents, TokenStore};
use crate::config::ClientConfig;

/// A successful response with its body already read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: header::HeaderMap,
    body: String,
}

impl ApiResponse {
    async fn read(response: reqwest::Response) -> ApiResult<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &header::HeaderMap {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }
}

struct ClientState {
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
    events: SessionEvents,
    refresh: RefreshCoordinator,
}

/// API client for the gymshop backend.
/// Clone is cheap - the connection pool and session state are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    state: Arc<ClientState>,
}

/// Tracks one logical request through its states, logging each transition.
struct RequestTracker<'a> {
    request: &'a ApiRequest,
    state: RequestState,
}

impl<'a> RequestTracker<'a> {
    fn new(request: &'a ApiRequest) -> Self {
        Self {
            request,
            state: RequestState::Pending,
        }
    }

    fn advance(&mut self, next: RequestState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal request transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(request = %self.request, from = ?self.state, to = ?next, "Request state");
        self.state = next;
    }

    fn retrying(&self) -> bool {
        self.state == RequestState::Failed401Retrying
    }

    /// Record a failure: terminal once a refresh has been attempted.
    fn fail(&mut self) {
        if self.retrying() {
            self.advance(RequestState::FailedTerminal);
        } else {
            self.advance(RequestState::FailedOther);
        }
    }
}

impl ApiClient {
    /// Create a new API client reading credentials from `store`
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> ApiResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            state: Arc::new(ClientState {
                config,
                store,
                events: SessionEvents::new(),
                refresh: RefreshCoordinator::new(),
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.state.config
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.state.store
    }

    pub fn events(&self) -> &SessionEvents {
        &self.state.events
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.state.events.subscribe()
    }

    /// Store a credential pair obtained elsewhere (e.g. an identity provider).
    pub fn establish_session(&self, credentials: &Credentials) -> ApiResult<()> {
        self.state
            .store
            .store(credentials)
            .map_err(ApiError::TokenStore)?;
        self.state.events.emit(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Drop the stored credentials.
    pub fn logout(&self) -> ApiResult<()> {
        self.state.store.clear().map_err(ApiError::TokenStore)?;
        self.state.events.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    pub fn is_authenticated(&self) -> ApiResult<bool> {
        self.state.store.has_session().map_err(ApiError::TokenStore)
    }

    /// Send a request, recovering once from an expired access token.
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let public = request.is_public(&self.state.config.public_endpoints);
        let mut tracker = RequestTracker::new(request);
        let mut attempt = Attempt::Initial;
        let mut token = if public {
            None
        } else {
            self.state
                .store
                .access_token()
                .map_err(ApiError::TokenStore)?
        };

        loop {
            if attempt == Attempt::Initial {
                if token.is_some() {
                    tracker.advance(RequestState::AuthAttached);
                }
                tracker.advance(RequestState::Sent);
            }

            let response = match self.dispatch(request, token.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    tracker.fail();
                    return Err(e);
                }
            };

            let status = response.status();
            if status.is_success() {
                tracker.advance(RequestState::Succeeded);
                return ApiResponse::read(response).await;
            }

            let body = response.text().await.unwrap_or_default();
            let error = ApiError::from_status(status, &body);

            if status != StatusCode::UNAUTHORIZED || public {
                tracker.fail();
                return Err(error);
            }

            let Some(next) = attempt.next() else {
                // Rejected again with a freshly issued token
                tracker.advance(RequestState::FailedTerminal);
                self.expire(ExpiryReason::ReplayRejected);
                return Err(error);
            };

            tracker.advance(RequestState::Failed401Retrying);
            let recovery = self
                .state
                .refresh
                .recover(self.state.store.as_ref(), token.as_deref(), |refresh| {
                    self.exchange_refresh(refresh)
                })
                .await;

            match recovery {
                Ok(Recovery::Refreshed(access)) => {
                    self.state.events.emit(SessionEvent::Refreshed);
                    token = Some(access);
                }
                Ok(Recovery::Reused(access)) => token = Some(access),
                Ok(Recovery::SessionEnded) => {
                    // Whoever cleared the store already reported why
                    tracker.advance(RequestState::FailedTerminal);
                    return Err(error);
                }
                Ok(Recovery::MissingRefreshToken) => {
                    tracker.advance(RequestState::FailedTerminal);
                    self.state
                        .events
                        .emit(SessionEvent::Expired(ExpiryReason::MissingRefreshToken));
                    return Err(error);
                }
                Err(e) => {
                    tracker.advance(RequestState::FailedTerminal);
                    if matches!(e, ApiError::RefreshFailed(_)) {
                        self.state
                            .events
                            .emit(SessionEvent::Expired(ExpiryReason::RefreshRejected));
                    }
                    return Err(e);
                }
            }

            debug!(request = %request, "Replaying request with refreshed token");
            attempt = next;
        }
    }

    /// Send a request and decode the JSON response body
    pub async fn request_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> ApiResult<T> {
        self.send(request).await?.json()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request_json(&ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(&ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(&ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(&ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(&ApiRequest::delete(path)).await.map(|_| ())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let url = self.state.config.url_for(request.path());
        let mut builder = self.client.request(request.method().clone(), &url);
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        Ok(builder.send().await?)
    }

    /// Exchange a refresh token at the refresh endpoint. Never authenticated.
    async fn exchange_refresh(&self, refresh: String) -> ApiResult<TokenRefresh> {
        let url = self.state.config.url_for(&self.state.config.refresh_path);
        let response = self
            .client
            .post(&url)
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e)))
    }

    /// Check if response is successful, returning an error with body if not.
    pub(crate) async fn check_response(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// End the session after an unrecoverable 401.
    fn expire(&self, reason: ExpiryReason) {
        warn!(reason = reason.describe(), "Session expired");
        if let Err(e) = self.state.store.clear() {
            warn!(error = %e, "Failed to clear credentials");
        }
        self.state.events.emit(SessionEvent::Expired(reason));
    }

    pub(crate) fn raw(&self) -> &Client {
        &self.client
    }
}
