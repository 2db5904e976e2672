//! Request descriptors and per-request lifecycle tracking.
//!
//! An `ApiRequest` is built once and never mutated by the client; replaying a
//! request after a token refresh sends the same descriptor again with a new
//! `Attempt`.

use std::fmt;

use reqwest::Method;
use serde::Serialize;

use super::{ApiError, ApiResult};

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Append a query parameter. Empty values are skipped.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.query.push((key.to_string(), value));
        }
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// True if the path matches any entry of the public allow-list.
    pub fn is_public(&self, public_endpoints: &[String]) -> bool {
        public_endpoints
            .iter()
            .any(|pattern| !pattern.is_empty() && self.path.contains(pattern.as_str()))
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Which send of a logical request this is. A request is replayed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Replay,
}

impl Attempt {
    /// The attempt that may follow a 401, or `None` if the budget is spent.
    pub fn next(self) -> Option<Attempt> {
        match self {
            Attempt::Initial => Some(Attempt::Replay),
            Attempt::Replay => None,
        }
    }
}

/// Lifecycle of one logical request through the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    AuthAttached,
    Sent,
    Succeeded,
    Failed401Retrying,
    FailedOther,
    FailedTerminal,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Succeeded | RequestState::FailedOther | RequestState::FailedTerminal
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: RequestState) -> bool {
        use RequestState::*;
        match (self, next) {
            (Pending, AuthAttached) | (Pending, Sent) => true,
            (AuthAttached, Sent) => true,
            (Sent, Succeeded) | (Sent, Failed401Retrying) | (Sent, FailedOther) => true,
            (Failed401Retrying, Succeeded) | (Failed401Retrying, FailedTerminal) => true,
            _ => false,
        }
    }
}
