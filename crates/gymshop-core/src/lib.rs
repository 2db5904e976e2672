//! Core library for gymshop.
//!
//! Provides the authenticated API client used by every gymshop front end:
//!
//! - [`api`]: `ApiClient` with bearer-token attachment and transparent,
//!   single-flight token refresh on 401
//! - [`auth`]: credential storage backends and session-expiry events
//! - [`models`]: storefront and gym-content data types
//! - [`config`]: user configuration and client settings

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse, ApiResult};
pub use auth::{Credentials, SessionEvent, SessionEvents, TokenStore};
pub use config::{ClientConfig, Config, TokenStoreKind};
