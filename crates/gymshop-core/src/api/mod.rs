//! REST API client module for the gymshop backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! storefront API: products, cart, orders, wishlist, reviews, articles,
//! workouts and performance logs.
//!
//! The API uses JWT bearer tokens. An expired access token is recovered
//! transparently by exchanging the refresh token once and replaying the
//! rejected request.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod refresh;
pub mod request;

pub use client::{ApiClient, ApiResponse};
pub use error::{ApiError, ApiResult};
pub use request::{ApiRequest, Attempt, RequestState};
