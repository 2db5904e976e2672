//! Authentication module for managing credentials and session lifecycle.
//!
//! This module provides:
//! - `TokenStore`: the injectable credential store the API client reads from
//! - `MemoryTokenStore`, `FileTokenStore`, `KeyringTokenStore`: its backends
//! - `SessionEvents`: broadcast of login, refresh and expiry events
//!
//! Tokens are opaque strings. Expiry is only ever discovered by the backend
//! rejecting a request.

pub mod events;
pub mod file_store;
pub mod keyring_store;
pub mod tokens;

pub use events::{ExpiryReason, SessionEvent, SessionEvents};
pub use file_store::FileTokenStore;
pub use keyring_store::KeyringTokenStore;
pub use tokens::{Credentials, MemoryTokenStore, TokenStore};
