//! campus-auth: token-backed authentication and session control for a
//! university administration backend.
//!
//! The crate issues signed access/refresh token pairs, persists them as
//! revocable session records, and layers role- and ownership-based
//! authorization guards on top of token validity. Course/enrollment/grade
//! CRUD lives elsewhere in the backend and consumes this crate through the
//! [`auth::AuthEngine`] and [`auth::guards`].

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;

pub use auth::{
    AuthEngine, AuthIdentity, Guard, MemorySessionStore, OwnershipGuard, Role, RoleGuard,
    SessionStore, TokenCodec, TokenConfig, TokenGuard, TokenValidator,
};
pub use config::AppConfig;
pub use error::{AuthError, StoreError};

/// Initialize a tracing subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
