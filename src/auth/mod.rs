//! Authentication and authorization core.
//!
//! - Token signing/verification ([`token`])
//! - Password hashing ([`password`])
//! - Revocable session records ([`session`])
//! - The auth engine orchestrating the above ([`engine`])
//! - Per-request authorization guards ([`guards`])

pub mod engine;
pub mod guards;
pub mod models;
pub mod password;
pub mod session;
pub mod token;

use models::Claims;

/// Narrow token-validity interface.
///
/// Both the engine (implementor) and the guards (consumer) depend on this
/// trait rather than on each other, keeping the dependency graph acyclic.
/// `None` covers every failure: bad signature, expiry, and revocation alike.
#[async_trait::async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Option<Claims>;
}

pub use engine::AuthEngine;
pub use guards::{AuthIdentity, Guard, OwnershipGuard, RoleGuard, TokenGuard};
pub use models::{Claims as TokenClaims, Role, SessionRecord, User};
pub use password::CredentialHasher;
pub use session::{MemorySessionStore, SessionStore};
pub use token::{TokenCodec, TokenConfig};
