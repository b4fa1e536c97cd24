//! Error taxonomy for the authentication core.

use thiserror::Error;

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;

/// Failure of a backing store (credential, session, or profile collaborator).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint violation (username or email already taken)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backend I/O or query failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Top-level errors surfaced by the auth engine and guards.
///
/// `validate_token` never produces these; every failure there collapses to
/// `false`. All other operations propagate them typed, and the transport
/// boundary maps them to status codes.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No token, or a token that is invalid, expired, or revoked
    #[error("authentication required")]
    Unauthenticated,

    /// Valid token, but insufficient role or not the resource owner
    #[error("insufficient privileges")]
    Forbidden,

    /// Wrong username or wrong password; deliberately indistinguishable
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Refresh token failed signature, expiry, or session lookup
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Username or email already registered
    #[error("username or email already registered")]
    DuplicateIdentity,

    /// Registration payload missing the info its role requires
    #[error("role {0} requires additional registration info")]
    InvalidRole(crate::auth::models::Role),

    #[error("department not found: {0}")]
    DepartmentNotFound(String),

    #[error("referenced entity not found: {0}")]
    ReferencedEntityNotFound(String),

    /// Compensating cleanup itself failed; the original error still wins
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// HTTP status the transport boundary should render for this error.
    pub fn status_code(&self) -> hyper::StatusCode {
        use hyper::StatusCode;
        match self {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::DuplicateIdentity => StatusCode::CONFLICT,
            AuthError::InvalidRole(_) => StatusCode::BAD_REQUEST,
            AuthError::DepartmentNotFound(_) | AuthError::ReferencedEntityNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AuthError::InternalInconsistency(_)
            | AuthError::Token(_)
            | AuthError::Password(_)
            | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
