//! Per-request authorization gates composed in front of protected operations.
//!
//! Guards follow the middleware shape: each consumes the request and either
//! passes it on (possibly with an [`AuthIdentity`] attached to its
//! extensions) or short-circuits with a denial response. The transport layer
//! runs them in declaration order via [`run_guards`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::{header::AUTHORIZATION, Body, HeaderMap, Request, Response};

use crate::auth::models::{Claims, Role};
use crate::auth::token::TokenCodec;
use crate::auth::TokenValidator;
use crate::error::AuthError;

/// Either the request, cleared to proceed, or a denial response.
pub type GuardOutcome = Result<Request<Body>, Response<Body>>;

/// A single ordered check in front of a protected operation.
pub trait Guard: Send + Sync {
    fn check(&self, req: Request<Body>)
        -> Pin<Box<dyn Future<Output = GuardOutcome> + Send + '_>>;
}

/// Identity attached to request extensions after the token guard passes.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub claims: Claims,
}

/// Pull the bearer token out of the `Authorization` header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Render a denial response for an auth error.
pub fn deny(err: &AuthError) -> Response<Body> {
    let body = serde_json::json!({ "error": err.to_string() });
    Response::builder()
        .status(err.status_code())
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Gate on token validity: signature, expiry, and an unrevoked session.
///
/// On success the decoded claims are attached to the request as an
/// [`AuthIdentity`] for downstream guards and handlers.
pub struct TokenGuard {
    validator: Arc<dyn TokenValidator>,
}

impl TokenGuard {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }
}

impl Guard for TokenGuard {
    fn check(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = GuardOutcome> + Send + '_>> {
        Box::pin(async move {
            let token = match extract_bearer(req.headers()) {
                Some(token) => token,
                None => return Err(deny(&AuthError::Unauthenticated)),
            };

            match self.validator.validate(&token).await {
                Some(claims) => {
                    let identity = AuthIdentity {
                        user_id: claims.sub.clone(),
                        username: claims.username.clone(),
                        role: claims.role,
                        claims,
                    };
                    let mut req = req;
                    req.extensions_mut().insert(identity);
                    Ok(req)
                }
                None => Err(deny(&AuthError::Unauthenticated)),
            }
        })
    }
}

/// Gate on a role allow-list. Operations without a declared allow-list simply
/// don't install this guard.
pub struct RoleGuard {
    allowed: Vec<Role>,
}

impl RoleGuard {
    pub fn allow<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
        }
    }
}

impl Guard for RoleGuard {
    fn check(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = GuardOutcome> + Send + '_>> {
        Box::pin(async move {
            let identity = match req.extensions().get::<AuthIdentity>() {
                Some(identity) => identity,
                None => return Err(deny(&AuthError::Unauthenticated)),
            };

            if self.allowed.contains(&identity.role) {
                Ok(req)
            } else {
                Err(deny(&AuthError::Forbidden))
            }
        })
    }
}

/// Gate on resource ownership.
///
/// Self-contained: re-verifies the bearer token with its own codec handle
/// rather than assuming the token guard already ran. Admins pass
/// unconditionally; everyone else must match the resource id exactly.
pub struct OwnershipGuard {
    codec: Arc<TokenCodec>,
    resource_id: fn(&Request<Body>) -> Option<String>,
}

impl OwnershipGuard {
    /// Ownership check against the last path segment (e.g. `/users/{id}`).
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            resource_id: last_path_segment,
        }
    }

    /// Ownership check with a custom resource id extractor.
    pub fn with_extractor(
        codec: Arc<TokenCodec>,
        resource_id: fn(&Request<Body>) -> Option<String>,
    ) -> Self {
        Self { codec, resource_id }
    }
}

fn last_path_segment(req: &Request<Body>) -> Option<String> {
    req.uri()
        .path()
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}

impl Guard for OwnershipGuard {
    fn check(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = GuardOutcome> + Send + '_>> {
        Box::pin(async move {
            let token = match extract_bearer(req.headers()) {
                Some(token) => token,
                None => return Err(deny(&AuthError::Unauthenticated)),
            };
            let claims = match self.codec.verify(&token) {
                Ok(claims) => claims,
                Err(_) => return Err(deny(&AuthError::Unauthenticated)),
            };

            match claims.role {
                Role::Admin => Ok(req),
                Role::Student | Role::Professor | Role::User => {
                    match (self.resource_id)(&req) {
                        Some(id) if id == claims.sub => Ok(req),
                        _ => Err(deny(&AuthError::Forbidden)),
                    }
                }
            }
        })
    }
}

/// Run guards in order, stopping at the first denial.
pub async fn run_guards(guards: &[Arc<dyn Guard>], mut req: Request<Body>) -> GuardOutcome {
    for guard in guards {
        req = guard.check(req).await?;
    }
    Ok(req)
}
