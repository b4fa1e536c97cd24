//! Core data structures for users, roles, sessions, and token claims.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of roles known to the system.
///
/// Every branch on a role is an exhaustive `match`; there is deliberately no
/// catch-all string variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access, bypasses ownership checks.
    Admin,
    /// Enrolled student with a student profile.
    Student,
    /// Teaching staff, bound to a department.
    Professor,
    /// Plain account with no role profile.
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Professor => "professor",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account record as held by the credential store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub display_name: String,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and timestamps.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        role: Role,
        display_name: String,
        birth_date: Option<NaiveDate>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            role,
            display_name,
            birth_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// View of the user with the password hash stripped at the type level.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            display_name: self.display_name.clone(),
            birth_date: self.birth_date,
        }
    }
}

/// User view safe to hand to callers; carries no credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizedUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub birth_date: Option<NaiveDate>,
}

impl SanitizedUser {
    /// Minimal public shape returned alongside a token pair.
    pub fn public_view(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Public user shape embedded in login/refresh responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Claim set signed into every token. Round-trips exactly through the codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Device scope, omitted from the wire when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Issued-at, unix seconds
    pub iat: u64,
    /// Expiry, unix seconds
    pub exp: u64,
    /// Unique token id. `iat` has second granularity, so without this two
    /// tokens signed for the same subject in the same second would be
    /// byte-identical and revocation could not tell them apart.
    pub jti: String,
}

/// Persisted, revocable record binding one issued token pair to its owner.
///
/// A record's existence (and non-expiry) is the sole source of truth for
/// revocation; cryptographic validity of the token alone never authorizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Optional binding to a single client installation
    pub device_id: Option<String>,
    /// Access token expiry; strictly earlier than `refresh_expires_at`
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Registration payload. `department_id` is required for professors only.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
    pub birth_date: Option<NaiveDate>,
    pub department_id: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub device_id: Option<String>,
}

/// Token pair handed back by login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Role-specific profile attached to a user for display.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RoleProfile {
    Student(crate::directory::StudentProfile),
    Professor(crate::directory::ProfessorProfile),
}

/// A user together with their role profile, as returned by `get_profile`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: SanitizedUser,
    pub profile: Option<RoleProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_user_has_no_password_material() {
        let user = User::new(
            "alice".into(),
            "alice@x.edu".into(),
            "$argon2id$...".into(),
            Role::Student,
            "Alice".into(),
            None,
        );
        let sanitized = user.sanitized();
        let json = serde_json::to_value(&sanitized).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Professor).unwrap(), "\"professor\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn claims_round_trip_without_device() {
        let claims = Claims {
            sub: "u1".into(),
            username: "alice".into(),
            role: Role::Student,
            device: None,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            jti: "t-1".into(),
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("device").is_none());
        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back.sub, claims.sub);
        assert_eq!(back.role, Role::Student);
        assert_eq!(back.device, None);
        assert_eq!(back.jti, "t-1");
    }
}
