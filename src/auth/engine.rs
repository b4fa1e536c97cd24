//! Orchestration of registration, login, refresh, logout, and token validity.
//!
//! The engine owns no state of its own beyond the injected codec, hasher, and
//! store handles; every operation is a plain async call against those
//! collaborators. Revocation truth lives in the session store: a token
//! authorizes only while its record exists and is unexpired.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::auth::models::{
    Claims, ProfileView, Registration, Role, RoleProfile, SanitizedUser, SessionRecord,
    TokenResponse, User,
};
use crate::auth::password::CredentialHasher;
use crate::auth::session::SessionStore;
use crate::auth::token::{TokenCodec, TokenConfig};
use crate::auth::TokenValidator;
use crate::directory::{
    CredentialStore, DepartmentDirectory, ProfessorProfile, ProfessorProfiles, StudentProfile,
    StudentProfiles,
};
use crate::error::{AuthError, StoreError};

/// The authentication engine.
pub struct AuthEngine {
    codec: Arc<TokenCodec>,
    hasher: CredentialHasher,
    access_ttl: Duration,
    refresh_ttl: Duration,
    users: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    departments: Arc<dyn DepartmentDirectory>,
    students: Arc<dyn StudentProfiles>,
    professors: Arc<dyn ProfessorProfiles>,
}

impl AuthEngine {
    pub fn new(
        codec: Arc<TokenCodec>,
        token_config: &TokenConfig,
        users: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        departments: Arc<dyn DepartmentDirectory>,
        students: Arc<dyn StudentProfiles>,
        professors: Arc<dyn ProfessorProfiles>,
    ) -> Self {
        Self {
            codec,
            hasher: CredentialHasher::new(),
            access_ttl: token_config.access_token_ttl,
            refresh_ttl: token_config.refresh_token_ttl,
            users,
            sessions,
            departments,
            students,
            professors,
        }
    }

    /// The codec this engine signs with, for guards that verify on their own.
    pub fn codec(&self) -> Arc<TokenCodec> {
        self.codec.clone()
    }

    /// Register a new account together with its role profile.
    ///
    /// Registration spans two independent writes (user, then profile) with no
    /// cross-entity transaction. If the profile write fails, the just-created
    /// user is deleted again before the error propagates, so the operation is
    /// all-or-nothing from the caller's side.
    pub async fn register(&self, registration: Registration) -> Result<SanitizedUser, AuthError> {
        // Verify role-specific references before any write happens.
        let department_id = match registration.role {
            Role::Professor => {
                let id = registration
                    .department_id
                    .clone()
                    .ok_or(AuthError::InvalidRole(Role::Professor))?;
                if self.departments.find_by_id(&id).await?.is_none() {
                    return Err(AuthError::DepartmentNotFound(id));
                }
                Some(id)
            }
            Role::Student | Role::Admin | Role::User => None,
        };

        let password_hash = self.hasher.hash(&registration.password)?;
        let user = User::new(
            registration.username,
            registration.email,
            password_hash,
            registration.role,
            registration.display_name,
            registration.birth_date,
        );

        let user = match self.users.create(user).await {
            Ok(user) => user,
            Err(StoreError::Conflict(_)) => return Err(AuthError::DuplicateIdentity),
            Err(e) => return Err(e.into()),
        };

        let profile_result: Result<(), AuthError> = match user.role {
            Role::Student => self
                .students
                .create(StudentProfile {
                    user_id: user.id.clone(),
                    student_number: format!("S-{}", &user.id[..8]),
                })
                .await
                .map_err(Into::into),
            Role::Professor => self
                .professors
                .create(ProfessorProfile {
                    user_id: user.id.clone(),
                    // Checked above before the user write.
                    department_id: department_id.unwrap_or_default(),
                })
                .await
                .map_err(Into::into),
            Role::Admin | Role::User => Ok(()),
        };

        if let Err(original) = profile_result {
            // Compensating delete. A failure here is logged but must not
            // mask the error that triggered the rollback.
            if let Err(cleanup) = self.users.remove(&user.id).await {
                error!(
                    user_id = %user.id,
                    error = %cleanup,
                    "compensating user delete failed after registration error"
                );
            }
            return Err(original);
        }

        info!(user_id = %user.id, role = %user.role, "registered new account");
        Ok(user.sanitized())
    }

    /// Verify a username/password pair.
    ///
    /// Unknown username and wrong password both come back as `None`, giving
    /// callers no signal with which to enumerate accounts. Only store I/O
    /// failures surface as errors.
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<SanitizedUser>, AuthError> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => Ok(Some(user.sanitized())),
            Ok(false) => Ok(None),
            Err(e) => {
                // A corrupt stored hash reads as a failed login, not a 500.
                warn!(username, error = %e, "stored password hash failed to parse");
                Ok(None)
            }
        }
    }

    /// Issue a token pair and persist its session record.
    ///
    /// When a device id is given, prior sessions for that `(user, device)`
    /// pair are deleted first: one active session per device.
    pub async fn login(
        &self,
        user: &SanitizedUser,
        device_id: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        let (access_token, expires_at) =
            self.codec
                .sign(&user.id, &user.username, user.role, device_id, self.access_ttl)?;
        let (refresh_token, refresh_expires_at) =
            self.codec
                .sign(&user.id, &user.username, user.role, device_id, self.refresh_ttl)?;

        if let Some(device) = device_id {
            let evicted = self.sessions.remove_for_device(&user.id, device).await?;
            if evicted > 0 {
                info!(user_id = %user.id, device, evicted, "replaced prior device session");
            }
        }

        let record = SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            access_token: access_token.clone(),
            refresh_token: refresh_token.clone(),
            device_id: device_id.map(|d| d.to_string()),
            expires_at,
            refresh_expires_at,
            created_at: Utc::now(),
        };
        self.sessions.insert(record).await?;

        info!(user_id = %user.id, device = device_id.unwrap_or("-"), "session created");
        Ok(TokenResponse {
            access_token,
            refresh_token,
            user: user.public_view(),
        })
    }

    /// Validate credentials and log in, in one step.
    pub async fn login_with_credentials(
        &self,
        username: &str,
        password: &str,
        device_id: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        let user = self
            .validate_credentials(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        self.login(&user, device_id).await
    }

    /// Rotate a refresh token into a fresh pair.
    ///
    /// Rotation is strictly single-use: the session record is atomically
    /// removed by refresh-token value, and a token whose record is already
    /// gone (rotated, revoked, or never issued) fails outright.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let claims = self
            .codec
            .verify(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let record = self
            .sessions
            .remove_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Lazy expiry: a stale record counts as absent.
        if record.refresh_expires_at <= Utc::now() {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        info!(user_id = %user.id, "refresh token rotated");
        self.login(&user.sanitized(), record.device_id.as_deref())
            .await
    }

    /// Delete the session behind an access token.
    ///
    /// Idempotent: returns whether a record was actually deleted, and logging
    /// out twice is not an error.
    pub async fn logout(&self, access_token: &str) -> Result<bool, AuthError> {
        let removed = self.sessions.remove_by_access_token(access_token).await?;
        if let Some(record) = &removed {
            info!(user_id = %record.user_id, "session ended");
        }
        Ok(removed.is_some())
    }

    /// Check whether an access token currently authorizes requests.
    ///
    /// Total and side-effect-free: every failure path collapses to `false`,
    /// so guards can call this unconditionally.
    pub async fn validate_token(&self, token: &str) -> bool {
        self.validate(token).await.is_some()
    }

    /// Delete every session for a user; used when an account is disabled or
    /// deleted. Returns the number of sessions revoked.
    pub async fn revoke_all_user_tokens(&self, user_id: &str) -> Result<u64, AuthError> {
        let revoked = self.sessions.remove_for_user(user_id).await?;
        info!(user_id, revoked, "all sessions revoked");
        Ok(revoked)
    }

    /// Resolve a user together with their role profile for display.
    pub async fn get_profile(&self, user_id: &str) -> Result<ProfileView, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::ReferencedEntityNotFound(user_id.to_string()))?;

        let profile = match user.role {
            Role::Student => self
                .students
                .find_by_user(&user.id)
                .await?
                .map(RoleProfile::Student),
            Role::Professor => self
                .professors
                .find_by_user(&user.id)
                .await?
                .map(RoleProfile::Professor),
            Role::Admin | Role::User => None,
        };

        Ok(ProfileView {
            user: user.sanitized(),
            profile,
        })
    }
}

#[async_trait::async_trait]
impl TokenValidator for AuthEngine {
    async fn validate(&self, token: &str) -> Option<Claims> {
        let claims = self.codec.verify(token).ok()?;
        let record = self.sessions.find_by_access_token(token).await.ok()??;
        if record.user_id != claims.sub {
            return None;
        }
        if record.expires_at <= Utc::now() {
            return None;
        }
        Some(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::MemorySessionStore;
    use crate::directory::{
        Department, MemoryCredentialStore, MemoryDepartmentDirectory, MemoryProfessorProfiles,
        MemoryStudentProfiles,
    };

    struct FailingStudentProfiles;

    #[async_trait::async_trait]
    impl StudentProfiles for FailingStudentProfiles {
        async fn create(&self, _profile: StudentProfile) -> Result<(), StoreError> {
            Err(StoreError::Backend("profile service down".to_string()))
        }

        async fn find_by_user(
            &self,
            _user_id: &str,
        ) -> Result<Option<StudentProfile>, StoreError> {
            Ok(None)
        }
    }

    fn engine_with_students(students: Arc<dyn StudentProfiles>) -> (AuthEngine, Arc<MemoryCredentialStore>) {
        let config = TokenConfig::default();
        let users = Arc::new(MemoryCredentialStore::new());
        let engine = AuthEngine::new(
            Arc::new(TokenCodec::new(&config)),
            &config,
            users.clone(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryDepartmentDirectory::new()),
            students,
            Arc::new(MemoryProfessorProfiles::new()),
        );
        (engine, users)
    }

    fn registration(role: Role, department_id: Option<&str>) -> Registration {
        Registration {
            username: "alice".to_string(),
            email: "alice@x.edu".to_string(),
            password: "secret1".to_string(),
            role,
            display_name: "Alice".to_string(),
            birth_date: None,
            department_id: department_id.map(|d| d.to_string()),
        }
    }

    #[tokio::test]
    async fn professor_without_department_is_invalid_role() {
        let (engine, _) = engine_with_students(Arc::new(MemoryStudentProfiles::new()));
        let result = engine.register(registration(Role::Professor, None)).await;
        assert!(matches!(result, Err(AuthError::InvalidRole(Role::Professor))));
    }

    #[tokio::test]
    async fn professor_with_unknown_department_writes_nothing() {
        let (engine, users) = engine_with_students(Arc::new(MemoryStudentProfiles::new()));
        let result = engine
            .register(registration(Role::Professor, Some("dep-missing")))
            .await;
        assert!(matches!(result, Err(AuthError::DepartmentNotFound(_))));
        assert!(users.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_profile_write_rolls_back_the_user() {
        let (engine, users) = engine_with_students(Arc::new(FailingStudentProfiles));
        let result = engine.register(registration(Role::Student, None)).await;
        assert!(result.is_err());
        // The compensating delete removed the partially registered user.
        assert!(users.find_by_username("alice").await.unwrap().is_none());
        assert!(engine
            .validate_credentials("alice", "secret1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (engine, _) = engine_with_students(Arc::new(MemoryStudentProfiles::new()));
        engine.register(registration(Role::Student, None)).await.unwrap();
        let result = engine.register(registration(Role::Student, None)).await;
        assert!(matches!(result, Err(AuthError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn professor_profile_is_attached_to_get_profile() {
        let config = TokenConfig::default();
        let users = Arc::new(MemoryCredentialStore::new());
        let departments = Arc::new(MemoryDepartmentDirectory::new());
        departments
            .seed(Department {
                id: "dep-cs".to_string(),
                name: "Computer Science".to_string(),
            })
            .await;
        let engine = AuthEngine::new(
            Arc::new(TokenCodec::new(&config)),
            &config,
            users,
            Arc::new(MemorySessionStore::new()),
            departments,
            Arc::new(MemoryStudentProfiles::new()),
            Arc::new(MemoryProfessorProfiles::new()),
        );

        let user = engine
            .register(registration(Role::Professor, Some("dep-cs")))
            .await
            .unwrap();
        let view = engine.get_profile(&user.id).await.unwrap();
        match view.profile {
            Some(RoleProfile::Professor(p)) => assert_eq!(p.department_id, "dep-cs"),
            other => panic!("expected professor profile, got {:?}", other),
        }
    }
}
