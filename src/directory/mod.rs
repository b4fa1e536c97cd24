//! Collaborator interfaces consumed by the auth engine.
//!
//! The credential store, department directory, and role-profile services are
//! owned by the wider administration backend; here they appear as opaque
//! async lookups with in-memory reference implementations used for wiring
//! and tests.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::auth::models::User;
use crate::error::StoreError;

/// User account storage.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Create a user; fails with [`StoreError::Conflict`] when the username
    /// or email is already taken.
    async fn create(&self, user: User) -> Result<User, StoreError>;

    async fn update(&self, user: User) -> Result<(), StoreError>;

    /// Delete a user; returns whether a record existed.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
}

/// Department as seen by registration's existence check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
}

#[async_trait::async_trait]
pub trait DepartmentDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Department>, StoreError>;
}

/// Role profile for students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub user_id: String,
    pub student_number: String,
}

#[async_trait::async_trait]
pub trait StudentProfiles: Send + Sync {
    async fn create(&self, profile: StudentProfile) -> Result<(), StoreError>;

    async fn find_by_user(&self, user_id: &str) -> Result<Option<StudentProfile>, StoreError>;
}

/// Role profile for professors; always references an existing department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessorProfile {
    pub user_id: String,
    pub department_id: String,
}

#[async_trait::async_trait]
pub trait ProfessorProfiles: Send + Sync {
    async fn create(&self, profile: ProfessorProfile) -> Result<(), StoreError>;

    async fn find_by_user(&self, user_id: &str) -> Result<Option<ProfessorProfile>, StoreError>;
}

/// In-memory credential store enforcing username/email uniqueness.
pub struct MemoryCredentialStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict(format!(
                "user {} already exists",
                user.username
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("no such user: {}", user.id))),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        Ok(users.remove(id).is_some())
    }
}

/// In-memory department directory, seeded up front.
pub struct MemoryDepartmentDirectory {
    departments: Arc<RwLock<HashMap<String, Department>>>,
}

impl MemoryDepartmentDirectory {
    pub fn new() -> Self {
        Self {
            departments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn seed(&self, department: Department) {
        let mut departments = self.departments.write().await;
        departments.insert(department.id.clone(), department);
    }
}

impl Default for MemoryDepartmentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DepartmentDirectory for MemoryDepartmentDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<Department>, StoreError> {
        let departments = self.departments.read().await;
        Ok(departments.get(id).cloned())
    }
}

/// In-memory student profile service.
pub struct MemoryStudentProfiles {
    profiles: Arc<RwLock<HashMap<String, StudentProfile>>>,
}

impl MemoryStudentProfiles {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStudentProfiles {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl StudentProfiles for MemoryStudentProfiles {
    async fn create(&self, profile: StudentProfile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<StudentProfile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user_id).cloned())
    }
}

/// In-memory professor profile service.
pub struct MemoryProfessorProfiles {
    profiles: Arc<RwLock<HashMap<String, ProfessorProfile>>>,
}

impl MemoryProfessorProfiles {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryProfessorProfiles {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProfessorProfiles for MemoryProfessorProfiles {
    async fn create(&self, profile: ProfessorProfile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<ProfessorProfile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn user(username: &str, email: &str) -> User {
        User::new(
            username.to_string(),
            email.to_string(),
            "hash".to_string(),
            Role::Student,
            username.to_string(),
            None,
        )
    }

    #[tokio::test]
    async fn create_rejects_duplicate_username_and_email() {
        let store = MemoryCredentialStore::new();
        store.create(user("alice", "alice@x.edu")).await.unwrap();

        let dup_username = store.create(user("alice", "other@x.edu")).await;
        assert!(matches!(dup_username, Err(StoreError::Conflict(_))));

        let dup_email = store.create(user("bob", "alice@x.edu")).await;
        assert!(matches!(dup_email, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn remove_reports_whether_a_user_existed() {
        let store = MemoryCredentialStore::new();
        let created = store.create(user("alice", "alice@x.edu")).await.unwrap();

        assert!(store.remove(&created.id).await.unwrap());
        assert!(!store.remove(&created.id).await.unwrap());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn department_lookup() {
        let directory = MemoryDepartmentDirectory::new();
        directory
            .seed(Department {
                id: "dep-cs".to_string(),
                name: "Computer Science".to_string(),
            })
            .await;

        assert!(directory.find_by_id("dep-cs").await.unwrap().is_some());
        assert!(directory.find_by_id("dep-42").await.unwrap().is_none());
    }
}
