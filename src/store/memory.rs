use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::domain::{AuthProvider, User};
use crate::store::{AccountStore, StoreError};

/// In-memory [`AccountStore`] for tests and local runs without Postgres.
///
/// Mirrors the database constraints: unique email (nullable-safe), unique
/// `(provider, provider_user_id)` and at most one identity per user. All
/// checks happen under one mutex, so inserts are atomic like a transaction.
#[derive(Default)]
pub struct MemoryAccountStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.lock().map(|users| users.len()).unwrap_or(0)
    }

    pub fn identity_count(&self) -> usize {
        self.lock()
            .map(|users| users.values().filter(|u| u.identity().is_some()).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".to_string()))
    }

    fn check_constraints(
        users: &HashMap<Uuid, User>,
        candidate: &User,
    ) -> Result<(), StoreError> {
        for other in users.values() {
            if other.id() == candidate.id() {
                continue;
            }
            if let (Some(a), Some(b)) = (candidate.email(), other.email()) {
                if a == b {
                    return Err(StoreError::UniqueViolation("users_email_key".to_string()));
                }
            }
            if let (Some(ci), Some(oi)) = (candidate.identity(), other.identity()) {
                if ci.provider() == oi.provider()
                    && ci.provider_user_id() == oi.provider_user_id()
                {
                    return Err(StoreError::UniqueViolation(
                        "user_identities_provider_provider_user_id_key".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl AccountStore for MemoryAccountStore {
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()?
            .values()
            .find(|u| u.email() == Some(email))
            .cloned())
    }

    fn find_by_provider_subject(
        &self,
        provider: AuthProvider,
        provider_user_id: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()?
            .values()
            .find(|u| {
                u.identity().is_some_and(|i| {
                    i.provider() == provider && i.provider_user_id() == provider_user_id
                })
            })
            .cloned())
    }

    fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.lock()?;
        if users.contains_key(&user.id()) {
            return Err(StoreError::UniqueViolation("users_pkey".to_string()));
        }
        Self::check_constraints(&users, user)?;
        users.insert(user.id(), user.clone());
        Ok(())
    }

    fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.lock()?;
        if !users.contains_key(&user.id()) {
            return Err(StoreError::NotFound(format!("user {}", user.id())));
        }
        Self::check_constraints(&users, user)?;
        users.insert(user.id(), user.clone());
        Ok(())
    }
}
