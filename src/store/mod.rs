pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;

use uuid::Uuid;

use crate::domain::{AuthProvider, User};

/// Storage layer errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),
    #[error("Foreign key constraint violation: {0}")]
    ForeignKeyViolation(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => StoreError::NotFound("Record not found".to_string()),
            Error::DatabaseError(kind, info) => {
                let message = info.message().to_string();
                match kind {
                    DatabaseErrorKind::UniqueViolation => StoreError::UniqueViolation(message),
                    DatabaseErrorKind::ForeignKeyViolation => {
                        StoreError::ForeignKeyViolation(message)
                    }
                    _ => StoreError::Database(message),
                }
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for StoreError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        StoreError::Pool(err.to_string())
    }
}

/// Durable storage for user and identity records.
///
/// The reconciliation engine takes the store as an explicit dependency; every
/// call is a pure function of its input and the store's current snapshot.
/// Implementations must enforce three uniqueness constraints: `users.email`
/// (nullable-safe), `user_identities.(provider, provider_user_id)` and
/// `user_identities.user_id`, and must persist a user together with its
/// identity atomically — no partially-created account is ever observable.
pub trait AccountStore: Send + Sync {
    /// Charge un utilisateur (et son identité éventuelle) par id.
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Charge un utilisateur (et son identité éventuelle) par email.
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Recherche exacte par clé `(provider, provider_user_id)`.
    fn find_by_provider_subject(
        &self,
        provider: AuthProvider,
        provider_user_id: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Insère l'utilisateur et son identité éventuelle dans une même transaction.
    fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Réécrit l'utilisateur et son identité éventuelle dans une même transaction.
    fn update_user(&self, user: &User) -> Result<(), StoreError>;
}
