use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use uuid::Uuid;

use crate::domain::{AuthProvider, Identity, User};
use crate::store::schema::{user_identities, users};
use crate::store::StoreError;

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub password_hash: Option<String>,
    pub primary_provider: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = user_identities)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IdentityRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub linked_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub profile: Option<serde_json::Value>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().map(str::to_string),
            roles: user.roles().to_vec(),
            password_hash: user.password_hash().map(str::to_string),
            primary_provider: user.primary_provider().to_string(),
            display_name: user.display_name().map(str::to_string),
            avatar_url: user.avatar_url().map(str::to_string),
            is_verified: user.is_verified(),
            is_active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
            last_login_at: user.last_login_at(),
        }
    }
}

impl From<&Identity> for IdentityRow {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id(),
            user_id: identity.user_id(),
            provider: identity.provider().to_string(),
            provider_user_id: identity.provider_user_id().to_string(),
            provider_email: identity.provider_email().map(str::to_string),
            access_token: identity.access_token().map(str::to_string),
            refresh_token: identity.refresh_token().map(str::to_string),
            token_expires_at: identity.token_expires_at(),
            linked_at: identity.linked_at(),
            last_used_at: identity.last_used_at(),
            profile: identity.profile().cloned(),
        }
    }
}

fn parse_provider(value: &str) -> Result<AuthProvider, StoreError> {
    AuthProvider::parse(value)
        .ok_or_else(|| StoreError::Database(format!("unknown provider value in store: {value}")))
}

impl UserRow {
    /// Réhydrate l'entité domaine depuis les lignes chargées.
    pub fn into_domain(self, identity: Option<IdentityRow>) -> Result<User, StoreError> {
        let identity = identity.map(IdentityRow::into_domain).transpose()?;
        Ok(User {
            id: self.id,
            email: self.email,
            roles: self.roles,
            password_hash: self.password_hash,
            primary_provider: parse_provider(&self.primary_provider)?,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            is_verified: self.is_verified,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
            identity,
        })
    }
}

impl IdentityRow {
    pub fn into_domain(self) -> Result<Identity, StoreError> {
        Ok(Identity {
            id: self.id,
            user_id: self.user_id,
            provider: parse_provider(&self.provider)?,
            provider_user_id: self.provider_user_id,
            provider_email: self.provider_email,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_expires_at: self.token_expires_at,
            linked_at: self.linked_at,
            last_used_at: self.last_used_at,
            profile: self.profile,
        })
    }
}
