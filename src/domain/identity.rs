use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::InvariantViolation;
use super::provider::AuthProvider;
use super::user::User;

/// Lien entre un compte et un fournisseur d'identité social.
///
/// The owning user is referenced by id only; the store enforces "exactly one
/// identity per user" through a unique index on that key, not by traversing
/// references.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) provider: AuthProvider,
    pub(crate) provider_user_id: String,
    pub(crate) provider_email: Option<String>,
    pub(crate) access_token: Option<String>,
    pub(crate) refresh_token: Option<String>,
    pub(crate) token_expires_at: Option<DateTime<Utc>>,
    pub(crate) linked_at: DateTime<Utc>,
    pub(crate) last_used_at: Option<DateTime<Utc>>,
    pub(crate) profile: Option<serde_json::Value>,
}

impl Identity {
    /// Crée un nouveau lien vers un fournisseur social.
    ///
    /// The owning user is assigned when the identity is attached
    /// (see [`User::attach_identity`]).
    pub fn new(
        provider: AuthProvider,
        provider_user_id: impl Into<String>,
    ) -> Result<Self, InvariantViolation> {
        if !provider.is_social() {
            return Err(InvariantViolation::LocalIdentityProvider);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            provider,
            provider_user_id: provider_user_id.into(),
            provider_email: None,
            access_token: None,
            refresh_token: None,
            token_expires_at: None,
            linked_at: Utc::now(),
            last_used_at: None,
            profile: None,
        })
    }

    // === Getters ===

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn provider(&self) -> AuthProvider {
        self.provider
    }

    pub fn provider_user_id(&self) -> &str {
        &self.provider_user_id
    }

    pub fn provider_email(&self) -> Option<&str> {
        self.provider_email.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_expires_at
    }

    pub fn linked_at(&self) -> DateTime<Utc> {
        self.linked_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn profile(&self) -> Option<&serde_json::Value> {
        self.profile.as_ref()
    }

    // === Guarded setters ===

    /// Changer le fournisseur; LOCAL est interdit ici.
    pub fn set_provider(&mut self, provider: AuthProvider) -> Result<(), InvariantViolation> {
        if !provider.is_social() {
            return Err(InvariantViolation::LocalIdentityProvider);
        }
        self.provider = provider;
        Ok(())
    }

    /// Rattacher l'identité à un propriétaire; un compte LOCAL est interdit.
    pub fn set_owner(&mut self, user: &User) -> Result<(), InvariantViolation> {
        if !user.primary_provider().is_social() {
            return Err(InvariantViolation::IdentityOnLocalAccount);
        }
        self.user_id = user.id();
        Ok(())
    }

    // === Plain setters ===

    pub fn set_provider_email(&mut self, email: Option<String>) {
        self.provider_email = email;
    }

    pub fn set_access_token(&mut self, token: Option<String>) {
        self.access_token = token;
    }

    pub fn set_refresh_token(&mut self, token: Option<String>) {
        self.refresh_token = token;
    }

    pub fn set_token_expires_at(&mut self, at: Option<DateTime<Utc>>) {
        self.token_expires_at = at;
    }

    pub fn set_last_used_at(&mut self, at: Option<DateTime<Utc>>) {
        self.last_used_at = at;
    }

    pub fn set_profile(&mut self, profile: Option<serde_json::Value>) {
        self.profile = profile;
    }
}
