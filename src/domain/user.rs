use chrono::{DateTime, Utc};
use social_auth_api::UserResponse;
use uuid::Uuid;

use super::error::InvariantViolation;
use super::identity::Identity;
use super::provider::AuthProvider;

pub const DEFAULT_ROLE: &str = "USER";

/// Compte utilisateur, local ou social.
///
/// `primary_provider` is the single source of truth for the authentication
/// technique: a password may exist only on LOCAL accounts, an identity only on
/// social accounts. The fallible setters enforce those combinations on every
/// mutation, independently of the reconciliation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub(crate) id: Uuid,
    pub(crate) email: Option<String>,
    pub(crate) roles: Vec<String>,
    pub(crate) password_hash: Option<String>,
    pub(crate) primary_provider: AuthProvider,
    pub(crate) display_name: Option<String>,
    pub(crate) avatar_url: Option<String>,
    pub(crate) is_verified: bool,
    pub(crate) is_active: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    pub(crate) last_login_at: Option<DateTime<Utc>>,
    pub(crate) identity: Option<Identity>,
}

impl User {
    /// Nouveau compte, LOCAL par défaut.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: None,
            roles: vec![DEFAULT_ROLE.to_string()],
            password_hash: None,
            primary_provider: AuthProvider::Local,
            display_name: None,
            avatar_url: None,
            is_verified: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            last_login_at: None,
            identity: None,
        }
    }

    // === Getters ===

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn primary_provider(&self) -> AuthProvider {
        self.primary_provider
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn identity_mut(&mut self) -> Option<&mut Identity> {
        self.identity.as_mut()
    }

    // === Guarded setters ===

    /// Définit le hash du mot de passe; réservé aux comptes LOCAL.
    pub fn set_password_hash(&mut self, hash: Option<String>) -> Result<(), InvariantViolation> {
        if hash.is_some() && self.primary_provider.is_social() {
            return Err(InvariantViolation::PasswordOnSocialAccount);
        }
        self.password_hash = hash;
        Ok(())
    }

    /// Change la méthode d'authentification principale.
    pub fn set_primary_provider(
        &mut self,
        provider: AuthProvider,
    ) -> Result<(), InvariantViolation> {
        if !provider.is_social() && self.identity.is_some() {
            return Err(InvariantViolation::LocalWithLinkedIdentity);
        }
        if provider.is_social() && self.password_hash.is_some() {
            return Err(InvariantViolation::SocialWithPassword);
        }
        self.primary_provider = provider;
        Ok(())
    }

    /// Rattache une identité sociale; interdit sur un compte LOCAL.
    pub fn attach_identity(&mut self, mut identity: Identity) -> Result<(), InvariantViolation> {
        if !self.primary_provider.is_social() {
            return Err(InvariantViolation::IdentityOnLocalAccount);
        }
        identity.user_id = self.id;
        self.identity = Some(identity);
        Ok(())
    }

    // === Plain setters ===

    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
    }

    /// Jamais vide: une liste vide retombe sur le rôle par défaut.
    pub fn set_roles(&mut self, roles: Vec<String>) {
        if roles.is_empty() {
            self.roles = vec![DEFAULT_ROLE.to_string()];
        } else {
            self.roles = roles;
        }
    }

    pub fn set_display_name(&mut self, name: Option<String>) {
        self.display_name = name;
    }

    pub fn set_avatar_url(&mut self, url: Option<String>) {
        self.avatar_url = url;
    }

    pub fn set_verified(&mut self, verified: bool) {
        self.is_verified = verified;
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn set_last_login_at(&mut self, at: Option<DateTime<Utc>>) {
        self.last_login_at = at;
    }

    pub fn touch_updated_at(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            primary_provider: user.primary_provider.to_string(),
            is_verified: user.is_verified,
            is_active: user.is_active,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}
