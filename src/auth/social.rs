use std::sync::Arc;

use chrono::Utc;

use crate::auth::adapter::ProviderUserData;
use crate::domain::{AccountConflict, AuthProvider, Identity, InvariantViolation, User};
use crate::store::{AccountStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Conflict(#[from] AccountConflict),
    #[error("Provider returned an incomplete record: missing {0}")]
    IncompleteData(&'static str),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rapproche les données d'un fournisseur social d'un compte stocké.
///
/// Stateless: the store is an explicit dependency and every call is a function
/// of its input plus the store's current snapshot. On any conflict the stored
/// state is left untouched.
pub struct SocialAccountService {
    store: Arc<dyn AccountStore>,
}

impl SocialAccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Décide, pour `(provider, data)`, entre créer un compte, mettre à jour
    /// le compte lié existant, ou rejeter l'opération comme conflit.
    pub fn reconcile(
        &self,
        provider: AuthProvider,
        data: &ProviderUserData,
    ) -> Result<User, ReconcileError> {
        if data.provider_user_id.is_empty() {
            return Err(ReconcileError::IncompleteData("provider_user_id"));
        }

        // 1. Exact match on (provider, provider_user_id)
        if let Some(user) = self
            .store
            .find_by_provider_subject(provider, &data.provider_user_id)?
        {
            return self.refresh_linked_user(user, data);
        }

        // 2. Email collision with an unlinked account
        if let Some(existing) = self.find_email_owner(data)? {
            return Err(Self::classify_conflict(&existing).into());
        }

        // 3. Creation path, with one re-read if we lose a creation race
        match self.create_linked_user(provider, data) {
            Err(ReconcileError::Store(StoreError::UniqueViolation(constraint))) => {
                tracing::debug!(%constraint, %provider, "creation race lost, re-reading");
                if let Some(user) = self
                    .store
                    .find_by_provider_subject(provider, &data.provider_user_id)?
                {
                    self.refresh_linked_user(user, data)
                } else if let Some(existing) = self.find_email_owner(data)? {
                    Err(Self::classify_conflict(&existing).into())
                } else {
                    Err(StoreError::UniqueViolation(constraint).into())
                }
            }
            outcome => outcome,
        }
    }

    fn find_email_owner(&self, data: &ProviderUserData) -> Result<Option<User>, StoreError> {
        match data.email.as_deref() {
            Some(email) => self.store.find_user_by_email(email),
            None => Ok(None),
        }
    }

    fn classify_conflict(existing: &User) -> AccountConflict {
        if existing.primary_provider().is_social() {
            AccountConflict::OtherProviderLinked
        } else {
            AccountConflict::LocalAccountExists
        }
    }

    /// Crée le compte et son identité, liés, en une transaction.
    fn create_linked_user(
        &self,
        provider: AuthProvider,
        data: &ProviderUserData,
    ) -> Result<User, ReconcileError> {
        let now = Utc::now();

        let mut user = User::new();
        user.set_primary_provider(provider)?;
        user.set_email(data.email.clone());
        user.set_display_name(data.display_name.clone());
        user.set_avatar_url(data.avatar_url.clone());
        user.set_verified(verified_on_creation(provider, data));
        user.set_last_login_at(Some(now));

        let mut identity = Identity::new(provider, data.provider_user_id.clone())?;
        identity.set_provider_email(data.email.clone());
        identity.set_access_token(data.access_token.clone());
        identity.set_refresh_token(data.refresh_token.clone());
        identity.set_token_expires_at(data.token_expires_at);
        identity.set_last_used_at(Some(now));
        identity.set_profile(Some(profile_snapshot(provider, data)));
        user.attach_identity(identity)?;

        self.store.insert_user(&user)?;
        tracing::info!(user_id = %user.id(), %provider, "created social account");
        Ok(user)
    }

    /// Rafraîchit le compte lié au login suivant (profil + jetons).
    fn refresh_linked_user(
        &self,
        mut user: User,
        data: &ProviderUserData,
    ) -> Result<User, ReconcileError> {
        let now = Utc::now();
        user.set_last_login_at(Some(now));

        if user.display_name() != data.display_name.as_deref() {
            user.set_display_name(data.display_name.clone());
        }
        if user.avatar_url() != data.avatar_url.as_deref() {
            user.set_avatar_url(data.avatar_url.clone());
        }
        user.touch_updated_at();

        let provider = user
            .identity()
            .map(Identity::provider)
            .ok_or_else(|| StoreError::Database("social user has no identity row".to_string()))?;
        let snapshot = profile_snapshot(provider, data);

        if let Some(identity) = user.identity_mut() {
            identity.set_access_token(data.access_token.clone());
            // Some providers omit the refresh token on re-consent; keep the
            // stored one in that case.
            if data.refresh_token.is_some() {
                identity.set_refresh_token(data.refresh_token.clone());
            }
            identity.set_token_expires_at(data.token_expires_at);
            identity.set_last_used_at(Some(now));
            identity.set_profile(Some(snapshot));
        }

        self.store.update_user(&user)?;
        Ok(user)
    }
}

/// Politique de vérification à la création, propre à chaque fournisseur.
///
/// Facebook sends no verified-email flag; those accounts are marked verified.
/// Google and Apple report one and it is trusted as-is.
fn verified_on_creation(provider: AuthProvider, data: &ProviderUserData) -> bool {
    match provider {
        AuthProvider::Facebook => true,
        _ => data.email_verified,
    }
}

fn profile_snapshot(provider: AuthProvider, data: &ProviderUserData) -> serde_json::Value {
    match provider {
        AuthProvider::Facebook => serde_json::json!({
            "name": data.display_name,
            "picture": data.avatar_url,
        }),
        _ => serde_json::json!({
            "name": data.display_name,
            "picture": data.avatar_url,
            "verified_email": data.email_verified,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryAccountStore;
    use std::sync::Mutex;

    fn google_data(subject: &str, email: Option<&str>) -> ProviderUserData {
        ProviderUserData {
            provider_user_id: subject.to_string(),
            email: email.map(str::to_string),
            display_name: Some("Ada Lovelace".to_string()),
            avatar_url: Some("https://lh3.example/ada.jpg".to_string()),
            email_verified: true,
            access_token: Some("access-1".to_string()),
            refresh_token: Some("refresh-1".to_string()),
            token_expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        }
    }

    fn service_over(store: &Arc<MemoryAccountStore>) -> SocialAccountService {
        SocialAccountService::new(store.clone())
    }

    fn seed_local_user(store: &MemoryAccountStore, email: &str) -> User {
        let mut user = User::new();
        user.set_email(Some(email.to_string()));
        user.set_password_hash(Some("$2b$stored".to_string())).unwrap();
        store.insert_user(&user).unwrap();
        user
    }

    // ============================================
    // Creation path
    // ============================================

    #[test]
    fn empty_store_creates_linked_google_account() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);

        let user = service
            .reconcile(AuthProvider::Google, &google_data("g1", Some("a@x.com")))
            .expect("reconcile should create the account");

        assert_eq!(user.primary_provider(), AuthProvider::Google);
        assert_eq!(user.email(), Some("a@x.com"));
        assert_eq!(user.display_name(), Some("Ada Lovelace"));
        assert!(user.is_verified());
        assert!(user.password_hash().is_none());
        assert_eq!(user.roles(), ["USER".to_string()]);
        assert!(user.last_login_at().is_some());

        let identity = user.identity().expect("identity linked");
        assert_eq!(identity.provider(), AuthProvider::Google);
        assert_eq!(identity.provider_user_id(), "g1");
        assert_eq!(identity.user_id(), user.id());
        assert_eq!(identity.access_token(), Some("access-1"));
        assert!(identity.last_used_at().is_some());
        assert_eq!(
            identity.profile().unwrap()["verified_email"],
            serde_json::json!(true)
        );

        assert_eq!(store.user_count(), 1);
        assert_eq!(store.identity_count(), 1);
    }

    #[test]
    fn google_unverified_email_creates_unverified_account() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);

        let mut data = google_data("g1", Some("a@x.com"));
        data.email_verified = false;

        let user = service.reconcile(AuthProvider::Google, &data).unwrap();
        assert!(!user.is_verified());
    }

    #[test]
    fn facebook_account_is_verified_regardless_of_flag() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);

        let mut data = google_data("f1", Some("f@x.com"));
        data.email_verified = false;
        data.refresh_token = None;

        let user = service.reconcile(AuthProvider::Facebook, &data).unwrap();
        assert!(user.is_verified());

        // Facebook snapshots carry no verification flag
        let profile = user.identity().unwrap().profile().unwrap();
        assert!(profile.get("verified_email").is_none());
        assert_eq!(profile["name"], serde_json::json!("Ada Lovelace"));
    }

    #[test]
    fn accounts_without_email_skip_the_collision_check() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);

        service
            .reconcile(AuthProvider::Google, &google_data("g1", None))
            .unwrap();
        service
            .reconcile(AuthProvider::Google, &google_data("g2", None))
            .unwrap();

        assert_eq!(store.user_count(), 2);
    }

    // ============================================
    // Conflicts
    // ============================================

    #[test]
    fn local_account_with_same_email_yields_local_exists_conflict() {
        let store = Arc::new(MemoryAccountStore::new());
        let local = seed_local_user(&store, "a@x.com");
        let service = service_over(&store);

        let result = service.reconcile(AuthProvider::Google, &google_data("g2", Some("a@x.com")));

        assert!(matches!(
            result,
            Err(ReconcileError::Conflict(AccountConflict::LocalAccountExists))
        ));

        // No side effects: the local user is untouched and no rows were added
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.identity_count(), 0);
        let stored = store.find_user_by_id(local.id()).unwrap().unwrap();
        assert_eq!(stored, local);
    }

    #[test]
    fn email_linked_to_another_provider_yields_provider_conflict() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);
        service
            .reconcile(AuthProvider::Google, &google_data("g1", Some("a@x.com")))
            .unwrap();

        let result = service.reconcile(AuthProvider::Facebook, &google_data("f1", Some("a@x.com")));

        assert!(matches!(
            result,
            Err(ReconcileError::Conflict(AccountConflict::OtherProviderLinked))
        ));
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.identity_count(), 1);
    }

    #[test]
    fn same_provider_new_subject_with_taken_email_is_a_conflict() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);
        service
            .reconcile(AuthProvider::Google, &google_data("g1", Some("a@x.com")))
            .unwrap();

        let result = service.reconcile(AuthProvider::Google, &google_data("g2", Some("a@x.com")));

        assert!(matches!(
            result,
            Err(ReconcileError::Conflict(AccountConflict::OtherProviderLinked))
        ));
    }

    // ============================================
    // Update path
    // ============================================

    #[test]
    fn reconcile_is_idempotent() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);
        let data = google_data("g1", Some("a@x.com"));

        let first = service.reconcile(AuthProvider::Google, &data).unwrap();
        let second = service.reconcile(AuthProvider::Google, &data).unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(second.identity().unwrap().provider_user_id(), "g1");
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.identity_count(), 1);
    }

    #[test]
    fn update_path_refreshes_profile_and_tokens() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);
        service
            .reconcile(AuthProvider::Google, &google_data("g1", Some("a@x.com")))
            .unwrap();

        let mut data = google_data("g1", Some("a@x.com"));
        data.display_name = Some("New Name".to_string());
        data.access_token = Some("access-2".to_string());

        let user = service.reconcile(AuthProvider::Google, &data).unwrap();

        assert_eq!(user.display_name(), Some("New Name"));
        assert_eq!(user.identity().unwrap().access_token(), Some("access-2"));
        assert!(user.updated_at().is_some());
        assert_eq!(store.user_count(), 1);
        assert_eq!(store.identity_count(), 1);
    }

    #[test]
    fn missing_refresh_token_preserves_the_stored_one() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);
        service
            .reconcile(AuthProvider::Google, &google_data("g1", Some("a@x.com")))
            .unwrap();

        let mut data = google_data("g1", Some("a@x.com"));
        data.refresh_token = None;
        data.access_token = Some("access-2".to_string());

        let user = service.reconcile(AuthProvider::Google, &data).unwrap();
        let identity = user.identity().unwrap();

        assert_eq!(identity.refresh_token(), Some("refresh-1"));
        assert_eq!(identity.access_token(), Some("access-2"));
    }

    #[test]
    fn token_expiry_is_overwritten_even_when_absent() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);
        service
            .reconcile(AuthProvider::Google, &google_data("g1", None))
            .unwrap();

        let mut data = google_data("g1", None);
        data.token_expires_at = None;

        let user = service.reconcile(AuthProvider::Google, &data).unwrap();
        assert!(user.identity().unwrap().token_expires_at().is_none());
    }

    // ============================================
    // Bad input
    // ============================================

    #[test]
    fn missing_subject_fails_before_any_store_access() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);

        let mut data = google_data("", Some("a@x.com"));
        data.provider_user_id = String::new();

        let result = service.reconcile(AuthProvider::Google, &data);
        assert!(matches!(result, Err(ReconcileError::IncompleteData("provider_user_id"))));
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn local_provider_is_rejected_by_the_guard() {
        let store = Arc::new(MemoryAccountStore::new());
        let service = service_over(&store);

        let result = service.reconcile(AuthProvider::Local, &google_data("x1", None));
        assert!(matches!(
            result,
            Err(ReconcileError::Invariant(
                InvariantViolation::LocalIdentityProvider
            ))
        ));
        assert_eq!(store.user_count(), 0);
    }

    // ============================================
    // Creation race
    // ============================================

    /// Store double: the first insert loses against a rival write and raises
    /// the same unique violation Postgres would.
    struct RacingStore {
        inner: MemoryAccountStore,
        rival: Mutex<Option<User>>,
    }

    impl AccountStore for RacingStore {
        fn find_user_by_id(&self, id: uuid::Uuid) -> Result<Option<User>, StoreError> {
            self.inner.find_user_by_id(id)
        }

        fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_user_by_email(email)
        }

        fn find_by_provider_subject(
            &self,
            provider: AuthProvider,
            provider_user_id: &str,
        ) -> Result<Option<User>, StoreError> {
            self.inner.find_by_provider_subject(provider, provider_user_id)
        }

        fn insert_user(&self, user: &User) -> Result<(), StoreError> {
            if let Some(rival) = self.rival.lock().unwrap().take() {
                self.inner.insert_user(&rival).unwrap();
                return Err(StoreError::UniqueViolation(
                    "user_identities_provider_provider_user_id_key".to_string(),
                ));
            }
            self.inner.insert_user(user)
        }

        fn update_user(&self, user: &User) -> Result<(), StoreError> {
            self.inner.update_user(user)
        }
    }

    #[test]
    fn lost_creation_race_settles_on_the_surviving_row() {
        let mut rival = User::new();
        rival.set_primary_provider(AuthProvider::Google).unwrap();
        rival.set_email(Some("a@x.com".to_string()));
        rival.set_display_name(Some("Rival".to_string()));
        let identity = Identity::new(AuthProvider::Google, "g1").unwrap();
        rival.attach_identity(identity).unwrap();
        let rival_id = rival.id();

        let store = Arc::new(RacingStore {
            inner: MemoryAccountStore::new(),
            rival: Mutex::new(Some(rival)),
        });
        let service = SocialAccountService::new(store.clone());

        let user = service
            .reconcile(AuthProvider::Google, &google_data("g1", Some("a@x.com")))
            .expect("retry should take the update path");

        assert_eq!(user.id(), rival_id);
        // The surviving row was refreshed, not duplicated
        assert_eq!(user.identity().unwrap().access_token(), Some("access-1"));
        assert_eq!(store.inner.user_count(), 1);
    }
}
