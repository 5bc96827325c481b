//! Provider adapter contract and payload normalization.
//!
//! The core never performs network I/O: an adapter owns the authorization-code
//! exchange and hands back a normalized [`ProviderUserData`]. The serde views
//! below map the raw provider payloads (Google userinfo, Facebook Graph `me`,
//! token grant) into that record.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::AuthProvider;

/// Données utilisateur normalisées renvoyées par un fournisseur.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderUserData {
    /// Stable provider-side subject identifier (e.g., Google "sub").
    pub provider_user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} OAuth error: {message}")]
    ExchangeFailed {
        provider: AuthProvider,
        message: String,
    },
    #[error("Malformed provider payload: {0}")]
    MalformedPayload(String),
}

/// Échange un code d'autorisation contre un profil normalisé.
///
/// Transport/provider-side failures surface as [`ProviderError`] and are
/// propagated, not retried.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> AuthProvider;

    /// URL de la page de consentement du fournisseur.
    fn authorization_url(&self, state: &str) -> String;

    fn resolve(&self, code: &str) -> Result<ProviderUserData, ProviderError>;
}

/// Adapters installés, un par fournisseur social.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    adapters: HashMap<AuthProvider, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider(), adapter);
    }

    pub fn get(&self, provider: AuthProvider) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider)
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

// === Raw payload views ===

/// Réponse du endpoint userinfo de Google.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    #[serde(default)]
    pub verified_email: bool,
}

/// Réponse Graph `me?fields=id,name,email,picture.type(large)` de Facebook.
#[derive(Debug, Clone, Deserialize)]
pub struct FacebookUserInfo {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<FacebookPicture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookPicture {
    pub data: FacebookPictureData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacebookPictureData {
    pub url: Option<String>,
}

/// Grant renvoyé par l'échange du code d'autorisation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenGrant {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, as reported by the provider.
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

impl ProviderUserData {
    pub fn from_google(info: GoogleUserInfo, grant: &TokenGrant) -> Self {
        Self {
            provider_user_id: info.id,
            email: info.email,
            display_name: info.name,
            avatar_url: info.picture,
            email_verified: info.verified_email,
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            token_expires_at: grant.expires_at(),
        }
    }

    /// Facebook ne renvoie ni flag de vérification ni refresh token.
    pub fn from_facebook(info: FacebookUserInfo, access_token: Option<String>) -> Self {
        Self {
            provider_user_id: info.id,
            email: info.email,
            display_name: info.name,
            avatar_url: info.picture.and_then(|p| p.data.url),
            email_verified: false,
            access_token,
            refresh_token: None,
            token_expires_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_payload_normalizes_all_fields() {
        let info: GoogleUserInfo = serde_json::from_value(serde_json::json!({
            "id": "g-123",
            "email": "a@x.com",
            "name": "Ada",
            "picture": "https://lh3.example/p.jpg",
            "verified_email": true
        }))
        .unwrap();
        let grant = TokenGrant {
            access_token: Some("at".to_string()),
            refresh_token: Some("rt".to_string()),
            expires_in: Some(3600),
        };

        let data = ProviderUserData::from_google(info, &grant);

        assert_eq!(data.provider_user_id, "g-123");
        assert_eq!(data.email.as_deref(), Some("a@x.com"));
        assert_eq!(data.display_name.as_deref(), Some("Ada"));
        assert_eq!(data.avatar_url.as_deref(), Some("https://lh3.example/p.jpg"));
        assert!(data.email_verified);
        assert_eq!(data.access_token.as_deref(), Some("at"));
        assert_eq!(data.refresh_token.as_deref(), Some("rt"));

        let expires = data.token_expires_at.expect("expiry set");
        let delta = expires - Utc::now();
        assert!(delta > Duration::seconds(3590) && delta <= Duration::seconds(3600));
    }

    #[test]
    fn google_verified_email_defaults_to_false() {
        let info: GoogleUserInfo =
            serde_json::from_value(serde_json::json!({ "id": "g-1" })).unwrap();
        let data = ProviderUserData::from_google(info, &TokenGrant::default());

        assert!(!data.email_verified);
        assert!(data.email.is_none());
        assert!(data.token_expires_at.is_none());
    }

    #[test]
    fn facebook_payload_extracts_nested_picture_url() {
        let info: FacebookUserInfo = serde_json::from_value(serde_json::json!({
            "id": "f-42",
            "name": "Grace",
            "email": "g@x.com",
            "picture": { "data": { "url": "https://graph.example/pic" } }
        }))
        .unwrap();

        let data = ProviderUserData::from_facebook(info, Some("fb-token".to_string()));

        assert_eq!(data.provider_user_id, "f-42");
        assert_eq!(data.avatar_url.as_deref(), Some("https://graph.example/pic"));
        assert_eq!(data.access_token.as_deref(), Some("fb-token"));
        assert!(data.refresh_token.is_none());
    }

    #[test]
    fn facebook_payload_without_picture_yields_no_avatar() {
        let info: FacebookUserInfo =
            serde_json::from_value(serde_json::json!({ "id": "f-1" })).unwrap();

        let data = ProviderUserData::from_facebook(info, None);
        assert!(data.avatar_url.is_none());
    }

    #[test]
    fn registry_returns_registered_adapter_only() {
        struct Dummy;
        impl ProviderAdapter for Dummy {
            fn provider(&self) -> AuthProvider {
                AuthProvider::Google
            }
            fn authorization_url(&self, _state: &str) -> String {
                "https://accounts.example/auth".to_string()
            }
            fn resolve(&self, _code: &str) -> Result<ProviderUserData, ProviderError> {
                Ok(ProviderUserData::default())
            }
        }

        let mut registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(Dummy));

        assert!(registry.get(AuthProvider::Google).is_some());
        assert!(registry.get(AuthProvider::Facebook).is_none());
    }
}
