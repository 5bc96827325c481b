// src/app.rs

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::adapter::ProviderRegistry;
use crate::auth::services::AuthService;
use crate::auth::social::SocialAccountService;
use crate::handlers::auth::{login, register, social_callback, social_redirect};
use crate::handlers::health::health;
use crate::store::AccountStore;

/// Dépendances partagées par les handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub social: Arc<SocialAccountService>,
    pub providers: Arc<ProviderRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, providers: ProviderRegistry) -> Self {
        Self {
            auth: Arc::new(AuthService::new(store.clone())),
            social: Arc::new(SocialAccountService::new(store)),
            providers: Arc::new(providers),
        }
    }
}

/// Configure les routes d'authentification
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/{provider}", get(social_redirect))
        .route("/{provider}/callback", get(social_callback))
        .with_state(state)
}

/// Construit l'application complète
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes(state))
        // Middleware global de tracing
        .layer(TraceLayer::new_for_http())
}
