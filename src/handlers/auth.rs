// src/handlers/auth.rs

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use social_auth_api::{LoginRequest, RegisterRequest, SocialCallbackParams, UserResponse};
use uuid::Uuid;

use crate::app::AppState;
use crate::domain::AuthProvider;
use crate::error::AppError;

/// POST /auth/register
/// Inscription d'un nouvel utilisateur local
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.auth.register(payload)?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login
/// Connexion d'un utilisateur local
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth.login(&payload)?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /auth/{provider}
/// Redirection vers la page de consentement du fournisseur
pub async fn social_redirect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect, AppError> {
    let provider = parse_social_provider(&provider)?;
    let adapter = state
        .providers
        .get(provider)
        .ok_or(AppError::ProviderNotConfigured(provider))?;

    let csrf_state = Uuid::new_v4().simple().to_string();
    Ok(Redirect::temporary(&adapter.authorization_url(&csrf_state)))
}

/// GET /auth/{provider}/callback
/// Retour du fournisseur: échange le code puis rapproche le compte
pub async fn social_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<SocialCallbackParams>,
) -> Result<Json<UserResponse>, AppError> {
    let provider = parse_social_provider(&provider)?;
    let adapter = state
        .providers
        .get(provider)
        .ok_or(AppError::ProviderNotConfigured(provider))?;

    let data = adapter.resolve(&params.code)?;
    let user = state.social.reconcile(provider, &data)?;
    Ok(Json(UserResponse::from(&user)))
}

fn parse_social_provider(value: &str) -> Result<AuthProvider, AppError> {
    match AuthProvider::parse(value) {
        Some(provider) if provider.is_social() => Ok(provider),
        _ => Err(AppError::UnknownProvider(value.to_string())),
    }
}
