// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use social_auth_api::ErrorResponse;

use crate::auth::adapter::ProviderError;
use crate::auth::password::PasswordError;
use crate::auth::social::ReconcileError;
use crate::domain::{AccountConflict, AuthProvider, InvariantViolation};
use crate::store::StoreError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    // === Erreurs Store ===
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Duplicate(String),
    #[error("Database error: {0}")]
    DatabaseError(String),

    // === Erreurs d'authentification locale ===
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Email already exists")]
    UserAlreadyExists,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Password too weak: {0}")]
    WeakPassword(String),
    #[error("Unauthorized: {0}")]
    UnauthorizedAction(String),

    // === Erreurs de rapprochement social ===
    #[error("{0}")]
    Conflict(AccountConflict),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("No adapter configured for provider: {0}")]
    ProviderNotConfigured(AuthProvider),
    #[error("{0}")]
    Provider(ProviderError),
    #[error("Provider returned an incomplete record: missing {0}")]
    IncompleteProviderData(&'static str),

    // === Erreurs internes ===
    #[error("Invariant violation: {0}")]
    Invariant(InvariantViolation),
    #[error("Password hashing failed: {0}")]
    PasswordHashingFailed(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, internal_detail) = self.get_error_info();

        if let Some(ref detail) = internal_detail {
            tracing::error!(error_code, %status, detail, "Internal server error");
        }

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details: None,
        });

        (status, body).into_response()
    }
}

impl AppError {
    /// Récupère les informations d'erreur formatées pour la réponse HTTP
    fn get_error_info(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            // 404 Not Found
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::UnknownProvider(msg) => (
                StatusCode::NOT_FOUND,
                "UNKNOWN_PROVIDER",
                format!("Unknown provider: {msg}"),
                None,
            ),

            // 409 Conflict
            AppError::Duplicate(msg) => {
                (StatusCode::CONFLICT, "DUPLICATE_ENTRY", msg.clone(), None)
            }
            AppError::UserAlreadyExists => (
                StatusCode::CONFLICT,
                "USER_EXISTS",
                "Email already exists".to_string(),
                None,
            ),
            AppError::Conflict(conflict) => {
                let code = match conflict {
                    AccountConflict::LocalAccountExists => "LOCAL_ACCOUNT_EXISTS",
                    AccountConflict::OtherProviderLinked => "OTHER_PROVIDER_LINKED",
                };
                (StatusCode::CONFLICT, code, conflict.to_string(), None)
            }

            // 401 Unauthorized
            AppError::InvalidPassword => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
                None,
            ),
            AppError::UnauthorizedAction(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }

            // 400 Bad Request
            AppError::InvalidEmail => (
                StatusCode::BAD_REQUEST,
                "INVALID_EMAIL",
                "Invalid email format".to_string(),
                None,
            ),
            AppError::WeakPassword(msg) => {
                (StatusCode::BAD_REQUEST, "WEAK_PASSWORD", msg.clone(), None)
            }

            // 502 Bad Gateway: the provider side misbehaved
            AppError::Provider(err) => (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_ERROR",
                "The identity provider rejected the request".to_string(),
                Some(err.to_string()),
            ),
            AppError::IncompleteProviderData(field) => (
                StatusCode::BAD_GATEWAY,
                "PROVIDER_DATA_INCOMPLETE",
                format!("The identity provider returned an incomplete record ({field})"),
                None,
            ),

            // 503 Service Unavailable
            AppError::ProviderNotConfigured(provider) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PROVIDER_NOT_CONFIGURED",
                format!("Login via {provider} is not available"),
                None,
            ),

            // 500 Internal Server Error
            AppError::Invariant(violation) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVARIANT_VIOLATION",
                "An internal consistency error occurred".to_string(),
                Some(violation.to_string()),
            ),
            AppError::PasswordHashingFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HASHING_ERROR",
                "An error occurred while processing your request".to_string(),
                Some(msg.clone()),
            ),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "An error occurred with the database".to_string(),
                Some(msg.clone()),
            ),
            AppError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
                Some(msg.clone()),
            ),
        }
    }

    // === Constructeurs helpers ===
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        AppError::DatabaseError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::UnauthorizedAction(msg.into())
    }

    /// Retourne le code de statut HTTP
    pub fn status_code(&self) -> StatusCode {
        self.get_error_info().0
    }
}

// === Conversions automatiques depuis les erreurs des couches internes ===

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::not_found(msg),
            StoreError::UniqueViolation(msg) => AppError::Duplicate(msg),
            StoreError::Pool(msg)
            | StoreError::ForeignKeyViolation(msg)
            | StoreError::Database(msg) => AppError::database(msg),
        }
    }
}

impl From<InvariantViolation> for AppError {
    fn from(err: InvariantViolation) -> Self {
        AppError::Invariant(err)
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::PasswordHashingFailed(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err)
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Conflict(conflict) => AppError::Conflict(conflict),
            ReconcileError::IncompleteData(field) => AppError::IncompleteProviderData(field),
            ReconcileError::Invariant(violation) => AppError::Invariant(violation),
            ReconcileError::Store(store) => store.into(),
        }
    }
}
