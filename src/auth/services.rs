// src/auth/services.rs

use std::sync::Arc;

use chrono::Utc;
use social_auth_api::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use uuid::Uuid;

use crate::domain::User;
use crate::error::AppError;
use crate::store::AccountStore;

use super::password::PasswordManager;

/// Parcours local (mot de passe): inscription, connexion, changement de
/// mot de passe.
///
/// Never touches identities and always leaves `primary_provider = LOCAL`;
/// the entity guards reject any attempt to attach social state here.
pub struct AuthService {
    store: Arc<dyn AccountStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Inscription d'un nouvel utilisateur local
    pub fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        if !Self::is_valid_email(&request.email) {
            return Err(AppError::InvalidEmail);
        }

        if !Self::is_strong_password(&request.password) {
            return Err(AppError::WeakPassword(
                "Password must be at least 8 characters with uppercase, lowercase and numbers"
                    .to_string(),
            ));
        }

        if self.store.find_user_by_email(&request.email)?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = PasswordManager::hash(&request.password)?;

        let mut user = User::new();
        user.set_email(Some(request.email));
        user.set_display_name(request.display_name);
        user.set_password_hash(Some(password_hash))?;

        self.store.insert_user(&user)?;
        tracing::info!(user_id = %user.id(), "registered local account");
        Ok(user)
    }

    /// Connexion d'un utilisateur local
    pub fn login(&self, request: &LoginRequest) -> Result<User, AppError> {
        if !Self::is_valid_email(&request.email) {
            return Err(AppError::InvalidEmail);
        }

        let mut user = self
            .store
            .find_user_by_email(&request.email)?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !user.is_active() {
            return Err(AppError::unauthorized("Account is deactivated"));
        }

        // Social accounts carry no password; they must use their provider
        let password_hash = user
            .password_hash()
            .ok_or(AppError::InvalidPassword)?
            .to_string();

        if !PasswordManager::verify(&request.password, &password_hash)? {
            return Err(AppError::InvalidPassword);
        }

        user.set_last_login_at(Some(Utc::now()));
        user.touch_updated_at();
        self.store.update_user(&user)?;

        Ok(user)
    }

    /// Change le mot de passe d'un compte local
    pub fn change_password(
        &self,
        user_id: Uuid,
        request: &ChangePasswordRequest,
    ) -> Result<(), AppError> {
        if !Self::is_strong_password(&request.new_password) {
            return Err(AppError::WeakPassword(
                "Password must be at least 8 characters with uppercase, lowercase and numbers"
                    .to_string(),
            ));
        }

        let mut user = self
            .store
            .find_user_by_id(user_id)?
            .ok_or_else(|| AppError::not_found("User"))?;

        let current_hash = user
            .password_hash()
            .ok_or_else(|| AppError::database("Password not set for user"))?
            .to_string();

        if !PasswordManager::verify(&request.old_password, &current_hash)? {
            return Err(AppError::InvalidPassword);
        }

        let new_hash = PasswordManager::hash(&request.new_password)?;
        user.set_password_hash(Some(new_hash))?;
        user.touch_updated_at();
        self.store.update_user(&user)?;

        Ok(())
    }

    // === Helpers de validation ===

    fn is_valid_email(email: &str) -> bool {
        email.contains('@') && email.contains('.') && email.len() > 5
    }

    fn is_strong_password(password: &str) -> bool {
        if password.len() < 8 {
            return false;
        }
        let (mut upper, mut lower, mut digit) = (false, false, false);
        for c in password.chars() {
            upper |= c.is_uppercase();
            lower |= c.is_lowercase();
            digit |= c.is_ascii_digit();
            if upper && lower && digit {
                return true;
            }
        }
        upper && lower && digit
    }
}
