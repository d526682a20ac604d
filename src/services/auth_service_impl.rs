//! Credential-store backed implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::models::{Account, NewAccount, Role};
use crate::services::auth_service::{
    AuthError, AuthService, Identity, LoginOutcome, RegistrationForm,
};
use crate::services::credentials::CredentialStore;
use crate::services::password;
use crate::services::token::{TokenClaims, TokenIssuer};

pub struct PortalAuthService {
    credentials: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
    security: SecurityConfig,
}

impl PortalAuthService {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: TokenIssuer,
        security: SecurityConfig,
    ) -> Self {
        Self {
            credentials,
            tokens,
            security,
        }
    }
}

#[async_trait]
impl AuthService for PortalAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = email.trim().to_lowercase();
        let password = password.trim();

        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let Some(account) = self.credentials.find_by_email(&email).await? else {
            info!(email = %email, "Login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password_blocking(password, &account.password_hash).await? {
            info!(user_id = %account.user_id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !account.is_active {
            info!(user_id = %account.user_id, "Login rejected: account not active");
            return Err(AuthError::AccountInactive);
        }

        let role: Role = account.designation.parse().map_err(|_| {
            warn!(
                user_id = %account.user_id,
                designation = %account.designation,
                "Login rejected: designation has no dashboard"
            );
            AuthError::UnknownRole(account.designation.clone())
        })?;

        let token = self.tokens.issue(&account.user_id, role)?;

        info!(user_id = %account.user_id, role = %role, "Login succeeded");

        Ok(LoginOutcome {
            identity: Identity {
                user_id: account.user_id,
                role,
                municipality: account.municipality,
            },
            token,
        })
    }

    async fn register(&self, form: RegistrationForm) -> Result<Account, AuthError> {
        let form = form.normalized();

        if form.has_blank_field() {
            return Err(AuthError::MissingFields);
        }

        if self.credentials.email_taken(&form.email).await? {
            return Err(AuthError::DuplicateEmail);
        }

        if self.credentials.username_taken(&form.username).await? {
            return Err(AuthError::DuplicateUsername);
        }

        let birthday = form.parse_birthday()?;

        let password_hash = password::hash_password_blocking(&form.password, &self.security)
            .await
            .map_err(|e| AuthError::PersistenceFailure(format!("{e:#}")))?;

        let account = self
            .credentials
            .create(NewAccount {
                full_name: form.full_name,
                municipality: form.municipality,
                id_number: form.id_number,
                designation: form.designation,
                email: form.email,
                gender: form.gender,
                birthday,
                username: form.username,
                password_hash,
            })
            .await?;

        info!(
            user_id = %account.user_id,
            email = %account.email,
            "Registered new account pending approval"
        );

        Ok(account)
    }

    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.tokens.verify(token)
    }
}
