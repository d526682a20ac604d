//! Domain service for authentication and self-registration.
//!
//! Handles credential checks, token issuance, and new-account validation.
//! Session state is owned by the web layer; this service only reports who
//! authenticated and where they belong.

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Account, Role};
use crate::services::token::TokenClaims;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Required fields are missing")]
    MissingFields,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not active")]
    AccountInactive,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Invalid date")]
    InvalidDate,

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::PersistenceFailure(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl AuthError {
    /// Short label used for metrics and log fields.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountInactive => "account_inactive",
            Self::DuplicateEmail => "duplicate_email",
            Self::DuplicateUsername => "duplicate_username",
            Self::InvalidDate => "invalid_date",
            Self::PersistenceFailure(_) => "persistence_failure",
            Self::UnknownRole(_) => "unknown_role",
            Self::Session(_) => "session_error",
            Self::Token(_) => "token_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Who logged in, as recorded in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub municipality: Option<String>,
}

/// Successful login: the identity plus its signed token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub token: String,
}

impl LoginOutcome {
    #[must_use]
    pub const fn redirect_path(&self) -> &'static str {
        self.identity.role.dashboard_path()
    }
}

/// Raw registration form. Missing form keys deserialize as blanks so they
/// are reported as [`AuthError::MissingFields`] instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub municipality: String,
    pub id_number: String,
    pub designation: String,
    pub email: String,
    pub gender: String,
    pub birthday: String,
    pub username: String,
    pub password: String,
}

impl RegistrationForm {
    /// Trim every field and lower-case the email.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            municipality: self.municipality.trim().to_string(),
            id_number: self.id_number.trim().to_string(),
            designation: self.designation.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            gender: self.gender.trim().to_string(),
            birthday: self.birthday.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.trim().to_string(),
        }
    }

    #[must_use]
    pub fn has_blank_field(&self) -> bool {
        [
            &self.full_name,
            &self.municipality,
            &self.id_number,
            &self.designation,
            &self.email,
            &self.gender,
            &self.birthday,
            &self.username,
            &self.password,
        ]
        .iter()
        .any(|field| field.is_empty())
    }

    /// Birthdays are submitted as `YYYY-MM-DD`.
    pub fn parse_birthday(&self) -> Result<chrono::NaiveDate, AuthError> {
        chrono::NaiveDate::parse_from_str(&self.birthday, "%Y-%m-%d")
            .map_err(|_| AuthError::InvalidDate)
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingFields`] for blank input,
    /// [`AuthError::InvalidCredentials`] for an unknown email or wrong password,
    /// [`AuthError::AccountInactive`] for unapproved accounts, and
    /// [`AuthError::UnknownRole`] when the designation maps to no dashboard.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError>;

    /// Creates a new inactive account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingFields`], [`AuthError::DuplicateEmail`],
    /// [`AuthError::DuplicateUsername`], [`AuthError::InvalidDate`], or
    /// [`AuthError::PersistenceFailure`].
    async fn register(&self, form: RegistrationForm) -> Result<Account, AuthError>;

    /// Validates a token previously issued by [`AuthService::login`].
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}
