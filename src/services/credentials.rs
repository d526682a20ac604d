//! Account lookup and persistence behind one interface.
//!
//! [`BuiltinAccounts`] layers the configured operator accounts over another
//! store. They answer from memory, so logging in as one never touches the
//! database, yet they flow through the same login path as registered users.

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{BuiltinAccountConfig, SecurityConfig};
use crate::db::{Store, User};
use crate::models::{Account, NewAccount};
use crate::services::auth_service::AuthError;
use crate::services::password;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up an account by lower-cased email, including its password hash.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    async fn email_taken(&self, email: &str) -> Result<bool, AuthError>;

    async fn username_taken(&self, username: &str) -> Result<bool, AuthError>;

    /// Persists a new inactive account.
    ///
    /// # Errors
    ///
    /// Unique-constraint violations come back as [`AuthError::DuplicateEmail`]
    /// or [`AuthError::DuplicateUsername`]; anything else is
    /// [`AuthError::PersistenceFailure`].
    async fn create(&self, account: NewAccount) -> Result<Account, AuthError>;
}

fn account_from_user(user: User, password_hash: String) -> Account {
    Account {
        user_id: user.id.to_string(),
        email: user.email,
        username: user.username,
        designation: user.designation,
        municipality: Some(user.municipality),
        password_hash,
        is_active: user.is_active,
    }
}

fn map_insert_error(err: &anyhow::Error) -> AuthError {
    match err.downcast_ref::<DbErr>().and_then(DbErr::sql_err) {
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("email") => {
            AuthError::DuplicateEmail
        }
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("username") => {
            AuthError::DuplicateUsername
        }
        _ => AuthError::PersistenceFailure(format!("{err:#}")),
    }
}

#[async_trait]
impl CredentialStore for Store {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let found = self.get_user_by_email_with_password(email).await?;
        Ok(found.map(|(user, hash)| account_from_user(user, hash)))
    }

    async fn email_taken(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.get_user_by_email(email).await?.is_some())
    }

    async fn username_taken(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.get_user_by_username(username).await?.is_some())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let password_hash = account.password_hash.clone();
        self.create_user(account)
            .await
            .map(|user| account_from_user(user, password_hash))
            .map_err(|e| map_insert_error(&e))
    }
}

/// Configured operator accounts, always active, checked before `inner`.
pub struct BuiltinAccounts {
    by_email: HashMap<String, Account>,
    inner: Arc<dyn CredentialStore>,
}

impl BuiltinAccounts {
    /// Hashes the configured passwords once so built-in logins go through the
    /// same verifier as everyone else.
    pub async fn from_config(
        accounts: &[BuiltinAccountConfig],
        security: &SecurityConfig,
        inner: Arc<dyn CredentialStore>,
    ) -> anyhow::Result<Self> {
        let mut by_email = HashMap::with_capacity(accounts.len());

        for entry in accounts {
            let email = entry.email.trim().to_lowercase();
            let password_hash =
                password::hash_password_blocking(entry.password.trim(), security).await?;

            by_email.insert(
                email.clone(),
                Account {
                    user_id: entry.user_id.clone(),
                    email,
                    username: entry.user_id.clone(),
                    designation: entry.role.clone(),
                    municipality: entry.municipality.clone(),
                    password_hash,
                    is_active: true,
                },
            );
        }

        Ok(Self { by_email, inner })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

#[async_trait]
impl CredentialStore for BuiltinAccounts {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        if let Some(account) = self.by_email.get(email) {
            return Ok(Some(account.clone()));
        }
        self.inner.find_by_email(email).await
    }

    async fn email_taken(&self, email: &str) -> Result<bool, AuthError> {
        if self.by_email.contains_key(email) {
            return Ok(true);
        }
        self.inner.email_taken(email).await
    }

    async fn username_taken(&self, username: &str) -> Result<bool, AuthError> {
        if self
            .by_email
            .values()
            .any(|account| account.username.eq_ignore_ascii_case(username))
        {
            return Ok(true);
        }
        self.inner.username_taken(username).await
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        self.inner.create(account).await
    }
}
