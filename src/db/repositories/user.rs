use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::users;
use crate::models::NewAccount;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub full_name: String,
    pub municipality: String,
    pub id_number: String,
    pub designation: String,
    pub email: String,
    pub gender: String,
    pub birthday: chrono::NaiveDate,
    pub username: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            municipality: model.municipality,
            id_number: model.id_number,
            designation: model.designation,
            email: model.email,
            gender: model.gender,
            birthday: model.birthday,
            username: model.username,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by (lower-cased) email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by email together with the password hash (for login)
    pub async fn get_by_email_with_password(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn list(&self, pending_only: bool) -> Result<Vec<User>> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Id);
        if pending_only {
            query = query.filter(users::Column::IsActive.eq(false));
        }

        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Insert a new (inactive) user inside its own transaction.
    /// The transaction is rolled back if the insert fails.
    pub async fn create(&self, account: NewAccount) -> Result<User> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin user insert transaction")?;

        let now = chrono::Utc::now().to_rfc3339();
        let active = users::ActiveModel {
            id: NotSet,
            full_name: Set(account.full_name),
            municipality: Set(account.municipality),
            id_number: Set(account.id_number),
            designation: Set(account.designation),
            email: Set(account.email),
            gender: Set(account.gender),
            birthday: Set(account.birthday),
            username: Set(account.username),
            password_hash: Set(account.password_hash),
            is_active: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        match active.insert(&txn).await {
            Ok(model) => {
                txn.commit()
                    .await
                    .context("Failed to commit user insert")?;
                Ok(User::from(model))
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Failed to roll back user insert: {rollback_err}");
                }
                Err(anyhow::Error::new(e).context("Failed to insert user"))
            }
        }
    }

    /// Flip the approval flag. Returns false when no user has that email.
    pub async fn set_active(&self, email: &str, is_active: bool) -> Result<bool> {
        let Some(user) = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for activation")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}
