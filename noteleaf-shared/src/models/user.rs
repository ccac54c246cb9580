/// User model and database operations
///
/// This module provides the User model. Common CRUD goes through the
/// generic record controller; lookups by username and email live here.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(100) NOT NULL UNIQUE,
///     email VARCHAR(100) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     full_name VARCHAR(100),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use noteleaf_shared::models::user::{User, CreateUser};
/// use noteleaf_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     full_name: Some("Ada Lovelace".to_string()),
///     is_active: true,
///     is_admin: false,
/// };
///
/// let user = User::CONTROLLER.create(&pool, &new_user).await?;
/// println!("Created user: {}", user.id);
///
/// // Find by username (authentication path)
/// let found = User::find_by_username(&pool, "ada").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::controller::{Controller, Filter, Insert, Patch, Record, StoreError, Value};

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
/// Deactivated accounts (`is_active = false`) keep their data but are
/// rejected at the authentication gate.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash
    ///
    /// Never serialized into API responses; handlers use `PublicUser`.
    pub password_hash: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Whether the account may authenticate
    pub is_active: bool,

    /// Whether the account may use administrative endpoints
    pub is_admin: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated (None if never updated)
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str =
        "id, username, email, password_hash, full_name, is_active, is_admin, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password!)
    pub password_hash: String,

    /// Optional display name
    pub full_name: Option<String>,

    /// Whether the account starts active
    pub is_active: bool,

    /// Whether the account starts with admin rights
    pub is_admin: bool,
}

impl Insert<User> for CreateUser {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("username", Value::Text(self.username.clone())),
            ("email", Value::Text(self.email.clone())),
            ("password_hash", Value::Text(self.password_hash.clone())),
            ("full_name", Value::NullableText(self.full_name.clone())),
            ("is_active", Value::Bool(self.is_active)),
            ("is_admin", Value::Bool(self.is_admin)),
        ]
    }
}

/// Input for updating an existing user
///
/// All fields are optional. Only present fields are written; `full_name`
/// uses `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New login name
    pub username: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New display name (use Some(None) to clear)
    pub full_name: Option<Option<String>>,

    /// Activate or deactivate the account
    pub is_active: Option<bool>,

    /// Grant or revoke admin rights
    pub is_admin: Option<bool>,
}

impl Patch<User> for UpdateUser {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut changes = Vec::new();
        if let Some(ref username) = self.username {
            changes.push(("username", Value::Text(username.clone())));
        }
        if let Some(ref email) = self.email {
            changes.push(("email", Value::Text(email.clone())));
        }
        if let Some(ref password_hash) = self.password_hash {
            changes.push(("password_hash", Value::Text(password_hash.clone())));
        }
        if let Some(ref full_name) = self.full_name {
            changes.push(("full_name", Value::NullableText(full_name.clone())));
        }
        if let Some(is_active) = self.is_active {
            changes.push(("is_active", Value::Bool(is_active)));
        }
        if let Some(is_admin) = self.is_admin {
            changes.push(("is_admin", Value::Bool(is_admin)));
        }
        changes
    }
}

impl User {
    /// Shared CRUD controller for the users table
    pub const CONTROLLER: Controller<User> = Controller::new();

    /// Finds a user by login name
    ///
    /// This is the authentication-path lookup; bearer tokens carry the
    /// username as their subject.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username<'e, E>(exec: E, username: &str) -> Result<Option<Self>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        Self::CONTROLLER
            .first(exec, &[Filter::eq("username", username)])
            .await
    }

    /// Finds a user by email address
    pub async fn find_by_email<'e, E>(exec: E, email: &str) -> Result<Option<Self>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        Self::CONTROLLER
            .first(exec, &[Filter::eq("email", email)])
            .await
    }
}
