/// Database models for Noteleaf
///
/// This module contains all database models. Common CRUD goes through the
/// generic record controller in `db::controller`; each model adds only the
/// queries that are specific to its entity (access checks, joins, counts).
///
/// # Models
///
/// - `user`: User accounts and authentication state
/// - `category`: Shared vocabulary of note categories
/// - `note`: Notes and the per-note access set (sharing)
/// - `attachment`: File attachments belonging to notes
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
/// # Ok(())
/// # }
/// ```

pub mod attachment;
pub mod category;
pub mod note;
pub mod user;
