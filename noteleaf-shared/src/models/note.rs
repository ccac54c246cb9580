/// Note model, access set, and database operations
///
/// Notes are visible only through the access set in `note_shares`. Creating
/// a note and granting its creator access happen in one transaction, so a
/// note can never exist with an empty access set; `revoke_access` locks the
/// whole set and refuses to remove the last remaining user for the same
/// reason.
///
/// Every read path here is scoped by user id. A note the user has no share
/// row for behaves exactly like a note that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE notes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     content TEXT NOT NULL,
///     published BOOLEAN NOT NULL DEFAULT FALSE,
///     category_id UUID REFERENCES categories(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
///
/// CREATE TABLE note_shares (
///     note_id UUID NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (note_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use noteleaf_shared::models::note::{Note, CreateNote};
/// use noteleaf_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let note = Note::create_owned(&pool, CreateNote {
///     title: "Meeting notes".to_string(),
///     content: "Agenda ...".to_string(),
///     published: false,
///     category_id: None,
/// }, owner_id).await?;
///
/// // Only users in the access set can see it
/// let visible = Note::fetch_for_user(&pool, note.id, owner_id).await?;
/// assert!(visible.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::controller::{escape_like, Controller, Insert, Patch, Record, StoreError, Value};

/// Note model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    /// Unique note ID (UUID v4)
    pub id: Uuid,

    /// Note title
    pub title: String,

    /// Note body
    pub content: String,

    /// Whether the note is marked as published
    pub published: bool,

    /// Optional category reference
    pub category_id: Option<Uuid>,

    /// When the note was created
    pub created_at: DateTime<Utc>,

    /// When the note was last updated (None if never updated)
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Note {
    const TABLE: &'static str = "notes";
    const COLUMNS: &'static str =
        "id, title, content, published, category_id, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// One row of the access set: this user can see this note
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteShare {
    pub note_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    pub published: bool,
    pub category_id: Option<Uuid>,
}

impl Insert<Note> for CreateNote {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("title", Value::Text(self.title.clone())),
            ("content", Value::Text(self.content.clone())),
            ("published", Value::Bool(self.published)),
            ("category_id", Value::NullableUuid(self.category_id)),
        ]
    }
}

/// Input for updating an existing note
///
/// Only present fields are written; `category_id` uses `Some(None)` to
/// detach the note from its category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
    pub category_id: Option<Option<Uuid>>,
}

impl Patch<Note> for UpdateNote {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut changes = Vec::new();
        if let Some(ref title) = self.title {
            changes.push(("title", Value::Text(title.clone())));
        }
        if let Some(ref content) = self.content {
            changes.push(("content", Value::Text(content.clone())));
        }
        if let Some(published) = self.published {
            changes.push(("published", Value::Bool(published)));
        }
        if let Some(category_id) = self.category_id {
            changes.push(("category_id", Value::NullableUuid(category_id)));
        }
        changes
    }
}

const NOTE_COLUMNS_QUALIFIED: &str =
    "n.id, n.title, n.content, n.published, n.category_id, n.created_at, n.updated_at";

impl Note {
    /// Shared CRUD controller for the notes table
    pub const CONTROLLER: Controller<Note> = Controller::new();

    /// Creates a note and grants its creator access, atomically.
    ///
    /// The insert and the initial share row commit together; if either
    /// fails, neither exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if `category_id` references a
    /// category the foreign key rejects, or on any other constraint
    /// violation the database reports as a unique conflict.
    pub async fn create_owned(
        pool: &PgPool,
        data: CreateNote,
        owner_id: Uuid,
    ) -> Result<Self, StoreError> {
        let mut tx = pool.begin().await.map_err(StoreError::from_sqlx)?;

        let note = Self::CONTROLLER.create(&mut *tx, &data).await?;

        sqlx::query("INSERT INTO note_shares (note_id, user_id) VALUES ($1, $2)")
            .bind(note.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        tx.commit().await.map_err(StoreError::from_sqlx)?;
        Ok(note)
    }

    /// Fetches a note only if `user_id` is in its access set.
    ///
    /// An existing note the user cannot see returns `None`, same as a
    /// missing note.
    pub async fn fetch_for_user<'e, E>(
        exec: E,
        note_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM notes n \
             JOIN note_shares s ON s.note_id = n.id \
             WHERE n.id = $1 AND s.user_id = $2",
            NOTE_COLUMNS_QUALIFIED
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(note_id)
            .bind(user_id)
            .fetch_optional(exec)
            .await
            .map_err(StoreError::from_sqlx)
    }

    /// Paginated list of the notes in a user's access set,
    /// identifier-ascending so pages are stable.
    pub async fn list_for_user<'e, E>(
        exec: E,
        user_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Self>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM notes n \
             JOIN note_shares s ON s.note_id = n.id \
             WHERE s.user_id = $1 \
             ORDER BY n.id ASC OFFSET $2 LIMIT $3",
            NOTE_COLUMNS_QUALIFIED
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .bind(skip.max(0))
            .bind(limit)
            .fetch_all(exec)
            .await
            .map_err(StoreError::from_sqlx)
    }

    /// Number of notes in a user's access set
    pub async fn count_for_user<'e, E>(exec: E, user_id: Uuid) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM note_shares WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(exec)
                .await
                .map_err(StoreError::from_sqlx)?;
        Ok(count)
    }

    /// Case-insensitive title search within a user's access set.
    ///
    /// `text` is matched as a literal substring; pattern metacharacters
    /// in it carry no meaning.
    pub async fn search_for_user<'e, E>(
        exec: E,
        user_id: Uuid,
        text: &str,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Self>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM notes n \
             JOIN note_shares s ON s.note_id = n.id \
             WHERE s.user_id = $1 AND n.title ILIKE '%' || $2 || '%' \
             ORDER BY n.id ASC OFFSET $3 LIMIT $4",
            NOTE_COLUMNS_QUALIFIED
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .bind(escape_like(text))
            .bind(skip.max(0))
            .bind(limit)
            .fetch_all(exec)
            .await
            .map_err(StoreError::from_sqlx)
    }

    /// Number of matching notes for a title search within the access set
    pub async fn search_count_for_user<'e, E>(
        exec: E,
        user_id: Uuid,
        text: &str,
    ) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notes n \
             JOIN note_shares s ON s.note_id = n.id \
             WHERE s.user_id = $1 AND n.title ILIKE '%' || $2 || '%'",
        )
        .bind(user_id)
        .bind(escape_like(text))
        .fetch_one(exec)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(count)
    }

    /// Whether `user_id` is in this note's access set
    pub async fn is_accessible<'e, E>(
        exec: E,
        note_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM note_shares WHERE note_id = $1 AND user_id = $2)",
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_one(exec)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(exists)
    }

    /// Number of users with access to this note
    pub async fn accessor_count<'e, E>(exec: E, note_id: Uuid) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM note_shares WHERE note_id = $1")
                .bind(note_id)
                .fetch_one(exec)
                .await
                .map_err(StoreError::from_sqlx)?;
        Ok(count)
    }

    /// Adds a user to this note's access set.
    ///
    /// Returns `false` without error if the user already has access.
    pub async fn grant_access(
        pool: &PgPool,
        note_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO note_shares (note_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (note_id, user_id) DO NOTHING",
        )
        .bind(note_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a user from this note's access set.
    ///
    /// Returns `false` without error if the user had no access. Refuses to
    /// remove the last remaining accessor. The transaction locks the
    /// note's entire access set with `FOR UPDATE`, so concurrent revokes
    /// of different users serialize and cannot each observe the other's
    /// row as still present and empty the set together.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` when the user is the note's only
    /// remaining accessor.
    pub async fn revoke_access(
        pool: &PgPool,
        note_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut tx = pool.begin().await.map_err(StoreError::from_sqlx)?;

        let accessors: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM note_shares WHERE note_id = $1 FOR UPDATE")
                .bind(note_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(StoreError::from_sqlx)?;

        if !accessors.iter().any(|(id,)| *id == user_id) {
            tx.rollback().await.map_err(StoreError::from_sqlx)?;
            return Ok(false);
        }

        if accessors.len() <= 1 {
            tx.rollback().await.map_err(StoreError::from_sqlx)?;
            return Err(StoreError::Validation(
                "cannot remove the last user with access to a note".to_string(),
            ));
        }

        sqlx::query("DELETE FROM note_shares WHERE note_id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        tx.commit().await.map_err(StoreError::from_sqlx)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_note_values_order() {
        let create = CreateNote {
            title: "t".to_string(),
            content: "c".to_string(),
            published: true,
            category_id: None,
        };

        let columns: Vec<&str> = create.values().iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["title", "content", "published", "category_id"]);
    }

    #[test]
    fn test_update_note_detach_category() {
        let update = UpdateNote {
            category_id: Some(None),
            ..Default::default()
        };

        assert_eq!(
            update.changes(),
            vec![("category_id", Value::NullableUuid(None))]
        );
    }

    #[test]
    fn test_update_note_empty_patch() {
        assert!(UpdateNote::default().changes().is_empty());
    }

    // Integration tests for access-set semantics are in tests/
}
