/// Category model and database operations
///
/// Categories are a shared, admin-managed vocabulary; notes reference them
/// by id. A category that still has notes attached cannot be deleted, which
/// is enforced both here (a pre-check with a readable message) and by the
/// `ON DELETE RESTRICT` foreign key.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(50) NOT NULL UNIQUE,
///     description VARCHAR(200),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::controller::{Controller, Filter, Insert, Patch, Record, StoreError, Value};
use crate::models::note::Note;

/// Category model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID (UUID v4)
    pub id: Uuid,

    /// Category name, unique across all categories
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// When the category was created
    pub created_at: DateTime<Utc>,

    /// When the category was last updated (None if never updated)
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Category {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static str = "id, name, description, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input for creating a new category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

impl Insert<Category> for CreateCategory {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::Text(self.name.clone())),
            ("description", Value::NullableText(self.description.clone())),
        ]
    }
}

/// Input for updating an existing category
///
/// Only present fields are written; `description` uses `Some(None)` to clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl Patch<Category> for UpdateCategory {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut changes = Vec::new();
        if let Some(ref name) = self.name {
            changes.push(("name", Value::Text(name.clone())));
        }
        if let Some(ref description) = self.description {
            changes.push(("description", Value::NullableText(description.clone())));
        }
        changes
    }
}

impl Category {
    /// Shared CRUD controller for the categories table
    pub const CONTROLLER: Controller<Category> = Controller::new();

    /// Number of notes referencing this category
    pub async fn note_count<'e, E>(exec: E, category_id: Uuid) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        Note::CONTROLLER
            .count(exec, &[Filter::eq("category_id", category_id)])
            .await
    }

    /// Deletes a category, refusing while notes still reference it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if any note uses the category,
    /// `StoreError::NotFound` if it does not exist.
    pub async fn delete_if_unused(pool: &sqlx::PgPool, category_id: Uuid) -> Result<Self, StoreError> {
        let in_use = Self::note_count(pool, category_id).await?;
        if in_use > 0 {
            return Err(StoreError::Validation(format!(
                "category is still used by {} note(s) and cannot be deleted",
                in_use
            )));
        }
        Self::CONTROLLER.delete_by_id(pool, category_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_category_values() {
        let create = CreateCategory {
            name: "work".to_string(),
            description: None,
        };

        let values = create.values();
        assert_eq!(values[0], ("name", Value::Text("work".to_string())));
        assert_eq!(values[1], ("description", Value::NullableText(None)));
    }

    #[test]
    fn test_update_category_clear_description() {
        let update = UpdateCategory {
            description: Some(None),
            ..Default::default()
        };

        assert_eq!(
            update.changes(),
            vec![("description", Value::NullableText(None))]
        );
    }

    // Integration tests for database operations are in tests/
}
