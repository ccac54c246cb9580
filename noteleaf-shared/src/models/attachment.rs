/// Attachment model and database operations
///
/// Attachments are metadata rows pointing at files on disk; the bytes
/// themselves live under the upload directory and are managed by
/// `storage::AttachmentStore`. Access control is inherited from the parent
/// note: whoever can see the note can see its attachments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attachments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     note_id UUID NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
///     filename VARCHAR(255) NOT NULL,
///     storage_path VARCHAR(512) NOT NULL,
///     size_bytes BIGINT NOT NULL,
///     mime_type VARCHAR(100) NOT NULL,
///     description VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::controller::{Controller, Filter, Insert, Record, StoreError, Value};

/// Attachment metadata for a file stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    /// Unique attachment ID (UUID v4)
    pub id: Uuid,

    /// Parent note
    pub note_id: Uuid,

    /// Original filename as uploaded by the client
    pub filename: String,

    /// Path of the stored file, relative to the upload root
    ///
    /// Never derived from client input; see `storage::storage_name`.
    pub storage_path: String,

    /// Size on disk in bytes, measured after the write
    pub size_bytes: i64,

    /// MIME type reported by the client, or `application/octet-stream`
    pub mime_type: String,

    /// Optional caption
    pub description: Option<String>,

    /// When the attachment was uploaded
    pub created_at: DateTime<Utc>,

    /// When the metadata was last updated (None if never updated)
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Attachment {
    const TABLE: &'static str = "attachments";
    const COLUMNS: &'static str =
        "id, note_id, filename, storage_path, size_bytes, mime_type, description, created_at, updated_at";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Input for recording a newly stored attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachment {
    pub note_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub mime_type: String,
    pub description: Option<String>,
}

impl Insert<Attachment> for CreateAttachment {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("note_id", Value::Uuid(self.note_id)),
            ("filename", Value::Text(self.filename.clone())),
            ("storage_path", Value::Text(self.storage_path.clone())),
            ("size_bytes", Value::Int(self.size_bytes)),
            ("mime_type", Value::Text(self.mime_type.clone())),
            ("description", Value::NullableText(self.description.clone())),
        ]
    }
}

impl Attachment {
    /// Shared CRUD controller for the attachments table
    pub const CONTROLLER: Controller<Attachment> = Controller::new();

    /// All attachments belonging to a note
    pub async fn list_for_note<'e, E>(exec: E, note_id: Uuid) -> Result<Vec<Self>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        Self::CONTROLLER
            .all(exec, &[Filter::eq("note_id", note_id)])
            .await
    }

    /// Storage paths of every attachment on a note
    ///
    /// Used when a note is deleted, to remove the files after the rows
    /// are gone.
    pub async fn storage_paths_for_note<'e, E>(
        exec: E,
        note_id: Uuid,
    ) -> Result<Vec<String>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let paths: Vec<(String,)> =
            sqlx::query_as("SELECT storage_path FROM attachments WHERE note_id = $1")
                .bind(note_id)
                .fetch_all(exec)
                .await
                .map_err(StoreError::from_sqlx)?;
        Ok(paths.into_iter().map(|(p,)| p).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_attachment_values() {
        let create = CreateAttachment {
            note_id: Uuid::new_v4(),
            filename: "report.pdf".to_string(),
            storage_path: "user-id/uuid.pdf".to_string(),
            size_bytes: 1024,
            mime_type: "application/pdf".to_string(),
            description: None,
        };

        let values = create.values();
        assert_eq!(values.len(), 6);
        assert_eq!(values[3], ("size_bytes", Value::Int(1024)));
        assert_eq!(
            values[4],
            ("mime_type", Value::Text("application/pdf".to_string()))
        );
    }

    // Integration tests for database operations are in tests/
}
