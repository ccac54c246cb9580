/// Attachment file storage on the local filesystem
///
/// Uploaded bytes live under a configurable root directory, one
/// subdirectory per user. Stored filenames are never derived from client
/// input: each file gets a fresh UUID plus a sanitized copy of the original
/// extension, so a hostile filename cannot escape the upload root or
/// collide with another upload.
///
/// # Example
///
/// ```no_run
/// use noteleaf_shared::storage::AttachmentStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), noteleaf_shared::storage::StorageError> {
/// let store = AttachmentStore::new("uploads");
/// let stored = store
///     .save(Uuid::new_v4(), "report.pdf", &b"%PDF-1.4 ..."[..])
///     .await?;
/// println!("{} bytes at {}", stored.size_bytes, stored.relative_path);
/// # Ok(())
/// # }
/// ```

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Longest extension kept from an uploaded filename
const MAX_EXTENSION_LEN: usize = 16;

/// Error type for attachment storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file that was written to disk
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Path relative to the store root, as recorded in the database
    pub relative_path: String,

    /// Size on disk in bytes, measured after the write
    pub size_bytes: i64,
}

/// Derives the on-disk filename for an upload
///
/// The name is a fresh UUID; only the extension survives from the original
/// filename, reduced to ASCII alphanumerics and capped in length. A missing
/// or fully rejected extension yields a bare UUID name.
pub fn storage_name(original_filename: &str) -> String {
    let id = Uuid::new_v4();

    let extension: String = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(MAX_EXTENSION_LEN)
                .collect()
        })
        .unwrap_or_default();

    if extension.is_empty() {
        id.to_string()
    } else {
        format!("{}.{}", id, extension.to_ascii_lowercase())
    }
}

/// Filesystem-backed store for attachment bytes
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    /// Creates a store rooted at the given directory
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a stored relative path
    pub fn absolute_path(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Writes uploaded bytes under the owner's subdirectory.
    ///
    /// The reported size is measured from disk after the write, not taken
    /// from the request.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created or
    /// the write fails.
    pub async fn save(
        &self,
        owner_id: Uuid,
        original_filename: &str,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let dir = self.root.join(owner_id.to_string());
        fs::create_dir_all(&dir).await?;

        let name = storage_name(original_filename);
        let path = dir.join(&name);

        fs::write(&path, data).await?;
        let size_bytes = fs::metadata(&path).await?.len() as i64;

        debug!(path = %path.display(), size_bytes, "Stored attachment file");

        Ok(StoredFile {
            relative_path: format!("{}/{}", owner_id, name),
            size_bytes,
        })
    }

    /// Reads a stored file back into memory
    pub async fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(self.absolute_path(relative_path)).await?)
    }

    /// Removes a stored file, best-effort.
    ///
    /// Returns `false` if the file could not be removed; the metadata row
    /// is gone by the time this runs, so the failure is logged and surfaced
    /// to the caller as a warning rather than an error.
    pub async fn remove(&self, relative_path: &str) -> bool {
        let path = self.absolute_path(relative_path);
        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove attachment file");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_name_keeps_sanitized_extension() {
        let name = storage_name("report.pdf");
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 36 + 4); // uuid + ".pdf"
    }

    #[test]
    fn test_storage_name_lowercases_extension() {
        assert!(storage_name("PHOTO.JPG").ends_with(".jpg"));
    }

    #[test]
    fn test_storage_name_strips_hostile_characters() {
        let name = storage_name("evil.p/../df");
        // Path::extension sees "df" here; nothing traversal-like survives
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_storage_name_without_extension() {
        let name = storage_name("README");
        assert_eq!(name.len(), 36); // bare uuid
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_storage_name_caps_extension_length() {
        let name = storage_name("file.aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        let ext = name.split('.').nth(1).unwrap();
        assert_eq!(ext.len(), MAX_EXTENSION_LEN);
    }

    #[test]
    fn test_storage_names_are_unique() {
        assert_ne!(storage_name("a.txt"), storage_name("a.txt"));
    }

    #[tokio::test]
    async fn test_save_read_remove_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AttachmentStore::new(dir.path());
        let owner = Uuid::new_v4();

        let stored = store
            .save(owner, "notes.txt", b"hello attachments")
            .await
            .expect("save should succeed");

        assert_eq!(stored.size_bytes, 17);
        assert!(stored.relative_path.starts_with(&owner.to_string()));

        let bytes = store.read(&stored.relative_path).await.expect("read");
        assert_eq!(bytes, b"hello attachments");

        assert!(store.remove(&stored.relative_path).await);
        assert!(!store.remove(&stored.relative_path).await);
    }

    #[tokio::test]
    async fn test_save_measures_size_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AttachmentStore::new(dir.path());

        let stored = store
            .save(Uuid::new_v4(), "empty.bin", b"")
            .await
            .expect("save should succeed");

        assert_eq!(stored.size_bytes, 0);
    }
}
