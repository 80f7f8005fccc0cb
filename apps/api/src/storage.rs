use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 8;

/// A file written by [`UploadStore::save`].
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub original_name: String,
}

/// Local-disk store for uploaded resumes.
///
/// Files are written under a fresh UUID name; the client-supplied name only
/// contributes its extension. Nothing is ever removed.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Creates the upload directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create upload directory {}", root.display()))?;
        info!("Upload directory ready at {}", root.display());
        Ok(Self { root })
    }

    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<StoredUpload> {
        let path = self.root.join(stored_file_name(original_name));
        tokio::fs::write(&path, bytes).await?;
        info!(
            "Stored upload '{}' ({} bytes) as {}",
            original_name,
            bytes.len(),
            path.display()
        );
        Ok(StoredUpload {
            path,
            original_name: original_name.to_string(),
        })
    }
}

fn stored_file_name(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match safe_extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

/// Lowercased extension of the client name, if it is short and alphanumeric.
fn safe_extension(original_name: &str) -> Option<String> {
    // Client names may use either separator regardless of the server OS.
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or("");
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
