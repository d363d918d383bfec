// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::ExtractionResult;
use crate::summary::BatchSummary;
use crate::utils::error::StorageError;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Local store of downloaded application workbooks.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn workbook_path(&self, file_name: &str) -> PathBuf {
        self.base_dir.join(file_name)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.workbook_path(file_name).is_file()
    }

    /// Writes a downloaded workbook into the store.
    pub fn save_workbook(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let file_path = self.workbook_path(file_name);
        fs::write(&file_path, bytes).map_err(StorageError::IoError)?;
        tracing::info!("Saved workbook to {}", file_path.display());
        Ok(file_path)
    }

    /// All workbooks currently in the store, sorted by file name.
    pub async fn list_workbooks(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;
        let mut workbooks = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if is_workbook_file(&path) {
                workbooks.push(path);
            }
        }

        workbooks.sort();
        tracing::debug!("Found {} workbooks in {}", workbooks.len(), self.base_dir.display());
        Ok(workbooks)
    }
}

fn is_workbook_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| WORKBOOK_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Persists extraction results as JSON.
pub struct ResultStore {
    base_dir: PathBuf,
}

impl ResultStore {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }
        Ok(Self { base_dir: base_path })
    }

    /// Saves one document's result as `<source>.json`.
    pub fn save_result(&self, result: &ExtractionResult) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}.json", result.source_identifier));

        let json = serde_json::to_string_pretty(result)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::debug!("Saved result to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the batch in JSON format
    pub fn save_batch_metadata(&self, summary: &BatchSummary) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join("batch_meta.json");

        let metadata = serde_json::json!({
            "summary": summary,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}
