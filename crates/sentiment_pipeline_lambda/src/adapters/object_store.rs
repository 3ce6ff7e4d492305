//! Durable object-store seam.

use std::path::Path;

use crate::error::StageError;

/// Key/blob storage used as both completion marker and artifact cache
/// between stages. Keys are immutable once published: stages probe
/// `exists` before doing work and never overwrite a key implicitly.
pub trait ObjectStore {
    fn exists(&self, key: &str) -> Result<bool, StageError>;
    fn upload_file(&self, local_path: &Path, key: &str) -> Result<(), StageError>;
    fn download_file(&self, key: &str, local_path: &Path) -> Result<(), StageError>;
}
