//! File Storage
//!
//! Meter photos and announcement attachments on local disk under the work
//! directory. Rows store paths relative to the storage root; this module
//! owns the root and refuses anything that would escape it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::utils::{AppError, AppResult};

/// Maximum upload size (5MB)
pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Supported photo/attachment formats
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "pdf"];

/// Validate an upload's file extension, lowercased
pub fn validate_extension(filename: &str) -> AppResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| AppError::validation(format!("File has no extension: {filename}")))?;
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::validation(format!(
            "Unsupported file format: {ext} (allowed: {})",
            SUPPORTED_FORMATS.join(", ")
        )));
    }
    Ok(ext)
}

/// Local file storage rooted at one directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a stored relative path, rejecting escapes from the root
    fn absolute(&self, relative: &str) -> AppResult<PathBuf> {
        let rel = Path::new(relative);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(AppError::validation(format!(
                "Invalid storage path: {relative}"
            )));
        }
        Ok(self.root.join(rel))
    }

    /// Store bytes under `subdir`, returning the relative path to persist
    pub fn store(&self, subdir: &str, ext: &str, bytes: &[u8]) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::validation("File is empty"));
        }
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(AppError::validation(format!(
                "File exceeds maximum size of {} bytes",
                MAX_UPLOAD_SIZE
            )));
        }

        let relative = format!("{subdir}/{}.{ext}", Uuid::new_v4());
        let path = self.absolute(&relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::internal(format!("Failed to create storage dir: {e}")))?;
        }
        fs::write(&path, bytes)
            .map_err(|e| AppError::internal(format!("Failed to store file: {e}")))?;
        Ok(relative)
    }

    pub fn read(&self, relative: &str) -> AppResult<Vec<u8>> {
        let path = self.absolute(relative)?;
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::not_found(format!("Stored file {relative} not found"))
            }
            _ => AppError::internal(format!("Failed to read file: {e}")),
        })
    }

    /// Remove a stored file. A missing file is not an error - the row is
    /// what matters, the file is evidence.
    pub fn delete(&self, relative: &str) -> AppResult<()> {
        let path = self.absolute(relative)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::internal(format!("Failed to delete file: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        (dir, storage)
    }

    #[test]
    fn store_read_delete_round_trip() {
        let (_dir, storage) = storage();
        let rel = storage.store("photos", "jpg", b"fake-jpeg-bytes").unwrap();
        assert!(rel.starts_with("photos/"));
        assert!(rel.ends_with(".jpg"));

        assert_eq!(storage.read(&rel).unwrap(), b"fake-jpeg-bytes");

        storage.delete(&rel).unwrap();
        assert!(storage.read(&rel).is_err());
        // Deleting again is fine
        storage.delete(&rel).unwrap();
    }

    #[test]
    fn rejects_path_escape() {
        let (_dir, storage) = storage();
        assert!(storage.read("../outside.txt").is_err());
        assert!(storage.read("/etc/passwd").is_err());
        assert!(storage.read("photos/../../x.jpg").is_err());
    }

    #[test]
    fn rejects_oversized_and_empty_uploads() {
        let (_dir, storage) = storage();
        assert!(storage.store("photos", "jpg", &[]).is_err());
        let big = vec![0u8; MAX_UPLOAD_SIZE + 1];
        assert!(storage.store("photos", "jpg", &big).is_err());
    }

    #[test]
    fn extension_validation() {
        assert_eq!(validate_extension("meter.JPG").unwrap(), "jpg");
        assert!(validate_extension("meter.exe").is_err());
        assert!(validate_extension("meter").is_err());
    }
}
