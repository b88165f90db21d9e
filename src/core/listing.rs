//! Directory listing for the audited folder

use std::fs;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::core::error::AuditError;

/// Prefix of transient lock files left by office and CAD tools
pub const LOCK_PREFIX: &str = "~$";

/// A regular file directly inside the audited folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File name as found on disk
    pub name: String,

    /// Last modification time
    pub modified: SystemTime,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            modified,
        }
    }

    /// Normalized name used for every comparison
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Case folding applied to every filename comparison
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// Fail unless `folder` exists and is a directory
pub fn ensure_folder(folder: &Path) -> Result<(), AuditError> {
    let meta = fs::metadata(folder).map_err(|e| AuditError::io(folder, e))?;
    if !meta.is_dir() {
        return Err(AuditError::Io {
            path: folder.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }
    Ok(())
}

/// List regular files directly inside `folder`, sorted by name
///
/// Lock files (names starting with `lock_prefix`) and anything that is not
/// a regular file are left out. Broken links are skipped.
pub fn list_directory(folder: &Path, lock_prefix: &str) -> Result<Vec<DirectoryEntry>, AuditError> {
    ensure_folder(folder)?;

    let mut entries = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| AuditError::io(folder, e.into()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(lock_prefix) {
            continue;
        }

        let meta = match fs::metadata(entry.path()) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(file = %name, error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }

        let modified = meta.modified().map_err(|e| AuditError::io(entry.path(), e))?;
        entries.push(DirectoryEntry { name, modified });
    }

    tracing::debug!(folder = %folder.display(), files = entries.len(), "folder listed");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lists_only_direct_regular_files() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("b.pdf"), "b").unwrap();
        fs::write(tmp.path().join("A.SLDDRW"), "a").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join("nested.pdf"), "n").unwrap();

        let entries = list_directory(tmp.path(), LOCK_PREFIX).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A.SLDDRW", "b.pdf"]);
    }

    #[test]
    fn test_lock_files_are_excluded() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("~$part1.sldprt"), "").unwrap();
        fs::write(tmp.path().join("part1.sldprt"), "").unwrap();

        let entries = list_directory(tmp.path(), LOCK_PREFIX).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "part1.sldprt");
    }

    #[test]
    fn test_missing_folder_is_io_error() {
        let tmp = tempdir().unwrap();
        let err = list_directory(&tmp.path().join("absent"), LOCK_PREFIX).unwrap_err();
        assert!(matches!(err, AuditError::FolderNotFound(_)));
    }

    #[test]
    fn test_file_as_folder_is_io_error() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("file.pdf");
        fs::write(&file, "").unwrap();
        let err = list_directory(&file, LOCK_PREFIX).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_ensure_folder() {
        let tmp = tempdir().unwrap();
        assert!(ensure_folder(tmp.path()).is_ok());
        assert!(matches!(
            ensure_folder(&tmp.path().join("absent")).unwrap_err(),
            AuditError::FolderNotFound(_)
        ));
    }

    #[test]
    fn test_normalize_name_folds_case() {
        assert_eq!(normalize_name("PART1.SLDPRT"), "part1.sldprt");
        assert_eq!(DirectoryEntry::new("Été.PDF", SystemTime::UNIX_EPOCH).key(), "été.pdf");
    }
}
