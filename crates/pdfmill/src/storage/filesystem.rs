use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (fast, atomic on the
/// same filesystem) and falls back to copy + delete for cross-device moves.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Flat file store under a single root directory. Uploads and results are
/// both keyed by job id, so names cannot collide across jobs; anything handed
/// out to callers is resolved back through [`FileStorage::resolve`] to keep
/// it inside the root.
#[derive(Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the storage root if missing.
    pub fn init(&self) -> Result<(), StorageError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| StorageError::CreateDirectory {
                path: self.root.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Persists an uploaded input as `<job_id>_<filename>`. Created with
    /// O_EXCL; the job id makes the name unique, so an existing file is an
    /// error rather than something to resolve around.
    pub fn store_upload(
        &self,
        content: &[u8],
        job_id: &str,
        filename: &str,
    ) -> Result<PathBuf, StorageError> {
        use std::io::Write;

        self.init()?;
        let path = self.root.join(format!("{}_{}", job_id, filename));

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    StorageError::FileExists(path.clone())
                } else {
                    StorageError::WriteFile {
                        path: path.clone(),
                        source: e,
                    }
                }
            })?;

        file.write_all(content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// The permanent result location for a job.
    pub fn result_path(&self, job_id: &str, filename: &str) -> PathBuf {
        self.root.join(format!("{}_fixed_{}", job_id, filename))
    }

    /// Moves a finished artifact into its permanent location.
    pub fn promote(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        if src == dst {
            return Ok(());
        }
        move_file(src, dst)
    }

    pub fn remove(&self, path: &Path) -> Result<(), StorageError> {
        std::fs::remove_file(path).map_err(|e| StorageError::RemoveFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolves a stored handle for handing out, rejecting anything that
    /// escapes the storage root (symlinks included, via canonicalization).
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, StorageError> {
        let canonical_root = self.root.canonicalize().map_err(|e| StorageError::Resolve {
            path: self.root.clone(),
            source: e,
        })?;
        let canonical = path.canonicalize().map_err(|e| StorageError::Resolve {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !canonical.starts_with(&canonical_root) {
            return Err(StorageError::PathEscape(path.to_path_buf()));
        }

        Ok(canonical)
    }
}
