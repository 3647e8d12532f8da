use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncRead;

use crate::config::StorageConfig;
use crate::http::body::{self, BodyError, BodyMode};
use crate::http::mime::MimeTable;
use crate::http::response::Response;
use crate::storage::locks::{PathGuard, PathLocks};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("filesystem operation on {} failed", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Body(#[from] BodyError),
}

impl StoreError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a store operation that the client gets to see.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Served { content_type: String, body: Vec<u8> },
    Created,
    Deleted,
    NotFound,
}

impl Outcome {
    pub fn into_response(self) -> Response {
        match self {
            Outcome::Served { content_type, body } => Response::ok(&content_type, body),
            Outcome::Created => Response::created(),
            Outcome::Deleted => Response::no_content(),
            Outcome::NotFound => Response::not_found(),
        }
    }
}

/// Files under a single root directory, addressed by request path.
///
/// Nothing is cached: every call goes back to the filesystem.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    index_file: String,
    confine: bool,
    mime: MimeTable,
    locks: Option<PathLocks>,
}

impl FileStore {
    /// A store with default behaviour: literal path resolution, per-path
    /// locking, built-in MIME table, `index.html` for `/`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(&StorageConfig {
            root: root.into(),
            ..StorageConfig::default()
        })
    }

    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            index_file: cfg.index_file.clone(),
            confine: cfg.confine_paths,
            mime: MimeTable::new().with_overrides(&cfg.mime_types),
            locks: cfg.lock_paths.then(PathLocks::new),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(StoreError::io(&self.root))
    }

    /// Maps a request path onto the filesystem.
    ///
    /// Without confinement this is plain concatenation of root and path, so
    /// `..` segments are honoured and may leave the root. With confinement
    /// the path is normalised lexically and `None` is returned for anything
    /// that would climb above the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        if !self.confine {
            let mut joined = OsString::from(self.root.as_os_str());
            joined.push(request_path);
            return Some(PathBuf::from(joined));
        }

        let mut parts: Vec<&str> = Vec::new();
        for segment in request_path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop()?;
                }
                s if s.contains('\0') || s.contains('\\') => return None,
                s => parts.push(s),
            }
        }

        let mut resolved = self.root.clone();
        for part in parts {
            // Reject anything the platform would read as a root or prefix.
            let path = Path::new(part);
            if !matches!(path.components().next(), Some(Component::Normal(_))) {
                return None;
            }
            resolved.push(path);
        }
        Some(resolved)
    }

    /// GET: reads a regular file. `/` stands for the index file.
    pub async fn serve(&self, request_path: &str) -> Result<Outcome, StoreError> {
        let request_path = if request_path == "/" {
            format!("/{}", self.index_file)
        } else {
            request_path.to_string()
        };

        let Some(target) = self.resolve(&request_path) else {
            return Ok(Outcome::NotFound);
        };
        let _guard = self.read_lock(&target).await;

        match fs::metadata(&target).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(Outcome::NotFound),
            Err(e) => {
                tracing::debug!(path = %target.display(), error = %e, "No file to serve");
                return Ok(Outcome::NotFound);
            }
        }

        let body = fs::read(&target).await.map_err(StoreError::io(&target))?;
        let file_name = target
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        let content_type = self.mime.content_type(&file_name).to_string();

        Ok(Outcome::Served { content_type, body })
    }

    /// POST/PUT: streams `content_length` body bytes from `reader` into the
    /// file, creating parent directories and truncating existing content.
    ///
    /// A failure writing the file is a [`StoreError::Io`]; failures on the
    /// reader side stay [`StoreError::Body`].
    pub async fn save<R>(
        &self,
        request_path: &str,
        reader: &mut R,
        content_length: usize,
        mode: BodyMode,
        idle_timeout: Option<Duration>,
    ) -> Result<Outcome, StoreError>
    where
        R: AsyncRead + Unpin,
    {
        let Some(target) = self.resolve(request_path) else {
            return Ok(Outcome::NotFound);
        };
        let _guard = self.write_lock(&target).await;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io(parent))?;
        }

        let mut file = fs::File::create(&target)
            .await
            .map_err(StoreError::io(&target))?;
        let written = body::read_body(reader, &mut file, content_length, mode, idle_timeout)
            .await
            .map_err(|e| match e {
                BodyError::Sink(source) => StoreError::Io {
                    path: target.clone(),
                    source,
                },
                other => StoreError::Body(other),
            })?;

        tracing::debug!(path = %target.display(), bytes = written, "Stored file");
        Ok(Outcome::Created)
    }

    /// DELETE: removes a file or an empty directory. Every failure is a 404.
    pub async fn delete(&self, request_path: &str) -> Result<Outcome, StoreError> {
        let Some(target) = self.resolve(request_path) else {
            return Ok(Outcome::NotFound);
        };
        let _guard = self.write_lock(&target).await;

        let removed = match fs::symlink_metadata(&target).await {
            Ok(meta) if meta.is_dir() => fs::remove_dir(&target).await,
            Ok(_) => fs::remove_file(&target).await,
            Err(e) => Err(e),
        };

        match removed {
            Ok(()) => Ok(Outcome::Deleted),
            Err(e) => {
                tracing::debug!(path = %target.display(), error = %e, "Delete failed");
                Ok(Outcome::NotFound)
            }
        }
    }

    async fn read_lock(&self, path: &Path) -> Option<PathGuard<'_>> {
        match &self.locks {
            Some(locks) => Some(locks.read(path).await),
            None => None,
        }
    }

    async fn write_lock(&self, path: &Path) -> Option<PathGuard<'_>> {
        match &self.locks {
            Some(locks) => Some(locks.write(path).await),
            None => None,
        }
    }
}
