//! Error types shared by every handle variant and the resource manager.

use std::path::{Path, PathBuf};

/// Filesystem error type with contextual variants.
///
/// Every variant that concerns a single object carries the path that caused
/// it: the virtual path for lookups, the physical path for I/O and archive
/// failures. Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use assetfs::FsError;
/// use std::path::PathBuf;
///
/// let err = FsError::NotFound { path: PathBuf::from("does/not/exist") };
/// assert_eq!(err.to_string(), "not found: does/not/exist");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Path/File Errors
    /// No physical object backs the requested path.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// A read was attempted on a directory.
    #[error("is a directory: {path}")]
    IsDirectory {
        /// The directory that was read.
        path: PathBuf,
    },

    /// Expected a directory but found something else.
    ///
    /// `list()` never returns this; it yields an empty listing instead.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// A write was attempted on a read-only handle.
    #[error("not writable: {path}")]
    NotWritable {
        /// The read-only path.
        path: PathBuf,
    },

    // Archive Errors
    /// The archive object was closed or its owning root was dropped.
    ///
    /// This is a state error, distinct from [`FsError::NotFound`]: the entry
    /// may well exist, but the archive can no longer serve it.
    #[error("archive closed: {path}")]
    ArchiveClosed {
        /// The archive file.
        path: PathBuf,
    },

    /// The archive is malformed or uses an unsupported feature.
    #[error("malformed archive: {path} ({details})")]
    ArchiveFormat {
        /// The archive file.
        path: PathBuf,
        /// What the archive reader rejected.
        details: String,
    },

    // Data Errors
    /// Content could not be decoded or encoded with the requested charset.
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The path with invalid data.
        path: PathBuf,
        /// Details about the invalid data.
        details: String,
    },

    /// A load-order policy did not return a permutation of its candidates.
    #[error("invalid load order: {details}")]
    LoadOrder {
        /// Which candidates were added or dropped.
        details: String,
    },

    /// Two different embedded bundles share a label.
    #[error("duplicate embedded bundle label: {label}")]
    DuplicateBundle {
        /// The label used by more than one bundle.
        label: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error, attaching the operation and physical path.
    ///
    /// `ErrorKind::NotFound` becomes [`FsError::NotFound`] so callers only
    /// need to match a single variant for absence.
    pub(crate) fn io(operation: &'static str, path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound {
                path: path.to_path_buf(),
            },
            _ => FsError::Io {
                operation,
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Wrap an error reported by the zip reader for `archive`.
    pub(crate) fn zip(operation: &'static str, archive: &Path, error: zip::result::ZipError) -> Self {
        use zip::result::ZipError;

        match error {
            ZipError::Io(source) => FsError::io(operation, archive, source),
            ZipError::InvalidArchive(details) | ZipError::UnsupportedArchive(details) => {
                FsError::ArchiveFormat {
                    path: archive.to_path_buf(),
                    details: details.to_string(),
                }
            }
            ZipError::FileNotFound => FsError::NotFound {
                path: archive.to_path_buf(),
            },
            #[allow(unreachable_patterns)]
            other => FsError::ArchiveFormat {
                path: archive.to_path_buf(),
                details: other.to_string(),
            },
        }
    }

    /// Returns `true` for errors caused by state rather than absence.
    pub fn is_transient(&self) -> bool {
        matches!(self, FsError::ArchiveClosed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = FsError::NotFound {
            path: PathBuf::from("missing.txt"),
        };
        assert_eq!(err.to_string(), "not found: missing.txt");
    }

    #[test]
    fn archive_format_display() {
        let err = FsError::ArchiveFormat {
            path: PathBuf::from("/data/broken.zip"),
            details: "Invalid zip header".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed archive: /data/broken.zip (Invalid zip header)"
        );
    }

    #[test]
    fn io_not_found_maps_to_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = FsError::io("open", Path::new("/a"), io_err);
        assert!(matches!(err, FsError::NotFound { ref path } if path == Path::new("/a")));
    }

    #[test]
    fn io_other_keeps_operation_and_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = FsError::io("read", Path::new("/b"), io_err);
        assert!(matches!(err, FsError::Io { operation: "read", .. }));
        assert!(err.to_string().starts_with("read failed for /b"));
    }

    #[test]
    fn zip_invalid_archive_maps_to_archive_format() {
        let err = FsError::zip(
            "open archive",
            Path::new("x.zip"),
            zip::result::ZipError::InvalidArchive("bad"),
        );
        assert!(matches!(err, FsError::ArchiveFormat { ref details, .. } if details == "bad"));
    }

    #[test]
    fn zip_file_not_found_maps_to_not_found() {
        let err = FsError::zip(
            "read entry",
            Path::new("x.zip"),
            zip::result::ZipError::FileNotFound,
        );
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn duplicate_bundle_display() {
        let err = FsError::DuplicateBundle {
            label: "core".into(),
        };
        assert_eq!(err.to_string(), "duplicate embedded bundle label: core");
    }

    #[test]
    fn only_archive_closed_is_transient() {
        let closed = FsError::ArchiveClosed {
            path: PathBuf::from("a.jar"),
        };
        let missing = FsError::NotFound {
            path: PathBuf::from("a.jar"),
        };
        assert!(closed.is_transient());
        assert!(!missing.is_transient());
    }
}
