//! # Handle Extras
//!
//! Convenience methods on [`FileHandle`] built from the core contract.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`walk`](FileHandle::walk) | Every descendant, depth first |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled:
//!
//! | Method | Description |
//! |--------|-------------|
//! | `read_json` | Read and deserialize JSON content |
//! | `write_json` | Serialize and write JSON content |
//!
//! Enable with:
//! ```toml
//! [dependencies]
//! assetfs = { version = "0.1", features = ["serde"] }
//! ```

use std::sync::Arc;

use crate::{FileHandle, FsError, HandleKind};

impl FileHandle {
    /// Every descendant of this handle, depth first, in listing order.
    ///
    /// The listing of an archive root already contains every entry, so the
    /// walk does not descend into directory entries below it.
    ///
    /// # Errors
    ///
    /// The first error returned by [`list`](Self::list).
    ///
    /// ```rust,no_run
    /// use assetfs::FileHandle;
    ///
    /// let root = FileHandle::from_path("assets");
    /// for handle in root.walk()? {
    ///     println!("{}", handle.path());
    /// }
    /// # Ok::<(), assetfs::FsError>(())
    /// ```
    pub fn walk(self: &Arc<Self>) -> Result<Vec<Arc<FileHandle>>, FsError> {
        let mut out = Vec::new();
        walk_into(self, &mut out)?;
        Ok(out)
    }
}

fn walk_into(node: &Arc<FileHandle>, out: &mut Vec<Arc<FileHandle>>) -> Result<(), FsError> {
    let flat = matches!(node.kind(), HandleKind::ZipRoot | HandleKind::JarRoot);
    for child in node.list()? {
        let descend = !flat && child.is_directory();
        out.push(Arc::clone(&child));
        if descend {
            walk_into(&child, out)?;
        }
    }
    Ok(())
}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    impl FileHandle {
        /// Read the content as text and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - Everything [`read_string`](Self::read_string) returns
        /// - `FsError::Deserialization` if JSON parsing fails
        pub fn read_json<T: DeserializeOwned>(&self) -> Result<T, FsError> {
            let data = self.read_string()?;
            serde_json::from_str(&data).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize `value` as pretty-printed JSON and overwrite the content.
        ///
        /// # Errors
        ///
        /// - `FsError::Serialization` if serialization fails
        /// - Everything [`write_string`](Self::write_string) returns
        pub fn write_json<T: Serialize>(&self, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write_string(&json, false)
        }
    }
}
