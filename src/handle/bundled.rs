//! Resources in an embedded bundle.

use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use super::{Backing, BundleRef, FileHandle};
use crate::FsError;

pub(super) fn exists(res: &BundleRef) -> bool {
    res.bundle.contains(&res.name)
}

pub(super) fn is_dir(res: &BundleRef) -> bool {
    res.bundle.is_dir(&res.name)
}

pub(super) fn list(handle: &Arc<FileHandle>, res: &BundleRef) -> Result<Vec<Arc<FileHandle>>, FsError> {
    Ok(res
        .bundle
        .children(&res.name)
        .into_iter()
        .map(|(name, _)| {
            let leaf = name.rsplit('/').next().unwrap_or(&name);
            FileHandle::new(
                handle.path.join(leaf),
                Backing::embedded(Arc::clone(&res.bundle), &name),
                handle.manager.clone(),
            )
        })
        .collect())
}

pub(super) fn read(res: &BundleRef) -> Result<Box<dyn Read + Send>, FsError> {
    let physical = || PathBuf::from(format!("embedded://{}/{}", res.bundle.label(), res.name));
    if is_dir(res) {
        return Err(FsError::IsDirectory { path: physical() });
    }
    match res.bundle.get(&res.name) {
        Some(bytes) => Ok(Box::new(Cursor::new(bytes.to_vec()))),
        None => Err(FsError::NotFound { path: physical() }),
    }
}
