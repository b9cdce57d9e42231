//! Zip and jar roots and the entries inside them.

use std::io::{Cursor, Read};
use std::sync::Arc;

use super::{Backing, EntryRef, FileHandle};
use crate::archive::ArchiveFile;
use crate::{ArchiveKind, FsError, PhysicalLocator};

pub(super) fn locator(entry: &EntryRef, kind: ArchiveKind) -> PhysicalLocator {
    PhysicalLocator::ArchiveEntry {
        archive: entry.archive.clone(),
        entry: entry.name.clone(),
        kind,
    }
}

/// Entries cannot vanish on their own; they exist while their archive does.
pub(super) fn exists(entry: &EntryRef) -> bool {
    entry.parent.upgrade().is_some_and(|root| root.exists())
}

/// The flat view: every entry in the archive, sorted by name.
pub(super) fn list_root(
    root: &Arc<FileHandle>,
    archive: &Arc<ArchiveFile>,
) -> Result<Vec<Arc<FileHandle>>, FsError> {
    let index = archive.index()?;
    Ok(index
        .entries()
        .iter()
        .map(|e| {
            FileHandle::new(
                root.path.join(&e.name),
                Backing::archive_entry(root, archive, &e.name, e.is_dir),
                root.manager.clone(),
            )
        })
        .collect())
}

/// Direct children of a directory entry, looked up in the archive's
/// precomputed parent-to-children map.
pub(super) fn list_entry(handle: &Arc<FileHandle>, entry: &EntryRef) -> Result<Vec<Arc<FileHandle>>, FsError> {
    if !entry.is_dir {
        return Ok(Vec::new());
    }
    let root = owning_root(entry)?;
    let archive = root_archive(&root, entry)?;
    let index = archive.index()?;
    Ok(index
        .children(&entry.name)
        .map(|child| {
            let name = child.name.rsplit('/').next().unwrap_or(&child.name);
            FileHandle::new(
                handle.path.join(name),
                Backing::archive_entry(&root, archive, &child.name, child.is_dir),
                handle.manager.clone(),
            )
        })
        .collect())
}

pub(super) fn read(entry: &EntryRef) -> Result<Box<dyn Read + Send>, FsError> {
    let root = owning_root(entry)?;
    let archive = root_archive(&root, entry)?;
    if entry.is_dir {
        return Err(FsError::IsDirectory {
            path: archive.entry_path(&entry.name),
        });
    }
    let bytes = archive.read_entry(&entry.name)?;
    Ok(Box::new(Cursor::new(bytes)))
}

fn owning_root(entry: &EntryRef) -> Result<Arc<FileHandle>, FsError> {
    entry.parent.upgrade().ok_or_else(|| FsError::ArchiveClosed {
        path: entry.archive.clone(),
    })
}

fn root_archive<'a>(root: &'a FileHandle, entry: &EntryRef) -> Result<&'a Arc<ArchiveFile>, FsError> {
    root.archive().ok_or_else(|| FsError::ArchiveClosed {
        path: entry.archive.clone(),
    })
}
