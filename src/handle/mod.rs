//! # File Handles
//!
//! One handle type, [`FileHandle`], fronts every backing store. Which store
//! it reads from is a closed set of variants, matched exhaustively:
//!
//! | Variant | Backing store | Directory? | Writable? |
//! |---------|---------------|------------|-----------|
//! | [`HandleKind::File`] | plain file or directory | if it is one | if permitted |
//! | [`HandleKind::ZipRoot`] | a `.zip` file | always | never |
//! | [`HandleKind::ZipEntry`] | an entry in a zip | if flagged | never |
//! | [`HandleKind::JarRoot`] | a `.jar` file | always | never |
//! | [`HandleKind::JarEntry`] | an entry in a jar | if flagged | never |
//! | [`HandleKind::Embedded`] | an [`EmbeddedBundle`] resource | if implied | never |
//!
//! ## Archive entries
//!
//! An entry cannot be read without the archive object owned by its root, so
//! entry handles keep a non-owning reference to the root handle. When the
//! root is dropped or closed, reads and listings through its entries fail
//! with [`FsError::ArchiveClosed`]. Handles served by a
//! [`ResourceManager`](crate::ResourceManager) never hit this: the manager
//! keeps every archive root alive for its own lifetime.
//!
//! ## Listing
//!
//! `list()` on anything that is not a directory returns an empty listing,
//! not an error. Listing an archive root yields every entry in the archive
//! (the flat view); listing a directory entry yields its direct children.

mod archived;
mod bundled;
mod native;

use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use crate::archive::ArchiveFile;
use crate::manager::Shared;
use crate::{
    ArchiveKind, Charset, EmbeddedBundle, FsError, Manifest, PhysicalLocator, ResourceManager,
    VirtualPath,
};

/// Which backing store a [`FileHandle`] reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// A plain filesystem file or directory.
    File,
    /// The root of a zip archive.
    ZipRoot,
    /// An entry inside a zip archive.
    ZipEntry,
    /// The root of a jar archive.
    JarRoot,
    /// An entry inside a jar archive.
    JarEntry,
    /// A resource in an embedded bundle.
    Embedded,
}

impl HandleKind {
    /// Returns `true` for variants backed by an archive.
    pub fn is_archive(&self) -> bool {
        !matches!(self, HandleKind::File | HandleKind::Embedded)
    }
}

/// Result of [`FileHandle::write`].
///
/// Read-only variants report [`WriteSink::Unsupported`] instead of failing,
/// so callers can tell "this store cannot be written" apart from an I/O
/// error, which is returned as `Err`.
pub enum WriteSink {
    /// A writer positioned for truncating or appending writes.
    Open(Box<dyn Write + Send>),
    /// The handle's backing store is read-only.
    Unsupported,
}

impl fmt::Debug for WriteSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteSink::Open(_) => f.write_str("WriteSink::Open(..)"),
            WriteSink::Unsupported => f.write_str("WriteSink::Unsupported"),
        }
    }
}

impl WriteSink {
    /// Returns `true` if a writer is available.
    pub fn is_open(&self) -> bool {
        matches!(self, WriteSink::Open(_))
    }
}

#[derive(Clone)]
pub(crate) struct EntryRef {
    parent: Weak<FileHandle>,
    archive: PathBuf,
    name: String,
    is_dir: bool,
}

#[derive(Clone)]
pub(crate) struct BundleRef {
    bundle: Arc<EmbeddedBundle>,
    name: String,
}

#[derive(Clone)]
pub(crate) enum Backing {
    Filesystem(PathBuf),
    ZipRoot(Arc<ArchiveFile>),
    ZipEntry(EntryRef),
    JarRoot(Arc<ArchiveFile>),
    JarEntry(EntryRef),
    Embedded(BundleRef),
}

impl Backing {
    /// Classify a physical path: `.zip` and `.jar` files become archive
    /// roots, everything else a plain filesystem entry.
    pub(crate) fn classify(path: PathBuf) -> Self {
        match ArchiveKind::from_path(&path) {
            Some(kind) if path.is_file() => Self::archive_root(Arc::new(ArchiveFile::new(path, kind))),
            _ => Backing::Filesystem(path),
        }
    }

    pub(crate) fn archive_root(archive: Arc<ArchiveFile>) -> Self {
        match archive.kind() {
            ArchiveKind::Zip => Backing::ZipRoot(archive),
            ArchiveKind::Jar => Backing::JarRoot(archive),
        }
    }

    pub(crate) fn archive_entry(
        parent: &Arc<FileHandle>,
        archive: &ArchiveFile,
        name: &str,
        is_dir: bool,
    ) -> Self {
        let entry = EntryRef {
            parent: Arc::downgrade(parent),
            archive: archive.path().to_path_buf(),
            name: name.to_string(),
            is_dir,
        };
        match archive.kind() {
            ArchiveKind::Zip => Backing::ZipEntry(entry),
            ArchiveKind::Jar => Backing::JarEntry(entry),
        }
    }

    pub(crate) fn embedded(bundle: Arc<EmbeddedBundle>, name: &str) -> Self {
        Backing::Embedded(BundleRef {
            bundle,
            name: name.to_string(),
        })
    }
}

/// A readable, listable and possibly writable object in the fused namespace.
///
/// Handles are shared as `Arc<FileHandle>`. The same contract holds for
/// every variant; see the [module documentation](self) for how each backing
/// store maps onto it.
///
/// ```rust,no_run
/// use assetfs::{FileHandle, FsError};
///
/// fn dump(root: &std::sync::Arc<FileHandle>) -> Result<(), FsError> {
///     for child in root.list_with_suffix(".txt")? {
///         println!("{} => {}", child.path(), child.read_string()?);
///     }
///     Ok(())
/// }
/// ```
pub struct FileHandle {
    path: VirtualPath,
    backing: Backing,
    manager: Weak<Shared>,
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("kind", &self.kind())
            .field("physical", &self.physical_path())
            .finish()
    }
}

impl FileHandle {
    pub(crate) fn new(path: VirtualPath, backing: Backing, manager: Weak<Shared>) -> Arc<Self> {
        Arc::new(Self {
            path,
            backing,
            manager,
        })
    }

    /// A standalone handle for a directory, file or archive on disk, at the
    /// root of its own namespace. `.zip` and `.jar` files become archive roots.
    pub fn from_path(physical: impl Into<PathBuf>) -> Arc<Self> {
        Self::mounted_at(VirtualPath::root(), physical)
    }

    /// Like [`from_path`](Self::from_path), with children addressed under
    /// `virtual_path`.
    pub fn mounted_at(virtual_path: impl Into<VirtualPath>, physical: impl Into<PathBuf>) -> Arc<Self> {
        Self::new(virtual_path.into(), Backing::classify(physical.into()), Weak::new())
    }

    /// A standalone handle for the root of an embedded bundle.
    pub fn embedded(bundle: Arc<EmbeddedBundle>) -> Arc<Self> {
        Self::new(VirtualPath::root(), Backing::embedded(bundle, ""), Weak::new())
    }

    /// Copy of this handle bound to another path and manager.
    pub(crate) fn rebind(&self, path: VirtualPath, manager: Weak<Shared>) -> Arc<Self> {
        Self::new(path, self.backing.clone(), manager)
    }

    /// The archive object, for archive roots.
    pub(crate) fn archive(&self) -> Option<&Arc<ArchiveFile>> {
        match &self.backing {
            Backing::ZipRoot(archive) | Backing::JarRoot(archive) => Some(archive),
            Backing::Filesystem(_)
            | Backing::ZipEntry(_)
            | Backing::JarEntry(_)
            | Backing::Embedded(_) => None,
        }
    }

    /// The live archive root an entry reads through, for archive entries.
    pub(crate) fn archive_parent(&self) -> Option<Arc<FileHandle>> {
        match &self.backing {
            Backing::ZipEntry(entry) | Backing::JarEntry(entry) => entry.parent.upgrade(),
            Backing::Filesystem(_)
            | Backing::ZipRoot(_)
            | Backing::JarRoot(_)
            | Backing::Embedded(_) => None,
        }
    }

    /// The bundle behind an embedded resource.
    pub(crate) fn bundle(&self) -> Option<&Arc<EmbeddedBundle>> {
        match &self.backing {
            Backing::Embedded(res) => Some(&res.bundle),
            Backing::Filesystem(_)
            | Backing::ZipRoot(_)
            | Backing::ZipEntry(_)
            | Backing::JarRoot(_)
            | Backing::JarEntry(_) => None,
        }
    }

    /// The fused logical path.
    pub fn path(&self) -> &VirtualPath {
        &self.path
    }

    /// The final component of [`path`](Self::path).
    pub fn name(&self) -> &str {
        self.path.file_name()
    }

    /// The extension of [`name`](Self::name), without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension()
    }

    /// Which backing store this handle reads from.
    pub fn kind(&self) -> HandleKind {
        match &self.backing {
            Backing::Filesystem(_) => HandleKind::File,
            Backing::ZipRoot(_) => HandleKind::ZipRoot,
            Backing::ZipEntry(_) => HandleKind::ZipEntry,
            Backing::JarRoot(_) => HandleKind::JarRoot,
            Backing::JarEntry(_) => HandleKind::JarEntry,
            Backing::Embedded(_) => HandleKind::Embedded,
        }
    }

    /// The physical location of this handle.
    pub fn locator(&self) -> PhysicalLocator {
        match &self.backing {
            Backing::Filesystem(path) => PhysicalLocator::Filesystem(path.clone()),
            Backing::ZipRoot(archive) | Backing::JarRoot(archive) => {
                PhysicalLocator::Filesystem(archive.path().to_path_buf())
            }
            Backing::ZipEntry(entry) => archived::locator(entry, ArchiveKind::Zip),
            Backing::JarEntry(entry) => archived::locator(entry, ArchiveKind::Jar),
            Backing::Embedded(res) => PhysicalLocator::Embedded {
                bundle: res.bundle.label().to_string(),
                name: res.name.clone(),
            },
        }
    }

    /// The real location: an absolute filesystem path, or
    /// `archive + "/" + entry` for archive entries.
    pub fn physical_path(&self) -> String {
        self.locator().to_string()
    }

    /// Returns `true` if the backing object is present.
    ///
    /// For archive entries this is whether the owning archive still exists.
    pub fn exists(&self) -> bool {
        match &self.backing {
            Backing::Filesystem(path) => path.exists(),
            Backing::ZipRoot(archive) | Backing::JarRoot(archive) => archive.exists(),
            Backing::ZipEntry(entry) | Backing::JarEntry(entry) => archived::exists(entry),
            Backing::Embedded(res) => bundled::exists(res),
        }
    }

    /// Returns `true` for directories. Archive roots always are.
    pub fn is_directory(&self) -> bool {
        match &self.backing {
            Backing::Filesystem(path) => path.is_dir(),
            Backing::ZipRoot(_) | Backing::JarRoot(_) => true,
            Backing::ZipEntry(entry) | Backing::JarEntry(entry) => entry.is_dir,
            Backing::Embedded(res) => bundled::is_dir(res),
        }
    }

    /// Returns `true` only for filesystem paths the OS lets us write.
    pub fn writable(&self) -> bool {
        match &self.backing {
            Backing::Filesystem(path) => native::writable(path),
            Backing::ZipRoot(_)
            | Backing::ZipEntry(_)
            | Backing::JarRoot(_)
            | Backing::JarEntry(_)
            | Backing::Embedded(_) => false,
        }
    }

    /// List the children of this directory.
    ///
    /// Returns an empty listing for non-directories.
    ///
    /// # Errors
    ///
    /// - [`FsError::ArchiveClosed`] if the owning archive was closed or dropped
    /// - [`FsError::ArchiveFormat`] if an archive cannot be parsed
    /// - [`FsError::Io`] if a directory cannot be read
    pub fn list(self: &Arc<Self>) -> Result<Vec<Arc<FileHandle>>, FsError> {
        match &self.backing {
            Backing::Filesystem(path) => native::list(self, path),
            Backing::ZipRoot(archive) | Backing::JarRoot(archive) => archived::list_root(self, archive),
            Backing::ZipEntry(entry) | Backing::JarEntry(entry) => archived::list_entry(self, entry),
            Backing::Embedded(res) => bundled::list(self, res),
        }
    }

    /// [`list`](Self::list), keeping children whose path ends with `suffix`.
    pub fn list_with_suffix(self: &Arc<Self>, suffix: &str) -> Result<Vec<Arc<FileHandle>>, FsError> {
        let mut children = self.list()?;
        children.retain(|child| child.path.ends_with(suffix));
        Ok(children)
    }

    /// Open the content for reading, positioned at the start.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the backing object does not exist
    /// - [`FsError::IsDirectory`] if this is a directory
    /// - [`FsError::ArchiveClosed`] if the owning archive was closed or dropped
    pub fn read(&self) -> Result<Box<dyn Read + Send>, FsError> {
        match &self.backing {
            Backing::Filesystem(path) => native::read(path),
            Backing::ZipRoot(archive) | Backing::JarRoot(archive) => Err(if archive.exists() {
                FsError::IsDirectory {
                    path: archive.path().to_path_buf(),
                }
            } else {
                FsError::NotFound {
                    path: archive.path().to_path_buf(),
                }
            }),
            Backing::ZipEntry(entry) | Backing::JarEntry(entry) => archived::read(entry),
            Backing::Embedded(res) => bundled::read(res),
        }
    }

    /// Read the whole content into memory.
    pub fn read_bytes(&self) -> Result<Vec<u8>, FsError> {
        let mut reader = self.read()?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| FsError::io("read", &self.physical_path_buf(), e))?;
        Ok(buf)
    }

    /// Read the whole content as text in the default charset (the owning
    /// manager's, or UTF-8 for standalone handles).
    pub fn read_string(&self) -> Result<String, FsError> {
        self.read_string_with(self.default_charset())
    }

    /// Read the whole content as text in `charset`.
    ///
    /// # Errors
    ///
    /// Everything [`read`](Self::read) returns, plus [`FsError::InvalidData`]
    /// if the bytes are not valid in `charset`.
    pub fn read_string_with(&self, charset: Charset) -> Result<String, FsError> {
        let bytes = self.read_bytes()?;
        charset.decode(&bytes).map_err(|details| FsError::InvalidData {
            path: PathBuf::from(&self.path),
            details,
        })
    }

    /// Open a writer, truncating (`append = false`) or appending.
    ///
    /// Returns [`WriteSink::Unsupported`] for read-only handles.
    ///
    /// # Errors
    ///
    /// - [`FsError::IsDirectory`] if this is a filesystem directory
    /// - [`FsError::Io`] if the file cannot be opened
    pub fn write(&self, append: bool) -> Result<WriteSink, FsError> {
        match &self.backing {
            Backing::Filesystem(path) => native::write(path, append),
            Backing::ZipRoot(_)
            | Backing::ZipEntry(_)
            | Backing::JarRoot(_)
            | Backing::JarEntry(_)
            | Backing::Embedded(_) => Ok(WriteSink::Unsupported),
        }
    }

    /// Write `text` in the default charset.
    pub fn write_string(&self, text: &str, append: bool) -> Result<(), FsError> {
        self.write_string_with(text, self.default_charset(), append)
    }

    /// Write `text` encoded as `charset`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotWritable`] if [`writable`](Self::writable) is false
    /// - [`FsError::InvalidData`] if `text` cannot be encoded
    /// - [`FsError::Io`] if writing fails
    pub fn write_string_with(&self, text: &str, charset: Charset, append: bool) -> Result<(), FsError> {
        if !self.writable() {
            return Err(self.not_writable());
        }
        let bytes = charset.encode(text).map_err(|details| FsError::InvalidData {
            path: PathBuf::from(&self.path),
            details,
        })?;
        match self.write(append)? {
            WriteSink::Open(mut writer) => {
                let physical = self.physical_path_buf();
                writer
                    .write_all(&bytes)
                    .map_err(|e| FsError::io("write", &physical, e))?;
                writer.flush().map_err(|e| FsError::io("flush", &physical, e))
            }
            WriteSink::Unsupported => Err(self.not_writable()),
        }
    }

    /// Resolve `path()/name` through the owning manager.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if this handle is not a directory
    /// - [`FsError::NotFound`] if the child is unknown, or this handle is
    ///   not attached to a manager
    pub fn child(&self, name: &str) -> Result<Arc<FileHandle>, FsError> {
        if !self.is_directory() {
            return Err(FsError::NotADirectory {
                path: PathBuf::from(&self.path),
            });
        }
        let target = self.path.join(name);
        match self.manager() {
            Some(manager) => manager.handle(target.as_str()),
            None => Err(FsError::NotFound {
                path: PathBuf::from(&target),
            }),
        }
    }

    /// The manager this handle was resolved through, if it is still alive.
    pub fn manager(&self) -> Option<ResourceManager> {
        self.manager.upgrade().map(ResourceManager::from_shared)
    }

    /// The jar manifest, for jar roots. `Ok(None)` for every other variant
    /// and for jars without `META-INF/MANIFEST.MF`.
    pub fn manifest(&self) -> Result<Option<Manifest>, FsError> {
        match &self.backing {
            Backing::JarRoot(archive) => archive.manifest(),
            Backing::Filesystem(_)
            | Backing::ZipRoot(_)
            | Backing::ZipEntry(_)
            | Backing::JarEntry(_)
            | Backing::Embedded(_) => Ok(None),
        }
    }

    /// Close the archive behind an archive root.
    ///
    /// Returns `false` (and does nothing) for other variants.
    pub fn close_archive(&self) -> bool {
        match self.archive() {
            Some(archive) => {
                archive.close();
                true
            }
            None => false,
        }
    }

    fn default_charset(&self) -> Charset {
        self.manager
            .upgrade()
            .map(|shared| shared.default_charset())
            .unwrap_or_default()
    }

    fn physical_path_buf(&self) -> PathBuf {
        match &self.backing {
            Backing::Filesystem(path) => path.clone(),
            _ => PathBuf::from(self.physical_path()),
        }
    }

    fn not_writable(&self) -> FsError {
        FsError::NotWritable {
            path: PathBuf::from(&self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileHandle>();
        assert_send_sync::<Arc<FileHandle>>();
    }

    #[test]
    fn archive_kinds_are_flagged() {
        assert!(HandleKind::ZipRoot.is_archive());
        assert!(HandleKind::JarEntry.is_archive());
        assert!(!HandleKind::File.is_archive());
        assert!(!HandleKind::Embedded.is_archive());
    }

    #[test]
    fn classify_requires_an_actual_file() {
        // A path that does not exist is never treated as an archive.
        let backing = Backing::classify(PathBuf::from("/no/such/dir/data.zip"));
        assert!(matches!(backing, Backing::Filesystem(_)));
    }

    #[test]
    fn standalone_handles_have_no_manager() {
        let handle = FileHandle::from_path("/no/such/dir");
        assert!(handle.manager().is_none());
        assert!(handle.path().is_root());
        assert!(matches!(handle.child("x"), Err(FsError::NotADirectory { .. })));
    }
}
