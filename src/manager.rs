//! # Resource Manager
//!
//! Fuses several roots into one namespace and serves handles out of it.
//!
//! ## Lifecycle
//!
//! | Phase | When | State touched |
//! |-------|------|---------------|
//! | Construction | [`ResourceManagerBuilder::build`] | path table, archive registry (write once) |
//! | Serving | [`ResourceManager::handle`] | handle cache (insert only) |
//!
//! Construction orders the roots with the load-order policy and walks each
//! one. Plain files and directories are recorded under their virtual path.
//! Archives are *mounted*: their entries are recorded under the path of the
//! directory that contains the archive, and the archive file itself never
//! becomes addressable. When two roots record the same path, the root later
//! in load order wins.
//!
//! Serving looks a path up in the table and returns the cached handle, or
//! builds and caches one. The cache is never evicted, so repeated lookups of
//! one path return the same `Arc`.
//!
//! ## Concurrency
//!
//! The path table and archive registry are immutable after construction.
//! The cache sits behind a mutex that is held while a missing handle is
//! built, so concurrent lookups of one path produce exactly one handle.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::RootSource;
use crate::handle::Backing;
use crate::{
    Charset, EmbeddedBundle, FileHandle, FsError, MountFailure, MountPolicy, PhysicalLocator,
    ResourceManagerBuilder, VirtualPath, load_order,
};

/// State shared by a manager and every handle it serves.
pub(crate) struct Shared {
    roots: Vec<Arc<FileHandle>>,
    table: HashMap<VirtualPath, PhysicalLocator>,
    cache: Mutex<HashMap<VirtualPath, Arc<FileHandle>>>,
    archives: HashMap<PathBuf, Arc<FileHandle>>,
    bundles: HashMap<String, Arc<EmbeddedBundle>>,
    default_charset: Charset,
    mount_failures: Vec<MountFailure>,
}

impl Shared {
    pub(crate) fn default_charset(&self) -> Charset {
        self.default_charset
    }
}

/// Fused virtual filesystem over directories, zip archives, jar archives
/// and embedded bundles.
///
/// Cloning is cheap; clones share the path table and handle cache.
///
/// ```rust,no_run
/// use assetfs::ResourceManager;
///
/// let assets = ResourceManager::with_roots(["base", "mods"])?;
/// let shader = assets.handle("shaders/water.glsl")?;
/// println!("{}", shader.read_string()?);
/// # Ok::<(), assetfs::FsError>(())
/// ```
#[derive(Clone)]
pub struct ResourceManager {
    shared: Arc<Shared>,
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("roots", &self.shared.roots.len())
            .field("paths", &self.shared.table.len())
            .field("cached", &self.cached_handles())
            .field("mount_failures", &self.shared.mount_failures.len())
            .finish()
    }
}

impl ResourceManager {
    /// Start configuring a manager.
    pub fn builder() -> ResourceManagerBuilder {
        ResourceManagerBuilder::default()
    }

    /// A manager over the `assets` directory in the working directory.
    pub fn new() -> Result<Self, FsError> {
        Self::from_path("assets")
    }

    /// A manager over a single directory or archive.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, FsError> {
        Self::builder().root(path).build()
    }

    /// A manager over a single existing handle.
    pub fn from_handle(handle: Arc<FileHandle>) -> Result<Self, FsError> {
        Self::builder().root_handle(handle).build()
    }

    /// A manager over several roots, in default load order.
    pub fn with_roots<I, P>(paths: I) -> Result<Self, FsError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::builder().roots(paths).build()
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub(crate) fn build(config: ResourceManagerBuilder) -> Result<Self, FsError> {
        let ResourceManagerBuilder {
            roots,
            load_order: provider,
            mount_policy,
            default_charset,
        } = config;

        let keys: Vec<String> = roots.iter().map(RootSource::order_key).collect();
        let order = load_order::apply(provider.as_ref(), &keys)?;
        let mut slots: Vec<Option<RootSource>> = roots.into_iter().map(Some).collect();
        let ordered: Vec<RootSource> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        let mut outcome = Ok(());
        let shared = Arc::new_cyclic(|weak| {
            let mut fusion = Fusion::new(weak.clone(), mount_policy);
            outcome = fusion.run(ordered);
            fusion.finish(default_charset)
        });
        outcome?;

        tracing::info!(
            roots = shared.roots.len(),
            paths = shared.table.len(),
            archives = shared.archives.len(),
            failures = shared.mount_failures.len(),
            "resource manager built"
        );
        Ok(Self { shared })
    }

    /// Resolve a virtual path to its handle.
    ///
    /// Leading, trailing and repeated slashes are ignored. Every call for the
    /// same path returns the same `Arc`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path is not in the fused namespace, or
    ///   an archive entry has disappeared from its archive
    /// - [`FsError::ArchiveClosed`] if the entry's archive was closed
    /// - [`FsError::ArchiveFormat`] if the entry's archive cannot be parsed
    pub fn handle(&self, path: impl AsRef<str>) -> Result<Arc<FileHandle>, FsError> {
        let path = VirtualPath::new(path);
        let locator = self.shared.table.get(&path).ok_or_else(|| FsError::NotFound {
            path: PathBuf::from(&path),
        })?;

        let mut cache = self.shared.cache.lock();
        if let Some(handle) = cache.get(&path) {
            return Ok(Arc::clone(handle));
        }
        let handle = self.instantiate(&path, locator)?;
        tracing::debug!(path = %path, physical = %locator, kind = ?handle.kind(), "handle cached");
        cache.insert(path, Arc::clone(&handle));
        Ok(handle)
    }

    fn instantiate(&self, path: &VirtualPath, locator: &PhysicalLocator) -> Result<Arc<FileHandle>, FsError> {
        let weak = Arc::downgrade(&self.shared);
        match locator {
            // Archive files are mounted, never recorded, so this is a plain node.
            PhysicalLocator::Filesystem(physical) => Ok(FileHandle::new(
                path.clone(),
                Backing::Filesystem(physical.clone()),
                weak,
            )),
            PhysicalLocator::ArchiveEntry { archive, entry, .. } => {
                let root = self
                    .shared
                    .archives
                    .get(archive)
                    .ok_or_else(|| FsError::ArchiveClosed { path: archive.clone() })?;
                let file = root.archive().ok_or_else(|| FsError::ArchiveClosed { path: archive.clone() })?;
                let is_dir = file
                    .index()?
                    .get(entry)
                    .map(|e| e.is_dir)
                    .ok_or_else(|| FsError::NotFound {
                        path: file.entry_path(entry),
                    })?;
                Ok(FileHandle::new(
                    path.clone(),
                    Backing::archive_entry(root, file, entry, is_dir),
                    weak,
                ))
            }
            PhysicalLocator::Embedded { bundle, name } => {
                let bundle = self.shared.bundles.get(bundle).ok_or_else(|| FsError::NotFound {
                    path: PathBuf::from(locator.to_string()),
                })?;
                Ok(FileHandle::new(
                    path.clone(),
                    Backing::embedded(Arc::clone(bundle), name),
                    weak,
                ))
            }
        }
    }

    /// Returns `true` if `path` is in the fused namespace.
    pub fn contains(&self, path: impl AsRef<str>) -> bool {
        self.shared.table.contains_key(&VirtualPath::new(path))
    }

    /// The physical location `path` resolves to.
    pub fn locator(&self, path: impl AsRef<str>) -> Option<PhysicalLocator> {
        self.shared.table.get(&VirtualPath::new(path)).cloned()
    }

    /// Every path in the fused namespace, sorted.
    pub fn virtual_paths(&self) -> Vec<VirtualPath> {
        let mut paths: Vec<VirtualPath> = self.shared.table.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// The root handles, in load order.
    pub fn roots(&self) -> &[Arc<FileHandle>] {
        &self.shared.roots
    }

    /// Number of paths in the fused namespace.
    pub fn len(&self) -> usize {
        self.shared.table.len()
    }

    /// Returns `true` if nothing was fused.
    pub fn is_empty(&self) -> bool {
        self.shared.table.is_empty()
    }

    /// Number of handles created so far.
    pub fn cached_handles(&self) -> usize {
        self.shared.cache.lock().len()
    }

    /// Roots and archives skipped under [`MountPolicy::BestEffort`].
    pub fn mount_failures(&self) -> &[MountFailure] {
        &self.shared.mount_failures
    }
}

// ============================================================================
// Construction Phase
// ============================================================================

struct Fusion {
    weak: Weak<Shared>,
    policy: MountPolicy,
    roots: Vec<Arc<FileHandle>>,
    table: HashMap<VirtualPath, PhysicalLocator>,
    archives: HashMap<PathBuf, Arc<FileHandle>>,
    bundles: HashMap<String, Arc<EmbeddedBundle>>,
    failures: Vec<MountFailure>,
}

impl Fusion {
    fn new(weak: Weak<Shared>, policy: MountPolicy) -> Self {
        Self {
            weak,
            policy,
            roots: Vec::new(),
            table: HashMap::new(),
            archives: HashMap::new(),
            bundles: HashMap::new(),
            failures: Vec::new(),
        }
    }

    fn run(&mut self, sources: Vec<RootSource>) -> Result<(), FsError> {
        for source in sources {
            let root = match source {
                RootSource::Path(path) => {
                    if !path.exists() {
                        self.fail(&path, FsError::NotFound { path: path.clone() })?;
                        continue;
                    }
                    FileHandle::new(VirtualPath::root(), Backing::classify(path), self.weak.clone())
                }
                RootSource::Handle(handle) => {
                    if let Some(bundle) = handle.bundle() {
                        self.register_bundle(bundle)?;
                    }
                    handle.rebind(VirtualPath::root(), self.weak.clone())
                }
                RootSource::Embedded(bundle) => {
                    self.register_bundle(&bundle)?;
                    FileHandle::new(VirtualPath::root(), Backing::embedded(bundle, ""), self.weak.clone())
                }
            };
            tracing::debug!(root = %root.physical_path(), kind = ?root.kind(), "fusing root");

            let recorded = self.failures.len();
            self.walk(&root)?;
            let physical = PathBuf::from(root.physical_path());
            if self.failures[recorded..].iter().any(|f| f.path == physical) {
                continue;
            }
            self.roots.push(root);
        }
        Ok(())
    }

    /// Labels address bundles in locators, so one label means one bundle.
    fn register_bundle(&mut self, bundle: &Arc<EmbeddedBundle>) -> Result<(), FsError> {
        if let Some(known) = self.bundles.get(bundle.label()) {
            if Arc::ptr_eq(known, bundle) {
                return Ok(());
            }
            return Err(FsError::DuplicateBundle {
                label: bundle.label().to_string(),
            });
        }
        self.bundles
            .insert(bundle.label().to_string(), Arc::clone(bundle));
        Ok(())
    }

    fn walk(&mut self, node: &Arc<FileHandle>) -> Result<(), FsError> {
        if node.archive().is_some() {
            return self.mount(Arc::clone(node));
        }
        // A directory entry given as a root: its children resolve through
        // the archive root it was listed from.
        if let Some(parent) = node.archive_parent() {
            if let Some(archive) = parent.archive() {
                self.archives
                    .entry(archive.path().to_path_buf())
                    .or_insert_with(|| Arc::clone(&parent));
            }
        }
        let children = match node.list() {
            Ok(children) => children,
            Err(error) => return self.fail(Path::new(&node.physical_path()), error),
        };
        for child in children {
            if child.archive().is_some() {
                self.mount(child.rebind(node.path().clone(), self.weak.clone()))?;
                continue;
            }
            self.table.insert(child.path().clone(), child.locator());
            if child.is_directory() {
                self.walk(&child)?;
            }
        }
        Ok(())
    }

    /// Record every entry of an archive under the archive root's path.
    fn mount(&mut self, root: Arc<FileHandle>) -> Result<(), FsError> {
        let entries = match root.list() {
            Ok(entries) => entries,
            Err(error) => return self.fail(Path::new(&root.physical_path()), error),
        };
        tracing::debug!(
            archive = %root.physical_path(),
            prefix = %root.path(),
            entries = entries.len(),
            "archive mounted"
        );
        for entry in &entries {
            self.table.insert(entry.path().clone(), entry.locator());
        }
        if let Some(archive) = root.archive() {
            self.archives.insert(archive.path().to_path_buf(), root);
        }
        Ok(())
    }

    fn fail(&mut self, path: &Path, error: FsError) -> Result<(), FsError> {
        match self.policy {
            MountPolicy::FailFast => Err(error),
            MountPolicy::BestEffort => {
                tracing::warn!(path = %path.display(), error = %error, "skipping unmountable source");
                self.failures.push(MountFailure {
                    path: path.to_path_buf(),
                    error,
                });
                Ok(())
            }
        }
    }

    fn finish(self, default_charset: Charset) -> Shared {
        Shared {
            roots: self.roots,
            table: self.table,
            cache: Mutex::new(HashMap::new()),
            archives: self.archives,
            bundles: self.bundles,
            default_charset,
            mount_failures: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandleKind;
    use std::fs;

    #[test]
    fn manager_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResourceManager>();
    }

    #[test]
    fn directories_are_recorded_and_walked() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("ui/icons")).unwrap();
        fs::write(dir.path().join("ui/icons/ok.png"), b"png").unwrap();
        fs::write(dir.path().join("readme.txt"), "hi").unwrap();

        let manager = ResourceManager::from_path(dir.path()).unwrap();
        let paths: Vec<_> = manager
            .virtual_paths()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        assert_eq!(paths, vec!["readme.txt", "ui", "ui/icons", "ui/icons/ok.png"]);
        assert_eq!(manager.len(), 4);
        assert!(manager.mount_failures().is_empty());
    }

    #[test]
    fn lookups_normalize_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/b.txt"), "b").unwrap();

        let manager = ResourceManager::from_path(dir.path()).unwrap();
        let plain = manager.handle("a/b.txt").unwrap();
        assert!(Arc::ptr_eq(&plain, &manager.handle("/a//b.txt/").unwrap()));
        assert!(manager.contains("./a/b.txt"));
        assert_eq!(
            manager.locator("a/b.txt"),
            Some(PhysicalLocator::Filesystem(dir.path().join("a").join("b.txt")))
        );
    }

    #[test]
    fn missing_root_is_recorded_or_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let manager = ResourceManager::from_path(&missing).unwrap();
        assert!(manager.is_empty());
        assert_eq!(manager.mount_failures().len(), 1);
        assert_eq!(manager.mount_failures()[0].path, missing);

        let err = ResourceManager::builder()
            .root(&missing)
            .mount_policy(MountPolicy::FailFast)
            .build()
            .unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn embedded_roots_fuse() {
        let bundle = EmbeddedBundle::new("core").with_file("data/motd.txt", b"hello".as_slice());
        let manager = ResourceManager::builder().embedded_root(bundle).build().unwrap();
        let motd = manager.handle("data/motd.txt").unwrap();
        assert_eq!(motd.kind(), HandleKind::Embedded);
        assert_eq!(motd.read_string().unwrap(), "hello");
        assert!(manager.handle("data").unwrap().is_directory());
    }

    #[test]
    fn cache_counts_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), "x").unwrap();
        fs::write(dir.path().join("y.txt"), "y").unwrap();

        let manager = ResourceManager::from_path(dir.path()).unwrap();
        assert_eq!(manager.cached_handles(), 0);
        manager.handle("x.txt").unwrap();
        manager.handle("x.txt").unwrap();
        manager.handle("y.txt").unwrap();
        assert_eq!(manager.cached_handles(), 2);
    }

    #[test]
    fn served_handles_know_their_manager() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();
        fs::write(dir.path().join("d/f.txt"), "f").unwrap();

        let manager = ResourceManager::from_path(dir.path()).unwrap();
        let d = manager.handle("d").unwrap();
        let via_child = d.child("f.txt").unwrap();
        assert!(Arc::ptr_eq(&via_child, &manager.handle("d/f.txt").unwrap()));
        assert!(d.manager().is_some());

        drop(manager);
        assert!(d.manager().is_none());
    }

    #[test]
    fn default_charset_applies_to_served_handles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("latin.txt"), [0x63, 0x61, 0x66, 0xE9]).unwrap();

        let manager = ResourceManager::builder()
            .root(dir.path())
            .default_charset(Charset::Latin1)
            .build()
            .unwrap();
        assert_eq!(manager.handle("latin.txt").unwrap().read_string().unwrap(), "café");
    }

    #[test]
    fn unknown_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ResourceManager::from_path(dir.path()).unwrap();
        assert!(matches!(manager.handle("does/not/exist"), Err(FsError::NotFound { .. })));
        assert_eq!(manager.cached_handles(), 0);
    }
}
