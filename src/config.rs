//! # Manager Configuration
//!
//! [`ResourceManagerBuilder`] collects the roots to fuse and the policies
//! that govern fusion, then runs the construction phase in
//! [`build`](ResourceManagerBuilder::build).
//!
//! ```rust,no_run
//! use assetfs::{Charset, MountPolicy, ResourceManager};
//!
//! let manager = ResourceManager::builder()
//!     .root("game/base")
//!     .root("game/mods")
//!     .mount_policy(MountPolicy::FailFast)
//!     .default_charset(Charset::Utf8)
//!     .build()?;
//! # Ok::<(), assetfs::FsError>(())
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    AlphabeticLoadOrder, Charset, EmbeddedBundle, FileHandle, FsError, LoadOrderProvider,
    ResourceManager,
};

/// What to do when a root or archive cannot be mounted during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MountPolicy {
    /// Abort the build with the first failure.
    FailFast,
    /// Log and record the failure, skip the offending root or archive, and
    /// keep fusing everything else.
    #[default]
    BestEffort,
}

/// A root or archive skipped under [`MountPolicy::BestEffort`].
#[derive(Debug)]
pub struct MountFailure {
    /// Physical path of the root, directory or archive that failed.
    pub path: PathBuf,
    /// Why it failed.
    pub error: FsError,
}

pub(crate) enum RootSource {
    Path(PathBuf),
    Handle(Arc<FileHandle>),
    Embedded(Arc<EmbeddedBundle>),
}

impl RootSource {
    /// The string handed to the load-order policy.
    pub(crate) fn order_key(&self) -> String {
        match self {
            RootSource::Path(path) => path.to_string_lossy().into_owned(),
            RootSource::Handle(handle) => handle.physical_path(),
            RootSource::Embedded(bundle) => format!("embedded://{}", bundle.label()),
        }
    }
}

/// Builder for [`ResourceManager`].
///
/// Defaults: no roots, [`AlphabeticLoadOrder`], [`MountPolicy::BestEffort`],
/// [`Charset::Utf8`].
pub struct ResourceManagerBuilder {
    pub(crate) roots: Vec<RootSource>,
    pub(crate) load_order: Box<dyn LoadOrderProvider>,
    pub(crate) mount_policy: MountPolicy,
    pub(crate) default_charset: Charset,
}

impl Default for ResourceManagerBuilder {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            load_order: Box::new(AlphabeticLoadOrder),
            mount_policy: MountPolicy::default(),
            default_charset: Charset::default(),
        }
    }
}

impl fmt::Debug for ResourceManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots: Vec<String> = self.roots.iter().map(RootSource::order_key).collect();
        f.debug_struct("ResourceManagerBuilder")
            .field("roots", &roots)
            .field("mount_policy", &self.mount_policy)
            .field("default_charset", &self.default_charset)
            .finish_non_exhaustive()
    }
}

impl ResourceManagerBuilder {
    /// Add a directory, `.zip` or `.jar` file to fuse.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.roots.push(RootSource::Path(path.into()));
        self
    }

    /// Add several roots at once.
    pub fn roots<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots
            .extend(paths.into_iter().map(|p| RootSource::Path(p.into())));
        self
    }

    /// Add an existing handle as a root. Its children are fused at the top
    /// of the namespace, whatever path the handle itself carries.
    pub fn root_handle(mut self, handle: Arc<FileHandle>) -> Self {
        self.roots.push(RootSource::Handle(handle));
        self
    }

    /// Add an embedded bundle as a root. Bundles are addressed by label, so
    /// two different bundles may not share one.
    pub fn embedded_root(mut self, bundle: impl Into<Arc<EmbeddedBundle>>) -> Self {
        self.roots.push(RootSource::Embedded(bundle.into()));
        self
    }

    /// Replace the load-order policy.
    pub fn load_order(mut self, provider: impl LoadOrderProvider + 'static) -> Self {
        self.load_order = Box::new(provider);
        self
    }

    /// Choose between aborting and skipping on mount failures.
    pub fn mount_policy(mut self, policy: MountPolicy) -> Self {
        self.mount_policy = policy;
        self
    }

    /// Charset used by `read_string` and `write_string` on handles served by
    /// the built manager.
    pub fn default_charset(mut self, charset: Charset) -> Self {
        self.default_charset = charset;
        self
    }

    /// Walk every root and build the manager.
    ///
    /// # Errors
    ///
    /// - [`FsError::LoadOrder`] if the load-order policy does not return a
    ///   permutation of the roots, under either mount policy
    /// - [`FsError::DuplicateBundle`] if two different embedded bundles share
    ///   a label, under either mount policy
    /// - Under [`MountPolicy::FailFast`], the first mount failure
    pub fn build(self) -> Result<ResourceManager, FsError> {
        ResourceManager::build(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let builder = ResourceManagerBuilder::default();
        assert!(builder.roots.is_empty());
        assert_eq!(builder.mount_policy, MountPolicy::BestEffort);
        assert_eq!(builder.default_charset, Charset::Utf8);
    }

    #[test]
    fn order_keys_identify_each_source() {
        let builder = ResourceManagerBuilder::default()
            .root("/data/base")
            .embedded_root(EmbeddedBundle::new("core"))
            .roots(["/x/a.zip", "/x/b"]);
        let keys: Vec<_> = builder.roots.iter().map(RootSource::order_key).collect();
        assert_eq!(keys, vec!["/data/base", "embedded://core", "/x/a.zip", "/x/b"]);
    }

    #[test]
    fn debug_lists_roots() {
        let builder = ResourceManagerBuilder::default().root("/data/base");
        let debug = format!("{builder:?}");
        assert!(debug.contains("/data/base"));
        assert!(debug.contains("BestEffort"));
    }
}
