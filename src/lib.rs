//! # assetfs
//!
//! A **fused virtual filesystem** over plain directories, zip archives, jar
//! archives and embedded resource bundles.
//!
//! Several physical roots are merged into one namespace of slash-separated
//! virtual paths. Archives found while walking a root are mounted in place:
//! their entries appear at the same depth as the files next to the archive,
//! and callers never see where one store ends and another begins.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assetfs::{FsError, ResourceManager};
//!
//! fn load() -> Result<(), FsError> {
//!     // base/ holds textures.zip; mods/ overrides some of its files.
//!     let assets = ResourceManager::with_roots(["base", "mods"])?;
//!
//!     let water = assets.handle("textures/water.png")?;
//!     println!("{} bytes", water.read_bytes()?.len());
//!
//!     for shader in assets.handle("shaders")?.list_with_suffix(".glsl")? {
//!         println!("{} ({} bytes)", shader.path(), shader.read_bytes()?.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ResourceManager`] | Fuses roots, resolves and caches handles |
//! | [`ResourceManagerBuilder`] | Roots, load order, mount policy, charset |
//! | [`FileHandle`] | Read, list and write one object, whatever stores it |
//! | [`HandleKind`] | Which backing store a handle uses |
//! | [`LoadOrderProvider`] | Decides which root wins a path collision |
//! | [`VirtualPath`] | Normalized path in the fused namespace |
//! | [`PhysicalLocator`] | Where a virtual path really lives |
//! | [`FsError`] | Error type with the offending path |
//!
//! ---
//!
//! ## Backing Stores
//!
//! | Store | Handle kinds | Writable |
//! |-------|--------------|----------|
//! | Directory tree | [`HandleKind::File`] | where the OS permits |
//! | `.zip` file | [`HandleKind::ZipRoot`], [`HandleKind::ZipEntry`] | no |
//! | `.jar` file | [`HandleKind::JarRoot`], [`HandleKind::JarEntry`] | no |
//! | [`EmbeddedBundle`] | [`HandleKind::Embedded`] | no |
//!
//! Jar roots also expose their [`Manifest`].
//!
//! ---
//!
//! ## Collisions
//!
//! Roots are ordered by a [`LoadOrderProvider`] ([`AlphabeticLoadOrder`] by
//! default). When two roots provide the same virtual path, the root later
//! in that order wins.
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, FsError>`. Errors include context:
//!
//! ```rust
//! use assetfs::FsError;
//! use std::path::PathBuf;
//!
//! let err = FsError::NotFound { path: PathBuf::from("textures/missing.png") };
//! assert_eq!(err.to_string(), "not found: textures/missing.png");
//! ```
//!
//! Unmountable roots and malformed archives are handled according to the
//! [`MountPolicy`]: skipped and recorded by default, or fatal.
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`ResourceManager`] and [`FileHandle`] are `Send + Sync`. The path table
//! is read-only once built, the handle cache is locked per lookup, and reads
//! from one archive are serialized on that archive.
//!
//! ---
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]. The crate never installs a
//! subscriber.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`VirtualPath`], [`PhysicalLocator`], [`MountPolicy`], etc., plus `FileHandle::read_json`/`write_json` |

// Private modules
mod archive;
mod charset;
mod config;
mod embedded;
mod error;
mod ext;
mod handle;
mod load_order;
mod manager;
mod types;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use charset::Charset;
pub use types::{ArchiveKind, PhysicalLocator, VirtualPath};

// Public re-exports - handles
pub use archive::Manifest;
pub use embedded::EmbeddedBundle;
pub use handle::{FileHandle, HandleKind, WriteSink};

// Public re-exports - resolver
pub use config::{MountFailure, MountPolicy, ResourceManagerBuilder};
pub use load_order::{AlphabeticLoadOrder, LoadOrderProvider};
pub use manager::ResourceManager;
