//! Core types: virtual paths, archive kinds and physical locators.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// A path in the fused namespace.
///
/// Virtual paths are slash-separated and normalized: no leading or trailing
/// slash, no empty or `.` components, and `..` resolved lexically. The root
/// of the namespace is the empty path.
///
/// ```rust
/// use assetfs::VirtualPath;
///
/// let p = VirtualPath::new("/textures/./ui//button.png");
/// assert_eq!(p.as_str(), "textures/ui/button.png");
/// assert_eq!(p.file_name(), "button.png");
/// assert_eq!(p.extension(), Some("png"));
/// assert_eq!(p.parent().unwrap().as_str(), "textures/ui");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub struct VirtualPath(String);

impl VirtualPath {
    /// Normalize `path` into a virtual path.
    pub fn new(path: impl AsRef<str>) -> Self {
        let mut parts: Vec<&str> = Vec::new();
        for part in path.as_ref().split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                _ => parts.push(part),
            }
        }
        Self(parts.join("/"))
    }

    /// The root of the namespace (the empty path).
    pub const fn root() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append one or more components.
    pub fn join(&self, name: impl AsRef<str>) -> Self {
        if self.is_root() {
            Self::new(name)
        } else {
            Self::new(format!("{}/{}", self.0, name.as_ref()))
        }
    }

    /// The final component, or `""` for the root.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// The extension of the final component, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rfind('/') {
            Some(idx) => Self(self.0[..idx].to_string()),
            None => Self::root(),
        })
    }

    /// String-prefix test; the root is a prefix of every path.
    pub fn starts_with(&self, prefix: &VirtualPath) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    /// String-suffix test, as used by suffix-filtered listings.
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for VirtualPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<VirtualPath> for String {
    fn from(path: VirtualPath) -> Self {
        path.0
    }
}

impl From<&VirtualPath> for PathBuf {
    fn from(path: &VirtualPath) -> Self {
        PathBuf::from(&path.0)
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VirtualPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Archive formats that are mounted as directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchiveKind {
    /// A `.zip` archive.
    Zip,
    /// A `.jar` archive.
    Jar,
}

impl ArchiveKind {
    /// Classify a file extension (case-insensitive, without the dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        if extension.eq_ignore_ascii_case("zip") {
            Some(ArchiveKind::Zip)
        } else if extension.eq_ignore_ascii_case("jar") {
            Some(ArchiveKind::Jar)
        } else {
            None
        }
    }

    /// Classify a physical path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// The canonical extension for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Jar => "jar",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where a virtual path physically lives.
///
/// Locators are produced once while the manager walks its roots and never
/// change afterwards. `Display` renders the physical path string and
/// [`FromStr`] parses it back:
///
/// ```rust
/// use assetfs::{ArchiveKind, PhysicalLocator};
///
/// let loc: PhysicalLocator = "/game/assets/base.zip/maps/e1m1.map".parse().unwrap();
/// assert_eq!(
///     loc,
///     PhysicalLocator::ArchiveEntry {
///         archive: "/game/assets/base.zip".into(),
///         entry: "maps/e1m1.map".into(),
///         kind: ArchiveKind::Zip,
///     }
/// );
/// assert_eq!(loc.to_string(), "/game/assets/base.zip/maps/e1m1.map");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhysicalLocator {
    /// A plain file or directory on disk.
    Filesystem(PathBuf),
    /// An entry inside a zip or jar archive.
    ArchiveEntry {
        /// The archive file on disk.
        archive: PathBuf,
        /// The entry name inside the archive, without a trailing slash.
        entry: String,
        /// The archive format.
        kind: ArchiveKind,
    },
    /// A resource inside an [`EmbeddedBundle`](crate::EmbeddedBundle).
    Embedded {
        /// The bundle label.
        bundle: String,
        /// The resource name inside the bundle.
        name: String,
    },
}

static ARCHIVE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<archive>.+?\.(?i:zip|jar))/(?P<entry>.+)$").expect("valid regex")
});

static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^embedded://(?P<bundle>[^/]+)(?:/(?P<name>.*))?$").expect("valid regex")
});

impl PhysicalLocator {
    /// The archive format, if this locator points into an archive or at an
    /// archive file.
    pub fn archive_kind(&self) -> Option<ArchiveKind> {
        match self {
            PhysicalLocator::Filesystem(path) => ArchiveKind::from_path(path),
            PhysicalLocator::ArchiveEntry { kind, .. } => Some(*kind),
            PhysicalLocator::Embedded { .. } => None,
        }
    }
}

impl fmt::Display for PhysicalLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalLocator::Filesystem(path) => write!(f, "{}", path.display()),
            PhysicalLocator::ArchiveEntry { archive, entry, .. } => {
                write!(f, "{}/{}", archive.display(), entry)
            }
            PhysicalLocator::Embedded { bundle, name } => write!(f, "embedded://{bundle}/{name}"),
        }
    }
}

impl FromStr for PhysicalLocator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = EMBEDDED.captures(s) {
            return Ok(PhysicalLocator::Embedded {
                bundle: caps["bundle"].to_string(),
                name: caps
                    .name("name")
                    .map(|m| String::from(VirtualPath::new(m.as_str())))
                    .unwrap_or_default(),
            });
        }
        if let Some(caps) = ARCHIVE_ENTRY.captures(s) {
            let archive = PathBuf::from(&caps["archive"]);
            if let Some(kind) = ArchiveKind::from_path(&archive) {
                return Ok(PhysicalLocator::ArchiveEntry {
                    archive,
                    entry: caps["entry"].trim_end_matches('/').to_string(),
                    kind,
                });
            }
        }
        Ok(PhysicalLocator::Filesystem(PathBuf::from(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_path_normalizes() {
        assert_eq!(VirtualPath::new("/a//b/./c/").as_str(), "a/b/c");
        assert_eq!(VirtualPath::new("a/b/../c").as_str(), "a/c");
        assert_eq!(VirtualPath::new("../../a").as_str(), "a");
        assert_eq!(VirtualPath::new("a\\b").as_str(), "a/b");
        assert!(VirtualPath::new("/").is_root());
    }

    #[test]
    fn virtual_path_join_from_root() {
        let root = VirtualPath::root();
        assert_eq!(root.join("foo.txt").as_str(), "foo.txt");
        assert_eq!(root.join("a/b").join("c").as_str(), "a/b/c");
    }

    #[test]
    fn virtual_path_parent_chain() {
        let p = VirtualPath::new("a/b");
        let parent = p.parent().unwrap();
        assert_eq!(parent.as_str(), "a");
        assert!(parent.parent().unwrap().is_root());
        assert!(VirtualPath::root().parent().is_none());
    }

    #[test]
    fn virtual_path_extension_ignores_dotfiles() {
        assert_eq!(VirtualPath::new("a/.hidden").extension(), None);
        assert_eq!(VirtualPath::new("a/b.tar.gz").extension(), Some("gz"));
        assert_eq!(VirtualPath::new("a/README").extension(), None);
    }

    #[test]
    fn virtual_path_prefix_and_suffix() {
        let p = VirtualPath::new("sounds/ui/click.ogg");
        assert!(p.starts_with(&VirtualPath::root()));
        assert!(p.starts_with(&VirtualPath::new("sounds")));
        assert!(p.ends_with(".ogg"));
        assert!(!p.ends_with(".wav"));
    }

    #[test]
    fn archive_kind_is_case_insensitive() {
        assert_eq!(ArchiveKind::from_path(Path::new("/a/B.ZIP")), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_path(Path::new("lib.Jar")), Some(ArchiveKind::Jar));
        assert_eq!(ArchiveKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(ArchiveKind::from_path(Path::new("zip")), None);
    }

    #[test]
    fn locator_parses_first_archive_boundary() {
        let loc: PhysicalLocator = "/r/outer.jar/inner.zip/x.txt".parse().unwrap();
        assert_eq!(
            loc,
            PhysicalLocator::ArchiveEntry {
                archive: PathBuf::from("/r/outer.jar"),
                entry: "inner.zip/x.txt".into(),
                kind: ArchiveKind::Jar,
            }
        );
    }

    #[test]
    fn locator_parses_plain_paths() {
        let loc: PhysicalLocator = "/r/assets/readme.txt".parse().unwrap();
        assert_eq!(loc, PhysicalLocator::Filesystem(PathBuf::from("/r/assets/readme.txt")));

        let archive_file: PhysicalLocator = "/r/base.zip".parse().unwrap();
        assert_eq!(archive_file.archive_kind(), Some(ArchiveKind::Zip));
    }

    #[test]
    fn locator_round_trips_embedded() {
        let loc = PhysicalLocator::Embedded {
            bundle: "builtin".into(),
            name: "shaders/basic.vert".into(),
        };
        let text = loc.to_string();
        assert_eq!(text, "embedded://builtin/shaders/basic.vert");
        assert_eq!(text.parse::<PhysicalLocator>().unwrap(), loc);
    }
}
