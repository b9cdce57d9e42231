//! Zip and jar archive objects shared by archive-root and archive-entry handles.
//!
//! One [`ArchiveFile`] exists per mounted archive. It opens the archive
//! lazily, builds an [`ArchiveIndex`] once, and serializes entry reads behind
//! a mutex because the zip reader needs exclusive access to seek.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use zip::ZipArchive;

use crate::{ArchiveKind, FsError, VirtualPath};

/// Name of the jar manifest entry.
pub(crate) const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_READ_RESERVE: u64 = 1 << 20;

/// A single entry in an [`ArchiveIndex`].
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    /// Normalized name: no leading or trailing slash.
    pub name: String,
    /// Name as stored in the archive; `None` for directories that are only
    /// implied by the names of their descendants.
    pub raw_name: Option<String>,
    pub is_dir: bool,
    pub size: u64,
}

/// Name-sorted view of an archive's entries with a precomputed
/// parent-to-children map.
#[derive(Debug, Default)]
pub(crate) struct ArchiveIndex {
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl ArchiveIndex {
    /// Build an index from `(raw name, is_dir, size)` triples in archive order.
    pub(crate) fn build(raw: impl IntoIterator<Item = (String, bool, u64)>) -> Self {
        let mut sorted: BTreeMap<String, IndexEntry> = BTreeMap::new();
        for (raw_name, is_dir, size) in raw {
            let name = VirtualPath::new(&raw_name).as_str().to_string();
            if name.is_empty() {
                continue;
            }
            let mut ancestor = VirtualPath::new(&name).parent();
            while let Some(dir) = ancestor.filter(|dir| !dir.is_root()) {
                sorted
                    .entry(dir.as_str().to_string())
                    .or_insert_with(|| IndexEntry {
                        name: dir.as_str().to_string(),
                        raw_name: None,
                        is_dir: true,
                        size: 0,
                    });
                ancestor = dir.parent();
            }
            let slot = sorted.entry(name.clone()).or_insert_with(|| IndexEntry {
                name,
                raw_name: None,
                is_dir,
                size,
            });
            // An explicit entry replaces a synthesized directory of the same name.
            if slot.raw_name.is_none() {
                slot.raw_name = Some(raw_name);
                slot.is_dir = is_dir;
                slot.size = size;
            }
        }

        let entries: Vec<IndexEntry> = sorted.into_values().collect();
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_name.insert(entry.name.clone(), idx);
            let parent = match entry.name.rsplit_once('/') {
                Some((parent, _)) => parent.to_string(),
                None => String::new(),
            };
            children.entry(parent).or_default().push(idx);
        }
        Self {
            entries,
            by_name,
            children,
        }
    }

    /// Every entry, sorted by name.
    pub(crate) fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub(crate) fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    /// Direct children of the directory `name` (`""` is the archive root).
    pub(crate) fn children<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a IndexEntry> + use<'a> {
        self.children
            .get(name)
            .into_iter()
            .flatten()
            .map(|&idx| &self.entries[idx])
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

enum ArchiveState {
    Unopened,
    Open {
        zip: ZipArchive<BufReader<File>>,
        index: Arc<ArchiveIndex>,
    },
    Closed,
}

/// A zip or jar file on disk, opened on first use.
pub(crate) struct ArchiveFile {
    path: PathBuf,
    kind: ArchiveKind,
    state: Mutex<ArchiveState>,
}

impl std::fmt::Debug for ArchiveFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFile")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ArchiveFile {
    pub(crate) fn new(path: impl Into<PathBuf>, kind: ArchiveKind) -> Self {
        Self {
            path: path.into(),
            kind,
            state: Mutex::new(ArchiveState::Unopened),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn kind(&self) -> ArchiveKind {
        self.kind
    }

    pub(crate) fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(*self.state.lock(), ArchiveState::Closed)
    }

    /// Close the archive. Later listings and reads fail with
    /// [`FsError::ArchiveClosed`].
    pub(crate) fn close(&self) {
        *self.state.lock() = ArchiveState::Closed;
        tracing::debug!(archive = %self.path.display(), "closed archive");
    }

    /// The entry index, opening the archive if needed.
    pub(crate) fn index(&self) -> Result<Arc<ArchiveIndex>, FsError> {
        let mut state = self.state.lock();
        let (_, index) = self.ensure_open(&mut state)?;
        Ok(Arc::clone(index))
    }

    /// Read an entry's decompressed bytes.
    pub(crate) fn read_entry(&self, name: &str) -> Result<Vec<u8>, FsError> {
        let mut state = self.state.lock();
        let (zip, index) = self.ensure_open(&mut state)?;
        let entry = index.get(name).ok_or_else(|| FsError::NotFound {
            path: self.entry_path(name),
        })?;
        let raw_name = match (&entry.raw_name, entry.is_dir) {
            (Some(raw_name), false) => raw_name.clone(),
            _ => {
                return Err(FsError::IsDirectory {
                    path: self.entry_path(name),
                });
            }
        };
        let capacity = read_reserve(entry.size);

        let mut file = zip
            .by_name(&raw_name)
            .map_err(|e| FsError::zip("read entry", &self.entry_path(name), e))?;
        let mut buf = Vec::with_capacity(capacity);
        file.read_to_end(&mut buf)
            .map_err(|e| FsError::io("read entry", &self.entry_path(name), e))?;
        Ok(buf)
    }

    /// Parse `META-INF/MANIFEST.MF`, if the archive has one.
    pub(crate) fn manifest(&self) -> Result<Option<Manifest>, FsError> {
        if self.index()?.get(MANIFEST_ENTRY).is_none() {
            return Ok(None);
        }
        let bytes = self.read_entry(MANIFEST_ENTRY)?;
        let text = String::from_utf8(bytes).map_err(|e| FsError::InvalidData {
            path: self.entry_path(MANIFEST_ENTRY),
            details: e.to_string(),
        })?;
        Ok(Some(Manifest::parse(&text)))
    }

    pub(crate) fn entry_path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", self.path.display(), name))
    }

    fn ensure_open<'a>(
        &self,
        state: &'a mut ArchiveState,
    ) -> Result<(&'a mut ZipArchive<BufReader<File>>, &'a Arc<ArchiveIndex>), FsError> {
        if matches!(state, ArchiveState::Unopened) {
            *state = self.load()?;
        }
        match state {
            ArchiveState::Open { zip, index } => Ok((zip, index)),
            ArchiveState::Unopened | ArchiveState::Closed => Err(FsError::ArchiveClosed {
                path: self.path.clone(),
            }),
        }
    }

    fn load(&self) -> Result<ArchiveState, FsError> {
        let file = File::open(&self.path).map_err(|e| FsError::io("open archive", &self.path, e))?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| FsError::zip("open archive", &self.path, e))?;

        let mut raw = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip
                .by_index(i)
                .map_err(|e| FsError::zip("index archive", &self.path, e))?;
            raw.push((entry.name().to_string(), entry.is_dir(), entry.size()));
        }
        let index = Arc::new(ArchiveIndex::build(raw));
        tracing::debug!(
            archive = %self.path.display(),
            kind = %self.kind,
            entries = index.len(),
            "opened archive"
        );
        Ok(ArchiveState::Open { zip, index })
    }
}

/// The header size is untrusted; reserve at most [`MAX_READ_RESERVE`] and
/// let the read grow the buffer past it.
fn read_reserve(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_READ_RESERVE)).unwrap_or_default()
}

/// Attributes parsed from a jar's `META-INF/MANIFEST.MF`.
///
/// The first block holds the main attributes; every later block is a
/// per-entry section keyed by its `Name` attribute. Lines starting with a
/// single space continue the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: BTreeMap<String, String>,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(text: &str) -> Self {
        let mut blocks: Vec<BTreeMap<String, String>> = Vec::new();
        let mut current: BTreeMap<String, String> = BTreeMap::new();
        let mut pending: Option<(String, String)> = None;

        for raw in text.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if let Some(rest) = line.strip_prefix(' ') {
                if let Some((_, value)) = pending.as_mut() {
                    value.push_str(rest);
                }
                continue;
            }
            if let Some((key, value)) = pending.take() {
                current.insert(key, value);
            }
            if line.is_empty() {
                if !current.is_empty() || blocks.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                let value = value.strip_prefix(' ').unwrap_or(value);
                pending = Some((key.trim().to_string(), value.to_string()));
            }
        }
        if let Some((key, value)) = pending.take() {
            current.insert(key, value);
        }
        if !current.is_empty() || blocks.is_empty() {
            blocks.push(current);
        }

        let mut blocks = blocks.into_iter();
        let main = blocks.next().unwrap_or_default();
        let sections = blocks
            .filter_map(|mut block| block.remove("Name").map(|name| (name, block)))
            .collect();
        Self { main, sections }
    }

    /// Look up a main attribute (case-insensitive key).
    pub fn main_attribute(&self, key: &str) -> Option<&str> {
        lookup(&self.main, key)
    }

    /// All main attributes.
    pub fn main_attributes(&self) -> &BTreeMap<String, String> {
        &self.main
    }

    /// Look up an attribute in the section for entry `name`.
    pub fn entry_attribute(&self, name: &str, key: &str) -> Option<&str> {
        self.sections.get(name).and_then(|section| lookup(section, key))
    }

    /// Names of every per-entry section.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

fn lookup<'a>(attributes: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}
