//! Read-only resource bundles compiled into the binary.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use crate::VirtualPath;

/// A labelled table of resource names to bytes.
///
/// Bundles play the role of a classpath: a fixed set of resources shipped
/// with the program, usually via `include_bytes!`. Directories are implied
/// by the names of the resources under them.
///
/// ```rust
/// use assetfs::EmbeddedBundle;
///
/// let bundle = EmbeddedBundle::new("builtin")
///     .with_file("shaders/basic.vert", b"void main() {}".as_slice())
///     .with_file("shaders/basic.frag", b"void main() {}".as_slice());
///
/// assert!(bundle.is_dir("shaders"));
/// assert_eq!(bundle.children("shaders").len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EmbeddedBundle {
    label: String,
    files: BTreeMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedBundle {
    /// Create an empty bundle. The label names the bundle in physical paths.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            files: BTreeMap::new(),
        }
    }

    /// Add a resource, builder style.
    pub fn with_file(mut self, name: &str, data: impl Into<Cow<'static, [u8]>>) -> Self {
        self.insert(name, data);
        self
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, name: &str, data: impl Into<Cow<'static, [u8]>>) {
        let name = VirtualPath::new(name);
        if !name.is_root() {
            self.files.insert(name.into(), data.into());
        }
    }

    /// The bundle label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of resources (directories are not counted).
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the bundle holds no resources.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Bytes of the resource `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|data| data.as_ref())
    }

    /// Returns `true` if `name` is the bundle root or a prefix directory of
    /// at least one resource.
    pub fn is_dir(&self, name: &str) -> bool {
        if name.is_empty() {
            return true;
        }
        let prefix = format!("{name}/");
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }

    /// Returns `true` if `name` is a resource or a directory.
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name) || self.is_dir(name)
    }

    /// Direct children of directory `name` as `(full name, is_dir)` pairs,
    /// sorted by name.
    pub fn children(&self, name: &str) -> Vec<(String, bool)> {
        let prefix = if name.is_empty() {
            String::new()
        } else {
            format!("{name}/")
        };
        let mut seen = BTreeSet::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => seen.insert((format!("{prefix}{dir}"), true)),
                None => seen.insert((key.clone(), false)),
            };
        }
        seen.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> EmbeddedBundle {
        EmbeddedBundle::new("builtin")
            .with_file("readme.txt", b"hello".as_slice())
            .with_file("/fonts/mono.ttf", b"ttf".as_slice())
            .with_file("fonts/sans/regular.ttf", b"ttf".as_slice())
    }

    #[test]
    fn names_are_normalized() {
        let b = bundle();
        assert_eq!(b.get("fonts/mono.ttf"), Some(b"ttf".as_slice()));
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn directories_are_implied() {
        let b = bundle();
        assert!(b.is_dir(""));
        assert!(b.is_dir("fonts"));
        assert!(b.is_dir("fonts/sans"));
        assert!(!b.is_dir("readme.txt"));
        assert!(!b.is_dir("font"));
        assert!(b.contains("fonts/sans"));
        assert!(!b.contains("missing"));
    }

    #[test]
    fn children_are_direct_and_sorted() {
        let b = bundle();
        assert_eq!(
            b.children(""),
            vec![("fonts".to_string(), true), ("readme.txt".to_string(), false)]
        );
        assert_eq!(
            b.children("fonts"),
            vec![
                ("fonts/mono.ttf".to_string(), false),
                ("fonts/sans".to_string(), true)
            ]
        );
        assert!(b.children("readme.txt").is_empty());
    }

    #[test]
    fn owned_data_is_accepted() {
        let mut b = EmbeddedBundle::new("generated");
        b.insert("data.bin", vec![1u8, 2, 3]);
        assert_eq!(b.get("data.bin"), Some([1u8, 2, 3].as_slice()));
    }
}
