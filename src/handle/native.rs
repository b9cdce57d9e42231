//! Plain filesystem files and directories.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;
use std::sync::Arc;

use super::{Backing, FileHandle, WriteSink};
use crate::FsError;

/// Writable if the OS grants write permission. A path that does not exist
/// yet is writable when its parent directory is.
pub(super) fn writable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => !meta.permissions().readonly(),
        Err(_) => {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            fs::metadata(parent).is_ok_and(|meta| meta.is_dir() && !meta.permissions().readonly())
        }
    }
}

/// Children sorted by file name, archives classified by extension.
pub(super) fn list(handle: &Arc<FileHandle>, dir: &Path) -> Result<Vec<Arc<FileHandle>>, FsError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut children = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| FsError::io("list directory", dir, e))? {
        let entry = entry.map_err(|e| FsError::io("list directory", dir, e))?;
        children.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(children
        .into_iter()
        .map(|(name, path)| {
            FileHandle::new(
                handle.path.join(&name),
                Backing::classify(path),
                handle.manager.clone(),
            )
        })
        .collect())
}

pub(super) fn read(path: &Path) -> Result<Box<dyn Read + Send>, FsError> {
    if path.is_dir() {
        return Err(FsError::IsDirectory {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| FsError::io("open", path, e))?;
    Ok(Box::new(BufReader::new(file)))
}

pub(super) fn write(path: &Path, append: bool) -> Result<WriteSink, FsError> {
    if path.is_dir() {
        return Err(FsError::IsDirectory {
            path: path.to_path_buf(),
        });
    }
    if !writable(path) {
        return Ok(WriteSink::Unsupported);
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| FsError::io("open for writing", path, e))?;
    Ok(WriteSink::Open(Box::new(BufWriter::new(file))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HandleKind, VirtualPath};
    use std::io::Write;

    #[test]
    fn list_sorts_and_classifies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("pack.zip"), b"not really a zip").unwrap();

        let root = FileHandle::mounted_at("assets", dir.path());
        let children = root.list().unwrap();
        let paths: Vec<_> = children.iter().map(|c| c.path().as_str().to_string()).collect();
        assert_eq!(paths, vec!["assets/a.txt", "assets/b.txt", "assets/pack.zip", "assets/sub"]);
        assert_eq!(children[2].kind(), HandleKind::ZipRoot);
        assert_eq!(children[3].kind(), HandleKind::File);
        assert!(children[3].is_directory());
    }

    #[test]
    fn list_on_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let handle = FileHandle::from_path(&file);
        assert!(handle.list().unwrap().is_empty());
    }

    #[test]
    fn read_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read(dir.path()), Err(FsError::IsDirectory { .. })));
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read(&dir.path().join("gone.txt")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn write_truncates_or_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("log.txt");
        for (text, append) in [("one", false), ("two", true), ("three", false)] {
            match write(&file, append).unwrap() {
                WriteSink::Open(mut w) => {
                    w.write_all(text.as_bytes()).unwrap();
                    w.flush().unwrap();
                }
                WriteSink::Unsupported => panic!("filesystem file should be writable"),
            }
        }
        assert_eq!(fs::read_to_string(&file).unwrap(), "three");
    }

    #[test]
    fn missing_file_in_existing_dir_is_writable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(writable(&dir.path().join("new.txt")));
        assert!(!writable(&dir.path().join("no/such/parent/new.txt")));
    }

    #[test]
    fn child_paths_extend_parent_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.txt"), "x").unwrap();
        let root = FileHandle::from_path(dir.path());
        let child = &root.list().unwrap()[0];
        assert_eq!(child.path(), &VirtualPath::new("x.txt"));
    }
}
