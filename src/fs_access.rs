use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

/// Kind of a filesystem entry, derived from a non-following stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Unknown,
}

/// Classified filesystem error. Underlying OS codes are normalized so the
/// rest of the crate never matches on raw `io::ErrorKind`.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("is a directory: {0}")]
    IsADirectory(PathBuf),
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("{0} is not valid UTF-8")]
    Decode(PathBuf),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FsError>;

pub(crate) fn classify(err: io::Error, path: &Path) -> FsError {
    let path = path.to_path_buf();
    match err.kind() {
        io::ErrorKind::NotFound => FsError::NotFound(path),
        io::ErrorKind::NotADirectory => FsError::NotADirectory(path),
        io::ErrorKind::IsADirectory => FsError::IsADirectory(path),
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path),
        io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path),
        _ => FsError::Io { path, source: err },
    }
}

/// Stat result for a single path.
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub kind: EntryKind,
    pub size: u64,
    pub ctime: Option<SystemTime>,
    pub mtime: Option<SystemTime>,
}

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_file() {
        EntryKind::File
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_symlink() {
        EntryKind::Symlink
    } else {
        EntryKind::Unknown
    }
}

pub fn stat(path: &Path) -> Result<FileStat> {
    let metadata = fs::symlink_metadata(path).map_err(|e| classify(e, path))?;
    Ok(FileStat {
        kind: kind_of(metadata.file_type()),
        size: metadata.len(),
        ctime: metadata.created().ok(),
        mtime: metadata.modified().ok(),
    })
}

pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// List a directory as unordered `(name, kind)` pairs. Entries that vanish
/// between the readdir and the stat are skipped.
pub fn list(path: &Path) -> Result<Vec<(String, EntryKind)>> {
    let stat = stat(path)?;
    if stat.kind != EntryKind::Directory {
        return Err(FsError::NotADirectory(path.to_path_buf()));
    }

    let read_dir = fs::read_dir(path).map_err(|e| classify(e, path))?;
    let mut children = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| classify(e, path))?;
        let Ok(file_type) = dir_entry.file_type() else {
            continue;
        };
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        children.push((name, kind_of(file_type)));
    }
    Ok(children)
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| classify(e, path))
}

/// Read a file as strict UTF-8 text.
pub fn read_to_string(path: &Path) -> Result<String> {
    let bytes = read_bytes(path)?;
    String::from_utf8(bytes).map_err(|_| FsError::Decode(path.to_path_buf()))
}

pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| classify(e, path))
}

pub fn remove_dir_all(path: &Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(|e| classify(e, path))
}

pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    fs::copy(source, dest).map_err(|e| classify(e, source))?;
    Ok(())
}

pub fn rename(old_path: &Path, new_path: &Path) -> Result<()> {
    fs::rename(old_path, new_path).map_err(|e| classify(e, old_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn stat_reports_kinds() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("chapter"), "text").unwrap();
        fs::create_dir(dir.path().join("book")).unwrap();

        assert_eq!(
            stat(&dir.path().join("chapter")).unwrap().kind,
            EntryKind::File
        );
        assert_eq!(
            stat(&dir.path().join("book")).unwrap().kind,
            EntryKind::Directory
        );
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(stat(&missing), Err(FsError::NotFound(_))));
        assert!(matches!(read_bytes(&missing), Err(FsError::NotFound(_))));
        assert!(matches!(list(&missing), Err(FsError::NotFound(_))));
    }

    #[test]
    fn listing_a_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("chapter");
        fs::write(&file, "text").unwrap();
        assert!(matches!(list(&file), Err(FsError::NotADirectory(_))));
    }

    #[test]
    fn non_utf8_content_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("binary");
        fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(read_to_string(&file), Err(FsError::Decode(_))));
    }

    #[test]
    fn list_returns_all_children() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1"), "a").unwrap();
        fs::write(dir.path().join("2"), "b").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut names: Vec<String> = list(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["1", "2", "sub"]);
    }
}
