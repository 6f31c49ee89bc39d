use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;

use crate::fs_access::{self, EntryKind, FsError};
use crate::library::Library;

/// Copy a source folder into the library as a new book and fire the tree
/// refresh. The copy is not transactional: a failure mid-way leaves whatever
/// was copied in place and the tree simply re-lists what exists.
pub fn import_book(source: &Path, library: &Library) -> Result<PathBuf, FsError> {
    let stat = fs_access::stat(source)?;
    if stat.kind != EntryKind::Directory {
        return Err(FsError::NotADirectory(source.to_path_buf()));
    }

    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| FsError::NotFound(source.to_path_buf()))?;
    let target = library.books_root().join(&name);
    if fs_access::exists(&target) {
        return Err(FsError::AlreadyExists(target));
    }
    fs_access::create_dir_all(&target)?;

    copy_tree(source, &target)?;
    info!("imported {} as book {name:?}", source.display());

    library.refresh();
    Ok(target)
}

fn copy_tree(source: &Path, target: &Path) -> Result<(), FsError> {
    for walked in WalkDir::new(source).min_depth(1) {
        let walked = walked.map_err(classify_walk)?;
        let Ok(relative) = walked.path().strip_prefix(source) else {
            continue;
        };
        let dest = target.join(relative);
        let file_type = walked.file_type();
        if file_type.is_dir() {
            fs_access::create_dir_all(&dest)?;
        } else if file_type.is_file() {
            fs_access::copy_file(walked.path(), &dest)?;
        } else {
            warn!("skipping non-regular entry {}", walked.path().display());
        }
    }
    Ok(())
}

fn classify_walk(err: walkdir::Error) -> FsError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    match err.into_io_error() {
        Some(io_err) => fs_access::classify(io_err, &path),
        None => FsError::Io {
            path,
            source: io::Error::other("filesystem loop while walking source"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source_book(dir: &TempDir) -> PathBuf {
        let source = dir.path().join("Demo");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("1"), "Hello").unwrap();
        fs::write(source.join("2"), "World").unwrap();
        let extras = source.join("extras");
        fs::create_dir(&extras).unwrap();
        fs::write(extras.join("notes"), "n").unwrap();
        source
    }

    #[test]
    fn import_reproduces_the_source_tree() {
        let storage = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let library = Library::open(storage.path()).unwrap();
        let source = source_book(&staging);

        let target = import_book(&source, &library).unwrap();
        assert_eq!(target, library.books_root().join("Demo"));
        assert_eq!(fs::read_to_string(target.join("1")).unwrap(), "Hello");
        assert_eq!(fs::read_to_string(target.join("2")).unwrap(), "World");
        assert_eq!(
            fs::read_to_string(target.join("extras/notes")).unwrap(),
            "n"
        );
    }

    #[test]
    fn import_fires_refresh_exactly_once() {
        let storage = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let library = Library::open(storage.path()).unwrap();
        let source = source_book(&staging);

        let signal = library.refresh_signal();
        let seen = signal.current();
        import_book(&source, &library).unwrap();
        assert_eq!(signal.current(), seen + 1);
    }

    #[test]
    fn importing_over_an_existing_book_fails() {
        let storage = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let library = Library::open(storage.path()).unwrap();
        let source = source_book(&staging);

        import_book(&source, &library).unwrap();
        assert!(matches!(
            import_book(&source, &library),
            Err(FsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn importing_a_file_fails_with_not_a_directory() {
        let storage = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let library = Library::open(storage.path()).unwrap();
        let file = staging.path().join("loose");
        fs::write(&file, "text").unwrap();

        assert!(matches!(
            import_book(&file, &library),
            Err(FsError::NotADirectory(_))
        ));
    }
}
