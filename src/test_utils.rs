//! Fixtures for exercising the library against a real temporary filesystem.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::library::Library;

/// A storage root holding one book per `(name, chapters)` pair, where each
/// chapter is a `(file name, content)` pair.
pub fn fake_library(books: &[(&str, &[(&str, &str)])]) -> (TempDir, Library) {
    let dir = TempDir::new().expect("temp storage root");
    let library = Library::open(dir.path()).expect("library");
    for (book, chapters) in books {
        let book_dir = library.books_root().join(book);
        fs::create_dir_all(&book_dir).expect("book dir");
        for (chapter, content) in *chapters {
            fs::write(book_dir.join(chapter), content).expect("chapter file");
        }
    }
    (dir, library)
}

/// The three-chapter "Demo" book used throughout the navigation tests.
pub fn demo_library() -> (TempDir, Library) {
    fake_library(&[("Demo", &[("1", "Hello"), ("2", "World"), ("3", "End")])])
}

/// A staging folder outside any storage root, for import tests.
pub fn staged_book(dir: &Path, name: &str, chapters: &[(&str, &str)]) -> std::path::PathBuf {
    let book_dir = dir.join(name);
    fs::create_dir_all(&book_dir).expect("staged book dir");
    for (chapter, content) in chapters {
        fs::write(book_dir.join(chapter), content).expect("staged chapter");
    }
    book_dir
}
