use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use log::debug;

use crate::fs_access::{self, EntryKind, FsError};

/// Name of the single top-level directory that holds all books.
pub const BOOKS_DIR: &str = "books";

/// A file or folder inside the storage root.
///
/// `siblings` is a snapshot of the parent listing taken when this entry was
/// materialized. It is shared across all entries of that listing and is never
/// recomputed automatically; it stays valid only until the next tree refresh.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub name: String,
    /// Display name of the containing book; empty at the root level.
    pub parent_name: String,
    pub siblings: Arc<Vec<(String, EntryKind)>>,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Shared refresh generation. Subscribers remember the last generation they
/// acted on and re-request children whenever a newer one is observed.
#[derive(Debug, Clone, Default)]
pub struct RefreshSignal {
    generation: Arc<AtomicU64>,
}

impl RefreshSignal {
    pub fn fire(&self) {
        self.generation.fetch_add(1, AtomicOrdering::SeqCst);
    }

    pub fn current(&self) -> u64 {
        self.generation.load(AtomicOrdering::SeqCst)
    }
}

/// The directory-backed tree model. Read-only; mutation happens through the
/// import pipeline, which fires `refresh` when it is done.
pub struct Library {
    books_root: PathBuf,
    refresh: RefreshSignal,
}

impl Library {
    /// Open the library under `storage_root`, creating the `books` directory
    /// if it does not exist yet.
    pub fn open(storage_root: &Path) -> Result<Self, FsError> {
        let books_root = storage_root.join(BOOKS_DIR);
        fs_access::create_dir_all(&books_root)?;
        debug!("library opened at {}", books_root.display());
        Ok(Self {
            books_root,
            refresh: RefreshSignal::default(),
        })
    }

    pub fn books_root(&self) -> &Path {
        &self.books_root
    }

    pub fn refresh_signal(&self) -> RefreshSignal {
        self.refresh.clone()
    }

    /// Invalidate listings derived from earlier calls. Nothing is cached here,
    /// so this only notifies subscribers to re-invoke `list_children`.
    pub fn refresh(&self) {
        debug!("library refresh requested");
        self.refresh.fire();
    }

    /// List the books directory (`None`) or the immediate children of a
    /// directory entry, in display order. Every returned entry shares one
    /// sibling snapshot.
    pub fn list_children(&self, entry: Option<&Entry>) -> Result<Vec<Entry>, FsError> {
        let (dir, parent_name) = match entry {
            Some(entry) if !entry.is_dir() => {
                return Err(FsError::NotADirectory(entry.path.clone()));
            }
            Some(entry) => (entry.path.clone(), entry.name.clone()),
            None => (self.books_root.clone(), String::new()),
        };

        let mut children = fs_access::list(&dir)?;
        sort_children(&mut children);
        let siblings = Arc::new(children);

        Ok(siblings
            .iter()
            .map(|(name, kind)| Entry {
                path: dir.join(name),
                kind: *kind,
                name: name.clone(),
                parent_name: parent_name.clone(),
                siblings: Arc::clone(&siblings),
            })
            .collect())
    }
}

/// Ordering policy for directory listings: directories before files; within a
/// kind, purely numeric names compare by value so `1`, `2`, `10` read in
/// chapter order instead of lexicographically.
pub fn sort_children(children: &mut [(String, EntryKind)]) {
    children.sort_by(|a, b| {
        let a_dir = a.1 == EntryKind::Directory;
        let b_dir = b.1 == EntryKind::Directory;
        b_dir.cmp(&a_dir).then_with(|| compare_names(&a.0, &b.0))
    });
}

fn compare_names(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a_num), Ok(b_num)) => a_num.cmp(&b_num),
        _ => a.cmp(b),
    }
}
