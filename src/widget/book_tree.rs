use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::fs_access::FsError;
use crate::library::{Entry, Library};
use crate::theme::Base16Palette;

/// One visible row of the flattened tree.
pub struct TreeRow {
    pub entry: Entry,
    pub depth: usize,
}

/// The library panel: books at the top level, chapters indented beneath
/// expanded books. Rows are rebuilt from `list_children` on every reload;
/// nothing is cached across reloads.
pub struct BookTree {
    rows: Vec<TreeRow>,
    state: ListState,
    expanded: HashSet<PathBuf>,
    seen_generation: Option<u64>,
}

impl Default for BookTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BookTree {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            state: ListState::default(),
            expanded: HashSet::new(),
            seen_generation: None,
        }
    }

    /// Rebuild the visible rows from the tree model.
    pub fn reload(&mut self, library: &Library) -> Result<(), FsError> {
        let mut rows = Vec::new();
        let books = library.list_children(None)?;
        for book in books {
            append_rows(library, &self.expanded, book, 0, &mut rows)?;
        }
        self.rows = rows;

        match self.state.selected() {
            Some(selected) if selected >= self.rows.len() => {
                self.state
                    .select(self.rows.len().checked_sub(1));
            }
            None if !self.rows.is_empty() => self.state.select(Some(0)),
            _ => {}
        }
        Ok(())
    }

    /// Re-list when a newer refresh generation has been observed.
    pub fn sync(&mut self, library: &Library) -> Result<(), FsError> {
        let generation = library.refresh_signal().current();
        if self.seen_generation != Some(generation) {
            self.seen_generation = Some(generation);
            self.reload(library)?;
        }
        Ok(())
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.state
            .selected()
            .and_then(|index| self.rows.get(index))
            .map(|row| &row.entry)
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let next = match self.state.selected() {
            Some(index) => (index + 1).min(self.rows.len() - 1),
            None => 0,
        };
        self.state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let previous = self.state.selected().map_or(0, |i| i.saturating_sub(1));
        self.state.select(Some(previous));
    }

    pub fn select_first(&mut self) {
        if !self.rows.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.rows.is_empty() {
            self.state.select(Some(self.rows.len() - 1));
        }
    }

    /// Move the selection to the row showing `path`, if visible.
    pub fn select_path(&mut self, path: &Path) {
        if let Some(index) = self.rows.iter().position(|row| row.entry.path == path) {
            self.state.select(Some(index));
        }
    }

    /// Enter on the selection: directories toggle open/closed, files are
    /// handed back for the caller to open in the reader.
    pub fn activate(&mut self, library: &Library) -> Result<Option<Entry>, FsError> {
        let Some(entry) = self.selected().cloned() else {
            return Ok(None);
        };
        if entry.is_dir() {
            if !self.expanded.remove(&entry.path) {
                self.expanded.insert(entry.path.clone());
            }
            self.reload(library)?;
            Ok(None)
        } else {
            Ok(Some(entry))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        palette: &Base16Palette,
        is_focused: bool,
    ) {
        let (border_fg, title_fg, _bg) = palette.get_panel_colors(is_focused);
        let (selection_bg, selection_fg) = palette.get_selection_colors(is_focused);

        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| {
                let indent = "  ".repeat(row.depth);
                let marker = if row.entry.is_dir() {
                    if self.expanded.contains(&row.entry.path) {
                        "▾ "
                    } else {
                        "▸ "
                    }
                } else {
                    "  "
                };
                let style = if row.entry.is_dir() {
                    Style::default()
                        .fg(palette.base_0d)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(palette.base_05)
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{indent}{marker}{}", row.entry.name),
                    style,
                )))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Library ")
                    .border_style(Style::default().fg(border_fg))
                    .title_style(Style::default().fg(title_fg)),
            )
            .highlight_style(Style::default().bg(selection_bg).fg(selection_fg));

        frame.render_stateful_widget(list, area, &mut self.state);
    }
}

fn append_rows(
    library: &Library,
    expanded: &HashSet<PathBuf>,
    entry: Entry,
    depth: usize,
    rows: &mut Vec<TreeRow>,
) -> Result<(), FsError> {
    let expand = entry.is_dir() && expanded.contains(&entry.path);
    let children = if expand {
        Some(library.list_children(Some(&entry))?)
    } else {
        None
    };
    rows.push(TreeRow { entry, depth });
    if let Some(children) = children {
        for child in children {
            append_rows(library, expanded, child, depth + 1, rows)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn library_with_books() -> (TempDir, Library) {
        let dir = TempDir::new().unwrap();
        let library = Library::open(dir.path()).unwrap();
        for (book, chapters) in [("Alpha", vec!["1", "2"]), ("Beta", vec!["1"])] {
            let book_dir = library.books_root().join(book);
            fs::create_dir(&book_dir).unwrap();
            for chapter in chapters {
                fs::write(book_dir.join(chapter), "text").unwrap();
            }
        }
        (dir, library)
    }

    #[test]
    fn reload_lists_books_collapsed() {
        let (_dir, library) = library_with_books();
        let mut tree = BookTree::new();
        tree.reload(&library).unwrap();
        let names: Vec<&str> = tree.rows.iter().map(|r| r.entry.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert_eq!(tree.selected().map(|e| e.name.as_str()), Some("Alpha"));
    }

    #[test]
    fn activate_expands_a_book_and_opens_a_chapter() {
        let (_dir, library) = library_with_books();
        let mut tree = BookTree::new();
        tree.reload(&library).unwrap();

        assert!(tree.activate(&library).unwrap().is_none());
        let names: Vec<&str> = tree.rows.iter().map(|r| r.entry.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "1", "2", "Beta"]);

        tree.select_next();
        let opened = tree.activate(&library).unwrap().expect("chapter entry");
        assert_eq!(opened.name, "1");
        assert_eq!(opened.parent_name, "Alpha");
    }

    #[test]
    fn sync_reloads_after_refresh() {
        let (_dir, library) = library_with_books();
        let mut tree = BookTree::new();
        tree.sync(&library).unwrap();
        assert_eq!(tree.rows.len(), 2);

        let gamma = library.books_root().join("Gamma");
        fs::create_dir(&gamma).unwrap();
        // No refresh yet, the tree keeps its snapshot.
        tree.sync(&library).unwrap();
        assert_eq!(tree.rows.len(), 2);

        library.refresh();
        tree.sync(&library).unwrap();
        assert_eq!(tree.rows.len(), 3);
    }

    #[test]
    fn select_path_moves_the_selection() {
        let (_dir, library) = library_with_books();
        let mut tree = BookTree::new();
        tree.reload(&library).unwrap();
        tree.activate(&library).unwrap();

        let chapter_path = library.books_root().join("Alpha").join("2");
        tree.select_path(&chapter_path);
        assert_eq!(tree.selected().map(|e| e.name.as_str()), Some("2"));
    }
}
