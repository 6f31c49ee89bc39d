use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{error, info};
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::Paragraph,
};

use crate::book_tree::BookTree;
use crate::event_source::EventSource;
use crate::library::{Entry, Library};
use crate::links::{LinkTag, NavigateCommand};
use crate::reader::{self, RenderSignal, SignalRecorder};
use crate::session::ReaderSession;
use crate::settings;
use crate::text_reader::TextReader;
use crate::theme::current_theme;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FocusedPanel {
    BookTree,
    Reader,
}

pub struct App {
    library: Library,
    session: ReaderSession,
    pub book_tree: BookTree,
    pub text_reader: TextReader,
    pub focused_panel: FocusedPanel,
    status: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(library: Library) -> Self {
        let mut text_reader = TextReader::new();
        text_reader.set_margin(settings::get_margin());
        Self {
            library,
            session: ReaderSession::new(),
            book_tree: BookTree::new(),
            text_reader,
            focused_panel: FocusedPanel::BookTree,
            status: None,
            should_quit: false,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Open a chapter in the reader. Any failure terminates this navigation
    /// attempt with a single message; the previously shown page stays up.
    pub fn open_chapter(&mut self, entry: Entry) -> Result<()> {
        let (targets, generation) = {
            let context = self.session.open(entry.clone());
            (context.targets.clone(), context.generation)
        };

        let recorder = SignalRecorder::default();
        let page = match reader::render_with_signals(&entry, &targets, recorder.sink()) {
            Ok(page) => page,
            Err(err) => {
                error!("failed to render {}: {err}", entry.path.display());
                self.status = Some(err.to_string());
                return Ok(());
            }
        };

        // A newer open while this read was in flight supersedes it.
        if !self.session.is_current(generation) {
            info!("discarding stale render of {}", entry.name);
            return Ok(());
        }
        let Some(context) = self.session.active() else {
            return Ok(());
        };

        self.text_reader.set_page(page, context);
        for signal in recorder.take() {
            match signal {
                RenderSignal::ScrollToTop => self.text_reader.scroll_to_top(),
                RenderSignal::FocusNavigation => self.focused_panel = FocusedPanel::BookTree,
            }
        }
        self.book_tree.select_path(&entry.path);
        self.status = None;
        Ok(())
    }

    /// Follow a navigation command produced by link activation.
    fn follow(&mut self, command: NavigateCommand) -> Result<()> {
        let target = self.session.active().and_then(|context| {
            [
                context.targets.previous.as_ref(),
                context.targets.next.as_ref(),
            ]
            .into_iter()
            .flatten()
            .find(|entry| entry.path == command.path)
            .cloned()
        });
        if let Some(entry) = target {
            self.open_chapter(entry)?;
        }
        Ok(())
    }

    /// Activate the first control-line span with the given tag, as the `n`/`p`
    /// keyboard accelerators do.
    pub fn activate_marker(&mut self, tag: LinkTag) -> Result<()> {
        let command = self.session.active().and_then(|context| {
            self.text_reader
                .link_spans()
                .iter()
                .map(|(_, span)| *span)
                .find(|span| span.tag == tag)
                .and_then(|span| context.activate(span))
        });
        if let Some(command) = command {
            self.follow(command)?;
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => Ok(()),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) => {
                self.should_quit = true;
            }
            (KeyCode::Tab, _) => {
                self.focused_panel = match self.focused_panel {
                    FocusedPanel::BookTree => FocusedPanel::Reader,
                    FocusedPanel::Reader => FocusedPanel::BookTree,
                };
            }
            (KeyCode::Char('r'), _) => {
                self.library.refresh();
            }
            (KeyCode::Char('n'), _) => self.activate_marker(LinkTag::Next)?,
            (KeyCode::Char('p'), _) => self.activate_marker(LinkTag::Previous)?,
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                let half = self.text_reader.half_page();
                self.text_reader.scroll_down(half);
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                let half = self.text_reader.half_page();
                self.text_reader.scroll_up(half);
            }
            (KeyCode::Char('j') | KeyCode::Down, _) => match self.focused_panel {
                FocusedPanel::BookTree => self.book_tree.select_next(),
                FocusedPanel::Reader => self.text_reader.scroll_down(1),
            },
            (KeyCode::Char('k') | KeyCode::Up, _) => match self.focused_panel {
                FocusedPanel::BookTree => self.book_tree.select_previous(),
                FocusedPanel::Reader => self.text_reader.scroll_up(1),
            },
            (KeyCode::Char('g'), _) => match self.focused_panel {
                FocusedPanel::BookTree => self.book_tree.select_first(),
                FocusedPanel::Reader => self.text_reader.scroll_to_top(),
            },
            (KeyCode::Char('G'), _) => match self.focused_panel {
                FocusedPanel::BookTree => self.book_tree.select_last(),
                FocusedPanel::Reader => self.text_reader.scroll_to_bottom(),
            },
            (KeyCode::Enter, _) => {
                if self.focused_panel == FocusedPanel::BookTree {
                    if let Some(entry) = self.book_tree.activate(&self.library)? {
                        self.open_chapter(entry)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(());
        }
        let span = self.text_reader.span_at(mouse.column, mouse.row);
        let command = self
            .session
            .active()
            .zip(span)
            .and_then(|(context, span)| context.activate(span));
        if let Some(command) = command {
            self.follow(command)?;
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let palette = current_theme();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[0]);

        self.book_tree.render(
            frame,
            panels[0],
            palette,
            self.focused_panel == FocusedPanel::BookTree,
        );
        self.text_reader.render(
            frame,
            panels[1],
            palette,
            self.focused_panel == FocusedPanel::Reader,
        );
        self.draw_status(frame, chunks[1]);
    }

    fn draw_status(&self, frame: &mut ratatui::Frame, area: Rect) {
        let palette = current_theme();
        let line = match &self.status {
            Some(message) => Line::styled(message.clone(), Style::default().fg(palette.base_08)),
            None => Line::styled(
                " q quit · Tab focus · Enter open · n/p next/previous chapter · r refresh",
                Style::default().fg(palette.base_03),
            ),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

pub fn run_app_with_event_source<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()> {
    loop {
        app.book_tree.sync(&app.library)?;
        terminal.draw(|frame| app.draw(frame))?;

        if event_source.poll(Duration::from_millis(100))? {
            let event = event_source.read()?;
            app.handle_event(event)?;
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_source::ScriptedEventSource;
    use crossterm::event::KeyEventState;
    use ratatui::backend::TestBackend;
    use std::fs;
    use tempfile::TempDir;

    fn demo_library() -> (TempDir, Library) {
        let dir = TempDir::new().unwrap();
        let library = Library::open(dir.path()).unwrap();
        let book = library.books_root().join("Demo");
        fs::create_dir(&book).unwrap();
        for (name, content) in [("1", "Hello"), ("2", "World"), ("3", "End")] {
            fs::write(book.join(name), content).unwrap();
        }
        (dir, library)
    }

    fn chapter(library: &Library, name: &str) -> Entry {
        let books = library.list_children(None).unwrap();
        let chapters = library.list_children(Some(&books[0])).unwrap();
        chapters
            .into_iter()
            .find(|entry| entry.name == name)
            .expect("chapter exists")
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn opening_the_middle_chapter_wires_both_markers() {
        let (_dir, library) = demo_library();
        let entry = chapter(&library, "2");
        let mut app = App::new(library);

        app.open_chapter(entry).unwrap();
        assert_eq!(app.focused_panel, FocusedPanel::BookTree);

        let spans = app.text_reader.link_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].1.tag, LinkTag::Previous);
        assert_eq!(spans[1].1.tag, LinkTag::Next);
    }

    #[test]
    fn next_then_previous_returns_to_the_middle_chapter() {
        let (_dir, library) = demo_library();
        let entry = chapter(&library, "2");
        let mut app = App::new(library);
        app.open_chapter(entry).unwrap();

        app.activate_marker(LinkTag::Next).unwrap();
        assert_eq!(
            app.session.active().map(|c| c.entry.name.as_str()),
            Some("3")
        );

        // Previous from 3 goes back to 2, not 1.
        app.activate_marker(LinkTag::Previous).unwrap();
        assert_eq!(
            app.session.active().map(|c| c.entry.name.as_str()),
            Some("2")
        );
    }

    #[test]
    fn stale_spans_from_a_replaced_session_do_nothing() {
        let (_dir, library) = demo_library();
        let second = chapter(&library, "2");
        let first = chapter(&library, "1");
        let mut app = App::new(library);

        app.open_chapter(second).unwrap();
        let stale_links = app.session.active().unwrap().links();
        let stale_span = app.text_reader.link_spans()[1].1;

        app.open_chapter(first).unwrap();
        let stale = stale_links.lock().unwrap();
        assert!(stale.is_disposed());
        assert_eq!(stale.activate(stale_span), None);
    }

    #[test]
    fn failed_navigation_reports_one_message_and_keeps_the_page() {
        let (_dir, library) = demo_library();
        let good = chapter(&library, "1");
        let mut missing = chapter(&library, "2");
        missing.path = missing.path.with_file_name("gone");
        missing.name = "gone".to_string();
        let mut app = App::new(library);

        app.open_chapter(good).unwrap();
        assert!(app.text_reader.has_content());
        let shown_before: usize = app.text_reader.link_spans().len();

        app.open_chapter(missing).unwrap();
        let message = app.status().expect("error surfaced");
        assert!(message.contains("not found"));
        assert!(app.text_reader.has_content());
        assert_eq!(app.text_reader.link_spans().len(), shown_before);
    }

    #[test]
    fn scripted_session_drives_the_full_loop() {
        let (_dir, library) = demo_library();
        let mut app = App::new(library);

        // Expand Demo, move to chapter 2, open it, jump next, quit.
        let mut events = ScriptedEventSource::new(vec![
            key(KeyCode::Enter),
            key(KeyCode::Char('j')),
            key(KeyCode::Char('j')),
            key(KeyCode::Enter),
            key(KeyCode::Char('n')),
            key(KeyCode::Char('q')),
        ]);
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        run_app_with_event_source(&mut terminal, &mut app, &mut events).unwrap();
        assert!(events.is_exhausted());
        assert_eq!(
            app.session.active().map(|c| c.entry.name.as_str()),
            Some("3")
        );
        let control = app
            .text_reader
            .link_spans()
            .iter()
            .map(|(_, span)| span.tag)
            .collect::<Vec<_>>();
        // Chapter 3 is last: previous only.
        assert_eq!(control, vec![LinkTag::Previous]);
    }
}
