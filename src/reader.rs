use std::sync::{Arc, Mutex};

use log::debug;

use crate::fs_access::{self, FsError};
use crate::library::Entry;
use crate::links::{NEXT_MARKER, PREVIOUS_MARKER};
use crate::navigation::NavigationTargets;

/// Post-render obligations for the display layer. Both fire exactly once,
/// when the page has been fully consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSignal {
    ScrollToTop,
    FocusNavigation,
}

pub type SignalSink = Box<dyn FnMut(RenderSignal) + Send>;

/// Collects render signals for callers that act on them after consuming the
/// page.
#[derive(Clone, Default)]
pub struct SignalRecorder {
    signals: Arc<Mutex<Vec<RenderSignal>>>,
}

impl SignalRecorder {
    pub fn sink(&self) -> SignalSink {
        let signals = Arc::clone(&self.signals);
        Box::new(move |signal| {
            if let Ok(mut recorded) = signals.lock() {
                recorded.push(signal);
            }
        })
    }

    pub fn take(&self) -> Vec<RenderSignal> {
        self.signals
            .lock()
            .map(|mut recorded| std::mem::take(&mut *recorded))
            .unwrap_or_default()
    }
}

/// A finite, non-restartable sequence of display lines for one chapter.
pub struct PageLines {
    lines: std::vec::IntoIter<String>,
    sink: Option<SignalSink>,
}

impl Iterator for PageLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self.lines.next() {
            Some(line) => Some(line),
            None => {
                // Fires once; the sink is dropped after the first exhaustion.
                if let Some(mut sink) = self.sink.take() {
                    sink(RenderSignal::ScrollToTop);
                    sink(RenderSignal::FocusNavigation);
                }
                None
            }
        }
    }
}

/// Render a chapter: a book-title line, the decoded content double-spaced,
/// and a trailing control line carrying the navigation markers that have a
/// target. The file is read and decoded up front; emission itself cannot
/// fail.
pub fn render(entry: &Entry, navigation: &NavigationTargets) -> Result<PageLines, FsError> {
    render_with_signals(entry, navigation, Box::new(|_| {}))
}

pub fn render_with_signals(
    entry: &Entry,
    navigation: &NavigationTargets,
    sink: SignalSink,
) -> Result<PageLines, FsError> {
    let text = fs_access::read_to_string(&entry.path)?;
    debug!("rendering {} ({} bytes)", entry.path.display(), text.len());

    let mut lines = Vec::new();
    lines.push(format!("《{}》", entry.parent_name));
    lines.push(String::new());
    for line in split_lines(&text) {
        lines.push(line.to_string());
        lines.push(String::new());
    }
    if let Some(control) = control_line(navigation) {
        lines.push(control);
    }

    Ok(PageLines {
        lines: lines.into_iter(),
        sink: Some(sink),
    })
}

/// The trailing control line, or `None` when the chapter has no neighbors.
pub fn control_line(navigation: &NavigationTargets) -> Option<String> {
    let mut markers = Vec::new();
    if navigation.previous.is_some() {
        markers.push(PREVIOUS_MARKER);
    }
    if navigation.next.is_some() {
        markers.push(NEXT_MARKER);
    }
    if markers.is_empty() {
        None
    } else {
        Some(markers.join(" "))
    }
}

/// Split on `\n` or `\r\n`. A trailing newline yields a trailing empty line,
/// matching how the content was authored.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}
