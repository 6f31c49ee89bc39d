use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::library::Entry;
use crate::navigation::NavigationTargets;

/// Literal markers embedded in rendered output. The display layer turns the
/// spans found by `scan` into clickable regions.
pub const PREVIOUS_MARKER: &str = "[previous chapter]";
pub const NEXT_MARKER: &str = "[next chapter]";

static PREVIOUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[previous chapter\]").unwrap());
static NEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[next chapter\]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTag {
    Previous,
    Next,
}

/// A navigable marker occurrence within one line of rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpan {
    /// Byte offset within the line.
    pub start: usize,
    pub len: usize,
    pub tag: LinkTag,
}

/// Command produced by activating a link span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateCommand {
    pub path: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistrationState {
    Idle,
    Registered,
    Disposed,
}

/// One link registration per reading context.
///
/// Lifecycle is `Idle -> Registered -> Disposed`; a disposed registration
/// never comes back, a fresh one is created for the next chapter. Scanning or
/// activating outside `Registered` yields nothing, which is what makes stale
/// spans from an earlier chapter harmless.
#[derive(Debug)]
pub struct LinkRegistration {
    state: RegistrationState,
    previous: Option<Entry>,
    next: Option<Entry>,
}

/// Handle shared between the session and the display layer, so disposal in
/// one place is observed everywhere the spans are still held.
pub type SharedRegistration = Arc<Mutex<LinkRegistration>>;

impl Default for LinkRegistration {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkRegistration {
    pub fn new() -> Self {
        Self {
            state: RegistrationState::Idle,
            previous: None,
            next: None,
        }
    }

    /// Bind this registration to the targets resolved for an opened chapter.
    /// Only an `Idle` registration can be registered.
    pub fn register(&mut self, navigation: &NavigationTargets) {
        if self.state != RegistrationState::Idle {
            debug!("ignoring register on a {:?} registration", self.state);
            return;
        }
        self.previous = navigation.previous.clone();
        self.next = navigation.next.clone();
        self.state = RegistrationState::Registered;
    }

    pub fn dispose(&mut self) {
        self.state = RegistrationState::Disposed;
        self.previous = None;
        self.next = None;
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    pub fn is_disposed(&self) -> bool {
        self.state == RegistrationState::Disposed
    }

    /// Find every non-overlapping marker occurrence in a line of rendered
    /// output, ordered by offset. A span is only reported when the matching
    /// navigation target was present at registration time.
    pub fn scan(&self, line: &str) -> Vec<LinkSpan> {
        if self.state != RegistrationState::Registered {
            return Vec::new();
        }

        let mut spans = Vec::new();
        if self.previous.is_some() {
            for found in PREVIOUS_RE.find_iter(line) {
                spans.push(LinkSpan {
                    start: found.start(),
                    len: found.len(),
                    tag: LinkTag::Previous,
                });
            }
        }
        if self.next.is_some() {
            for found in NEXT_RE.find_iter(line) {
                spans.push(LinkSpan {
                    start: found.start(),
                    len: found.len(),
                    tag: LinkTag::Next,
                });
            }
        }
        spans.sort_by_key(|span| span.start);
        spans
    }

    /// Map an activated span back to a navigation command. `None` once the
    /// registration has been disposed (a stale activation is a no-op) or when
    /// the span's target is absent.
    pub fn activate(&self, span: LinkSpan) -> Option<NavigateCommand> {
        if self.state != RegistrationState::Registered {
            return None;
        }
        let target = match span.tag {
            LinkTag::Previous => self.previous.as_ref(),
            LinkTag::Next => self.next.as_ref(),
        }?;
        Some(NavigateCommand {
            path: target.path.clone(),
            name: target.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_access::EntryKind;
    use std::sync::Arc as StdArc;

    fn entry(name: &str) -> Entry {
        Entry {
            path: PathBuf::from("/books/Demo").join(name),
            kind: EntryKind::File,
            name: name.to_string(),
            parent_name: "Demo".to_string(),
            siblings: StdArc::new(Vec::new()),
        }
    }

    fn registered(previous: Option<&str>, next: Option<&str>) -> LinkRegistration {
        let mut registration = LinkRegistration::new();
        registration.register(&NavigationTargets {
            previous: previous.map(entry),
            next: next.map(entry),
        });
        registration
    }

    #[test]
    fn scan_finds_both_markers_in_order() {
        let registration = registered(Some("1"), Some("3"));
        let line = format!("{PREVIOUS_MARKER} {NEXT_MARKER}");
        let spans = registration.scan(&line);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].tag, LinkTag::Previous);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].len, PREVIOUS_MARKER.len());
        assert_eq!(spans[1].tag, LinkTag::Next);
        assert_eq!(spans[1].start, PREVIOUS_MARKER.len() + 1);
        assert_eq!(spans[1].len, NEXT_MARKER.len());
    }

    #[test]
    fn scan_never_reports_a_span_without_a_target() {
        let registration = registered(None, Some("2"));
        let line = format!("{PREVIOUS_MARKER} {NEXT_MARKER}");
        let spans = registration.scan(&line);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].tag, LinkTag::Next);
    }

    #[test]
    fn scan_is_a_global_unanchored_match() {
        let registration = registered(Some("1"), None);
        let line = format!("text {PREVIOUS_MARKER} more {PREVIOUS_MARKER}");
        let spans = registration.scan(&line);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].start < spans[1].start);
    }

    #[test]
    fn activate_maps_tags_to_targets() {
        let registration = registered(Some("1"), Some("3"));
        let spans = registration.scan(&format!("{PREVIOUS_MARKER} {NEXT_MARKER}"));
        let previous = registration.activate(spans[0]).expect("previous command");
        assert_eq!(previous.name, "1");
        assert_eq!(previous.path, PathBuf::from("/books/Demo/1"));
        let next = registration.activate(spans[1]).expect("next command");
        assert_eq!(next.name, "3");
    }

    #[test]
    fn disposed_registration_is_inert() {
        let mut registration = registered(Some("1"), Some("3"));
        let spans = registration.scan(&format!("{PREVIOUS_MARKER} {NEXT_MARKER}"));
        registration.dispose();
        assert!(registration.is_disposed());
        assert!(registration.scan(PREVIOUS_MARKER).is_empty());
        assert_eq!(registration.activate(spans[0]), None);
    }

    #[test]
    fn disposed_registration_cannot_re_register() {
        let mut registration = registered(Some("1"), None);
        registration.dispose();
        registration.register(&NavigationTargets {
            previous: Some(entry("1")),
            next: None,
        });
        assert!(registration.is_disposed());
        assert!(registration.scan(PREVIOUS_MARKER).is_empty());
    }

    #[test]
    fn idle_registration_scans_to_nothing() {
        let registration = LinkRegistration::new();
        assert!(registration.scan(PREVIOUS_MARKER).is_empty());
    }
}
