use std::sync::{Arc, Mutex};

use log::debug;

use crate::library::Entry;
use crate::links::{LinkRegistration, LinkSpan, NavigateCommand, SharedRegistration};
use crate::navigation::{self, NavigationTargets};

/// Ephemeral state for the currently open chapter: the entry, its resolved
/// neighbors, the link registration bound to them, and the session generation
/// this context belongs to.
pub struct NavigationContext {
    pub entry: Entry,
    pub targets: NavigationTargets,
    pub generation: u64,
    links: SharedRegistration,
}

impl NavigationContext {
    pub fn scan(&self, line: &str) -> Vec<LinkSpan> {
        self.links
            .lock()
            .map(|links| links.scan(line))
            .unwrap_or_default()
    }

    pub fn activate(&self, span: LinkSpan) -> Option<NavigateCommand> {
        self.links.lock().ok().and_then(|links| links.activate(span))
    }

    /// Handle the display layer may keep alongside the spans it rendered;
    /// disposal through the session is observed through this handle too.
    pub fn links(&self) -> SharedRegistration {
        Arc::clone(&self.links)
    }
}

/// Owner of the single active `NavigationContext`.
///
/// `open` disposes the prior context's link registration before creating the
/// next one, which is the sole synchronization point: stale spans become
/// no-ops the moment a new chapter opens. The generation counter lets callers
/// discard reads that were superseded while in flight.
#[derive(Default)]
pub struct ReaderSession {
    active: Option<NavigationContext>,
    generation: u64,
}

impl ReaderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, entry: Entry) -> &NavigationContext {
        if let Some(prior) = self.active.take() {
            debug!("disposing registration for {}", prior.entry.name);
            if let Ok(mut links) = prior.links.lock() {
                links.dispose();
            }
        }

        self.generation += 1;
        let targets = navigation::resolve_navigation(&entry);
        let mut registration = LinkRegistration::new();
        registration.register(&targets);
        debug!(
            "opened {} (generation {}, previous: {:?}, next: {:?})",
            entry.name,
            self.generation,
            targets.previous.as_ref().map(|e| &e.name),
            targets.next.as_ref().map(|e| &e.name),
        );

        self.active.insert(NavigationContext {
            entry,
            targets,
            generation: self.generation,
            links: Arc::new(Mutex::new(registration)),
        })
    }

    pub fn close(&mut self) {
        if let Some(context) = self.active.take() {
            if let Ok(mut links) = context.links.lock() {
                links.dispose();
            }
        }
    }

    pub fn active(&self) -> Option<&NavigationContext> {
        self.active.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a render tagged with `generation` still belongs to the active
    /// context. Superseded results must be discarded by the caller.
    pub fn is_current(&self, generation: u64) -> bool {
        self.active.is_some() && generation == self.generation
    }
}
