use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::library::Entry;

/// Previous/next entries resolved for one opened chapter. Both are derived
/// from the chapter's own sibling snapshot, never from a directory re-scan.
#[derive(Debug, Clone, Default)]
pub struct NavigationTargets {
    pub previous: Option<Entry>,
    pub next: Option<Entry>,
}

/// Locate `entry` inside its sibling snapshot (first exact name match) and
/// derive the neighbors. An entry missing from its own snapshot means the
/// snapshot went stale; navigation degrades to "no neighbors" instead of
/// failing.
pub fn resolve_navigation(entry: &Entry) -> NavigationTargets {
    let Some(index) = entry
        .siblings
        .iter()
        .position(|(name, _)| *name == entry.name)
    else {
        debug!("{} missing from its sibling snapshot", entry.name);
        return NavigationTargets::default();
    };

    let previous = (index > 0).then(|| sibling_at(entry, index - 1));
    let next = (index + 1 < entry.siblings.len()).then(|| sibling_at(entry, index + 1));
    NavigationTargets { previous, next }
}

fn sibling_at(origin: &Entry, index: usize) -> Entry {
    let (name, kind) = &origin.siblings[index];
    let dir = origin.path.parent().unwrap_or_else(|| Path::new(""));
    Entry {
        path: dir.join(name),
        kind: *kind,
        name: name.clone(),
        parent_name: origin.parent_name.clone(),
        siblings: Arc::clone(&origin.siblings),
    }
}
