use std::collections::BTreeSet;

use super::scope::WatchScope;
use super::types::DebouncedEvents;
use crate::actor::messages::ControlMsg;

pub(super) fn log_events(events: &DebouncedEvents) {
    for (path, kind) in &events.0 {
        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
    }
}

/// Convert a batch of events into controller messages.
///
/// A config change ends the session, so nothing else in the batch matters.
/// Files under the destination are the build's own output and never
/// trigger a rebuild.
pub(super) fn events_to_messages(events: &DebouncedEvents, scope: &WatchScope) -> Vec<ControlMsg> {
    if let Some(path) = events.paths().find(|p| scope.is_config(p)) {
        return vec![ControlMsg::ConfigChanged(path.clone())];
    }

    let mut targets = BTreeSet::new();
    for path in events.paths() {
        if scope.is_output(path) {
            continue;
        }
        targets.extend(scope.targets_for(path));
    }

    targets.into_iter().map(ControlMsg::Rebuild).collect()
}
