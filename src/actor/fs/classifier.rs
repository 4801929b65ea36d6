use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::types::{ChangeKind, DebouncedEvents};
use crate::debug;

/// Settle a released batch against the filesystem as it is now.
///
/// notify reports what it saw in flight: a file created and deleted inside
/// the window, or removed and rewritten by an atomic save. The kind kept is
/// the one the disk agrees with. Directories are dropped unless removed;
/// their files report on their own.
pub(super) fn settle(raw: FxHashMap<PathBuf, ChangeKind>) -> Option<DebouncedEvents> {
    let mut events: Vec<_> = raw
        .into_iter()
        .filter_map(|(path, kind)| {
            let settled = on_disk(&path, kind)?;
            if settled != kind {
                debug!("watch"; "{} {} -> {}", path.display(), kind.label(), settled.label());
            }
            Some((path, settled))
        })
        .collect();

    if events.is_empty() {
        return None;
    }
    events.sort_by(|a, b| a.0.cmp(&b.0));
    Some(DebouncedEvents(events))
}

fn on_disk(path: &Path, kind: ChangeKind) -> Option<ChangeKind> {
    let Ok(meta) = std::fs::metadata(path) else {
        return match kind {
            ChangeKind::Created => None,
            _ => Some(ChangeKind::Removed),
        };
    };
    if meta.is_dir() {
        return None;
    }
    Some(match kind {
        ChangeKind::Removed => ChangeKind::Modified,
        other => other,
    })
}
