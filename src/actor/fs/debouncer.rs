use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;
use rustc_hash::FxHashMap;

use super::types::ChangeKind;
use crate::debug;
use crate::utils::path::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 300;

/// Sleep used while nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

/// Collects raw notify events until the window after the last one closes.
///
/// A released batch is handed over immediately; there is no cooldown and no
/// waiting on the rebuilds it causes.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self { changes: FxHashMap::default(), last_event: None }
    }

    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let incoming = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };
        debug!("watch"; "raw {:?} {:?}", event.kind, event.paths);

        for path in event.paths.iter().filter(|p| !is_temp_file(p)) {
            let path = normalize_path(path);
            let previous = self.changes.get(&path).copied();
            match merge(previous, incoming) {
                Merge::Keep => continue,
                Merge::Set(kind) => {
                    self.changes.insert(path, kind);
                }
                Merge::Drop => {
                    debug!("watch"; "{} came and went", path.display());
                    self.changes.remove(&path);
                }
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// The pending batch, once the window has closed and it is non-empty.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changes)).filter(|c| !c.is_empty())
    }

    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|at| at.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    /// Time left in the current window, at least 1 ms.
    pub(super) fn sleep_duration(&self) -> Duration {
        self.last_event.map_or(IDLE, |at| {
            Duration::from_millis(DEBOUNCE_MS)
                .saturating_sub(at.elapsed())
                .max(Duration::from_millis(1))
        })
    }
}

enum Merge {
    Keep,
    Set(ChangeKind),
    Drop,
}

/// Fold a new event into what is already pending for the same path.
fn merge(previous: Option<ChangeKind>, incoming: ChangeKind) -> Merge {
    use ChangeKind::*;
    match (previous, incoming) {
        (None, kind) => Merge::Set(kind),
        // restored after a delete, e.g. an atomic save
        (Some(Removed), Created | Modified) => Merge::Set(incoming),
        (Some(Modified), Removed) => Merge::Set(Removed),
        (Some(Created), Removed) => Merge::Drop,
        (Some(_), _) => Merge::Keep,
    }
}

/// Editor swap, backup and lock files.
pub(super) fn is_temp_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    matches!(ext, "swp" | "swo" | "swx" | "tmp" | "bak" | "bck" | "backup")
        || name.ends_with('~')
        || name.starts_with(".#")
        || name == "4913"
}
