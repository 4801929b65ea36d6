//! Actor Message Definitions
//!
//! ```text
//! FsActor --ControlMsg--> ControlActor --(task graph)--> LiveChannel --WsMsg--> WsActor
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use crate::reload::ReloadMessage;

// =============================================================================
// ControlActor Messages
// =============================================================================

/// What a batch of file changes asks the watch controller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMsg {
    /// Run the task for a target.
    Rebuild(WatchTarget),
    /// The configuration file changed: the session ends.
    ConfigChanged(PathBuf),
    Shutdown,
}

/// Task group a changed file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatchTarget {
    Styles,
    Scripts,
    Markup,
}

impl WatchTarget {
    pub const ALL: [Self; 3] = [Self::Styles, Self::Scripts, Self::Markup];

    /// Name of the task run for this target.
    pub const fn task(self) -> &'static str {
        match self {
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Markup => "markup",
        }
    }

    /// Whether browsers reload after the task succeeds.
    ///
    /// Injected styles are swapped in place by the bundle runner instead.
    pub const fn reloads(self, inject_styles: bool) -> bool {
        match self {
            Self::Styles => !inject_styles,
            Self::Scripts | Self::Markup => true,
        }
    }
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Broadcast to every connected client
    Send(ReloadMessage),
    /// Complete the handshake and register a client
    AddClient(TcpStream),
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_tasks() {
        let tasks: Vec<_> = WatchTarget::ALL.iter().map(|t| t.task()).collect();
        assert_eq!(tasks, ["styles", "scripts", "markup"]);
    }

    #[test]
    fn test_injected_styles_do_not_reload() {
        assert!(!WatchTarget::Styles.reloads(true));
        assert!(WatchTarget::Styles.reloads(false));
        assert!(WatchTarget::Scripts.reloads(true));
        assert!(WatchTarget::Markup.reloads(true));
    }
}
