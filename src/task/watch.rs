//! The `watch` task: hands the process over to the actor system.

use std::sync::{Arc, Weak};

use super::context::BuildContext;
use super::graph::TaskGraph;
use crate::actor::{Coordinator, SessionEnd};
use crate::core::BuildError;
use crate::debug;

/// Run a watch session until Ctrl+C or a config change.
///
/// The graph is held weakly: it owns this task, and the session needs it to
/// run rebuilds.
pub async fn watch(ctx: Arc<BuildContext>, graph: Weak<TaskGraph>) -> Result<(), BuildError> {
    let graph = graph
        .upgrade()
        .ok_or_else(|| BuildError::Watch("task graph is gone".into()))?;

    match Coordinator::new(ctx, graph).run().await {
        Ok(SessionEnd::Shutdown) => Ok(()),
        Ok(SessionEnd::ConfigChanged) => {
            debug!("watch"; "session ended by config change");
            Ok(())
        }
        Err(e) => Err(BuildError::Watch(format!("{e:#}"))),
    }
}
