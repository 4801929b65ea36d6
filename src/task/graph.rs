//! Named tasks with series/parallel composition.
//!
//! ```text
//! build ── series ──┬─ clean
//!                   └─ assets ── parallel ──┬─ styles
//!                                           ├─ scripts
//!                                           └─ markup
//! ```
//!
//! - `series`: children run in declared order; the first failure stops the
//!   composite and is returned unchanged.
//! - `parallel`: every child starts immediately and all are awaited, even
//!   when one panics. One failure is returned unchanged; several become
//!   `TaskComposition`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tokio::task::JoinSet;

use crate::core::BuildError;
use crate::{debug, log};

pub type TaskFuture = Pin<Box<dyn Future<Output = Result<(), BuildError>> + Send>>;

type Action = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// A registered task.
pub enum Task {
    Leaf(Action),
    Series(Vec<String>),
    Parallel(Vec<String>),
}

/// Task registry. Built once at start-up, shared behind an `Arc`.
#[derive(Default)]
pub struct TaskGraph {
    tasks: FxHashMap<String, Task>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leaf action. It is invoked afresh on every run.
    pub fn leaf<F, Fut>(&mut self, name: &str, action: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BuildError>> + Send + 'static,
    {
        let action: Action = Arc::new(move || Box::pin(action()));
        self.tasks.insert(name.to_string(), Task::Leaf(action));
        self
    }

    pub fn series(&mut self, name: &str, children: &[&str]) -> &mut Self {
        self.tasks
            .insert(name.to_string(), Task::Series(to_names(children)));
        self
    }

    pub fn parallel(&mut self, name: &str, children: &[&str]) -> &mut Self {
        self.tasks
            .insert(name.to_string(), Task::Parallel(to_names(children)));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Every composite child must be registered.
    pub fn check(&self) -> Result<(), BuildError> {
        for task in self.tasks.values() {
            if let Task::Series(children) | Task::Parallel(children) = task
                && let Some(missing) = children.iter().find(|c| !self.contains(c))
            {
                return Err(BuildError::UnknownTask(missing.clone()));
            }
        }
        Ok(())
    }

    /// Run a task and everything it is composed of.
    pub fn run(self: &Arc<Self>, name: &str) -> TaskFuture {
        let graph = Arc::clone(self);
        let name = name.to_string();

        Box::pin(async move {
            let Some(task) = graph.tasks.get(&name) else {
                return Err(BuildError::UnknownTask(name));
            };

            match task {
                Task::Leaf(action) => {
                    let started = Instant::now();
                    debug!("task"; "starting {}", name);
                    let result = action().await;
                    debug!("task"; "finished {} after {} ms", name, started.elapsed().as_millis());
                    result
                }
                Task::Series(children) => {
                    for child in children {
                        graph.run(child).await?;
                    }
                    Ok(())
                }
                Task::Parallel(children) => {
                    let mut set = JoinSet::new();
                    for child in children {
                        let future = graph.run(child);
                        let child = child.clone();
                        // A panicking child becomes its own failure
                        set.spawn(async move {
                            let result = tokio::spawn(future).await.unwrap_or_else(|e| Err(e.into()));
                            (child, result)
                        });
                    }

                    let mut failed = Vec::new();
                    while let Some(joined) = set.join_next().await {
                        let (child, result) = match joined {
                            Ok(pair) => pair,
                            Err(e) => (name.clone(), Err(e.into())),
                        };
                        if let Err(e) = result {
                            failed.push((child, e));
                        }
                    }
                    failed.sort_by_key(|(child, _)| children.iter().position(|c| c == child));
                    join_failures(&name, failed)
                }
            }
        })
    }
}

/// Fold the failures of concurrently run children into one result.
///
/// A single failure passes through unchanged. With several, each is logged
/// and the composite reports which children failed.
pub fn join_failures(task: &str, failed: Vec<(String, BuildError)>) -> Result<(), BuildError> {
    if failed.len() <= 1 {
        return match failed.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        };
    }

    let mut names = Vec::with_capacity(failed.len());
    for (child, err) in failed {
        log!("error"; "{}: {}", child, err);
        names.push(child);
    }
    Err(BuildError::TaskComposition {
        task: task.to_string(),
        failed: names,
    })
}

fn to_names(children: &[&str]) -> Vec<String> {
    children.iter().map(ToString::to_string).collect()
}
