//! Polling change watcher.
//!
//! Every tick re-lists the root, hashes the listing with
//! [`structural_hash`], and reloads the tree only when the hash differs from
//! the last one seen. Polling is suspended while the host window is
//! unfocused (if configured) and resumes with an immediate poll.
//!
//! ```text
//! Idle ──focus──▶ Polling ──unchanged──▶ Polling
//!                    │
//!                    └──changed──▶ Reloading ──▶ Polling
//! ```
//!
//! [`ChangeWatcher::tick`] is runtime-agnostic. With the `native-watch`
//! feature, [`ChangeWatcher::spawn`] drives it from a `tokio` interval.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use ts_rs::TS;

use crate::config::EngineConfig;
use crate::fs::{AsyncFileSystem, TreeEvent};
use crate::tree::structural_hash;
use crate::workspace::WorkspaceTree;

/// Watcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum WatcherState {
    /// Paused because the host is unfocused.
    Idle,
    /// Waiting for or running a poll.
    Polling,
    /// Applying a detected change.
    Reloading,
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The root listing hashes the same as last time.
    Unchanged,
    /// Drift was detected and the tree reloaded.
    Changed {
        previous: Option<String>,
        current: String,
    },
    /// Skipped because the host is unfocused.
    Paused,
    /// The root could not be listed; the previous hash is kept.
    Failed,
}

/// Keeps a [`WorkspaceTree`] in step with the filesystem by polling.
pub struct ChangeWatcher<FS> {
    tree: WorkspaceTree<FS>,
    poll_interval: Duration,
    pause_when_unfocused: bool,
    focused: bool,
    state: WatcherState,
    last_hash: Option<String>,
}

impl<FS: AsyncFileSystem> ChangeWatcher<FS> {
    pub fn new(tree: WorkspaceTree<FS>, config: &EngineConfig) -> Self {
        Self {
            tree,
            poll_interval: config.poll_interval(),
            pause_when_unfocused: config.pause_when_unfocused,
            focused: true,
            state: WatcherState::Polling,
            last_hash: None,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Hash of the last successful poll (`None` before the first one).
    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn tree(&self) -> &WorkspaceTree<FS> {
        &self.tree
    }

    fn paused(&self) -> bool {
        self.pause_when_unfocused && !self.focused
    }

    /// Record a focus change. Returns `true` when polling resumes, in which
    /// case the caller should poll right away.
    pub fn set_focused(&mut self, focused: bool) -> bool {
        let was_paused = self.paused();
        self.focused = focused;
        if self.paused() {
            if !was_paused {
                debug!("Watcher paused (host unfocused)");
            }
            self.state = WatcherState::Idle;
            false
        } else {
            self.state = WatcherState::Polling;
            was_paused
        }
    }

    /// Poll once.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.paused() {
            self.state = WatcherState::Idle;
            return TickOutcome::Paused;
        }
        self.state = WatcherState::Polling;

        let root = self.tree.root();
        let entries = match self.tree.list(&root).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Poll of {:?} failed: {}", root, err);
                return TickOutcome::Failed;
            }
        };

        let current = structural_hash(&entries);
        if self.last_hash.as_deref() == Some(current.as_str()) {
            debug!("No drift under {:?}", root);
            return TickOutcome::Unchanged;
        }

        info!("Drift detected under {:?}, reloading", root);
        self.tree.emit(TreeEvent::DriftDetected {
            root: root.clone(),
            previous: self.last_hash.clone(),
            current: current.clone(),
        });

        self.state = WatcherState::Reloading;
        self.tree.apply_listing(&root, entries).await;
        self.state = WatcherState::Polling;

        let previous = self.last_hash.replace(current.clone());
        TickOutcome::Changed { previous, current }
    }
}

#[cfg(feature = "native-watch")]
mod native {
    use log::{debug, warn};
    use tokio::sync::{oneshot, watch};
    use tokio::task::JoinHandle;
    use tokio::time::MissedTickBehavior;

    use super::ChangeWatcher;
    use crate::fs::AsyncFileSystem;

    /// Handle to a running watcher loop. Dropping it stops the loop after
    /// any in-flight poll.
    pub struct WatcherHandle {
        focus: watch::Sender<bool>,
        stop: Option<oneshot::Sender<()>>,
        task: JoinHandle<()>,
    }

    impl WatcherHandle {
        /// Forward a host focus change to the loop.
        pub fn set_focused(&self, focused: bool) {
            self.focus.send_replace(focused);
        }

        /// Stop polling and wait for the loop to exit. An in-flight poll is
        /// allowed to finish.
        pub async fn stop(mut self) {
            if let Some(stop) = self.stop.take() {
                let _ = stop.send(());
            }
            if let Err(err) = (&mut self.task).await {
                warn!("Watcher task ended abnormally: {}", err);
            }
        }

        pub fn is_finished(&self) -> bool {
            self.task.is_finished()
        }
    }

    impl<FS: AsyncFileSystem + 'static> ChangeWatcher<FS> {
        /// Run the poll loop on the current `tokio` runtime. The first poll
        /// happens immediately.
        pub fn spawn(mut self) -> WatcherHandle {
            let (focus_tx, mut focus_rx) = watch::channel(self.focused);
            let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

            let task = tokio::spawn(async move {
                let mut interval = tokio::time::interval(self.poll_interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    let poll_now = tokio::select! {
                        _ = &mut stop_rx => break,
                        _ = interval.tick() => true,
                        changed = focus_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let focused = *focus_rx.borrow_and_update();
                            let resumed = self.set_focused(focused);
                            if resumed {
                                interval.reset();
                            }
                            resumed
                        }
                    };

                    // Outside the select so stopping never cancels a poll midway
                    if poll_now {
                        let outcome = self.tick().await;
                        debug!("Watcher tick: {:?}", outcome);
                    }
                }

                debug!("Watcher for {:?} stopped", self.tree.root());
            });

            WatcherHandle {
                focus: focus_tx,
                stop: Some(stop_tx),
                task,
            }
        }
    }
}

#[cfg(feature = "native-watch")]
pub use native::WatcherHandle;
