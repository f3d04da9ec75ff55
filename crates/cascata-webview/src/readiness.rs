//! Engine readiness staging - models the multi-step asynchronous bring-up
//! of a browser engine and defers operations requested too early.
//!
//! Stages advance strictly forward, one at a time, and are never revisited
//! within one engine instance's lifetime:
//!
//! ```text
//! Uninitialized -> EnvironmentReady -> ControllerReady -> ViewNavigationComplete
//! ```
//!
//! Operations requested before `ControllerReady` are captured and replayed
//! when the controller comes up, same-kind requests coalesced to the last
//! value, in the fixed order: background color, parent window, size,
//! injected scripts (submission order), navigate. Navigation is last so
//! injected scripts are registered before page content loads.
//!
//! `run_script` is the one exception: it executes against the current page
//! and calling it before the first navigation completes is a contract
//! violation, not something to queue.

use std::fmt;

use crate::engine::{BrowserEngine, Completion};
use crate::protocol::{KeyEvent, Size};

/// One step in the engine's bring-up sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadinessStage {
    Uninitialized,
    EnvironmentReady,
    ControllerReady,
    ViewNavigationComplete,
}

impl fmt::Display for ReadinessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadinessStage::Uninitialized => "uninitialized",
            ReadinessStage::EnvironmentReady => "environment",
            ReadinessStage::ControllerReady => "controller",
            ReadinessStage::ViewNavigationComplete => "navigation",
        };
        write!(f, "{name}")
    }
}

/// Requests captured before their required stage. At most one value per
/// kind, except injected scripts which replay in submission order.
#[derive(Default)]
struct PendingOperations {
    background_color: Option<u32>,
    parent_window: Option<u64>,
    size: Option<Size>,
    url: Option<String>,
    injected_scripts: Vec<String>,
}

/// Wraps a [`BrowserEngine`] with the readiness state machine.
pub struct StagedEngine<E: BrowserEngine> {
    engine: E,
    stage: ReadinessStage,
    failed: bool,
    pending: PendingOperations,
}

impl<E: BrowserEngine> StagedEngine<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            stage: ReadinessStage::Uninitialized,
            failed: false,
            pending: PendingOperations::default(),
        }
    }

    pub fn stage(&self) -> ReadinessStage {
        self.stage
    }

    /// Whether bring-up failed. A failed engine ignores all operations.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn controller_ready(&self) -> bool {
        self.stage >= ReadinessStage::ControllerReady
    }

    pub fn set_background_color(&mut self, rgba: u32) {
        if self.failed {
            return;
        }
        if self.controller_ready() {
            self.engine.set_background_color(rgba);
        } else {
            self.pending.background_color = Some(rgba);
        }
    }

    pub fn set_parent_window(&mut self, handle: u64) {
        if self.failed {
            return;
        }
        if self.controller_ready() {
            self.engine.set_parent_window(handle);
        } else {
            self.pending.parent_window = Some(handle);
        }
    }

    pub fn set_size(&mut self, size: Size) {
        if self.failed {
            return;
        }
        if self.controller_ready() {
            self.engine.set_size(size);
        } else {
            self.pending.size = Some(size);
        }
    }

    pub fn navigate(&mut self, url: &str) {
        if self.failed {
            return;
        }
        if self.controller_ready() {
            self.engine.navigate(url);
        } else {
            self.pending.url = Some(url.to_owned());
        }
    }

    pub fn inject_script(&mut self, source: &str) {
        if self.failed {
            return;
        }
        if self.controller_ready() {
            self.engine.inject_script(source);
        } else {
            self.pending.injected_scripts.push(source.to_owned());
        }
    }

    /// Execute a script against the current page.
    ///
    /// # Panics
    ///
    /// Panics if called before the first navigation has completed. There is
    /// no page to run against yet, so an early call is a logic bug in the
    /// caller; wait for the load-finished notification.
    pub fn run_script(&mut self, source: &str) {
        if self.failed {
            return;
        }
        assert!(
            self.stage == ReadinessStage::ViewNavigationComplete,
            "run_script called before navigation completed"
        );
        self.engine.run_script(source);
    }

    /// Forward a key event. Events arriving before the controller exists
    /// are stale input and are dropped, not queued.
    pub fn forward_key_event(&mut self, event: &KeyEvent) {
        if self.failed {
            return;
        }
        if self.controller_ready() {
            self.engine.forward_key_event(event);
        } else {
            tracing::trace!("dropping key event before controller is ready");
        }
    }

    /// Apply a bring-up notification from the engine binding.
    pub fn apply_completion(&mut self, completion: Completion) {
        if self.failed {
            return;
        }
        match completion {
            Completion::EnvironmentReady => {
                if self.stage == ReadinessStage::Uninitialized {
                    self.stage = ReadinessStage::EnvironmentReady;
                } else {
                    tracing::warn!("ignoring environment-ready at {} stage", self.stage);
                }
            }
            Completion::ControllerReady => {
                if self.stage == ReadinessStage::EnvironmentReady {
                    self.stage = ReadinessStage::ControllerReady;
                    self.flush_pending();
                } else {
                    tracing::warn!("ignoring controller-ready at {} stage", self.stage);
                }
            }
            Completion::Failed { stage, reason } => {
                // Fatal to this engine instance. Surface a user-visible
                // diagnostic and stop driving the engine.
                tracing::error!("web view cannot be used, failed at {stage} stage: {reason}");
                self.failed = true;
            }
        }
    }

    /// Record a navigation completion. Returns `true` the first time,
    /// which is when content-ready handling should run; later completions
    /// are reloads and do not replay the pending-operation flush.
    pub fn navigation_finished(&mut self) -> bool {
        if self.failed {
            return false;
        }
        match self.stage {
            ReadinessStage::ControllerReady => {
                self.stage = ReadinessStage::ViewNavigationComplete;
                true
            }
            ReadinessStage::ViewNavigationComplete => false,
            earlier => {
                tracing::warn!("ignoring navigation-finished at {earlier} stage");
                false
            }
        }
    }

    /// Replay deferred requests once the controller exists. Static
    /// configuration and injected scripts go first so they are in place
    /// before page content starts loading.
    fn flush_pending(&mut self) {
        if let Some(rgba) = self.pending.background_color.take() {
            self.engine.set_background_color(rgba);
        }
        if let Some(handle) = self.pending.parent_window.take() {
            self.engine.set_parent_window(handle);
        }
        if let Some(size) = self.pending.size.take() {
            self.engine.set_size(size);
        }
        for script in std::mem::take(&mut self.pending.injected_scripts) {
            self.engine.inject_script(&script);
        }
        if let Some(url) = self.pending.url.take() {
            self.engine.navigate(&url);
        }
    }
}
