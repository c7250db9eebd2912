//! Ingestion task polling.
//!
//! Each submitted URL becomes a backend task.  [`TaskPoller`] runs one tokio
//! loop per task id, asking `/task_status/{id}` on a fixed interval and
//! forwarding every answer to the UI thread as a [`PollMsg`].
//!
//! ```text
//! initializing ──► running ──► complete ──(refresh_delay)──► RefreshDue
//!                     │   ▲
//!                     └───┘ (any other tag, passed through)
//!                     │
//!                     └──────► error
//! ```
//!
//! A loop stops itself on `complete`, on `error`, or on the first failed
//! request; there are no retries.  The poller keeps a handle per task id so a
//! loop can also be cancelled from outside, and dropping the poller aborts
//! every loop still running.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::api::ListingApi;
use crate::error;
use crate::listing::{TaskPhase, TaskReport};
use crate::msg::Msg;

/// What a poll loop tells the UI thread.
#[derive(Debug)]
pub enum PollMsg {
    /// A successful poll, terminal or not.
    Report {
        task_id: String,
        generation: u64,
        report: TaskReport,
    },
    /// The task completed and the refresh delay has elapsed.
    RefreshDue { task_id: String },
    /// A poll request failed; the loop has stopped.
    Failed { task_id: String, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between two polls of the same task.  Must be non-zero.
    pub interval: Duration,
    /// Pause between `complete` and the refresh request.
    pub refresh_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            refresh_delay: Duration::from_secs(2),
        }
    }
}

pub struct TaskPoller {
    api: Arc<dyn ListingApi>,
    runtime: Handle,
    tx: UnboundedSender<Msg>,
    settings: PollSettings,
    tasks: HashMap<String, JoinHandle<()>>,
}

impl TaskPoller {
    pub fn new(
        api: Arc<dyn ListingApi>,
        runtime: Handle,
        tx: UnboundedSender<Msg>,
        settings: PollSettings,
    ) -> Self {
        Self {
            api,
            runtime,
            tx,
            settings,
            tasks: HashMap::new(),
        }
    }

    /// Begin polling `task_id`.  An existing loop for the same id is
    /// replaced.
    pub fn start(&mut self, task_id: &str, generation: u64) {
        self.reap();
        if self.is_polling(task_id) {
            log::warn!("task {task_id} was already being polled; restarting");
        }
        if let Some(previous) = self.tasks.remove(task_id) {
            previous.abort();
        }

        log::info!("polling task {task_id}");
        let handle = self.runtime.spawn(poll_loop(
            Arc::clone(&self.api),
            task_id.to_string(),
            generation,
            self.settings,
            self.tx.clone(),
        ));
        self.tasks.insert(task_id.to_string(), handle);
    }

    /// Abort the loop for `task_id`.  Returns `false` if none was running.
    pub fn cancel(&mut self, task_id: &str) -> bool {
        match self.tasks.remove(task_id) {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                if running {
                    log::info!("cancelled polling for task {task_id}");
                }
                running
            }
            None => false,
        }
    }

    /// Forget handles of loops that have stopped on their own.
    pub fn reap(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Number of loops still running.
    pub fn active(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    pub fn is_polling(&self, task_id: &str) -> bool {
        self.tasks.get(task_id).is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskPoller {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

async fn poll_loop(
    api: Arc<dyn ListingApi>,
    task_id: String,
    generation: u64,
    settings: PollSettings,
    tx: UnboundedSender<Msg>,
) {
    // First poll one interval after submission, like a browser interval timer.
    let mut ticker = time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let report = match api.poll_task(&task_id).await {
            Ok(report) => report,
            Err(err) => {
                let error = error::report(&format!("Polling task {task_id}"), &err);
                let _ = tx.send(Msg::Poll(PollMsg::Failed { task_id, error }));
                return;
            }
        };

        let phase = report.status.clone();
        log::debug!("task {task_id}: {phase}");
        let sent = tx.send(Msg::Poll(PollMsg::Report {
            task_id: task_id.clone(),
            generation,
            report,
        }));
        // The UI loop is gone; nobody is listening.
        if sent.is_err() {
            return;
        }

        if !phase.is_terminal() {
            continue;
        }
        if phase == TaskPhase::Complete {
            log::info!("task {task_id} complete");
            time::sleep(settings.refresh_delay).await;
            let _ = tx.send(Msg::Poll(PollMsg::RefreshDue { task_id }));
        } else {
            log::warn!("task {task_id} ended with error");
        }
        return;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
