//! Round-based batch scheduling of provisioning pipelines.
//!
//! Each round launches a fixed number of workers, waits for them up to the
//! round timeout, then sleeps the interval. Workers that outlive the round
//! are detached, not aborted, and may still append to the store later.

use crate::error::ServiceError;
use crate::pipeline::Pipeline;
use futures::future::join_all;
use outcome_store::{OutcomeStore, ProvisioningOutcome};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Resolved parameters for one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub workers: usize,
    pub interval: Duration,
    pub round_timeout: Duration,
    pub record_failures: bool,
}

/// Where the scheduling loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    RunningRound,
    Waiting,
    Stopped,
}

/// What happened in a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    pub round: u64,
    pub launched: usize,
    /// Workers that completed before the round ended.
    pub finished: usize,
    pub timed_out: bool,
}

/// Runs rounds of concurrent pipelines and records their outcomes.
pub struct BatchScheduler {
    pipeline: Arc<dyn Pipeline>,
    store: OutcomeStore,
    settings: ScheduleSettings,
    state: watch::Sender<SchedulerState>,
}

impl BatchScheduler {
    pub fn new(pipeline: Arc<dyn Pipeline>, store: OutcomeStore, settings: ScheduleSettings) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            pipeline,
            store,
            settings: ScheduleSettings {
                workers: settings.workers.max(1),
                ..settings
            },
            state,
        }
    }

    pub fn settings(&self) -> ScheduleSettings {
        self.settings
    }

    /// Watch state transitions of this scheduler.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Launch one round of workers and wait for them or the round timeout.
    pub async fn run_round(&self, round: u64) -> RoundReport {
        let launched = self.settings.workers;
        let finished = Arc::new(AtomicUsize::new(0));

        info!(round, workers = launched, "Starting round");

        let handles: Vec<JoinHandle<()>> = (0..launched)
            .map(|worker| {
                let pipeline = Arc::clone(&self.pipeline);
                let store = self.store.clone();
                let finished = Arc::clone(&finished);
                let record_failures = self.settings.record_failures;
                tokio::spawn(async move {
                    run_worker(pipeline, store, round, worker, record_failures).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let timed_out = match tokio::time::timeout(self.settings.round_timeout, join_all(handles)).await
        {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        error!(round, "Worker task failed: {}", e);
                    }
                }
                false
            }
            Err(_) => {
                warn!(
                    round,
                    timeout = ?self.settings.round_timeout,
                    "Round timed out; remaining workers continue detached"
                );
                true
            }
        };

        let report = RoundReport {
            round,
            launched,
            finished: finished.load(Ordering::SeqCst),
            timed_out,
        };
        info!(
            round,
            launched = report.launched,
            finished = report.finished,
            timed_out = report.timed_out,
            "Round complete"
        );
        report
    }

    /// Run rounds until `cancel` fires.
    ///
    /// Cancellation is observed while a round is in flight and while
    /// sleeping the interval. Workers already launched are not aborted.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            workers = self.settings.workers,
            interval = ?self.settings.interval,
            "Scheduler started"
        );

        let mut round = 0u64;
        loop {
            round += 1;
            self.state.send_replace(SchedulerState::RunningRound);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.run_round(round) => {}
            }

            self.state.send_replace(SchedulerState::Waiting);
            debug!(round, interval = ?self.settings.interval, "Sleeping until next round");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        self.state.send_replace(SchedulerState::Stopped);
        info!(rounds = round, "Scheduler stopped");
    }
}

async fn run_worker(
    pipeline: Arc<dyn Pipeline>,
    store: OutcomeStore,
    round: u64,
    worker: usize,
    record_failures: bool,
) {
    match pipeline.run().await {
        Ok(outcome) => {
            let total = store.append(outcome).await;
            debug!(round, worker, total, "Outcome recorded");
        }
        Err(e) => {
            error!(round, worker, stage = e.stage(), "Provisioning run failed: {}", e);
            if record_failures {
                let email = e.email().unwrap_or_default().to_string();
                store
                    .append(ProvisioningOutcome::failure(email, e.to_string()))
                    .await;
            }
        }
    }
}

struct RunningSchedule {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    settings: ScheduleSettings,
    state: watch::Receiver<SchedulerState>,
}

/// Snapshot of the control handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleStatus {
    pub running: bool,
    pub state: SchedulerState,
    pub workers: Option<usize>,
    pub interval_secs: Option<u64>,
}

/// Owns at most one running scheduler loop.
#[derive(Clone, Default)]
pub struct ScheduleControl {
    inner: Arc<Mutex<Option<RunningSchedule>>>,
}

impl ScheduleControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `scheduler` unless a loop is already running.
    pub async fn start(&self, scheduler: BatchScheduler) -> Result<ScheduleSettings, ServiceError> {
        let mut current = self.inner.lock().await;
        if let Some(running) = current.as_ref() {
            if !running.task.is_finished() {
                return Err(ServiceError::AlreadyRunning);
            }
        }

        let settings = scheduler.settings();
        let state = scheduler.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(cancel.clone()));

        *current = Some(RunningSchedule {
            cancel,
            task,
            settings,
            state,
        });
        Ok(settings)
    }

    /// Cancel the running loop and wait for it to exit.
    pub async fn stop(&self) -> Result<(), ServiceError> {
        let running = self.inner.lock().await.take();
        match running {
            Some(running) if !running.task.is_finished() => {
                running.cancel.cancel();
                running.task.await?;
                Ok(())
            }
            _ => Err(ServiceError::NotRunning),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner
            .lock()
            .await
            .as_ref()
            .map(|running| !running.task.is_finished())
            .unwrap_or(false)
    }

    pub async fn status(&self) -> ScheduleStatus {
        let current = self.inner.lock().await;
        match current.as_ref() {
            Some(running) => ScheduleStatus {
                running: !running.task.is_finished(),
                state: *running.state.borrow(),
                workers: Some(running.settings.workers),
                interval_secs: Some(running.settings.interval.as_secs()),
            },
            None => ScheduleStatus {
                running: false,
                state: SchedulerState::Idle,
                workers: None,
                interval_secs: None,
            },
        }
    }
}
