//! Fixed-interval pass scheduler with cooperative shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Why the scheduler stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Shutdown was requested (operator command or Ctrl-C)
    Shutdown,
    /// The controller session was lost and the policy says exit
    SessionLost,
    /// Unrecoverable error inside a pass
    Fatal(String),
}

impl ExitReason {
    /// Process exit code for this reason.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitReason::Shutdown | ExitReason::SessionLost => 0,
            ExitReason::Fatal(_) => 1,
        }
    }
}

/// Result of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Keep ticking
    Continue,
    /// Stop the scheduler
    Halt(ExitReason),
}

/// Work run once per tick.
///
/// `run` executes on tokio's blocking pool. `shutdown` is called exactly once
/// when the scheduler stops, whatever the reason.
pub trait Pass: Send + 'static {
    /// Run one pass.
    fn run(&mut self) -> PassOutcome;

    /// Release everything the pass holds.
    fn shutdown(&mut self);
}

/// Lifecycle of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, not started
    Idle,
    /// Ticking
    Running,
    /// Timer stopped, tearing down
    Stopping,
    /// Done; terminal
    Stopped,
}

impl SchedulerState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, next),
            (Idle, Running) | (Idle, Stopping) | (Running, Stopping) | (Stopping, Stopped)
        )
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Stopping => "stopping",
            SchedulerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Cooperative, idempotent shutdown flag shared between listeners and the
/// scheduler.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Returns `false` if it was already requested.
    pub fn trigger(&self) -> bool {
        let first = self.tx.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        });
        if first {
            info!("Shutdown requested");
        } else {
            debug!("Shutdown already requested");
        }
        first
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver that observes the flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Read-only view of a scheduler's state.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    state: watch::Receiver<SchedulerState>,
}

impl SchedulerHandle {
    /// Current state.
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Wait until the scheduler reaches `target`.
    pub async fn wait_for(&mut self, target: SchedulerState) {
        while *self.state.borrow_and_update() != target {
            if self.state.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Runs a [`Pass`] at a fixed interval until shutdown or halt.
///
/// The first tick fires immediately. Each pass is awaited before the next
/// tick is considered and missed ticks are delayed rather than bursted, so
/// passes never overlap.
pub struct Scheduler<P: Pass> {
    interval: Duration,
    pass: P,
    shutdown: ShutdownSignal,
    state: watch::Sender<SchedulerState>,
}

impl<P: Pass> std::fmt::Debug for Scheduler<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("interval", &self.interval)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<P: Pass> Scheduler<P> {
    /// Create an idle scheduler.
    pub fn new(interval: Duration, pass: P, shutdown: ShutdownSignal) -> Self {
        let (state, _rx) = watch::channel(SchedulerState::Idle);
        Self {
            interval,
            pass,
            shutdown,
            state,
        }
    }

    /// Handle for observing the state from elsewhere.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            state: self.state.subscribe(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Tick until shutdown is requested or a pass halts, then tear down.
    pub async fn run(self) -> ExitReason {
        let Scheduler {
            interval,
            mut pass,
            shutdown,
            state,
        } = self;

        transition(&state, SchedulerState::Running);
        info!("Scheduler running every {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stop = shutdown.subscribe();

        let reason = loop {
            if shutdown.is_triggered() {
                break ExitReason::Shutdown;
            }

            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break ExitReason::Shutdown;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let task = tokio::task::spawn_blocking(move || {
                let outcome = pass.run();
                (pass, outcome)
            });

            match task.await {
                Ok((returned, outcome)) => {
                    pass = returned;
                    if let PassOutcome::Halt(reason) = outcome {
                        break reason;
                    }
                }
                Err(e) => {
                    // The pass is gone with the task; its Drop releases what it held.
                    error!("Pass task failed: {}", e);
                    transition(&state, SchedulerState::Stopping);
                    transition(&state, SchedulerState::Stopped);
                    return ExitReason::Fatal(format!("pass task failed: {e}"));
                }
            }
        };

        match &reason {
            ExitReason::Fatal(message) => error!("Scheduler halting: {}", message),
            other => info!("Scheduler stopping: {:?}", other),
        }
        transition(&state, SchedulerState::Stopping);

        let teardown = tokio::task::spawn_blocking(move || pass.shutdown());
        if let Err(e) = teardown.await {
            warn!("Pass teardown failed: {}", e);
        }

        transition(&state, SchedulerState::Stopped);
        info!("Scheduler stopped");
        reason
    }
}

fn transition(state: &watch::Sender<SchedulerState>, next: SchedulerState) {
    let current = *state.borrow();
    if !current.can_transition_to(next) {
        warn!("Ignoring scheduler transition {} -> {}", current, next);
        return;
    }
    debug!("Scheduler {} -> {}", current, next);
    state.send_replace(next);
}
