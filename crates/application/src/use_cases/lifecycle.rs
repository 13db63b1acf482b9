use dnsstress_domain::{DispatchConfig, DomainError};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::dispatch::WorkerPool;
use crate::ports::{MetricsSink, TransportFactory};
use crate::services::{RunSnapshot, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// State shared between the controller and its workers.
///
/// Workers call [`LifecycleSignal::begin_stopping`] when they find the send
/// cap exhausted and [`LifecycleSignal::worker_exited`] on their way out;
/// whoever leaves last moves the run to `Stopped`.
pub(crate) struct LifecycleSignal {
    state_tx: watch::Sender<LifecycleState>,
    active_workers: AtomicUsize,
    run: Arc<RunState>,
}

impl LifecycleSignal {
    fn new(run: Arc<RunState>) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Created);
        Self {
            state_tx,
            active_workers: AtomicUsize::new(0),
            run,
        }
    }

    fn current(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    /// Running → Stopping. The stop flag is left alone so that workers
    /// already holding a claimed slot still send it.
    pub(crate) fn begin_stopping(&self) {
        self.state_tx.send_if_modified(|state| {
            if *state == LifecycleState::Running {
                *state = LifecycleState::Stopping;
                true
            } else {
                false
            }
        });
    }

    pub(crate) fn worker_exited(&self) {
        if self.active_workers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.run.cancellation_token().cancel();
            self.state_tx.send_replace(LifecycleState::Stopped);
            debug!("Last worker exited");
        }
    }
}

/// Start/stop state machine around a [`WorkerPool`].
///
/// `Created → Running → Stopping → Stopped`. Reaching the send cap and an
/// explicit [`LifecycleController::stop`] take the same path, so callers see
/// no difference between the two.
pub struct LifecycleController {
    pool: WorkerPool,
    run: Arc<RunState>,
    signal: Arc<LifecycleSignal>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    start_lock: tokio::sync::Mutex<()>,
}

impl LifecycleController {
    pub fn new(
        config: DispatchConfig,
        factory: Arc<dyn TransportFactory>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        let run = Arc::new(RunState::new(config.send_cap));
        let signal = Arc::new(LifecycleSignal::new(Arc::clone(&run)));
        Self {
            pool: WorkerPool::new(Arc::new(config), factory, sink),
            run,
            signal,
            handles: Mutex::new(Vec::new()),
            start_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.signal.current()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.run.snapshot()
    }

    pub fn run_state(&self) -> &Arc<RunState> {
        &self.run
    }

    pub fn config(&self) -> &DispatchConfig {
        self.pool.config()
    }

    /// Created → Running.
    ///
    /// Transports for every worker are prepared first; if any of them fails
    /// nothing is spawned, the controller stays `Created` and the error is
    /// returned. Starting twice is an error.
    pub async fn start(&self) -> Result<(), DomainError> {
        let _guard = self.start_lock.lock().await;

        if self.state() != LifecycleState::Created {
            return Err(DomainError::AlreadyStarted);
        }

        let transports = self.pool.prepare().await?;

        self.signal
            .active_workers
            .store(transports.len(), Ordering::Release);

        let started = self.signal.state_tx.send_if_modified(|state| {
            if *state == LifecycleState::Created {
                *state = LifecycleState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            debug!("Stopped before start completed, not spawning workers");
            return Ok(());
        }

        let handles = self
            .pool
            .launch(transports, Arc::clone(&self.run), Arc::clone(&self.signal));
        self.lock_handles().extend(handles);
        Ok(())
    }

    /// Requests shutdown and waits until every worker has exited.
    ///
    /// Idempotent and safe to call concurrently: every call returns only
    /// once the controller is `Stopped`. In-flight sends are allowed to
    /// finish; workers waiting on the rate limiter give their slot back.
    pub async fn stop(&self) {
        let mut rx = self.signal.state_tx.subscribe();

        let initiated = self.signal.state_tx.send_if_modified(|state| match *state {
            LifecycleState::Created => {
                *state = LifecycleState::Stopped;
                true
            }
            LifecycleState::Running => {
                *state = LifecycleState::Stopping;
                true
            }
            LifecycleState::Stopping | LifecycleState::Stopped => false,
        });
        if initiated {
            info!("Stopping dispatcher");
        }
        self.run.cancellation_token().cancel();

        let _ = rx.wait_for(|s| *s == LifecycleState::Stopped).await;
        self.join_workers().await;
    }

    /// Resolves once the run is `Stopped`, by cap or by [`Self::stop`].
    pub async fn wait(&self) {
        let mut rx = self.signal.state_tx.subscribe();
        let _ = rx.wait_for(|s| *s == LifecycleState::Stopped).await;
        self.join_workers().await;
    }

    async fn join_workers(&self) {
        let handles = std::mem::take(&mut *self.lock_handles());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker task failed");
            }
        }
    }

    fn lock_handles(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
