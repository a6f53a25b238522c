//! Background loops for agents and the coordinator.
//!
//! An agent runs two independent loops: a heartbeat loop that keeps the
//! client eligible for claims, and a claim loop that drains claimable jobs
//! one at a time. The coordinator runs an expiry sweeper. Every loop stops
//! when its [`WorkerHandle`] is shut down.

use crate::agent::ports::BrowserLauncher;
use crate::agent::services::AgentRuntime;
use crate::api::DroverApi;
use crate::client::domain::ClientStatus;
use crate::config::DroverConfig;
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest period a loop will tick at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Stops the loops it was returned with.
#[derive(Debug)]
#[must_use = "dropping the handle leaves the loops running"]
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Signals every loop to stop and waits for them to finish.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        for task in self.tasks {
            if let Err(err) = task.await {
                tracing::error!(error = %err, "worker loop panicked");
            }
        }
    }
}

/// Runs an agent's heartbeat and claim loops.
pub struct AgentWorker<L: BrowserLauncher> {
    runtime: Arc<AgentRuntime<L>>,
    heartbeat_every: Duration,
    claim_every: Duration,
    busy: AtomicBool,
}

impl<L> AgentWorker<L>
where
    L: BrowserLauncher + 'static,
{
    /// Creates a worker with explicit periods.
    #[must_use]
    pub const fn new(
        runtime: Arc<AgentRuntime<L>>,
        heartbeat_every: Duration,
        claim_every: Duration,
    ) -> Self {
        Self {
            runtime,
            heartbeat_every,
            claim_every,
            busy: AtomicBool::new(false),
        }
    }

    /// Creates a worker with the configured periods.
    #[must_use]
    pub const fn from_config(runtime: Arc<AgentRuntime<L>>, config: &DroverConfig) -> Self {
        Self::new(
            runtime,
            config.clients.heartbeat_interval(),
            config.worker.claim_interval(),
        )
    }

    /// Sends one heartbeat reporting `busy` or `idle`.
    pub async fn heartbeat_once(&self) {
        let status = if self.busy.load(Ordering::SeqCst) {
            ClientStatus::Busy
        } else {
            ClientStatus::Idle
        };
        let credentials = &self.runtime.identity().credentials;
        if let Err(err) = self.runtime.coordinator().heartbeat(credentials, status).await {
            tracing::warn!(client_id = %credentials.client_id, error = %err, "heartbeat failed");
        }
    }

    /// Runs claimable jobs until none is left. Returns how many ran.
    pub async fn drain_once(&self) -> usize {
        let mut ran = 0;
        loop {
            self.busy.store(true, Ordering::SeqCst);
            let next = self.runtime.run_next().await;
            self.busy.store(false, Ordering::SeqCst);
            match next {
                Ok(Some(_)) => ran += 1,
                Ok(None) => return ran,
                Err(err) => {
                    tracing::warn!(error = %err, "claim cycle failed");
                    return ran;
                }
            }
        }
    }

    /// Starts both loops on the tokio runtime.
    pub fn spawn(self) -> WorkerHandle {
        let worker = Arc::new(self);
        let (shutdown, receiver) = watch::channel(false);
        let beating = Arc::clone(&worker);
        let heartbeat = spawn_periodic(worker.heartbeat_every, receiver.clone(), move || {
            let current = Arc::clone(&beating);
            async move { current.heartbeat_once().await }
        });
        let claiming = Arc::clone(&worker);
        let claims = spawn_periodic(worker.claim_every, receiver, move || {
            let current = Arc::clone(&claiming);
            async move {
                current.drain_once().await;
            }
        });
        WorkerHandle {
            shutdown,
            tasks: vec![heartbeat, claims],
        }
    }
}

/// Starts the coordinator's expiry sweeper.
pub fn spawn_sweeper<C>(api: Arc<DroverApi<C>>, every: Duration) -> WorkerHandle
where
    C: Clock + Send + Sync + 'static,
{
    let (shutdown, receiver) = watch::channel(false);
    let task = spawn_periodic(every, receiver, move || {
        let coordinator = Arc::clone(&api);
        async move {
            match coordinator.sweep_expired().await {
                Ok(0) => {}
                Ok(expired) => tracing::info!(expired, "expired overdue jobs"),
                Err(err) => tracing::warn!(error = %err, "expiry sweep failed"),
            }
        }
    });
    WorkerHandle {
        shutdown,
        tasks: vec![task],
    }
}

fn spawn_periodic<F, Fut>(
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(MIN_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        break;
                    }
                }
            }
        }
    })
}
