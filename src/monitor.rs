//! Backend monitoring loops.
//!
//! One [`BackendMonitor`] actor runs per configured backend, polling on its
//! own interval so a slow or dead backend never delays the others. The
//! [`Monitor`] orchestrator spawns all of them, hands each a receiver of the
//! process-wide shutdown broadcast, and waits for every loop to stop before
//! returning.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → Probe /healthy → Reduce report → Dispatch rules → Channels
//!     ↑
//!     ├─── TickNow command (tests, manual refresh)
//!     └─── Shutdown broadcast (signal handling in the binary)
//! ```
//!
//! Scheduling rules:
//! - the first tick fires one full interval after startup, never immediately
//! - probe and dispatch run inline, so ticks of one backend cannot overlap;
//!   missed ticks are skipped, not queued
//! - tick errors are logged and the loop keeps going; only the shutdown
//!   broadcast stops it, and only between ticks

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinError;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::{BackendConfig, Config};
use crate::dispatch::Dispatcher;
use crate::probe::HealthProber;

/// Commands accepted by a running backend monitor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run one poll cycle immediately, outside the schedule
    TickNow {
        /// Channel to send the cycle result back on
        respond_to: oneshot::Sender<Result<()>>,
    },
}

/// Actor that polls a single backend on its configured interval.
pub struct BackendMonitor {
    /// Backend under watch
    config: BackendConfig,

    /// Prober with its own reused HTTP client
    prober: HealthProber,

    /// Shared notification dispatcher
    dispatcher: Arc<Dispatcher>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<MonitorCommand>,

    /// Process-wide shutdown signal
    shutdown_rx: broadcast::Receiver<()>,

    /// Poll interval
    interval: Duration,
}

impl BackendMonitor {
    pub fn new(
        config: BackendConfig,
        dispatcher: Arc<Dispatcher>,
        command_rx: mpsc::Receiver<MonitorCommand>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let interval = Duration::from_secs(config.interval);

        Self {
            config,
            prober: HealthProber::new(),
            dispatcher,
            command_rx,
            shutdown_rx,
            interval,
        }
    }

    /// Runs the monitor loop until the shutdown broadcast fires.
    #[instrument(skip(self), fields(backend = %self.config.name))]
    pub async fn run(mut self) {
        debug!("starting backend monitor");

        // First tick only after one full interval has passed
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Timer tick - poll and dispatch
                _ = ticker.tick() => {
                    if let Err(e) = self.run_tick().await {
                        error!("poll cycle failed: {:#}", e);
                    }
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        MonitorCommand::TickNow { respond_to } => {
                            debug!("received TickNow command");
                            let result = self.run_tick().await;
                            let _ = respond_to.send(result);
                        }
                    }
                }

                // Shutdown broadcast - observed between ticks only
                _ = self.shutdown_rx.recv() => {
                    debug!("shutdown signal received");
                    break;
                }
            }
        }

        debug!("backend monitor stopped");
    }

    /// One poll cycle: probe, then run the notification rules.
    ///
    /// A probe error ends the cycle before any dispatch. Either way the
    /// error never escapes the loop; the next tick starts fresh.
    async fn run_tick(&self) -> Result<()> {
        let ping = self.prober.probe(&self.config).await?;

        if ping.failures.is_empty() {
            trace!("all components ok (status {})", ping.status_code);
        } else {
            warn!(
                "{} component(s) failed (status {})",
                ping.failures.len(),
                ping.status_code
            );
        }

        self.dispatcher.dispatch(&self.config, &ping).await?;
        Ok(())
    }
}

/// Handle for a spawned [`BackendMonitor`]
pub struct MonitorHandle {
    /// Command sender
    sender: mpsc::Sender<MonitorCommand>,

    /// Name of the monitored backend
    pub backend: String,

    /// The actor's task, awaited for the shutdown barrier
    task: tokio::task::JoinHandle<()>,
}

impl MonitorHandle {
    /// Spawns a monitor actor for one backend as a tokio task.
    pub fn spawn(
        config: BackendConfig,
        dispatcher: Arc<Dispatcher>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let backend = config.name.clone();
        let actor = BackendMonitor::new(config, dispatcher, cmd_rx, shutdown_rx);

        let task = tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            backend,
            task,
        }
    }

    /// Triggers an immediate poll cycle, bypassing the interval timer.
    pub async fn tick_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::TickNow { respond_to: tx })
            .await
            .context("failed to send TickNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    /// Waits until the actor's loop has stopped.
    pub async fn join(self) -> std::result::Result<(), JoinError> {
        self.task.await
    }

    /// Name of the monitored backend.
    pub fn backend(&self) -> &str {
        &self.backend
    }
}

/// Spawns one monitor per backend and waits for all of them.
pub struct Monitor {
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
    shutdown: broadcast::Sender<()>,
}

impl Monitor {
    /// The shutdown sender is the only way to stop a running monitor; the
    /// binary wires it to signal handling, tests fire it directly.
    pub fn new(
        config: Arc<Config>,
        dispatcher: Arc<Dispatcher>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            shutdown,
        }
    }

    /// Starts every backend monitor and blocks until all of them stopped.
    pub async fn run(self) -> Result<()> {
        if self.config.backends.is_empty() {
            warn!("no backends configured, nothing to monitor");
            return Ok(());
        }

        let mut handles = Vec::with_capacity(self.config.backends.len());
        for backend in &self.config.backends {
            debug!(
                "starting monitor for backend {} ({}) every {}s",
                backend.name, backend.url, backend.interval
            );
            if let Some(code) = backend.expect_code {
                trace!("backend {} expects status code {}", backend.name, code);
            }

            handles.push(MonitorHandle::spawn(
                backend.clone(),
                self.dispatcher.clone(),
                self.shutdown.subscribe(),
            ));
        }

        info!("monitoring {} backend(s)", handles.len());

        // Shutdown barrier: return only once every loop has stopped
        let results = join_all(handles.into_iter().map(|handle| handle.join())).await;
        for result in results {
            if let Err(e) = result {
                error!("monitor task failed: {e}");
            }
        }

        debug!("all backend monitors stopped");
        Ok(())
    }
}
