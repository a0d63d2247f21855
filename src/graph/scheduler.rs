//! Frame-paced stepping scheduler for the force simulation.
//!
//! Runs one tokio task that ticks the shared scene at a fixed cadence and
//! publishes a frame generation after every step. Cancellation is a watch
//! channel checked in the same `select!` as the interval wait, so a stop
//! request interrupts the sleep with at most one tick interval of latency
//! while the in-flight tick always finishes atomically under the scene
//! lock.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::{LayoutMode, SharedScene};

/// Default stepping cadence, targeting ~60 steps per second
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Drives the force simulation while the force layout is active.
///
/// The loop exits when the simulation stabilizes, when `stop` is called,
/// or when the layout is switched away from force; all exits mark the
/// simulation stopped.
#[derive(Debug)]
pub struct SimulationScheduler {
    tick_interval: Duration,
    frame_tx: watch::Sender<u64>,
    /// Shutdown signal for the current run; each start gets a fresh channel
    /// so a stale stop can never bleed into the next run.
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl Default for SimulationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationScheduler {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_TICK_INTERVAL)
    }

    /// Create with a custom stepping cadence
    pub fn with_interval(tick_interval: Duration) -> Self {
        let (frame_tx, _) = watch::channel(0u64);
        Self {
            tick_interval,
            frame_tx,
            shutdown_tx: None,
            handle: None,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Subscribe to frame generations; the receiver yields a new value
    /// after every published tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.frame_tx.subscribe()
    }

    /// Is the stepping loop currently alive?
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start the stepping loop.
    ///
    /// No-op if the loop is already running or the scene's layout is not
    /// force. Restarts the simulation, then ticks until it stabilizes or
    /// the loop is cancelled.
    pub fn start(&mut self, scene: SharedScene) {
        if self.is_running() {
            return;
        }
        {
            let mut guard = scene.lock().unwrap();
            if guard.layout() != LayoutMode::Force {
                debug!(
                    layout = guard.layout().as_str(),
                    "scheduler start ignored: layout is not force"
                );
                return;
            }
            guard.simulation_mut().restart();
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        // Replacing the sender also cancels any loop from a prior run
        self.shutdown_tx = Some(shutdown_tx);
        let frame_tx = self.frame_tx.clone();
        let tick_interval = self.tick_interval;

        info!(interval_ms = tick_interval.as_millis() as u64, "simulation scheduler started");
        self.handle = Some(tokio::spawn(run_loop(
            scene,
            shutdown_rx,
            frame_tx,
            tick_interval,
        )));
    }

    /// Request the loop to stop. Idempotent; safe from any context.
    ///
    /// The loop observes the request within one tick interval and lets any
    /// in-flight tick complete first.
    pub fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            shutdown_tx.send_replace(true);
            debug!("simulation scheduler stop requested");
        }
        self.handle.take();
    }
}

impl Drop for SimulationScheduler {
    fn drop(&mut self) {
        // The owning screen must never leak a background loop
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            shutdown_tx.send_replace(true);
        }
    }
}

async fn run_loop(
    scene: SharedScene,
    mut shutdown_rx: watch::Receiver<bool>,
    frame_tx: watch::Sender<u64>,
    tick_interval: Duration,
) {
    let mut ticker = interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frame: u64 = 0;

    let exit_reason = loop {
        tokio::select! {
            _ = ticker.tick() => {
                // One full tick under the lock; a concurrent stop request
                // takes effect only between ticks.
                let stepped = {
                    let mut guard = scene.lock().unwrap();
                    if guard.layout() != LayoutMode::Force {
                        break "layout switched";
                    }
                    guard.step()
                };
                frame += 1;
                frame_tx.send_replace(frame);
                if !stepped {
                    break "stabilized";
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break "stopped";
                }
            }
        }
    };

    scene.lock().unwrap().simulation_mut().stop();
    debug!(frames = frame, reason = exit_reason, "simulation scheduler exited");
}

// =============================================================================
// TESTS
// =============================================================================
