//! The capture loop — refresh geometry, capture, reduce, publish, sleep.
//!
//! One dedicated worker thread per run. The presentation side flips the
//! stop flag and then joins the worker; the worker checks the flag at each
//! iteration boundary, so a stop returns within one iteration (dominated by
//! the capture call). Once `stop` returns nothing from that run can still
//! publish. Iterations never overlap, which means at most one frame is in
//! flight and frames need no locking.

use crate::capture::{
    CaptureError, CaptureRect, CaptureTarget, FrameSource, GeometryModel, GeometrySnapshot,
    GeometryStatus, TargetInfo, TargetProvider,
};
use crate::histogram;
use crate::publish::ResultPublisher;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Pacing interval between iterations unless configured otherwise.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopState {
    Idle,
    Running,
    /// Transient: the target vanished and teardown is in progress.
    StoppingOnTargetLost,
}

/// What the command surface may offer in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopStatus {
    pub state: LoopState,
    pub can_start: bool,
    pub can_stop: bool,
    pub can_refresh: bool,
}

impl From<LoopState> for LoopStatus {
    fn from(state: LoopState) -> Self {
        let idle = state == LoopState::Idle;
        Self {
            state,
            can_start: idle,
            can_stop: state == LoopState::Running,
            can_refresh: idle,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("Capture is already running")]
    AlreadyRunning,

    #[error("No capture target selected")]
    NoTarget,

    #[error(transparent)]
    Target(#[from] CaptureError),

    #[error("Failed to spawn capture worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Cooperative cancellation flag shared with one worker.
pub type StopHandle = Arc<AtomicBool>;

#[derive(Default)]
struct RunHandle {
    stop: Option<StopHandle>,
    worker: Option<JoinHandle<()>>,
}

/// Owns the run/stop lifecycle and the shared geometry.
pub struct CaptureLoop {
    targets: Arc<dyn TargetProvider>,
    source: Arc<dyn FrameSource>,
    publisher: Arc<dyn ResultPublisher>,
    geometry: Arc<Mutex<GeometryModel>>,
    state: Arc<watch::Sender<LoopState>>,
    run: Mutex<RunHandle>,
    interval: Mutex<Duration>,
}

impl CaptureLoop {
    pub fn new(
        targets: Arc<dyn TargetProvider>,
        source: Arc<dyn FrameSource>,
        publisher: Arc<dyn ResultPublisher>,
        geometry: GeometryModel,
    ) -> Self {
        let (state, _) = watch::channel(LoopState::Idle);
        Self {
            targets,
            source,
            publisher,
            geometry: Arc::new(Mutex::new(geometry)),
            state: Arc::new(state),
            run: Mutex::new(RunHandle::default()),
            interval: Mutex::new(DEFAULT_INTERVAL),
        }
    }

    pub fn with_interval(self, interval: Duration) -> Self {
        self.set_interval(interval);
        self
    }

    /// Changes the pacing interval. Applies from the next `start`.
    pub fn set_interval(&self, interval: Duration) {
        *self.interval.lock().unwrap_or_else(PoisonError::into_inner) = interval;
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    pub fn status(&self) -> LoopStatus {
        self.state().into()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<LoopState> {
        self.state.subscribe()
    }

    /// Runs `f` against the geometry model.
    ///
    /// Safe while running: the worker picks up the change at its next
    /// iteration boundary.
    pub fn with_geometry<R>(&self, f: impl FnOnce(&mut GeometryModel) -> R) -> R {
        let mut model = self.geometry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut model)
    }

    pub fn list_targets(&self) -> Vec<TargetInfo> {
        self.targets.list()
    }

    /// Selects a target and derives fresh geometry for it. Idle only.
    pub fn select_target(&self, target: CaptureTarget) -> Result<GeometrySnapshot, LoopError> {
        self.ensure_idle()?;
        let bounds = self.targets.bounds(&target).ok_or_else(|| {
            CaptureError::TargetUnavailable(format!("{:?} not found", target))
        })?;
        Ok(self.with_geometry(|model| {
            model.select_target(target, bounds);
            model.snapshot()
        }))
    }

    /// Re-enumerates targets and selects the first one. Idle only.
    pub fn refresh(&self) -> Result<(Vec<TargetInfo>, GeometrySnapshot), LoopError> {
        self.ensure_idle()?;
        let targets = self.targets.list();
        let snapshot = self.with_geometry(|model| {
            if let Some(first) = targets.first() {
                model.select_target(first.target, first.bounds);
            }
            model.snapshot()
        });
        log::info!("[CAPTURE] Refreshed {} targets", targets.len());
        Ok((targets, snapshot))
    }

    /// Spawns the worker. Fails with `AlreadyRunning` unless idle.
    pub fn start(&self) -> Result<(), LoopError> {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_idle()?;

        // A worker that ended on target loss leaves its handle behind.
        if let Some(previous) = run.worker.take() {
            if previous.join().is_err() {
                log::error!("[CAPTURE] Previous worker panicked");
            }
        }

        let target = self
            .with_geometry(|model| model.target())
            .ok_or(LoopError::NoTarget)?;

        let stop: StopHandle = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            targets: Arc::clone(&self.targets),
            source: Arc::clone(&self.source),
            publisher: Arc::clone(&self.publisher),
            geometry: Arc::clone(&self.geometry),
            state: Arc::clone(&self.state),
            stop: Arc::clone(&stop),
            interval: *self.interval.lock().unwrap_or_else(PoisonError::into_inner),
        };

        self.state.send_replace(LoopState::Running);
        let spawned = thread::Builder::new()
            .name("histogram-capture".into())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                run.worker = Some(handle);
                run.stop = Some(stop);
                log::info!("[CAPTURE] Started on {:?}", target);
                Ok(())
            }
            Err(e) => {
                self.state.send_replace(LoopState::Idle);
                Err(LoopError::WorkerSpawn(e))
            }
        }
    }

    /// Stops the worker and waits for it to exit. No-op when idle.
    ///
    /// Blocks for at most the remainder of the current iteration; the
    /// pacing sleep is cut short. The state only becomes `Idle` once the
    /// worker is gone, so `can_start` never overlaps a live worker.
    pub fn stop(&self) {
        let mut run = self.run.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(stop) = run.stop.take() {
            stop.store(true, Ordering::SeqCst);
        }
        if let Some(worker) = run.worker.take() {
            worker.thread().unpark();
            if worker.join().is_err() {
                log::error!("[CAPTURE] Worker panicked");
            }
        }
        let was_running = self.state.send_if_modified(|state| {
            if *state == LoopState::Idle {
                false
            } else {
                *state = LoopState::Idle;
                true
            }
        });
        if was_running {
            log::info!("[CAPTURE] Stopped");
        }
    }

    fn ensure_idle(&self) -> Result<(), LoopError> {
        if self.state() == LoopState::Idle {
            Ok(())
        } else {
            Err(LoopError::AlreadyRunning)
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything one run needs, moved onto the worker thread.
struct Worker {
    targets: Arc<dyn TargetProvider>,
    source: Arc<dyn FrameSource>,
    publisher: Arc<dyn ResultPublisher>,
    geometry: Arc<Mutex<GeometryModel>>,
    state: Arc<watch::Sender<LoopState>>,
    stop: StopHandle,
    interval: Duration,
}

impl Worker {
    fn run(self) {
        let mut iterations: u64 = 0;

        while !self.stopped() {
            let started = Instant::now();

            let rect = match self.reconcile() {
                Ok(rect) => rect,
                Err(e) => return self.target_lost(e),
            };

            let frame = match self.source.capture(&rect) {
                Ok(frame) => frame,
                Err(e) => return self.target_lost(e),
            };
            let capture_ms = started.elapsed().as_millis();

            let histogram = histogram::reduce(&frame);
            let reduce_ms = started.elapsed().as_millis() - capture_ms;

            if self.stopped() {
                break;
            }
            self.publisher.publish(histogram, frame);
            iterations += 1;

            log::debug!(
                "[CAPTURE] #{} {}x{}: capture {}ms, reduce {}ms, total {}ms",
                iterations,
                rect.width,
                rect.height,
                capture_ms,
                reduce_ms,
                started.elapsed().as_millis()
            );

            self.pause();
        }

        log::info!("[CAPTURE] Worker stopped after {} iterations", iterations);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Sleeps for the pacing interval. `stop` unparks the thread.
    fn pause(&self) {
        let deadline = Instant::now() + self.interval;
        while !self.stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }

    /// Queries fresh bounds and reconciles the rectangle against them.
    /// The bounds lookup runs without holding the geometry lock.
    fn reconcile(&self) -> Result<CaptureRect, CaptureError> {
        let target = self
            .geometry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .target()
            .ok_or_else(|| CaptureError::TargetUnavailable("no target selected".into()))?;

        let bounds = self.targets.bounds(&target);

        let status = self
            .geometry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_target_bounds_changed(bounds);

        match status {
            GeometryStatus::Valid(rect) if rect.is_empty() => {
                log::debug!(
                    "[GEOMETRY] Rectangle collapsed to {}x{} by its offset, not a lost target",
                    rect.width,
                    rect.height
                );
                Err(CaptureError::CaptureUnavailable(format!(
                    "capture rectangle is empty at ({},{})",
                    rect.x, rect.y
                )))
            }
            GeometryStatus::Valid(rect) => Ok(rect),
            GeometryStatus::Invalid => Err(CaptureError::TargetUnavailable(format!(
                "{:?} has no bounds",
                target
            ))),
        }
    }

    fn target_lost(&self, error: CaptureError) {
        // `stop` is already joining us.
        if self.stopped() {
            return;
        }
        let claimed = self.state.send_if_modified(|state| {
            if *state == LoopState::Running {
                *state = LoopState::StoppingOnTargetLost;
                true
            } else {
                false
            }
        });
        // Lost the race against an explicit stop.
        if !claimed {
            return;
        }

        log::warn!("[CAPTURE] Stopping: {}", error);
        self.stop.store(true, Ordering::SeqCst);
        self.publisher.notify_target_lost();
        self.state.send_replace(LoopState::Idle);
    }
}
