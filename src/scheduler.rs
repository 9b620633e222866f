//! Fixed-period worker threads with an explicit lifecycle.
//!
//! A [`PeriodicTask`] owns one thread that calls a tick closure at a fixed
//! period. `start` blocks until the thread has signalled it is running and
//! `stop` blocks until the thread has exited. Both are idempotent. A tick that
//! overruns its period simply delays the next one; ticks are never cut short.
//! A panicking tick is logged and counted, and the loop carries on.

use crate::{Error, Result};
use crossbeam_channel::bounded;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle of a periodic loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// A named thread ticking at a fixed period
pub struct PeriodicTask {
    name: String,
    period: Duration,
    state: Arc<Mutex<LoopState>>,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    panics: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Create a stopped task
    #[must_use]
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            state: Arc::new(Mutex::new(LoopState::Stopped)),
            running: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            panics: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        *self.state.lock()
    }

    /// Running and the worker thread is still alive
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running && self.thread_alive()
    }

    /// Number of ticks completed since creation
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Number of ticks that panicked since creation
    #[must_use]
    pub fn panicked_ticks(&self) -> u64 {
        self.panics.load(Ordering::Relaxed)
    }

    fn thread_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Join a worker that exited on its own and mark the task stopped
    fn reap_dead_thread(&mut self) {
        if self.state() != LoopState::Running || self.thread_alive() {
            return;
        }

        warn!("{} thread exited unexpectedly", self.name);
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        *self.state.lock() = LoopState::Stopped;
    }

    /// Launch the thread and wait until it is executing.
    ///
    /// Does nothing if the task is already running. A worker thread that
    /// died is joined and replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned or dies before
    /// signalling readiness.
    pub fn start<F>(&mut self, mut tick: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.reap_dead_thread();
        {
            let mut state = self.state.lock();
            if *state != LoopState::Stopped {
                debug!("{} already {:?}, start ignored", self.name, *state);
                return Ok(());
            }
            *state = LoopState::Starting;
        }

        let (ready_tx, ready_rx) = bounded::<()>(1);
        let running = Arc::clone(&self.running);
        let ticks = Arc::clone(&self.ticks);
        let panics = Arc::clone(&self.panics);
        let name = self.name.clone();
        let period = self.period;
        running.store(true, Ordering::SeqCst);

        let spawned = thread::Builder::new().name(self.name.clone()).spawn(move || {
            // The receiver only disappears if start() already gave up
            let _ = ready_tx.send(());
            while running.load(Ordering::SeqCst) {
                let tick_start = Instant::now();
                if panic::catch_unwind(AssertUnwindSafe(&mut tick)).is_err() {
                    panics.fetch_add(1, Ordering::Relaxed);
                    warn!("{name} tick panicked, continuing");
                }
                ticks.fetch_add(1, Ordering::Relaxed);
                thread::sleep(period.saturating_sub(tick_start.elapsed()));
            }
        });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                *self.state.lock() = LoopState::Stopped;
                return Err(Error::Thread(format!("Failed to spawn {}: {e}", self.name)));
            }
        };

        if ready_rx.recv().is_err() {
            self.running.store(false, Ordering::SeqCst);
            let _ = handle.join();
            *self.state.lock() = LoopState::Stopped;
            return Err(Error::Thread(format!("{} exited before becoming ready", self.name)));
        }

        self.handle = Some(handle);
        *self.state.lock() = LoopState::Running;
        info!("{} started ({} ms period)", self.name, self.period.as_millis());
        Ok(())
    }

    /// Clear the run flag and join the thread.
    ///
    /// Does nothing if the task is not running. The tick in progress, if any,
    /// completes before this returns.
    pub fn stop(&mut self) {
        self.reap_dead_thread();
        {
            let mut state = self.state.lock();
            if *state != LoopState::Running {
                return;
            }
            *state = LoopState::Stopping;
        }

        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("{} thread panicked", self.name);
            }
        }

        *self.state.lock() = LoopState::Stopped;
        info!("{} stopped", self.name);
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
