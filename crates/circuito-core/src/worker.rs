//! Worker primitives: long-lived parked threads behind a two-flag handshake.
//!
//! All three workers share one rendezvous design. The worker thread loops:
//! set a *sync* flag and notify, wait for a *resume* flag, perform one unit
//! of work, repeat. The controller drives it with paired calls: `sync` blocks
//! until the sync flag is up (the worker has finished its unit and parked),
//! `resume` raises the resume flag and wakes the worker. The flags are stored
//! in the mutex-guarded state, independent of the condvars, so a signal
//! raised before the waiter parks is never lost.
//!
//! - [`ComponentWorker`] executes one closure per resume: a component's
//!   per-tick local work for one buffer slot.
//! - [`CircuitWorker`] is bound at start to a circuit's component list and a
//!   slot index; its unit of work is tick-all-then-reset-all at that slot.
//! - [`AutoTicker`] free-runs a tick callback until paused or stopped.
//!
//! Stopping is always cooperative: raise the stop flag, resume the thread so
//! it can observe it, join.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use log::{debug, trace};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::Payload;
use crate::component::{Component, TickMode};

/// One unit of component-local tick work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

// ---------------------------------------------------------------------------
// ComponentWorker
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ComponentWorkerState {
    job: Option<Job>,
    got_resume: bool,
    got_sync: bool,
    stop: bool,
}

#[derive(Default)]
struct ComponentWorkerCore {
    state: Mutex<ComponentWorkerState>,
    resume_cv: Condvar,
    sync_cv: Condvar,
}

/// Slot-local executor for one component's per-tick work.
///
/// The thread spawns lazily on the first [`resume`](Self::resume). Once
/// [`stop`](Self::stop)ped, the worker stays stopped: a later `resume` is a
/// no-op and revival requires an explicit [`start`](Self::start).
pub(crate) struct ComponentWorker {
    core: Arc<ComponentWorkerCore>,
    handle: Mutex<Option<JoinHandle<()>>>,
    retired: AtomicBool,
}

impl ComponentWorker {
    pub fn new() -> Self {
        Self {
            core: Arc::new(ComponentWorkerCore::default()),
            handle: Mutex::new(None),
            retired: AtomicBool::new(false),
        }
    }

    /// Spawns the worker thread and blocks until it has parked.
    ///
    /// No-op when the thread is already running. Also clears the retired
    /// state left behind by [`stop`](Self::stop).
    pub fn start(&self) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }
        self.retired.store(false, Ordering::Release);
        {
            let mut state = self.core.state.lock();
            state.job = None;
            state.got_resume = false;
            state.got_sync = false;
            state.stop = false;
        }
        let core = Arc::clone(&self.core);
        *handle = Some(thread::spawn(move || Self::run(core)));
        drop(handle);

        // Wait for the first park so resume/sync see a live thread.
        self.sync();
    }

    /// Blocks until the worker has finished its current job and parked.
    ///
    /// Returns immediately when the worker was never started.
    pub fn sync(&self) {
        if self.handle.lock().is_none() {
            return;
        }
        let mut state = self.core.state.lock();
        while !state.got_sync {
            self.core.sync_cv.wait(&mut state);
        }
    }

    /// Hands the worker one job and wakes it.
    ///
    /// The caller must `sync` first (or know the worker is parked); the
    /// engine's tick/reset discipline guarantees this. A retired worker
    /// ignores the request.
    pub fn resume(&self, job: Job) {
        if self.retired.load(Ordering::Acquire) {
            debug!("resume on a stopped component worker ignored");
            return;
        }
        if self.handle.lock().is_none() {
            self.start();
        }
        let mut state = self.core.state.lock();
        state.got_sync = false;
        state.job = Some(job);
        state.got_resume = true;
        self.core.resume_cv.notify_all();
    }

    /// Waits for any in-flight job, asks the thread to exit, and joins it.
    pub fn stop(&self) {
        let handle = self.handle.lock().take();
        let Some(handle) = handle else {
            return;
        };
        self.retired.store(true, Ordering::Release);
        {
            let mut state = self.core.state.lock();
            while !state.got_sync {
                self.core.sync_cv.wait(&mut state);
            }
            state.stop = true;
            state.got_sync = false;
            state.got_resume = true;
            self.core.resume_cv.notify_all();
        }
        let _ = handle.join();
    }

    fn run(core: Arc<ComponentWorkerCore>) {
        trace!("component worker online");
        loop {
            let job = {
                let mut state = core.state.lock();
                state.got_sync = true;
                core.sync_cv.notify_all();
                while !state.got_resume {
                    core.resume_cv.wait(&mut state);
                }
                state.got_resume = false;
                if state.stop {
                    break;
                }
                state.job.take()
            };
            if let Some(job) = job {
                job();
            }
        }
        trace!("component worker offline");
    }
}

impl Drop for ComponentWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// CircuitWorker
// ---------------------------------------------------------------------------

struct CircuitWorkerState {
    mode: TickMode,
    got_resume: bool,
    got_sync: bool,
    stop: bool,
}

impl Default for CircuitWorkerState {
    fn default() -> Self {
        Self {
            mode: TickMode::Parallel,
            got_resume: false,
            got_sync: false,
            stop: false,
        }
    }
}

#[derive(Default)]
struct CircuitWorkerCore {
    state: Mutex<CircuitWorkerState>,
    resume_cv: Condvar,
    sync_cv: Condvar,
}

/// Pipeline-stage thread: ticks then resets every component of a circuit at
/// one buffer slot.
///
/// The slot index doubles as the buffer number handed to every component, so
/// each worker must carry a unique slot starting at 0. Each worker always
/// starts its pass at the head of the component list: in-order components
/// require that every other in-order component processes the same buffers in
/// the same sequence, which a staggered start would break.
pub(crate) struct CircuitWorker {
    core: Arc<CircuitWorkerCore>,
    handle: Option<JoinHandle<()>>,
}

impl CircuitWorker {
    pub fn new() -> Self {
        Self {
            core: Arc::new(CircuitWorkerCore::default()),
            handle: None,
        }
    }

    /// Binds the worker to a component list and slot, spawns its thread, and
    /// blocks until it has parked.
    pub fn start<T: Payload>(
        &mut self,
        components: Arc<RwLock<Vec<Component<T>>>>,
        slot: usize,
    ) {
        if self.handle.is_some() {
            return;
        }
        {
            let mut state = self.core.state.lock();
            state.got_resume = false;
            state.got_sync = false;
            state.stop = false;
        }
        let core = Arc::clone(&self.core);
        self.handle = Some(thread::spawn(move || Self::run(core, components, slot)));
        self.sync();
    }

    /// Blocks until the worker has finished its pass and parked.
    pub fn sync(&self) {
        if self.handle.is_none() {
            return;
        }
        let mut state = self.core.state.lock();
        while !state.got_sync {
            self.core.sync_cv.wait(&mut state);
        }
    }

    /// Waits for the previous pass to finish, then starts the next one.
    ///
    /// Blocks momentarily when the pipeline is full, i.e. the worker is still
    /// busy with the pass it was handed a full rotation ago.
    pub fn sync_and_resume(&self, mode: TickMode) {
        if self.handle.is_none() {
            return;
        }
        let mut state = self.core.state.lock();
        while !state.got_sync {
            self.core.sync_cv.wait(&mut state);
        }
        state.got_sync = false;
        state.mode = mode;
        state.got_resume = true;
        self.core.resume_cv.notify_all();
    }

    /// Waits for any in-flight pass, asks the thread to exit, and joins it.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        {
            let mut state = self.core.state.lock();
            while !state.got_sync {
                self.core.sync_cv.wait(&mut state);
            }
            state.stop = true;
            state.got_sync = false;
            state.got_resume = true;
            self.core.resume_cv.notify_all();
        }
        let _ = handle.join();
    }

    fn run<T: Payload>(
        core: Arc<CircuitWorkerCore>,
        components: Arc<RwLock<Vec<Component<T>>>>,
        slot: usize,
    ) {
        trace!("circuit worker online (slot {slot})");
        loop {
            let mode = {
                let mut state = core.state.lock();
                state.got_sync = true;
                core.sync_cv.notify_all();
                while !state.got_resume {
                    core.resume_cv.wait(&mut state);
                }
                state.got_resume = false;
                if state.stop {
                    break;
                }
                state.mode
            };

            let list = components.read();
            for component in list.iter() {
                component.tick(mode, slot);
            }
            for component in list.iter() {
                component.reset(slot);
            }
        }
        trace!("circuit worker offline (slot {slot})");
    }
}

impl Drop for CircuitWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// AutoTicker
// ---------------------------------------------------------------------------

struct AutoTickerState {
    mode: TickMode,
    pause: bool,
    parked: bool,
    stop: bool,
    stopped: bool,
}

impl Default for AutoTickerState {
    fn default() -> Self {
        Self {
            mode: TickMode::Parallel,
            pause: false,
            parked: false,
            stop: false,
            stopped: true,
        }
    }
}

#[derive(Default)]
struct AutoTickerCore {
    state: Mutex<AutoTickerState>,
    resume_cv: Condvar,
    pause_cv: Condvar,
}

/// Free-running thread that ticks a circuit continuously.
///
/// [`pause`](Self::pause) blocks until the thread has actually parked, so the
/// caller may mutate the circuit the moment it returns;
/// [`resume`](Self::resume) is non-blocking.
pub(crate) struct AutoTicker {
    core: Arc<AutoTickerCore>,
    handle: Option<JoinHandle<()>>,
}

impl AutoTicker {
    pub fn new() -> Self {
        Self {
            core: Arc::new(AutoTickerCore::default()),
            handle: None,
        }
    }

    /// Returns the tick mode the ticker was started with.
    pub fn mode(&self) -> TickMode {
        self.core.state.lock().mode
    }

    /// Returns whether the ticker thread is not running.
    pub fn is_stopped(&self) -> bool {
        self.core.state.lock().stopped
    }

    /// Returns whether the ticker is paused.
    pub fn is_paused(&self) -> bool {
        self.core.state.lock().pause
    }

    /// Spawns the free-running loop. No-op when already running.
    pub fn start<F>(&mut self, tick_fn: F, mode: TickMode)
    where
        F: Fn(TickMode) + Send + 'static,
    {
        if self.handle.is_some() {
            return;
        }
        {
            let mut state = self.core.state.lock();
            state.mode = mode;
            state.pause = false;
            state.parked = false;
            state.stop = false;
            state.stopped = false;
        }
        let core = Arc::clone(&self.core);
        self.handle = Some(thread::spawn(move || Self::run(core, tick_fn)));
        trace!("auto-tick started");
    }

    /// Parks the ticker, blocking until it is actually parked.
    ///
    /// No-op when already paused or stopped.
    pub fn pause(&self) {
        let mut state = self.core.state.lock();
        if state.stopped || state.pause {
            return;
        }
        state.pause = true;
        while !state.parked {
            self.core.pause_cv.wait(&mut state);
        }
        trace!("auto-tick paused");
    }

    /// Wakes a paused ticker. Non-blocking; no-op when not paused.
    pub fn resume(&self) {
        let mut state = self.core.state.lock();
        if state.pause {
            state.pause = false;
            self.core.resume_cv.notify_all();
            trace!("auto-tick resumed");
        }
    }

    /// Pauses, raises the stop flag, resumes so the thread can observe it,
    /// and joins.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.pause();
        {
            let mut state = self.core.state.lock();
            state.stop = true;
            state.pause = false;
            self.core.resume_cv.notify_all();
        }
        let _ = handle.join();
        trace!("auto-tick stopped");
    }

    fn run<F>(core: Arc<AutoTickerCore>, tick_fn: F)
    where
        F: Fn(TickMode),
    {
        loop {
            let mode = {
                let mut state = core.state.lock();
                if state.pause {
                    state.parked = true;
                    core.pause_cv.notify_all();
                    while state.pause {
                        core.resume_cv.wait(&mut state);
                    }
                    state.parked = false;
                }
                if state.stop {
                    break;
                }
                state.mode
            };
            tick_fn(mode);
        }
        let mut state = core.state.lock();
        state.stopped = true;
        // A pause racing the shutdown must not hang waiting for the park.
        state.parked = true;
        core.pause_cv.notify_all();
    }
}

impl Drop for AutoTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
