#![forbid(unsafe_code)]

//! Task schedulers driving the render throttle.
//!
//! The engine treats a [`Scheduler`] opaquely: it hands over a task and gets
//! back a [`TaskHandle`] it can cancel. Three implementations cover the usual
//! hosts:
//!
//! | Scheduler          | Runs a task                                   |
//! |--------------------|-----------------------------------------------|
//! | [`SyncScheduler`]  | immediately, inside `schedule`                |
//! | [`FrameScheduler`] | on the next [`run_frame`](FrameScheduler::run_frame) |
//! | [`TimerScheduler`] | once its interval has elapsed, on [`run_due`](TimerScheduler::run_due) |
//!
//! Frame and timer schedulers never run tasks on their own; the host loop
//! calls into them. A task scheduled while another runs waits for the next
//! frame (or the next `run_due` call).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Work handed to a scheduler.
pub type Task = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Pending,
    Started,
    Cancelled,
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    state: Rc<Cell<TaskState>>,
}

impl TaskHandle {
    fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(TaskState::Pending)),
        }
    }

    /// Prevent the task from running. No effect once it has started.
    pub fn cancel(&self) {
        if self.state.get() == TaskState::Pending {
            self.state.set(TaskState::Cancelled);
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.get() == TaskState::Cancelled
    }

    /// Whether the task has started running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.get() == TaskState::Started
    }

    /// Whether the task may still run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.get() == TaskState::Pending
    }

    fn run(&self, task: Task) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state.set(TaskState::Started);
        task();
        true
    }
}

/// Runs deferred work for the render throttle.
pub trait Scheduler {
    /// Queue `task`; the returned handle can cancel it.
    fn schedule(&self, task: Task) -> TaskHandle;

    /// Name for logs.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// SyncScheduler
// ---------------------------------------------------------------------------

/// Runs every task immediately.
///
/// With this scheduler a throttle interval has zero length: each render
/// request renders synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncScheduler;

impl Scheduler for SyncScheduler {
    fn schedule(&self, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        handle.run(task);
        handle
    }

    fn name(&self) -> &'static str {
        "sync"
    }
}

// ---------------------------------------------------------------------------
// FrameScheduler
// ---------------------------------------------------------------------------

/// Runs tasks on the next frame, as driven by the host.
#[derive(Default)]
pub struct FrameScheduler {
    queue: RefCell<VecDeque<(TaskHandle, Task)>>,
    frames: Cell<u64>,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every task queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.borrow_mut());
        self.frames.set(self.frames.get() + 1);
        let mut ran = 0;
        for (handle, task) in batch {
            if handle.run(task) {
                ran += 1;
            }
        }
        ran
    }

    /// Tasks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .borrow()
            .iter()
            .filter(|(handle, _)| handle.is_pending())
            .count()
    }

    /// Frames run so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }
}

impl Scheduler for FrameScheduler {
    fn schedule(&self, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        self.queue.borrow_mut().push_back((handle.clone(), task));
        handle
    }

    fn name(&self) -> &'static str {
        "frame"
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending())
            .field("frames", &self.frames.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// A manually-advanced clock for deterministic tests.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct LabClock {
    epoch: Instant,
    offset: Rc<Cell<Duration>>,
}

impl LabClock {
    /// A lab clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, delta: Duration) {
        self.offset.set(self.offset.get().saturating_add(delta));
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.epoch + self.offset.get()
    }

    /// Time advanced since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum TimeSource {
    Real,
    Lab(LabClock),
}

impl TimeSource {
    fn now(&self) -> Instant {
        match self {
            Self::Real => Instant::now(),
            Self::Lab(clock) => clock.now(),
        }
    }
}

// ---------------------------------------------------------------------------
// TimerScheduler
// ---------------------------------------------------------------------------

struct Timer {
    due: Instant,
    seq: u64,
    handle: TaskHandle,
    task: Task,
}

/// Runs each task once a fixed interval has elapsed since it was scheduled.
pub struct TimerScheduler {
    interval: Duration,
    time: TimeSource,
    timers: RefCell<Vec<Timer>>,
    next_seq: Cell<u64>,
}

impl TimerScheduler {
    /// A scheduler on wall-clock time.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            time: TimeSource::Real,
            timers: RefCell::new(Vec::new()),
            next_seq: Cell::new(0),
        }
    }

    /// Use a lab clock instead of wall-clock time.
    #[must_use]
    pub fn with_clock(mut self, clock: &LabClock) -> Self {
        self.time = TimeSource::Lab(clock.clone());
        self
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.time.now()
    }

    /// Run every timer that is due now and was scheduled before this call,
    /// earliest first. Returns how many ran.
    pub fn run_due(&self) -> usize {
        let now = self.now();
        let horizon = self.next_seq.get();
        let mut ran = 0;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                timers.retain(|t| t.handle.is_pending());
                let earliest = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= now && t.seq < horizon)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                earliest.map(|i| timers.swap_remove(i))
            };
            let Some(timer) = next else { break };
            if timer.handle.run(timer.task) {
                ran += 1;
            }
        }
        ran
    }

    /// When the earliest live timer is due.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.timers
            .borrow()
            .iter()
            .filter(|t| t.handle.is_pending())
            .map(|t| t.due)
            .min()
    }

    /// Live timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers
            .borrow()
            .iter()
            .filter(|t| t.handle.is_pending())
            .count()
    }
}

impl Scheduler for TimerScheduler {
    fn schedule(&self, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.timers.borrow_mut().push(Timer {
            due: self.now() + self.interval,
            seq,
            handle: handle.clone(),
            task,
        });
        handle
    }

    fn name(&self) -> &'static str {
        "timer"
    }
}

impl fmt::Debug for TimerScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerScheduler")
            .field("interval", &self.interval)
            .field("time", &self.time)
            .field("pending", &self.pending())
            .finish()
    }
}
