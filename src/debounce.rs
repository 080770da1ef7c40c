// src/debounce.rs

//! Coalesce bursts of field edits into one change notification.
//!
//! [`Debouncer`] is the clock-free state machine; [`DebouncedInput`] drives
//! it from a timer thread. [`ImmediateInput`] has the same surface but
//! forwards every edit.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

/// Quiet window for free-text fields.
pub const TEXT_DEBOUNCE: Duration = Duration::from_millis(500);
/// Quiet window for numeric range fields.
pub const RANGE_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    echo: T,
    acknowledged: T,
    deadline: Option<Instant>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(value: T, window: Duration) -> Self {
        Self {
            window,
            echo: value.clone(),
            acknowledged: value,
            deadline: None,
        }
    }

    /// Local echo, including edits not yet propagated.
    pub fn value(&self) -> &T {
        &self.echo
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Record a local edit and restart the quiet window.
    pub fn edit(&mut self, value: T, now: Instant) {
        self.echo = value;
        self.deadline = Some(now + self.window);
    }

    /// Owner-driven value change. Drops any pending edit.
    pub fn sync(&mut self, external: T) {
        self.echo = external.clone();
        self.acknowledged = external;
        self.deadline = None;
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Value to hand to the owner if the window has elapsed and the echo
    /// differs from what the owner last saw.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                if self.echo != self.acknowledged {
                    self.acknowledged = self.echo.clone();
                    Some(self.echo.clone())
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Common surface of debounced and immediate inputs.
pub trait FieldInput<T> {
    fn value(&self) -> T;
    fn edit(&self, value: T);
    fn sync(&self, external: T);
}

type ChangeFn<T> = Box<dyn Fn(T) + Send + 'static>;

struct Slot<T> {
    debouncer: Debouncer<T>,
    closed: bool,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    wake: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Threaded debounced field. Dropping it cancels any pending notification.
pub struct DebouncedInput<T: Clone + PartialEq + Send + 'static> {
    shared: Arc<Shared<T>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Clone + PartialEq + Send + 'static> DebouncedInput<T> {
    pub fn new<F>(value: T, window: Duration, on_change: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                debouncer: Debouncer::new(value, window),
                closed: false,
            }),
            wake: Condvar::new(),
        });
        let worker = {
            let shared = shared.clone();
            let on_change: ChangeFn<T> = Box::new(on_change);
            thread::spawn(move || run_timer(&shared, on_change))
        };
        Self {
            shared,
            worker: Some(worker),
        }
    }

    pub fn text<F>(value: T, on_change: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        Self::new(value, TEXT_DEBOUNCE, on_change)
    }

    pub fn range<F>(value: T, on_change: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        Self::new(value, RANGE_DEBOUNCE, on_change)
    }
}

fn run_timer<T: Clone + PartialEq>(shared: &Shared<T>, on_change: ChangeFn<T>) {
    let mut slot = shared.lock();
    loop {
        if slot.closed {
            return;
        }
        match slot.debouncer.deadline() {
            None => {
                slot = shared.wake.wait(slot).unwrap_or_else(|p| p.into_inner());
            }
            Some(deadline) => {
                let now = Instant::now();
                if now < deadline {
                    slot = shared
                        .wake
                        .wait_timeout(slot, deadline - now)
                        .map(|(guard, _)| guard)
                        .unwrap_or_else(|p| p.into_inner().0);
                    continue;
                }
                let fired = slot.debouncer.poll(now);
                drop(slot);
                if let Some(value) = fired {
                    on_change(value);
                }
                slot = shared.lock();
            }
        }
    }
}

impl<T: Clone + PartialEq + Send + 'static> FieldInput<T> for DebouncedInput<T> {
    fn value(&self) -> T {
        self.shared.lock().debouncer.value().clone()
    }

    fn edit(&self, value: T) {
        self.shared.lock().debouncer.edit(value, Instant::now());
        self.shared.wake.notify_one();
    }

    fn sync(&self, external: T) {
        self.shared.lock().debouncer.sync(external);
        self.shared.wake.notify_one();
    }
}

impl<T: Clone + PartialEq + Send + 'static> Drop for DebouncedInput<T> {
    fn drop(&mut self) {
        {
            let mut slot = self.shared.lock();
            slot.closed = true;
            slot.debouncer.cancel();
        }
        self.shared.wake.notify_one();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                debug!("debounce worker panicked");
            }
        }
    }
}

/// Forwards every edit straight to the owner.
pub struct ImmediateInput<T> {
    value: Mutex<T>,
    on_change: ChangeFn<T>,
}

impl<T: Clone + Send + 'static> ImmediateInput<T> {
    pub fn new<F>(value: T, on_change: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        Self {
            value: Mutex::new(value),
            on_change: Box::new(on_change),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.value.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<T: Clone + Send + 'static> FieldInput<T> for ImmediateInput<T> {
    fn value(&self) -> T {
        self.lock().clone()
    }

    fn edit(&self, value: T) {
        *self.lock() = value.clone();
        (self.on_change)(value);
    }

    fn sync(&self, external: T) {
        *self.lock() = external;
    }
}
