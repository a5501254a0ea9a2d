use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Call count and latency totals of one operation.
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    count: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl Timer {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            count: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            max_nanos: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Start measuring, the duration is recorded when the guard is dropped.
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            started: Instant::now(),
        }
    }

    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            name: self.name,
            count: self.count.load(Ordering::Relaxed),
            total: Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed)),
            max: Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed)),
        }
    }
}

pub struct TimerGuard<'t> {
    timer: &'t Timer,
    started: Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.started.elapsed());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub name: &'static str,
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

/// Operation timers of one [`crate::Orm`].
#[derive(Debug)]
pub struct Metrics {
    pub store: Timer,
    pub store_insert: Timer,
    pub store_update: Timer,
    pub delete: Timer,
    pub fetch_one: Timer,
    pub fetch_many: Timer,
    pub iter: Timer,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            store: Timer::new("persist.store"),
            store_insert: Timer::new("persist.store.insert"),
            store_update: Timer::new("persist.store.update"),
            delete: Timer::new("persist.delete"),
            fetch_one: Timer::new("persist.fetch.one"),
            fetch_many: Timer::new("persist.fetch.many"),
            iter: Timer::new("persist.iter"),
        }
    }
}

impl Metrics {
    pub fn timers(&self) -> [&Timer; 7] {
        [
            &self.store,
            &self.store_insert,
            &self.store_update,
            &self.delete,
            &self.fetch_one,
            &self.fetch_many,
            &self.iter,
        ]
    }

    pub fn snapshot(&self) -> Vec<TimerSnapshot> {
        self.timers().iter().map(|v| v.snapshot()).collect()
    }

    pub fn get(&self, name: &str) -> Option<TimerSnapshot> {
        self.timers()
            .into_iter()
            .find(|v| v.name == name)
            .map(Timer::snapshot)
    }
}
