//! Fixed-window per-client rate limiting.
//!
//! Each client identity gets a window of [`WINDOW`] length. The first request
//! opens the window with `count = 1`; subsequent requests increment the count
//! until it reaches the limit, after which requests are rejected until the
//! window's reset time passes.
//!
//! This is a soft, single-process limiter. State is lost on restart and is
//! not shared between processes. Because windows are fixed rather than
//! sliding, a client can get up to `2 * limit` requests through across a
//! window boundary; that approximation is accepted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::observability::metrics;

/// Length of every rate window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// One client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    /// Milliseconds since the Unix epoch at which the window closes.
    pub reset_at_ms: u64,
}

impl RateWindow {
    fn is_expired(&self, now_ms: u64) -> bool {
        self.reset_at_ms <= now_ms
    }
}

/// Outcome of one rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub admitted: bool,
    pub remaining: u32,
    pub reset_at_ms: u64,
}

impl RateDecision {
    /// Reset time in whole seconds since the Unix epoch.
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at_ms / 1000
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Storage for per-client windows.
///
/// `modify` must run the closure while holding exclusive access to that
/// client's slot, so two concurrent checks for one client cannot both
/// observe the same count.
pub trait WindowStore: Send + Sync + 'static {
    fn get(&self, client: &str) -> Option<RateWindow>;

    /// Atomically read-modify-write one client's slot. Leaving the slot
    /// `None` removes the entry.
    fn modify(&self, client: &str, f: &mut dyn FnMut(&mut Option<RateWindow>));

    /// Drop windows whose reset time is at or before `now_ms`. Returns the
    /// number removed.
    fn evict_expired(&self, now_ms: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Each DashMap entry is locked for the duration of
/// `modify`.
#[derive(Debug, Default)]
pub struct InMemoryWindowStore {
    windows: DashMap<String, RateWindow>,
}

impl InMemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowStore for InMemoryWindowStore {
    fn get(&self, client: &str) -> Option<RateWindow> {
        self.windows.get(client).map(|r| *r.value())
    }

    fn modify(&self, client: &str, f: &mut dyn FnMut(&mut Option<RateWindow>)) {
        match self.windows.entry(client.to_string()) {
            Entry::Occupied(mut entry) => {
                let mut slot = Some(*entry.get());
                f(&mut slot);
                match slot {
                    Some(window) => {
                        entry.insert(window);
                    }
                    None => {
                        entry.remove();
                    }
                }
            }
            Entry::Vacant(entry) => {
                let mut slot = None;
                f(&mut slot);
                if let Some(window) = slot {
                    entry.insert(window);
                }
            }
        }
    }

    fn evict_expired(&self, now_ms: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now_ms));
        before.saturating_sub(self.windows.len())
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

/// Fixed-window limiter over an injectable store and clock.
pub struct RateLimiter {
    store: Arc<dyn WindowStore>,
    clock: Arc<dyn Clock>,
    max_requests: u32,
    /// Earliest time the next stale-window sweep may run.
    next_sweep_ms: AtomicU64,
}

impl RateLimiter {
    /// In-memory store and wall clock.
    pub fn new(max_requests: u32) -> Self {
        Self::with_parts(
            max_requests,
            Arc::new(InMemoryWindowStore::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(
        max_requests: u32,
        store: Arc<dyn WindowStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let next_sweep_ms = clock.now_ms() + WINDOW.as_millis() as u64;
        Self {
            store,
            clock,
            max_requests,
            next_sweep_ms: AtomicU64::new(next_sweep_ms),
        }
    }

    /// Count one request for `client` and decide whether to admit it.
    pub fn check(&self, client: &str) -> RateDecision {
        let now = self.clock.now_ms();
        let max = self.max_requests;
        let mut decision = RateDecision {
            admitted: false,
            remaining: 0,
            reset_at_ms: now,
        };

        self.store.modify(client, &mut |slot: &mut Option<RateWindow>| {
            decision = step(slot, now, max);
        });

        // The entry lock is released by now; sweeping while holding it
        // would deadlock on the same shard.
        self.maybe_sweep(now);

        if !decision.admitted {
            tracing::debug!(client = %client, reset_at = decision.reset_at_secs(), "Rate window exhausted");
        }
        decision
    }

    /// Evict stale windows at most once per window length.
    fn maybe_sweep(&self, now: u64) {
        let due = self.next_sweep_ms.load(Ordering::Relaxed);
        if now < due {
            return;
        }
        let next = now + WINDOW.as_millis() as u64;
        if self
            .next_sweep_ms
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            // Another request won the race and is sweeping.
            return;
        }
        let evicted = self.store.evict_expired(now);
        let remaining = self.store.len();
        metrics::record_rate_windows(remaining);
        if evicted > 0 {
            tracing::debug!(evicted, remaining, "Evicted stale rate windows");
        }
    }
}

/// Apply one request to a client's slot.
fn step(slot: &mut Option<RateWindow>, now_ms: u64, max: u32) -> RateDecision {
    if let Some(window) = slot.as_mut().filter(|w| !w.is_expired(now_ms)) {
        if window.count >= max {
            return RateDecision {
                admitted: false,
                remaining: 0,
                reset_at_ms: window.reset_at_ms,
            };
        }
        window.count += 1;
        return RateDecision {
            admitted: true,
            remaining: max - window.count,
            reset_at_ms: window.reset_at_ms,
        };
    }

    let window = RateWindow {
        count: 1,
        reset_at_ms: now_ms + WINDOW.as_millis() as u64,
    };
    *slot = Some(window);
    RateDecision {
        admitted: true,
        remaining: max.saturating_sub(1),
        reset_at_ms: window.reset_at_ms,
    }
}
