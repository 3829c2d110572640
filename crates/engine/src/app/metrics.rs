use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

static POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_poison_once(operation: &'static str) {
    if !POISON_WARNED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_poisoned");
    }
}

/// Tick-rate figures for the last reporting window plus run-wide totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoopMetricsSnapshot {
    pub tps: f32,
    pub tick_time_ms: f32,
    pub worst_tick_ms: f32,
    pub entity_count: usize,
    pub peak_entity_count: usize,
    pub ticks_total: u64,
}

/// Latest published snapshot, readable from outside the loop.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.latest.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = match self.latest.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_poison_once("write");
                poisoned.into_inner()
            }
        };
        *guard = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    interval: Duration,
    window_ticks: u32,
    window_busy: Duration,
    window_worst: Duration,
    entity_count: usize,
    peak_entity_count: usize,
    ticks_total: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub(crate) fn starting_at(start: Instant, interval: Duration) -> Self {
        Self {
            window_start: start,
            interval,
            window_ticks: 0,
            window_busy: Duration::ZERO,
            window_worst: Duration::ZERO,
            entity_count: 0,
            peak_entity_count: 0,
            ticks_total: 0,
        }
    }

    pub(crate) fn record_tick(&mut self, busy: Duration, entity_count: usize) {
        self.window_ticks = self.window_ticks.saturating_add(1);
        self.window_busy = self.window_busy.saturating_add(busy);
        self.window_worst = self.window_worst.max(busy);
        self.entity_count = entity_count;
        self.peak_entity_count = self.peak_entity_count.max(entity_count);
        self.ticks_total = self.ticks_total.saturating_add(1);
    }

    /// Closes the window once `interval` has passed since it opened.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        if now.saturating_duration_since(self.window_start) < self.interval {
            return None;
        }
        Some(self.flush(now))
    }

    /// Closes the current window regardless of its length.
    pub(crate) fn flush(&mut self, now: Instant) -> LoopMetricsSnapshot {
        let elapsed = now
            .saturating_duration_since(self.window_start)
            .as_secs_f32()
            .max(f32::EPSILON);
        let tick_time_ms = match self.window_ticks {
            0 => 0.0,
            ticks => self.window_busy.as_secs_f32() * 1000.0 / ticks as f32,
        };
        let snapshot = LoopMetricsSnapshot {
            tps: self.window_ticks as f32 / elapsed,
            tick_time_ms,
            worst_tick_ms: self.window_worst.as_secs_f32() * 1000.0,
            entity_count: self.entity_count,
            peak_entity_count: self.peak_entity_count,
            ticks_total: self.ticks_total,
        };

        self.window_start = now;
        self.window_ticks = 0;
        self.window_busy = Duration::ZERO;
        self.window_worst = Duration::ZERO;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn poison(handle: &MetricsHandle) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = handle.latest.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn window_reports_rate_average_and_worst_tick() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        for (millis, entities) in [(2, 10), (6, 14), (1, 12), (3, 12)] {
            accumulator.record_tick(Duration::from_millis(millis), entities);
        }

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("window closed");

        assert!((snapshot.tps - 4.0).abs() < 0.05);
        assert!((snapshot.tick_time_ms - 3.0).abs() < 0.001);
        assert!((snapshot.worst_tick_ms - 6.0).abs() < 0.001);
        assert_eq!(snapshot.entity_count, 12);
        assert_eq!(snapshot.peak_entity_count, 14);
        assert_eq!(snapshot.ticks_total, 4);
    }

    #[test]
    fn window_stays_open_until_the_interval_passes() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        accumulator.record_tick(Duration::from_millis(16), 3);

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500))
            .is_none());
    }

    #[test]
    fn totals_survive_a_window_reset() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        accumulator.record_tick(Duration::from_millis(1), 20);
        accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("first");

        let second = accumulator.flush(base + Duration::from_secs(2));
        assert_eq!(second.tps, 0.0);
        assert_eq!(second.tick_time_ms, 0.0);
        assert_eq!(second.worst_tick_ms, 0.0);
        assert_eq!(second.peak_entity_count, 20);
        assert_eq!(second.ticks_total, 1);
    }

    #[test]
    fn poisoned_handle_still_reads_and_publishes() {
        let handle = MetricsHandle::default();
        poison(&handle);
        assert_eq!(handle.snapshot(), LoopMetricsSnapshot::default());

        let expected = LoopMetricsSnapshot {
            tps: 60.0,
            ticks_total: 600,
            ..LoopMetricsSnapshot::default()
        };
        handle.publish(expected);
        assert_eq!(handle.snapshot(), expected);
    }
}
