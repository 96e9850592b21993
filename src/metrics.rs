// Session metrics
//
// Lightweight counters for one `run`/`build` session, logged on shutdown

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Build session metrics
///
/// Uses atomics so the player monitor tasks can record exits without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Build cycles started
    pub cycles_started: AtomicUsize,

    /// Build cycles that produced a cartridge
    pub cycles_succeeded: AtomicUsize,

    /// Build cycles aborted by a stage error
    pub cycles_failed: AtomicUsize,

    /// Total build time of finished cycles in milliseconds
    pub total_build_time_ms: AtomicU64,

    /// Player processes started
    pub player_launches: AtomicUsize,

    /// Player processes that exited on their own with a non-zero status
    pub player_failures: AtomicUsize,

    /// Session start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            cycles_started: AtomicUsize::new(0),
            cycles_succeeded: AtomicUsize::new(0),
            cycles_failed: AtomicUsize::new(0),
            total_build_time_ms: AtomicU64::new(0),
            player_launches: AtomicUsize::new(0),
            player_failures: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished cycle and its duration
    pub fn record_cycle_finished(&self, success: bool, duration: Duration) {
        if success {
            self.cycles_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_build_time_ms
            .fetch_add(
                u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                Ordering::Relaxed,
            );
    }

    pub fn record_player_launch(&self) {
        self.player_launches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_player_failure(&self) {
        self.player_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get average build time per finished cycle in milliseconds
    pub fn avg_build_time_ms(&self) -> f64 {
        let total = self.total_build_time_ms.load(Ordering::Relaxed);
        let count = self.cycles_succeeded.load(Ordering::Relaxed)
            + self.cycles_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Cycles: {} started, {} succeeded, {} failed (avg: {:.0}ms)",
            self.cycles_started.load(Ordering::Relaxed),
            self.cycles_succeeded.load(Ordering::Relaxed),
            self.cycles_failed.load(Ordering::Relaxed),
            self.avg_build_time_ms()
        );
        tracing::info!(
            "Player: {} launches, {} non-zero exits",
            self.player_launches.load(Ordering::Relaxed),
            self.player_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.cycles_started.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.player_launches.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_cycles() {
        let metrics = Metrics::new();

        metrics.record_cycle_started();
        metrics.record_cycle_finished(true, Duration::from_millis(100));
        metrics.record_cycle_started();
        metrics.record_cycle_finished(false, Duration::from_millis(200));

        assert_eq!(metrics.cycles_started.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.cycles_succeeded.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.cycles_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_build_time_ms.load(Ordering::Relaxed), 300);
        assert_eq!(metrics.avg_build_time_ms(), 150.0);
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let metrics = Metrics::new();
        metrics.record_cycle_finished(true, Duration::MAX);
        assert_eq!(metrics.total_build_time_ms.load(Ordering::Relaxed), u64::MAX);
    }

    #[test]
    fn test_avg_build_time_no_cycles() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_build_time_ms(), 0.0);
    }

    #[test]
    fn test_player_counters() {
        let metrics = Metrics::new();

        metrics.record_player_launch();
        metrics.record_player_launch();
        metrics.record_player_failure();

        assert_eq!(metrics.player_launches.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.player_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
