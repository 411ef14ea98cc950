//! Runtime metrics for the speech decision pipeline.
//!
//! Each speaker's pass runs on one thread. Counters are `AtomicU64`s behind
//! an `Arc` so several speakers, or a host exporting them, can share one set
//! without `&mut` access. Pass timing history sits behind a
//! `parking_lot::Mutex` and is only read when exporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Counters (lock-free)
// ---------------------------------------------------------------------------

/// Atomic counters for decision-pass events.
pub struct SpeechCounters {
    /// Decision passes that ran (cooldown elapsed, not suppressed).
    pub passes: AtomicU64,
    /// Passes skipped because of a scripted sequence or no-target.
    pub suppressed: AtomicU64,
    /// Lines actually spoken.
    pub utterances: AtomicU64,
    /// Speech attempts refused by gating.
    pub gated: AtomicU64,
    /// Speech attempts the resolver had no line for.
    pub resolver_misses: AtomicU64,
    /// Sound reactions that passed the originator filter and were tried.
    pub reactions: AtomicU64,
    /// Ambient chatter rolls made.
    pub chatter_rolls: AtomicU64,
    /// Ambient chatter rolls that fired.
    pub chatter_hits: AtomicU64,
}

impl SpeechCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            utterances: AtomicU64::new(0),
            gated: AtomicU64::new(0),
            resolver_misses: AtomicU64::new(0),
            reactions: AtomicU64::new(0),
            chatter_rolls: AtomicU64::new(0),
            chatter_hits: AtomicU64::new(0),
        }
    }

    /// Increment one counter.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            passes: self.passes.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            utterances: self.utterances.load(Ordering::Relaxed),
            gated: self.gated.load(Ordering::Relaxed),
            resolver_misses: self.resolver_misses.load(Ordering::Relaxed),
            reactions: self.reactions.load(Ordering::Relaxed),
            chatter_rolls: self.chatter_rolls.load(Ordering::Relaxed),
            chatter_hits: self.chatter_hits.load(Ordering::Relaxed),
        }
    }
}

impl Default for SpeechCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SpeechCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.snapshot().fmt(f)
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Decision passes run.
    pub passes: u64,
    /// Passes suppressed.
    pub suppressed: u64,
    /// Lines spoken.
    pub utterances: u64,
    /// Gating misses.
    pub gated: u64,
    /// Resolver misses.
    pub resolver_misses: u64,
    /// Sound reactions that passed the originator filter and were tried.
    pub reactions: u64,
    /// Chatter rolls.
    pub chatter_rolls: u64,
    /// Chatter rolls that fired.
    pub chatter_hits: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("passes", "Decision passes run", self.passes),
            ("suppressed", "Decision passes suppressed", self.suppressed),
            ("utterances", "Lines spoken", self.utterances),
            ("gated", "Speech attempts refused by gating", self.gated),
            ("resolver_misses", "Speech attempts with no matching line", self.resolver_misses),
            ("reactions", "Sound reactions that passed the originator filter", self.reactions),
            ("chatter_rolls", "Ambient chatter rolls", self.chatter_rolls),
            ("chatter_hits", "Ambient chatter rolls that fired", self.chatter_hits),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP barks_{name}_total {help}\n# TYPE barks_{name}_total counter\nbarks_{name}_total {value}\n"
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Pass Budget Monitor
// ---------------------------------------------------------------------------

const HISTORY_LEN: usize = 256;

/// Tracks how long decision passes take against a per-pass budget.
pub struct PassBudgetMonitor {
    budget_ms: f64,
    history: Mutex<PassHistory>,
}

struct PassHistory {
    timings: Vec<f64>,
    write_idx: usize,
    count: u64,
    last_over_budget: bool,
}

impl PassBudgetMonitor {
    /// Create a monitor with the given budget (milliseconds).
    #[must_use]
    pub fn new(budget_ms: f64) -> Self {
        Self {
            budget_ms,
            history: Mutex::new(PassHistory {
                timings: vec![0.0; HISTORY_LEN],
                write_idx: 0,
                count: 0,
                last_over_budget: false,
            }),
        }
    }

    /// Begin timing a pass. The guard records elapsed time on drop.
    pub fn begin_pass(&self) -> PassGuard<'_> {
        PassGuard {
            monitor: self,
            start: Instant::now(),
        }
    }

    /// Record a pass timing manually (milliseconds).
    pub fn record(&self, ms: f64) {
        let mut h = self.history.lock();
        let idx = h.write_idx;
        h.timings[idx] = ms;
        h.write_idx = (idx + 1) % HISTORY_LEN;
        h.count += 1;
        h.last_over_budget = ms > self.budget_ms;
    }

    /// Whether the last pass exceeded the budget.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.history.lock().last_over_budget
    }

    /// Total passes recorded.
    #[must_use]
    pub fn pass_count(&self) -> u64 {
        self.history.lock().count
    }

    /// The configured budget in milliseconds.
    #[must_use]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    /// P50, P95, P99 and max over the recorded history (milliseconds).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn percentiles(&self) -> PassPercentiles {
        let h = self.history.lock();
        let n = usize::try_from(h.count).map_or(HISTORY_LEN, |c| c.min(HISTORY_LEN));
        if n == 0 {
            return PassPercentiles::default();
        }
        let mut sorted = h.timings[..n].to_vec();
        sorted.sort_by(f64::total_cmp);
        let at = |q: f64| sorted[((n as f64 * q) as usize).min(n - 1)];
        let over = sorted.iter().filter(|&&t| t > self.budget_ms).count();
        PassPercentiles {
            p50: at(0.5),
            p95: at(0.95),
            p99: at(0.99),
            max: sorted[n - 1],
            over_budget_ratio: over as f64 / n as f64,
        }
    }
}

impl std::fmt::Debug for PassBudgetMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassBudgetMonitor")
            .field("budget_ms", &self.budget_ms)
            .field("passes", &self.pass_count())
            .finish_non_exhaustive()
    }
}

/// RAII guard that records elapsed time when dropped.
pub struct PassGuard<'a> {
    monitor: &'a PassBudgetMonitor,
    start: Instant,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        self.monitor.record(ms);
    }
}

/// Percentile statistics for pass timings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassPercentiles {
    /// Median in milliseconds.
    pub p50: f64,
    /// 95th percentile in milliseconds.
    pub p95: f64,
    /// 99th percentile in milliseconds.
    pub p99: f64,
    /// Maximum observed timing.
    pub max: f64,
    /// Ratio of passes over budget (0.0–1.0).
    pub over_budget_ratio: f64,
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One speech decision pass.
    pub const DECISION_PASS: &str = "barks::decision";
    /// Mob detector scan.
    pub const MOB_SCAN: &str = "barks::mob";
    /// Sensing sub-agent think.
    pub const AGENT_THINK: &str = "barks::agent";
    /// Schedule engine step.
    pub const SCHEDULE_STEP: &str = "barks::schedule";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_and_snapshot() {
        let c = SpeechCounters::new();
        SpeechCounters::bump(&c.passes);
        SpeechCounters::bump(&c.passes);
        SpeechCounters::bump(&c.chatter_hits);
        let snap = c.snapshot();
        assert_eq!(snap.passes, 2);
        assert_eq!(snap.chatter_hits, 1);
        assert_eq!(snap.utterances, 0);
    }

    #[test]
    fn prometheus_format() {
        let snap = CounterSnapshot {
            utterances: 3,
            ..CounterSnapshot::default()
        };
        let text = snap.to_prometheus();
        assert!(text.contains("# TYPE barks_utterances_total counter"));
        assert!(text.contains("barks_utterances_total 3\n"));
    }

    #[test]
    fn percentiles_over_history() {
        let monitor = PassBudgetMonitor::new(1.0);
        for i in 1..=100 {
            monitor.record(f64::from(i) / 100.0);
        }
        monitor.record(2.0);
        assert!(monitor.is_over_budget());
        assert_eq!(monitor.pass_count(), 101);
        let p = monitor.percentiles();
        assert!((p.max - 2.0).abs() < f64::EPSILON);
        assert!(p.p50 > 0.4 && p.p50 < 0.6);
        assert!(p.over_budget_ratio > 0.0);
    }

    #[test]
    fn empty_monitor_is_zero() {
        let monitor = PassBudgetMonitor::new(1.0);
        assert!(monitor.percentiles().max.abs() < f64::EPSILON);
        {
            let _guard = monitor.begin_pass();
        }
        assert_eq!(monitor.pass_count(), 1);
    }
}
