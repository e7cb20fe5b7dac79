//! Per-call performance accounting, partitioned by pipeline phase.
//!
//! Initial generation and feedback refinement have materially different
//! cost profiles (a full table scan vs. one short refinement), so their
//! samples are kept in separate sequences and never averaged together.
//! Grand totals are sums only.

use serde::{Deserialize, Serialize};

/// Which cohort an inference call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// First-time schema generation (table analysis included).
    Initial,
    /// A feedback-driven refinement round.
    Feedback,
}

/// One inference-call observation. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSample {
    pub latency_seconds: f64,
    /// Resident-memory delta reported by the caller's instrumentation;
    /// 0.0 when not measured.
    pub memory_delta_mb: f64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Which agent made the call (e.g. "schema_generator").
    pub agent_label: String,
    pub phase: Phase,
}

/// Accumulates samples per phase.
///
/// Recording takes `&mut self`; a ledger shared across concurrent sessions
/// must be wrapped in a mutex so appends are serialized.
#[derive(Debug, Default)]
pub struct MetricsLedger {
    initial: Vec<MetricsSample>,
    feedback: Vec<MetricsSample>,
}

/// Aggregates for one phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub count: usize,
    pub total_latency_seconds: f64,
    pub mean_latency_seconds: f64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl PhaseSummary {
    fn from_samples(samples: &[MetricsSample]) -> Self {
        let count = samples.len();
        let total_latency_seconds: f64 = samples.iter().map(|s| s.latency_seconds).sum();
        Self {
            count,
            total_latency_seconds,
            mean_latency_seconds: if count == 0 {
                0.0
            } else {
                total_latency_seconds / count as f64
            },
            prompt_tokens: samples.iter().map(|s| s.prompt_tokens).sum(),
            completion_tokens: samples.iter().map(|s| s.completion_tokens).sum(),
            total_tokens: samples.iter().map(|s| s.total_tokens).sum(),
        }
    }
}

/// Full report: per-phase summaries plus grand totals (sums, no
/// cross-phase averaging).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub initial: PhaseSummary,
    pub feedback: PhaseSummary,
    pub total_calls: usize,
    pub total_latency_seconds: f64,
    pub total_tokens: u64,
}

impl MetricsLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample to its phase's sequence.
    pub fn record(&mut self, sample: MetricsSample) {
        match sample.phase {
            Phase::Initial => self.initial.push(sample),
            Phase::Feedback => self.feedback.push(sample),
        }
    }

    /// Samples recorded for a phase, in record order.
    pub fn samples(&self, phase: Phase) -> &[MetricsSample] {
        match phase {
            Phase::Initial => &self.initial,
            Phase::Feedback => &self.feedback,
        }
    }

    /// Build the aggregate report.
    pub fn report(&self) -> MetricsReport {
        let initial = PhaseSummary::from_samples(&self.initial);
        let feedback = PhaseSummary::from_samples(&self.feedback);
        let total_calls = initial.count + feedback.count;
        let total_latency_seconds = initial.total_latency_seconds + feedback.total_latency_seconds;
        let total_tokens = initial.total_tokens + feedback.total_tokens;

        MetricsReport {
            initial,
            feedback,
            total_calls,
            total_latency_seconds,
            total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(latency: f64, tokens: u64, phase: Phase) -> MetricsSample {
        MetricsSample {
            latency_seconds: latency,
            memory_delta_mb: 0.0,
            prompt_tokens: tokens / 2,
            completion_tokens: tokens - tokens / 2,
            total_tokens: tokens,
            agent_label: "test".to_string(),
            phase,
        }
    }

    #[test]
    fn test_phases_kept_separate() {
        let mut ledger = MetricsLedger::new();
        ledger.record(sample(0.1, 100, Phase::Initial));
        ledger.record(sample(0.2, 100, Phase::Initial));
        ledger.record(sample(0.3, 100, Phase::Initial));
        ledger.record(sample(0.4, 50, Phase::Feedback));

        let report = ledger.report();
        assert_eq!(report.initial.count, 3);
        assert!((report.initial.total_latency_seconds - 0.6).abs() < 1e-9);
        assert!((report.initial.mean_latency_seconds - 0.2).abs() < 1e-9);
        assert_eq!(report.feedback.count, 1);
        assert!((report.feedback.total_latency_seconds - 0.4).abs() < 1e-9);
        assert!((report.feedback.mean_latency_seconds - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_grand_totals_are_sums() {
        let mut ledger = MetricsLedger::new();
        ledger.record(sample(1.0, 300, Phase::Initial));
        ledger.record(sample(0.5, 120, Phase::Feedback));

        let report = ledger.report();
        assert_eq!(report.total_calls, 2);
        assert!((report.total_latency_seconds - 1.5).abs() < 1e-9);
        assert_eq!(report.total_tokens, 420);
    }

    #[test]
    fn test_empty_ledger() {
        let report = MetricsLedger::new().report();
        assert_eq!(report.initial.count, 0);
        assert_eq!(report.feedback.count, 0);
        assert_eq!(report.initial.mean_latency_seconds, 0.0);
        assert_eq!(report.total_calls, 0);
    }

    #[test]
    fn test_token_sums_per_phase() {
        let mut ledger = MetricsLedger::new();
        ledger.record(sample(0.1, 10, Phase::Initial));
        ledger.record(sample(0.1, 30, Phase::Initial));

        let report = ledger.report();
        assert_eq!(report.initial.total_tokens, 40);
        assert_eq!(report.feedback.total_tokens, 0);
    }
}
