//! Metric records produced by the simulators.

use patternlab_core::Framework;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    /// Input to output ratio.
    pub fn ratio(&self) -> f64 {
        self.input_tokens as f64 / self.output_tokens.max(1) as f64
    }
}

/// Simulated cost of one pattern on one framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    pub pattern_name: String,
    pub framework: Framework,
    pub model: String,
    pub iterations: u32,
    pub api_calls: u64,
    pub tokens: TokenUsage,
    pub execution_time_ms: f64,
    pub estimated_cost_usd: f64,
    pub cost_per_iteration: f64,
    pub tokens_per_iteration: u64,
}

/// Summary statistics over latency samples, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub stddev_ms: f64,
}

impl LatencyStats {
    /// All zeros for no samples. `stddev_ms` is the sample standard
    /// deviation and is 0 for fewer than two samples.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        let stddev = if n > 1 {
            let var = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Self {
            min_ms: sorted[0],
            max_ms: sorted[n - 1],
            mean_ms: mean,
            median_ms: median,
            p50_ms: percentile(&sorted, 50.0),
            p95_ms: percentile(&sorted, 95.0),
            p99_ms: percentile(&sorted, 99.0),
            stddev_ms: stddev,
        }
    }
}

/// Linear interpolation between the closest ranks of sorted samples.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (sorted.len() - 1) as f64 * pct / 100.0;
    let floor = index.floor() as usize;
    let ceil = floor + 1;
    if ceil >= sorted.len() {
        return sorted[floor.min(sorted.len() - 1)];
    }
    sorted[floor] + (index - floor as f64) * (sorted[ceil] - sorted[floor])
}

/// Simulated performance of one pattern on one framework at one load level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub pattern_name: String,
    pub framework: Framework,
    pub load_level: u32,
    pub iterations: u32,
    pub total_operations: u64,
    pub execution_time_ms: f64,
    pub throughput_ops_per_sec: f64,
    pub latency: LatencyStats,
    pub success_rate: f64,
}
