//! Performance simulation: latency distributions and throughput.
//!
//! Each operation takes the pattern's base latency times a framework
//! multiplier (ADK 0.85, CrewAI 1.15) times a uniform ±20% variation, and
//! fails with a configured probability. Operations are paced with real
//! tokio sleeps on a bounded worker pool so that throughput reflects the
//! pool size; `time_scale` shrinks the sleeps without changing the
//! reported numbers.

use crate::catalog::PatternMeta;
use crate::model::{LatencyStats, PerformanceMetrics};
use crate::BenchError;
use patternlab_config::BenchConfig;
use patternlab_core::Framework;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct PerfSettings {
    /// Upper bound on concurrently sleeping operations
    pub max_workers: usize,
    /// Probability that an operation is recorded as failed
    pub failure_rate: f64,
    /// Multiplier applied to every sleep; 1.0 is real time
    pub time_scale: f64,
    /// Fixed seed for reproducible samples
    pub seed: Option<u64>,
}

impl Default for PerfSettings {
    fn default() -> Self {
        Self {
            max_workers: 10,
            failure_rate: 0.05,
            time_scale: 1.0,
            seed: None,
        }
    }
}

impl From<&BenchConfig> for PerfSettings {
    fn from(cfg: &BenchConfig) -> Self {
        Self {
            max_workers: cfg.max_workers,
            failure_rate: cfg.failure_rate,
            time_scale: cfg.time_scale,
            seed: cfg.seed,
        }
    }
}

/// ADK and CrewAI metrics for one pattern at one load level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfComparison {
    pub pattern: &'static str,
    pub load_level: u32,
    pub adk: PerformanceMetrics,
    pub crewai: PerformanceMetrics,
}

impl PerfComparison {
    pub fn metrics(&self) -> [&PerformanceMetrics; 2] {
        [&self.adk, &self.crewai]
    }
}

pub struct PerformanceSimulator {
    settings: PerfSettings,
    rng: StdRng,
}

impl PerformanceSimulator {
    pub fn new(settings: PerfSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { settings, rng }
    }

    pub fn settings(&self) -> &PerfSettings {
        &self.settings
    }

    pub fn framework_multiplier(framework: Framework) -> f64 {
        match framework {
            Framework::Adk => 0.85,
            Framework::CrewAi => 1.15,
        }
    }

    /// Draw `(latency_ms, success)` for one operation.
    fn sample_operation(&mut self, pattern: &PatternMeta, framework: Framework) -> (f64, bool) {
        let variation: f64 = self.rng.random_range(0.8..1.2);
        let latency = pattern.base_latency_ms * Self::framework_multiplier(framework) * variation;
        let success = self.rng.random::<f64>() > self.settings.failure_rate;
        (latency, success)
    }

    /// Sleep every latency on a pool of at most `workers` tasks and return
    /// the wall time taken.
    async fn pace(latencies: &[f64], workers: usize, time_scale: f64) -> Result<Duration, BenchError> {
        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut tasks = JoinSet::new();
        let start = Instant::now();

        for &latency in latencies {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| BenchError::Worker(e.to_string()))?;
            let nap = Duration::try_from_secs_f64((latency * time_scale / 1000.0).max(0.0))
                .map_err(|e| BenchError::InvalidTimeScale(format!("{time_scale}: {e}")))?;
            tasks.spawn(async move {
                tokio::time::sleep(nap).await;
                drop(permit);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| BenchError::Worker(e.to_string()))?;
        }

        Ok(start.elapsed())
    }

    /// Simulate `iterations × load_level` operations of one pattern.
    pub async fn benchmark_pattern(
        &mut self,
        pattern: &PatternMeta,
        framework: Framework,
        load_level: u32,
    ) -> Result<PerformanceMetrics, BenchError> {
        if load_level == 0 {
            return Err(BenchError::InvalidLoad("load level must be at least 1".into()));
        }
        let time_scale = self.settings.time_scale;
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(BenchError::InvalidTimeScale(format!(
                "{time_scale} (expected a finite number > 0)"
            )));
        }

        let total_operations = u64::from(pattern.iterations) * u64::from(load_level);
        let samples: Vec<(f64, bool)> = (0..total_operations)
            .map(|_| self.sample_operation(pattern, framework))
            .collect();
        let latencies: Vec<f64> = samples.iter().map(|(l, _)| *l).collect();

        let workers = self.settings.max_workers.min(samples.len());
        let elapsed = Self::pace(&latencies, workers, self.settings.time_scale).await?;
        let execution_time_ms = elapsed.as_secs_f64() * 1000.0 / self.settings.time_scale;

        let throughput_ops_per_sec = if execution_time_ms > 0.0 {
            total_operations as f64 / (execution_time_ms / 1000.0)
        } else {
            0.0
        };
        let success_rate = if samples.is_empty() {
            0.0
        } else {
            samples.iter().filter(|(_, ok)| *ok).count() as f64 / samples.len() as f64
        };

        debug!(
            pattern = pattern.key,
            framework = %framework,
            load_level,
            execution_time_ms,
            "Performance sample"
        );

        Ok(PerformanceMetrics {
            pattern_name: pattern.name.to_string(),
            framework,
            load_level,
            iterations: pattern.iterations,
            total_operations,
            execution_time_ms,
            throughput_ops_per_sec,
            latency: LatencyStats::from_samples(&latencies),
            success_rate,
        })
    }

    /// Both frameworks for every pattern at every load level.
    pub async fn run_comparison(
        &mut self,
        patterns: &[&'static PatternMeta],
        load_levels: &[u32],
    ) -> Result<Vec<PerfComparison>, BenchError> {
        let total = patterns.len() * load_levels.len() * 2;
        let mut done = 0;
        let mut results = Vec::with_capacity(patterns.len() * load_levels.len());

        for pattern in patterns {
            for &load_level in load_levels {
                info!(
                    "[{}/{}] {} @ load={}",
                    done + 1,
                    total,
                    pattern.name,
                    load_level
                );
                let adk = self.benchmark_pattern(pattern, Framework::Adk, load_level).await?;
                let crewai = self
                    .benchmark_pattern(pattern, Framework::CrewAi, load_level)
                    .await?;
                done += 2;
                results.push(PerfComparison {
                    pattern: pattern.key,
                    load_level,
                    adk,
                    crewai,
                });
            }
        }

        Ok(results)
    }
}

/// Parse a comma-separated list of positive load levels.
pub fn parse_load_levels(raw: &str) -> Result<Vec<u32>, BenchError> {
    let levels = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<u32>() {
            Ok(0) => Err(BenchError::InvalidLoad(format!("'{s}' must be at least 1"))),
            Ok(n) => Ok(n),
            Err(_) => Err(BenchError::InvalidLoad(format!("'{s}' is not a positive integer"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if levels.is_empty() {
        return Err(BenchError::InvalidLoad("at least one load level is required".into()));
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn seeded(seed: u64) -> PerformanceSimulator {
        PerformanceSimulator::new(PerfSettings {
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_ops_take_as_long_as_the_slowest() {
        let mut sim = seeded(7);
        let meta = catalog::get("prioritization").unwrap();
        let m = sim.benchmark_pattern(meta, Framework::Adk, 1).await.unwrap();

        assert_eq!(m.total_operations, 3);
        // three ops fit in one wave of the pool
        assert!(m.execution_time_ms >= m.latency.max_ms - 0.01);
        assert!(m.execution_time_ms < m.latency.max_ms + 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn latencies_stay_in_variation_band() {
        let mut sim = seeded(11);
        let meta = catalog::get("learning_adaptation").unwrap();
        let m = sim.benchmark_pattern(meta, Framework::CrewAi, 2).await.unwrap();

        let base = 850.0 * 1.15;
        assert!(m.latency.min_ms >= base * 0.8);
        assert!(m.latency.max_ms <= base * 1.2);
        assert_eq!(m.total_operations, 20);
        assert!(m.throughput_ops_per_sec > 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn pool_bounds_concurrency() {
        let mut sim = seeded(3);
        let meta = catalog::get("prioritization").unwrap();
        let m = sim.benchmark_pattern(meta, Framework::Adk, 10).await.unwrap();

        // 30 ops on 10 workers need at least three waves
        assert_eq!(m.total_operations, 30);
        assert!(m.execution_time_ms >= 3.0 * m.latency.min_ms);
    }

    #[tokio::test(start_paused = true)]
    async fn single_worker_runs_serially() {
        let mut sim = PerformanceSimulator::new(PerfSettings {
            max_workers: 1,
            seed: Some(5),
            ..Default::default()
        });
        let meta = catalog::get("exception_handling").unwrap();
        let m = sim.benchmark_pattern(meta, Framework::Adk, 1).await.unwrap();

        let serial = m.latency.mean_ms * m.total_operations as f64;
        assert!(m.execution_time_ms >= serial - 0.01);
        assert!(m.execution_time_ms < serial + 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn time_scale_does_not_change_reported_time() {
        let meta = catalog::get("prioritization").unwrap();
        let mut fast = PerformanceSimulator::new(PerfSettings {
            time_scale: 0.5,
            seed: Some(9),
            ..Default::default()
        });
        let started = Instant::now();
        let m = fast.benchmark_pattern(meta, Framework::Adk, 1).await.unwrap();
        let wall_ms = started.elapsed().as_secs_f64() * 1000.0;

        assert!(wall_ms < m.latency.max_ms * 0.5 + 5.0);
        assert!(m.execution_time_ms >= m.latency.max_ms - 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn unusable_time_scale_is_an_error() {
        let meta = catalog::get("prioritization").unwrap();
        for time_scale in [f64::INFINITY, f64::NAN, -1.0, 1e300] {
            let mut sim = PerformanceSimulator::new(PerfSettings {
                time_scale,
                seed: Some(2),
                ..Default::default()
            });
            let err = sim.benchmark_pattern(meta, Framework::Adk, 1).await.unwrap_err();
            assert!(matches!(err, BenchError::InvalidTimeScale(_)), "{time_scale}: {err}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn same_seed_same_samples() {
        let meta = catalog::get("goal_monitoring").unwrap();
        let a = seeded(42).benchmark_pattern(meta, Framework::Adk, 1).await.unwrap();
        let b = seeded(42).benchmark_pattern(meta, Framework::Adk, 1).await.unwrap();
        assert_eq!(a.latency, b.latency);
        assert_eq!(a.success_rate, b.success_rate);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_rate_extremes() {
        let meta = catalog::get("prioritization").unwrap();
        let mut never = PerformanceSimulator::new(PerfSettings {
            failure_rate: 0.0,
            seed: Some(1),
            ..Default::default()
        });
        let mut always = PerformanceSimulator::new(PerfSettings {
            failure_rate: 1.0,
            seed: Some(1),
            ..Default::default()
        });
        assert_eq!(never.benchmark_pattern(meta, Framework::Adk, 1).await.unwrap().success_rate, 1.0);
        assert_eq!(always.benchmark_pattern(meta, Framework::Adk, 1).await.unwrap().success_rate, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn comparison_covers_every_load() {
        let mut sim = seeded(1);
        let patterns = catalog::parse_filter(Some("prioritization")).unwrap();
        let results = sim.run_comparison(&patterns, &[1, 2]).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].load_level, 2);
        assert_eq!(results[1].crewai.total_operations, 6);
    }

    #[tokio::test]
    async fn zero_load_rejected() {
        let mut sim = seeded(1);
        let meta = catalog::get("prioritization").unwrap();
        assert!(matches!(
            sim.benchmark_pattern(meta, Framework::Adk, 0).await,
            Err(BenchError::InvalidLoad(_))
        ));
    }

    #[test]
    fn load_levels_parse() {
        assert_eq!(parse_load_levels("1, 5,10").unwrap(), vec![1, 5, 10]);
        assert!(parse_load_levels("1,0").is_err());
        assert!(parse_load_levels("one").is_err());
        assert!(parse_load_levels(" , ").is_err());
    }
}
