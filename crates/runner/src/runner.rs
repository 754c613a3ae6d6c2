//! Sequential test runner.

use crate::discovery::PatternScript;
use crate::exec::{Executor, ProcessExecutor, RunOutcome, RunStatus};
use crate::limiter::RateLimiter;
use chrono::{DateTime, Utc};
use patternlab_config::RunnerConfig;
use patternlab_core::Framework;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ScriptResult {
    pub script: PatternScript,
    pub outcome: RunOutcome,
}

/// Pass/fail/timeout counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameworkTally {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timeout: usize,
}

impl FrameworkTally {
    fn add(&mut self, status: RunStatus) {
        self.total += 1;
        match status {
            RunStatus::Pass => self.passed += 1,
            RunStatus::Fail => self.failed += 1,
            RunStatus::Timeout => self.timeout += 1,
        }
    }

    /// Percentage of passing scripts; 0 for an empty tally.
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<ScriptResult>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, result: ScriptResult) {
        self.results.push(result);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn tally(&self, framework: Framework) -> FrameworkTally {
        let mut tally = FrameworkTally::default();
        for r in self.results.iter().filter(|r| r.script.framework == framework) {
            tally.add(r.outcome.status);
        }
        tally
    }

    pub fn totals(&self) -> FrameworkTally {
        let mut tally = FrameworkTally::default();
        for r in &self.results {
            tally.add(r.outcome.status);
        }
        tally
    }

    /// Results grouped by category, categories sorted.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&ScriptResult>> {
        let mut groups: BTreeMap<&str, Vec<&ScriptResult>> = BTreeMap::new();
        for r in &self.results {
            groups.entry(r.script.category.as_str()).or_default().push(r);
        }
        groups
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScriptResult> {
        self.results.iter().filter(|r| !r.outcome.passed())
    }

    pub fn all_passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs scripts one after another with a fixed delay between launches.
pub struct TestRunner {
    executor: Box<dyn Executor>,
    config: RunnerConfig,
    limiter: RateLimiter,
}

impl TestRunner {
    pub fn new(executor: Box<dyn Executor>, config: RunnerConfig) -> Self {
        let limiter = RateLimiter::per_minute(config.max_runs_per_minute);
        Self {
            executor,
            config,
            limiter,
        }
    }

    /// Runner that launches `<interpreter> <script>` processes.
    pub fn from_config(config: &RunnerConfig) -> Self {
        let executor = ProcessExecutor::new(&config.interpreter, config.script_env());
        Self::new(Box::new(executor), config.clone())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.config.delay_ms)
    }

    pub async fn run_one(&self, script: &PatternScript) -> ScriptResult {
        let timeout = self.config.timeout_for(&script.relative);
        self.limiter.acquire().await;

        info!(script = %script.relative, timeout_secs = timeout.as_secs(), "Running pattern");
        let outcome = self.executor.execute(&script.path, timeout).await;

        match outcome.status {
            RunStatus::Pass => {
                info!(script = %script.relative, secs = outcome.duration_secs, "Passed");
            }
            RunStatus::Fail => {
                warn!(script = %script.relative, exit_code = ?outcome.exit_code, "Failed");
            }
            RunStatus::Timeout => {
                warn!(script = %script.relative, timeout_secs = timeout.as_secs(), "Timed out");
            }
        }

        ScriptResult {
            script: script.clone(),
            outcome,
        }
    }

    /// Run every script in order. Never stops early.
    pub async fn run(&self, scripts: &[PatternScript]) -> RunSummary {
        let mut summary = RunSummary::new();
        let delay = self.delay();

        for (i, script) in scripts.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            summary.record(self.run_one(script).await);
        }

        summary.finish();
        let totals = summary.totals();
        info!(
            total = totals.total,
            passed = totals.passed,
            failed = totals.failed,
            timeout = totals.timeout,
            "Run complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls(Mutex<Vec<(PathBuf, Duration)>>);

    /// Fails scripts whose name contains "boom", times out "hang".
    struct FakeExecutor {
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl Executor for FakeExecutor {
        async fn execute(&self, script: &Path, timeout: Duration) -> RunOutcome {
            self.calls.0.lock().unwrap().push((script.to_path_buf(), timeout));
            let name = script.to_string_lossy();
            if name.contains("boom") {
                RunOutcome {
                    status: RunStatus::Fail,
                    exit_code: Some(1),
                    duration_secs: 0.5,
                    error: Some("Traceback (most recent call last):\nValueError".into()),
                    output_tail: String::new(),
                }
            } else if name.contains("hang") {
                RunOutcome::timed_out(timeout, timeout)
            } else {
                RunOutcome {
                    status: RunStatus::Pass,
                    exit_code: Some(0),
                    duration_secs: 1.0,
                    error: None,
                    output_tail: "done".into(),
                }
            }
        }
    }

    fn script(relative: &str, framework: Framework) -> PatternScript {
        PatternScript {
            relative: relative.to_string(),
            category: relative.split('/').next().unwrap().to_string(),
            framework,
            path: PathBuf::from("/catalog").join(relative),
        }
    }

    fn scripts() -> Vec<PatternScript> {
        vec![
            script("1-foundational/adk-examples/01_simple_agent.py", Framework::Adk),
            script("1-foundational/crewai-examples/02_boom.py", Framework::CrewAi),
            script("3-intelligence/adk-examples/learning_agents/01_hang.py", Framework::Adk),
        ]
    }

    fn runner(calls: Arc<Calls>, delay_ms: u64) -> TestRunner {
        let config = RunnerConfig {
            delay_ms,
            ..RunnerConfig::default()
        };
        TestRunner::new(Box::new(FakeExecutor { calls }), config)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_all_scripts_in_order_and_tallies() {
        let calls = Arc::new(Calls::default());
        let summary = runner(calls.clone(), 0).run(&scripts()).await;

        assert_eq!(summary.results.len(), 3);
        assert_eq!(
            summary.tally(Framework::Adk),
            FrameworkTally { total: 2, passed: 1, failed: 0, timeout: 1 }
        );
        assert_eq!(
            summary.tally(Framework::CrewAi),
            FrameworkTally { total: 1, passed: 0, failed: 1, timeout: 0 }
        );
        assert_eq!(summary.totals().total, 3);
        assert_eq!(summary.failures().count(), 2);
        assert!(!summary.all_passed());
        assert!(summary.finished_at.is_some());

        let recorded = calls.0.lock().unwrap();
        assert!(recorded[0].0.ends_with("01_simple_agent.py"));
        assert!(recorded[2].0.ends_with("01_hang.py"));
    }

    #[tokio::test(start_paused = true)]
    async fn per_pattern_timeouts_come_from_config() {
        let calls = Arc::new(Calls::default());
        let summary = runner(calls.clone(), 0).run(&scripts()).await;

        let recorded = calls.0.lock().unwrap();
        assert_eq!(recorded[0].1, Duration::from_secs(180));
        assert_eq!(recorded[2].1, Duration::from_secs(400));
        assert_eq!(
            summary.results[2].outcome.error.as_deref(),
            Some("Timeout after 400 seconds")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delay_between_scripts_not_after_last() {
        let calls = Arc::new(Calls::default());
        let start = tokio::time::Instant::now();
        runner(calls, 2000).run(&scripts()).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn empty_run_is_all_passed() {
        let summary = runner(Arc::new(Calls::default()), 0).run(&[]).await;
        assert!(summary.all_passed());
        assert_eq!(summary.totals().pass_rate(), 0.0);
    }

    #[test]
    fn grouping_by_category() {
        let mut summary = RunSummary::new();
        for s in scripts() {
            summary.record(ScriptResult {
                script: s,
                outcome: RunOutcome::launch_failed("x"),
            });
        }
        let groups = summary.by_category();
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["1-foundational", "3-intelligence"]);
        assert_eq!(groups["1-foundational"].len(), 2);
    }

    #[test]
    fn pass_rate() {
        let tally = FrameworkTally { total: 4, passed: 3, failed: 1, timeout: 0 };
        assert_eq!(tally.pass_rate(), 75.0);
    }
}
