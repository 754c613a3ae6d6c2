//! Cost simulation: tokens, API calls and dollars per pattern.
//!
//! Per iteration ADK sends 800 input / 400 output tokens and CrewAI 600 / 350,
//! both scaled by the pattern's complexity. ADK makes two calls per
//! iteration, CrewAI three. Execution time charges 800 ms of model latency
//! plus framework overhead (100 / 200 ms) per call, scaled by complexity.

use crate::catalog::PatternMeta;
use crate::model::{CostMetrics, TokenUsage};
use crate::pricing::PricingTable;
use crate::BenchError;
use patternlab_core::Framework;
use serde::Serialize;
use tracing::debug;

const AVG_CALL_LATENCY_MS: f64 = 800.0;

/// ADK and CrewAI metrics for one pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostComparison {
    pub pattern: &'static str,
    pub adk: CostMetrics,
    pub crewai: CostMetrics,
}

impl CostComparison {
    pub fn metrics(&self) -> [&CostMetrics; 2] {
        [&self.adk, &self.crewai]
    }
}

pub struct CostSimulator {
    pricing: PricingTable,
}

impl CostSimulator {
    pub fn new(pricing: PricingTable) -> Self {
        Self { pricing }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn estimate_tokens(pattern: &PatternMeta, framework: Framework) -> TokenUsage {
        let multiplier = pattern.complexity.token_multiplier();
        let (base_in, base_out) = match framework {
            Framework::Adk => (800.0, 400.0),
            Framework::CrewAi => (600.0, 350.0),
        };
        let per_iter_in = (base_in * multiplier) as u64;
        let per_iter_out = (base_out * multiplier) as u64;
        let iterations = u64::from(pattern.iterations);
        TokenUsage::new(per_iter_in * iterations, per_iter_out * iterations)
    }

    pub fn estimate_api_calls(pattern: &PatternMeta, framework: Framework) -> u64 {
        let per_iteration = match framework {
            Framework::Adk => 2,
            Framework::CrewAi => 3,
        };
        u64::from(pattern.iterations) * per_iteration
    }

    pub fn simulate_execution_time(pattern: &PatternMeta, framework: Framework, api_calls: u64) -> f64 {
        let overhead = match framework {
            Framework::Adk => 100.0,
            Framework::CrewAi => 200.0,
        };
        api_calls as f64 * (AVG_CALL_LATENCY_MS + overhead) * pattern.complexity.time_factor()
    }

    /// Metrics for one pattern on one framework.
    pub fn benchmark_pattern(
        &self,
        pattern: &PatternMeta,
        framework: Framework,
        model: &str,
    ) -> Result<CostMetrics, BenchError> {
        let (resolved, pricing) =
            self.pricing
                .resolve(model)
                .ok_or_else(|| BenchError::UnknownModel {
                    model: model.to_string(),
                    known: self.pricing.models(),
                })?;

        let tokens = Self::estimate_tokens(pattern, framework);
        let api_calls = Self::estimate_api_calls(pattern, framework);
        let cost = pricing.cost(tokens.input_tokens, tokens.output_tokens);
        let execution_time_ms = Self::simulate_execution_time(pattern, framework, api_calls);

        let (cost_per_iteration, tokens_per_iteration) = if pattern.iterations > 0 {
            (
                cost / f64::from(pattern.iterations),
                tokens.total_tokens / u64::from(pattern.iterations),
            )
        } else {
            (0.0, 0)
        };

        debug!(pattern = pattern.key, framework = %framework, model = resolved, cost, "Cost estimate");

        Ok(CostMetrics {
            pattern_name: pattern.name.to_string(),
            framework,
            model: model.to_string(),
            iterations: pattern.iterations,
            api_calls,
            tokens,
            execution_time_ms,
            estimated_cost_usd: cost,
            cost_per_iteration,
            tokens_per_iteration,
        })
    }

    /// Both frameworks for every selected pattern, in selection order.
    pub fn run_comparison(
        &self,
        patterns: &[&'static PatternMeta],
        model: &str,
    ) -> Result<Vec<CostComparison>, BenchError> {
        patterns
            .iter()
            .map(|p| {
                Ok(CostComparison {
                    pattern: p.key,
                    adk: self.benchmark_pattern(p, Framework::Adk, model)?,
                    crewai: self.benchmark_pattern(p, Framework::CrewAi, model)?,
                })
            })
            .collect()
    }
}

impl Default for CostSimulator {
    fn default() -> Self {
        Self::new(PricingTable::with_defaults())
    }
}

/// Totals for one framework across a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameworkTotals {
    pub total_cost: f64,
    pub total_tokens: u64,
    pub total_calls: u64,
    pub patterns: usize,
}

impl FrameworkTotals {
    fn add(&mut self, m: &CostMetrics) {
        self.total_cost += m.estimated_cost_usd;
        self.total_tokens += m.tokens.total_tokens;
        self.total_calls += m.api_calls;
        self.patterns += 1;
    }

    pub fn avg_cost(&self) -> f64 {
        if self.patterns == 0 {
            0.0
        } else {
            self.total_cost / self.patterns as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostAggregate {
    pub adk: FrameworkTotals,
    pub crewai: FrameworkTotals,
}

impl CostAggregate {
    pub fn from_results(results: &[CostComparison]) -> Self {
        let mut agg = Self::default();
        for r in results {
            agg.adk.add(&r.adk);
            agg.crewai.add(&r.crewai);
        }
        agg
    }
}

/// Percent difference of `a` relative to `b`; 0 when `b` is not positive.
pub fn pct_diff(a: f64, b: f64) -> f64 {
    if b > 0.0 { (a - b) / b * 100.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn learning_adaptation_tokens() {
        let meta = catalog::get("learning_adaptation").unwrap();
        // high complexity (x2), 10 iterations
        let adk = CostSimulator::estimate_tokens(meta, Framework::Adk);
        assert_eq!(adk, TokenUsage::new(16_000, 8_000));
        let crew = CostSimulator::estimate_tokens(meta, Framework::CrewAi);
        assert_eq!(crew, TokenUsage::new(12_000, 7_000));
    }

    #[test]
    fn medium_complexity_truncates_per_iteration() {
        let meta = catalog::get("resource_optimization").unwrap();
        // 600 * 1.5 = 900, 350 * 1.5 = 525, five iterations
        let crew = CostSimulator::estimate_tokens(meta, Framework::CrewAi);
        assert_eq!(crew, TokenUsage::new(4_500, 2_625));
    }

    #[test]
    fn api_calls_and_time() {
        let meta = catalog::get("prioritization").unwrap();
        assert_eq!(CostSimulator::estimate_api_calls(meta, Framework::Adk), 6);
        assert_eq!(CostSimulator::estimate_api_calls(meta, Framework::CrewAi), 9);
        assert_eq!(CostSimulator::simulate_execution_time(meta, Framework::Adk, 6), 5_400.0);
        assert_eq!(CostSimulator::simulate_execution_time(meta, Framework::CrewAi, 9), 9_000.0);

        let evo = catalog::get("evolutionary_curriculum").unwrap();
        // 24 calls * 900 ms * 2.0
        assert_eq!(CostSimulator::simulate_execution_time(evo, Framework::Adk, 24), 43_200.0);
    }

    #[test]
    fn priced_model_costs() {
        let sim = CostSimulator::default();
        let meta = catalog::get("learning_adaptation").unwrap();
        let m = sim.benchmark_pattern(meta, Framework::Adk, "gpt-4").unwrap();
        // 16k * $30/M + 8k * $60/M
        assert!((m.estimated_cost_usd - 0.96).abs() < 1e-9);
        assert!((m.cost_per_iteration - 0.096).abs() < 1e-9);
        assert_eq!(m.tokens_per_iteration, 2_400);
        assert_eq!(m.api_calls, 20);
    }

    #[test]
    fn free_tier_costs_nothing() {
        let sim = CostSimulator::default();
        let results = sim
            .run_comparison(catalog::parse_filter(None).unwrap().as_slice(), "gemini-2.5-flash-exp")
            .unwrap();
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.adk.estimated_cost_usd == 0.0));
    }

    #[test]
    fn unknown_model_is_an_error() {
        let sim = CostSimulator::default();
        let meta = catalog::get("prioritization").unwrap();
        assert!(matches!(
            sim.benchmark_pattern(meta, Framework::Adk, "mystery-model"),
            Err(BenchError::UnknownModel { .. })
        ));
    }

    #[test]
    fn aggregate_totals_and_diff() {
        let sim = CostSimulator::default();
        let patterns = catalog::parse_filter(Some("learning_adaptation,prioritization")).unwrap();
        let results = sim.run_comparison(&patterns, "gpt-3.5-turbo").unwrap();
        let agg = CostAggregate::from_results(&results);

        assert_eq!(agg.adk.patterns, 2);
        // 20 + 6 ADK calls, 30 + 9 CrewAI calls
        assert_eq!(agg.adk.total_calls, 26);
        assert_eq!(agg.crewai.total_calls, 39);
        assert!((pct_diff(26.0, 39.0) + 33.333333333).abs() < 1e-6);
        assert_eq!(pct_diff(1.0, 0.0), 0.0);
        assert!((agg.adk.avg_cost() - agg.adk.total_cost / 2.0).abs() < 1e-12);
    }
}
