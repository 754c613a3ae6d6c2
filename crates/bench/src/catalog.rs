//! The eight benchmarked intelligence patterns.

use crate::BenchError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    LearningAgents,
    Optimization,
    FaultTolerance,
    Monitoring,
}

impl PatternCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LearningAgents => "learning_agents",
            Self::Optimization => "optimization",
            Self::FaultTolerance => "fault_tolerance",
            Self::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }

    /// Scales the per-iteration token budget.
    pub fn token_multiplier(&self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 1.5,
            Self::High => 2.0,
            Self::VeryHigh => 3.0,
        }
    }

    /// Scales simulated wall time.
    pub fn time_factor(&self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 1.2,
            Self::High => 1.5,
            Self::VeryHigh => 2.0,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMeta {
    pub key: &'static str,
    pub name: &'static str,
    pub category: PatternCategory,
    pub iterations: u32,
    pub complexity: Complexity,
    pub base_latency_ms: f64,
}

const fn pattern(
    key: &'static str,
    name: &'static str,
    category: PatternCategory,
    iterations: u32,
    complexity: Complexity,
    base_latency_ms: f64,
) -> PatternMeta {
    PatternMeta {
        key,
        name,
        category,
        iterations,
        complexity,
        base_latency_ms,
    }
}

static CATALOG: [PatternMeta; 8] = [
    pattern("learning_adaptation", "Learning & Adaptation", PatternCategory::LearningAgents, 10, Complexity::High, 850.0),
    pattern("exploration_discovery", "Exploration & Discovery", PatternCategory::LearningAgents, 8, Complexity::High, 900.0),
    pattern("evolutionary_curriculum", "Evolutionary Curriculum", PatternCategory::LearningAgents, 12, Complexity::VeryHigh, 1200.0),
    pattern("resource_optimization", "Resource Aware Optimization", PatternCategory::Optimization, 5, Complexity::Medium, 600.0),
    pattern("prioritization", "Prioritization", PatternCategory::Optimization, 3, Complexity::Low, 400.0),
    pattern("checkpoint_rollback", "Checkpoint & Rollback", PatternCategory::FaultTolerance, 6, Complexity::Medium, 700.0),
    pattern("exception_handling", "Exception Handling", PatternCategory::FaultTolerance, 4, Complexity::Low, 500.0),
    pattern("goal_monitoring", "Goal Setting & Monitoring", PatternCategory::Monitoring, 7, Complexity::Medium, 750.0),
];

/// Every pattern, in catalog order.
pub fn all() -> &'static [PatternMeta] {
    &CATALOG
}

pub fn keys() -> Vec<&'static str> {
    CATALOG.iter().map(|p| p.key).collect()
}

pub fn get(key: &str) -> Option<&'static PatternMeta> {
    CATALOG.iter().find(|p| p.key == key)
}

/// Resolve a comma-separated filter; `None` or blank selects everything.
///
/// All unknown keys are reported together.
pub fn parse_filter(filter: Option<&str>) -> Result<Vec<&'static PatternMeta>, BenchError> {
    let Some(raw) = filter.filter(|f| !f.trim().is_empty()) else {
        return Ok(CATALOG.iter().collect());
    };

    let requested: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();

    let unknown: Vec<String> = requested
        .iter()
        .filter(|k| get(k).is_none())
        .map(|k| k.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(BenchError::UnknownPattern {
            unknown,
            valid: keys().into_iter().map(String::from).collect(),
        });
    }

    Ok(requested.into_iter().filter_map(get).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_eight_patterns() {
        assert_eq!(all().len(), 8);
        let evo = get("evolutionary_curriculum").unwrap();
        assert_eq!(evo.iterations, 12);
        assert_eq!(evo.complexity, Complexity::VeryHigh);
        assert_eq!(evo.base_latency_ms, 1200.0);
    }

    #[test]
    fn empty_filter_selects_all() {
        assert_eq!(parse_filter(None).unwrap().len(), 8);
        assert_eq!(parse_filter(Some("  ")).unwrap().len(), 8);
    }

    #[test]
    fn filter_keeps_requested_order() {
        let selected = parse_filter(Some("prioritization, learning_adaptation")).unwrap();
        let keys: Vec<_> = selected.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["prioritization", "learning_adaptation"]);
    }

    #[test]
    fn unknown_keys_are_listed() {
        let err = parse_filter(Some("prioritization,learning,exploration")).unwrap_err();
        match &err {
            BenchError::UnknownPattern { unknown, valid } => {
                assert_eq!(unknown, &vec!["learning".to_string(), "exploration".to_string()]);
                assert_eq!(valid.len(), 8);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("goal_monitoring"));
    }

    #[test]
    fn complexity_factors() {
        assert_eq!(Complexity::Medium.token_multiplier(), 1.5);
        assert_eq!(Complexity::VeryHigh.time_factor(), 2.0);
        assert_eq!(
            serde_json::to_string(&Complexity::VeryHigh).unwrap(),
            "\"very_high\""
        );
    }
}
