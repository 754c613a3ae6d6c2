//! Per-model token pricing.
//!
//! Prices are in USD per 1 million tokens. The built-in table covers the
//! models the benchmarks were written against; `[bench.custom_pricing]`
//! entries in the config add or replace models.

use patternlab_config::PricingOverrideConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Model used when none is given.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-exp";

const PROVIDER_PREFIXES: [&str; 4] = ["google/", "openai/", "gemini/", "models/"];

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Cost for the given token counts.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_per_m + output_tokens as f64 * self.output_per_m)
            / 1_000_000.0
    }

    pub fn is_free(&self) -> bool {
        self.input_per_m == 0.0 && self.output_per_m == 0.0
    }
}

impl From<&PricingOverrideConfig> for ModelPricing {
    fn from(cfg: &PricingOverrideConfig) -> Self {
        Self::new(cfg.input_per_m, cfg.output_per_m)
    }
}

/// Pricing table with built-in defaults and custom overrides.
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: BTreeMap<String, ModelPricing>,
}

impl PricingTable {
    /// Built-in prices.
    pub fn with_defaults() -> Self {
        let mut prices = BTreeMap::new();

        // Free tier
        prices.insert(DEFAULT_MODEL.into(), ModelPricing::new(0.0, 0.0));

        prices.insert("gemini-1.5-pro".into(), ModelPricing::new(1.25, 5.0));
        prices.insert("gemini-1.5-flash".into(), ModelPricing::new(0.075, 0.30));
        prices.insert("gpt-4".into(), ModelPricing::new(30.0, 60.0));
        prices.insert("gpt-3.5-turbo".into(), ModelPricing::new(0.5, 1.5));

        Self { prices }
    }

    pub fn empty() -> Self {
        Self {
            prices: BTreeMap::new(),
        }
    }

    /// Defaults plus config overrides; overrides win on name clashes.
    pub fn with_overrides(overrides: &HashMap<String, PricingOverrideConfig>) -> Self {
        let mut table = Self::with_defaults();
        for (model, cfg) in overrides {
            table.set(model.clone(), ModelPricing::from(cfg));
        }
        table
    }

    /// Exact lookup.
    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        self.prices.get(model).copied()
    }

    pub fn set(&mut self, model: impl Into<String>, pricing: ModelPricing) {
        self.prices.insert(model.into(), pricing);
    }

    /// Find the table entry for `model` with flexible matching.
    ///
    /// Tries an exact match, then the name with a provider prefix stripped
    /// (`google/gemini-1.5-pro` → `gemini-1.5-pro`), then the longest key
    /// followed only by a version suffix (`gemini-1.5-pro-002` →
    /// `gemini-1.5-pro`). A suffix starts with `-` or `@` and a digit, so
    /// `gpt-4o-mini` does not match `gpt-4`.
    pub fn resolve(&self, model: &str) -> Option<(&str, ModelPricing)> {
        if let Some((key, p)) = self.prices.get_key_value(model) {
            return Some((key.as_str(), *p));
        }

        let lower = model.to_lowercase();
        let bare = PROVIDER_PREFIXES
            .iter()
            .find_map(|prefix| lower.strip_prefix(prefix))
            .unwrap_or(lower.as_str());

        if let Some((key, p)) = self.prices.get_key_value(bare) {
            return Some((key.as_str(), *p));
        }

        self.prices
            .iter()
            .filter(|(key, _)| {
                bare.strip_prefix(key.to_lowercase().as_str())
                    .is_some_and(is_version_suffix)
            })
            .max_by_key(|(key, _)| key.len())
            .map(|(key, p)| (key.as_str(), *p))
    }

    /// Cost of a call, or `None` when the model is unknown.
    pub fn compute_cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
        self.resolve(model)
            .map(|(_, p)| p.cost(input_tokens, output_tokens))
    }

    /// Known model names, sorted.
    pub fn models(&self) -> Vec<String> {
        self.prices.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn is_version_suffix(rest: &str) -> bool {
    let mut chars = rest.chars();
    matches!(chars.next(), Some('-' | '@')) && chars.next().is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_models() {
        let table = PricingTable::with_defaults();
        assert_eq!(table.len(), 5);
        assert!(table.get(DEFAULT_MODEL).unwrap().is_free());
    }

    #[test]
    fn known_model_cost() {
        let table = PricingTable::with_defaults();
        // gemini-1.5-pro: $1.25/M input, $5/M output
        let cost = table.compute_cost("gemini-1.5-pro", 1_000_000, 200_000).unwrap();
        assert!((cost - 2.25).abs() < 1e-10);
    }

    #[test]
    fn unknown_model_returns_none() {
        let table = PricingTable::with_defaults();
        assert!(table.compute_cost("claude-unknown", 1000, 500).is_none());
    }

    #[test]
    fn provider_prefix_and_version_suffix_match() {
        let table = PricingTable::with_defaults();
        assert_eq!(table.resolve("google/gemini-1.5-flash").unwrap().0, "gemini-1.5-flash");
        assert_eq!(table.resolve("gemini-1.5-pro-002").unwrap().0, "gemini-1.5-pro");
        assert_eq!(table.resolve("OpenAI/GPT-3.5-Turbo-0125").unwrap().0, "gpt-3.5-turbo");
    }

    #[test]
    fn different_model_family_is_not_a_version() {
        let table = PricingTable::with_defaults();
        assert!(table.resolve("gpt-4o-mini").is_none());
        assert!(table.resolve("gpt-4-turbo").is_none());
        assert!(table.resolve("gemini-1.5-pro-vision").is_none());
        assert_eq!(table.resolve("gpt-4@2024-05-13").unwrap().0, "gpt-4");
    }

    #[test]
    fn longest_prefix_wins() {
        let mut table = PricingTable::empty();
        table.set("gpt-4", ModelPricing::new(30.0, 60.0));
        table.set("gpt-4-turbo", ModelPricing::new(10.0, 30.0));
        assert_eq!(table.resolve("gpt-4-turbo-2024-04-09").unwrap().0, "gpt-4-turbo");
    }

    #[test]
    fn overrides_replace_and_extend() {
        let overrides = HashMap::from([
            ("gpt-4".to_string(), PricingOverrideConfig { input_per_m: 1.0, output_per_m: 2.0 }),
            ("local/llama".to_string(), PricingOverrideConfig { input_per_m: 0.0, output_per_m: 0.0 }),
        ]);
        let table = PricingTable::with_overrides(&overrides);
        assert_eq!(table.len(), 6);
        assert_eq!(table.get("gpt-4").unwrap(), ModelPricing::new(1.0, 2.0));
        assert!(table.get("local/llama").is_some());
    }
}
