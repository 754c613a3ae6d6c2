//! Lending risk scoring.
//!
//! Three independent calculators (credit, market, regulatory) each produce a
//! [`RiskScore`] in `[0, 100]` where higher means riskier. [`aggregate`]
//! combines them into one weighted assessment.

use patternlab_core::RiskError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskType {
    #[serde(rename = "credit_risk")]
    Credit,
    #[serde(rename = "market_risk")]
    Market,
    #[serde(rename = "regulatory_risk")]
    Regulatory,
}

impl RiskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit_risk",
            Self::Market => "market_risk",
            Self::Regulatory => "regulatory_risk",
        }
    }
}

impl fmt::Display for RiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered from least to most conservative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Approve,
    Conditional,
    Reject,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Conditional => "conditional",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment history or compliance standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Standing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }

    fn is_weak(&self) -> bool {
        matches!(self, Self::Fair | Self::Poor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPosition {
    Startup,
    Growth,
    #[default]
    Established,
    Mature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulationLevel {
    Low,
    #[default]
    Moderate,
    High,
    Critical,
}

impl RegulationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditFactors {
    /// Credit score, typically 300-850
    pub credit_rating: u32,
    pub payment_history: Standing,
    /// Debt-to-income ratio
    pub debt_ratio: f64,
    #[serde(default = "default_years_in_business")]
    pub years_in_business: u32,
    /// Year-over-year revenue growth, 0.25 = 25%
    #[serde(default)]
    pub revenue_growth: f64,
}

fn default_years_in_business() -> u32 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFactors {
    /// Share of revenue from the top three customers
    pub customer_concentration: f64,
    pub industry_volatility: Volatility,
    /// Share of revenue from the primary region
    pub geographic_concentration: f64,
    #[serde(default)]
    pub market_position: MarketPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryFactors {
    pub compliance_status: Standing,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub violations_history: u32,
    #[serde(default)]
    pub pending_litigation: bool,
    #[serde(default)]
    pub industry_regulation: RegulationLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub risk_type: RiskType,
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub recommendation: Recommendation,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateAssessment {
    pub overall_score: f64,
    pub overall_level: RiskLevel,
    pub overall_recommendation: Recommendation,
    pub risk_breakdown: BTreeMap<RiskType, RiskScore>,
    pub key_factors: Vec<String>,
    pub weights_used: BTreeMap<RiskType, f64>,
}

/// Clamp into `[0, 100]`. NaN maps to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        MIN_SCORE
    } else {
        score.clamp(MIN_SCORE, MAX_SCORE)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(ratio: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, ratio * 100.0)
}

/// Three-band classification shared by all calculators.
fn band(score: f64, low_below: f64, medium_below: f64) -> (RiskLevel, Recommendation) {
    if score < low_below {
        (RiskLevel::Low, Recommendation::Approve)
    } else if score < medium_below {
        (RiskLevel::Medium, Recommendation::Conditional)
    } else {
        (RiskLevel::High, Recommendation::Reject)
    }
}

fn factors_or(factors: Vec<String>, fallback: &str) -> Vec<String> {
    if factors.is_empty() {
        vec![fallback.to_string()]
    } else {
        factors
    }
}

pub fn credit_risk(input: &CreditFactors) -> RiskScore {
    let mut score = 0.0;
    let mut factors = Vec::new();

    if input.credit_rating < 600 {
        score += 40.0;
        factors.push("Low credit score (<600)".to_string());
    } else if input.credit_rating < 700 {
        score += 20.0;
        factors.push("Below-average credit score".to_string());
    } else if input.credit_rating >= 750 {
        score -= 10.0;
        factors.push("Excellent credit score".to_string());
    }

    score += match input.payment_history {
        Standing::Excellent => -10.0,
        Standing::Good => 5.0,
        Standing::Fair => 15.0,
        Standing::Poor => 30.0,
    };
    if input.payment_history.is_weak() {
        factors.push(format!("Payment history: {}", input.payment_history.as_str()));
    }

    if input.debt_ratio > 0.4 {
        score += 30.0;
        factors.push(format!("High debt ratio ({})", percent(input.debt_ratio, 1)));
    } else if input.debt_ratio > 0.25 {
        score += 15.0;
        factors.push(format!("Elevated debt ratio ({})", percent(input.debt_ratio, 1)));
    }

    if input.years_in_business < 2 {
        score += 10.0;
        factors.push("Limited operating history".to_string());
    } else if input.years_in_business >= 10 {
        score -= 5.0;
    }

    if input.revenue_growth > 0.3 {
        score -= 10.0;
        factors.push(format!("Strong revenue growth ({})", percent(input.revenue_growth, 0)));
    } else if input.revenue_growth < -0.1 {
        score += 15.0;
        factors.push("Declining revenue".to_string());
    }

    let score = clamp_score(score + 25.0);
    let (level, recommendation) = band(score, 30.0, 60.0);
    let details = match level {
        RiskLevel::Low => "Strong credit profile with minimal risk indicators.",
        RiskLevel::Medium => "Moderate credit risk. Recommend enhanced monitoring and covenants.",
        _ => "High credit risk. Significant concerns about repayment ability.",
    };

    RiskScore {
        risk_type: RiskType::Credit,
        score,
        level,
        factors: factors_or(factors, "No significant risk factors"),
        recommendation,
        details: details.to_string(),
    }
}

pub fn market_risk(input: &MarketFactors) -> RiskScore {
    let mut score = 0.0;
    let mut factors = Vec::new();

    if input.customer_concentration > 0.5 {
        score += 40.0;
        factors.push(format!(
            "High customer concentration ({})",
            percent(input.customer_concentration, 0)
        ));
    } else if input.customer_concentration > 0.3 {
        score += 25.0;
        factors.push(format!(
            "Moderate customer concentration ({})",
            percent(input.customer_concentration, 0)
        ));
    }

    score += match input.industry_volatility {
        Volatility::Low => 5.0,
        Volatility::Medium => 20.0,
        Volatility::High => 30.0,
    };
    if input.industry_volatility == Volatility::High {
        factors.push("High industry volatility".to_string());
    }

    if input.geographic_concentration > 0.8 {
        score += 20.0;
        factors.push(format!(
            "Geographic concentration ({})",
            percent(input.geographic_concentration, 0)
        ));
    } else if input.geographic_concentration > 0.6 {
        score += 10.0;
    }

    score += match input.market_position {
        MarketPosition::Startup => 10.0,
        MarketPosition::Growth => 5.0,
        MarketPosition::Established => 0.0,
        MarketPosition::Mature => -5.0,
    };
    if input.market_position == MarketPosition::Startup {
        factors.push("Early-stage company".to_string());
    }

    let score = clamp_score(score + 10.0);
    let (level, recommendation) = band(score, 35.0, 65.0);
    let details = match level {
        RiskLevel::Low => "Well-diversified market exposure with manageable risks.",
        RiskLevel::Medium => "Moderate market risk. Recommend diversification covenants.",
        _ => "High market concentration risk. Significant exposure to market changes.",
    };

    RiskScore {
        risk_type: RiskType::Market,
        score,
        level,
        factors: factors_or(factors, "No significant market risks"),
        recommendation,
        details: details.to_string(),
    }
}

pub fn regulatory_risk(input: &RegulatoryFactors) -> RiskScore {
    let mut score = 0.0;
    let mut factors = Vec::new();

    score += match input.compliance_status {
        Standing::Excellent => 0.0,
        Standing::Good => 10.0,
        Standing::Fair => 25.0,
        Standing::Poor => 40.0,
    };
    if input.compliance_status.is_weak() {
        factors.push(format!("Compliance status: {}", input.compliance_status.as_str()));
    }

    let certs = input.certifications.len();
    score -= (certs * 7).min(20) as f64;
    if certs >= 2 {
        let listed: Vec<&str> = input.certifications.iter().take(3).map(String::as_str).collect();
        factors.push(format!("Strong certifications ({})", listed.join(", ")));
    }

    if input.violations_history > 0 {
        score += (f64::from(input.violations_history) * 15.0).min(30.0);
        factors.push(format!("{} past violation(s)", input.violations_history));
    }

    if input.pending_litigation {
        score += 20.0;
        factors.push("Pending regulatory litigation".to_string());
    }

    score += match input.industry_regulation {
        RegulationLevel::Low => -5.0,
        RegulationLevel::Moderate => 0.0,
        RegulationLevel::High => 10.0,
        RegulationLevel::Critical => 20.0,
    };
    if matches!(
        input.industry_regulation,
        RegulationLevel::High | RegulationLevel::Critical
    ) {
        factors.push(format!(
            "Highly regulated industry ({})",
            input.industry_regulation.as_str()
        ));
    }

    let score = clamp_score(score + 15.0);
    let (level, recommendation) = band(score, 25.0, 50.0);
    let details = match level {
        RiskLevel::Low => "Strong compliance posture with minimal regulatory concerns.",
        RiskLevel::Medium => "Some regulatory considerations. Recommend ongoing compliance monitoring.",
        _ => "Significant regulatory risks. Compliance concerns require resolution.",
    };

    RiskScore {
        risk_type: RiskType::Regulatory,
        score,
        level,
        factors: factors_or(factors, "Strong regulatory compliance"),
        recommendation,
        details: details.to_string(),
    }
}

/// Weighted combination of individual scores.
///
/// Without `weights` every risk type present gets `1 / scores.len()`. Types
/// missing from explicit weights contribute nothing.
pub fn aggregate(
    scores: &[RiskScore],
    weights: Option<&BTreeMap<RiskType, f64>>,
) -> Result<AggregateAssessment, RiskError> {
    if scores.is_empty() {
        return Err(RiskError::NoScores);
    }

    let weights_used: BTreeMap<RiskType, f64> = match weights {
        Some(w) => {
            if let Some((risk_type, weight)) = w.iter().find(|(_, w)| **w < 0.0) {
                return Err(RiskError::NegativeWeight {
                    risk_type: risk_type.to_string(),
                    weight: *weight,
                });
            }
            w.clone()
        }
        None => {
            let equal = 1.0 / scores.len() as f64;
            scores.iter().map(|s| (s.risk_type, equal)).collect()
        }
    };

    let total: f64 = scores
        .iter()
        .map(|s| s.score * weights_used.get(&s.risk_type).copied().unwrap_or(0.0))
        .sum();
    let overall_score = round1(clamp_score(total));

    let overall_recommendation = scores
        .iter()
        .map(|s| s.recommendation)
        .max()
        .unwrap_or(Recommendation::Approve);
    let (overall_level, _) = band(overall_score, 30.0, 60.0);

    Ok(AggregateAssessment {
        overall_score,
        overall_level,
        overall_recommendation,
        risk_breakdown: scores.iter().map(|s| (s.risk_type, s.clone())).collect(),
        key_factors: scores.iter().flat_map(|s| s.factors.iter().cloned()).collect(),
        weights_used,
    })
}
