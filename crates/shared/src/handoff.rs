//! Context transfer between agents.
//!
//! A [`ContextPackage`] carries everything a receiving agent needs to pick
//! up a task: who handed it off and why, the customer, the issue, and what
//! was already tried. Packages are built with [`preserve_context`], extended
//! with the `with_*` builders, then treated as immutable.

use chrono::{DateTime, Utc};
use patternlab_core::HandoffError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Fields `restore_context` refuses to default.
const REQUIRED_FIELDS: [&str; 4] = [
    "source_agent",
    "target_agent",
    "handoff_reason",
    "original_request",
];

const ISSUE_SUMMARY_CHARS: usize = 200;
const EXTENDED_CONVERSATION_TURNS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// High and urgent handoffs get flagged for the receiver.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!("unknown priority '{other}' (expected low, medium, high, urgent)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerTier {
    Standard,
    Premium,
    Vip,
}

impl CustomerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Vip => "vip",
        }
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(speaker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Optional inputs to [`preserve_context`].
#[derive(Debug, Clone, Default)]
pub struct HandoffDetails {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_tier: Option<CustomerTier>,
    /// Defaults to the first 200 characters of the request
    pub issue_summary: Option<String>,
    pub issue_category: Option<String>,
    pub priority: Option<Priority>,
    pub conversation_history: Vec<ConversationTurn>,
    pub current_state: Map<String, Value>,
    pub previous_attempts: Vec<String>,
    pub actions_taken: Vec<String>,
    pub metadata: Map<String, Value>,
}

/// Everything transferred with a handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPackage {
    pub source_agent: String,
    pub target_agent: String,
    pub handoff_reason: String,

    pub original_request: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub current_state: Map<String, Value>,

    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_tier: Option<CustomerTier>,

    #[serde(default)]
    pub issue_summary: String,
    #[serde(default)]
    pub issue_category: Option<String>,
    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub previous_attempts: Vec<String>,
    #[serde(default)]
    pub actions_taken: Vec<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Build a context package for a handoff from `source` to `target`.
pub fn preserve_context(
    source: impl Into<String>,
    target: impl Into<String>,
    request: impl Into<String>,
    reason: impl Into<String>,
    details: HandoffDetails,
) -> ContextPackage {
    let original_request = request.into();
    let issue_summary = details
        .issue_summary
        .unwrap_or_else(|| original_request.chars().take(ISSUE_SUMMARY_CHARS).collect());

    ContextPackage {
        source_agent: source.into(),
        target_agent: target.into(),
        handoff_reason: reason.into(),
        original_request,
        conversation_history: details.conversation_history,
        current_state: details.current_state,
        customer_id: details.customer_id,
        customer_name: details.customer_name,
        customer_email: details.customer_email,
        customer_tier: details.customer_tier,
        issue_summary,
        issue_category: details.issue_category,
        priority: details.priority.unwrap_or_default(),
        previous_attempts: details.previous_attempts,
        actions_taken: details.actions_taken,
        created_at: Utc::now(),
        metadata: details.metadata,
    }
}

impl ContextPackage {
    pub fn with_turn(mut self, speaker: impl Into<String>, message: impl Into<String>) -> Self {
        self.conversation_history
            .push(ConversationTurn::new(speaker, message));
        self
    }

    pub fn with_attempt(mut self, description: impl Into<String>) -> Self {
        self.previous_attempts.push(description.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions_taken.push(action.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// One-line description of the handoff.
    pub fn summary(&self) -> String {
        format!(
            "Handoff from {} to {} [{}]: {}",
            self.source_agent, self.target_agent, self.priority, self.handoff_reason
        )
    }

    /// Multi-line report for the receiving agent.
    pub fn report(&self) -> String {
        let mut lines = vec![
            format!("Handoff from {} to {}", self.source_agent, self.target_agent),
            format!("Reason: {}", self.handoff_reason),
            format!("Priority: {}", self.priority),
            String::new(),
        ];

        if let Some(name) = &self.customer_name {
            lines.push(format!("Customer: {name}"));
            if let Some(tier) = self.customer_tier {
                lines.push(format!("Tier: {tier}"));
            }
            lines.push(String::new());
        }

        lines.push(format!("Issue: {}", self.issue_summary));

        if !self.previous_attempts.is_empty() {
            lines.push(String::new());
            lines.push(format!("Previous attempts ({}):", self.previous_attempts.len()));
            lines.extend(self.previous_attempts.iter().map(|a| format!("  - {a}")));
        }

        if !self.actions_taken.is_empty() {
            lines.push(String::new());
            lines.push(format!("Actions taken ({}):", self.actions_taken.len()));
            lines.extend(self.actions_taken.iter().map(|a| format!("  - {a}")));
        }

        lines.join("\n")
    }

    /// Short flags a receiver should see first.
    pub fn key_points(&self) -> Vec<String> {
        let mut points = Vec::new();

        if let Some(tier @ (CustomerTier::Premium | CustomerTier::Vip)) = self.customer_tier {
            points.push(format!("{} customer", tier.as_str().to_uppercase()));
        }
        if self.priority.is_elevated() {
            points.push(format!("{} priority", self.priority.as_str().to_uppercase()));
        }
        if let Some(category) = &self.issue_category {
            points.push(format!("Category: {category}"));
        }
        if !self.previous_attempts.is_empty() {
            points.push(format!("{} previous attempt(s)", self.previous_attempts.len()));
        }
        if self.conversation_history.len() > EXTENDED_CONVERSATION_TURNS {
            points.push(format!(
                "Extended conversation ({} turns)",
                self.conversation_history.len()
            ));
        }

        points
    }

    pub fn to_value(&self) -> Result<Value, HandoffError> {
        serde_json::to_value(self).map_err(|e| HandoffError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, HandoffError> {
        serde_json::to_string_pretty(self).map_err(|e| HandoffError::Malformed(e.to_string()))
    }
}

/// Reconstruct a package from its serialized form.
pub fn restore_context(data: &Value) -> Result<ContextPackage, HandoffError> {
    let object = data
        .as_object()
        .ok_or_else(|| HandoffError::Malformed("expected a JSON object".into()))?;

    for field in REQUIRED_FIELDS {
        if object.get(field).is_none_or(Value::is_null) {
            return Err(HandoffError::MissingField(field));
        }
    }

    serde_json::from_value(data.clone()).map_err(|e| HandoffError::Malformed(e.to_string()))
}

/// Combine the packages of a handoff chain into one.
///
/// The result starts from the last package; conversation turns from every
/// package are ordered by timestamp, attempts and actions are concatenated in
/// input order. A single package comes back unchanged.
pub fn merge_contexts(packages: &[ContextPackage]) -> Result<ContextPackage, HandoffError> {
    let (latest, _) = packages.split_last().ok_or(HandoffError::NothingToMerge)?;
    if packages.len() == 1 {
        return Ok(latest.clone());
    }

    let mut merged = latest.clone();

    let mut turns: Vec<ConversationTurn> = packages
        .iter()
        .flat_map(|p| p.conversation_history.iter().cloned())
        .collect();
    turns.sort_by_key(|t| t.timestamp);
    merged.conversation_history = turns;

    merged.previous_attempts = packages
        .iter()
        .flat_map(|p| p.previous_attempts.iter().cloned())
        .collect();
    merged.actions_taken = packages
        .iter()
        .flat_map(|p| p.actions_taken.iter().cloned())
        .collect();

    let sources: Vec<Value> = packages
        .iter()
        .map(|p| Value::String(p.source_agent.clone()))
        .collect();
    merged.metadata.insert("merged_from".into(), Value::Array(sources));
    merged
        .metadata
        .insert("merge_count".into(), Value::from(packages.len()));

    Ok(merged)
}
