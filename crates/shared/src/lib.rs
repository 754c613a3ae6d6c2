//! Orchestration utilities shared by both framework implementations of the
//! pattern catalog.
//!
//! - [`blackboard`]: append-versioned shared workspace for multi-agent runs
//! - [`handoff`]: context packages transferred between agents
//! - [`risk`]: credit, market and regulatory risk scoring
//! - [`validators`]: typed payload schemas
//! - [`fixtures`]: sample inputs used by demos and tests

pub mod blackboard;
pub mod fixtures;
pub mod handoff;
pub mod risk;
pub mod validators;

pub use blackboard::{Blackboard, BlackboardEntry, BlackboardSummary, ChangeAction, ChangeRecord};
pub use handoff::{
    ContextPackage, ConversationTurn, CustomerTier, HandoffDetails, Priority, merge_contexts,
    preserve_context, restore_context,
};
pub use risk::{
    AggregateAssessment, CreditFactors, MarketFactors, Recommendation, RegulatoryFactors,
    RiskLevel, RiskScore, RiskType, aggregate, credit_risk, market_risk, regulatory_risk,
};
pub use validators::{SchemaKind, Validate};
