//! Payload schemas exchanged between agents.
//!
//! Each schema is a plain serde struct implementing [`Validate`], which
//! collects every broken rule instead of stopping at the first.

use crate::handoff::Priority;
use crate::risk::{Recommendation, RiskLevel};
use chrono::{DateTime, Utc};
use patternlab_core::{FieldViolation, ValidationError};
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static INVOICE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INV-\d{8}-\d{4}$").expect("valid invoice regex"));
static TICKET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TKT-\d{6}$").expect("valid ticket regex"));

/// A payload that can report its rule violations.
pub trait Validate {
    /// Schema name used in error messages.
    const SCHEMA: &'static str;

    /// Every broken rule, empty when valid.
    fn violations(&self) -> Vec<FieldViolation>;

    fn validate(&self) -> Result<(), ValidationError> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Invalid {
                schema: Self::SCHEMA,
                violations,
            })
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_min_len(out: &mut Vec<FieldViolation>, field: &str, value: &str, min: usize) {
    if value.chars().count() < min {
        out.push(FieldViolation::new(
            field,
            format!("must be at least {min} character(s)"),
        ));
    }
}

fn check_email(out: &mut Vec<FieldViolation>, field: &str, value: &str) {
    if !EMAIL_RE.is_match(value) {
        out.push(FieldViolation::new(field, "must be a valid email address"));
    }
}

fn check_score(out: &mut Vec<FieldViolation>, field: &str, value: f64) {
    if !(0.0..=100.0).contains(&value) {
        out.push(FieldViolation::new(field, "must be between 0 and 100"));
    }
}

fn check_items(out: &mut Vec<FieldViolation>, field: &str, items: &[OrderItem]) {
    for (i, item) in items.iter().enumerate() {
        out.extend(item.violations().into_iter().map(|v| FieldViolation {
            field: format!("{field}[{i}].{}", v.field),
            message: v.message,
        }));
    }
}

// --- Orders ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn new(product: impl Into<String>, quantity: i64, unit_price: f64) -> Self {
        Self {
            product: product.into(),
            quantity,
            unit_price,
        }
    }

    pub fn total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

impl Validate for OrderItem {
    const SCHEMA: &'static str = "OrderItem";

    fn violations(&self) -> Vec<FieldViolation> {
        let mut out = Vec::new();
        check_min_len(&mut out, "product", &self.product, 1);
        if self.quantity <= 0 {
            out.push(FieldViolation::new("quantity", "must be greater than 0"));
        }
        if self.unit_price <= 0.0 || self.unit_price.is_nan() {
            out.push(FieldViolation::new("unit_price", "must be greater than 0"));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub customer_name: String,
    pub customer_email: String,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: String,
    /// Filled from the items by [`Order::finalize`] when absent
    #[serde(default)]
    pub total_amount: Option<f64>,
}

impl Order {
    pub fn items_total(&self) -> f64 {
        self.order_items.iter().map(OrderItem::total).sum()
    }

    /// Stated total, or the sum of the items.
    pub fn total(&self) -> f64 {
        self.total_amount.unwrap_or_else(|| self.items_total())
    }

    pub fn finalize(&mut self) {
        if self.total_amount.is_none() {
            self.total_amount = Some(self.items_total());
        }
    }
}

impl Validate for Order {
    const SCHEMA: &'static str = "Order";

    fn violations(&self) -> Vec<FieldViolation> {
        let mut out = Vec::new();
        check_min_len(&mut out, "customer_name", &self.customer_name, 1);
        check_email(&mut out, "customer_email", &self.customer_email);
        if self.order_items.is_empty() {
            out.push(FieldViolation::new("order_items", "must contain at least 1 item"));
        }
        check_items(&mut out, "order_items", &self.order_items);
        check_min_len(&mut out, "shipping_address", &self.shipping_address, 5);
        out
    }
}

// --- Risk assessment ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_type: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub key_factors: Vec<String>,
    pub recommendation: Recommendation,
    pub details: String,
}

impl Validate for RiskAssessment {
    const SCHEMA: &'static str = "RiskAssessment";

    fn violations(&self) -> Vec<FieldViolation> {
        let mut out = Vec::new();
        check_score(&mut out, "risk_score", self.risk_score);
        check_min_len(&mut out, "details", &self.details, 10);
        out
    }
}

// --- Invoices ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
    Overdue,
}

fn default_tax_rate() -> f64 {
    0.08
}

fn default_shipping() -> f64 {
    15.0
}

fn default_payment_terms() -> String {
    "Net 30".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    #[serde(default = "Utc::now")]
    pub invoice_date: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Derived: `round2(subtotal * tax_rate)`
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default = "default_shipping")]
    pub shipping: f64,
    /// Derived: `round2(subtotal + tax_amount + shipping)`
    #[serde(default)]
    pub total: f64,
    #[serde(default = "default_payment_terms")]
    pub payment_terms: String,
    #[serde(default)]
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Recompute tax and total from subtotal, rate and shipping.
    pub fn finalize(&mut self) {
        self.tax_amount = round2(self.subtotal * self.tax_rate);
        self.total = round2(self.subtotal + self.tax_amount + self.shipping);
    }
}

impl Validate for Invoice {
    const SCHEMA: &'static str = "Invoice";

    fn violations(&self) -> Vec<FieldViolation> {
        let mut out = Vec::new();
        if !INVOICE_NUMBER_RE.is_match(&self.invoice_number) {
            out.push(FieldViolation::new(
                "invoice_number",
                "must match INV-YYYYMMDD-NNNN",
            ));
        }
        check_email(&mut out, "customer_email", &self.customer_email);
        check_items(&mut out, "items", &self.items);
        if self.subtotal <= 0.0 || self.subtotal.is_nan() {
            out.push(FieldViolation::new("subtotal", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.tax_rate) {
            out.push(FieldViolation::new("tax_rate", "must be between 0 and 1"));
        }
        if self.tax_amount < 0.0 {
            out.push(FieldViolation::new("tax_amount", "must not be negative"));
        }
        if self.shipping < 0.0 {
            out.push(FieldViolation::new("shipping", "must not be negative"));
        }
        if self.total <= 0.0 || self.total.is_nan() {
            out.push(FieldViolation::new("total", "must be greater than 0"));
        }
        out
    }
}

// --- Support tickets ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    Financial,
    Legal,
    Technical,
    General,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    New,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub ticket_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<TicketCategory>,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl Validate for SupportTicket {
    const SCHEMA: &'static str = "SupportTicket";

    fn violations(&self) -> Vec<FieldViolation> {
        let mut out = Vec::new();
        if !TICKET_ID_RE.is_match(&self.ticket_id) {
            out.push(FieldViolation::new("ticket_id", "must match TKT-NNNNNN"));
        }
        check_email(&mut out, "customer_email", &self.customer_email);
        check_min_len(&mut out, "subject", &self.subject, 5);
        check_min_len(&mut out, "description", &self.description, 20);
        out
    }
}

// --- Credit validation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditDecision {
    Approved,
    Rejected,
    ReviewRequired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditValidation {
    pub validation_status: CreditDecision,
    pub credit_limit: f64,
    pub risk_score: f64,
    #[serde(default)]
    pub flags: Vec<String>,
    pub recommendation: String,
}

impl Validate for CreditValidation {
    const SCHEMA: &'static str = "CreditValidation";

    fn violations(&self) -> Vec<FieldViolation> {
        let mut out = Vec::new();
        if self.credit_limit < 0.0 || self.credit_limit.is_nan() {
            out.push(FieldViolation::new("credit_limit", "must not be negative"));
        }
        check_score(&mut out, "risk_score", self.risk_score);
        check_min_len(&mut out, "recommendation", &self.recommendation, 10);
        out
    }
}

// --- Schema selection ---

/// Schemas selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    OrderItem,
    Order,
    RiskAssessment,
    Invoice,
    SupportTicket,
    CreditValidation,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 6] = [
        Self::OrderItem,
        Self::Order,
        Self::RiskAssessment,
        Self::Invoice,
        Self::SupportTicket,
        Self::CreditValidation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderItem => "order-item",
            Self::Order => "order",
            Self::RiskAssessment => "risk-assessment",
            Self::Invoice => "invoice",
            Self::SupportTicket => "support-ticket",
            Self::CreditValidation => "credit-validation",
        }
    }

    /// Parse, fill derived fields, validate, and return the normalized payload.
    pub fn validate_json(&self, payload: &Value) -> Result<Value, ValidationError> {
        match self {
            Self::OrderItem => check::<OrderItem>(payload, |_| {}),
            Self::Order => check::<Order>(payload, Order::finalize),
            Self::RiskAssessment => check::<RiskAssessment>(payload, |_| {}),
            Self::Invoice => check::<Invoice>(payload, Invoice::finalize),
            Self::SupportTicket => check::<SupportTicket>(payload, |_| {}),
            Self::CreditValidation => check::<CreditValidation>(payload, |_| {}),
        }
    }
}

fn check<T>(payload: &Value, finalize: impl FnOnce(&mut T)) -> Result<Value, ValidationError>
where
    T: Validate + Serialize + DeserializeOwned,
{
    let mut parsed: T = serde_json::from_value(payload.clone())
        .map_err(|e| ValidationError::Malformed(format!("{}: {e}", T::SCHEMA)))?;
    finalize(&mut parsed);
    parsed.validate()?;
    serde_json::to_value(&parsed).map_err(|e| ValidationError::Malformed(e.to_string()))
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownSchema(s.to_string()))
    }
}
