//! Sample inputs for demos and tests.
//!
//! Four corporate lending profiles, ranging from a low-risk
//! established firm to a distressed retailer, plus support tickets and
//! customer orders.

use crate::handoff::{ContextPackage, CustomerTier, HandoffDetails, Priority, preserve_context};
use crate::risk::{
    CreditFactors, MarketFactors, MarketPosition, RegulationLevel, RegulatoryFactors, RiskScore,
    Standing, Volatility, credit_risk, market_risk, regulatory_risk,
};
use crate::validators::{Order, OrderItem, SupportTicket, TicketCategory, TicketStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Low,
    Medium,
    High,
    Critical,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown profile '{s}' (expected low, medium, high, critical)"))
    }
}

/// A loan application reduced to the inputs of the three calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingProfile {
    pub company: String,
    pub industry: String,
    pub loan_amount: u64,
    pub credit: CreditFactors,
    pub market: MarketFactors,
    pub regulatory: RegulatoryFactors,
}

impl LendingProfile {
    /// Credit, market and regulatory scores, in that order.
    pub fn assess(&self) -> Vec<RiskScore> {
        vec![
            credit_risk(&self.credit),
            market_risk(&self.market),
            regulatory_risk(&self.regulatory),
        ]
    }
}

pub fn lending_profile(kind: ProfileKind) -> LendingProfile {
    match kind {
        ProfileKind::Low => LendingProfile {
            company: "Established Tech Solutions Inc.".into(),
            industry: "Enterprise Software (B2B SaaS)".into(),
            loan_amount: 1_500_000,
            credit: CreditFactors {
                credit_rating: 780,
                payment_history: Standing::Excellent,
                debt_ratio: 0.05,
                years_in_business: 12,
                revenue_growth: 0.25,
            },
            market: MarketFactors {
                customer_concentration: 0.28,
                industry_volatility: Volatility::Low,
                geographic_concentration: 0.65,
                market_position: MarketPosition::Established,
            },
            regulatory: RegulatoryFactors {
                compliance_status: Standing::Excellent,
                certifications: vec!["SOC 2 Type II".into(), "ISO 27001".into(), "GDPR".into()],
                violations_history: 0,
                pending_litigation: false,
                industry_regulation: RegulationLevel::Moderate,
            },
        },
        ProfileKind::Medium => LendingProfile {
            company: "TechStartup Inc.".into(),
            industry: "Software as a Service (SaaS)".into(),
            loan_amount: 2_500_000,
            credit: CreditFactors {
                credit_rating: 720,
                payment_history: Standing::Good,
                debt_ratio: 0.30,
                years_in_business: 5,
                revenue_growth: 0.40,
            },
            market: MarketFactors {
                customer_concentration: 0.45,
                industry_volatility: Volatility::Medium,
                geographic_concentration: 0.55,
                market_position: MarketPosition::Growth,
            },
            regulatory: RegulatoryFactors {
                compliance_status: Standing::Good,
                certifications: vec!["SOC 2 Type II".into(), "GDPR".into()],
                violations_history: 0,
                pending_litigation: false,
                industry_regulation: RegulationLevel::Moderate,
            },
        },
        ProfileKind::High => LendingProfile {
            company: "Rapid Growth Ventures LLC".into(),
            industry: "Consumer Mobile Apps (B2C)".into(),
            loan_amount: 5_000_000,
            credit: CreditFactors {
                credit_rating: 650,
                payment_history: Standing::Fair,
                debt_ratio: 0.83,
                years_in_business: 2,
                revenue_growth: 5.0,
            },
            market: MarketFactors {
                customer_concentration: 0.72,
                industry_volatility: Volatility::High,
                geographic_concentration: 0.95,
                market_position: MarketPosition::Startup,
            },
            regulatory: RegulatoryFactors {
                compliance_status: Standing::Fair,
                certifications: vec![],
                violations_history: 1,
                pending_litigation: true,
                industry_regulation: RegulationLevel::High,
            },
        },
        ProfileKind::Critical => LendingProfile {
            company: "DistressedCo Industries".into(),
            industry: "Retail (brick and mortar)".into(),
            loan_amount: 10_000_000,
            credit: CreditFactors {
                credit_rating: 590,
                payment_history: Standing::Poor,
                debt_ratio: 1.25,
                years_in_business: 8,
                revenue_growth: -0.30,
            },
            market: MarketFactors {
                customer_concentration: 0.80,
                industry_volatility: Volatility::High,
                geographic_concentration: 0.90,
                market_position: MarketPosition::Mature,
            },
            regulatory: RegulatoryFactors {
                compliance_status: Standing::Poor,
                certifications: vec![],
                violations_history: 2,
                pending_litigation: true,
                industry_regulation: RegulationLevel::High,
            },
        },
    }
}

fn on_nov_18(hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 11, 18)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn ticket(
    id: &str,
    created_at: DateTime<Utc>,
    customer: (&str, &str),
    subject: &str,
    description: &str,
    priority: Priority,
    category: TicketCategory,
) -> SupportTicket {
    SupportTicket {
        ticket_id: id.into(),
        created_at,
        customer_name: customer.0.into(),
        customer_email: customer.1.into(),
        subject: subject.into(),
        description: description.into(),
        priority,
        category: Some(category),
        status: TicketStatus::New,
        assigned_to: None,
    }
}

pub fn support_tickets() -> Vec<SupportTicket> {
    vec![
        ticket(
            "TKT-000123",
            on_nov_18(9, 15),
            ("John Doe", "john.doe@example.com"),
            "Refund Request for Order #45829",
            "Received three wireless keyboards instead of the laptop ordered. Return already \
             picked up; requesting a full refund to the original payment method.",
            Priority::High,
            TicketCategory::Financial,
        ),
        ticket(
            "TKT-000124",
            on_nov_18(10, 30),
            ("Sarah Martinez", "compliance@medtech.com"),
            "HIPAA Compliance Documentation Request - URGENT",
            "Auditors need the BAA, SOC 2 Type II report, encryption specifications, incident \
             response and data retention policies within 48 hours.",
            Priority::Urgent,
            TicketCategory::Legal,
        ),
        ticket(
            "TKT-000125",
            on_nov_18(11, 45),
            ("Mike Chen", "devops@startup.io"),
            "API Gateway Returning 503 Errors - Production Down",
            "All production API calls have returned 503 since the last deploy; customers are \
             unable to check out.",
            Priority::Urgent,
            TicketCategory::Technical,
        ),
        ticket(
            "TKT-000127",
            on_nov_18(14, 0),
            ("Tom Wilson", "info@smallbiz.com"),
            "Question about pricing plans",
            "Would like to understand the difference between the Standard and Premium plans \
             before upgrading.",
            Priority::Low,
            TicketCategory::General,
        ),
    ]
}

pub fn sample_orders() -> Vec<Order> {
    vec![
        Order {
            customer_name: "Sarah Johnson".into(),
            customer_email: "sarah.johnson@techcorp.com".into(),
            order_items: vec![
                OrderItem::new("Laptop Computer (Model XPS-15)", 2, 1299.0),
                OrderItem::new("Wireless Mouse", 2, 49.0),
                OrderItem::new("USB-C Hub", 1, 79.0),
            ],
            shipping_address: "123 Innovation Drive, San Francisco, CA 94105".into(),
            total_amount: None,
        },
        Order {
            customer_name: "Michael Chen".into(),
            customer_email: "michael.chen@enterprise.com".into(),
            order_items: vec![
                OrderItem::new("Server Rack Unit (42U)", 5, 2499.0),
                OrderItem::new("Enterprise Switch (48-port)", 3, 3299.0),
                OrderItem::new("UPS System (10kVA)", 2, 4999.0),
                OrderItem::new("Network Cables (Cat6, 100ft)", 50, 29.0),
            ],
            shipping_address: "DataCenter Building A, 456 Technology Parkway, Austin, TX 78701"
                .into(),
            total_amount: None,
        },
        Order {
            customer_name: "Jennifer Martinez".into(),
            customer_email: "jmartinez@globalcorp.com".into(),
            order_items: vec![
                OrderItem::new("Executive Workstation Setup", 10, 4500.0),
                OrderItem::new("4K Monitor (32\")", 20, 899.0),
                OrderItem::new("Standing Desk (Electric)", 10, 1200.0),
                OrderItem::new("Ergonomic Chair (Premium)", 10, 1400.0),
            ],
            shipping_address: "GlobalCorp Headquarters, 789 Executive Boulevard, New York, NY 10001"
                .into(),
            total_amount: None,
        },
    ]
}

/// The refund ticket escalated from first-line support to a specialist.
pub fn sample_handoff() -> ContextPackage {
    preserve_context(
        "L1Support",
        "FinancialSpecialist",
        "I placed order #45829 for $1,247.50 but received the wrong items. I need a full refund.",
        "Refund over $1,000 requires specialist approval",
        HandoffDetails {
            customer_id: Some("CUST-45829".into()),
            customer_name: Some("John Doe".into()),
            customer_email: Some("john.doe@example.com".into()),
            customer_tier: Some(CustomerTier::Standard),
            issue_category: Some("financial".into()),
            priority: Some(Priority::High),
            ..Default::default()
        },
    )
    .with_turn("customer", "I received three keyboards instead of a laptop.")
    .with_turn("L1Support", "I've confirmed the return was picked up yesterday.")
    .with_attempt("Verified order contents against the warehouse manifest")
    .with_action("Return label issued")
}
