//! Seed configuration for a ledger: plan catalog, payment methods, balance and
//! prior withdrawal history.
//!
//! [`LedgerConfig::default`] is the demo seed. A TOML file with the same shape
//! can replace it. Dates are quoted `YYYY-MM-DD` strings; native TOML dates
//! are rejected.
//!
//! ```toml
//! available_balance = "12450.75"
//!
//! [[plans]]
//! id = "1"
//! name = "Starter Portfolio"
//! min_investment = 1000
//! expected_return = { min_pct = 8, max_pct = 12 }
//! duration = "12 months"
//! risk = "Low"
//!
//! [[plans]]
//! id = "2"
//! name = "Growth Fund"
//! min_investment = 5000
//! expected_return = { min_pct = 12, max_pct = 18 }
//! duration = "24 months"
//! risk = "Medium"
//! position = { invested = 7500, joined_on = "2024-01-15" }
//!
//! [[payment_methods]]
//! id = "bank"
//! name = "Bank Transfer"
//! description = "2-3 business days"
//!
//! [[history]]
//! amount = "1000.00"
//! method = "Bank Transfer"
//! status = "pending"
//! date = "2024-01-20"
//! transaction = "TXN001235"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::Amount;
use crate::model::{
    PaymentMethod, PaymentMethodId, PlanId, Position, ReturnRange, RiskLevel, TransactionId,
    WithdrawalStatus,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate plan id {0}")]
    DuplicatePlan(PlanId),

    #[error("duplicate payment method id {0}")]
    DuplicatePaymentMethod(PaymentMethodId),

    #[error("duplicate transaction id {0}")]
    DuplicateTransaction(TransactionId),

    #[error("plan {0} has a negative minimum investment")]
    NegativeMinimum(PlanId),

    #[error("plan {plan} position of {invested} is below the minimum of {minimum}")]
    PositionBelowMinimum {
        plan: PlanId,
        minimum: Amount,
        invested: Amount,
    },

    #[error("available balance {0} is negative")]
    NegativeBalance(Amount),

    #[error("pending withdrawals exceed the representable amount range")]
    PendingOutOfRange,

    #[error("withdrawal {0} must have a positive amount")]
    NonPositiveWithdrawal(TransactionId),

    #[error("withdrawal {0} uses unknown payment method '{1}'")]
    UnknownPaymentMethod(TransactionId, String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    pub available_balance: Amount,
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanConfig {
    pub id: PlanId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub min_investment: Amount,
    pub expected_return: ReturnRange,
    pub duration: String,
    pub risk: RiskLevel,
    /// An existing position in this plan, if the user already joined it.
    #[serde(default)]
    pub position: Option<Position>,
}

/// A withdrawal made before the ledger was started.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryEntry {
    pub amount: Amount,
    /// Display name of one of the configured payment methods.
    pub method: String,
    pub status: WithdrawalStatus,
    pub date: NaiveDate,
    pub transaction: TransactionId,
}

impl LedgerConfig {
    /// Load a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the seed against the ledger invariants.
    ///
    /// The available balance is non-negative and the pending total fits in an
    /// [`Amount`], so `available - pending` cannot overflow.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.available_balance < Amount::ZERO {
            return Err(ConfigError::NegativeBalance(self.available_balance));
        }

        let mut plan_ids = HashSet::new();
        for plan in &self.plans {
            if !plan_ids.insert(&plan.id) {
                return Err(ConfigError::DuplicatePlan(plan.id.clone()));
            }
            if plan.min_investment < Amount::ZERO {
                return Err(ConfigError::NegativeMinimum(plan.id.clone()));
            }
            if let Some(position) = &plan.position {
                if position.invested < plan.min_investment || !position.invested.is_positive() {
                    return Err(ConfigError::PositionBelowMinimum {
                        plan: plan.id.clone(),
                        minimum: plan.min_investment,
                        invested: position.invested,
                    });
                }
            }
        }

        let mut method_ids = HashSet::new();
        for method in &self.payment_methods {
            if !method_ids.insert(&method.id) {
                return Err(ConfigError::DuplicatePaymentMethod(method.id.clone()));
            }
        }

        let mut transactions = HashSet::new();
        let mut pending = Amount::ZERO;
        for entry in &self.history {
            if !transactions.insert(&entry.transaction) {
                return Err(ConfigError::DuplicateTransaction(entry.transaction.clone()));
            }
            if !entry.amount.is_positive() {
                return Err(ConfigError::NonPositiveWithdrawal(entry.transaction.clone()));
            }
            if !self.payment_methods.iter().any(|m| m.name == entry.method) {
                return Err(ConfigError::UnknownPaymentMethod(
                    entry.transaction.clone(),
                    entry.method.clone(),
                ));
            }
            if !entry.status.is_terminal() {
                pending = pending
                    .checked_add(entry.amount)
                    .ok_or(ConfigError::PendingOutOfRange)?;
            }
        }

        Ok(())
    }
}

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid seed date"),
    }
}

#[allow(clippy::too_many_arguments)]
fn plan(
    id: &str,
    name: &str,
    description: &str,
    min_investment: i64,
    (min_pct, max_pct): (u32, u32),
    duration: &str,
    risk: RiskLevel,
    position: Option<(i64, NaiveDate)>,
) -> PlanConfig {
    PlanConfig {
        id: PlanId::from(id),
        name: name.to_string(),
        description: description.to_string(),
        min_investment: Amount::from_whole(min_investment),
        expected_return: ReturnRange { min_pct, max_pct },
        duration: duration.to_string(),
        risk,
        position: position.map(|(invested, joined_on)| Position {
            invested: Amount::from_whole(invested),
            joined_on,
        }),
    }
}

fn method(id: &str, name: &str, description: &str) -> PaymentMethod {
    PaymentMethod {
        id: PaymentMethodId::from(id),
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn withdrawal(
    whole: i64,
    method: &str,
    status: WithdrawalStatus,
    date: NaiveDate,
    transaction: &str,
) -> HistoryEntry {
    HistoryEntry {
        amount: Amount::from_whole(whole),
        method: method.to_string(),
        status,
        date,
        transaction: TransactionId::from(transaction),
    }
}

/// Demo seed: five plans (two joined), three payment methods, and a balance
/// with one pending withdrawal.
impl Default for LedgerConfig {
    fn default() -> Self {
        use RiskLevel::*;
        use WithdrawalStatus::*;

        Self {
            available_balance: Amount::from_cents(1_245_075),
            plans: vec![
                plan(
                    "1",
                    "Starter Portfolio",
                    "Perfect for beginners with diversified low-risk investments",
                    1000,
                    (8, 12),
                    "12 months",
                    Low,
                    None,
                ),
                plan(
                    "2",
                    "Growth Fund",
                    "Balanced portfolio focusing on growth stocks and bonds",
                    5000,
                    (12, 18),
                    "24 months",
                    Medium,
                    Some((7500, ymd(2024, 1, 15))),
                ),
                plan(
                    "3",
                    "Premium Strategy",
                    "High-yield investments for experienced investors",
                    10000,
                    (18, 25),
                    "36 months",
                    High,
                    Some((15000, ymd(2024, 2, 20))),
                ),
                plan(
                    "4",
                    "Tech Innovation",
                    "Focus on emerging technology and AI companies",
                    7500,
                    (15, 22),
                    "18 months",
                    High,
                    None,
                ),
                plan(
                    "5",
                    "Sustainable Future",
                    "ESG-focused investments in renewable energy and sustainability",
                    3000,
                    (10, 15),
                    "30 months",
                    Medium,
                    None,
                ),
            ],
            payment_methods: vec![
                method("bank", "Bank Transfer", "2-3 business days"),
                method("paypal", "PayPal", "Instant transfer"),
                method("crypto", "Cryptocurrency", "10-30 minutes"),
            ],
            history: vec![
                withdrawal(2500, "Bank Transfer", Completed, ymd(2024, 1, 15), "TXN001234"),
                withdrawal(1000, "PayPal", Pending, ymd(2024, 1, 20), "TXN001235"),
                withdrawal(750, "Cryptocurrency", Completed, ymd(2024, 1, 10), "TXN001233"),
            ],
        }
    }
}
