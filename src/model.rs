//! Core domain types for the position ledger.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Amount;

/// Investment plan identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub String);

/// Payment method identifier (`bank`, `paypal`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethodId(pub String);

/// Transaction identifier handed back to the user for a withdrawal request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub String);

/// Internal withdrawal record identifier.
pub type WithdrawalId = u64;

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_inner!(PlanId, PaymentMethodId, TransactionId);

impl From<&str> for PlanId {
    fn from(value: &str) -> Self {
        PlanId(value.to_string())
    }
}

impl From<&str> for PaymentMethodId {
    fn from(value: &str) -> Self {
        PaymentMethodId(value.to_string())
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        TransactionId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(label)
    }
}

/// Expected annual return band in whole percent, shown as `8-12%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRange {
    pub min_pct: u32,
    pub max_pct: u32,
}

impl fmt::Display for ReturnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}%", self.min_pct, self.max_pct)
    }
}

/// A user's stake in a plan. Amount and date only exist together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub invested: Amount,
    pub joined_on: NaiveDate,
}

/// An investment offering together with the user's position in it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentPlan {
    pub id: PlanId,
    pub name: String,
    pub description: String,
    pub min_investment: Amount,
    pub expected_return: ReturnRange,
    pub duration: String,
    pub risk: RiskLevel,
    pub(crate) position: Option<Position>,
}

impl InvestmentPlan {
    pub fn is_joined(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn invested(&self) -> Option<Amount> {
        self.position.map(|p| p.invested)
    }

    pub fn joined_on(&self) -> Option<NaiveDate> {
        self.position.map(|p| p.joined_on)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    /// Expected transfer time, e.g. `2-3 business days`.
    pub description: String,
}

/// Settlement state of a withdrawal.
///
/// `Completed` and `Failed` are terminal. This crate only ever creates
/// `Pending` records; settlement happens outside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl WithdrawalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRecord {
    pub id: WithdrawalId,
    pub amount: Amount,
    /// Display name of the payment method at the time of the request.
    pub method: String,
    pub status: WithdrawalStatus,
    pub created_on: NaiveDate,
    pub transaction: TransactionId,
}

impl WithdrawalRecord {
    /// Pending records still count against the withdrawable balance.
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// A withdrawal as submitted by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub amount: Amount,
    pub method: PaymentMethodId,
    pub account_details: String,
    /// Identifies one user action so a retried submission is not recorded twice.
    pub idempotency_key: Option<String>,
}

impl WithdrawalRequest {
    pub fn new(
        amount: Amount,
        method: impl Into<PaymentMethodId>,
        account_details: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            method: method.into(),
            account_details: account_details.into(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// A mutating operation on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a position in an unjoined plan.
    Join { plan: PlanId, amount: Amount },
    /// Change the invested amount of an existing position.
    Update { plan: PlanId, amount: Amount },
    /// Close a position, returning the plan to the unjoined state.
    Delete { plan: PlanId },
    /// Request a payout from the withdrawable balance.
    Withdraw(WithdrawalRequest),
}

impl Command {
    /// Short operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Join { .. } => "join",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::Withdraw(_) => "withdraw",
        }
    }
}
