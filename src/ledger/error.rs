//! Error types for ledger operations.

use thiserror::Error;

use crate::Amount;
use crate::amount::AmountError;
use crate::model::{PaymentMethodId, PlanId};

/// Top-level error returned by every mutating [`PositionLedger`](super::PositionLedger) call.
///
/// All variants are expected outcomes of bad input or stale UI state; none
/// leave the ledger modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),
}

/// Coarse error category for a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

/// Input failed a stated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("plan {plan} requires at least {minimum}, got {requested}")]
    BelowMinimum {
        plan: PlanId,
        minimum: Amount,
        requested: Amount,
    },

    #[error("insufficient withdrawable balance: withdrawable {withdrawable}, requested {requested}")]
    ExceedsWithdrawable {
        withdrawable: Amount,
        requested: Amount,
    },

    #[error("payment method is required")]
    MissingPaymentMethod,

    #[error("unknown payment method '{0}'")]
    UnknownPaymentMethod(PaymentMethodId),

    #[error("account details are required")]
    MissingAccountDetails,

    #[error("percentage must be between 1 and 100, got {0}")]
    PercentOutOfRange(u32),
}

/// Referenced entity does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("plan {0}")]
    Plan(PlanId),
}

/// Operation is not valid for the entity's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("plan {0} is already joined")]
    AlreadyJoined(PlanId),

    #[error("plan {0} is not joined")]
    NotJoined(PlanId),

    #[error("idempotency key '{0}' was already used for a different withdrawal")]
    IdempotencyKeyReused(String),
}
