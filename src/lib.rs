pub mod amount;
pub mod clock;
pub mod config;
pub mod csv;
pub mod ledger;
pub mod model;

pub use amount::Amount;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LedgerConfig};
pub use ledger::{
    BalanceSnapshot, ConflictError, ErrorKind, LedgerError, NotFoundError, PlanListing,
    PositionLedger, ValidationError,
};
pub use model::{
    Command, InvestmentPlan, PaymentMethod, PaymentMethodId, PlanId, Position, RiskLevel,
    TransactionId, WithdrawalRecord, WithdrawalRequest, WithdrawalStatus,
};
