//! Investment position ledger.
//!
//! The ledger owns the plan catalog with the user's positions and the cash
//! balance with its withdrawal history. It supports joining a plan, updating
//! and deleting a position, and requesting withdrawals.
//! Also supports an async stream of commands.

use std::collections::{HashMap, HashSet};

use tokio_stream::{Stream, StreamExt};
use tracing::{field, info};

use crate::Amount;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, LedgerConfig};
use crate::model::{
    Command, InvestmentPlan, PaymentMethod, PlanId, Position, TransactionId, WithdrawalId,
    WithdrawalRecord, WithdrawalRequest, WithdrawalStatus,
};

mod state;
pub use state::AccountBalance;

mod error;
pub use error::{ConflictError, ErrorKind, LedgerError, NotFoundError, ValidationError};

const TRANSACTION_PREFIX: &str = "TXN";

/// Plans split for display, each half in catalog order.
#[derive(Debug)]
pub struct PlanListing<'a> {
    pub joined: Vec<&'a InvestmentPlan>,
    pub available: Vec<&'a InvestmentPlan>,
}

/// Point-in-time view of the cash balance.
#[derive(Debug)]
pub struct BalanceSnapshot<'a> {
    pub available: Amount,
    pub pending: Amount,
    pub withdrawable: Amount,
    /// Newest first.
    pub history: Vec<&'a WithdrawalRecord>,
}

/// A withdrawal accepted under an idempotency key.
#[derive(Debug)]
struct Submission {
    request: WithdrawalRequest,
    record: WithdrawalId,
}

/// The position ledger.
///
/// Every operation runs to completion on `&mut self`; callers own the ledger
/// and hand it to whatever drives the UI.
pub struct PositionLedger {
    /// Catalog order is preserved for listing.
    plans: Vec<InvestmentPlan>,
    methods: Vec<PaymentMethod>,
    balance: AccountBalance,
    /// Every transaction id ever issued or seeded
    transactions: HashSet<TransactionId>,
    submissions: HashMap<String, Submission>,
    next_record: WithdrawalId,
    next_transaction: u64,
    clock: Box<dyn Clock>,
}

/// Public API
impl PositionLedger {
    /// Build a ledger from a seed, reading dates from the system clock.
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(
        config: LedgerConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let plans = config
            .plans
            .into_iter()
            .map(|plan| InvestmentPlan {
                id: plan.id,
                name: plan.name,
                description: plan.description,
                min_investment: plan.min_investment,
                expected_return: plan.expected_return,
                duration: plan.duration,
                risk: plan.risk,
                position: plan.position,
            })
            .collect();

        let mut balance = AccountBalance::new(config.available_balance);
        let mut transactions = HashSet::new();
        let mut next_record: WithdrawalId = 1;
        let mut next_transaction: u64 = 1;

        for entry in config.history {
            // an id at the top of the range only reserves itself
            if let Some(next) = transaction_sequence(&entry.transaction)
                .and_then(|seq| seq.checked_add(1))
            {
                next_transaction = next_transaction.max(next);
            }
            transactions.insert(entry.transaction.clone());
            balance.push(WithdrawalRecord {
                id: next_record,
                amount: entry.amount,
                method: entry.method,
                status: entry.status,
                created_on: entry.date,
                transaction: entry.transaction,
            });
            next_record += 1;
        }

        Ok(Self {
            plans,
            methods: config.payment_methods,
            balance,
            transactions,
            submissions: HashMap::new(),
            next_record,
            next_transaction,
            clock: Box::new(clock),
        })
    }

    /// Run the ledger over a stream of commands. Failed commands are logged
    /// and skipped.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a rejected command must not stop the stream
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current ledger state.
    pub fn apply(&mut self, command: Command) -> Result<(), LedgerError> {
        match command {
            Command::Join { plan, amount } => {
                self.join_plan(&plan, amount)?;
            }
            Command::Update { plan, amount } => {
                self.update_position(&plan, amount)?;
            }
            Command::Delete { plan } => {
                self.delete_position(&plan)?;
            }
            Command::Withdraw(request) => {
                self.request_withdrawal(request)?;
            }
        }
        Ok(())
    }

    /// Open a position of `amount` in an unjoined plan, dated today.
    pub fn join_plan(&mut self, plan: &PlanId, amount: Amount) -> Result<Position, LedgerError> {
        let result = self.apply_join(plan, amount);
        Self::log_result("join", Some(plan), Some(amount), &result);
        result
    }

    /// Replace the invested amount of a joined plan. The join date is kept.
    pub fn update_position(
        &mut self,
        plan: &PlanId,
        amount: Amount,
    ) -> Result<Position, LedgerError> {
        let result = self.apply_update(plan, amount);
        Self::log_result("update", Some(plan), Some(amount), &result);
        result
    }

    /// Reset a plan to the unjoined state and return the closed position.
    ///
    /// Deleting a plan that is not joined is a no-op returning `Ok(None)`.
    pub fn delete_position(&mut self, plan: &PlanId) -> Result<Option<Position>, LedgerError> {
        let result = self.apply_delete(plan);
        Self::log_result("delete", Some(plan), None, &result);
        result
    }

    /// Record a `Pending` withdrawal against the withdrawable balance.
    ///
    /// A request carrying an idempotency key that was already accepted with
    /// the same parameters returns the original record instead of creating
    /// a second one.
    pub fn request_withdrawal(
        &mut self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalRecord, LedgerError> {
        let amount = request.amount;
        let result = self.apply_withdrawal(request);
        Self::log_result("withdraw", None, Some(amount), &result);
        result
    }

    /// All plans in catalog order.
    pub fn plans(&self) -> impl Iterator<Item = &InvestmentPlan> + '_ {
        self.plans.iter()
    }

    pub fn plan(&self, plan: &PlanId) -> Option<&InvestmentPlan> {
        self.plans.iter().find(|p| &p.id == plan)
    }

    /// Plans partitioned into joined and available, catalog order kept in both.
    pub fn list_plans(&self) -> PlanListing<'_> {
        let (joined, available) = self.plans.iter().partition(|plan| plan.is_joined());
        PlanListing { joined, available }
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.methods
    }

    pub fn balance(&self) -> BalanceSnapshot<'_> {
        BalanceSnapshot {
            available: self.balance.available(),
            pending: self.balance.pending(),
            withdrawable: self.balance.withdrawable(),
            history: self.balance.newest_first(),
        }
    }

    pub fn account(&self) -> &AccountBalance {
        &self.balance
    }

    /// `percent`% of the withdrawable balance, for the quick amount buttons.
    pub fn quick_amount(&self, percent: u32) -> Result<Amount, ValidationError> {
        if !(1..=100).contains(&percent) {
            return Err(ValidationError::PercentOutOfRange(percent));
        }
        Ok(self.balance.withdrawable().max(Amount::ZERO).percent(percent))
    }
}

/// Private API
impl PositionLedger {
    /// Small helper to log operation results
    fn log_result<T>(
        op: &str,
        plan: Option<&PlanId>,
        amount: Option<Amount>,
        result: &Result<T, LedgerError>,
    ) {
        let plan = plan.map(field::display);
        let amount = amount.map(field::display);
        match result {
            Ok(_) => {
                info!(plan, amount, "{op} applied");
            }
            Err(e) => {
                info!(plan, amount, reason = %e, "{op} skipped");
            }
        }
    }

    fn plan_mut(&mut self, plan: &PlanId) -> Result<&mut InvestmentPlan, NotFoundError> {
        self.plans
            .iter_mut()
            .find(|p| &p.id == plan)
            .ok_or_else(|| NotFoundError::Plan(plan.clone()))
    }

    /// Amount must be positive and meet the plan's minimum
    fn check_investment(plan: &InvestmentPlan, amount: Amount) -> Result<(), ValidationError> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        if amount < plan.min_investment {
            return Err(ValidationError::BelowMinimum {
                plan: plan.id.clone(),
                minimum: plan.min_investment,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Join:
    /// - Plan must exist and be unjoined
    /// - Amount must be positive and at least the plan minimum
    /// - Position is dated today
    fn apply_join(&mut self, plan: &PlanId, amount: Amount) -> Result<Position, LedgerError> {
        let today = self.clock.today();
        let entry = self.plan_mut(plan)?;

        // state is checked before the amount so a second join always conflicts
        if entry.is_joined() {
            return Err(ConflictError::AlreadyJoined(plan.clone()).into());
        }
        Self::check_investment(entry, amount)?;

        let position = Position {
            invested: amount,
            joined_on: today,
        };
        entry.position = Some(position);
        Ok(position)
    }

    /// Update:
    /// - Plan must exist and be joined
    /// - Amount must be positive and at least the plan minimum
    /// - Only the invested amount changes
    fn apply_update(&mut self, plan: &PlanId, amount: Amount) -> Result<Position, LedgerError> {
        let entry = self.plan_mut(plan)?;

        if !entry.is_joined() {
            return Err(ConflictError::NotJoined(plan.clone()).into());
        }
        Self::check_investment(entry, amount)?;

        let position = entry
            .position
            .as_mut()
            .ok_or_else(|| ConflictError::NotJoined(plan.clone()))?;
        position.invested = amount;
        Ok(*position)
    }

    fn apply_delete(&mut self, plan: &PlanId) -> Result<Option<Position>, LedgerError> {
        let entry = self.plan_mut(plan)?;
        Ok(entry.position.take())
    }

    /// Withdraw:
    /// - Replay a known idempotency key, or reject it if the request differs
    /// - Amount must be positive
    /// - Payment method must be given and known
    /// - Account details must be given
    /// - Amount must not exceed the withdrawable balance at call time
    /// - Record is appended as `Pending` with a fresh transaction id
    fn apply_withdrawal(
        &mut self,
        request: WithdrawalRequest,
    ) -> Result<WithdrawalRecord, LedgerError> {
        if let Some(key) = &request.idempotency_key {
            if let Some(previous) = self.submissions.get(key) {
                if previous.request != request {
                    return Err(ConflictError::IdempotencyKeyReused(key.clone()).into());
                }
                if let Some(record) = self.record(previous.record) {
                    return Ok(record.clone());
                }
            }
        }

        if !request.amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(request.amount).into());
        }
        if request.method.0.trim().is_empty() {
            return Err(ValidationError::MissingPaymentMethod.into());
        }
        let method = self
            .methods
            .iter()
            .find(|m| m.id == request.method)
            .map(|m| m.name.clone())
            .ok_or_else(|| ValidationError::UnknownPaymentMethod(request.method.clone()))?;
        if request.account_details.trim().is_empty() {
            return Err(ValidationError::MissingAccountDetails.into());
        }

        let withdrawable = self.balance.withdrawable();
        if request.amount > withdrawable {
            return Err(ValidationError::ExceedsWithdrawable {
                withdrawable,
                requested: request.amount,
            }
            .into());
        }

        let record = WithdrawalRecord {
            id: self.next_record,
            amount: request.amount,
            method,
            status: WithdrawalStatus::Pending,
            created_on: self.clock.today(),
            transaction: self.issue_transaction_id(),
        };
        self.next_record += 1;
        self.balance.push(record.clone());

        if let Some(key) = request.idempotency_key.clone() {
            self.submissions.insert(
                key,
                Submission {
                    request,
                    record: record.id,
                },
            );
        }

        Ok(record)
    }

    fn record(&self, id: WithdrawalId) -> Option<&WithdrawalRecord> {
        self.balance.records().iter().find(|r| r.id == id)
    }

    /// Next `TXNnnnnnn` id not already in use
    fn issue_transaction_id(&mut self) -> TransactionId {
        loop {
            let id = TransactionId(format!(
                "{TRANSACTION_PREFIX}{:06}",
                self.next_transaction
            ));
            self.next_transaction = self.next_transaction.wrapping_add(1);
            if self.transactions.insert(id.clone()) {
                return id;
            }
        }
    }
}

/// Numeric part of a `TXN`-prefixed id, if it has one.
fn transaction_sequence(id: &TransactionId) -> Option<u64> {
    id.0.strip_prefix(TRANSACTION_PREFIX)?.parse().ok()
}
