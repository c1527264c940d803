//! Property-based tests for the position ledger.
//!
//! These check invariants that hold for any sequence of commands, valid or not.

use chrono::NaiveDate;
use position_ledger::{
    Amount, Command, ConflictError, ErrorKind, LedgerConfig, LedgerError, ManualClock, PlanId,
    PositionLedger, WithdrawalRequest,
};
use proptest::prelude::*;

fn ledger() -> PositionLedger {
    let clock = ManualClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    PositionLedger::with_clock(LedgerConfig::default(), clock).unwrap()
}

// =============================================================================
// Strategies
// =============================================================================

/// Amounts between -10.00 and 20000.00, including zero.
fn arb_amount() -> impl Strategy<Value = Amount> {
    (-1_000i64..=2_000_000).prop_map(Amount::from_cents)
}

/// Seeded plan ids plus one that does not exist.
fn arb_plan() -> impl Strategy<Value = PlanId> {
    prop::sample::select(vec!["1", "2", "3", "4", "5", "missing"]).prop_map(PlanId::from)
}

fn arb_method() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["bank", "paypal", "crypto", "wire", ""])
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (arb_plan(), arb_amount()).prop_map(|(plan, amount)| Command::Join { plan, amount }),
        (arb_plan(), arb_amount()).prop_map(|(plan, amount)| Command::Update { plan, amount }),
        arb_plan().prop_map(|plan| Command::Delete { plan }),
        (arb_amount(), arb_method()).prop_map(|(amount, method)| {
            Command::Withdraw(WithdrawalRequest::new(amount, method, "12345678"))
        }),
    ]
}

// =============================================================================
// Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A joined plan always holds at least its minimum; an unjoined one holds nothing.
    #[test]
    fn positions_respect_minimums(commands in prop::collection::vec(arb_command(), 0..40)) {
        let mut ledger = ledger();
        for command in commands {
            let _ = ledger.apply(command);
            for plan in ledger.plans() {
                match plan.position() {
                    Some(position) => prop_assert!(position.invested >= plan.min_investment),
                    None => {
                        prop_assert_eq!(plan.invested(), None);
                        prop_assert_eq!(plan.joined_on(), None);
                    }
                }
            }
        }
    }

    /// Withdrawable is always available minus pending, and a rejected command
    /// leaves the balance untouched.
    #[test]
    fn withdrawable_is_available_minus_pending(
        commands in prop::collection::vec(arb_command(), 0..40),
    ) {
        let mut ledger = ledger();
        for command in commands {
            let before = ledger.account().records().len();
            let result = ledger.apply(command);
            let after = ledger.account().records().len();
            if result.is_err() {
                prop_assert_eq!(before, after);
            }

            let balance = ledger.balance();
            prop_assert_eq!(balance.withdrawable, balance.available - balance.pending);
            prop_assert!(balance.withdrawable >= Amount::ZERO);
        }
    }

    /// Joining a joined plan conflicts whatever the amount.
    #[test]
    fn second_join_conflicts(first in 7_500i64..=100_000, second in arb_amount()) {
        let mut ledger = ledger();
        let plan = PlanId::from("4");
        let first = Amount::from_whole(first);
        ledger.join_plan(&plan, first).unwrap();

        let result = ledger.join_plan(&plan, second);
        prop_assert_eq!(
            result,
            Err(LedgerError::Conflict(ConflictError::AlreadyJoined(plan.clone())))
        );
        prop_assert_eq!(ledger.plan(&plan).unwrap().invested(), Some(first));
    }

    /// Updating an unjoined plan conflicts whatever the amount.
    #[test]
    fn update_unjoined_conflicts(amount in arb_amount()) {
        let mut ledger = ledger();
        let result = ledger.update_position(&PlanId::from("1"), amount);
        prop_assert_eq!(result.map_err(|e| e.kind()), Err(ErrorKind::Conflict));
        prop_assert!(!ledger.plan(&PlanId::from("1")).unwrap().is_joined());
    }

    /// Any amount above the withdrawable balance is rejected as invalid input.
    #[test]
    fn overdraw_is_rejected(excess in 1i64..=1_000_000) {
        let mut ledger = ledger();
        let amount = ledger.balance().withdrawable + Amount::from_cents(excess);

        let result = ledger.request_withdrawal(WithdrawalRequest::new(amount, "bank", "12345678"));
        prop_assert_eq!(result.map_err(|e| e.kind()), Err(ErrorKind::Validation));
        prop_assert_eq!(ledger.balance().pending, Amount::from_whole(1000));
    }

    /// Transaction ids never repeat.
    #[test]
    fn transaction_ids_are_unique(amounts in prop::collection::vec(1i64..=100_000, 1..30)) {
        let mut ledger = ledger();
        for cents in amounts {
            let request = WithdrawalRequest::new(Amount::from_cents(cents), "crypto", "0xabc");
            let _ = ledger.request_withdrawal(request);
        }

        let mut ids: Vec<_> = ledger
            .account()
            .records()
            .iter()
            .map(|r| r.transaction.clone())
            .collect();
        let total = ids.len();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }
}
