use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use position_ledger::config::PlanConfig;
use position_ledger::model::ReturnRange;
use position_ledger::{
    Amount, Command, LedgerConfig, ManualClock, PlanId, PositionLedger, RiskLevel,
    WithdrawalRequest,
};

/// Generates valid command sequences for benchmarking.
///
/// Pattern per plan (repeating):
/// 1. Join 1000
/// 2. Update 1500
/// 3. Withdraw 1
/// 4. Delete
///
/// This ensures every command is accepted as long as the balance lasts.
pub struct CommandGenerator {
    num_plans: u32,
    total: u64,
    produced: u64,
}

impl CommandGenerator {
    pub fn new(num_plans: u32, total: u64) -> Self {
        Self {
            num_plans,
            total,
            produced: 0,
        }
    }
}

impl Iterator for CommandGenerator {
    type Item = Command;

    fn next(&mut self) -> Option<Self::Item> {
        if self.produced >= self.total {
            return None;
        }

        let round = self.produced / 4;
        let plan = PlanId((round % self.num_plans as u64).to_string());
        let command = match self.produced % 4 {
            0 => Command::Join {
                plan,
                amount: Amount::from_whole(1000),
            },
            1 => Command::Update {
                plan,
                amount: Amount::from_whole(1500),
            },
            2 => Command::Withdraw(WithdrawalRequest::new(
                Amount::from_whole(1),
                "bank",
                "DE89370400440532013000",
            )),
            _ => Command::Delete { plan },
        };

        self.produced += 1;
        Some(command)
    }
}

/// A catalog of `num_plans` plans and a balance large enough for every withdrawal.
fn config(num_plans: u32) -> LedgerConfig {
    let mut config = LedgerConfig::default();
    config.available_balance = Amount::from_whole(1_000_000_000);
    config.history.clear();
    config.plans = (0..num_plans)
        .map(|i| PlanConfig {
            id: PlanId(i.to_string()),
            name: format!("Plan {i}"),
            description: String::new(),
            min_investment: Amount::from_whole(1000),
            expected_return: ReturnRange {
                min_pct: 5,
                max_pct: 10,
            },
            duration: "12 months".to_string(),
            risk: RiskLevel::Medium,
            position: None,
        })
        .collect();
    config
}

fn ledger(num_plans: u32) -> PositionLedger {
    let clock = ManualClock::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    PositionLedger::with_clock(config(num_plans), clock).unwrap()
}

fn bench_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");

    for count in [1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut ledger = ledger(5);
                for command in CommandGenerator::new(5, count) {
                    let _ = black_box(ledger.apply(command));
                }
                ledger
            });
        });
    }

    group.finish();
}

fn bench_catalog_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    // plan lookup is linear in the catalog
    for plans in [10u32, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(plans), &plans, |b, &plans| {
            b.iter(|| {
                let mut ledger = ledger(plans);
                for command in CommandGenerator::new(plans, 10_000) {
                    let _ = black_box(ledger.apply(command));
                }
                ledger
            });
        });
    }

    group.finish();
}

fn bench_balance_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance");

    // pending is recomputed from the whole history on every read
    for withdrawals in [100u64, 1_000, 10_000] {
        let mut ledger = ledger(1);
        for _ in 0..withdrawals {
            let request = WithdrawalRequest::new(Amount::from_whole(1), "bank", "12345678");
            let _ = ledger.request_withdrawal(request);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(withdrawals),
            &ledger,
            |b, ledger| {
                b.iter(|| black_box(ledger.balance().withdrawable));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_commands,
    bench_catalog_size,
    bench_balance_snapshot,
);

criterion_main!(benches);
