use crate::Amount;
use crate::model::WithdrawalRecord;

/// Cash side of the ledger: the available balance and every withdrawal
/// ever requested against it.
///
/// Pending and withdrawable totals are derived from the record set on each
/// call so they cannot drift from it. Accepted withdrawals never exceed the
/// withdrawable balance, so once a validated seed is loaded the pending total
/// stays within `max(seeded pending, available)`.
#[derive(Debug, Default)]
pub struct AccountBalance {
    available: Amount,
    history: Vec<WithdrawalRecord>,
}

impl AccountBalance {
    pub fn new(available: Amount) -> Self {
        Self {
            available,
            history: Vec::new(),
        }
    }

    pub fn available(&self) -> Amount {
        self.available
    }

    /// Sum of all `Pending` withdrawal amounts.
    pub fn pending(&self) -> Amount {
        self.history
            .iter()
            .filter(|record| record.is_pending())
            .map(|record| record.amount)
            .sum()
    }

    pub fn withdrawable(&self) -> Amount {
        self.available - self.pending()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[WithdrawalRecord] {
        &self.history
    }

    /// Records newest first: later date first, later insertion first on ties.
    pub fn newest_first(&self) -> Vec<&WithdrawalRecord> {
        let mut records: Vec<_> = self.history.iter().collect();
        records.sort_by(|a, b| {
            b.created_on
                .cmp(&a.created_on)
                .then_with(|| b.id.cmp(&a.id))
        });
        records
    }

    pub(crate) fn push(&mut self, record: WithdrawalRecord) {
        self.history.push(record);
    }
}
