use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::{Amount, Command, PlanId, PositionLedger, ValidationError, WithdrawalRequest};

/// Errors that can occur when reading command rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open command file: {0}")]
    Open(csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized operation '{op}'")]
    UnrecognizedOp { line: usize, op: String },

    #[error("line {line}: {op} missing {field}")]
    MissingField {
        line: usize,
        op: String,
        field: &'static str,
    },

    #[error("line {line}: invalid amount: {source}")]
    InvalidAmount {
        line: usize,
        source: ValidationError,
    },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    op: String,
    plan: Option<String>,
    amount: Option<String>,
    method: Option<String>,
    account: Option<String>,
    key: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlanRow<'a> {
    plan: &'a str,
    name: &'a str,
    risk: String,
    min_investment: Amount,
    joined: bool,
    invested: Option<Amount>,
    joined_on: Option<String>,
}

#[derive(Debug, Serialize)]
struct BalanceRow {
    available: Amount,
    pending: Amount,
    withdrawable: Amount,
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    transaction: &'a str,
    amount: Amount,
    method: &'a str,
    status: String,
    date: String,
}

impl InputRow {
    fn into_command(self, line: usize) -> Result<Command, CsvError> {
        let op = self.op.to_lowercase();
        let missing = |field| CsvError::MissingField {
            line,
            op: op.clone(),
            field,
        };

        match op.as_str() {
            "join" | "update" | "delete" => {
                let plan = PlanId(self.plan.ok_or_else(|| missing("plan"))?);
                if op == "delete" {
                    return Ok(Command::Delete { plan });
                }
                let amount = parse_amount(self.amount, line).map_err(|e| match e {
                    None => missing("amount"),
                    Some(e) => e,
                })?;
                if op == "join" {
                    Ok(Command::Join { plan, amount })
                } else {
                    Ok(Command::Update { plan, amount })
                }
            }
            "withdraw" => {
                let amount = parse_amount(self.amount, line).map_err(|e| match e {
                    None => missing("amount"),
                    Some(e) => e,
                })?;
                let method = self.method.ok_or_else(|| missing("method"))?;
                let account = self.account.ok_or_else(|| missing("account"))?;
                let mut request = WithdrawalRequest::new(amount, method.as_str(), account);
                request.idempotency_key = self.key;
                Ok(Command::Withdraw(request))
            }
            _ => Err(CsvError::UnrecognizedOp { line, op: self.op }),
        }
    }
}

/// `Err(None)` when the field is absent.
fn parse_amount(raw: Option<String>, line: usize) -> Result<Amount, Option<CsvError>> {
    let raw = raw.ok_or(None)?;
    raw.parse::<Amount>().map_err(|e| {
        Some(CsvError::InvalidAmount {
            line,
            source: e.into(),
        })
    })
}

/// Read ledger commands from a csv file with the header
/// `op,plan,amount,method,account,key`.
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(CsvError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            row.into_command(line)
        }))
}

/// Write plans, balance and withdrawal history as three csv blocks separated
/// by a blank line.
pub fn write_report<W: Write>(ledger: &PositionLedger, mut out: W) -> Result<(), csv::Error> {
    let listing = ledger.list_plans();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for plan in listing.joined.iter().chain(listing.available.iter()) {
            writer.serialize(PlanRow {
                plan: &plan.id.0,
                name: &plan.name,
                risk: plan.risk.to_string(),
                min_investment: plan.min_investment,
                joined: plan.is_joined(),
                invested: plan.invested(),
                joined_on: plan.joined_on().map(|d| d.to_string()),
            })?;
        }
        writer.flush()?;
    }
    out.write_all(b"\n")?;

    let balance = ledger.balance();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.serialize(BalanceRow {
            available: balance.available,
            pending: balance.pending,
            withdrawable: balance.withdrawable,
        })?;
        writer.flush()?;
    }
    out.write_all(b"\n")?;

    let mut writer = csv::Writer::from_writer(&mut out);
    for record in &balance.history {
        writer.serialize(HistoryRow {
            transaction: &record.transaction.0,
            amount: record.amount,
            method: &record.method,
            status: record.status.to_string(),
            date: record.created_on.to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
