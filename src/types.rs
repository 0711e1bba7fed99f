//! Normalized statement types.

use crate::classification::TransactionType;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Currency designator of a transaction, e.g. `EUR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
}

impl Currency {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

/// One normalized transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Deterministic identifier derived from the other fields.
    pub id: String,

    /// Posting date.
    pub date: NaiveDate,

    /// Value date.
    pub user_date: Option<NaiveDate>,

    /// Free-text description.
    pub memo: Option<String>,

    /// Signed amount.
    pub amount: Decimal,

    pub trntype: TransactionType,

    pub currency: Option<Currency>,
}

impl TransactionRecord {
    /// Build a record and derive its identifier.
    pub fn new(
        date: NaiveDate,
        user_date: Option<NaiveDate>,
        memo: Option<String>,
        amount: Decimal,
        trntype: TransactionType,
        currency: Option<Currency>,
    ) -> Self {
        let id = generate_transaction_id(&date, memo.as_deref(), &amount, trntype);
        Self {
            id,
            date,
            user_date,
            memo,
            amount,
            trntype,
            currency,
        }
    }
}

/// Unit separator between hashed fields.
const FIELD_SEPARATOR: &[u8] = b"\x1f";

/// SHA-256 over date, memo, amount and type.
///
/// Equal inputs always give equal ids, so repeated imports of the same
/// export can be deduplicated downstream. The amount is normalized, so
/// `100.5` and `100.50` hash alike.
pub fn generate_transaction_id(
    date: &NaiveDate,
    memo: Option<&str>,
    amount: &Decimal,
    trntype: TransactionType,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(memo.unwrap_or_default().as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(amount.normalize().to_string().as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(trntype.code().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Account statement produced by one import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Bank identification.
    pub bank_id: Option<String>,

    /// Account identification.
    pub account_id: Option<String>,

    /// Default currency of the account.
    pub currency: Option<String>,

    /// Earliest transaction date.
    pub start_date: Option<NaiveDate>,

    /// Latest transaction date.
    pub end_date: Option<NaiveDate>,

    /// Transactions in document order.
    pub lines: Vec<TransactionRecord>,
}

impl Statement {
    /// Add a transaction and widen the date range to include it.
    pub fn add_line(&mut self, line: TransactionRecord) {
        self.start_date = Some(self.start_date.map_or(line.date, |d| d.min(line.date)));
        self.end_date = Some(self.end_date.map_or(line.date, |d| d.max(line.date)));
        self.lines.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(amount: &str, memo: &str) -> TransactionRecord {
        TransactionRecord::new(
            date(2023, 1, 1),
            None,
            Some(memo.to_string()),
            Decimal::from_str(amount).unwrap(),
            TransactionType::Xfer,
            None,
        )
    }

    #[test]
    fn test_identical_records_share_id() {
        assert_eq!(
            record("100.50", "Payment").id,
            record("100.50", "Payment").id
        );
        assert_eq!(
            record("100.5", "Payment").id,
            record("100.50", "Payment").id
        );
    }

    #[test]
    fn test_id_depends_on_fields() {
        let base = record("100.50", "Payment");
        assert_ne!(base.id, record("100.51", "Payment").id);
        assert_ne!(base.id, record("100.50", "Payment 2").id);
        assert_eq!(base.id.len(), 64);
    }

    #[test]
    fn test_statement_date_range() {
        let mut statement = Statement::default();
        assert_eq!(statement.start_date, None);

        let mut late = record("1", "a");
        late.date = date(2023, 3, 10);
        let mut early = record("2", "b");
        early.date = date(2023, 1, 5);

        statement.add_line(late);
        statement.add_line(early);

        assert_eq!(statement.start_date, Some(date(2023, 1, 5)));
        assert_eq!(statement.end_date, Some(date(2023, 3, 10)));
        assert_eq!(statement.lines.len(), 2);
    }
}
