//! CSV export of normalized transactions.

use crate::error::Result;
use crate::types::Statement;
use csv::Writer;
use serde::Serialize;
use std::io::Write;

/// Represents a CSV statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvStatement {
    /// The underlying statement data.
    pub statement: Statement,
}

/// CSV transaction record structure.
#[derive(Debug, Serialize)]
struct CsvRecord {
    id: String,
    date: String,
    user_date: String,
    #[serde(rename = "type")]
    trntype: String,
    amount: String,
    currency: String,
    memo: String,
}

impl CsvStatement {
    /// Write the statement's transactions as CSV with a header row.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use chebanca_statement::csv_format::CsvStatement;
    /// use chebanca_statement::types::Statement;
    ///
    /// let csv = CsvStatement { statement: Statement::default() };
    /// let mut file = File::create("output.csv")?;
    /// csv.write_to(&mut file)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut csv_writer = Writer::from_writer(writer);

        for line in &self.statement.lines {
            let record = CsvRecord {
                id: line.id.clone(),
                date: line.date.format("%Y-%m-%d").to_string(),
                user_date: line
                    .user_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                trntype: line.trntype.code().to_string(),
                amount: line.amount.to_string(),
                currency: line
                    .currency
                    .as_ref()
                    .map(|c| c.symbol.clone())
                    .unwrap_or_default(),
                memo: line.memo.clone().unwrap_or_default(),
            };

            csv_writer.serialize(record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
