//! CheBanca! spreadsheet statement parser.
//!
//! Turns a decoded [`Grid`] into a [`Statement`]: the transaction table is
//! located with [`TableLayout::locate`], then every row below the header is
//! read until the first blank row.

use crate::classification::{classify, LABEL_DELIMITER};
use crate::error::{Error, Result};
use crate::fields::{Field, TableLayout};
use crate::grid::{is_blank, CellValue, Grid};
use crate::types::{Currency, Statement, TransactionRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Textual date format used by the export.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Statement-level values the export itself does not carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserSettings {
    pub bank_id: Option<String>,
    pub account_id: Option<String>,
    /// Default currency of the account.
    pub currency: Option<String>,
}

/// The cells of one data row, starting at the table's first column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSlice<'a> {
    /// 1-based grid row.
    pub row: usize,
    pub cells: &'a [Option<CellValue>],
}

/// Iterator over the data rows of a table, ending at the first blank row.
#[derive(Debug, Clone)]
pub struct RowSlices<'a> {
    grid: &'a Grid,
    layout: &'a TableLayout,
    next_row: usize,
    done: bool,
}

impl<'a> Iterator for RowSlices<'a> {
    type Item = RowSlice<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let cells = self.layout.slice(self.grid.row(self.next_row));
        if is_blank(cells) {
            self.done = true;
            return None;
        }

        let row = self.next_row;
        self.next_row += 1;
        Some(RowSlice { row, cells })
    }
}

/// Parser for one CheBanca! export.
#[derive(Debug, Clone)]
pub struct CheBancaParser {
    grid: Grid,
    layout: TableLayout,
    settings: ParserSettings,
}

impl CheBancaParser {
    /// Locate the transaction table in `grid`.
    ///
    /// Fails when the grid has no recognizable header or the header lacks
    /// a date, amount or type column.
    pub fn new(grid: Grid) -> Result<Self> {
        let layout = TableLayout::locate(&grid)?;
        Ok(Self {
            grid,
            layout,
            settings: ParserSettings::default(),
        })
    }

    /// Decode a CSV export and locate its transaction table.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use chebanca_statement::chebanca::CheBancaParser;
    ///
    /// let mut file = File::open("movimenti.csv")?;
    /// let statement = CheBancaParser::from_csv_read(&mut file, b',')?.parse()?;
    /// println!("{} transactions", statement.lines.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_csv_read<R: Read>(reader: &mut R, delimiter: u8) -> Result<Self> {
        Self::new(Grid::from_csv_read(reader, delimiter)?)
    }

    /// Decode the first worksheet of a workbook and locate its
    /// transaction table.
    pub fn from_workbook_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(Grid::from_workbook_path(path)?)
    }

    /// Set statement-level values copied into the parsed statement.
    pub fn with_settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Parse every data row into a statement.
    ///
    /// The first failing row aborts the whole parse.
    pub fn parse(&self) -> Result<Statement> {
        let mut statement = Statement {
            bank_id: self.settings.bank_id.clone(),
            account_id: self.settings.account_id.clone(),
            currency: self.settings.currency.clone(),
            ..Statement::default()
        };

        for record in self.records() {
            statement.add_line(record?);
        }

        log::debug!("Parsed {} transactions", statement.lines.len());
        Ok(statement)
    }

    /// Lazily parse data rows in order. Each call starts over from the
    /// first data row.
    pub fn records(&self) -> impl Iterator<Item = Result<TransactionRecord>> + '_ {
        self.split_records().map(move |slice| self.parse_record(&slice))
    }

    /// Raw data rows below the header, up to the first blank row.
    pub fn split_records(&self) -> RowSlices<'_> {
        RowSlices {
            grid: &self.grid,
            layout: &self.layout,
            next_row: self.layout.first_data_row(),
            done: false,
        }
    }

    /// Build one validated record from a data row.
    pub fn parse_record(&self, slice: &RowSlice<'_>) -> Result<TransactionRecord> {
        let fields = &self.layout.fields;
        let value = |field: Field| fields.value(slice.cells, field);
        let row = slice.row;

        let date = value(Field::Date)
            .filter(|v| v.is_truthy())
            .or_else(|| value(Field::UserDate))
            .filter(|v| v.is_truthy())
            .map(|v| parse_date(row, v))
            .transpose()?;

        let type_text = value(Field::Type).map(ToString::to_string);
        let memo = type_text.as_deref().and_then(derive_memo);

        let amount = value(Field::In)
            .filter(|v| v.is_truthy())
            .or_else(|| value(Field::Out))
            .map(|v| parse_amount(row, v))
            .transpose()?;

        let user_date = value(Field::UserDate)
            .filter(|v| v.is_truthy())
            .map(|v| parse_date(row, v))
            .transpose()?;

        let trntype = classify(type_text.as_deref().unwrap_or_default());

        let currency = value(Field::Currency)
            .map(|v| v.to_string().trim().to_string())
            .filter(|symbol| !symbol.is_empty())
            .map(Currency::new);

        let date = date.ok_or_else(|| Error::InvalidRecord {
            row,
            reason: "missing date".to_string(),
        })?;
        let amount = amount.ok_or_else(|| Error::InvalidRecord {
            row,
            reason: "missing amount".to_string(),
        })?;

        let record = TransactionRecord::new(date, user_date, memo, amount, trntype, currency);
        log::debug!("{:?}", record);
        Ok(record)
    }
}

/// Description part of a type cell: everything after the first delimiter,
/// with whitespace runs collapsed. `None` without a delimiter.
pub fn derive_memo(raw: &str) -> Option<String> {
    raw.split_once(LABEL_DELIMITER)
        .map(|(_, rest)| collapse_whitespace(rest))
}

/// Trim and collapse every whitespace run to one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_date(row: usize, value: &CellValue) -> Result<NaiveDate> {
    match value {
        CellValue::Date(date) => Ok(*date),
        CellValue::Text(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
            .map_err(|_| Error::DateParse {
                row,
                value: text.clone(),
            }),
        CellValue::Number(_) => Err(Error::DateParse {
            row,
            value: value.to_string(),
        }),
    }
}

fn parse_amount(row: usize, value: &CellValue) -> Result<Decimal> {
    let invalid = || Error::InvalidAmount {
        row,
        value: value.to_string(),
    };

    match value {
        // Go through the shortest decimal rendering of the float so the
        // amount never carries binary noise such as 100.5000000000000142.
        CellValue::Number(n) if n.is_finite() => {
            Decimal::from_str(&n.to_string()).map_err(|_| invalid())
        }
        CellValue::Text(text) => parse_amount_text(text).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Parse "1 540,00", "1.234,56" or "-12.30".
fn parse_amount_text(text: &str) -> Option<Decimal> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    Decimal::from_str(&cleaned).ok()
}
