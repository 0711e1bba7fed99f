//! Error types for the chebanca_statement library.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Column groups the transaction table must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    /// "Data contabile" or "Data valuta".
    Date,
    /// "Entrate" or "Uscite".
    Amount,
    /// "Tipologia".
    Type,
}

impl fmt::Display for ColumnGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnGroup::Date => "date",
            ColumnGroup::Amount => "amount",
            ColumnGroup::Type => "type",
        };
        f.write_str(name)
    }
}

/// Error types that can occur while importing and exporting statements.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error decoding or writing CSV.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error decoding a workbook.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Error writing XML output.
    #[error("XML error: {0}")]
    XmlError(String),

    /// No cell of the document matches a known header label.
    #[error("No transaction table found: no cell matches a known header label")]
    TableNotFound,

    /// The header row lacks a column the importer cannot do without.
    #[error("No {0} column found")]
    RequiredColumnMissing(ColumnGroup),

    /// A date cell does not match `dd/mm/yyyy`.
    #[error("Invalid date at row {row}: {value:?}")]
    DateParse { row: usize, value: String },

    /// An amount cell cannot be read as a decimal.
    #[error("Invalid amount at row {row}: {value:?}")]
    InvalidAmount { row: usize, value: String },

    /// An assembled record lacks a mandatory attribute.
    #[error("Invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    /// Invalid format specified.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
