//! CheBanca! Statement Importer
//!
//! A library for turning CheBanca! spreadsheet exports of account movements
//! into normalized statements.
//!
//! # Pipeline
//!
//! - **Grid**: a decoded spreadsheet ([`grid::Grid`]), e.g. from a CSV export
//! - **Table discovery**: locate the header row and map its columns
//!   ([`fields::TableLayout`])
//! - **Extraction**: read each data row into a [`TransactionRecord`]
//!   until the first blank row ([`chebanca::CheBancaParser`])
//! - **Output**: write the statement as OFX or CSV
//!
//! # Examples
//!
//! ## Converting a CSV export to OFX
//!
//! ```no_run
//! use std::fs::File;
//! use chebanca_statement::chebanca::CheBancaParser;
//! use chebanca_statement::ofx_format::OfxStatement;
//!
//! let mut input = File::open("movimenti.csv")?;
//! let statement = CheBancaParser::from_csv_read(&mut input, b',')?.parse()?;
//!
//! let mut output = File::create("movimenti.ofx")?;
//! OfxStatement { statement }.write_to(&mut output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod grid;
pub mod fields;
pub mod classification;
pub mod types;
pub mod chebanca;
pub mod ofx_format;
pub mod csv_format;

use std::str::FromStr;

// Re-export commonly used types
pub use chebanca::{CheBancaParser, ParserSettings};
pub use classification::TransactionType;
pub use error::{Error, Result};
pub use grid::{CellValue, Grid};
pub use types::{Currency, Statement, TransactionRecord};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// OFX 2 XML
    Ofx,
    /// CSV format
    Csv,
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ofx" | "ofx2" | "xml" => Ok(Format::Ofx),
            "csv" => Ok(Format::Csv),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}
