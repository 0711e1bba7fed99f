//! Transaction type classification.
//!
//! The export describes each movement with a native label such as
//! `"Bonifico - Payment from X"`. The part before the first `" - "` is
//! looked up in a fixed table to get an OFX transaction type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the native type label and the description.
pub const LABEL_DELIMITER: &str = " - ";

/// OFX transaction type codes produced by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Fee,
    Payment,
    DirectDebit,
    /// Interest.
    Int,
    Atm,
    /// Transfer.
    Xfer,
    /// Point of sale.
    Pos,
    /// Anything the table does not know.
    Other,
}

impl TransactionType {
    /// OFX code, e.g. `XFER`.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Fee => "FEE",
            TransactionType::Payment => "PAYMENT",
            TransactionType::DirectDebit => "DIRECTDEBIT",
            TransactionType::Int => "INT",
            TransactionType::Atm => "ATM",
            TransactionType::Xfer => "XFER",
            TransactionType::Pos => "POS",
            TransactionType::Other => "OTHER",
        }
    }

    /// Exact, case-sensitive lookup of a native label.
    pub fn from_native(label: &str) -> Option<Self> {
        TYPE_MAPPING
            .iter()
            .find(|(native, _)| *native == label)
            .map(|(_, trntype)| *trntype)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Native labels of the export and their transaction types.
pub const TYPE_MAPPING: &[(&str, TransactionType)] = &[
    ("Accrediti diversi", TransactionType::Credit),
    ("Addebito Canone", TransactionType::Fee),
    ("Addebito canone", TransactionType::Fee),
    ("Addebito Carta", TransactionType::Payment),
    ("Addebito SDD", TransactionType::DirectDebit),
    ("Addebito/Accredito competenze", TransactionType::Int),
    ("Bancomat", TransactionType::Atm),
    ("Bonif. v/fav.", TransactionType::Xfer),
    ("Bonifico a vostro favore per ordine e conto", TransactionType::Xfer),
    ("Bonifico dall'estero", TransactionType::Xfer),
    ("Bonifico", TransactionType::Xfer),
    ("Carta Credito.", TransactionType::Payment),
    ("Delega Unica", TransactionType::Payment),
    ("Disposizione di pagamento", TransactionType::Xfer),
    ("Disposizione", TransactionType::Xfer),
    ("Giroconto", TransactionType::Xfer),
    ("Pagam. POS", TransactionType::Pos),
    ("Pagamenti diversi", TransactionType::Payment),
    ("Pagamento imposte Delega Unificata", TransactionType::Payment),
    ("Pagamento imposte e tasse", TransactionType::Fee),
    ("Pagamento per utilizzo carta di credito", TransactionType::Payment),
    ("Pagamento tramite POS", TransactionType::Pos),
    ("Prelievo Bancomat altri Istituti", TransactionType::Atm),
    ("Prelievo Bancomat", TransactionType::Atm),
    ("Storno disposizione di pagamento", TransactionType::Xfer),
];

/// Classify a raw type cell.
///
/// Only the text before the first delimiter is used as the key; without a
/// delimiter the whole trimmed text is. Unknown keys log a warning and
/// become [`TransactionType::Other`].
pub fn classify(raw: &str) -> TransactionType {
    let native = raw
        .split_once(LABEL_DELIMITER)
        .map_or(raw, |(head, _)| head)
        .trim();

    match TransactionType::from_native(native) {
        Some(trntype) => trntype,
        None => {
            log::warn!("Mapping not found for {}", raw);
            TransactionType::Other
        }
    }
}
