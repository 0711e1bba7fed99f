//! Header discovery for the transaction table.
//!
//! The export places the transaction table somewhere inside the sheet,
//! below a free-form preamble. Discovery runs in two phases:
//!
//! 1. A permissive, case-insensitive row-major scan for the first cell
//!    whose text is any known header label (the anchor).
//! 2. A strict, case-sensitive scan of the anchor's row, from the anchor
//!    column rightwards, recording the offset of each known label.

use crate::error::{ColumnGroup, Error, Result};
use crate::grid::{CellValue, Grid};
use std::collections::BTreeMap;
use std::fmt;

/// Columns the importer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Posting date.
    Date,
    /// Value date.
    UserDate,
    /// Transaction type and description.
    Type,
    /// Inbound amount.
    In,
    /// Outbound amount.
    Out,
    /// Currency designator.
    Currency,
}

impl Field {
    /// Every field, in mapping order.
    pub const ALL: [Field; 6] = [
        Field::Date,
        Field::UserDate,
        Field::Type,
        Field::In,
        Field::Out,
        Field::Currency,
    ];

    /// Header label used by the export.
    pub const fn label(self) -> &'static str {
        match self {
            Field::Date => "Data contabile",
            Field::UserDate => "Data valuta",
            Field::Type => "Tipologia",
            Field::In => "Entrate",
            Field::Out => "Uscite",
            Field::Currency => "Divisa",
        }
    }

    /// Case-insensitive label match used by the anchor scan.
    fn matches_loosely(text: &str) -> bool {
        let lowered = text.to_lowercase();
        Field::ALL
            .iter()
            .any(|field| field.label().to_lowercase() == lowered)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Column offset of each recognized field, relative to the table start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    offsets: BTreeMap<Field, usize>,
}

impl FieldMap {
    /// Offset of `field` inside a row slice, if the column exists.
    pub fn offset(&self, field: Field) -> Option<usize> {
        self.offsets.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.offsets.contains_key(&field)
    }

    pub fn insert(&mut self, field: Field, offset: usize) {
        self.offsets.insert(field, offset);
    }

    /// Raw value of `field` in a row slice. Unmapped fields and missing
    /// cells both yield `None`.
    pub fn value<'a>(&self, cells: &'a [Option<CellValue>], field: Field) -> Option<&'a CellValue> {
        self.offset(field)
            .and_then(|offset| cells.get(offset))
            .and_then(Option::as_ref)
    }

    /// Checks that a date, an amount and a type column were all found.
    pub fn validate(&self) -> Result<()> {
        if !self.contains(Field::Date) && !self.contains(Field::UserDate) {
            return Err(Error::RequiredColumnMissing(ColumnGroup::Date));
        }
        if !self.contains(Field::In) && !self.contains(Field::Out) {
            return Err(Error::RequiredColumnMissing(ColumnGroup::Amount));
        }
        if !self.contains(Field::Type) {
            return Err(Error::RequiredColumnMissing(ColumnGroup::Type));
        }
        Ok(())
    }
}

impl fmt::Display for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .offsets
            .iter()
            .map(|(field, offset)| format!("{:?}={}", field, offset))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

/// Location and column mapping of the transaction table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// 1-based row holding the header labels.
    pub header_row: usize,
    /// Number of columns left of the anchor cell; row slices start here.
    pub start_column: usize,
    pub fields: FieldMap,
}

impl TableLayout {
    /// Find the transaction table in `grid`.
    ///
    /// Fails with [`Error::TableNotFound`] when no cell carries a known
    /// label, and with [`Error::RequiredColumnMissing`] when the header
    /// row lacks a date, amount or type column.
    pub fn locate(grid: &Grid) -> Result<Self> {
        let anchor = grid
            .cells()
            .find(|cell| {
                cell.value
                    .and_then(CellValue::as_text)
                    .is_some_and(Field::matches_loosely)
            })
            .ok_or(Error::TableNotFound)?;

        log::debug!(
            "Statement table start cell found at {}",
            anchor.coordinate()
        );

        let header_row = anchor.row;
        let start_column = anchor.column - 1;
        let header = grid.row(header_row).get(start_column..).unwrap_or(&[]);

        let mut fields = FieldMap::default();
        for field in Field::ALL {
            let position = header.iter().position(|value| {
                value.as_ref().and_then(CellValue::as_text) == Some(field.label())
            });
            if let Some(offset) = position {
                fields.insert(field, offset);
            }
        }

        log::debug!("Statement table mapping are {}", fields);
        fields.validate()?;

        Ok(Self {
            header_row,
            start_column,
            fields,
        })
    }

    /// First row below the header.
    pub fn first_data_row(&self) -> usize {
        self.header_row + 1
    }

    /// The part of a row that belongs to the table.
    pub fn slice<'a>(&self, row: &'a [Option<CellValue>]) -> &'a [Option<CellValue>] {
        row.get(self.start_column..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Option<CellValue> {
        Some(CellValue::from(s))
    }

    #[test]
    fn test_locate_header_with_preamble() {
        let grid = Grid::from_rows(vec![
            vec![text("Estratto conto CheBanca!")],
            vec![],
            vec![
                None,
                None,
                text("Data contabile"),
                text("Data valuta"),
                text("Tipologia"),
                text("Entrate"),
                text("Uscite"),
                text("Divisa"),
            ],
        ]);

        let layout = TableLayout::locate(&grid).unwrap();
        assert_eq!(layout.header_row, 3);
        assert_eq!(layout.start_column, 2);
        assert_eq!(layout.first_data_row(), 4);
        assert_eq!(layout.fields.offset(Field::Date), Some(0));
        assert_eq!(layout.fields.offset(Field::UserDate), Some(1));
        assert_eq!(layout.fields.offset(Field::Type), Some(2));
        assert_eq!(layout.fields.offset(Field::In), Some(3));
        assert_eq!(layout.fields.offset(Field::Out), Some(4));
        assert_eq!(layout.fields.offset(Field::Currency), Some(5));
    }

    #[test]
    fn test_no_label_is_table_not_found() {
        let grid = Grid::from_rows(vec![
            vec![text("Saldo"), text("100")],
            vec![text("Data"), text("Descrizione")],
        ]);
        assert!(matches!(
            TableLayout::locate(&grid),
            Err(Error::TableNotFound)
        ));
        assert!(matches!(
            TableLayout::locate(&Grid::default()),
            Err(Error::TableNotFound)
        ));
    }

    #[test]
    fn test_missing_amount_column() {
        let grid = Grid::from_rows(vec![vec![text("Data contabile"), text("Tipologia")]]);
        assert!(matches!(
            TableLayout::locate(&grid),
            Err(Error::RequiredColumnMissing(ColumnGroup::Amount))
        ));
    }

    #[test]
    fn test_missing_date_column() {
        let grid = Grid::from_rows(vec![vec![text("Tipologia"), text("Uscite")]]);
        assert!(matches!(
            TableLayout::locate(&grid),
            Err(Error::RequiredColumnMissing(ColumnGroup::Date))
        ));
    }

    #[test]
    fn test_missing_type_column() {
        let grid = Grid::from_rows(vec![vec![text("Data valuta"), text("Entrate")]]);
        assert!(matches!(
            TableLayout::locate(&grid),
            Err(Error::RequiredColumnMissing(ColumnGroup::Type))
        ));
    }

    #[test]
    fn test_anchor_is_case_insensitive_but_mapping_is_strict() {
        // The anchor matches "DATA CONTABILE" loosely, but the strict scan
        // does not map it, so only "Data valuta" provides a date.
        let grid = Grid::from_rows(vec![vec![
            text("DATA CONTABILE"),
            text("Data valuta"),
            text("Tipologia"),
            text("Entrate"),
        ]]);
        let layout = TableLayout::locate(&grid).unwrap();
        assert!(!layout.fields.contains(Field::Date));
        assert_eq!(layout.fields.offset(Field::UserDate), Some(1));
    }

    #[test]
    fn test_stray_label_above_table_becomes_anchor() {
        // A lone "Divisa" above the real header wins the anchor scan; its
        // row has no date column, so the document is rejected.
        let grid = Grid::from_rows(vec![
            vec![text("Divisa"), text("EUR")],
            vec![text("Data contabile"), text("Tipologia"), text("Entrate")],
        ]);
        assert!(matches!(
            TableLayout::locate(&grid),
            Err(Error::RequiredColumnMissing(ColumnGroup::Date))
        ));
    }

    #[test]
    fn test_offsets_are_relative_to_anchor() {
        let grid = Grid::from_rows(vec![vec![
            text("Note"),
            text("Tipologia"),
            text("Data contabile"),
            text("Uscite"),
        ]]);
        let layout = TableLayout::locate(&grid).unwrap();
        assert_eq!(layout.start_column, 1);
        assert_eq!(layout.fields.offset(Field::Type), Some(0));
        assert_eq!(layout.fields.offset(Field::Date), Some(1));
        assert_eq!(layout.fields.offset(Field::Out), Some(2));
    }

    #[test]
    fn test_field_map_value() {
        let mut map = FieldMap::default();
        map.insert(Field::Type, 1);
        map.insert(Field::In, 5);
        let row = vec![text("01/01/2023"), text("Bonifico")];
        assert_eq!(
            map.value(&row, Field::Type),
            Some(&CellValue::from("Bonifico"))
        );
        assert_eq!(map.value(&row, Field::In), None);
        assert_eq!(map.value(&row, Field::Out), None);
    }
}
