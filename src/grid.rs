//! In-memory spreadsheet grid.
//!
//! A [`Grid`] is the decoded form of a spreadsheet export: rows of
//! optional cell values addressed with 1-based row and column indices.
//! The importer only ever reads from it.

use crate::error::Result;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A scalar value held by a spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Free text.
    Text(String),
    /// Binary floating point number, as stored by spreadsheet engines.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
}

impl CellValue {
    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value counts as "present" for fallbacks and blank-row
    /// detection.
    ///
    /// Empty text and a numeric zero are not truthy. This means a zero
    /// amount in the inbound column falls through to the outbound column,
    /// which is a known edge case of the amount selection.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Number(n) => *n != 0.0,
            CellValue::Date(_) => true,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

/// Returns true when no value in the slice is truthy.
pub fn is_blank(values: &[Option<CellValue>]) -> bool {
    !values.iter().flatten().any(CellValue::is_truthy)
}

/// A borrowed view of one cell with its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell<'a> {
    /// 1-based row index.
    pub row: usize,
    /// 1-based column index.
    pub column: usize,
    pub value: Option<&'a CellValue>,
}

impl Cell<'_> {
    /// Spreadsheet coordinate such as `C7`.
    pub fn coordinate(&self) -> String {
        format!("{}{}", column_letter(self.column), self.row)
    }
}

/// Converts a 1-based column index to its spreadsheet letters (1 -> A, 27 -> AA).
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Workbook file extensions decoded with [`Grid::from_workbook_path`].
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Whether `path` names a workbook rather than a CSV export.
pub fn is_workbook_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn decode_csv_record(record: &str, delimiter: u8) -> Result<Vec<Option<CellValue>>> {
    if record.is_empty() {
        return Ok(Vec::new());
    }

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(record.as_bytes());

    let mut fields = StringRecord::new();
    if !csv_reader.read_record(&mut fields)? {
        return Ok(Vec::new());
    }

    Ok(fields
        .iter()
        .map(|field| {
            if field.is_empty() {
                None
            } else {
                Some(CellValue::Text(field.to_string()))
            }
        })
        .collect())
}

fn cell_value_from_data(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Text(b.to_string())),
        Data::DateTime(_) | Data::DateTimeIso(_) => match data.as_date() {
            Some(date) => Some(CellValue::Date(date)),
            None => Some(CellValue::Text(data.to_string())),
        },
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}

/// Rectangular-ish collection of cells; rows may have different lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Option<CellValue>>>,
}

impl Grid {
    /// Build a grid from rows of values. The first row becomes row 1.
    pub fn from_rows(rows: Vec<Vec<Option<CellValue>>>) -> Self {
        Self { rows }
    }

    /// Decode a CSV export into a grid.
    ///
    /// Every non-empty field becomes a text cell and empty fields become
    /// absent cells. Rows keep their own length. Empty lines are kept as
    /// empty rows, so grid row N is line N of the file unless a quoted
    /// field spans several lines.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::fs::File;
    /// use chebanca_statement::grid::Grid;
    ///
    /// let mut file = File::open("movimenti.csv")?;
    /// let grid = Grid::from_csv_read(&mut file, b',')?;
    /// println!("{} rows", grid.row_count());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_csv_read<R: Read>(reader: &mut R, delimiter: u8) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        // The csv reader skips empty lines, so records are cut here and
        // each one is decoded on its own.
        let mut rows = Vec::new();
        let mut pending = String::new();
        for line in content.lines() {
            if !pending.is_empty() {
                pending.push('\n');
            }
            pending.push_str(line);

            // An odd number of quotes means a quoted field continues.
            if pending.matches('"').count() % 2 == 1 {
                continue;
            }
            rows.push(decode_csv_record(&pending, delimiter)?);
            pending.clear();
        }
        if !pending.is_empty() {
            rows.push(decode_csv_record(&pending, delimiter)?);
        }

        log::debug!("Decoded CSV grid with {} rows", rows.len());
        Ok(Self { rows })
    }

    /// Decode the first worksheet of a workbook (`.xlsx`, `.xlsm`, `.xls`,
    /// `.ods`) into a grid.
    ///
    /// Cells keep their type: numbers stay binary floats and date cells
    /// become dates. The sheet's used range is placed at its real
    /// position, so grid coordinates match the workbook's.
    pub fn from_workbook_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => {
                log::warn!("Workbook has no worksheets");
                return Ok(Self::default());
            }
        };

        let (first_row, first_column) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<Option<CellValue>>> = vec![Vec::new(); first_row as usize];
        for sheet_row in range.rows() {
            let mut row = vec![None; first_column as usize];
            row.extend(sheet_row.iter().map(cell_value_from_data));
            rows.push(row);
        }

        log::debug!("Decoded workbook grid with {} rows", rows.len());
        Ok(Self { rows })
    }

    /// Number of rows in the grid.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values of a 1-based row. Rows outside the grid are empty.
    pub fn row(&self, index: usize) -> &[Option<CellValue>] {
        index
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Value at a 1-based position.
    pub fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        column
            .checked_sub(1)
            .and_then(|c| self.row(row).get(c))
            .and_then(Option::as_ref)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().map(move |(c, value)| Cell {
                row: r + 1,
                column: c + 1,
                value: value.as_ref(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(3), "C");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
    }

    #[test]
    fn test_row_and_value_are_one_based() {
        let grid = Grid::from_rows(vec![
            vec![Some("a".into()), None],
            vec![None, Some(CellValue::Number(1.5))],
        ]);
        assert_eq!(grid.value(1, 1), Some(&CellValue::Text("a".into())));
        assert_eq!(grid.value(2, 2), Some(&CellValue::Number(1.5)));
        assert_eq!(grid.value(2, 1), None);
        assert_eq!(grid.value(0, 1), None);
        assert!(grid.row(3).is_empty());
        assert!(grid.row(0).is_empty());
    }

    #[test]
    fn test_cells_row_major() {
        let grid = Grid::from_rows(vec![
            vec![Some("a".into()), Some("b".into())],
            vec![Some("c".into())],
        ]);
        let coords: Vec<String> = grid.cells().map(|c| c.coordinate()).collect();
        assert_eq!(coords, vec!["A1", "B1", "A2"]);
    }

    #[test]
    fn test_truthiness() {
        assert!(CellValue::from("x").is_truthy());
        assert!(!CellValue::from("").is_truthy());
        assert!(!CellValue::Number(0.0).is_truthy());
        assert!(CellValue::Number(-3.0).is_truthy());
        assert!(is_blank(&[
            None,
            Some("".into()),
            Some(CellValue::Number(0.0))
        ]));
        assert!(!is_blank(&[None, Some("x".into())]));
        assert!(is_blank(&[]));
    }

    #[test]
    fn test_from_csv_read() {
        let data = "Estratto conto,,\n\
                    Data contabile,Tipologia,Entrate\n\
                    01/01/2023,Bonifico,\"1.234,56\"\n";
        let grid = Grid::from_csv_read(&mut data.as_bytes(), b',').unwrap();
        assert_eq!(grid.row_count(), 3);
        assert_eq!(
            grid.value(1, 1),
            Some(&CellValue::Text("Estratto conto".into()))
        );
        assert_eq!(grid.value(1, 2), None);
        assert_eq!(grid.value(3, 3), Some(&CellValue::Text("1.234,56".into())));
    }

    #[test]
    fn test_from_csv_read_semicolon() {
        let data = "Data contabile;Tipologia\n01/01/2023;Bonifico\n";
        let grid = Grid::from_csv_read(&mut data.as_bytes(), b';').unwrap();
        assert_eq!(grid.value(2, 2), Some(&CellValue::Text("Bonifico".into())));
    }

    #[test]
    fn test_from_csv_read_keeps_empty_lines() {
        let data = "\n\nData contabile,Tipologia\n01/01/2023,Bonifico\n\nSaldo finale,\n";
        let grid = Grid::from_csv_read(&mut data.as_bytes(), b',').unwrap();
        assert_eq!(grid.row_count(), 6);
        assert!(grid.row(1).is_empty());
        assert!(grid.row(2).is_empty());
        assert_eq!(grid.value(3, 1), Some(&CellValue::from("Data contabile")));
        assert!(grid.row(5).is_empty());
        assert_eq!(grid.value(6, 1), Some(&CellValue::from("Saldo finale")));
    }

    #[test]
    fn test_from_csv_read_quoted_newline() {
        let data = "Tipologia,Entrate\r\n\"Bonifico - riga uno\nriga due\",\"1,00\"\r\n";
        let grid = Grid::from_csv_read(&mut data.as_bytes(), b',').unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(
            grid.value(2, 1),
            Some(&CellValue::from("Bonifico - riga uno\nriga due"))
        );
        assert_eq!(grid.value(2, 2), Some(&CellValue::from("1,00")));
    }

    #[test]
    fn test_from_csv_read_strips_bom() {
        let data = "\u{feff}Data contabile,Tipologia\n";
        let grid = Grid::from_csv_read(&mut data.as_bytes(), b',').unwrap();
        assert_eq!(grid.value(1, 1), Some(&CellValue::from("Data contabile")));
    }

    #[test]
    fn test_is_workbook_path() {
        assert!(is_workbook_path("movimenti.xlsx"));
        assert!(is_workbook_path("/tmp/Movimenti.XLS"));
        assert!(is_workbook_path("conto.ods"));
        assert!(!is_workbook_path("movimenti.csv"));
        assert!(!is_workbook_path("movimenti"));
    }

    #[test]
    fn test_cell_value_from_data() {
        assert_eq!(cell_value_from_data(&Data::Empty), None);
        assert_eq!(
            cell_value_from_data(&Data::String("Bonifico".into())),
            Some(CellValue::from("Bonifico"))
        );
        assert_eq!(
            cell_value_from_data(&Data::Float(100.5)),
            Some(CellValue::Number(100.5))
        );
        assert_eq!(
            cell_value_from_data(&Data::Int(-3)),
            Some(CellValue::Number(-3.0))
        );
        assert_eq!(
            cell_value_from_data(&Data::DateTimeIso("2023-01-31T00:00:00".into())),
            Some(CellValue::Date(NaiveDate::from_ymd_opt(2023, 1, 31).unwrap()))
        );
    }
}
