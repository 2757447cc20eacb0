use calamine::{Data, Range, Reader, Xls};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{DailyConsumption, StatementType};
use crate::utils::{excel_serial_to_date, normalize_decimal_comma};

/// Column layout of the export sheet
const DATE_COL: u32 = 0;
const INDEX_COL: u32 = 1;
const CONSUMPTION_COL: u32 = 2;
const STATEMENT_TYPE_COL: u32 = 3;

/// Row 0 holds the column titles
const FIRST_DATA_ROW: u32 = 1;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to open consumption export: {0}")]
    WorkbookOpen(String),

    #[error("Empty consumption export, no sheet 0 found")]
    EmptyDocument,

    #[error("Failed to read sheet 0: {0}")]
    SheetRead(String),

    #[error("Failed to read excel date at row {row}: {value:?}")]
    InvalidDate { row: u32, value: String },

    #[error("Failed to read consumption index at row {row}: {value:?}")]
    InvalidIndex { row: u32, value: String },

    #[error("Failed to read day consumption at row {row}: {value:?}")]
    InvalidConsumption { row: u32, value: String },

    #[error("Invalid statement type at row {row}: {value:?}")]
    InvalidStatementType { row: u32, value: String },
}

impl ExportError {
    /// The raw cell text that failed validation, if the error came from a row
    pub fn raw_value(&self) -> Option<&str> {
        match self {
            ExportError::InvalidDate { value, .. }
            | ExportError::InvalidIndex { value, .. }
            | ExportError::InvalidConsumption { value, .. }
            | ExportError::InvalidStatementType { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Parser for the "historique" consumption export (legacy .xls)
///
/// # Expected Sheet Structure:
/// ```text
/// Row 0:  Header (Date | Index | Consommation | Type de relève)
/// Row 1+: date serial | meter index | daily delta | M or E
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsumptionImporter;

impl ConsumptionImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse an export previously saved to disk
    pub fn parse_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<DailyConsumption>, ExportError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ExportError::WorkbookOpen(format!("{}: {e}", path.display())))?;
        self.parse_bytes(&bytes)
    }

    /// Parse the raw bytes returned by the export endpoint
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Vec<DailyConsumption>, ExportError> {
        debug!("Opening consumption export ({} bytes)", bytes.len());

        let mut workbook: Xls<Cursor<&[u8]>> = match Xls::new(Cursor::new(bytes)) {
            Ok(wb) => wb,
            Err(e) => return Err(ExportError::WorkbookOpen(e.to_string())),
        };

        let range = first_sheet(workbook.worksheet_range_at(0))?;
        self.parse_range(&range)
    }

    /// Convert every data row of the first sheet, in sheet order
    ///
    /// Stops at the first invalid row; nothing parsed before it is returned.
    pub fn parse_range(&self, range: &Range<Data>) -> Result<Vec<DailyConsumption>, ExportError> {
        let max_row = match range.end() {
            Some((row, _)) => row,
            None => {
                info!("Consumption export sheet is empty");
                return Ok(Vec::new());
            }
        };

        let mut readings = Vec::new();
        for row in FIRST_DATA_ROW..=max_row {
            readings.push(self.parse_row(range, row)?);
        }

        info!("Parsed {} daily consumption rows", readings.len());
        Ok(readings)
    }

    fn parse_row(&self, range: &Range<Data>, row: u32) -> Result<DailyConsumption, ExportError> {
        let date_text = cell_text(range, row, DATE_COL);
        let index_text = cell_text(range, row, INDEX_COL);
        let consumption_text = cell_text(range, row, CONSUMPTION_COL);
        let type_text = cell_text(range, row, STATEMENT_TYPE_COL);

        let day = normalize_decimal_comma(&date_text)
            .parse::<f64>()
            .ok()
            .and_then(excel_serial_to_date)
            .ok_or_else(|| ExportError::InvalidDate {
                row,
                value: date_text.clone(),
            })?;

        let index = index_text
            .parse::<i64>()
            .map_err(|_| ExportError::InvalidIndex {
                row,
                value: index_text.clone(),
            })?;

        let consumption =
            consumption_text
                .parse::<i64>()
                .map_err(|_| ExportError::InvalidConsumption {
                    row,
                    value: consumption_text.clone(),
                })?;

        let statement_type = type_text
            .chars()
            .next()
            .and_then(StatementType::from_code)
            .ok_or_else(|| ExportError::InvalidStatementType {
                row,
                value: type_text.clone(),
            })?;

        Ok(DailyConsumption {
            day,
            index,
            consumption,
            statement_type,
        })
    }
}

fn first_sheet<E: std::fmt::Display>(
    sheet: Option<Result<Range<Data>, E>>,
) -> Result<Range<Data>, ExportError> {
    match sheet {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(ExportError::SheetRead(e.to_string())),
        None => Err(ExportError::EmptyDocument),
    }
}

/// Text of a cell as the export shows it; missing cells read as ""
fn cell_text(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => {
            s.clone()
        }
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::DateTime(dt)) => dt.as_f64().to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(Data::Error(e)) => e.to_string(),
        Some(Data::Empty) | None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sheet(rows: &[[&str; 4]]) -> Range<Data> {
        let mut range = Range::new((0, 0), (rows.len() as u32, 3));
        let header = ["Date", "Index", "Consommation", "Type"];
        for (col, title) in header.iter().enumerate() {
            range.set_value((0, col as u32), Data::String(title.to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                let cell = if value.is_empty() {
                    Data::Empty
                } else {
                    Data::String(value.to_string())
                };
                range.set_value((i as u32 + 1, col as u32), cell);
            }
        }
        range
    }

    #[test]
    fn test_cell_text_numeric_cells() {
        let mut range = Range::new((0, 0), (0, 2));
        range.set_value((0, 0), Data::Float(1234.0));
        range.set_value((0, 1), Data::Float(44197.5));
        range.set_value((0, 2), Data::Int(7));

        assert_eq!(cell_text(&range, 0, 0), "1234");
        assert_eq!(cell_text(&range, 0, 1), "44197.5");
        assert_eq!(cell_text(&range, 0, 2), "7");
        assert_eq!(cell_text(&range, 5, 5), "");
    }

    #[test]
    fn test_parse_single_row() {
        let range = sheet(&[["44197", "1200", "35", "M"]]);
        let readings = ConsumptionImporter::new().parse_range(&range).unwrap();

        assert_eq!(
            readings,
            vec![DailyConsumption {
                day: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                index: 1200,
                consumption: 35,
                statement_type: StatementType::Measured,
            }]
        );
    }

    #[test]
    fn test_statement_type_uses_first_character() {
        let range = sheet(&[["44197", "1200", "35", "Estimé"]]);
        let readings = ConsumptionImporter::new().parse_range(&range).unwrap();
        assert_eq!(readings[0].statement_type, StatementType::Estimated);
    }

    #[test]
    fn test_header_only_sheet() {
        let range = sheet(&[]);
        let readings = ConsumptionImporter::new().parse_range(&range).unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn test_empty_range() {
        let range: Range<Data> = Range::empty();
        let readings = ConsumptionImporter::new().parse_range(&range).unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn test_missing_first_sheet() {
        let result = first_sheet::<calamine::XlsError>(None);
        assert!(matches!(result, Err(ExportError::EmptyDocument)));
    }

    #[test]
    fn test_unreadable_first_sheet() {
        let result = first_sheet(Some(Err("corrupted sheet stream")));
        match result {
            Err(ExportError::SheetRead(msg)) => assert!(msg.contains("corrupted")),
            other => panic!("Expected SheetRead error, got {other:?}"),
        }
    }

    #[test]
    fn test_raw_value_accessor() {
        let err = ExportError::InvalidIndex {
            row: 3,
            value: "abc".to_string(),
        };
        assert_eq!(err.raw_value(), Some("abc"));
        assert_eq!(ExportError::EmptyDocument.raw_value(), None);
    }
}
