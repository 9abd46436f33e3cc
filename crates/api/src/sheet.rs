// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Spreadsheet reading for load files.
//!
//! A load file is turned into a grid of trimmed cell strings, the header row
//! is located among the leading rows, and every data row below it is mapped
//! into a typed [`RawClassRow`]. The header may sit anywhere in the first
//! [`HEADER_SCAN_ROWS`] rows because faculties prepend title blocks.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::ReaderBuilder;
use loadbill_domain::{CanonicalField, RawClassRow};
use thiserror::Error;
use tracing::debug;

/// Number of leading rows searched for the header.
pub const HEADER_SCAN_ROWS: usize = 20;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Structural problems that make a load file unusable as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No scanned row carried every required column.
    #[error("Missing required columns: {}", .missing.join(", "))]
    HeaderNotFound {
        /// Required headers absent from the last scanned row.
        missing: Vec<String>,
    },
    /// The bytes could not be read as a spreadsheet.
    #[error("Unreadable spreadsheet: {0}")]
    UnreadableSpreadsheet(String),
    /// The stored upload is gone.
    #[error("Stored file not found: {path}")]
    SourceMissing {
        /// Storage path recorded for the upload.
        path: String,
    },
}

/// Container formats accepted for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Comma separated text.
    Csv,
    /// Any workbook calamine can open (xlsx, xlsm, xlsb, xls, ods).
    Workbook,
}

impl SheetFormat {
    /// Picks the format from the original filename's extension.
    ///
    /// # Errors
    ///
    /// Returns `UnreadableSpreadsheet` for unknown or missing extensions.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension: String = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            _ => Err(ExtractError::UnreadableSpreadsheet(format!(
                "unsupported file type '{filename}'"
            ))),
        }
    }
}

/// Where the header row was found and how its columns map to fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLocation {
    /// 0-based grid index of the header row.
    pub row_index: usize,
    /// The header cells as they appear on the sheet.
    pub columns: Vec<String>,
    /// `(column index, field)` pairs, in column order.
    pub mapping: Vec<(usize, CanonicalField)>,
}

/// The data rows of a load file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSheet {
    /// Where the header was found.
    pub header: HeaderLocation,
    /// Data rows between the header and the first blank-key row.
    pub rows: Vec<RawClassRow>,
}

/// Reads the bytes of a load file into a grid of trimmed cell strings.
///
/// CSV records may have differing lengths; no header is assumed in either
/// format. Workbooks contribute their first worksheet only.
///
/// # Errors
///
/// Returns `UnreadableSpreadsheet` if the format is unknown or the content
/// cannot be parsed.
pub fn load_grid(bytes: &[u8], filename: &str) -> Result<Vec<Vec<String>>, ExtractError> {
    let grid: Vec<Vec<String>> = match SheetFormat::from_filename(filename)? {
        SheetFormat::Csv => load_csv_grid(bytes)?,
        SheetFormat::Workbook => load_workbook_grid(bytes)?,
    };
    debug!(filename, rows = grid.len(), "Loaded spreadsheet grid");
    Ok(grid)
}

fn load_csv_grid(bytes: &[u8]) -> Result<Vec<Vec<String>>, ExtractError> {
    let content: &[u8] = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut grid: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record: csv::StringRecord =
            record.map_err(|e| ExtractError::UnreadableSpreadsheet(e.to_string()))?;
        grid.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    Ok(grid)
}

fn load_workbook_grid(bytes: &[u8]) -> Result<Vec<Vec<String>>, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExtractError::UnreadableSpreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            ExtractError::UnreadableSpreadsheet(String::from("workbook has no worksheets"))
        })?
        .map_err(|e| ExtractError::UnreadableSpreadsheet(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Maps one row's cells to canonical fields. The first column carrying a
/// given header wins.
fn map_columns(cells: &[String]) -> Vec<(usize, CanonicalField)> {
    let mut mapping: Vec<(usize, CanonicalField)> = Vec::new();
    for (column, cell) in cells.iter().enumerate() {
        let Some(field) = CanonicalField::from_header(cell) else {
            continue;
        };
        if !mapping.iter().any(|(_, f)| *f == field) {
            mapping.push((column, field));
        }
    }
    mapping
}

fn missing_headers(mapping: &[(usize, CanonicalField)]) -> Vec<String> {
    CanonicalField::ALL
        .into_iter()
        .filter(|field| !mapping.iter().any(|(_, f)| f == field))
        .map(|field| field.header().to_string())
        .collect()
}

/// Finds the first of the leading rows that carries every required column.
///
/// Header cells are compared after trimming, case folding, whitespace
/// collapsing and accent folding.
///
/// # Errors
///
/// Returns `HeaderNotFound` with the headers missing from the last scanned
/// row when no row qualifies.
pub fn locate_header(grid: &[Vec<String>]) -> Result<HeaderLocation, ExtractError> {
    let mut missing: Vec<String> = missing_headers(&[]);

    for (row_index, cells) in grid.iter().enumerate().take(HEADER_SCAN_ROWS) {
        let mapping: Vec<(usize, CanonicalField)> = map_columns(cells);
        missing = missing_headers(&mapping);
        if missing.is_empty() {
            debug!(row_index, "Located header row");
            return Ok(HeaderLocation {
                row_index,
                columns: cells.clone(),
                mapping,
            });
        }
    }

    Err(ExtractError::HeaderNotFound { missing })
}

/// Maps every data row below the header into a typed row.
///
/// Data ends at the first row whose key columns (subject code, subject name,
/// coordination code) are all blank; without such a row every remaining row
/// is data. Row numbers are 1-based spreadsheet rows.
#[must_use]
pub fn extract_rows(grid: &[Vec<String>], header: &HeaderLocation) -> Vec<RawClassRow> {
    let mut rows: Vec<RawClassRow> = Vec::new();

    for (index, cells) in grid.iter().enumerate().skip(header.row_index + 1) {
        let row_number: i32 = i32::try_from(index + 1).unwrap_or(i32::MAX);
        let mut raw: RawClassRow = RawClassRow::new(row_number);
        for &(column, field) in &header.mapping {
            if let Some(value) = cells.get(column) {
                raw.set(field, value);
            }
        }
        if raw.is_key_blank() {
            break;
        }
        rows.push(raw);
    }

    rows
}

/// Reads, locates and extracts a load file held in memory.
///
/// # Errors
///
/// Returns any structural [`ExtractError`].
pub fn read_class_rows(bytes: &[u8], filename: &str) -> Result<ExtractedSheet, ExtractError> {
    let grid: Vec<Vec<String>> = load_grid(bytes, filename)?;
    let header: HeaderLocation = locate_header(&grid)?;
    let rows: Vec<RawClassRow> = extract_rows(&grid, &header);
    Ok(ExtractedSheet { header, rows })
}

/// Reads a stored load file from disk.
///
/// `filename` is the original upload name and selects the format.
///
/// # Errors
///
/// Returns `SourceMissing` if the file is gone, or any other
/// [`ExtractError`].
pub fn read_stored_file(path: &Path, filename: &str) -> Result<ExtractedSheet, ExtractError> {
    let bytes: Vec<u8> = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::SourceMissing {
                path: path.display().to_string(),
            }
        } else {
            ExtractError::UnreadableSpreadsheet(e.to_string())
        }
    })?;
    read_class_rows(&bytes, filename)
}
