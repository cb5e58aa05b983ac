//! Shared option models, cell values, reports and errors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use rust_xlsxwriter::XlsxError;

use crate::conf::{
    N_DECIMALS_DEFAULT, N_LENGTH_FACTOR_DEFAULT, N_MARGIN_DEFAULT, N_WIDTH_EXCEL_COLUMN_MAX,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellValue

/// Normalized cell value shared by the sheet writer and the width estimator.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Boolean value.
    Boolean(bool),
    /// Exact integer value.
    Integer(i64),
    /// Floating point value, possibly NaN/Inf.
    Number(f64),
    /// Text value.
    String(String),
}

/// Display text for missing, NaN and infinite values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxValuePolicy {
    /// Text for a missing value.
    pub missing_value_str: String,
    /// Text for NaN.
    pub nan_str: String,
    /// Text for positive infinity.
    pub posinf_str: String,
    /// Text for negative infinity.
    pub neginf_str: String,
}

impl Default for SpecXlsxValuePolicy {
    fn default() -> Self {
        Self {
            missing_value_str: "NA".to_string(),
            nan_str: "NaN".to_string(),
            posinf_str: "Inf".to_string(),
            neginf_str: "-Inf".to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Width estimator options (`auto_adjust_excel_width` kwargs).
#[derive(Debug, Clone, PartialEq)]
pub struct SpecAutoAdjustOptions {
    /// Extra characters added to every column width.
    pub margin: usize,
    /// Multiplier applied to the measured character count.
    pub length_factor: f64,
    /// Fractional digits assumed for columns holding non-integer numbers.
    pub decimals: usize,
    /// Whether the row index was written as the leading column.
    pub index: bool,
    /// Upper bound of a final width.
    pub width_max: f64,
}

impl Default for SpecAutoAdjustOptions {
    fn default() -> Self {
        Self {
            margin: N_MARGIN_DEFAULT,
            length_factor: N_LENGTH_FACTOR_DEFAULT,
            decimals: N_DECIMALS_DEFAULT,
            index: true,
            width_max: N_WIDTH_EXCEL_COLUMN_MAX,
        }
    }
}

/// Per-sheet write options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSheetWriteOptions {
    /// Write the row index as the leading column.
    pub index: bool,
    /// Freeze the header row.
    pub freeze_header: bool,
}

impl Default for SpecSheetWriteOptions {
    fn default() -> Self {
        Self {
            index: true,
            freeze_header: true,
        }
    }
}

/// Writer-wide value conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExcelWriteOptions {
    /// Display text policy for missing/NaN/Inf.
    pub value_policy: SpecXlsxValuePolicy,
    /// Write missing/NaN/Inf as policy text instead of blank cells.
    pub keep_missing_values: bool,
}

/// Combined options for one `write_in_excel` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWriteInExcelOptions {
    /// Sheet layout options. `sheet.index` also drives the estimator.
    pub sheet: SpecSheetWriteOptions,
    /// Width estimator options; its `index` field is overridden by `sheet.index`.
    pub autofit: SpecAutoAdjustOptions,
    /// Writer-wide value options.
    pub write_options: SpecExcelWriteOptions,
}

impl SpecWriteInExcelOptions {
    /// Options with the given index flag and defaults elsewhere.
    pub fn with_index(index: bool) -> Self {
        Self {
            sheet: SpecSheetWriteOptions {
                index,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Column position (0-based, index column included) to width in character units.
pub type SpecColumnWidthTable = BTreeMap<usize, f64>;

/// Result of writing one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheetReport {
    /// Actual sheet name in the workbook.
    pub sheet_name: String,
    /// Number of body rows written.
    pub n_rows: usize,
    /// Number of table columns written (index excluded).
    pub n_cols: usize,
    /// Whether the index was written as the leading column.
    pub if_index: bool,
    /// Widths applied by the estimator, empty when never adjusted.
    pub widths: SpecColumnWidthTable,
}

impl SpecSheetReport {
    /// Number of columns physically present in the sheet.
    pub fn n_cols_written(&self) -> usize {
        self.n_cols + usize::from(self.if_index)
    }
}

/// Per-writer report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecExcelReport {
    /// Sheets produced by the writer, in write order.
    pub sheets: Vec<SpecSheetReport>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecExcelReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Look up a sheet entry by name.
    pub fn sheet(&self, sheet_name: &str) -> Option<&SpecSheetReport> {
        self.sheets.iter().find(|s| s.sheet_name == sheet_name)
    }

    pub(crate) fn sheet_mut(&mut self, sheet_name: &str) -> Option<&mut SpecSheetReport> {
        self.sheets.iter_mut().find(|s| s.sheet_name == sheet_name)
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let n_rows: usize = self.sheets.iter().map(|s| s.n_rows).sum();
        format!(
            "{prefix} sheets={} rows={n_rows} warnings={}",
            self.sheets.len(),
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecExcelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[XLSX]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised by the sheet writer and the width estimator.
#[derive(Debug, thiserror::Error)]
pub enum ExcelWriteError {
    /// Destination could not be created or written.
    #[error("Failed to save {}: {source}", path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Sheet name is not present in the writer.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),
    /// Sheet name already written by this writer.
    #[error("Sheet already exists: {0:?}")]
    DuplicateSheetName(String),
    /// Estimator layout disagrees with how the sheet was written.
    #[error("Sheet {sheet_name:?} layout mismatch: {message}")]
    SheetLayoutMismatch {
        /// Target sheet.
        sheet_name: String,
        /// Mismatch detail.
        message: String,
    },
    /// Index height differs from data height.
    #[error("Index length {found} does not match table height {expected}")]
    IndexLengthMismatch {
        /// Table height.
        expected: usize,
        /// Index height.
        found: usize,
    },
    /// Table does not fit into one worksheet.
    #[error("Excel limit exceeded: {0}")]
    ExceedsExcelLimit(String),
    /// Option value out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
    /// Writer used after `close()`.
    #[error("Cannot write after close().")]
    WriterClosed,
    /// Table value access failed.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    /// Worksheet operation failed.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
