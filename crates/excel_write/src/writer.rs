//! Scoped XLSX writer and the one-call `write_in_excel` entry point.

use std::path::{Path, PathBuf};

use polars::prelude::Column;
use rust_xlsxwriter::{ColNum, Format, Workbook, Worksheet, XlsxError};

use crate::conf::{derive_default_header_format, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::estimator::auto_adjust_excel_width;
use crate::spec::{
    EnumCellValue, ExcelWriteError, SpecAutoAdjustOptions, SpecColumnWidthTable,
    SpecExcelReport, SpecExcelWriteOptions, SpecSheetReport, SpecSheetWriteOptions,
    SpecWriteInExcelOptions,
};
use crate::table::Table;
use crate::util::{
    cast_col_num, cast_row_num, convert_nan_inf_to_str, derive_cell_value_from_any_value,
};

////////////////////////////////////////////////////////////////////////////////
// #region WriteInExcel

/// Write `table` into sheet `sheet` of a new workbook at `location`, auto-fit
/// the column widths and save.
///
/// An existing file at `location` is overwritten. An empty `sheet` falls back
/// to the default `Sheet1` naming.
pub fn write_in_excel(
    table: &Table,
    location: impl AsRef<Path>,
    sheet: &str,
    index: bool,
) -> Result<SpecExcelReport, ExcelWriteError> {
    write_in_excel_with_options(
        table,
        location,
        sheet,
        &SpecWriteInExcelOptions::with_index(index),
    )
}

/// [`write_in_excel`] with explicit layout, autofit and value options.
///
/// The workbook is saved on every exit path; when writing or width
/// adjustment fails, that first error is returned.
pub fn write_in_excel_with_options(
    table: &Table,
    location: impl AsRef<Path>,
    sheet: &str,
    options: &SpecWriteInExcelOptions,
) -> Result<SpecExcelReport, ExcelWriteError> {
    let mut writer = ExcelWriter::new(location.as_ref(), options.write_options.clone());

    let result_write = write_sheet_with_autofit(&mut writer, table, sheet, options);
    let result_close = writer.close();

    result_write?;
    result_close?;
    Ok(writer.report())
}

fn write_sheet_with_autofit(
    writer: &mut ExcelWriter,
    table: &Table,
    sheet: &str,
    options: &SpecWriteInExcelOptions,
) -> Result<(), ExcelWriteError> {
    let sheet_name = writer.write_sheet(table, sheet, &options.sheet)?;
    let options_autofit = SpecAutoAdjustOptions {
        index: options.sheet.index,
        ..options.autofit.clone()
    };
    auto_adjust_excel_width(table, writer, &sheet_name, &options_autofit)?;
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExcelWriter

/// Workbook writer bound to one output path.
///
/// The workbook is buffered in memory until [`Self::close`] is called. A
/// writer holding at least one sheet that is dropped unclosed saves itself.
pub struct ExcelWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_header: Format,
    write_options: SpecExcelWriteOptions,
    report: SpecExcelReport,
    if_closed: bool,
}

impl ExcelWriter {
    /// Create writer bound to output path and value options.
    pub fn new(path_file_out: impl Into<PathBuf>, write_options: SpecExcelWriteOptions) -> Self {
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            fmt_header: derive_default_header_format(),
            write_options,
            report: SpecExcelReport::default(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Writer-wide value options.
    pub fn write_options(&self) -> &SpecExcelWriteOptions {
        &self.write_options
    }

    /// Names of the sheets written so far, in order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.report
            .sheets
            .iter()
            .map(|sheet| sheet.sheet_name.clone())
            .collect()
    }

    /// Return snapshot of the write report.
    pub fn report(&self) -> SpecExcelReport {
        self.report.clone()
    }

    /// Whether [`Self::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.if_closed
    }

    /// Flush workbook to disk. Idempotent.
    ///
    /// The writer counts as closed even when saving fails.
    pub fn close(&mut self) -> Result<(), ExcelWriteError> {
        if self.if_closed {
            return Ok(());
        }
        self.if_closed = true;
        self.workbook
            .save(&self.path_file_out)
            .map_err(|err| derive_save_error(err, &self.path_file_out))
    }

    /// Write header row and body of `table` into a new sheet.
    ///
    /// Returns the sheet name actually used, which differs from `sheet_name`
    /// only when `sheet_name` is empty.
    pub fn write_sheet(
        &mut self,
        table: &Table,
        sheet_name: &str,
        options: &SpecSheetWriteOptions,
    ) -> Result<String, ExcelWriteError> {
        if self.if_closed {
            return Err(ExcelWriteError::WriterClosed);
        }

        let sheet_name_actual = if sheet_name.is_empty() {
            let c_name = self.derive_default_sheet_name();
            self.report
                .warn(format!("Empty sheet name; defaulted to {c_name:?}."));
            c_name
        } else {
            sheet_name.to_string()
        };
        // Excel sheet names are unique case-insensitively.
        if self
            .report
            .sheets
            .iter()
            .any(|sheet| sheet.sheet_name.to_lowercase() == sheet_name_actual.to_lowercase())
        {
            return Err(ExcelWriteError::DuplicateSheetName(sheet_name_actual));
        }

        let n_cols_written = table.width() + usize::from(options.index);
        if n_cols_written > N_NCOLS_EXCEL_MAX {
            return Err(ExcelWriteError::ExceedsExcelLimit(format!(
                "{n_cols_written} columns > {N_NCOLS_EXCEL_MAX}"
            )));
        }
        if table.height() + 1 > N_NROWS_EXCEL_MAX {
            return Err(ExcelWriteError::ExceedsExcelLimit(format!(
                "{} rows + header > {N_NROWS_EXCEL_MAX}",
                table.height()
            )));
        }

        let mut worksheet = Worksheet::new();
        worksheet.set_name(&sheet_name_actual)?;

        let n_col_offset = usize::from(options.index);
        if options.index {
            worksheet.write_string_with_format(0, 0, table.index_label(), &self.fmt_header)?;
            write_column_body(&mut worksheet, table.index(), 0, &self.write_options)?;
        }
        for (n_idx_col, col) in table.data().get_columns().iter().enumerate() {
            let n_col = cast_col_num(n_idx_col + n_col_offset)?;
            worksheet.write_string_with_format(0, n_col, col.name().as_str(), &self.fmt_header)?;
            write_column_body(&mut worksheet, col, n_col, &self.write_options)?;
        }

        if options.freeze_header {
            worksheet.set_freeze_panes(1, 0)?;
        }

        self.workbook.push_worksheet(worksheet);
        self.report.sheets.push(SpecSheetReport {
            sheet_name: sheet_name_actual.clone(),
            n_rows: table.height(),
            n_cols: table.width(),
            if_index: options.index,
            widths: SpecColumnWidthTable::new(),
        });

        Ok(sheet_name_actual)
    }

    /// Mutable access to a sheet written by this writer.
    pub fn worksheet_mut(&mut self, sheet_name: &str) -> Result<&mut Worksheet, ExcelWriteError> {
        if self.if_closed {
            return Err(ExcelWriteError::WriterClosed);
        }
        if self.report.sheet(sheet_name).is_none() {
            return Err(ExcelWriteError::SheetNotFound(sheet_name.to_string()));
        }
        Ok(self.workbook.worksheet_from_name(sheet_name)?)
    }

    /// Check that `sheet_name` exists and was written with the given layout.
    pub(crate) fn validate_sheet_layout(
        &self,
        sheet_name: &str,
        n_cols: usize,
        if_index: bool,
    ) -> Result<(), ExcelWriteError> {
        if self.if_closed {
            return Err(ExcelWriteError::WriterClosed);
        }
        let Some(sheet) = self.report.sheet(sheet_name) else {
            return Err(ExcelWriteError::SheetNotFound(sheet_name.to_string()));
        };

        if sheet.if_index != if_index {
            return Err(ExcelWriteError::SheetLayoutMismatch {
                sheet_name: sheet_name.to_string(),
                message: format!(
                    "written with index={}, adjusted with index={if_index}",
                    sheet.if_index
                ),
            });
        }
        if sheet.n_cols != n_cols {
            return Err(ExcelWriteError::SheetLayoutMismatch {
                sheet_name: sheet_name.to_string(),
                message: format!(
                    "written with {} columns, adjusted with {n_cols}",
                    sheet.n_cols
                ),
            });
        }
        Ok(())
    }

    /// Apply planned widths to `sheet_name` and record them in the report.
    pub(crate) fn apply_column_widths(
        &mut self,
        sheet_name: &str,
        dict_width_by_col: &SpecColumnWidthTable,
        warnings: Vec<String>,
    ) -> Result<(), ExcelWriteError> {
        let worksheet = self.worksheet_mut(sheet_name)?;
        for (n_idx_col, n_width) in dict_width_by_col {
            worksheet.set_column_width(cast_col_num(*n_idx_col)?, *n_width)?;
        }

        if let Some(sheet) = self.report.sheet_mut(sheet_name) {
            sheet.widths = dict_width_by_col.clone();
        }
        for c_warning in warnings {
            self.report.warn(format!("[{sheet_name}] {c_warning}"));
        }
        Ok(())
    }

    fn derive_default_sheet_name(&self) -> String {
        let mut n_idx = self.report.sheets.len() + 1;
        loop {
            let candidate = format!("Sheet{n_idx}");
            if self.report.sheet(&candidate).is_none() {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

impl Drop for ExcelWriter {
    fn drop(&mut self) {
        if !self.if_closed && !self.report.sheets.is_empty() {
            let _ = self.close();
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellWrite

fn write_column_body(
    worksheet: &mut Worksheet,
    col: &Column,
    col_idx: ColNum,
    write_options: &SpecExcelWriteOptions,
) -> Result<(), ExcelWriteError> {
    for n_idx_row in 0..col.len() {
        let value = derive_cell_value_from_any_value(col.get(n_idx_row)?);
        write_cell(
            worksheet,
            cast_row_num(n_idx_row + 1)?,
            col_idx,
            &value,
            write_options,
        )?;
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row_idx: u32,
    col_idx: ColNum,
    value: &EnumCellValue,
    write_options: &SpecExcelWriteOptions,
) -> Result<(), ExcelWriteError> {
    let value_policy = &write_options.value_policy;
    match value {
        EnumCellValue::None => {
            if write_options.keep_missing_values {
                worksheet.write_string(row_idx, col_idx, &value_policy.missing_value_str)?;
            }
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean(row_idx, col_idx, *val)?;
        }
        EnumCellValue::Integer(val) => {
            worksheet.write_number(row_idx, col_idx, *val as f64)?;
        }
        EnumCellValue::Number(val) => match convert_nan_inf_to_str(*val, value_policy) {
            None => {
                worksheet.write_number(row_idx, col_idx, *val)?;
            }
            Some(c_text) => {
                if write_options.keep_missing_values {
                    worksheet.write_string(row_idx, col_idx, c_text)?;
                }
            }
        },
        EnumCellValue::String(val) => {
            worksheet.write_string(row_idx, col_idx, val)?;
        }
    }
    Ok(())
}

fn derive_save_error(err: XlsxError, path_file_out: &Path) -> ExcelWriteError {
    match err {
        XlsxError::IoError(source) => ExcelWriteError::Io {
            path: path_file_out.to_path_buf(),
            source,
        },
        _ => ExcelWriteError::Xlsx(err),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
