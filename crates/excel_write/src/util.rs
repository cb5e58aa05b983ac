//! Stateless helper utilities shared by the sheet writer and width estimator.

use polars::prelude::{AnyValue, Column};

use crate::conf::{N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::spec::{EnumCellValue, ExcelWriteError, SpecXlsxValuePolicy};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Normalize one polars value into a writable cell value.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::UInt8(val) => EnumCellValue::Integer(val as i64),
        AnyValue::UInt16(val) => EnumCellValue::Integer(val as i64),
        AnyValue::UInt32(val) => EnumCellValue::Integer(val as i64),
        AnyValue::UInt64(val) => match i64::try_from(val) {
            Ok(val) => EnumCellValue::Integer(val),
            Err(_) => EnumCellValue::Number(val as f64),
        },
        AnyValue::Int8(val) => EnumCellValue::Integer(val as i64),
        AnyValue::Int16(val) => EnumCellValue::Integer(val as i64),
        AnyValue::Int32(val) => EnumCellValue::Integer(val as i64),
        AnyValue::Int64(val) => EnumCellValue::Integer(val),
        AnyValue::Int128(val) => match i64::try_from(val) {
            Ok(val) => EnumCellValue::Integer(val),
            Err(_) => EnumCellValue::Number(val as f64),
        },
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

/// Policy text for `NaN`/`Inf`; `None` for finite values.
pub fn convert_nan_inf_to_str(x: f64, value_policy: &SpecXlsxValuePolicy) -> Option<String> {
    if x.is_nan() {
        return Some(value_policy.nan_str.clone());
    }
    if x.is_infinite() {
        return Some(if x.is_sign_positive() {
            value_policy.posinf_str.clone()
        } else {
            value_policy.neginf_str.clone()
        });
    }
    None
}

/// Whether a column holds at least one finite non-integer number.
pub fn check_column_has_fraction(col: &Column) -> Result<bool, ExcelWriteError> {
    if !col.dtype().is_float() {
        return Ok(false);
    }
    for n_idx_row in 0..col.len() {
        if let EnumCellValue::Number(n) = derive_cell_value_from_any_value(col.get(n_idx_row)?)
            && n.is_finite()
            && n.fract() != 0.0
        {
            return Ok(true);
        }
    }
    Ok(false)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DisplayLength

/// Effective text length in characters; multi-line text counts its longest line.
pub fn find_text_length(text: &str) -> usize {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r').chars().count())
        .max()
        .unwrap_or(0)
}

/// Render a cell value the way the estimator measures it.
///
/// Numbers in a decimal column (`if_is_decimal_col`) get exactly `decimals`
/// fractional digits; other numbers render as integers when integral.
pub fn derive_display_text(
    value: &EnumCellValue,
    decimals: usize,
    if_is_decimal_col: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> String {
    match value {
        EnumCellValue::None => value_policy.missing_value_str.clone(),
        EnumCellValue::Boolean(val) => if *val { "True" } else { "False" }.to_string(),
        EnumCellValue::Integer(val) => {
            if if_is_decimal_col {
                format!("{:.decimals$}", *val as f64)
            } else {
                val.to_string()
            }
        }
        EnumCellValue::Number(val) => {
            if let Some(c_text) = convert_nan_inf_to_str(*val, value_policy) {
                c_text
            } else if if_is_decimal_col {
                format!("{val:.decimals$}")
            } else if val.fract() == 0.0 {
                format!("{val:.0}")
            } else {
                val.to_string()
            }
        }
        EnumCellValue::String(val) => val.clone(),
    }
}

/// Display length of one cell value in characters.
pub fn display_length(
    value: &EnumCellValue,
    decimals: usize,
    if_is_decimal_col: bool,
    value_policy: &SpecXlsxValuePolicy,
) -> usize {
    find_text_length(&derive_display_text(
        value,
        decimals,
        if_is_decimal_col,
        value_policy,
    ))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExcelLimits

pub(crate) fn cast_row_num(value: usize) -> Result<u32, ExcelWriteError> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(ExcelWriteError::ExceedsExcelLimit(format!(
            "row index {value} >= {N_NROWS_EXCEL_MAX}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| ExcelWriteError::ExceedsExcelLimit(format!("row index overflow: {value}")))
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16, ExcelWriteError> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(ExcelWriteError::ExceedsExcelLimit(format!(
            "column index {value} >= {N_NCOLS_EXCEL_MAX}"
        )));
    }
    u16::try_from(value)
        .map_err(|_| ExcelWriteError::ExceedsExcelLimit(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
