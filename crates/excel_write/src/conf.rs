//! XLSX constants and default preset factories.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder};

/// Excel worksheet maximum row count (header row included).
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel maximum column width in character units.
pub const N_WIDTH_EXCEL_COLUMN_MAX: f64 = 255.0;

/// Header label used for an unnamed row index.
pub const C_INDEX_LABEL_DEFAULT: &str = "index";

/// Default extra character padding per column.
pub const N_MARGIN_DEFAULT: usize = 3;
/// Default multiplier applied to character counts.
pub const N_LENGTH_FACTOR_DEFAULT: f64 = 1.0;
/// Default fractional digits assumed for decimal columns.
pub const N_DECIMALS_DEFAULT: usize = 2;

/// Build the header cell format: bold, thin border, centered and top-aligned.
pub fn derive_default_header_format() -> Format {
    Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::Top)
}

