//! `excel_write` v1:
//! Export a polars DataFrame to an XLSX sheet with auto-fitted column widths.
//!
//! Modules:
//! - `conf`      : constants and default presets
//! - `spec`      : options, cell values, reports and errors
//! - `table`     : DataFrame + row index model
//! - `util`      : pure helper functions
//! - `estimator` : column width estimation
//! - `writer`    : scoped workbook writer and `write_in_excel`
pub mod conf;
pub mod estimator;
pub mod spec;
pub mod table;
pub mod util;
pub mod writer;

pub use conf::{
    C_INDEX_LABEL_DEFAULT, N_DECIMALS_DEFAULT, N_LENGTH_FACTOR_DEFAULT, N_MARGIN_DEFAULT,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_WIDTH_EXCEL_COLUMN_MAX,
};
pub use estimator::{auto_adjust_excel_width, plan_column_widths};
pub use spec::{
    EnumCellValue, ExcelWriteError, SpecAutoAdjustOptions, SpecColumnWidthTable,
    SpecExcelReport, SpecExcelWriteOptions, SpecSheetReport, SpecSheetWriteOptions,
    SpecWriteInExcelOptions, SpecXlsxValuePolicy,
};
pub use table::Table;
pub use util::{display_length, find_text_length};
pub use writer::{write_in_excel, write_in_excel_with_options, ExcelWriter};
