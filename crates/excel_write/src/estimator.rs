//! Column width estimation from table contents.

use std::collections::BTreeMap;

use polars::prelude::Column;

use crate::conf::N_WIDTH_EXCEL_COLUMN_MAX;
use crate::spec::{
    ExcelWriteError, SpecAutoAdjustOptions, SpecColumnWidthTable, SpecExcelReport,
    SpecXlsxValuePolicy,
};
use crate::table::Table;
use crate::util::{
    check_column_has_fraction, derive_cell_value_from_any_value, display_length, find_text_length,
};
use crate::writer::ExcelWriter;

/// Set every column width of `sheet_name` so its widest rendered value fits.
///
/// `options.index` must match how the table was written. Sheets written
/// through the same `writer` are checked and a mismatch is rejected with
/// [`ExcelWriteError::SheetLayoutMismatch`].
///
/// Returns the applied width table.
pub fn auto_adjust_excel_width(
    table: &Table,
    writer: &mut ExcelWriter,
    sheet_name: &str,
    options: &SpecAutoAdjustOptions,
) -> Result<SpecColumnWidthTable, ExcelWriteError> {
    validate_auto_adjust_options(options)?;
    writer.validate_sheet_layout(sheet_name, table.width(), options.index)?;

    let value_policy = writer.write_options().value_policy.clone();
    let mut report = SpecExcelReport::default();
    let dict_width_by_col = plan_column_widths(table, options, &value_policy, &mut report)?;

    writer.apply_column_widths(sheet_name, &dict_width_by_col, report.warnings)?;
    Ok(dict_width_by_col)
}

/// Compute the width table without touching a worksheet.
///
/// Position 0 is the index column when `options.index` is set.
pub fn plan_column_widths(
    table: &Table,
    options: &SpecAutoAdjustOptions,
    value_policy: &SpecXlsxValuePolicy,
    report: &mut SpecExcelReport,
) -> Result<SpecColumnWidthTable, ExcelWriteError> {
    let mut dict_width_by_col = BTreeMap::new();

    let mut l_cols: Vec<(&str, &Column)> = Vec::with_capacity(table.width() + 1);
    if options.index {
        l_cols.push((table.index_label(), table.index()));
    }
    for col in table.data().get_columns() {
        l_cols.push((col.name().as_str(), col));
    }

    for (n_idx_col, (c_header, col)) in l_cols.into_iter().enumerate() {
        let n_len = measure_column_length(col, c_header, options.decimals, value_policy)?;
        let n_width = options.margin as f64 + options.length_factor * n_len as f64;

        let n_width_final = if n_width > options.width_max {
            report.warn(format!(
                "Column {n_idx_col} ({c_header:?}) width {n_width} capped at {}.",
                options.width_max
            ));
            options.width_max
        } else {
            n_width
        };
        dict_width_by_col.insert(n_idx_col, n_width_final);
    }

    Ok(dict_width_by_col)
}

/// Longest display length among the header and all values of `col`.
fn measure_column_length(
    col: &Column,
    header: &str,
    decimals: usize,
    value_policy: &SpecXlsxValuePolicy,
) -> Result<usize, ExcelWriteError> {
    let if_is_decimal_col = check_column_has_fraction(col)?;

    let mut n_len_max = find_text_length(header);
    for n_idx_row in 0..col.len() {
        let value = derive_cell_value_from_any_value(col.get(n_idx_row)?);
        n_len_max = usize::max(
            n_len_max,
            display_length(&value, decimals, if_is_decimal_col, value_policy),
        );
    }
    Ok(n_len_max)
}

fn validate_auto_adjust_options(options: &SpecAutoAdjustOptions) -> Result<(), ExcelWriteError> {
    if !options.length_factor.is_finite() || options.length_factor <= 0.0 {
        return Err(ExcelWriteError::InvalidOption(format!(
            "length_factor must be a positive number, got {}.",
            options.length_factor
        )));
    }
    if !options.width_max.is_finite()
        || options.width_max <= 0.0
        || options.width_max > N_WIDTH_EXCEL_COLUMN_MAX
    {
        return Err(ExcelWriteError::InvalidOption(format!(
            "width_max must be in (0, {}], got {}.",
            N_WIDTH_EXCEL_COLUMN_MAX,
            options.width_max
        )));
    }
    if (options.margin as f64) > options.width_max {
        return Err(ExcelWriteError::InvalidOption(format!(
            "margin {} exceeds width_max {}.",
            options.margin, options.width_max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, NamedFrom};

    use super::*;
    use crate::spec::{SpecExcelWriteOptions, SpecSheetWriteOptions};

    fn create_people_table() -> Table {
        Table::new(
            DataFrame::new(vec![
                Column::new("name".into(), &["Al", "Bob"]),
                Column::new("age".into(), &[5i64, 42]),
            ])
            .expect("create dataframe"),
        )
    }

    fn create_single_column_table(name: &str, values: &[&str]) -> Table {
        Table::new(
            DataFrame::new(vec![Column::new(name.into(), values)]).expect("create dataframe"),
        )
    }

    fn plan(table: &Table, options: &SpecAutoAdjustOptions) -> SpecColumnWidthTable {
        plan_column_widths(
            table,
            options,
            &SpecXlsxValuePolicy::default(),
            &mut SpecExcelReport::default(),
        )
        .expect("plan widths")
    }

    fn options_without_index() -> SpecAutoAdjustOptions {
        SpecAutoAdjustOptions {
            index: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_widths_people_without_index() {
        let dict_width = plan(&create_people_table(), &options_without_index());
        assert_eq!(dict_width, BTreeMap::from([(0, 7.0), (1, 6.0)]));
    }

    #[test]
    fn test_plan_widths_people_with_index_shifts_columns() {
        let dict_width = plan(&create_people_table(), &SpecAutoAdjustOptions::default());
        // Unnamed index header "index" dominates the "0"/"1" labels.
        assert_eq!(dict_width, BTreeMap::from([(0, 8.0), (1, 7.0), (2, 6.0)]));
    }

    #[test]
    fn test_plan_widths_named_index() {
        let table = Table::with_index(
            create_people_table().data().clone(),
            Column::new("id".into(), &["first-row", "b"]),
        )
        .expect("valid index");

        let dict_width = plan(&table, &SpecAutoAdjustOptions::default());
        assert_eq!(dict_width.get(&0), Some(&12.0));
        assert_eq!(dict_width.len(), 3);
    }

    #[test]
    fn test_plan_widths_empty_table_uses_headers_only() {
        let table = Table::new(
            DataFrame::new(vec![
                Column::new("x".into(), Vec::<i64>::new()),
                Column::new("y".into(), Vec::<String>::new()),
            ])
            .expect("create dataframe"),
        );

        let dict_width = plan(&table, &options_without_index());
        assert_eq!(dict_width, BTreeMap::from([(0, 4.0), (1, 4.0)]));
    }

    #[test]
    fn test_plan_widths_only_nulls_uses_missing_text() {
        let table = Table::new(
            DataFrame::new(vec![Column::new("n".into(), &[None::<&str>, None])])
                .expect("create dataframe"),
        );

        let dict_width = plan(&table, &options_without_index());
        assert_eq!(dict_width.get(&0), Some(&5.0));
    }

    #[test]
    fn test_plan_widths_decimal_column_uses_decimals() {
        let table = Table::new(
            DataFrame::new(vec![
                Column::new("v".into(), &[1.5f64, 22.25]),
                Column::new("w".into(), &[100.0f64, 2.0]),
            ])
            .expect("create dataframe"),
        );

        let dict_width = plan(&table, &options_without_index());
        assert_eq!(dict_width, BTreeMap::from([(0, 8.0), (1, 6.0)]));

        let dict_width = plan(
            &table,
            &SpecAutoAdjustOptions {
                decimals: 4,
                ..options_without_index()
            },
        );
        assert_eq!(dict_width.get(&0), Some(&10.0));
    }

    #[test]
    fn test_plan_widths_monotonic_in_value_length() {
        let dict_short = plan(
            &create_single_column_table("c", &["ab", "x"]),
            &options_without_index(),
        );
        let dict_long = plan(
            &create_single_column_table("c", &["abcdef", "x"]),
            &options_without_index(),
        );
        assert!(dict_long[&0] > dict_short[&0]);
    }

    #[test]
    fn test_plan_widths_margin_is_additive() {
        let table = create_people_table();
        let dict_base = plan(&table, &SpecAutoAdjustOptions::default());
        let dict_wider = plan(
            &table,
            &SpecAutoAdjustOptions {
                margin: 10,
                ..Default::default()
            },
        );

        for (n_idx_col, n_width) in &dict_base {
            assert_eq!(dict_wider[n_idx_col], n_width + 7.0);
        }
    }

    #[test]
    fn test_plan_widths_length_factor_and_multiline() {
        let table = create_single_column_table("note", &["one\ntwo lines", "z"]);
        let dict_width = plan(
            &table,
            &SpecAutoAdjustOptions {
                length_factor: 1.5,
                ..options_without_index()
            },
        );
        assert_eq!(dict_width.get(&0), Some(&16.5));
    }

    #[test]
    fn test_plan_widths_caps_and_warns() {
        let c_long = "x".repeat(300);
        let table = create_single_column_table("c", &[c_long.as_str()]);
        let mut report = SpecExcelReport::default();

        let dict_width = plan_column_widths(
            &table,
            &options_without_index(),
            &SpecXlsxValuePolicy::default(),
            &mut report,
        )
        .expect("plan widths");

        assert_eq!(dict_width.get(&0), Some(&255.0));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_validate_options_rejects_bad_values() {
        for options in [
            SpecAutoAdjustOptions {
                length_factor: 0.0,
                ..Default::default()
            },
            SpecAutoAdjustOptions {
                length_factor: f64::NAN,
                ..Default::default()
            },
            SpecAutoAdjustOptions {
                width_max: 300.0,
                ..Default::default()
            },
            SpecAutoAdjustOptions {
                margin: 20,
                width_max: 10.0,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                validate_auto_adjust_options(&options),
                Err(ExcelWriteError::InvalidOption(_))
            ));
        }
        assert!(validate_auto_adjust_options(&SpecAutoAdjustOptions::default()).is_ok());
    }

    #[test]
    fn test_auto_adjust_on_writer_records_widths() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let table = create_people_table();
        let mut writer =
            ExcelWriter::new(tmp.path().join("out.xlsx"), SpecExcelWriteOptions::default());
        let sheet_name = writer
            .write_sheet(
                &table,
                "People",
                &SpecSheetWriteOptions {
                    index: false,
                    ..Default::default()
                },
            )
            .expect("write sheet");

        let dict_width =
            auto_adjust_excel_width(&table, &mut writer, &sheet_name, &options_without_index())
                .expect("auto adjust");
        writer.close().expect("close");

        assert_eq!(dict_width, BTreeMap::from([(0, 7.0), (1, 6.0)]));
        let report = writer.report();
        let sheet_report = report.sheet("People").expect("sheet report");
        assert_eq!(sheet_report.widths, dict_width);
        assert_eq!(sheet_report.n_cols_written(), dict_width.len());
    }

    #[test]
    fn test_auto_adjust_unknown_sheet_fails() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let table = create_people_table();
        let mut writer =
            ExcelWriter::new(tmp.path().join("out.xlsx"), SpecExcelWriteOptions::default());
        writer
            .write_sheet(&table, "People", &SpecSheetWriteOptions::default())
            .expect("write sheet");

        let err = auto_adjust_excel_width(
            &table,
            &mut writer,
            "MySheet",
            &SpecAutoAdjustOptions::default(),
        )
        .expect_err("unknown sheet");
        assert!(matches!(err, ExcelWriteError::SheetNotFound(name) if name == "MySheet"));
    }

    #[test]
    fn test_auto_adjust_index_mismatch_fails() {
        let tmp = tempfile::tempdir().expect("temp dir");
        let table = create_people_table();
        let mut writer =
            ExcelWriter::new(tmp.path().join("out.xlsx"), SpecExcelWriteOptions::default());
        writer
            .write_sheet(&table, "People", &SpecSheetWriteOptions::default())
            .expect("write sheet");

        let err = auto_adjust_excel_width(&table, &mut writer, "People", &options_without_index())
            .expect_err("index mismatch");
        assert!(matches!(err, ExcelWriteError::SheetLayoutMismatch { .. }));
    }
}
