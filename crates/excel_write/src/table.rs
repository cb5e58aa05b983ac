//! Table model: a polars `DataFrame` plus a row index column.

use std::io::Cursor;

use polars::prelude::{Column, DataFrame, IpcReader, NamedFrom, PlSmallStr, SerReader};

use crate::conf::C_INDEX_LABEL_DEFAULT;
use crate::spec::ExcelWriteError;

/// Tabular data exported to a sheet.
///
/// The index is an ordinary column of the same height as the data. A table
/// built with [`Table::new`] gets an unnamed `0..height` range index.
#[derive(Debug, Clone)]
pub struct Table {
    df_data: DataFrame,
    col_index: Column,
}

impl Table {
    /// Wrap `df_data` with a default range index.
    pub fn new(df_data: DataFrame) -> Self {
        let n_height = df_data.height();
        let col_index = Column::new(
            PlSmallStr::EMPTY,
            (0..n_height).map(|n_row| n_row as i64).collect::<Vec<i64>>(),
        );
        Self { df_data, col_index }
    }

    /// Wrap `df_data` with an explicit index column.
    pub fn with_index(df_data: DataFrame, col_index: Column) -> Result<Self, ExcelWriteError> {
        if col_index.len() != df_data.height() {
            return Err(ExcelWriteError::IndexLengthMismatch {
                expected: df_data.height(),
                found: col_index.len(),
            });
        }
        Ok(Self { df_data, col_index })
    }

    /// Read a table from Polars IPC bytes, with a default range index.
    pub fn from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Self, ExcelWriteError> {
        let df_data = IpcReader::new(Cursor::new(v_ipc_df)).finish()?;
        Ok(Self::new(df_data))
    }

    /// Underlying data columns.
    pub fn data(&self) -> &DataFrame {
        &self.df_data
    }

    /// Row index column.
    pub fn index(&self) -> &Column {
        &self.col_index
    }

    /// Header text of the index column.
    pub fn index_label(&self) -> &str {
        let c_name = self.col_index.name().as_str();
        if c_name.is_empty() {
            C_INDEX_LABEL_DEFAULT
        } else {
            c_name
        }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.df_data.height()
    }

    /// Number of data columns (index excluded).
    pub fn width(&self) -> usize {
        self.df_data.width()
    }

    /// Data column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }
}

impl From<DataFrame> for Table {
    fn from(df_data: DataFrame) -> Self {
        Self::new(df_data)
    }
}
