//! External tabular store boundary
//!
//! The roster lives in a spreadsheet-like service that exposes 2-D cell
//! grids. This module owns that boundary: the `TabularStore` trait, A1
//! addressing helpers, a hosted-service adapter and an in-memory double.
//! Raw grids and cell addresses never escape `infra::store` and
//! `sync::codec` - everything above works with typed records.

mod memory;
mod sheets;

pub use memory::MemoryStore;
pub use sheets::SheetsStore;

use async_trait::async_trait;
use thiserror::Error;

/// Raw 2-D cell grid as the store hands it out
pub type Grid = Vec<Vec<String>>;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("store read failed: {0}")]
	Read(String),
	#[error("store write failed: {0}")]
	Write(String),
}

/// Spreadsheet-like read/write service.
///
/// Rows are 1-based and columns letter-coded from `A`; the table widths
/// used here never need multi-letter columns.
#[async_trait]
pub trait TabularStore: Send + Sync {
	/// Every populated row of the table, top to bottom
	async fn read_all(&self, table: &str) -> Result<Grid, StoreError>;

	/// Single cell by A1 address; empty string when the cell is blank
	async fn read_cell(&self, table: &str, cell: &str) -> Result<String, StoreError>;

	/// Overwrite a rectangular range, extending the table if needed
	async fn write_range(&self, table: &str, range: &str, rows: Grid) -> Result<(), StoreError>;

	async fn write_cell(&self, table: &str, cell: &str, value: &str) -> Result<(), StoreError>;

	/// Remove `count` whole rows starting at 1-based row `start`
	async fn delete_rows(&self, table: &str, start: usize, count: usize) -> Result<(), StoreError>;

	/// Blank every cell from `cell` down to the bottom of the table
	async fn clear_from(&self, table: &str, cell: &str) -> Result<(), StoreError>;
}

/// Letter code for a 0-based column index (single letter, `A`..`Z`)
pub fn col_letter(col: usize) -> char {
	debug_assert!(col < 26, "single-letter columns only");
	(b'A' + col as u8) as char
}

/// A1 range covering `width` columns from `A`, rows `start_row..=end_row`
/// (1-based), e.g. `body_range(15, 2, 31)` == `"A2:O31"`
pub fn body_range(width: usize, start_row: usize, end_row: usize) -> String {
	format!("A{}:{}{}", start_row, col_letter(width - 1), end_row)
}

/// Parse a single-letter A1 address into 0-based column and 1-based row
pub(crate) fn parse_cell(cell: &str) -> Result<(usize, usize), String> {
	let mut chars = cell.chars();
	let col = match chars.next() {
		Some(letter @ 'A'..='Z') => (letter as u8 - b'A') as usize,
		_ => return Err(format!("bad cell address {cell:?}")),
	};
	let row: usize = chars
		.as_str()
		.parse()
		.map_err(|_| format!("bad cell address {cell:?}"))?;
	if row == 0 {
		return Err(format!("bad cell address {cell:?}: rows are 1-based"));
	}
	Ok((col, row))
}
