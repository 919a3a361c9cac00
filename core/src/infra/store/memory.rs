//! In-memory tabular store
//!
//! Backs the sync tests and offline runs with the same grid shape and A1
//! addressing semantics as the hosted service. Rows are stored ragged, the
//! way the service returns them; cells past the end of a row read as empty.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{parse_cell, Grid, StoreError, TabularStore};

#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<HashMap<String, Grid>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Seed a table with initial rows, replacing any existing contents
	pub async fn insert_table(&self, name: &str, rows: Grid) {
		self.tables.lock().await.insert(name.to_string(), rows);
	}

	/// Current contents of a table, for test inspection
	pub async fn table(&self, name: &str) -> Option<Grid> {
		self.tables.lock().await.get(name).cloned()
	}

	fn set_cell(grid: &mut Grid, col: usize, row: usize, value: String) {
		let row_idx = row - 1;
		while grid.len() <= row_idx {
			grid.push(Vec::new());
		}
		let cells = &mut grid[row_idx];
		while cells.len() <= col {
			cells.push(String::new());
		}
		cells[col] = value;
	}
}

#[async_trait]
impl TabularStore for MemoryStore {
	async fn read_all(&self, table: &str) -> Result<Grid, StoreError> {
		self.tables
			.lock()
			.await
			.get(table)
			.cloned()
			.ok_or_else(|| StoreError::Read(format!("no such table {table:?}")))
	}

	async fn read_cell(&self, table: &str, cell: &str) -> Result<String, StoreError> {
		let (col, row) = parse_cell(cell).map_err(StoreError::Read)?;
		let tables = self.tables.lock().await;
		let grid = tables
			.get(table)
			.ok_or_else(|| StoreError::Read(format!("no such table {table:?}")))?;
		Ok(grid
			.get(row - 1)
			.and_then(|cells| cells.get(col))
			.cloned()
			.unwrap_or_default())
	}

	async fn write_range(&self, table: &str, range: &str, rows: Grid) -> Result<(), StoreError> {
		let start = range.split(':').next().unwrap_or(range);
		let (col, row) = parse_cell(start).map_err(StoreError::Write)?;
		let mut tables = self.tables.lock().await;
		let grid = tables
			.get_mut(table)
			.ok_or_else(|| StoreError::Write(format!("no such table {table:?}")))?;
		for (i, values) in rows.into_iter().enumerate() {
			for (j, value) in values.into_iter().enumerate() {
				Self::set_cell(grid, col + j, row + i, value);
			}
		}
		Ok(())
	}

	async fn write_cell(&self, table: &str, cell: &str, value: &str) -> Result<(), StoreError> {
		let (col, row) = parse_cell(cell).map_err(StoreError::Write)?;
		let mut tables = self.tables.lock().await;
		let grid = tables
			.get_mut(table)
			.ok_or_else(|| StoreError::Write(format!("no such table {table:?}")))?;
		Self::set_cell(grid, col, row, value.to_string());
		Ok(())
	}

	async fn delete_rows(&self, table: &str, start: usize, count: usize) -> Result<(), StoreError> {
		if start == 0 {
			return Err(StoreError::Write("rows are 1-based".to_string()));
		}
		let mut tables = self.tables.lock().await;
		let grid = tables
			.get_mut(table)
			.ok_or_else(|| StoreError::Write(format!("no such table {table:?}")))?;
		let from = (start - 1).min(grid.len());
		let to = (from + count).min(grid.len());
		grid.drain(from..to);
		Ok(())
	}

	async fn clear_from(&self, table: &str, cell: &str) -> Result<(), StoreError> {
		let (col, row) = parse_cell(cell).map_err(StoreError::Write)?;
		let mut tables = self.tables.lock().await;
		let grid = tables
			.get_mut(table)
			.ok_or_else(|| StoreError::Write(format!("no such table {table:?}")))?;
		for cells in grid.iter_mut().skip(row - 1) {
			for value in cells.iter_mut().skip(col) {
				value.clear();
			}
		}
		Ok(())
	}
}
