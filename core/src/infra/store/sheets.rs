//! Google Sheets adapter
//!
//! Thin REST client for the Sheets v4 values API. Credential handling is
//! deliberately minimal: the configured credentials file holds a pre-issued
//! bearer token, and token minting/refresh happens outside this process.
//! Row deletion goes through the batchUpdate endpoint, which addresses
//! worksheets by numeric id; ids are resolved from the document metadata on
//! first use and cached.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Grid, StoreError, TabularStore};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsStore {
	client: Client,
	document_key: String,
	token: String,
	/// Worksheet title -> numeric sheet id, resolved lazily for row deletes
	sheet_ids: RwLock<HashMap<String, i64>>,
}

#[derive(Deserialize)]
struct ValueRange {
	#[serde(default)]
	values: Grid,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
	#[serde(default)]
	sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
	properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
	#[serde(rename = "sheetId")]
	sheet_id: i64,
	title: String,
}

impl SheetsStore {
	pub fn new(
		document_key: String,
		token: String,
		timeout: Duration,
	) -> Result<Self, StoreError> {
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| StoreError::Read(e.to_string()))?;

		Ok(Self {
			client,
			document_key,
			token,
			sheet_ids: RwLock::new(HashMap::new()),
		})
	}

	/// URL for a values-API call on `'{table}'!{suffix}`
	fn values_url(&self, table: &str, suffix: &str) -> String {
		let range = format!("'{table}'{suffix}");
		format!(
			"{API_BASE}/{}/values/{}",
			self.document_key,
			range.replace(' ', "%20")
		)
	}

	async fn get_values(&self, table: &str, suffix: &str) -> Result<Grid, StoreError> {
		let url = self.values_url(table, suffix);
		debug!(url = %url, "reading values");
		let range: ValueRange = self
			.client
			.get(&url)
			.bearer_auth(&self.token)
			.send()
			.await
			.map_err(|e| StoreError::Read(e.to_string()))?
			.error_for_status()
			.map_err(|e| StoreError::Read(e.to_string()))?
			.json()
			.await
			.map_err(|e| StoreError::Read(e.to_string()))?;
		Ok(range.values)
	}

	async fn put_values(&self, table: &str, suffix: &str, rows: Grid) -> Result<(), StoreError> {
		let url = self.values_url(table, suffix);
		debug!(url = %url, rows = rows.len(), "writing values");
		self.client
			.put(&url)
			.query(&[("valueInputOption", "RAW")])
			.bearer_auth(&self.token)
			.json(&json!({ "values": rows }))
			.send()
			.await
			.map_err(|e| StoreError::Write(e.to_string()))?
			.error_for_status()
			.map_err(|e| StoreError::Write(e.to_string()))?;
		Ok(())
	}

	/// Numeric id of a worksheet, resolving and caching document metadata
	/// on the first call
	async fn sheet_id(&self, table: &str) -> Result<i64, StoreError> {
		if let Some(id) = self.sheet_ids.read().await.get(table) {
			return Ok(*id);
		}

		let url = format!("{API_BASE}/{}?fields=sheets.properties", self.document_key);
		let meta: SpreadsheetMeta = self
			.client
			.get(&url)
			.bearer_auth(&self.token)
			.send()
			.await
			.map_err(|e| StoreError::Write(e.to_string()))?
			.error_for_status()
			.map_err(|e| StoreError::Write(e.to_string()))?
			.json()
			.await
			.map_err(|e| StoreError::Write(e.to_string()))?;

		let mut ids = self.sheet_ids.write().await;
		for sheet in meta.sheets {
			ids.insert(sheet.properties.title, sheet.properties.sheet_id);
		}
		ids.get(table)
			.copied()
			.ok_or_else(|| StoreError::Write(format!("unknown worksheet {table:?}")))
	}
}

#[async_trait]
impl TabularStore for SheetsStore {
	async fn read_all(&self, table: &str) -> Result<Grid, StoreError> {
		self.get_values(table, "").await
	}

	async fn read_cell(&self, table: &str, cell: &str) -> Result<String, StoreError> {
		let values = self.get_values(table, &format!("!{cell}")).await?;
		Ok(values
			.into_iter()
			.next()
			.and_then(|row| row.into_iter().next())
			.unwrap_or_default())
	}

	async fn write_range(&self, table: &str, range: &str, rows: Grid) -> Result<(), StoreError> {
		self.put_values(table, &format!("!{range}"), rows).await
	}

	async fn write_cell(&self, table: &str, cell: &str, value: &str) -> Result<(), StoreError> {
		self.put_values(table, &format!("!{cell}"), vec![vec![value.to_string()]])
			.await
	}

	async fn delete_rows(&self, table: &str, start: usize, count: usize) -> Result<(), StoreError> {
		let sheet_id = self.sheet_id(table).await?;
		let url = format!("{API_BASE}/{}:batchUpdate", self.document_key);
		debug!(table = %table, start, count, "deleting rows");
		self.client
			.post(&url)
			.bearer_auth(&self.token)
			.json(&json!({
				"requests": [{
					"deleteDimension": {
						"range": {
							"sheetId": sheet_id,
							"dimension": "ROWS",
							"startIndex": start - 1,
							"endIndex": start - 1 + count,
						}
					}
				}]
			}))
			.send()
			.await
			.map_err(|e| StoreError::Write(e.to_string()))?
			.error_for_status()
			.map_err(|e| StoreError::Write(e.to_string()))?;
		Ok(())
	}

	async fn clear_from(&self, table: &str, cell: &str) -> Result<(), StoreError> {
		// "A2:Z" spans every row from the anchor down; widths here never
		// pass column Z.
		let url = format!("{}:clear", self.values_url(table, &format!("!{cell}:Z")));
		self.client
			.post(&url)
			.bearer_auth(&self.token)
			.json(&json!({}))
			.send()
			.await
			.map_err(|e| StoreError::Write(e.to_string()))?
			.error_for_status()
			.map_err(|e| StoreError::Write(e.to_string()))?;
		Ok(())
	}
}
