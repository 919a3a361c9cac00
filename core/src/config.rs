//! Process configuration
//!
//! Loaded once at startup from a TOML file and never re-read. The bot token
//! may come from the `BOT_TOKEN` environment variable instead of the file,
//! mirroring how hosted deployments inject secrets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	/// Path to the tabular store credentials (a pre-issued bearer token)
	pub credentials_path: PathBuf,

	/// Document key of the spreadsheet holding both worksheets
	pub document_key: String,

	/// Chat bot token; falls back to the `BOT_TOKEN` environment variable
	#[serde(default)]
	pub bot_token: Option<String>,

	/// Canonical roster worksheet
	#[serde(default = "default_listing_table")]
	pub listing_table: String,

	/// Form submission worksheet
	#[serde(default = "default_submission_table")]
	pub submission_table: String,

	/// Seconds between sync passes
	#[serde(default = "default_sync_interval_secs")]
	pub sync_interval_secs: u64,

	/// Timeout for individual store calls, seconds
	#[serde(default = "default_http_timeout_secs")]
	pub http_timeout_secs: u64,

	/// Keep-alive listen port
	#[serde(default = "default_port")]
	pub port: u16,
}

fn default_listing_table() -> String {
	"Listing".to_string()
}

fn default_submission_table() -> String {
	"Registration Form Responses".to_string()
}

fn default_sync_interval_secs() -> u64 {
	60
}

fn default_http_timeout_secs() -> u64 {
	30
}

fn default_port() -> u16 {
	8080
}

impl AppConfig {
	/// Load configuration from a TOML file
	pub fn load(path: &Path) -> Result<Self> {
		info!("Loading config from {:?}", path);
		let raw = fs::read_to_string(path)
			.with_context(|| format!("reading config {}", path.display()))?;
		let config: AppConfig =
			toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
		Ok(config)
	}

	/// Resolved bot token: config value first, `BOT_TOKEN` env second
	pub fn bot_token(&self) -> Option<String> {
		self.bot_token
			.clone()
			.or_else(|| std::env::var("BOT_TOKEN").ok())
	}

	/// Bearer token for the tabular store, read from `credentials_path`
	pub fn store_token(&self) -> Result<String> {
		let raw = fs::read_to_string(&self.credentials_path).with_context(|| {
			format!("reading credentials {}", self.credentials_path.display())
		})?;
		Ok(raw.trim().to_string())
	}

	pub fn sync_interval(&self) -> Duration {
		Duration::from_secs(self.sync_interval_secs)
	}

	pub fn http_timeout(&self) -> Duration {
		Duration::from_secs(self.http_timeout_secs)
	}
}
