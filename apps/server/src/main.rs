//! Roster sync daemon
//!
//! Hosts the periodic sheet reconciliation loop plus the keep-alive HTTP
//! shim that hosted platforms poll to keep the process running. The chat
//! transport is an external collaborator; it reads the roster only through
//! the service's published snapshot and the `roster_core::chat` dispatcher.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use clap::Parser;
use roster_core::infra::store::SheetsStore;
use roster_core::{AppConfig, SyncEngine, SyncService, SyncServiceConfig, SyncTables};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "roster-server", about = "Roster listing sync daemon")]
struct Args {
	/// Path to the configuration TOML
	#[arg(long)]
	config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer().with_target(true))
		.init();

	let config = AppConfig::load(&args.config)?;
	if config.bot_token().is_none() {
		warn!("no bot token configured; chat transport will stay offline");
	}

	let token = config.store_token()?;
	let store = Arc::new(SheetsStore::new(
		config.document_key.clone(),
		token,
		config.http_timeout(),
	)?);

	let engine = SyncEngine::new(
		store,
		SyncTables {
			listing: config.listing_table.clone(),
			submissions: config.submission_table.clone(),
		},
	);
	let service = SyncService::new(
		engine,
		SyncServiceConfig {
			interval: config.sync_interval(),
		},
	);
	let sync_task = service.start();

	// Keep-alive shim: the hosting platform polls this to keep the process
	// alive.
	let app = axum::Router::new()
		.route("/", get(|| async { "Web service is running." }))
		.route("/health", get(|| async { "OK" }));

	let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
	info!("Listening on http://{}", addr);

	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.with_context(|| format!("binding {addr}"))?;
	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("keep-alive server failed")?;

	service.stop();
	sync_task.abort();
	info!("shut down");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		warn!(error = %e, "failed to listen for shutdown signal");
	}
}
