//! Transaction indexer entry point.
//!
//! Follows an EVM chain over JSON-RPC and records every transaction hash it
//! sees, plus every block number that had no block, in a relational ledger.
//! Progress is kept in a cursor file so a restarted process resumes where the
//! previous one stopped.
//!
//! # Flow
//! 1. Loads the configuration (flags, then JSON file, then defaults)
//! 2. Sets up logging
//! 3. Connects to the RPC endpoint and the ledger
//! 4. Runs the follow loop until the end block, a fatal error or a termination signal

pub mod bootstrap;
pub mod models;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{initialize_services, Result},
	models::{ConfigOverrides, IndexerConfig, RetrievalPolicy, DEFAULT_CONFIG_PATH},
	utils::{logging::setup_logging, parse_block_number, parse_string_to_bytes_size},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::env::{set_var, var};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "tx-indexer",
	about = "Follows an EVM chain over JSON-RPC and records transaction hashes and missing blocks in a SQL ledger.",
	version
)]
struct Cli {
	/// JSON configuration file (default: config/local.json, if present)
	#[arg(short = 'c', long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// File holding the next block to process (default: data/next_block.txt)
	#[arg(short = 'b', long, value_name = "PATH")]
	block_file: Option<PathBuf>,

	/// Enable debug logging
	#[arg(short = 'd', long)]
	debug: bool,

	/// Ledger connection string (postgres://, postgresql:// or sqlite:)
	#[arg(long, value_name = "URL")]
	database: Option<String>,

	/// Block to start from when no cursor is persisted, decimal or 0x-hex
	#[arg(short = 'f', long, value_name = "BLOCK", value_parser = parse_block_number)]
	from_block: Option<u64>,

	/// Block at which to stop, not processed itself; 0 follows the chain forever
	#[arg(short = 't', long, value_name = "BLOCK", value_parser = parse_block_number)]
	to_block: Option<u64>,

	/// JSON-RPC endpoint
	#[arg(short = 'r', long, value_name = "URL")]
	rpc: Option<String>,

	/// Blocks fetched per iteration (default: 99)
	#[arg(short = 'a', long, value_name = "SIZE")]
	batch: Option<u64>,

	/// Retrieval policy: one JSON-RPC batch per range, or one request per block
	#[arg(long, value_name = "batch|single")]
	policy: Option<RetrievalPolicy>,

	/// Request full transaction objects instead of bare hashes
	#[arg(long)]
	include_transactions: bool,

	/// Start from --from-block even when a cursor is persisted
	#[arg(long)]
	rewind: bool,

	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Validate the configuration without starting the indexer
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		// Reload environment variables from .env file
		// Override any existing environment variables
		dotenv_override().ok();

		// Log file mode - override if CLI flag is set
		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		// Set log level from RUST_LOG if it exists
		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		// Log level - override if CLI flag is set
		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		// Log path - override if CLI flag is set
		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		// Log max size - override if CLI flag is set
		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}
	}

	/// Configuration values given on the command line. Unset switches stay
	/// unset so the configuration file can still turn them on.
	fn overrides(&self) -> ConfigOverrides {
		ConfigOverrides {
			database: self.database.clone(),
			rpc: self.rpc.clone(),
			block_file: self.block_file.clone(),
			from_block: self.from_block,
			to_block: self.to_block,
			batch: self.batch,
			debug: self.debug.then_some(true),
			policy: self.policy,
			include_transactions: self.include_transactions.then_some(true),
			rewind: self.rewind.then_some(true),
			..Default::default()
		}
	}
}

/// Main entry point for the indexer.
///
/// # Errors
/// Returns an error on invalid configuration, when the RPC endpoint or the
/// ledger cannot be reached, and when the follow loop stops on a fatal error.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Apply CLI options to environment
	cli.apply_to_env();

	let config = match IndexerConfig::load(cli.config.as_deref(), cli.overrides()) {
		Ok(config) => config,
		Err(e) => {
			setup_logging(cli.debug).unwrap_or_else(|e| {
				eprintln!("Failed to setup logging: {}", e);
			});
			error!("Invalid configuration: {}", e);
			return Err(e.into());
		}
	};

	setup_logging(config.debug).unwrap_or_else(|e| {
		eprintln!("Failed to setup logging: {}", e);
	});

	// If --check flag is provided, only validate configuration and exit
	if cli.check {
		info!("✓ Configuration is valid");
		let source = match cli.config.as_deref() {
			Some(path) => path.display().to_string(),
			None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH.to_string(),
			None => "flags and defaults".to_string(),
		};
		info!("Configuration read from {}", source);
		info!(
			"RPC {}, policy {}, batch size {}, blocks {}..{}, cursor file {}",
			config.rpc_url,
			config.policy,
			config.batch_size,
			config.start_block,
			config
				.end_block
				.map(|end| end.to_string())
				.unwrap_or_else(|| "head".to_string()),
			config.cursor_file.display()
		);
		return Ok(());
	}

	let config = Arc::new(config);
	let mut follow_loop = initialize_services(config.clone())
		.await
		.map_err(|e| anyhow::anyhow!("Failed to initialize services: {}", e))?;

	let mut worker = tokio::spawn(async move { follow_loop.run().await });

	info!("Indexer started. Press Ctrl+C to shutdown");

	tokio::select! {
		result = &mut worker => match result {
			Ok(Ok(cursor)) => {
				info!("Indexing finished, next block {}", cursor);
				Ok(())
			}
			Ok(Err(e)) => {
				error!("Indexing stopped: {}", e);
				Err(e.into())
			}
			Err(e) => {
				error!("Indexing task failed: {}", e);
				Err(e.into())
			}
		},
		signal = shutdown_signal() => {
			let signal = signal?;
			info!("{} received, shutting down", signal);
			// The cursor only moves after a block is fully stored, aborting mid-batch is safe
			worker.abort();
			Ok(())
		}
	}
}

/// Waits for a termination signal and returns its name
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
	use tokio::signal::unix::{signal, SignalKind};

	let mut interrupt = signal(SignalKind::interrupt())?;
	let mut terminate = signal(SignalKind::terminate())?;
	let mut quit = signal(SignalKind::quit())?;
	let mut hangup = signal(SignalKind::hangup())?;

	let name = tokio::select! {
		_ = interrupt.recv() => "SIGINT",
		_ = terminate.recv() => "SIGTERM",
		_ = quit.recv() => "SIGQUIT",
		_ = hangup.recv() => "SIGHUP",
	};
	Ok(name)
}

/// Waits for a termination signal and returns its name
#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
	tokio::signal::ctrl_c().await?;
	Ok("Ctrl+C")
}
