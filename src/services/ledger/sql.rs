//! SQL ledger backed by PostgreSQL or SQLite.

use async_trait::async_trait;
use sqlx::{
	postgres::PgPoolOptions,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
	PgPool, SqlitePool,
};
use std::{collections::HashMap, str::FromStr, time::Duration};
use tracing::instrument;

use crate::{
	models::{GapRecord, LedgerRecord},
	services::ledger::{LedgerError, LedgerSink},
};

/// Table holding transaction hashes and their observation counters
pub const TRANSACTIONS_TABLE: &str = "ledger_tx";

/// Table holding block numbers that had no block at fetch time
pub const GAPS_TABLE: &str = "gaps";

const CREATE_TRANSACTIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS ledger_tx (
	tx TEXT PRIMARY KEY,
	count BIGINT NOT NULL DEFAULT 1
)";

const CREATE_GAPS_TABLE: &str = "CREATE TABLE IF NOT EXISTS gaps (
	block TEXT PRIMARY KEY
)";

const PG_UPSERT_TRANSACTION: &str = "INSERT INTO ledger_tx (tx, count) VALUES ($1, 1) \
	ON CONFLICT (tx) DO UPDATE SET count = ledger_tx.count + 1";
const PG_INSERT_GAP: &str = "INSERT INTO gaps (block) VALUES ($1) ON CONFLICT (block) DO NOTHING";
const PG_SELECT_TRANSACTION: &str = "SELECT tx, count FROM ledger_tx WHERE tx = $1";
const PG_SELECT_GAP: &str = "SELECT block FROM gaps WHERE block = $1";

const SQLITE_UPSERT_TRANSACTION: &str = "INSERT INTO ledger_tx (tx, count) VALUES (?, 1) \
	ON CONFLICT (tx) DO UPDATE SET count = ledger_tx.count + 1";
const SQLITE_INSERT_GAP: &str = "INSERT INTO gaps (block) VALUES (?) ON CONFLICT (block) DO NOTHING";
const SQLITE_SELECT_TRANSACTION: &str = "SELECT tx, count FROM ledger_tx WHERE tx = ?";
const SQLITE_SELECT_GAP: &str = "SELECT block FROM gaps WHERE block = ?";

/// Ledger stored in a relational database
///
/// The backend is picked from the connection string scheme. Block numbers are
/// stored as decimal text.
#[derive(Debug, Clone)]
pub enum SqlLedger {
	Postgres(PgPool),
	Sqlite(SqlitePool),
}

impl SqlLedger {
	/// Opens a connection pool for `postgres://`, `postgresql://` or `sqlite:` URLs
	pub async fn connect(database_url: &str) -> Result<Self, LedgerError> {
		let metadata = Some(HashMap::from([(
			"backend".to_string(),
			backend_name(database_url).to_string(),
		)]));

		if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
			let pool = PgPoolOptions::new()
				.max_connections(5)
				.acquire_timeout(Duration::from_secs(30))
				.connect(database_url)
				.await
				.map_err(|e| {
					LedgerError::connection_error(
						"Failed to connect to PostgreSQL",
						Some(Box::new(e)),
						metadata,
					)
				})?;
			return Ok(Self::Postgres(pool));
		}

		if database_url.starts_with("sqlite:") {
			let options = SqliteConnectOptions::from_str(database_url)
				.map_err(|e| {
					LedgerError::connection_error(
						"Invalid SQLite connection string",
						Some(Box::new(e)),
						metadata.clone(),
					)
				})?
				.create_if_missing(true);

			// One connection, kept open: an in-memory database lives as long as its connection
			let pool = SqlitePoolOptions::new()
				.max_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
				.connect_with(options)
				.await
				.map_err(|e| {
					LedgerError::connection_error(
						"Failed to open SQLite database",
						Some(Box::new(e)),
						metadata,
					)
				})?;
			return Ok(Self::Sqlite(pool));
		}

		Err(LedgerError::connection_error(
			"Unsupported database connection string",
			None,
			None,
		))
	}

	/// Creates the ledger tables if they do not exist
	#[instrument(skip_all)]
	pub async fn ensure_schema(&self) -> Result<(), LedgerError> {
		for statement in [CREATE_TRANSACTIONS_TABLE, CREATE_GAPS_TABLE] {
			let result = match self {
				Self::Postgres(pool) => sqlx::query(statement).execute(pool).await.map(|_| ()),
				Self::Sqlite(pool) => sqlx::query(statement).execute(pool).await.map(|_| ()),
			};
			result.map_err(|e| {
				LedgerError::schema_error("Failed to create ledger tables", Some(Box::new(e)), None)
			})?;
		}

		tracing::debug!(
			"Ledger tables {} and {} are ready",
			TRANSACTIONS_TABLE,
			GAPS_TABLE
		);
		Ok(())
	}

	/// Reads one transaction record
	pub async fn get_transaction(&self, hash: &str) -> Result<Option<LedgerRecord>, LedgerError> {
		let row: Option<(String, i64)> = match self {
			Self::Postgres(pool) => {
				sqlx::query_as::<_, (String, i64)>(PG_SELECT_TRANSACTION)
					.bind(hash)
					.fetch_optional(pool)
					.await
			}
			Self::Sqlite(pool) => {
				sqlx::query_as::<_, (String, i64)>(SQLITE_SELECT_TRANSACTION)
					.bind(hash)
					.fetch_optional(pool)
					.await
			}
		}
		.map_err(|e| {
			LedgerError::from_sqlx(
				"Failed to read transaction",
				e,
				Some(HashMap::from([("tx".to_string(), hash.to_string())])),
			)
		})?;

		Ok(row.map(|(hash, count)| LedgerRecord { hash, count }))
	}

	/// Reads one gap record
	pub async fn get_gap(&self, block: u64) -> Result<Option<GapRecord>, LedgerError> {
		let key = block.to_string();
		let row: Option<(String,)> = match self {
			Self::Postgres(pool) => {
				sqlx::query_as::<_, (String,)>(PG_SELECT_GAP)
					.bind(key.as_str())
					.fetch_optional(pool)
					.await
			}
			Self::Sqlite(pool) => {
				sqlx::query_as::<_, (String,)>(SQLITE_SELECT_GAP)
					.bind(key.as_str())
					.fetch_optional(pool)
					.await
			}
		}
		.map_err(|e| {
			LedgerError::from_sqlx(
				"Failed to read gap",
				e,
				Some(HashMap::from([("block".to_string(), key.clone())])),
			)
		})?;

		Ok(row.map(|_| GapRecord { block }))
	}

	/// Closes the pool, waiting for in-flight statements
	pub async fn close(&self) {
		match self {
			Self::Postgres(pool) => pool.close().await,
			Self::Sqlite(pool) => pool.close().await,
		}
	}
}

#[async_trait]
impl LedgerSink for SqlLedger {
	async fn record_transaction(&self, hash: &str) -> Result<(), LedgerError> {
		let result = match self {
			Self::Postgres(pool) => {
				sqlx::query(PG_UPSERT_TRANSACTION)
					.bind(hash)
					.execute(pool)
					.await
					.map(|_| ())
			}
			Self::Sqlite(pool) => {
				sqlx::query(SQLITE_UPSERT_TRANSACTION)
					.bind(hash)
					.execute(pool)
					.await
					.map(|_| ())
			}
		};

		result.map_err(|e| {
			LedgerError::from_sqlx(
				"Failed to record transaction",
				e,
				Some(HashMap::from([("tx".to_string(), hash.to_string())])),
			)
		})
	}

	async fn record_gap(&self, block: u64) -> Result<(), LedgerError> {
		let key = block.to_string();
		let result = match self {
			Self::Postgres(pool) => {
				sqlx::query(PG_INSERT_GAP)
					.bind(key.as_str())
					.execute(pool)
					.await
					.map(|_| ())
			}
			Self::Sqlite(pool) => {
				sqlx::query(SQLITE_INSERT_GAP)
					.bind(key.as_str())
					.execute(pool)
					.await
					.map(|_| ())
			}
		};

		result.map_err(|e| {
			LedgerError::from_sqlx(
				"Failed to record gap",
				e,
				Some(HashMap::from([("block".to_string(), key)])),
			)
		})
	}
}

fn backend_name(database_url: &str) -> &'static str {
	if database_url.starts_with("sqlite:") {
		"sqlite"
	} else {
		"postgres"
	}
}
