//! Durable cursor storage.
//!
//! The cursor is the number of the next block to process, kept as decimal
//! text in a single file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Interface for cursor storage implementations
#[async_trait]
pub trait CursorStore: Send + Sync {
	/// Reads the persisted cursor
	///
	/// # Returns
	/// * `Result<Option<u64>, anyhow::Error>` - Next block to process, or None if nothing usable
	///   is stored
	async fn load(&self) -> Result<Option<u64>, anyhow::Error>;

	/// Persists the cursor, replacing the previous value
	async fn save(&self, cursor: u64) -> Result<(), anyhow::Error>;
}

/// File-based cursor storage
///
/// Writes go to a sibling temporary file that is synced and then renamed over
/// the cursor file, so the file always holds a complete number.
#[derive(Clone, Debug)]
pub struct FileCursorStore {
	path: PathBuf,
}

impl FileCursorStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn temp_path(&self) -> PathBuf {
		let file_name = self
			.path
			.file_name()
			.map(|name| name.to_string_lossy().to_string())
			.unwrap_or_else(|| "cursor".to_string());
		self.path.with_file_name(format!(".{}.tmp", file_name))
	}
}

#[async_trait]
impl CursorStore for FileCursorStore {
	/// Reads the cursor file
	///
	/// A missing file yields None. Content that is not a number is reported
	/// with a warning and also yields None, so the configured start is used.
	async fn load(&self) -> Result<Option<u64>, anyhow::Error> {
		if !self.path.exists() {
			return Ok(None);
		}

		let content = tokio::fs::read_to_string(&self.path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to read cursor file: {}", e))?;

		match content.trim().parse::<u64>() {
			Ok(cursor) => Ok(Some(cursor)),
			Err(e) => {
				tracing::warn!(
					"Ignoring unreadable cursor file {} ({:?}): {}",
					self.path.display(),
					content.trim(),
					e
				);
				Ok(None)
			}
		}
	}

	async fn save(&self, cursor: u64) -> Result<(), anyhow::Error> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| anyhow::anyhow!("Failed to create cursor directory: {}", e))?;
		}

		let temp_path = self.temp_path();
		let mut file = tokio::fs::File::create(&temp_path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to create temporary cursor file: {}", e))?;
		file.write_all(cursor.to_string().as_bytes())
			.await
			.map_err(|e| anyhow::anyhow!("Failed to write cursor: {}", e))?;
		file.sync_all()
			.await
			.map_err(|e| anyhow::anyhow!("Failed to sync cursor: {}", e))?;
		drop(file);

		tokio::fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| anyhow::anyhow!("Failed to replace cursor file: {}", e))?;
		Ok(())
	}
}
