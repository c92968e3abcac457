//! Filesystem league store.
//!
//! All league rows live as JSONL files under the data directory:
//! - Reference data: participants, segments, seasons, weeks
//! - Submissions: one selected activity and result per (participant, week)
//!
//! Derived values (ranks, points, standings) are never written here.

mod jsonl;

pub use jsonl::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(#[from] crate::models::ModelError),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn league_dir(&self) -> PathBuf {
        self.data_dir.join("league")
    }

    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.league_dir().join(entity.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
