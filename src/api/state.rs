use std::sync::Arc;

use tokio::sync::Mutex;

use crate::cache::ParticipantDirectory;
use crate::storage::StorageConfig;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageConfig>,
    pub directory: Arc<dyn ParticipantDirectory>,

    /// Serializes writers to the submissions file
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(storage: StorageConfig, directory: Arc<dyn ParticipantDirectory>) -> Self {
        Self {
            storage: Arc::new(storage),
            directory,
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}
