use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mqe_common::{EngineConfig, MqeError, Result};
use mqe_storage::Catalog;

pub type SharedSession = Arc<Session>;

#[derive(Debug)]
pub struct Session {
    pub config: EngineConfig,
    catalog: RwLock<Catalog>,
}

impl Session {
    pub fn new(config: EngineConfig) -> Result<Self> {
        if config.batch_size_rows == 0 {
            return Err(MqeError::InvalidConfig(
                "batch_size_rows must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            config,
            catalog: RwLock::new(Catalog::new()),
        })
    }

    pub fn catalog(&self) -> Result<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|_| MqeError::Execution("catalog lock poisoned".to_string()))
    }

    pub fn catalog_mut(&self) -> Result<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|_| MqeError::Execution("catalog lock poisoned".to_string()))
    }
}
