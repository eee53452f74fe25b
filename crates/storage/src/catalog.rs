use std::collections::BTreeMap;
use std::sync::Arc;

use mqe_common::{MqeError, Result};

use crate::provider::DataSource;

/// Name → data source registry used by the façade.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    tables: BTreeMap<String, Arc<dyn DataSource>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Register or replace a source. Returns `true` when a table was replaced.
    pub fn register(&mut self, name: impl Into<String>, source: Arc<dyn DataSource>) -> bool {
        self.tables.insert(name.into(), source).is_some()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn DataSource>> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| MqeError::InvalidConfig(format!("unknown table: {name}")))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}
