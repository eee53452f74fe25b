use serde::{Deserialize, Serialize};

/// Engine-wide settings shared by the façade and its memory sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum rows per batch when the façade splits column data into batches.
    pub batch_size_rows: usize,
    /// Source name shown by explain for tables the façade builds in memory.
    pub source_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size_rows: 8192,
            source_name: "in_memory".to_string(),
        }
    }
}

impl EngineConfig {
    /// Override [`EngineConfig::batch_size_rows`]. Zero is clamped to one row.
    pub fn with_batch_size_rows(mut self, rows: usize) -> Self {
        self.batch_size_rows = rows.max(1);
        self
    }

    /// Override [`EngineConfig::source_name`].
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"batch_size_rows": 2}"#).expect("parse config");
        assert_eq!(cfg.batch_size_rows, 2);
        assert_eq!(cfg.source_name, "in_memory");
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let cfg = EngineConfig::default().with_batch_size_rows(0);
        assert_eq!(cfg.batch_size_rows, 1);
    }
}
