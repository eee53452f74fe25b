use std::sync::Arc;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use futures::StreamExt;
use mqe_common::{MqeError, Result};
use tracing::trace;

use crate::provider::{projection_indices, schemas_match, BatchStream, DataSource};

/// Default source name for memory tables.
pub const IN_MEMORY: &str = "in_memory";

/// In-memory data source over already materialized batches.
///
/// Batches are shared, never copied: scanning clones `Arc`s and projecting a
/// batch only rearranges column references.
#[derive(Debug, Clone)]
pub struct MemTable {
    name: String,
    schema: SchemaRef,
    batches: Arc<Vec<RecordBatch>>,
}

impl MemTable {
    /// Build a table whose batches all follow `schema`.
    ///
    /// # Errors
    /// Returns [`MqeError::SchemaMismatch`] when a batch has different field
    /// names or types than `schema`, or holds nulls in a column `schema`
    /// declares non-nullable.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (i, batch) in batches.iter().enumerate() {
            if !schemas_match(&schema, batch.schema_ref()) {
                return Err(MqeError::SchemaMismatch(format!(
                    "batch {i} has schema [{}], table declares [{}]",
                    mqe_common::schema_fields(batch.schema_ref()),
                    mqe_common::schema_fields(&schema)
                )));
            }
            let nulls = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .find(|(field, column)| !field.is_nullable() && column.null_count() > 0);
            if let Some((field, column)) = nulls {
                return Err(MqeError::SchemaMismatch(format!(
                    "batch {i} has {} nulls in non-nullable column '{}'",
                    column.null_count(),
                    field.name()
                )));
            }
        }
        Ok(Self {
            name: IN_MEMORY.to_string(),
            schema,
            batches: Arc::new(batches),
        })
    }

    /// Build a table taking its schema from the first batch.
    ///
    /// # Errors
    /// Returns [`MqeError::InvalidConfig`] for an empty batch list, since there is
    /// nothing to infer a schema from.
    pub fn from_batches(batches: Vec<RecordBatch>) -> Result<Self> {
        let schema = batches
            .first()
            .map(|b| b.schema())
            .ok_or_else(|| {
                MqeError::InvalidConfig(
                    "cannot infer schema: no batches and no schema provided".to_string(),
                )
            })?;
        Self::try_new(schema, batches)
    }

    /// Rename the source (shown by explain).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The batches backing this table.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total row count across all batches.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

impl DataSource for MemTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    fn scan(&self, projection: Option<&[String]>) -> Result<BatchStream> {
        let indices = projection
            .map(|names| projection_indices(&self.schema, names))
            .transpose()?;
        let batches = Arc::clone(&self.batches);
        let name = self.name.clone();

        let stream = futures::stream::iter(0..batches.len()).map(move |i| {
            let batch = &batches[i];
            trace!(source = %name, batch = i, rows = batch.num_rows(), "memory scan batch");
            match &indices {
                Some(idx) => batch
                    .project(idx)
                    .map_err(|e| MqeError::Execution(format!("batch projection failed: {e}"))),
                None => Ok(batch.clone()),
            }
        });
        Ok(stream.boxed())
    }
}
