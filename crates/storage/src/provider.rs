use std::fmt::Debug;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::{Schema, SchemaRef};
use futures::stream::BoxStream;
use mqe_common::{MqeError, Result};

/// Lazy sequence of batches produced by a source or an operator.
pub type BatchStream = BoxStream<'static, Result<RecordBatch>>;

/// Schema provider plus batch producer consumed by scans.
///
/// Implementations are backend-specific (in-memory tables here; files or
/// remote stores live outside this crate).
pub trait DataSource: Send + Sync + Debug {
    /// Short name printed by explain (`in_memory`, a file name, ...).
    fn name(&self) -> &str;

    /// Full schema of every batch this source yields without projection.
    fn schema(&self) -> SchemaRef;

    /// Stream batches, narrowed to `projection` (in the given order) when present.
    ///
    /// The stream holds whatever the source needs for reading; dropping it
    /// releases those resources. An empty source yields an empty stream.
    ///
    /// # Errors
    /// Returns [`MqeError::UnknownColumn`] when a projected name is absent.
    fn scan(&self, projection: Option<&[String]>) -> Result<BatchStream>;
}

/// Positions of `names` in `schema`, first match wins for duplicated names.
pub fn projection_indices(schema: &Schema, names: &[String]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            schema
                .fields()
                .iter()
                .position(|f| f.name() == name)
                .ok_or_else(|| {
                    MqeError::unknown_column(
                        name.as_str(),
                        schema.fields().iter().map(|f| f.name().as_str()),
                    )
                })
        })
        .collect()
}

/// A new schema holding only `names`, in the order given.
pub fn select_fields(schema: &Schema, names: &[String]) -> Result<SchemaRef> {
    let indices = projection_indices(schema, names)?;
    let projected = schema
        .project(&indices)
        .map_err(|e| MqeError::SchemaMismatch(format!("schema projection failed: {e}")))?;
    Ok(Arc::new(projected))
}

/// True when both schemas have the same field names and types position by position.
///
/// Nullability and metadata are ignored: a nullable source column feeding a
/// plan that declared it non-null is still the same shape.
pub fn schemas_match(a: &Schema, b: &Schema) -> bool {
    a.fields().len() == b.fields().len()
        && a
            .fields()
            .iter()
            .zip(b.fields().iter())
            .all(|(l, r)| l.name() == r.name() && l.data_type() == r.data_type())
}
