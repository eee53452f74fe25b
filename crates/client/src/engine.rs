use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use arrow_schema::{Field, Schema, SchemaRef};
use mqe_common::{EngineConfig, MqeError, Result};
use mqe_execution::{execute_plan, SendableRecordBatchStream};
use mqe_planner::{create_physical_plan, LogicalPlan, PhysicalPlan};
use mqe_storage::{DataSource, MemTable};
use tracing::debug;

use crate::session::{Session, SharedSession};
use crate::DataFrame;

/// Entry point: owns the configuration and the table catalog, and runs the
/// compile and execute stages for the frames it hands out.
#[derive(Debug, Clone)]
pub struct Engine {
    session: SharedSession,
}

impl Engine {
    /// # Errors
    /// `InvalidConfig` when `batch_size_rows` is zero.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let session = Arc::new(Session::new(config)?);
        Ok(Self { session })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.session.config
    }

    /// Register a source under `name`, replacing any previous registration.
    pub fn register_table(&self, name: impl Into<String>, source: Arc<dyn DataSource>) -> Result<()> {
        let name = name.into();
        let replaced = self.session.catalog_mut()?.register(name.clone(), source);
        debug!(table = %name, replaced, "registered table");
        Ok(())
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.session.catalog()?.names())
    }

    /// Frame scanning a registered table.
    pub fn table(&self, name: &str) -> Result<DataFrame> {
        let source = self.session.catalog()?.get(name)?;
        Ok(self.read_source(source))
    }

    /// Frame scanning `source` directly, without registering it.
    pub fn read_source(&self, source: Arc<dyn DataSource>) -> DataFrame {
        DataFrame::scan(self.session.clone(), source)
    }

    /// Frame over in-memory batches. Without `schema` it is taken from the
    /// first batch; with one, `batches` may be empty.
    ///
    /// # Errors
    /// - `InvalidConfig` when `batches` is empty and no schema is given
    /// - `SchemaMismatch` when a batch disagrees with the schema
    pub fn from_batches(
        &self,
        batches: Vec<RecordBatch>,
        schema: Option<SchemaRef>,
    ) -> Result<DataFrame> {
        let table = match schema {
            Some(schema) => MemTable::try_new(schema, batches)?,
            None => MemTable::from_batches(batches)?,
        };
        let table = table.with_name(self.config().source_name.clone());
        Ok(self.read_source(Arc::new(table)))
    }

    /// Frame over named columns, split into batches of at most
    /// `batch_size_rows` rows.
    ///
    /// # Errors
    /// `InvalidConfig` when no columns are given or their lengths differ.
    pub fn from_columns<N: Into<String>>(&self, columns: Vec<(N, ArrayRef)>) -> Result<DataFrame> {
        if columns.is_empty() {
            return Err(MqeError::InvalidConfig(
                "from_columns expects at least one column".to_string(),
            ));
        }
        let (names, arrays): (Vec<String>, Vec<ArrayRef>) =
            columns.into_iter().map(|(n, a)| (n.into(), a)).unzip();

        let rows = arrays[0].len();
        if let Some((name, arr)) = names.iter().zip(&arrays).find(|(_, a)| a.len() != rows) {
            return Err(MqeError::InvalidConfig(format!(
                "all columns must have the same length: '{}' has {rows} rows, '{name}' has {}",
                names[0],
                arr.len()
            )));
        }

        let schema: SchemaRef = Arc::new(Schema::new(
            names
                .iter()
                .zip(&arrays)
                .map(|(name, arr)| Field::new(name, arr.data_type().clone(), true))
                .collect::<Vec<_>>(),
        ));
        let batches = split_batches(&schema, &arrays, rows, self.config().batch_size_rows)?;
        self.from_batches(batches, Some(schema))
    }

    /// Lower a logical plan into a physical plan.
    pub fn compile(&self, plan: &LogicalPlan) -> Result<PhysicalPlan> {
        let physical = create_physical_plan(plan)?;
        debug!(plan = %physical.explain(false), "compiled query");
        Ok(physical)
    }

    /// Lazy output stream of a compiled plan.
    pub fn execute(&self, plan: &PhysicalPlan) -> Result<SendableRecordBatchStream> {
        execute_plan(plan)
    }

    pub fn explain(&self, plan: &LogicalPlan, verbose: bool) -> String {
        plan.explain(verbose)
    }
}

fn split_batches(
    schema: &SchemaRef,
    arrays: &[ArrayRef],
    rows: usize,
    batch_size: usize,
) -> Result<Vec<RecordBatch>> {
    (0..rows)
        .step_by(batch_size.max(1))
        .map(|offset| {
            let len = batch_size.min(rows - offset);
            let columns = arrays.iter().map(|a| a.slice(offset, len)).collect();
            RecordBatch::try_new(Arc::clone(schema), columns)
                .map_err(|e| MqeError::InvalidConfig(format!("invalid column data: {e}")))
        })
        .collect()
}
