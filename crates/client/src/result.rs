use std::fmt;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use arrow_schema::SchemaRef;
use mqe_common::{schema_fields, Result};
use mqe_planner::Expr;
use mqe_storage::MemTable;

use crate::dataframe::DataFrame;
use crate::session::SharedSession;

/// Materialized output of a query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    session: SharedSession,
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl QueryResult {
    pub(crate) fn new(session: SharedSession, schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            session,
            schema,
            batches,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Output batches in stream order, zero-row batches included.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    /// A new frame over these rows, for further querying.
    pub fn lazy(&self) -> Result<DataFrame> {
        let table = MemTable::try_new(self.schema(), self.batches.clone())?
            .with_name(self.session.config.source_name.clone());
        Ok(DataFrame::scan(self.session.clone(), Arc::new(table)))
    }

    /// Eager `select`: re-query these rows and collect right away.
    pub fn select(&self, exprs: Vec<Expr>) -> Result<QueryResult> {
        self.lazy()?.select(exprs).collect_blocking()
    }

    /// Eager `filter`.
    pub fn filter(&self, predicate: Expr) -> Result<QueryResult> {
        self.lazy()?.filter(predicate).collect_blocking()
    }

    /// Same as [`QueryResult::filter`].
    pub fn where_(&self, predicate: Expr) -> Result<QueryResult> {
        self.filter(predicate)
    }

    /// Header printed above the table: row, column and batch counts plus the
    /// schema, underlined.
    pub fn summary(&self) -> String {
        let schema = format!("[{}]", schema_fields(&self.schema));
        format!(
            "Rows:    {}\nColumns: {}\nBatches: {}\nSchema:  {schema}\n{}",
            self.num_rows(),
            self.schema.fields().len(),
            self.num_batches(),
            "=".repeat(schema.chars().count() + 10)
        )
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = pretty_format_batches(&self.batches).map_err(|_| fmt::Error)?;
        write!(f, "{}\n{table}", self.summary())
    }
}
