use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_schema::SchemaRef;
use futures::TryStreamExt;
use mqe_common::Result;
use mqe_execution::{execute_plan, RecordBatchStream, SendableRecordBatchStream};
use mqe_planner::{col, create_physical_plan, Expr, LogicalPlan, LogicalPlanBuilder, PhysicalPlan};
use mqe_storage::DataSource;
use tracing::info;

use crate::result::QueryResult;
use crate::session::SharedSession;

/// Lazy query: a logical plan plus the session that will run it.
///
/// Every builder method returns a new frame; nothing is validated or read
/// until the frame is compiled or collected.
#[derive(Debug, Clone)]
pub struct DataFrame {
    session: SharedSession,
    logical_plan: LogicalPlan,
}

impl DataFrame {
    pub(crate) fn new(session: SharedSession, logical_plan: LogicalPlan) -> Self {
        Self {
            session,
            logical_plan,
        }
    }

    pub(crate) fn scan(session: SharedSession, source: Arc<dyn DataSource>) -> Self {
        Self::new(session, LogicalPlanBuilder::scan(source, None).build())
    }

    pub fn logical_plan(&self) -> &LogicalPlan {
        &self.logical_plan
    }

    fn with_builder(self, f: impl FnOnce(LogicalPlanBuilder) -> LogicalPlanBuilder) -> Self {
        let plan = f(LogicalPlanBuilder::from_plan(self.logical_plan)).build();
        Self::new(self.session, plan)
    }

    /// df.select(exprs)
    pub fn select(self, exprs: Vec<Expr>) -> Self {
        self.with_builder(|b| b.project(exprs))
    }

    /// df.select_columns(&["a", "b"])
    pub fn select_columns(self, names: &[&str]) -> Self {
        let exprs = names.iter().map(|n| col(*n)).collect();
        self.select(exprs)
    }

    /// df.filter(expr)
    pub fn filter(self, predicate: Expr) -> Self {
        self.with_builder(|b| b.filter(predicate))
    }

    /// Same as [`DataFrame::filter`].
    pub fn where_(self, predicate: Expr) -> Self {
        self.filter(predicate)
    }

    /// Output schema, derived from the logical plan.
    pub fn schema(&self) -> Result<SchemaRef> {
        self.logical_plan.schema()
    }

    pub fn physical_plan(&self) -> Result<PhysicalPlan> {
        create_physical_plan(&self.logical_plan)
    }

    /// Logical and physical renderings, one section each.
    ///
    /// # Errors
    /// Anything that makes the plan fail to compile.
    pub fn explain(&self, verbose: bool) -> Result<String> {
        let physical = self.physical_plan()?;
        Ok(format!(
            "== Logical Plan ==\n{}\n\n== Physical Plan ==\n{}",
            self.logical_plan.explain(verbose),
            physical.explain(verbose)
        ))
    }

    /// Compile and start executing; batches are produced as the stream is polled.
    pub async fn collect_stream(&self) -> Result<SendableRecordBatchStream> {
        let physical = self.physical_plan()?;
        execute_plan(&physical)
    }

    /// df.collect() (async)
    pub async fn collect(&self) -> Result<QueryResult> {
        let stream = self.collect_stream().await?;
        let schema = stream.schema();
        let batches: Vec<RecordBatch> = stream.try_collect().await?;
        let result = QueryResult::new(self.session.clone(), schema, batches);
        info!(
            rows = result.num_rows(),
            batches = result.num_batches(),
            "query collected"
        );
        Ok(result)
    }

    /// [`DataFrame::collect`] driven to completion on the current thread.
    pub fn collect_blocking(&self) -> Result<QueryResult> {
        futures::executor::block_on(self.collect())
    }
}
