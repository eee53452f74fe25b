use std::sync::Arc;

use arrow_schema::SchemaRef;
use mqe_common::Result;
use mqe_storage::DataSource;

use crate::explain::{explain, scan_summary, PlanNode};
use crate::physical_expr::PhysicalExpr;

/// Bound operator tree produced by the physical planner.
///
/// Every node carries its output schema, computed once at planning time.
#[derive(Debug, Clone)]
pub enum PhysicalPlan {
    Scan(ScanExec),
    Filter(FilterExec),
    Projection(ProjectionExec),
}

impl PhysicalPlan {
    pub fn schema(&self) -> SchemaRef {
        match self {
            PhysicalPlan::Scan(x) => Arc::clone(&x.schema),
            PhysicalPlan::Filter(x) => Arc::clone(&x.schema),
            PhysicalPlan::Projection(x) => Arc::clone(&x.schema),
        }
    }

    /// Returns direct child operators.
    pub fn children(&self) -> Vec<&PhysicalPlan> {
        match self {
            PhysicalPlan::Scan(_) => vec![],
            PhysicalPlan::Filter(x) => vec![x.input.as_ref()],
            PhysicalPlan::Projection(x) => vec![x.input.as_ref()],
        }
    }

    pub fn explain(&self, verbose: bool) -> String {
        explain(self, verbose)
    }
}

impl PlanNode for PhysicalPlan {
    fn label(&self, verbose: bool) -> String {
        match self {
            PhysicalPlan::Scan(x) => format!(
                "ScanExec: {}",
                scan_summary(x.source.name(), x.projection.as_deref(), verbose)
            ),
            PhysicalPlan::Filter(x) => format!("FilterExec: {}", x.predicate),
            PhysicalPlan::Projection(x) => {
                let exprs = x.exprs.iter().map(ToString::to_string).collect::<Vec<_>>();
                format!("ProjectionExec: {}", exprs.join(", "))
            }
        }
    }

    fn output_schema(&self) -> Result<SchemaRef> {
        Ok(self.schema())
    }

    fn inputs(&self) -> Vec<&Self> {
        self.children()
    }
}

/// Reads a data source.
#[derive(Debug, Clone)]
pub struct ScanExec {
    pub source: Arc<dyn DataSource>,
    /// Column names to keep, in output order. `None` keeps every column.
    pub projection: Option<Vec<String>>,
    /// Source schema narrowed to `projection`.
    pub schema: SchemaRef,
}

/// Keeps rows where the boolean predicate evaluates to true.
#[derive(Debug, Clone)]
pub struct FilterExec {
    pub input: Box<PhysicalPlan>,
    pub predicate: PhysicalExpr,
    /// Same as the input schema.
    pub schema: SchemaRef,
}

/// Evaluates one output column per expression.
#[derive(Debug, Clone)]
pub struct ProjectionExec {
    pub input: Box<PhysicalPlan>,
    pub exprs: Vec<PhysicalExpr>,
    pub schema: SchemaRef,
}
