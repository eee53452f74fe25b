use std::sync::Arc;

use arrow_schema::{Schema, SchemaRef};
use mqe_common::Result;
use mqe_storage::{select_fields, DataSource};

use crate::explain::{explain, scan_summary, PlanNode};
use crate::logical_expr::Expr;
use crate::type_coercion::require_boolean;

/// Unbound operator tree.
///
/// Schemas are never stored; [`LogicalPlan::schema`] derives them from the
/// source and the expressions on every call. Inputs are shared so that
/// cloning a plan (and every frame built on it) is cheap.
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// Leaf reading a data source, optionally narrowed to named columns.
    Scan {
        source: Arc<dyn DataSource>,
        projection: Option<Vec<String>>,
    },
    /// Keeps rows where `predicate` is true.
    Filter {
        input: Arc<LogicalPlan>,
        predicate: Expr,
    },
    /// One output column per expression, in order. Output names may repeat.
    Projection {
        input: Arc<LogicalPlan>,
        exprs: Vec<Expr>,
    },
}

impl LogicalPlan {
    /// Output schema.
    ///
    /// # Errors
    /// - `UnknownColumn` for a projection name or column reference absent from the input
    /// - `TypeMismatch` for ill-typed expressions or a non-boolean filter predicate
    pub fn schema(&self) -> Result<SchemaRef> {
        match self {
            LogicalPlan::Scan { source, projection } => match projection {
                Some(names) => select_fields(&source.schema(), names),
                None => Ok(source.schema()),
            },
            LogicalPlan::Filter { input, predicate } => {
                let schema = input.schema()?;
                let field = predicate.resolve(&schema)?;
                require_boolean("filter predicate", field.data_type())?;
                Ok(schema)
            }
            LogicalPlan::Projection { input, exprs } => {
                let input_schema = input.schema()?;
                let fields = exprs
                    .iter()
                    .map(|e| e.resolve(&input_schema))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(Schema::new(fields)))
            }
        }
    }

    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::Scan { .. } => vec![],
            LogicalPlan::Filter { input, .. } | LogicalPlan::Projection { input, .. } => {
                vec![input.as_ref()]
            }
        }
    }

    pub fn explain(&self, verbose: bool) -> String {
        explain(self, verbose)
    }
}

impl PlanNode for LogicalPlan {
    fn label(&self, verbose: bool) -> String {
        match self {
            LogicalPlan::Scan { source, projection } => {
                format!(
                    "Scan: {}",
                    scan_summary(source.name(), projection.as_deref(), verbose)
                )
            }
            LogicalPlan::Filter { predicate, .. } => format!("Filter: {predicate}"),
            LogicalPlan::Projection { exprs, .. } => {
                let exprs = exprs.iter().map(ToString::to_string).collect::<Vec<_>>();
                format!("Projection: {}", exprs.join(", "))
            }
        }
    }

    fn output_schema(&self) -> Result<SchemaRef> {
        self.schema()
    }

    fn inputs(&self) -> Vec<&Self> {
        self.children()
    }
}

/// Fluent construction of [`LogicalPlan`] trees.
///
/// Nothing is validated here; name and type errors surface from
/// [`LogicalPlan::schema`] or when the plan is compiled.
#[derive(Debug, Clone)]
pub struct LogicalPlanBuilder {
    plan: LogicalPlan,
}

impl LogicalPlanBuilder {
    pub fn scan(source: Arc<dyn DataSource>, projection: Option<Vec<String>>) -> Self {
        Self {
            plan: LogicalPlan::Scan { source, projection },
        }
    }

    pub fn from_plan(plan: LogicalPlan) -> Self {
        Self { plan }
    }

    pub fn filter(self, predicate: Expr) -> Self {
        Self {
            plan: LogicalPlan::Filter {
                input: Arc::new(self.plan),
                predicate,
            },
        }
    }

    pub fn project(self, exprs: Vec<Expr>) -> Self {
        Self {
            plan: LogicalPlan::Projection {
                input: Arc::new(self.plan),
                exprs,
            },
        }
    }

    pub fn build(self) -> LogicalPlan {
        self.plan
    }
}
