//! Expressions, plans and the logical-to-physical planner.

pub mod explain;
pub mod functions;
pub mod logical_expr;
pub mod logical_plan;
pub mod physical_expr;
pub mod physical_plan;
pub mod physical_planner;
pub mod type_coercion;

pub use explain::{explain, PlanNode};
pub use functions::BuiltinScalarFunction;
pub use logical_expr::{
    call, cast, col, col_index, lit, lookup_column, lookup_index, BinaryOp, Expr, Literal,
    LiteralValue,
};
pub use logical_plan::{LogicalPlan, LogicalPlanBuilder};
pub use physical_expr::{bind_expr, PhysicalExpr};
pub use physical_plan::{FilterExec, PhysicalPlan, ProjectionExec, ScanExec};
pub use physical_planner::create_physical_plan;
