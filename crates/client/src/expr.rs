//! Expression builders re-exported for frame users, plus named helpers for
//! the builtin scalar functions.

use arrow_schema::DataType;
pub use mqe_planner::{call, cast, col, col_index, lit, BinaryOp, Expr, Literal, LiteralValue};

/// `upper(expr)`
pub fn upper(expr: Expr) -> Expr {
    call("upper", vec![expr])
}

/// `lower(expr)`
pub fn lower(expr: Expr) -> Expr {
    call("lower", vec![expr])
}

/// `length(expr)`, in characters.
pub fn length(expr: Expr) -> Expr {
    call("length", vec![expr])
}

/// `abs(expr)`
pub fn abs(expr: Expr) -> Expr {
    call("abs", vec![expr])
}

/// `concat(a, b, ...)`
pub fn concat(args: Vec<Expr>) -> Expr {
    call("concat", args)
}

/// Shorthand for `CAST(expr AS float64)`.
pub fn to_float64(expr: Expr) -> Expr {
    cast(expr, DataType::Float64)
}
