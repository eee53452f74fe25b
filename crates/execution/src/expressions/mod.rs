//! Vectorized evaluation of bound expressions.
//!
//! Input contract:
//! - expressions were bound by the planner against the schema of `batch`;
//! - column references are positions, nothing is looked up by name.
//!
//! Output contract:
//! - array results are aligned to the input batch row count;
//! - literals stay scalar until a consumer asks for an array.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::kernels::{
    boolean::{and, not, or},
    cmp::{eq, gt, gt_eq, lt, lt_eq, neq},
    numeric::{add, div, mul, rem, sub},
};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::record_batch::RecordBatch;
use arrow_schema::{ArrowError, DataType};
use mqe_common::{type_name, MqeError, Result};
use mqe_planner::{BinaryOp, LiteralValue, PhysicalExpr};

use crate::functions;

/// Result of evaluating an expression over one batch.
#[derive(Debug, Clone)]
pub enum ColumnarValue {
    /// One value per row.
    Array(ArrayRef),
    /// A single value standing for every row.
    Scalar(LiteralValue),
}

impl ColumnarValue {
    /// Type of the values.
    pub fn data_type(&self) -> DataType {
        match self {
            ColumnarValue::Array(a) => a.data_type().clone(),
            ColumnarValue::Scalar(v) => v.data_type(),
        }
    }

    /// Materialize as an array of `num_rows` rows, broadcasting scalars.
    pub fn into_array(self, num_rows: usize) -> Result<ArrayRef> {
        match self {
            ColumnarValue::Array(a) if a.len() == num_rows => Ok(a),
            ColumnarValue::Array(a) => Err(MqeError::Execution(format!(
                "array of {} rows does not match batch of {num_rows} rows",
                a.len()
            ))),
            ColumnarValue::Scalar(v) => Ok(broadcast(&v, num_rows)),
        }
    }
}

fn broadcast(v: &LiteralValue, len: usize) -> ArrayRef {
    match v {
        LiteralValue::Int64(x) => Arc::new(Int64Array::from_value(*x, len)),
        LiteralValue::Float64(x) => Arc::new(Float64Array::from_value(*x, len)),
        LiteralValue::Utf8(s) => Arc::new(StringArray::from_iter_values(
            std::iter::repeat(s.as_str()).take(len),
        )),
        LiteralValue::Boolean(b) => Arc::new(BooleanArray::from(vec![*b; len])),
    }
}

/// Evaluate `expr` over every row of `batch`.
///
/// Nulls propagate through every operator. Failures (integer division by
/// zero, a string that does not parse under `CAST`) are
/// [`MqeError::Execution`].
pub fn evaluate(expr: &PhysicalExpr, batch: &RecordBatch) -> Result<ColumnarValue> {
    let rows = batch.num_rows();
    match expr {
        PhysicalExpr::Column { index, .. } => batch
            .columns()
            .get(*index)
            .map(|c| ColumnarValue::Array(Arc::clone(c)))
            .ok_or_else(|| {
                MqeError::SchemaMismatch(format!(
                    "column #{index} out of range for batch with {} columns",
                    batch.num_columns()
                ))
            }),

        PhysicalExpr::Literal(v) => Ok(ColumnarValue::Scalar(v.clone())),

        PhysicalExpr::BinaryOp {
            left,
            op,
            right,
            operand_type,
            ..
        } => {
            let l = cast_array(&evaluate(left, batch)?.into_array(rows)?, operand_type)?;
            let r = cast_array(&evaluate(right, batch)?.into_array(rows)?, operand_type)?;
            eval_binary(*op, &l, &r).map(ColumnarValue::Array)
        }

        PhysicalExpr::Not(inner) => {
            let arr = evaluate(inner, batch)?.into_array(rows)?;
            let out = not(as_boolean(&arr, "NOT")?)
                .map_err(|e| MqeError::Execution(format!("not failed: {e}")))?;
            Ok(ColumnarValue::Array(Arc::new(out)))
        }

        PhysicalExpr::Alias { expr, .. } => evaluate(expr, batch),

        PhysicalExpr::Cast { expr, to_type } => {
            let arr = evaluate(expr, batch)?.into_array(rows)?;
            cast_array(&arr, to_type).map(ColumnarValue::Array)
        }

        PhysicalExpr::ScalarFunction { func, args, .. } => {
            let arrays = args
                .iter()
                .map(|a| evaluate(a, batch)?.into_array(rows))
                .collect::<Result<Vec<_>>>()?;
            functions::invoke(*func, &arrays).map(ColumnarValue::Array)
        }
    }
}

/// Cast with `safe = false`: values that cannot be converted are errors,
/// not nulls.
fn cast_array(arr: &ArrayRef, to: &DataType) -> Result<ArrayRef> {
    if arr.data_type() == to {
        return Ok(Arc::clone(arr));
    }
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(arr, to, &options).map_err(|e| {
        MqeError::Execution(format!(
            "cast from {} to {} failed: {e}",
            type_name(arr.data_type()),
            type_name(to)
        ))
    })
}

fn as_boolean<'a>(arr: &'a ArrayRef, context: &str) -> Result<&'a BooleanArray> {
    arr.as_boolean_opt().ok_or_else(|| {
        MqeError::Execution(format!(
            "{context} expects boolean input, got {}",
            type_name(arr.data_type())
        ))
    })
}

fn eval_binary(op: BinaryOp, l: &ArrayRef, r: &ArrayRef) -> Result<ArrayRef> {
    let kernel_err = |e: ArrowError| MqeError::Execution(format!("{op} kernel failed: {e}"));
    match op {
        BinaryOp::Plus => add(l, r).map_err(kernel_err),
        BinaryOp::Minus => sub(l, r).map_err(kernel_err),
        BinaryOp::Multiply => mul(l, r).map_err(kernel_err),
        BinaryOp::Divide => div(l, r).map_err(kernel_err),
        BinaryOp::Modulo => rem(l, r).map_err(kernel_err),

        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq => {
            let res = match op {
                BinaryOp::Eq => eq(l, r),
                BinaryOp::NotEq => neq(l, r),
                BinaryOp::Lt => lt(l, r),
                BinaryOp::LtEq => lt_eq(l, r),
                BinaryOp::Gt => gt(l, r),
                _ => gt_eq(l, r),
            }
            .map_err(kernel_err)?;
            Ok(Arc::new(res))
        }

        // Non-Kleene: a null on either side yields null.
        BinaryOp::And | BinaryOp::Or => {
            let lb = as_boolean(l, "AND/OR")?;
            let rb = as_boolean(r, "AND/OR")?;
            let res = match op {
                BinaryOp::And => and(lb, rb),
                _ => or(lb, rb),
            }
            .map_err(kernel_err)?;
            Ok(Arc::new(res))
        }
    }
}
