use std::fmt;

use arrow_schema::{DataType, Schema};
use mqe_common::{type_name, Result};

use crate::functions::BuiltinScalarFunction;
use crate::logical_expr::{lookup_column, lookup_index, BinaryOp, Expr, LiteralValue};
use crate::type_coercion::{binary_types, require_boolean, require_castable};

/// Expression with every column reference resolved to a position in the
/// input batch. Evaluation never looks anything up by name.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalExpr {
    Column {
        index: usize,
        data_type: DataType,
    },
    Literal(LiteralValue),
    /// Both sides are cast to `operand_type` before the kernel runs.
    BinaryOp {
        left: Box<PhysicalExpr>,
        op: BinaryOp,
        right: Box<PhysicalExpr>,
        operand_type: DataType,
        data_type: DataType,
    },
    Not(Box<PhysicalExpr>),
    /// Evaluates like `expr`; the name only matters for schemas and explain.
    Alias {
        expr: Box<PhysicalExpr>,
        name: String,
    },
    Cast {
        expr: Box<PhysicalExpr>,
        to_type: DataType,
    },
    ScalarFunction {
        /// Name as written in the query, kept for explain.
        name: String,
        func: BuiltinScalarFunction,
        args: Vec<PhysicalExpr>,
        return_type: DataType,
    },
}

impl PhysicalExpr {
    pub fn data_type(&self) -> DataType {
        match self {
            PhysicalExpr::Column { data_type, .. } => data_type.clone(),
            PhysicalExpr::Literal(v) => v.data_type(),
            PhysicalExpr::BinaryOp { data_type, .. } => data_type.clone(),
            PhysicalExpr::Not(_) => DataType::Boolean,
            PhysicalExpr::Alias { expr, .. } => expr.data_type(),
            PhysicalExpr::Cast { to_type, .. } => to_type.clone(),
            PhysicalExpr::ScalarFunction { return_type, .. } => return_type.clone(),
        }
    }
}

impl fmt::Display for PhysicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalExpr::Column { index, .. } => write!(f, "#{index}"),
            PhysicalExpr::Literal(v) => write!(f, "{v}"),
            PhysicalExpr::BinaryOp {
                left, op, right, ..
            } => write!(f, "({left} {op} {right})"),
            PhysicalExpr::Not(inner) => write!(f, "NOT({inner})"),
            PhysicalExpr::Alias { expr, name } => write!(f, "{expr} AS {name}"),
            PhysicalExpr::Cast { expr, to_type } => {
                write!(f, "CAST({expr} AS {})", type_name(to_type))
            }
            PhysicalExpr::ScalarFunction { name, args, .. } => {
                let args = args.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{name}({})", args.join(", "))
            }
        }
    }
}

/// Bind `expr` against `schema`, replacing names with positions.
///
/// Every type rule of [`Expr::resolve`] is checked again, so a successfully
/// bound expression is always evaluable. Duplicate field names bind to the
/// first match.
pub fn bind_expr(expr: &Expr, schema: &Schema) -> Result<PhysicalExpr> {
    match expr {
        Expr::Column(name) => {
            let (index, field) = lookup_column(schema, name)?;
            Ok(PhysicalExpr::Column {
                index,
                data_type: field.data_type().clone(),
            })
        }
        Expr::ColumnIndex(index) => Ok(PhysicalExpr::Column {
            index: *index,
            data_type: lookup_index(schema, *index)?.data_type().clone(),
        }),
        Expr::Literal(v) => Ok(PhysicalExpr::Literal(v.clone())),
        Expr::BinaryOp { left, op, right } => {
            let left = bind_expr(left, schema)?;
            let right = bind_expr(right, schema)?;
            let (operand_type, data_type) =
                binary_types(*op, &left.data_type(), &right.data_type())?;
            Ok(PhysicalExpr::BinaryOp {
                left: Box::new(left),
                op: *op,
                right: Box::new(right),
                operand_type,
                data_type,
            })
        }
        Expr::Not(inner) => {
            let inner = bind_expr(inner, schema)?;
            require_boolean("NOT", &inner.data_type())?;
            Ok(PhysicalExpr::Not(Box::new(inner)))
        }
        Expr::Alias { expr, name } => Ok(PhysicalExpr::Alias {
            expr: Box::new(bind_expr(expr, schema)?),
            name: name.clone(),
        }),
        Expr::Cast { expr, to_type } => {
            let inner = bind_expr(expr, schema)?;
            require_castable(&inner.data_type(), to_type)?;
            Ok(PhysicalExpr::Cast {
                expr: Box::new(inner),
                to_type: to_type.clone(),
            })
        }
        Expr::ScalarFunction { name, args } => {
            let func = BuiltinScalarFunction::from_name(name)?;
            let args = args
                .iter()
                .map(|a| bind_expr(a, schema))
                .collect::<Result<Vec<_>>>()?;
            let arg_types = args.iter().map(PhysicalExpr::data_type).collect::<Vec<_>>();
            let return_type = func.return_type(&arg_types)?;
            Ok(PhysicalExpr::ScalarFunction {
                name: name.clone(),
                func,
                args,
                return_type,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::{DataType, Field, Schema};
    use mqe_common::MqeError;

    use super::*;
    use crate::logical_expr::{call, col, col_index, lit};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("state", DataType::Utf8, true),
            Field::new("id", DataType::Float64, true),
        ])
    }

    #[test]
    fn columns_bind_to_first_matching_index() {
        let bound = bind_expr(&col("state"), &schema()).expect("bind");
        assert_eq!(
            bound,
            PhysicalExpr::Column {
                index: 2,
                data_type: DataType::Utf8
            }
        );
        let dup = bind_expr(&col("id"), &schema()).expect("bind dup");
        assert_eq!(
            dup,
            PhysicalExpr::Column {
                index: 0,
                data_type: DataType::Int64
            }
        );
    }

    #[test]
    fn absent_column_fails_binding() {
        let err = bind_expr(&(col("age") + lit(1)), &schema()).expect_err("unknown");
        assert!(matches!(err, MqeError::UnknownColumn { ref name, .. } if name == "age"));
    }

    #[test]
    fn binary_records_operand_and_result_types() {
        let bound = bind_expr(&(col("id") * lit(2.5)), &schema()).expect("bind");
        match bound {
            PhysicalExpr::BinaryOp {
                operand_type,
                data_type,
                ..
            } => {
                assert_eq!(operand_type, DataType::Float64);
                assert_eq!(data_type, DataType::Float64);
            }
            other => panic!("unexpected bound expr: {other:?}"),
        }

        let cmp = bind_expr(&col("id").lt(lit(3)), &schema()).expect("bind cmp");
        assert_eq!(cmp.data_type(), DataType::Boolean);
    }

    #[test]
    fn binding_rechecks_types() {
        let err = bind_expr(&(col("id") + lit("x")), &schema()).expect_err("mismatch");
        assert!(matches!(err, MqeError::TypeMismatch { .. }));
        assert!(bind_expr(&!col("id"), &schema()).is_err());
        assert!(bind_expr(&call("upper", vec![col("id")]), &schema()).is_err());
    }

    #[test]
    fn rendering_uses_positions() {
        let expr = (col("id") * lit(2)).alias("new_id");
        let bound = bind_expr(&expr, &schema()).expect("bind");
        assert_eq!(bound.to_string(), "(#0 * 2) AS new_id");
        assert_eq!(bound.data_type(), DataType::Int64);

        let f = bind_expr(&call("UPPER", vec![col("state")]), &schema()).expect("bind fn");
        assert_eq!(f.to_string(), "UPPER(#2)");

        let negated = bind_expr(&!col("id").lt(lit(3)), &schema()).expect("bind not");
        assert_eq!(negated.to_string(), "NOT((#0 < 3))");
    }

    #[test]
    fn positional_references_bind_to_their_index() {
        let bound = bind_expr(&col_index(3), &schema()).expect("bind index");
        assert_eq!(
            bound,
            PhysicalExpr::Column {
                index: 3,
                data_type: DataType::Float64
            }
        );
        let err = bind_expr(&col_index(4), &schema()).expect_err("out of range");
        assert!(matches!(err, MqeError::UnknownColumn { ref name, .. } if name == "#4"));
    }
}
