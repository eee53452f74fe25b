//! Operand type rules shared by `Expr::resolve` and physical binding.

use arrow_schema::DataType;
use mqe_common::{type_name, MqeError, Result};

use crate::logical_expr::BinaryOp;

pub fn is_numeric(dt: &DataType) -> bool {
    dt.is_integer() || dt.is_floating()
}

pub fn is_string(dt: &DataType) -> bool {
    matches!(dt, DataType::Utf8 | DataType::LargeUtf8)
}

/// Exact type holding every `UInt64` and every `Int64` value.
const SIGNED_UNSIGNED_64: DataType = DataType::Decimal128(20, 0);

/// Common type both numeric operands are cast to before a comparison.
///
/// Identical types are kept. Any floating side promotes to `Float64`,
/// unsigned pairs widen to `UInt64`, `UInt64` against a signed type meets
/// in `Decimal128(20, 0)` and every other integer mix widens to `Int64`.
pub fn numeric_common_type(l: &DataType, r: &DataType) -> DataType {
    if l == r {
        l.clone()
    } else if l.is_floating() || r.is_floating() {
        DataType::Float64
    } else if l.is_unsigned_integer() && r.is_unsigned_integer() {
        DataType::UInt64
    } else if l == &DataType::UInt64 || r == &DataType::UInt64 {
        SIGNED_UNSIGNED_64
    } else {
        DataType::Int64
    }
}

/// Operand and result type of arithmetic. Mixed `UInt64`/signed arithmetic
/// runs in `Float64`, since decimal kernels change precision.
fn arithmetic_type(l: &DataType, r: &DataType) -> DataType {
    match numeric_common_type(l, r) {
        DataType::Decimal128(..) => DataType::Float64,
        t => t,
    }
}

/// Returns `(operand_type, result_type)` for `l <op> r`.
pub fn binary_types(op: BinaryOp, l: &DataType, r: &DataType) -> Result<(DataType, DataType)> {
    let found = || format!("{} {op} {}", type_name(l), type_name(r));

    if op.is_arithmetic() {
        if !(is_numeric(l) && is_numeric(r)) {
            return Err(MqeError::type_mismatch(
                op.to_string(),
                "numeric operands",
                found(),
            ));
        }
        let t = arithmetic_type(l, r);
        return Ok((t.clone(), t));
    }

    if op.is_logical() {
        if l != &DataType::Boolean || r != &DataType::Boolean {
            return Err(MqeError::type_mismatch(
                op.to_string(),
                "bool operands",
                found(),
            ));
        }
        return Ok((DataType::Boolean, DataType::Boolean));
    }

    let operand = if is_numeric(l) && is_numeric(r) {
        numeric_common_type(l, r)
    } else if is_string(l) && is_string(r) {
        if l == r {
            l.clone()
        } else {
            DataType::LargeUtf8
        }
    } else if l == &DataType::Boolean
        && r == &DataType::Boolean
        && matches!(op, BinaryOp::Eq | BinaryOp::NotEq)
    {
        DataType::Boolean
    } else {
        return Err(MqeError::type_mismatch(
            op.to_string(),
            "comparable operands (numeric, string, or bool equality)",
            found(),
        ));
    };
    Ok((operand, DataType::Boolean))
}

/// Fails unless `dt` is boolean.
pub fn require_boolean(context: &str, dt: &DataType) -> Result<()> {
    if dt == &DataType::Boolean {
        Ok(())
    } else {
        Err(MqeError::type_mismatch(context, "bool", type_name(dt)))
    }
}

/// Fails unless Arrow can cast `from` into `to`.
pub fn require_castable(from: &DataType, to: &DataType) -> Result<()> {
    if arrow::compute::can_cast_types(from, to) {
        Ok(())
    } else {
        Err(MqeError::type_mismatch(
            "CAST",
            format!("a type castable to {}", type_name(to)),
            type_name(from),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_stays_integer() {
        let (operand, out) =
            binary_types(BinaryOp::Multiply, &DataType::Int64, &DataType::Int64).expect("types");
        assert_eq!(operand, DataType::Int64);
        assert_eq!(out, DataType::Int64);

        let (_, widened) =
            binary_types(BinaryOp::Plus, &DataType::Int32, &DataType::Int64).expect("types");
        assert_eq!(widened, DataType::Int64);
    }

    #[test]
    fn floating_side_promotes_to_float64() {
        let (_, out) =
            binary_types(BinaryOp::Divide, &DataType::Int64, &DataType::Float32).expect("types");
        assert_eq!(out, DataType::Float64);
    }

    #[test]
    fn arithmetic_on_strings_is_rejected() {
        let err = binary_types(BinaryOp::Plus, &DataType::Int64, &DataType::Utf8)
            .expect_err("mismatch");
        assert_eq!(
            err.to_string(),
            "type mismatch in +: expected numeric operands, found int64 + string"
        );
    }

    #[test]
    fn comparisons_produce_bool() {
        let (operand, out) =
            binary_types(BinaryOp::Eq, &DataType::Utf8, &DataType::Utf8).expect("types");
        assert_eq!(operand, DataType::Utf8);
        assert_eq!(out, DataType::Boolean);
        assert!(binary_types(BinaryOp::Lt, &DataType::Utf8, &DataType::Int64).is_err());
        assert!(binary_types(BinaryOp::Lt, &DataType::Boolean, &DataType::Boolean).is_err());
        assert!(binary_types(BinaryOp::Eq, &DataType::Boolean, &DataType::Boolean).is_ok());
    }

    #[test]
    fn logical_ops_need_bool_operands() {
        assert!(binary_types(BinaryOp::And, &DataType::Boolean, &DataType::Boolean).is_ok());
        let err = binary_types(BinaryOp::Or, &DataType::Boolean, &DataType::Int64)
            .expect_err("mismatch");
        assert!(matches!(err, MqeError::TypeMismatch { .. }));
    }

    #[test]
    fn casts_follow_arrow_support() {
        assert!(require_castable(&DataType::Utf8, &DataType::Int64).is_ok());
        assert!(require_castable(&DataType::Int64, &DataType::Float64).is_ok());
        assert!(require_castable(&DataType::Boolean, &DataType::Date32).is_err());
    }

    #[test]
    fn unsigned_operands_keep_their_range() {
        let (operand, _) =
            binary_types(BinaryOp::Gt, &DataType::UInt8, &DataType::UInt64).expect("types");
        assert_eq!(operand, DataType::UInt64);

        let (operand, out) =
            binary_types(BinaryOp::Gt, &DataType::UInt64, &DataType::Int64).expect("types");
        assert_eq!(operand, DataType::Decimal128(20, 0));
        assert_eq!(out, DataType::Boolean);

        let (operand, out) =
            binary_types(BinaryOp::Plus, &DataType::UInt64, &DataType::Int64).expect("types");
        assert_eq!(operand, DataType::Float64);
        assert_eq!(out, DataType::Float64);

        let (_, small) =
            binary_types(BinaryOp::Plus, &DataType::UInt32, &DataType::Int8).expect("types");
        assert_eq!(small, DataType::Int64);
    }
}
