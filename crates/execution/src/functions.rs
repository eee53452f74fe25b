//! Kernels for the builtin scalar functions.
//!
//! Argument types have already been checked by the planner; a downcast
//! failure here means the bound plan and the batch disagree.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Int64Array, PrimitiveArray, StringArray};
use arrow::compute::kernels::concat_elements::concat_elements_utf8;
use arrow::datatypes::{
    ArrowPrimitiveType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
};
use arrow_schema::DataType;
use mqe_common::{type_name, MqeError, Result};
use mqe_planner::BuiltinScalarFunction;

/// Apply `func` to already evaluated argument columns of equal length.
pub fn invoke(func: BuiltinScalarFunction, args: &[ArrayRef]) -> Result<ArrayRef> {
    match func {
        BuiltinScalarFunction::Upper => {
            let s = string_arg(func, args, 0)?;
            Ok(Arc::new(
                s.iter()
                    .map(|v| v.map(str::to_uppercase))
                    .collect::<StringArray>(),
            ))
        }
        BuiltinScalarFunction::Lower => {
            let s = string_arg(func, args, 0)?;
            Ok(Arc::new(
                s.iter()
                    .map(|v| v.map(str::to_lowercase))
                    .collect::<StringArray>(),
            ))
        }
        BuiltinScalarFunction::Length => {
            let s = string_arg(func, args, 0)?;
            Ok(Arc::new(
                s.iter()
                    .map(|v| v.map(|x| x.chars().count() as i64))
                    .collect::<Int64Array>(),
            ))
        }
        BuiltinScalarFunction::Abs => {
            let arr = args
                .first()
                .ok_or_else(|| MqeError::Execution("abs expects one argument".to_string()))?;
            abs(arr)
        }
        BuiltinScalarFunction::Concat => {
            let mut acc = string_arg(func, args, 0)?.clone();
            for i in 1..args.len() {
                acc = concat_elements_utf8(&acc, string_arg(func, args, i)?)
                    .map_err(|e| MqeError::Execution(format!("concat failed: {e}")))?;
            }
            Ok(Arc::new(acc))
        }
    }
}

fn string_arg(func: BuiltinScalarFunction, args: &[ArrayRef], i: usize) -> Result<&StringArray> {
    let arr = args
        .get(i)
        .ok_or_else(|| MqeError::Execution(format!("{func} is missing argument {i}")))?;
    arr.as_string_opt::<i32>().ok_or_else(|| {
        MqeError::Execution(format!(
            "{func} expects string arguments, got {}",
            type_name(arr.data_type())
        ))
    })
}

fn abs(arr: &ArrayRef) -> Result<ArrayRef> {
    match arr.data_type() {
        DataType::Int8 => abs_primitive::<Int8Type>(arr, i8::checked_abs),
        DataType::Int16 => abs_primitive::<Int16Type>(arr, i16::checked_abs),
        DataType::Int32 => abs_primitive::<Int32Type>(arr, i32::checked_abs),
        DataType::Int64 => abs_primitive::<Int64Type>(arr, i64::checked_abs),
        DataType::Float32 => abs_primitive::<Float32Type>(arr, |v| Some(v.abs())),
        DataType::Float64 => abs_primitive::<Float64Type>(arr, |v| Some(v.abs())),
        other => Err(MqeError::Execution(format!(
            "abs not supported for {}",
            type_name(other)
        ))),
    }
}

/// `f` returns `None` on overflow (`abs(i64::MIN)`); nulls are skipped.
fn abs_primitive<T>(arr: &ArrayRef, f: fn(T::Native) -> Option<T::Native>) -> Result<ArrayRef>
where
    T: ArrowPrimitiveType,
{
    let values = arr
        .as_primitive_opt::<T>()
        .ok_or_else(|| MqeError::Execution("abs argument has unexpected layout".to_string()))?;
    let out: PrimitiveArray<T> = values.try_unary(|v| {
        f(v).ok_or_else(|| MqeError::Execution(format!("abs overflowed for value {v:?}")))
    })?;
    Ok(Arc::new(out))
}
