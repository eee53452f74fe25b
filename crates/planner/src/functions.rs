//! Builtin scalar functions: names and return-type rules.
//!
//! Kernels live in the execution crate; the planner only needs to know
//! whether a call is well-typed and what it returns.

use std::fmt;

use arrow_schema::DataType;
use mqe_common::{type_name, MqeError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinScalarFunction {
    /// `upper(string) -> string`
    Upper,
    /// `lower(string) -> string`
    Lower,
    /// `length(string) -> int64`, counted in characters.
    Length,
    /// `abs(signed numeric) -> same type`
    Abs,
    /// `concat(string, ...) -> string`
    Concat,
}

impl BuiltinScalarFunction {
    pub const ALL: [BuiltinScalarFunction; 5] = [
        BuiltinScalarFunction::Upper,
        BuiltinScalarFunction::Lower,
        BuiltinScalarFunction::Length,
        BuiltinScalarFunction::Abs,
        BuiltinScalarFunction::Concat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinScalarFunction::Upper => "upper",
            BuiltinScalarFunction::Lower => "lower",
            BuiltinScalarFunction::Length => "length",
            BuiltinScalarFunction::Abs => "abs",
            BuiltinScalarFunction::Concat => "concat",
        }
    }

    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MqeError::Unsupported(format!("unknown scalar function: {name}")))
    }

    /// Validate argument types and infer the output type.
    pub fn return_type(&self, args: &[DataType]) -> Result<DataType> {
        let mismatch = |expected: &str| {
            let found = args.iter().map(type_name).collect::<Vec<_>>().join(", ");
            MqeError::type_mismatch(self.name(), expected, format!("({found})"))
        };
        match self {
            BuiltinScalarFunction::Upper | BuiltinScalarFunction::Lower => match args {
                [DataType::Utf8] => Ok(DataType::Utf8),
                _ => Err(mismatch("(string)")),
            },
            BuiltinScalarFunction::Length => match args {
                [DataType::Utf8] => Ok(DataType::Int64),
                _ => Err(mismatch("(string)")),
            },
            BuiltinScalarFunction::Abs => match args {
                [t @ (DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Float32
                | DataType::Float64)] => Ok(t.clone()),
                _ => Err(mismatch("(signed numeric)")),
            },
            BuiltinScalarFunction::Concat => {
                if !args.is_empty() && args.iter().all(|t| t == &DataType::Utf8) {
                    Ok(DataType::Utf8)
                } else {
                    Err(mismatch("(string, ...)"))
                }
            }
        }
    }
}

impl fmt::Display for BuiltinScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
