use thiserror::Error;

/// Canonical MQE error taxonomy used across crates.
///
/// Classification guidance:
/// - [`MqeError::UnknownColumn`] / [`MqeError::TypeMismatch`]: name and type issues
///   discovered while resolving or binding expressions, always before execution
/// - [`MqeError::SchemaMismatch`]: a batch or plan shape disagrees with the schema it
///   is supposed to carry (internal-consistency fault)
/// - [`MqeError::Execution`]: runtime kernel failures after planning succeeded
/// - [`MqeError::InvalidConfig`]: bad façade input or catalog state
/// - [`MqeError::Unsupported`]: valid request for behavior that is not implemented
#[derive(Debug, Error)]
pub enum MqeError {
    /// A column name referenced by an expression or a scan projection is absent
    /// from the schema it was resolved against.
    #[error("unknown column '{name}'; available columns: [{}]", available.join(", "))]
    UnknownColumn {
        /// The name that failed to resolve.
        name: String,
        /// Field names of the schema, in order.
        available: Vec<String>,
    },

    /// An operator was applied to incompatible operand types, or a predicate
    /// does not resolve to boolean.
    ///
    /// Examples:
    /// - `#id + 'x'` (`context = "+"`, `expected = "numeric operands"`)
    /// - `Filter: #id` (`context = "filter predicate"`, `expected = "bool"`)
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Operator or plan position that rejected the types.
        context: String,
        /// Human-readable description of what was required.
        expected: String,
        /// Human-readable description of what was supplied.
        found: String,
    },

    /// Physical plan or batch shape disagrees with the logical plan or the
    /// data source schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Runtime operator evaluation failures after planning succeeded.
    ///
    /// Examples:
    /// - integer division by zero
    /// - string that cannot be cast to the requested numeric type
    #[error("execution error: {0}")]
    Execution(String),

    /// Invalid input handed to the façade or catalog.
    ///
    /// Examples:
    /// - columns of different lengths passed to `from_columns`
    /// - unknown table name
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Valid request for a feature/shape not implemented in current version.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl MqeError {
    /// Shorthand for building a [`MqeError::TypeMismatch`].
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Shorthand for building a [`MqeError::UnknownColumn`] from the schema's field names.
    pub fn unknown_column<'a>(
        name: impl Into<String>,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::UnknownColumn {
            name: name.into(),
            available: available.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Standard MQE result alias.
pub type Result<T> = std::result::Result<T, MqeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_column_lists_available_names() {
        let err = MqeError::unknown_column("age", ["id", "first_name"]);
        assert_eq!(
            err.to_string(),
            "unknown column 'age'; available columns: [id, first_name]"
        );
    }

    #[test]
    fn type_mismatch_message_names_operator_and_types() {
        let err = MqeError::type_mismatch("+", "numeric operands", "int64 + string");
        assert_eq!(
            err.to_string(),
            "type mismatch in +: expected numeric operands, found int64 + string"
        );
    }
}
