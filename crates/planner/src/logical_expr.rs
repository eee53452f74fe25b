use std::fmt;
use std::ops;

use arrow_schema::{DataType, Field, Schema};
use mqe_common::{type_name, MqeError, Result};
use serde::{Deserialize, Serialize};

use crate::functions::BuiltinScalarFunction;
use crate::type_coercion::{binary_types, require_boolean, require_castable};

/// Unbound expression: columns are referenced by name and resolved against
/// an input schema during planning.
///
/// Nodes are immutable; the builder helpers below always wrap their operands
/// in a new node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    /// Column by position in the input schema, rendered `#<index>`.
    ColumnIndex(usize),
    Literal(LiteralValue),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    Alias {
        expr: Box<Expr>,
        name: String,
    },
    Cast {
        expr: Box<Expr>,
        to_type: DataType,
    },
    ScalarFunction {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Boolean(bool),
}

impl LiteralValue {
    pub fn data_type(&self) -> DataType {
        match self {
            LiteralValue::Int64(_) => DataType::Int64,
            LiteralValue::Float64(_) => DataType::Float64,
            LiteralValue::Utf8(_) => DataType::Utf8,
            LiteralValue::Boolean(_) => DataType::Boolean,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int64(v) => write!(f, "{v}"),
            // Debug keeps the fractional part (`2.0`, not `2`).
            LiteralValue::Float64(v) => write!(f, "{v:?}"),
            LiteralValue::Utf8(v) => write!(f, "'{}'", v.replace('\'', "''")),
            LiteralValue::Boolean(true) => f.write_str("TRUE"),
            LiteralValue::Boolean(false) => f.write_str("FALSE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// First field named `name`, with its position.
pub fn lookup_column<'a>(schema: &'a Schema, name: &str) -> Result<(usize, &'a Field)> {
    schema
        .fields()
        .iter()
        .enumerate()
        .find(|(_, f)| f.name() == name)
        .map(|(i, f)| (i, f.as_ref()))
        .ok_or_else(|| {
            MqeError::unknown_column(name, schema.fields().iter().map(|f| f.name().as_str()))
        })
}

/// Field at `index`.
pub fn lookup_index(schema: &Schema, index: usize) -> Result<&Field> {
    schema
        .fields()
        .get(index)
        .map(|f| f.as_ref())
        .ok_or_else(|| {
            MqeError::unknown_column(
                format!("#{index}"),
                schema.fields().iter().map(|f| f.name().as_str()),
            )
        })
}

impl Expr {
    /// Output field of this expression over rows of `schema`.
    ///
    /// # Errors
    /// - [`MqeError::UnknownColumn`] when a referenced column is absent
    /// - [`MqeError::TypeMismatch`] when an operator rejects its operand types
    /// - [`MqeError::Unsupported`] for an unknown scalar function
    pub fn resolve(&self, schema: &Schema) -> Result<Field> {
        match self {
            Expr::Column(name) => lookup_column(schema, name).map(|(_, f)| f.clone()),
            Expr::ColumnIndex(index) => lookup_index(schema, *index).cloned(),
            Expr::Literal(v) => Ok(Field::new(v.to_string(), v.data_type(), false)),
            Expr::BinaryOp { left, op, right } => {
                let l = left.resolve(schema)?;
                let r = right.resolve(schema)?;
                let (_, out) = binary_types(*op, l.data_type(), r.data_type())?;
                Ok(Field::new(
                    self.to_string(),
                    out,
                    l.is_nullable() || r.is_nullable(),
                ))
            }
            Expr::Not(inner) => {
                let f = inner.resolve(schema)?;
                require_boolean("NOT", f.data_type())?;
                Ok(Field::new(self.to_string(), DataType::Boolean, f.is_nullable()))
            }
            Expr::Alias { expr, name } => Ok(expr.resolve(schema)?.with_name(name.clone())),
            Expr::Cast { expr, to_type } => {
                let f = expr.resolve(schema)?;
                require_castable(f.data_type(), to_type)?;
                Ok(Field::new(
                    format!("CAST({} AS {})", f.name(), type_name(to_type)),
                    to_type.clone(),
                    f.is_nullable(),
                ))
            }
            Expr::ScalarFunction { name, args } => {
                let func = BuiltinScalarFunction::from_name(name)?;
                let fields = args
                    .iter()
                    .map(|a| a.resolve(schema))
                    .collect::<Result<Vec<_>>>()?;
                let arg_types = fields
                    .iter()
                    .map(|f| f.data_type().clone())
                    .collect::<Vec<_>>();
                let out = func.return_type(&arg_types)?;
                Ok(Field::new(
                    self.to_string(),
                    out,
                    fields.iter().any(|f| f.is_nullable()),
                ))
            }
        }
    }

    fn binary(self, op: BinaryOp, other: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(other),
        }
    }

    /// `self = other`
    pub fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Eq, other)
    }

    /// `self != other`
    pub fn not_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::NotEq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Lt, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::LtEq, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Gt, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::GtEq, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOp::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Or, other)
    }

    /// Rename the output field.
    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    pub fn cast(self, to_type: DataType) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            to_type,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "#{name}"),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::BinaryOp { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::ColumnIndex(index) => write!(f, "#{index}"),
            Expr::Not(inner) => write!(f, "NOT({inner})"),
            Expr::Alias { expr, name } => write!(f, "{expr} AS {name}"),
            Expr::Cast { expr, to_type } => write!(f, "CAST({expr} AS {})", type_name(to_type)),
            Expr::ScalarFunction { name, args } => {
                let args = args.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{name}({})", args.join(", "))
            }
        }
    }
}

macro_rules! impl_arith_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                self.binary($op, rhs)
            }
        }
    };
}

impl_arith_op!(Add, add, BinaryOp::Plus);
impl_arith_op!(Sub, sub, BinaryOp::Minus);
impl_arith_op!(Mul, mul, BinaryOp::Multiply);
impl_arith_op!(Div, div, BinaryOp::Divide);
impl_arith_op!(Rem, rem, BinaryOp::Modulo);

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

/// Values that can become literal expressions.
pub trait Literal {
    fn lit(&self) -> Expr;
}

impl Literal for i64 {
    fn lit(&self) -> Expr {
        Expr::Literal(LiteralValue::Int64(*self))
    }
}

impl Literal for i32 {
    fn lit(&self) -> Expr {
        Expr::Literal(LiteralValue::Int64(i64::from(*self)))
    }
}

impl Literal for f64 {
    fn lit(&self) -> Expr {
        Expr::Literal(LiteralValue::Float64(*self))
    }
}

impl Literal for bool {
    fn lit(&self) -> Expr {
        Expr::Literal(LiteralValue::Boolean(*self))
    }
}

impl Literal for &str {
    fn lit(&self) -> Expr {
        Expr::Literal(LiteralValue::Utf8((*self).to_string()))
    }
}

impl Literal for String {
    fn lit(&self) -> Expr {
        Expr::Literal(LiteralValue::Utf8(self.clone()))
    }
}

/// Column reference by name.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Column reference by position.
pub fn col_index(index: usize) -> Expr {
    Expr::ColumnIndex(index)
}

/// Literal expression.
pub fn lit<T: Literal>(value: T) -> Expr {
    value.lit()
}

/// `CAST(expr AS to_type)`.
pub fn cast(expr: Expr, to_type: DataType) -> Expr {
    expr.cast(to_type)
}

/// Scalar function call by name.
pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::ScalarFunction {
        name: name.into(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::{DataType, Field, Schema};

    use super::*;

    fn people() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("first_name", DataType::Utf8, true),
            Field::new("state", DataType::Utf8, true),
            Field::new("score", DataType::Float64, true),
        ])
    }

    #[test]
    fn column_resolves_to_matching_field() {
        let f = col("first_name").resolve(&people()).expect("resolve");
        assert_eq!(f, Field::new("first_name", DataType::Utf8, true));
    }

    #[test]
    fn unknown_column_reports_name_and_schema() {
        let err = col("age").resolve(&people()).expect_err("unknown");
        match err {
            MqeError::UnknownColumn { name, available } => {
                assert_eq!(name, "age");
                assert_eq!(available, vec!["id", "first_name", "state", "score"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn literal_names_are_canonical_renderings() {
        let schema = people();
        assert_eq!(lit(2_i64).resolve(&schema).expect("int").name(), "2");
        assert_eq!(lit(2.0).resolve(&schema).expect("float").name(), "2.0");
        assert_eq!(lit("Niko").resolve(&schema).expect("str").name(), "'Niko'");
        let b = lit(true).resolve(&schema).expect("bool");
        assert_eq!(b.name(), "TRUE");
        assert!(!b.is_nullable());
    }

    #[test]
    fn arithmetic_names_and_promotes() {
        let schema = people();
        let f = (col("id") * lit(2)).resolve(&schema).expect("mul");
        assert_eq!(f.name(), "(#id * 2)");
        assert_eq!(f.data_type(), &DataType::Int64);
        assert!(!f.is_nullable());

        let g = (col("id") + col("score")).resolve(&schema).expect("add");
        assert_eq!(g.data_type(), &DataType::Float64);
        assert!(g.is_nullable());
    }

    #[test]
    fn string_arithmetic_is_a_type_mismatch() {
        let err = (col("id") + lit("x")).resolve(&people()).expect_err("mismatch");
        assert!(matches!(err, MqeError::TypeMismatch { ref context, .. } if context == "+"));
    }

    #[test]
    fn comparison_and_boolean_ops_yield_bool() {
        let schema = people();
        let pred = col("first_name")
            .eq(lit("Niko"))
            .and(col("id").gt_eq(lit(1)));
        let f = pred.resolve(&schema).expect("pred");
        assert_eq!(f.data_type(), &DataType::Boolean);
        assert_eq!(f.name(), "((#first_name = 'Niko') AND (#id >= 1))");

        let err = col("id").and(lit(true)).resolve(&schema).expect_err("and on int");
        assert!(matches!(err, MqeError::TypeMismatch { .. }));
    }

    #[test]
    fn not_requires_boolean_operand() {
        let schema = people();
        let f = (!col("id").lt(lit(3))).resolve(&schema).expect("not");
        assert_eq!(f.name(), "NOT((#id < 3))");
        assert_eq!((!col("flag")).to_string(), "NOT(#flag)");
        assert!((!col("state")).resolve(&schema).is_err());
    }

    #[test]
    fn alias_only_renames() {
        let f = (col("id") * lit(2))
            .alias("new_id")
            .resolve(&people())
            .expect("alias");
        assert_eq!(f, Field::new("new_id", DataType::Int64, false));
    }

    #[test]
    fn cast_uses_inner_field_name() {
        let f = col("id")
            .cast(DataType::Float64)
            .resolve(&people())
            .expect("cast");
        assert_eq!(f.name(), "CAST(id AS float64)");
        assert_eq!(f.data_type(), &DataType::Float64);
        assert_eq!(
            col("id").cast(DataType::Float64).to_string(),
            "CAST(#id AS float64)"
        );
    }

    #[test]
    fn scalar_functions_resolve_through_builtins() {
        let schema = people();
        let f = call("upper", vec![col("state")]).resolve(&schema).expect("upper");
        assert_eq!(f.name(), "upper(#state)");
        assert_eq!(f.data_type(), &DataType::Utf8);

        let err = call("nope", vec![]).resolve(&schema).expect_err("unknown fn");
        assert!(matches!(err, MqeError::Unsupported(_)));
    }

    #[test]
    fn builders_do_not_mutate_operands() {
        let id = col("id");
        let doubled = id.clone() * lit(2);
        assert_eq!(id, Expr::Column("id".to_string()));
        assert_eq!(doubled.to_string(), "(#id * 2)");
    }

    #[test]
    fn expressions_survive_json() {
        let e = cast(col("id") + lit(1), DataType::Float64).alias("f");
        let json = serde_json::to_string(&e).expect("serialize");
        let back: Expr = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, e);
        assert_eq!(back.to_string(), "CAST((#id + 1) AS float64) AS f");
    }

    #[test]
    fn string_literals_double_embedded_quotes() {
        assert_eq!(lit("O'Brien").to_string(), "'O''Brien'");
        let f = col("first_name")
            .eq(lit("it's"))
            .resolve(&people())
            .expect("eq");
        assert_eq!(f.name(), "(#first_name = 'it''s')");
    }

    #[test]
    fn column_index_resolves_by_position() {
        let schema = people();
        let f = col_index(2).resolve(&schema).expect("index");
        assert_eq!(f, Field::new("state", DataType::Utf8, true));
        assert_eq!((col_index(0) * lit(2)).to_string(), "(#0 * 2)");

        let err = col_index(9).resolve(&schema).expect_err("out of range");
        assert_eq!(
            err.to_string(),
            "unknown column '#9'; available columns: [id, first_name, state, score]"
        );
    }
}
