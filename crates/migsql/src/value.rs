//! Values that can be bound into a SQL fragment.
//!
//! - [`Scalar`]: a single value (`NULL`, bool, integer, float, string, datetime)
//! - [`ParamValue`]: what a binder stores (a scalar or an array of scalars)
//! - [`BindValue`]: what callers hand to a binder, which may also be a deferred
//!   [`Fragment`] that renders raw SQL instead of being parameterized

use crate::error::MigResult;
use crate::params::Params;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// A deferred sub-generator: renders raw SQL against the active binder.
pub type Fragment = Box<dyn FnOnce(&mut Params) -> MigResult<String>>;

/// A single bound value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    #[serde(serialize_with = "serialize_datetime")]
    DateTime(NaiveDateTime),
}

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn serialize_datetime<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&dt.format(DATETIME_FORMAT))
}

impl Scalar {
    /// Whether this is an integer, the only check the array-type heuristic makes.
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(&crate::ident::quote_literal(s)),
            Self::DateTime(dt) => write!(f, "'{}'", dt.format(DATETIME_FORMAT)),
        }
    }
}

/// Element type hint for array parameters, handed to the executor so it can
/// expand `:name` into a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArrayParamType {
    #[serde(rename = "INTEGER_ARRAY")]
    Integer,
    #[serde(rename = "STRING_ARRAY")]
    String,
}

impl ArrayParamType {
    /// Infer the element type from the first element only.
    ///
    /// `[1, "b"]` is `Integer`: mixed arrays are not validated. Returns `None`
    /// for an empty slice.
    pub fn infer(values: &[Scalar]) -> Option<Self> {
        values.first().map(|first| {
            if first.is_int() {
                Self::Integer
            } else {
                Self::String
            }
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER_ARRAY",
            Self::String => "STRING_ARRAY",
        }
    }
}

/// A value stored in a binder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(v) => Some(v),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => v.fmt(f),
            Self::Array(values) => {
                f.write_str("(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    v.fmt(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A value handed to a binder or a field list.
pub enum BindValue {
    Scalar(Scalar),
    Array(Vec<Scalar>),
    Deferred(Fragment),
}

impl BindValue {
    /// A deferred value computed from the active binder.
    ///
    /// ```ignore
    /// let sub = BindValue::deferred(|p| {
    ///     Ok(format!("SELECT ID FROM b_iblock WHERE CODE = {}", p.bind("catalog")?))
    /// });
    /// ```
    pub fn deferred<F>(f: F) -> Self
    where
        F: FnOnce(&mut Params) -> MigResult<String> + 'static,
    {
        Self::Deferred(Box::new(f))
    }

    /// Raw SQL embedded as-is, without a parameter.
    pub fn raw(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self::deferred(move |_| Ok(sql))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl fmt::Debug for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
            Self::Deferred(_) => f.debug_tuple("Deferred").field(&"<fragment>").finish(),
        }
    }
}

impl From<ParamValue> for BindValue {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Scalar(v) => Self::Scalar(v),
            ParamValue::Array(v) => Self::Array(v),
        }
    }
}

impl From<Scalar> for ParamValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Scalar> for BindValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }

            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }

            impl From<$ty> for BindValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_scalar_from! {
    bool => |v| Scalar::Bool(v),
    i8 => |v| Scalar::Int(v.into()),
    i16 => |v| Scalar::Int(v.into()),
    i32 => |v| Scalar::Int(v.into()),
    i64 => |v| Scalar::Int(v),
    u8 => |v| Scalar::Int(v.into()),
    u16 => |v| Scalar::Int(v.into()),
    u32 => |v| Scalar::Int(v.into()),
    f32 => |v| Scalar::Float(v.into()),
    f64 => |v| Scalar::Float(v),
    &str => |v| Scalar::Str(v.to_string()),
    String => |v| Scalar::Str(v),
    &String => |v| Scalar::Str(v.clone()),
    NaiveDateTime => |v| Scalar::DateTime(v),
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        Self::Scalar(Scalar::from(value))
    }
}

impl<T: Into<Scalar>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        Self::Scalar(Scalar::from(value))
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for BindValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for ParamValue {
    fn from(values: [T; N]) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for BindValue {
    fn from(values: [T; N]) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar> + Clone> From<&[T]> for BindValue {
    fn from(values: &[T]) -> Self {
        Self::Array(values.iter().cloned().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_integer_from_first_element() {
        let values = vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)];
        assert_eq!(ArrayParamType::infer(&values), Some(ArrayParamType::Integer));
    }

    #[test]
    fn infer_string_from_first_element() {
        let values = vec![Scalar::from("a"), Scalar::from("b")];
        assert_eq!(ArrayParamType::infer(&values), Some(ArrayParamType::String));
    }

    #[test]
    fn infer_only_looks_at_first_element() {
        let values = vec![Scalar::Int(1), Scalar::from("b")];
        assert_eq!(ArrayParamType::infer(&values), Some(ArrayParamType::Integer));

        let values = vec![Scalar::from("a"), Scalar::Int(2)];
        assert_eq!(ArrayParamType::infer(&values), Some(ArrayParamType::String));
    }

    #[test]
    fn infer_empty_is_none() {
        assert_eq!(ArrayParamType::infer(&[]), None);
    }

    #[test]
    fn option_none_is_null() {
        assert_eq!(Scalar::from(None::<i32>), Scalar::Null);
        assert_eq!(Scalar::from(Some("x")), Scalar::Str("x".into()));
    }

    #[test]
    fn display_quotes_strings() {
        assert_eq!(Scalar::from("it's").to_string(), r"'it\'s'");
        assert_eq!(Scalar::Int(7).to_string(), "7");
        assert_eq!(Scalar::Null.to_string(), "NULL");
        let arr = ParamValue::from(vec![1, 2]);
        assert_eq!(arr.to_string(), "(1, 2)");
    }

    #[test]
    fn serializes_untagged() {
        let v = serde_json::to_value(ParamValue::from(vec!["a", "b"])).unwrap();
        assert_eq!(v, serde_json::json!(["a", "b"]));
        let v = serde_json::to_value(Scalar::Null).unwrap();
        assert_eq!(v, serde_json::Value::Null);
        let v = serde_json::to_value(ArrayParamType::Integer).unwrap();
        assert_eq!(v, serde_json::json!("INTEGER_ARRAY"));
    }

    #[test]
    fn deferred_debug_hides_closure() {
        let v = BindValue::raw("NOW()");
        assert!(v.is_deferred());
        assert_eq!(format!("{v:?}"), r#"Deferred("<fragment>")"#);
    }
}
