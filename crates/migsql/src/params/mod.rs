//! Named-parameter binder.
//!
//! [`Params`] accumulates `name -> value` bindings for one SQL statement and
//! hands back `:name` placeholder tokens to embed in the SQL text. A fresh
//! binder is created per statement (see [`generate`]); it is never shared
//! between statements, so auto-generated names (`p0`, `p1`, ...) cannot
//! collide across fragments.
//!
//! # Example
//!
//! ```ignore
//! use migsql::{fields, generate};
//!
//! let unit = generate(|p| {
//!     Ok(format!(
//!         "UPDATE b_user SET {} WHERE ID IN ({})",
//!         p.upsert(fields! { "ACTIVE" => "N" })?,
//!         p.bind(vec![1, 2, 3])?,
//!     ))
//! })?;
//!
//! assert_eq!(unit.sql, "UPDATE b_user SET `ACTIVE` = :p0 WHERE ID IN (:p1)");
//! ```

pub(crate) mod fields;
mod unit;


pub use fields::Fields;
pub use unit::{GeneratedSql, guess_types};

use crate::error::{MigError, MigResult};
use crate::value::{ArrayParamType, BindValue, ParamValue};
use std::collections::BTreeMap;

/// Parameters bound while building one SQL statement.
#[derive(Debug, Default)]
pub struct Params {
    list: Vec<(String, ParamValue)>,
    types: BTreeMap<String, ArrayParamType>,
    idx: usize,
}

impl Params {
    /// Create an empty binder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under the next auto-generated name and return its placeholder.
    ///
    /// Deferred values are rendered immediately and their raw SQL is returned
    /// instead of a placeholder.
    pub fn bind(&mut self, value: impl Into<BindValue>) -> MigResult<String> {
        self.bind_as(value.into(), None)
    }

    /// Bind a value under an explicit name and return its placeholder.
    pub fn bind_named(&mut self, name: &str, value: impl Into<BindValue>) -> MigResult<String> {
        self.bind_as(value.into(), Some(name))
    }

    pub(crate) fn bind_as(&mut self, value: BindValue, name: Option<&str>) -> MigResult<String> {
        let value = match value {
            BindValue::Deferred(fragment) => return fragment(self),
            BindValue::Scalar(v) => ParamValue::Scalar(v),
            BindValue::Array(v) => ParamValue::Array(v),
        };

        let name = match name {
            Some(name) => name.to_string(),
            None => format!("p{}", self.idx),
        };
        if self.contains(&name) {
            return Err(MigError::DuplicateParameterName(name));
        }

        // Explicit names advance the counter too.
        self.idx += 1;

        if let ParamValue::Array(values) = &value {
            let Some(ty) = ArrayParamType::infer(values) else {
                return Err(MigError::EmptyArrayParameter(name));
            };
            self.types.insert(name.clone(), ty);
        }

        let placeholder = format!(":{name}");
        self.list.push((name, value));
        Ok(placeholder)
    }

    /// Render `generator` only when `condition` holds, otherwise return `""`.
    ///
    /// Used to compose optional clauses such as `WHERE` without branching the
    /// surrounding SQL template.
    pub fn emit_if<F>(&mut self, condition: bool, generator: F) -> MigResult<String>
    where
        F: FnOnce(&mut Params) -> MigResult<String>,
    {
        if condition {
            generator(self)
        } else {
            Ok(String::new())
        }
    }

    /// Look up a bound value by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.list
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Whether `name` is already bound.
    pub fn contains(&self, name: &str) -> bool {
        self.list.iter().any(|(n, _)| n == name)
    }

    /// Bound parameters in bind order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.list.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Element type hints for array parameters.
    pub fn types(&self) -> &BTreeMap<String, ArrayParamType> {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Consume the binder into its parameter list and type hints.
    pub fn into_parts(self) -> (Vec<(String, ParamValue)>, BTreeMap<String, ArrayParamType>) {
        (self.list, self.types)
    }
}

/// Run `generator` against a fresh binder and pack the SQL with its bindings.
pub fn generate<F>(generator: F) -> MigResult<GeneratedSql>
where
    F: FnOnce(&mut Params) -> MigResult<String>,
{
    let mut params = Params::new();
    let sql = generator(&mut params)?;
    let (params, types) = params.into_parts();
    Ok(GeneratedSql { sql, params, types })
}
