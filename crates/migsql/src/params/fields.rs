use super::Params;
use crate::error::{MigError, MigResult};
use crate::ident::FieldIdent;
use crate::value::BindValue;

/// An ordered `field -> value` list for `SET` and predicate clauses.
///
/// Setting a field that is already present replaces its value and keeps its
/// original position.
///
/// # Example
/// ```ignore
/// use migsql::{BindValue, Fields};
///
/// let fields = Fields::new()
///     .set("NAME", "Catalog")
///     .set("SORT", 500)
///     .set("IBLOCK_ID", BindValue::raw("SELECT ID FROM b_iblock WHERE CODE = 'catalog'"));
/// ```
#[derive(Debug, Default)]
pub struct Fields {
    entries: Vec<(String, BindValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field (consuming version of [`Fields::push`]).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<BindValue>) -> Self {
        self.push(field, value);
        self
    }

    /// Set a field to raw SQL that is embedded without a parameter.
    pub fn set_raw(self, field: impl Into<String>, sql: impl Into<String>) -> Self {
        self.set(field, BindValue::raw(sql))
    }

    /// Set a field.
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<BindValue>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<BindValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.push(k, v);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, BindValue);
    type IntoIter = std::vec::IntoIter<(String, BindValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build a [`Fields`] list.
///
/// ```ignore
/// let fields = migsql::fields! { "NAME" => "Alice", "AGE" => 30 };
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(fields.push($field, $value);)+
        fields
    }};
}

impl Params {
    /// Render `` `a` = :p0,`b` = :p1 `` for `SET` clauses.
    pub fn upsert(&mut self, fields: Fields) -> MigResult<String> {
        self.join_fields(fields, "=", ",")
    }

    /// Render `` `a` = :p0 AND `b` = :p1 ``.
    ///
    /// Fails with [`MigError::EmptyFieldSet`] when `fields` is empty.
    pub fn all_equal(&mut self, fields: Fields) -> MigResult<String> {
        if fields.is_empty() {
            return Err(MigError::EmptyFieldSet("all_equal"));
        }
        self.join_fields(fields, "=", " AND ")
    }

    /// Render `` `a` LIKE :p0 AND `b` LIKE :p1 ``.
    ///
    /// Fails with [`MigError::EmptyFieldSet`] when `fields` is empty.
    pub fn all_like(&mut self, fields: Fields) -> MigResult<String> {
        if fields.is_empty() {
            return Err(MigError::EmptyFieldSet("all_like"));
        }
        self.join_fields(fields, "LIKE", " AND ")
    }

    fn join_fields(&mut self, fields: Fields, operator: &str, separator: &str) -> MigResult<String> {
        let mut out = String::new();
        for (i, (field, value)) in fields.into_iter().enumerate() {
            let mut rendered = self.bind_as(value, None)?;

            // A bare subquery used as a value must be parenthesized.
            if starts_with_select(&rendered) {
                rendered = format!("({rendered})");
            }

            if i > 0 {
                out.push_str(separator);
            }
            FieldIdent::parse(&field).write_sql(&mut out);
            out.push(' ');
            out.push_str(operator);
            out.push(' ');
            out.push_str(&rendered);
        }
        Ok(out)
    }
}

/// Whether `sql` starts with the `SELECT` keyword as a whole word.
pub(crate) fn starts_with_select(sql: &str) -> bool {
    let s = sql.trim_start();
    let Some(prefix) = s.get(0..6) else {
        return false;
    };
    prefix.eq_ignore_ascii_case("SELECT")
        && s[6..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c == '(')
}
