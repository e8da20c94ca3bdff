//! MySQL identifier and string literal quoting.
//!
//! [`FieldIdent`] represents a (possibly table-qualified) field name. Every
//! dot-separated segment is wrapped in backticks so reserved words such as
//! `ORDER` or `VALUE` are safe to use as column names.
//!
//! Field names come from migration authors, not from end users: quoting is a
//! pure string transformation and performs no validation. Values always go
//! through bound parameters instead.
//!
//! # Example
//! ```ignore
//! use migsql::FieldIdent;
//!
//! assert_eq!(FieldIdent::parse("b_option.VALUE").to_sql(), "`b_option`.`VALUE`");
//! assert_eq!(FieldIdent::parse("`b_option`.`VALUE`").to_sql(), "`b_option`.`VALUE`");
//! ```

/// A field or table name split into dot-separated segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIdent {
    pub parts: Vec<String>,
}

impl FieldIdent {
    /// Split on `.` and strip existing backtick quoting from each segment.
    pub fn parse(s: &str) -> Self {
        Self {
            parts: s
                .split('.')
                .map(|part| part.trim_matches('`').to_string())
                .collect(),
        }
    }

    /// Render as SQL with every segment backtick-quoted.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum::<usize>();
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push('`');
            out.push_str(part);
            out.push('`');
        }
    }
}

/// Quote a field name, e.g. `table.column` becomes `` `table`.`column` ``.
pub fn quote_field(field: &str) -> String {
    FieldIdent::parse(field).to_sql()
}

/// Render a single-quoted MySQL string literal.
///
/// Backslashes and single quotes are escaped with a backslash.
pub fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\\' || ch == '\'' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}
