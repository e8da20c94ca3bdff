//! DDL against an object whose name is computed at execution time.
//!
//! Identifiers cannot be bound as parameters, so a statement like
//! `CREATE TABLE b_iblock_<id>_prop` where `<id>` comes from a lookup is built
//! server-side: the lookup result is stored in a user variable, the statement
//! text is assembled with `CONCAT`, then run through
//! `PREPARE` / `EXECUTE` / `DEALLOCATE PREPARE`.
//!
//! # Example
//! ```ignore
//! use migsql::DynamicNameDdl;
//!
//! let sql = DynamicNameDdl::new(
//!     "CREATE TABLE",
//!     "b_iblock_?_prop",
//!     "SELECT ID FROM b_iblock WHERE CODE = 'catalog'",
//! )
//! .definition("(id INT)")
//! .to_sql()?;
//! ```
//!
//! The substitution query must return exactly one row with one column. That
//! is not checked here: with no rows the variable keeps its default (`0`).

use crate::error::{MigError, MigResult};
use crate::ident::quote_literal;
use crate::params::fields::starts_with_select;
use serde::Deserialize;

/// Marker replaced by the computed name fragment.
pub const NAME_MARKER: char = '?';

/// Separator between the generated statements.
pub const STATEMENT_SEPARATOR: &str = ";\n";

/// A piece of a split name template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePart {
    Literal(String),
    Marker,
}

/// Split a name template on `?`, keeping markers and dropping empty pieces.
///
/// Fails with [`MigError::StaticNameTemplate`] unless the split yields more
/// than one piece.
pub fn split_name_template(template: &str) -> MigResult<Vec<NamePart>> {
    let mut parts = Vec::new();
    for (i, literal) in template.split(NAME_MARKER).enumerate() {
        if i > 0 {
            parts.push(NamePart::Marker);
        }
        if !literal.is_empty() {
            parts.push(NamePart::Literal(literal.to_string()));
        }
    }

    if parts.len() <= 1 {
        return Err(MigError::StaticNameTemplate(template.to_string()));
    }
    Ok(parts)
}

/// Server-side names used by the generated script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DdlVariables {
    /// User variable holding the computed name fragment.
    pub substitution: String,
    /// User variable holding the full statement text.
    pub statement: String,
    /// Prepared statement name.
    pub prepared: String,
}

impl Default for DdlVariables {
    fn default() -> Self {
        Self {
            substitution: "@SUBSTITUTION".to_string(),
            statement: "@DDL_STATEMENT".to_string(),
            prepared: "dynamicDdl".to_string(),
        }
    }
}

impl DdlVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn substitution(mut self, name: impl Into<String>) -> Self {
        self.substitution = name.into();
        self
    }

    pub fn statement(mut self, name: impl Into<String>) -> Self {
        self.statement = name.into();
        self
    }

    pub fn prepared(mut self, name: impl Into<String>) -> Self {
        self.prepared = name.into();
        self
    }

    /// User variables must look like `@NAME`, the prepared statement like a
    /// plain identifier. They are spliced into SQL unquoted.
    pub fn validate(&self) -> MigResult<()> {
        for var in [&self.substitution, &self.statement] {
            let valid = var
                .strip_prefix('@')
                .is_some_and(|rest| !rest.is_empty() && rest.chars().all(is_word_char));
            if !valid {
                return Err(MigError::InvalidVariable(var.clone()));
            }
        }
        if self.substitution == self.statement {
            return Err(MigError::InvalidVariable(format!(
                "{} is used for both the substitution and the statement",
                self.statement
            )));
        }

        let mut chars = self.prepared.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
            && chars.all(is_word_char);
        if !valid {
            return Err(MigError::InvalidVariable(self.prepared.clone()));
        }
        Ok(())
    }
}

fn is_word_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Builder for a dynamically-named DDL script.
#[derive(Debug, Clone)]
#[must_use]
pub struct DynamicNameDdl {
    operation: String,
    name_template: String,
    substitution_query: String,
    definition: String,
    variables: DdlVariables,
}

impl DynamicNameDdl {
    /// `operation` is the DDL verb (`CREATE TABLE`, `ALTER TABLE`, ...),
    /// `name_template` contains `?` where the computed fragment goes.
    pub fn new(
        operation: impl Into<String>,
        name_template: impl Into<String>,
        substitution_query: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            name_template: name_template.into(),
            substitution_query: substitution_query.into(),
            definition: String::new(),
            variables: DdlVariables::default(),
        }
    }

    /// Text appended verbatim after the name, e.g. a column list.
    pub fn definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn variables(mut self, variables: DdlVariables) -> Self {
        self.variables = variables;
        self
    }

    /// The generated statements, in execution order.
    pub fn statements(&self) -> MigResult<Vec<String>> {
        let parts = split_name_template(&self.name_template)?;
        self.variables.validate()?;

        let DdlVariables {
            substitution,
            statement,
            prepared,
        } = &self.variables;

        let mut pieces = Vec::with_capacity(parts.len() + 2);
        pieces.push(quote_literal(&format!("{} ", self.operation.trim())));
        for part in &parts {
            match part {
                NamePart::Literal(s) => pieces.push(quote_literal(s)),
                NamePart::Marker => pieces.push(substitution.clone()),
            }
        }
        if !self.definition.is_empty() {
            pieces.push(quote_literal(&self.definition));
        }

        Ok(vec![
            format!("SET {substitution} = 0"),
            format!(
                "SELECT {substitution} := {}",
                select_body(&self.substitution_query)
            ),
            format!("SET {statement} = CONCAT({})", pieces.join(", ")),
            format!("PREPARE {prepared} FROM {statement}"),
            format!("EXECUTE {prepared}"),
            format!("DEALLOCATE PREPARE {prepared}"),
        ])
    }

    /// The whole script as one raw SQL fragment.
    pub fn to_sql(&self) -> MigResult<String> {
        Ok(self.statements()?.join(STATEMENT_SEPARATOR))
    }
}

/// Strip a leading `SELECT` so the query body can follow the assignment.
fn select_body(query: &str) -> &str {
    let q = query.trim();
    if starts_with_select(q) {
        q[6..].trim_start()
    } else {
        q
    }
}
