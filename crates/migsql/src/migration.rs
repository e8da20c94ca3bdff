//! Migration step helpers.
//!
//! A [`Migration`] queues [`GeneratedSql`] units in order. It never executes
//! anything: the migration framework that owns the connection takes the
//! queued statements and runs them inside its own transaction.
//!
//! # Example
//!
//! ```ignore
//! use migsql::{Migration, fields};
//!
//! let mut m = Migration::new().with_description("Add catalog properties table");
//! m.add_insert_sql("b_option", fields! {
//!     "MODULE_ID" => "catalog",
//!     "NAME" => "default_quantity",
//!     "VALUE" => "1",
//! })?;
//! m.add_create_iblock_table_sql("b_iblock_element_prop_s?", "CODE = 'catalog'", "(IBLOCK_ELEMENT_ID INT NOT NULL)")?;
//! m.add_option_update_sql("main", "site_name", "Shop", Some("s1"))?;
//!
//! for unit in m.statements() {
//!     println!("{}", unit.sql);
//! }
//! ```

use crate::ddl::{DdlVariables, DynamicNameDdl};
use crate::error::MigResult;
use crate::ident::FieldIdent;
use crate::params::{Fields, GeneratedSql, Params, generate};
use crate::value::{Fragment, ParamValue, Scalar};

/// Table holding module options.
pub const OPTION_TABLE: &str = "b_option";

/// Table holding info blocks, used to compute per-iblock table names.
pub const IBLOCK_TABLE: &str = "b_iblock";

/// An ordered queue of SQL statements for one migration step.
#[derive(Debug, Clone)]
pub struct Migration {
    description: Option<String>,
    statements: Vec<GeneratedSql>,
    ddl_variables: DdlVariables,
    log_sql_length: Option<usize>,
}

impl Default for Migration {
    fn default() -> Self {
        Self {
            description: None,
            statements: Vec::new(),
            ddl_variables: DdlVariables::default(),
            log_sql_length: Some(200),
        }
    }
}

impl Migration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Scratch variable names used by dynamically-named DDL.
    pub fn with_ddl_variables(mut self, variables: DdlVariables) -> Self {
        self.ddl_variables = variables;
        self
    }

    /// Truncate SQL in log events to `len` bytes; `None` logs it in full.
    pub fn with_log_sql_length(mut self, len: Option<usize>) -> Self {
        self.log_sql_length = len;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Queued statements in order.
    pub fn statements(&self) -> &[GeneratedSql] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<GeneratedSql> {
        self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Queue a pre-built statement.
    pub fn add_statement(&mut self, unit: GeneratedSql) -> &mut Self {
        self.trace(&unit);
        self.statements.push(unit);
        self
    }

    /// Queue raw SQL without parameters.
    pub fn add_sql(&mut self, sql: impl Into<String>) -> &mut Self {
        self.add_statement(GeneratedSql::raw(sql))
    }

    /// Queue a statement produced by `generator` against a fresh binder.
    pub fn add_generated_sql<F>(&mut self, generator: F) -> MigResult<&mut Self>
    where
        F: FnOnce(&mut Params) -> MigResult<String>,
    {
        let unit = generate(generator)?;
        Ok(self.add_statement(unit))
    }

    /// `INSERT INTO table SET ...`
    pub fn add_insert_sql(&mut self, table: &str, fields: Fields) -> MigResult<&mut Self> {
        self.add_generated_sql(|p| Ok(format!("INSERT INTO {table} SET {}", p.upsert(fields)?)))
    }

    /// `INSERT IGNORE INTO table SET ...`
    pub fn add_insert_ignore_sql(&mut self, table: &str, fields: Fields) -> MigResult<&mut Self> {
        self.add_generated_sql(|p| {
            Ok(format!("INSERT IGNORE INTO {table} SET {}", p.upsert(fields)?))
        })
    }

    /// `UPDATE table SET ...`, with `WHERE` fields compared for equality.
    pub fn add_update_sql(
        &mut self,
        table: &str,
        fields: Fields,
        filter: Option<Fields>,
    ) -> MigResult<&mut Self> {
        let filter = filter.map(|f| -> Fragment { Box::new(move |p: &mut Params| p.all_equal(f)) });
        self.update(table, fields, filter)
    }

    /// `UPDATE table SET ... WHERE <filter>` with an arbitrary predicate.
    pub fn add_update_where_sql<F>(
        &mut self,
        table: &str,
        fields: Fields,
        filter: F,
    ) -> MigResult<&mut Self>
    where
        F: FnOnce(&mut Params) -> MigResult<String> + 'static,
    {
        self.update(table, fields, Some(Box::new(filter)))
    }

    fn update(
        &mut self,
        table: &str,
        fields: Fields,
        filter: Option<Fragment>,
    ) -> MigResult<&mut Self> {
        self.add_generated_sql(|p| {
            let set = p.upsert(fields)?;
            let has_filter = filter.is_some();
            let filter: Fragment =
                filter.unwrap_or_else(|| Box::new(|_: &mut Params| Ok(String::new())));
            let filter_sql = p.emit_if(has_filter, |p| Ok(format!(" WHERE {}", filter(p)?)))?;
            Ok(format!("UPDATE {table} SET {set}{filter_sql}"))
        })
    }

    /// `DELETE FROM table WHERE <where_sql>` with caller-named parameters.
    ///
    /// Array element types are inferred without going through a binder.
    pub fn add_delete_where_sql<K, V>(
        &mut self,
        table: &str,
        where_sql: &str,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> MigResult<&mut Self>
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let unit = GeneratedSql::with_params(format!("DELETE FROM {table} WHERE {where_sql}"), params)?;
        Ok(self.add_statement(unit))
    }

    /// `DROP TABLE` with the name quoted per segment.
    pub fn add_drop_table_sql(&mut self, table: &str) -> &mut Self {
        self.add_sql(format!("DROP TABLE {}", FieldIdent::parse(table).to_sql()))
    }

    /// `TRUNCATE TABLE` with the name quoted per segment.
    pub fn add_truncate_table_sql(&mut self, table: &str) -> &mut Self {
        self.add_sql(format!("TRUNCATE TABLE {}", FieldIdent::parse(table).to_sql()))
    }

    /// Set a module option, for one site or (when `site_id` is `None`) all sites.
    pub fn add_option_update_sql(
        &mut self,
        module_id: &str,
        option: &str,
        value: impl Into<Scalar>,
        site_id: Option<&str>,
    ) -> MigResult<&mut Self> {
        let value = value.into();
        self.add_generated_sql(|p| {
            let set = p.upsert(Fields::new().set("VALUE", value))?;
            let filter = p.all_equal(Fields::new().set("MODULE_ID", module_id).set("NAME", option))?;
            let site = p.emit_if(site_id.is_some(), |p| {
                Ok(format!(" AND {}", p.all_equal(Fields::new().set("SITE_ID", site_id))?))
            })?;
            Ok(format!("UPDATE {OPTION_TABLE} SET {set} WHERE {filter}{site}"))
        })
    }

    /// Queue DDL whose object name is computed by `substitution_query`.
    pub fn add_dynamically_named_table_sql(
        &mut self,
        operation: &str,
        name_template: &str,
        substitution_query: &str,
        definition: &str,
    ) -> MigResult<&mut Self> {
        let sql = DynamicNameDdl::new(operation, name_template, substitution_query)
            .definition(definition)
            .variables(self.ddl_variables.clone())
            .to_sql()?;
        Ok(self.add_sql(sql))
    }

    /// `CREATE TABLE` named after the ID of the info block matching `iblock_condition`.
    pub fn add_create_iblock_table_sql(
        &mut self,
        name_template: &str,
        iblock_condition: &str,
        definition: &str,
    ) -> MigResult<&mut Self> {
        self.add_dynamically_named_table_sql(
            "CREATE TABLE",
            name_template,
            &format!("SELECT ID FROM {IBLOCK_TABLE} WHERE {iblock_condition}"),
            definition,
        )
    }

    #[cfg(feature = "tracing")]
    fn trace(&self, unit: &GeneratedSql) {
        let sql = match self.log_sql_length {
            Some(max) if unit.sql.len() > max => {
                format!("{}...", truncate_sql_bytes(&unit.sql, max))
            }
            _ => unit.sql.clone(),
        };
        tracing::debug!(
            target: "migsql.sql",
            migration = self.description.as_deref().unwrap_or("-"),
            param_count = unit.params.len(),
            sql = %sql,
            params = %unit.inline_params(),
            "queued statement"
        );
    }

    #[cfg(not(feature = "tracing"))]
    fn trace(&self, _unit: &GeneratedSql) {}
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
