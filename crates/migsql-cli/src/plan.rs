//! Migration plan files.
//!
//! A plan is a TOML file with an optional `description` and an ordered list
//! of `[[steps]]`, each tagged by `kind`:
//!
//! ```toml
//! description = "Catalog properties"
//!
//! [[steps]]
//! kind = "insert"
//! table = "b_iblock_property"
//! fields = { IBLOCK_ID = { raw = "(SELECT ID FROM b_iblock WHERE CODE = 'catalog')" }, CODE = "COLOR" }
//!
//! [[steps]]
//! kind = "iblock_table"
//! template = "b_iblock_element_prop_s?"
//! condition = "CODE = 'catalog'"
//! definition = "(IBLOCK_ELEMENT_ID INT NOT NULL)"
//! ```

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use migsql::{BindValue, DdlVariables, Fields, GeneratedSql, Migration, ParamValue, Scalar};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanStep {
    Sql {
        sql: String,
        #[serde(default)]
        params: toml::Table,
    },
    Insert {
        table: String,
        fields: toml::Table,
    },
    InsertIgnore {
        table: String,
        fields: toml::Table,
    },
    Update {
        table: String,
        fields: toml::Table,
        #[serde(rename = "where")]
        filter: Option<toml::Table>,
    },
    Delete {
        table: String,
        #[serde(rename = "where")]
        filter: String,
        #[serde(default)]
        params: toml::Table,
    },
    DropTable {
        table: String,
    },
    TruncateTable {
        table: String,
    },
    Option {
        module: String,
        name: String,
        value: toml::Value,
        site: Option<String>,
    },
    DynamicTable {
        operation: String,
        template: String,
        query: String,
        #[serde(default)]
        definition: String,
    },
    IblockTable {
        template: String,
        condition: String,
        #[serde(default)]
        definition: String,
    },
}

impl PlanStep {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sql { .. } => "sql",
            Self::Insert { .. } => "insert",
            Self::InsertIgnore { .. } => "insert_ignore",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::DropTable { .. } => "drop_table",
            Self::TruncateTable { .. } => "truncate_table",
            Self::Option { .. } => "option",
            Self::DynamicTable { .. } => "dynamic_table",
            Self::IblockTable { .. } => "iblock_table",
        }
    }

    fn apply(self, m: &mut Migration) -> anyhow::Result<()> {
        match self {
            Self::Sql { sql, params } => {
                if params.is_empty() {
                    m.add_sql(sql);
                } else {
                    m.add_statement(GeneratedSql::with_params(sql, param_list(params)?)?);
                }
            }
            Self::Insert { table, fields } => {
                m.add_insert_sql(&table, to_fields(fields)?)?;
            }
            Self::InsertIgnore { table, fields } => {
                m.add_insert_ignore_sql(&table, to_fields(fields)?)?;
            }
            Self::Update {
                table,
                fields,
                filter,
            } => {
                let filter = filter.map(to_fields).transpose()?;
                m.add_update_sql(&table, to_fields(fields)?, filter)?;
            }
            Self::Delete {
                table,
                filter,
                params,
            } => {
                m.add_delete_where_sql(&table, &filter, param_list(params)?)?;
            }
            Self::DropTable { table } => {
                m.add_drop_table_sql(&table);
            }
            Self::TruncateTable { table } => {
                m.add_truncate_table_sql(&table);
            }
            Self::Option {
                module,
                name,
                value,
                site,
            } => {
                let value = to_scalar("value", value)?;
                m.add_option_update_sql(&module, &name, value, site.as_deref())?;
            }
            Self::DynamicTable {
                operation,
                template,
                query,
                definition,
            } => {
                m.add_dynamically_named_table_sql(&operation, &template, &query, &definition)?;
            }
            Self::IblockTable {
                template,
                condition,
                definition,
            } => {
                m.add_create_iblock_table_sql(&template, &condition, &definition)?;
            }
        }
        Ok(())
    }
}

impl Plan {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse plan {}", path.display()))
    }

    /// Queue every step on a new [`Migration`]; the first failing step aborts.
    pub fn into_migration(self, ddl: DdlVariables) -> anyhow::Result<Migration> {
        let mut m = Migration::new().with_ddl_variables(ddl);
        if let Some(description) = self.description {
            m = m.with_description(description);
        }

        for (i, step) in self.steps.into_iter().enumerate() {
            let kind = step.kind();
            step.apply(&mut m)
                .with_context(|| format!("step {} ({kind})", i + 1))?;
        }
        Ok(m)
    }
}

/// Plans named on the command line, or every `*.toml` in `dir` sorted by name.
pub fn plan_paths(explicit: Vec<PathBuf>, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        return Ok(explicit);
    }

    let pattern = dir.join("*.toml");
    let pattern = pattern.to_string_lossy();
    let mut paths = glob::glob(&pattern)
        .with_context(|| format!("invalid plan pattern {pattern}"))?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to list migration plans")?;
    paths.sort();

    if paths.is_empty() {
        anyhow::bail!("no migration plans found in {}", dir.display());
    }
    Ok(paths)
}

fn to_fields(table: toml::Table) -> anyhow::Result<Fields> {
    let mut fields = Fields::new();
    for (name, value) in table {
        let value = to_bind_value(&name, value)?;
        fields.push(name, value);
    }
    Ok(fields)
}

fn param_list(table: toml::Table) -> anyhow::Result<Vec<(String, ParamValue)>> {
    table
        .into_iter()
        .map(|(name, value)| {
            let value = to_param_value(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

/// `{ raw = "..." }` embeds SQL as-is; anything else is a bound value.
fn to_bind_value(key: &str, value: toml::Value) -> anyhow::Result<BindValue> {
    match value {
        toml::Value::Table(mut t) => {
            let raw = match (t.len(), t.remove("raw")) {
                (1, Some(toml::Value::String(sql))) => sql,
                _ => anyhow::bail!("{key}: only {{ raw = \"...\" }} tables are supported"),
            };
            Ok(BindValue::raw(raw))
        }
        other => Ok(to_param_value(key, other)?.into()),
    }
}

fn to_param_value(key: &str, value: toml::Value) -> anyhow::Result<ParamValue> {
    match value {
        toml::Value::Array(items) => Ok(ParamValue::Array(
            items
                .into_iter()
                .map(|v| to_scalar(key, v))
                .collect::<anyhow::Result<_>>()?,
        )),
        other => Ok(ParamValue::Scalar(to_scalar(key, other)?)),
    }
}

fn to_scalar(key: &str, value: toml::Value) -> anyhow::Result<Scalar> {
    Ok(match value {
        toml::Value::String(s) => Scalar::Str(s),
        toml::Value::Integer(v) => Scalar::Int(v),
        toml::Value::Float(v) => Scalar::Float(v),
        toml::Value::Boolean(v) => Scalar::Bool(v),
        toml::Value::Datetime(dt) => Scalar::DateTime(to_datetime(key, &dt.to_string())?),
        toml::Value::Array(_) => anyhow::bail!("{key}: nested arrays are not supported"),
        toml::Value::Table(_) => anyhow::bail!("{key}: tables are not supported here"),
    })
}

/// Local datetimes and dates (at midnight); offsets and bare times are rejected.
fn to_datetime(key: &str, s: &str) -> anyhow::Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .with_context(|| format!("{key}: unsupported datetime {s} (use a local date or datetime)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use migsql::ArrayParamType;

    fn build(raw: &str) -> anyhow::Result<Migration> {
        let plan: Plan = toml::from_str(raw)?;
        plan.into_migration(DdlVariables::default())
    }

    #[test]
    fn fields_keep_file_order() {
        let m = build(
            r#"
[[steps]]
kind = "insert"
table = "b_user"
fields = { NAME = "Alice", AGE = 30, ACTIVE = true }
"#,
        )
        .unwrap();
        let unit = &m.statements()[0];
        assert_eq!(
            unit.sql,
            "INSERT INTO b_user SET `NAME` = :p0,`AGE` = :p1,`ACTIVE` = :p2"
        );
        assert_eq!(unit.param("p1"), Some(&ParamValue::from(30)));
        assert_eq!(unit.param("p2"), Some(&ParamValue::from(true)));
    }

    #[test]
    fn raw_table_is_embedded() {
        let m = build(
            r#"
[[steps]]
kind = "update"
table = "b_iblock_property"

[steps.fields]
IBLOCK_ID = { raw = "SELECT ID FROM b_iblock WHERE CODE = 'catalog'" }

[steps.where]
CODE = "COLOR"
"#,
        )
        .unwrap();
        assert_eq!(
            m.statements()[0].sql,
            "UPDATE b_iblock_property SET `IBLOCK_ID` = (SELECT ID FROM b_iblock WHERE CODE = 'catalog') WHERE `CODE` = :p0"
        );
    }

    #[test]
    fn sql_and_delete_steps_take_named_params() {
        let m = build(
            r#"
[[steps]]
kind = "sql"
sql = "SELECT 1"

[[steps]]
kind = "delete"
table = "b_option"
where = "MODULE_ID = :module AND NAME IN (:names)"
params = { module = "catalog", names = ["a", "b"] }
"#,
        )
        .unwrap();
        let s = m.statements();
        assert!(s[0].params.is_empty());
        assert_eq!(s[1].sql, "DELETE FROM b_option WHERE MODULE_ID = :module AND NAME IN (:names)");
        assert_eq!(s[1].types.get("names"), Some(&ArrayParamType::String));
    }

    #[test]
    fn option_and_ddl_steps() {
        let m = build(
            r#"
description = "options"

[[steps]]
kind = "option"
module = "main"
name = "site_name"
value = "Shop"
site = "s1"

[[steps]]
kind = "iblock_table"
template = "b_iblock_?_prop"
condition = "CODE = 'catalog'"
definition = "(id INT)"

[[steps]]
kind = "drop_table"
table = "b_old"
"#,
        )
        .unwrap();
        assert_eq!(m.description(), Some("options"));
        let s = m.statements();
        assert!(s[0].sql.ends_with("AND `SITE_ID` = :p3"));
        assert!(s[1].sql.starts_with("SET @SUBSTITUTION = 0;\n"));
        assert_eq!(s[2].sql, "DROP TABLE `b_old`");
    }

    #[test]
    fn failing_step_is_reported_with_position() {
        let err = build(
            r#"
[[steps]]
kind = "drop_table"
table = "b_old"

[[steps]]
kind = "dynamic_table"
operation = "CREATE TABLE"
template = "b_static"
query = "SELECT 1"
"#,
        )
        .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("step 2 (dynamic_table)"), "{msg}");
    }

    #[test]
    fn empty_array_param_fails() {
        let err = build(
            r#"
[[steps]]
kind = "delete"
table = "b_option"
where = "ID IN (:ids)"
params = { ids = [] }
"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("ids"));
    }

    #[test]
    fn value_conversion() {
        assert!(to_bind_value("x", toml::Value::Array(vec![toml::Value::Array(vec![])])).is_err());

        let mut t = toml::Table::new();
        t.insert("raw".into(), toml::Value::String("NOW()".into()));
        t.insert("other".into(), toml::Value::Integer(1));
        assert!(to_bind_value("x", toml::Value::Table(t)).is_err());

        let dt = to_datetime("x", "2024-01-02T03:04:05").unwrap();
        assert_eq!(dt.to_string(), "2024-01-02 03:04:05");
        let d = to_datetime("x", "2024-01-02").unwrap();
        assert_eq!(d.to_string(), "2024-01-02 00:00:00");
        assert!(to_datetime("x", "2024-01-02T03:04:05Z").is_err());
        assert!(to_datetime("x", "03:04:05").is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let res: Result<Plan, _> = toml::from_str("[[steps]]\nkind = \"merge\"\n");
        assert!(res.is_err());
    }
}
