//! Single-value lookups used while authoring migrations.
//!
//! Migrations often need one value from the live database (e.g. the ID of the
//! info block with a given code) before they can build their statements. The
//! query runs through a caller-supplied [`ColumnFetcher`], usually backed by
//! the migration framework's connection.

use crate::error::{MigError, MigResult};
use crate::params::GeneratedSql;
use crate::value::{ParamValue, Scalar};
use std::future::Future;

/// Runs a query and returns the first column of every row.
pub trait ColumnFetcher: Send + Sync {
    fn fetch_first_column(
        &self,
        query: &GeneratedSql,
    ) -> impl Future<Output = MigResult<Vec<Scalar>>> + Send;
}

/// Fetch `field` from the single row of `table` matching `where_sql`.
///
/// Fails with [`MigError::UnexpectedRowCount`] unless exactly one row matches.
pub async fn field_where<C, K, V>(
    client: &C,
    table: &str,
    field: &str,
    where_sql: &str,
    params: impl IntoIterator<Item = (K, V)>,
) -> MigResult<Scalar>
where
    C: ColumnFetcher,
    K: Into<String>,
    V: Into<ParamValue>,
{
    let query =
        GeneratedSql::with_params(format!("SELECT {field} FROM {table} WHERE {where_sql}"), params)?;
    let values = client.fetch_first_column(&query).await?;

    match values.len() {
        1 => Ok(values.into_iter().next().unwrap_or(Scalar::Null)),
        actual => Err(MigError::unexpected_row_count(table, 1, actual)),
    }
}

/// Fetch the `ID` of the single row of `table` matching `where_sql`.
///
/// Fails with [`MigError::UnexpectedValue`] unless the ID is a string or an integer.
pub async fn id_where<C, K, V>(
    client: &C,
    table: &str,
    where_sql: &str,
    params: impl IntoIterator<Item = (K, V)>,
) -> MigResult<String>
where
    C: ColumnFetcher,
    K: Into<String>,
    V: Into<ParamValue>,
{
    match field_where(client, table, "ID", where_sql, params).await? {
        Scalar::Str(s) => Ok(s),
        Scalar::Int(v) => Ok(v.to_string()),
        other => Err(MigError::UnexpectedValue {
            table: table.to_string(),
            field: "ID".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

/// Like [`field_where`], but the value must be a non-empty string.
pub async fn string_field_where<C, K, V>(
    client: &C,
    table: &str,
    field: &str,
    where_sql: &str,
    params: impl IntoIterator<Item = (K, V)>,
) -> MigResult<String>
where
    C: ColumnFetcher,
    K: Into<String>,
    V: Into<ParamValue>,
{
    match field_where(client, table, field, where_sql, params).await? {
        Scalar::Str(s) if !s.is_empty() => Ok(s),
        other => Err(MigError::UnexpectedValue {
            table: table.to_string(),
            field: field.to_string(),
            found: match other {
                Scalar::Str(_) => "empty string".to_string(),
                other => other.type_name().to_string(),
            },
        }),
    }
}
