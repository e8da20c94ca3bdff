//! # migsql
//!
//! Safe SQL fragments for MySQL migration authoring.
//!
//! ## Features
//!
//! - **Named parameters**: values are bound as `:p0, :p1, ...` (or explicit names)
//!   and handed over together with the SQL, never spliced into it
//! - **Field clauses**: `SET` lists and `AND` predicates from ordered field maps,
//!   with per-segment backtick quoting and raw subquery values
//! - **Optional clauses**: [`Params::emit_if`] renders a fragment only when a flag holds
//! - **Dynamically-named DDL**: `CREATE TABLE` (or any DDL verb) against a name
//!   computed by a lookup at execution time, via `PREPARE` / `EXECUTE`
//! - **Migration helpers**: insert / update / delete / drop / truncate / option
//!   statements queued on a [`Migration`]
//!
//! migsql does not connect to a database. Every operation produces a
//! [`GeneratedSql`] (SQL text, ordered parameters, array type hints) for the
//! migration framework to execute.
//!
//! ## Example
//!
//! ```ignore
//! use migsql::{Migration, fields};
//!
//! let mut m = Migration::new();
//! m.add_update_sql(
//!     "b_user",
//!     fields! { "ACTIVE" => "N" },
//!     Some(fields! { "LOGIN" => "guest" }),
//! )?;
//! // UPDATE b_user SET `ACTIVE` = :p0 WHERE `LOGIN` = :p1
//! ```

pub mod ddl;
pub mod error;
pub mod ident;
pub mod lookup;
pub mod migration;
pub mod params;
pub mod prelude;
pub mod value;

pub use ddl::{DdlVariables, DynamicNameDdl, NamePart, split_name_template};
pub use error::{MigError, MigResult};
pub use ident::{FieldIdent, quote_field, quote_literal};
pub use lookup::ColumnFetcher;
pub use migration::Migration;
pub use params::{Fields, GeneratedSql, Params, generate, guess_types};
pub use value::{ArrayParamType, BindValue, Fragment, ParamValue, Scalar};
