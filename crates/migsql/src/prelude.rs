//! Convenient re-exports for migration code.
//!
//! ```ignore
//! use migsql::prelude::*;
//! ```

pub use crate::ddl::{DdlVariables, DynamicNameDdl};
pub use crate::error::{MigError, MigResult};
pub use crate::fields;
pub use crate::lookup::{ColumnFetcher, field_where, id_where, string_field_where};
pub use crate::migration::Migration;
pub use crate::params::{Fields, GeneratedSql, Params, generate};
pub use crate::value::{BindValue, ParamValue, Scalar};
