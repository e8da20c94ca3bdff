use crate::error::{MigError, MigResult};
use crate::value::{ArrayParamType, ParamValue};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// A SQL statement with its parameters, ready for the executing collaborator.
///
/// - `sql`: SQL text with `:name` placeholders
/// - `params`: bound values in bind order
/// - `types`: element type hints, present only for array parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSql {
    pub sql: String,
    #[serde(serialize_with = "serialize_ordered")]
    pub params: Vec<(String, ParamValue)>,
    pub types: BTreeMap<String, ArrayParamType>,
}

fn serialize_ordered<S: Serializer>(
    params: &[(String, ParamValue)],
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_map(params.iter().map(|(k, v)| (k, v)))
}

impl GeneratedSql {
    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            types: BTreeMap::new(),
        }
    }

    /// A statement with caller-named parameters that did not go through a
    /// binder. Array element types are inferred the same way a binder does,
    /// and names must be unique.
    pub fn with_params<K, V>(
        sql: impl Into<String>,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> MigResult<Self>
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let params: Vec<(String, ParamValue)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for (i, (name, _)) in params.iter().enumerate() {
            if params[..i].iter().any(|(n, _)| n == name) {
                return Err(MigError::DuplicateParameterName(name.clone()));
            }
        }
        let types = guess_types(&params)?;
        Ok(Self {
            sql: sql.into(),
            params,
            types,
        })
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Human-readable parameter listing, e.g. `[p0 => 'Alice', p1 => 30]`.
    ///
    /// Only meant for logs and previews; never substitute it into SQL.
    pub fn inline_params(&self) -> String {
        let mut out = String::from("[");
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push_str(" => ");
            out.push_str(&value.to_string());
        }
        out.push(']');
        out
    }
}

/// Infer array element types for parameters that bypass the binder.
pub fn guess_types(params: &[(String, ParamValue)]) -> MigResult<BTreeMap<String, ArrayParamType>> {
    let mut types = BTreeMap::new();
    for (name, value) in params {
        let ParamValue::Array(values) = value else {
            continue;
        };
        let Some(ty) = ArrayParamType::infer(values) else {
            return Err(MigError::EmptyArrayParameter(name.clone()));
        };
        types.insert(name.clone(), ty);
    }
    Ok(types)
}
