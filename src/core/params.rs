use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::Result;

/// Flat string-keyed parameter set exchanged with both gateways.
///
/// No ordering is implied; order is imposed only when canonicalizing.
pub type ParameterSet = HashMap<String, String>;

/// Build a parameter set from borrowed pairs
pub fn from_pairs<'a, I>(pairs: I) -> ParameterSet
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Map a parameter set into a typed structure through its JSON form
pub fn into_typed<T: DeserializeOwned>(params: ParameterSet) -> Result<T> {
    let object: Map<String, Value> = params
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    Ok(serde_json::from_value(Value::Object(object))?)
}
