/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Key/value parameter maps
//!
//! Calculators accept their parameters either as typed objects or as a plain
//! map of names to values. `ParameterDictionary` consumes such a map entry by
//! entry with type checks and reports whatever is left over as unknown.

use super::errors::{ParametersError, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct ParameterDictionary {
    entries: Map<String, Value>,
}

impl ParameterDictionary {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(ParametersError::WrongType {
                key: "parameters".to_string(),
                expected: "a map of parameter names to values",
            }),
        }
    }

    /// Remove the first of `names` present; `null` counts as absent.
    ///
    /// Giving more than one alias of the same parameter is a conflict.
    pub fn take(&mut self, names: &[&str]) -> Result<Option<(String, Value)>> {
        let mut found: Option<(String, Value)> = None;
        for name in names {
            if let Some(value) = self.entries.remove(*name) {
                if let Some((previous, _)) = &found {
                    return Err(ParametersError::Conflict(format!(
                        "'{}' and '{}' name the same parameter",
                        previous, name
                    )));
                }
                found = Some((name.to_string(), value));
            }
        }
        Ok(found.filter(|(_, value)| !value.is_null()))
    }

    pub fn bool(&mut self, names: &[&str]) -> Result<Option<bool>> {
        match self.take(names)? {
            None => Ok(None),
            Some((_, Value::Bool(value))) => Ok(Some(value)),
            Some((key, _)) => Err(ParametersError::WrongType {
                key,
                expected: "a boolean",
            }),
        }
    }

    pub fn u64(&mut self, name: &str) -> Result<Option<u64>> {
        match self.take(&[name])? {
            None => Ok(None),
            Some((key, value)) => value.as_u64().map(Some).ok_or(ParametersError::WrongType {
                key,
                expected: "a non-negative integer",
            }),
        }
    }

    pub fn usize(&mut self, name: &str) -> Result<Option<usize>> {
        Ok(self.u64(name)?.map(|v| v as usize))
    }

    pub fn f64(&mut self, name: &str) -> Result<Option<f64>> {
        match self.take(&[name])? {
            None => Ok(None),
            Some((key, value)) => value.as_f64().map(Some).ok_or(ParametersError::WrongType {
                key,
                expected: "a number",
            }),
        }
    }

    pub fn string(&mut self, name: &str) -> Result<Option<String>> {
        match self.take(&[name])? {
            None => Ok(None),
            Some((_, Value::String(value))) => Ok(Some(value)),
            Some((key, _)) => Err(ParametersError::WrongType {
                key,
                expected: "a string",
            }),
        }
    }

    pub fn path(&mut self, name: &str) -> Result<Option<PathBuf>> {
        Ok(self.string(name)?.map(PathBuf::from))
    }

    /// A list of numbers; scalars are rejected, not promoted
    pub fn float_list(&mut self, name: &str) -> Result<Option<Vec<f64>>> {
        let (key, value) = match self.take(&[name])? {
            None => return Ok(None),
            Some(entry) => entry,
        };
        let items = match value {
            Value::Array(items) => items,
            _ => {
                return Err(ParametersError::WrongType {
                    key,
                    expected: "a list of numbers",
                })
            }
        };
        items
            .iter()
            .map(|item| {
                item.as_f64().ok_or_else(|| ParametersError::WrongType {
                    key: key.clone(),
                    expected: "a list of numbers",
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// A nested map, e.g. beam parameters inside PMI parameters
    pub fn dictionary(&mut self, name: &str) -> Result<Option<ParameterDictionary>> {
        match self.take(&[name])? {
            None => Ok(None),
            Some((_, value @ Value::Object(_))) => Self::from_value(value).map(Some),
            Some((key, _)) => Err(ParametersError::WrongType {
                key,
                expected: "a map of parameters",
            }),
        }
    }

    /// Raw value, for parameters that deserialize themselves
    pub fn value(&mut self, name: &str) -> Result<Option<Value>> {
        Ok(self.take(&[name])?.map(|(_, value)| value))
    }

    /// Fail if any entry was not consumed
    pub fn finish(self) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        Err(ParametersError::UnknownKey(names.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_access_and_leftovers() {
        let mut dict = ParameterDictionary::from_value(json!({
            "number_of_steps": 50,
            "calculate_Compton": true,
            "rotation": [1, 0, 0, 0],
            "random_seed": null,
            "bogus": 1,
        }))
        .unwrap();

        assert_eq!(dict.usize("number_of_steps").unwrap(), Some(50));
        assert_eq!(
            dict.bool(&["calculate_compton", "calculate_Compton"]).unwrap(),
            Some(true)
        );
        assert_eq!(dict.float_list("rotation").unwrap(), Some(vec![1.0, 0.0, 0.0, 0.0]));
        assert_eq!(dict.u64("random_seed").unwrap(), None);

        let err = dict.finish().unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_type_errors() {
        let mut dict = ParameterDictionary::from_value(json!({
            "rotation": 2.0,
            "number_of_steps": -1,
            "name": 3,
        }))
        .unwrap();
        assert!(matches!(
            dict.float_list("rotation"),
            Err(ParametersError::WrongType { .. })
        ));
        assert!(dict.usize("number_of_steps").is_err());
        assert!(dict.string("name").is_err());
    }

    #[test]
    fn test_aliases_conflict() {
        let mut dict = ParameterDictionary::from_value(json!({
            "calculate_compton": true,
            "calculate_Compton": false,
        }))
        .unwrap();
        assert!(matches!(
            dict.bool(&["calculate_compton", "calculate_Compton"]),
            Err(ParametersError::Conflict(_))
        ));
    }

    #[test]
    fn test_rejects_non_map() {
        assert!(ParameterDictionary::from_value(json!([1, 2])).is_err());
    }
}
