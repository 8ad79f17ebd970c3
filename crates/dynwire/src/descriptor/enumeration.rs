// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumerations.

use crate::error::{Error, MarshalError, Result};
use crate::stream::{InputStream, OutputStream};
use crate::value::Value;
use std::collections::BTreeMap;

/// Enumeration type: declared enumerators keyed by value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    id: String,
    enumerators: BTreeMap<i32, String>,
    max_value: i32,
}

impl EnumDescriptor {
    /// Build an enumeration. Values must be non-negative and unique.
    pub fn new<I, S>(id: impl Into<String>, enumerators: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let id = id.into();
        let mut map = BTreeMap::new();
        for (name, value) in enumerators {
            if value < 0 {
                return Err(Error::configuration(format!(
                    "enum `{id}`: negative enumerator value {value}"
                )));
            }
            if map.insert(value, name.into()).is_some() {
                return Err(Error::configuration(format!(
                    "enum `{id}`: duplicate enumerator value {value}"
                )));
            }
        }
        let max_value = map.keys().next_back().copied().unwrap_or(0);
        Ok(Self {
            id,
            enumerators: map,
            max_value,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    /// Enumerator name for a value.
    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.enumerators.get(&value).map(String::as_str)
    }

    /// Enumerator value for a name.
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.enumerators
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(v, _)| *v)
    }

    pub fn validate(&self, value: &Value) -> bool {
        matches!(value, Value::Enum(v) if self.enumerators.contains_key(v))
    }

    pub fn marshal(&self, value: &Value, os: &mut OutputStream) -> Result<()> {
        match value {
            Value::Enum(v) if self.enumerators.contains_key(v) => os.write_enum(*v, self.max_value),
            _ => Err(Error::validation(format!(
                "invalid enumerator {value:?} for `{}`",
                self.id
            ))),
        }
    }

    pub fn unmarshal(&self, is: &mut InputStream<'_>) -> Result<Value> {
        let value = is.read_enum()?;
        if value > self.max_value || !self.enumerators.contains_key(&value) {
            return Err(MarshalError::EnumeratorOutOfRange {
                type_id: self.id.clone(),
                value,
            }
            .into());
        }
        Ok(Value::Enum(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color() -> EnumDescriptor {
        EnumDescriptor::new("::Test::Color", [("red", 0), ("green", 1), ("blue", 5)])
            .expect("valid enum")
    }

    #[test]
    fn test_lookup() {
        let e = color();
        assert_eq!(e.max_value(), 5);
        assert_eq!(e.name_of(1), Some("green"));
        assert_eq!(e.value_of("blue"), Some(5));
        assert_eq!(e.name_of(3), None);
    }

    #[test]
    fn test_rejects_bad_definitions() {
        assert!(EnumDescriptor::new("::E", [("a", -1)]).is_err());
        assert!(EnumDescriptor::new("::E", [("a", 1), ("b", 1)]).is_err());
    }

    #[test]
    fn test_max_value_decodes() {
        let e = color();
        let mut os = OutputStream::new();
        e.marshal(&Value::Enum(5), &mut os).expect("marshal");
        let bytes = os.into_bytes();
        assert_eq!(bytes, vec![5]);
        let mut is = InputStream::new(&bytes);
        assert_eq!(e.unmarshal(&mut is).expect("unmarshal"), Value::Enum(5));
    }

    #[test]
    fn test_gap_and_overflow_rejected_on_decode() {
        let e = color();
        for raw in [3u8, 6] {
            let bytes = [raw];
            let mut is = InputStream::new(&bytes);
            let err = e.unmarshal(&mut is).unwrap_err();
            assert!(matches!(
                err,
                Error::Marshal(MarshalError::EnumeratorOutOfRange { value, .. }) if value == i32::from(raw)
            ));
        }
    }

    #[test]
    fn test_undeclared_value_not_written() {
        let e = color();
        let mut os = OutputStream::new();
        assert!(e.marshal(&Value::Enum(2), &mut os).is_err());
        assert!(!e.validate(&Value::Int(0)));
        assert!(os.as_bytes().is_empty());
    }
}
