// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dictionaries.

use super::sequence::optional_size_estimate;
use super::{MemberMetadata, TypeDescriptor};
use crate::error::{Error, HostError, Result};
use crate::graph::{ObjectGraphTracker, PatchResolver, PathStep};
use crate::stream::{InputStream, OptionalFormat, OutputStream};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Host callback building a custom container from decoded entries.
pub trait DictionaryFactory: Send + Sync {
    fn create(&self, entries: Vec<(Value, Value)>) -> std::result::Result<Value, HostError>;
}

impl<F> DictionaryFactory for F
where
    F: Fn(Vec<(Value, Value)>) -> std::result::Result<Value, HostError> + Send + Sync,
{
    fn create(&self, entries: Vec<(Value, Value)>) -> std::result::Result<Value, HostError> {
        self(entries)
    }
}

/// Container produced when unmarshaling a dictionary.
#[derive(Clone, Default)]
pub enum DictionaryMapping {
    /// `Value::Dictionary` in wire order.
    #[default]
    Entries,
    Custom(Arc<dyn DictionaryFactory>),
}

impl fmt::Debug for DictionaryMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entries => f.write_str("Entries"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Dictionary type.
pub struct DictionaryDescriptor {
    id: String,
    key: TypeDescriptor,
    value: TypeDescriptor,
}

impl fmt::Debug for DictionaryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryDescriptor")
            .field("id", &self.id)
            .field("key", &self.key.id())
            .field("value", &self.value.id())
            .finish()
    }
}

impl DictionaryDescriptor {
    /// Keys are decoded eagerly, so a key type may not contain classes.
    pub fn new(id: impl Into<String>, key: TypeDescriptor, value: TypeDescriptor) -> Result<Self> {
        let id = id.into();
        if key.uses_classes() {
            return Err(Error::configuration(format!(
                "dictionary `{id}`: key type `{}` uses classes",
                key.id()
            )));
        }
        Ok(Self { id, key, value })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &TypeDescriptor {
        &self.key
    }

    pub fn value(&self) -> &TypeDescriptor {
        &self.value
    }

    pub(crate) fn uses_classes(&self) -> bool {
        self.value.uses_classes()
    }

    pub(crate) fn optional_format(&self) -> OptionalFormat {
        if self.key.variable_length() || self.value.variable_length() {
            OptionalFormat::FSize
        } else {
            OptionalFormat::VSize
        }
    }

    pub fn validate(&self, value: &Value) -> bool {
        matches!(value, Value::Dictionary(_))
    }

    pub(crate) fn marshal(
        &self,
        value: &Value,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
        as_optional: bool,
    ) -> Result<()> {
        let Value::Dictionary(entries) = value else {
            return Err(Error::validation(format!(
                "expected dictionary `{}` but got {}",
                self.id,
                value.kind_name()
            )));
        };

        let bracket = if as_optional {
            match self.optional_format() {
                OptionalFormat::FSize => Some(os.start_size()),
                _ => {
                    let entry_size = self.key.wire_size() + self.value.wire_size();
                    os.write_size(optional_size_estimate(entries.len(), entry_size))?;
                    None
                }
            }
        } else {
            None
        };

        os.write_size(entries.len())?;
        for (key, item) in entries {
            if !self.key.validate(key) {
                return Err(Error::validation(format!(
                    "invalid key in `{}`: {}",
                    self.id,
                    key.kind_name()
                )));
            }
            if !self.value.validate(item) {
                return Err(Error::validation(format!(
                    "invalid value for key {key:?} in `{}`: {}",
                    self.id,
                    item.kind_name()
                )));
            }
            self.key.marshal(key, os, graph, false, None)?;
            self.value.marshal(item, os, graph, false, None)?;
        }

        match bracket {
            Some(pos) => os.end_size(pos),
            None => Ok(()),
        }
    }

    /// Keys are read eagerly and an entry with a placeholder value is pushed
    /// before the value is read, so a deferred class value patches the entry
    /// in place.
    pub(crate) fn unmarshal(
        &self,
        is: &mut InputStream<'_>,
        resolver: &mut PatchResolver<'_>,
        as_optional: bool,
        meta: Option<&MemberMetadata>,
    ) -> Result<Value> {
        if as_optional {
            match self.optional_format() {
                OptionalFormat::FSize => is.skip(4)?,
                _ => is.skip_size()?,
            }
        }
        let min_entry = self.key.min_wire_size() + self.value.min_wire_size();
        let count = is.read_and_check_seq_size(min_entry, resolver.config().max_sequence_length)?;

        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(count);
        for i in 0..count {
            let key = self.key.unmarshal(is, resolver, false, None)?;
            entries.push((key, Value::Null));
            resolver.enter(PathStep::Entry(i));
            let item = self.value.unmarshal(is, resolver, false, None);
            resolver.leave();
            entries[i].1 = item?;
        }

        match meta.and_then(MemberMetadata::dictionary_mapping) {
            Some(DictionaryMapping::Custom(factory)) => Ok(factory.create(entries)?),
            _ => Ok(Value::Dictionary(entries)),
        }
    }
}
