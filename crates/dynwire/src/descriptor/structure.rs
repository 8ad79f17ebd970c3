// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structures: ordered required members, no headers.

use super::member::{marshal_members, unmarshal_members};
use super::DataMember;
use crate::error::{Error, Result};
use crate::graph::{ObjectGraphTracker, PatchResolver};
use crate::stream::{InputStream, OptionalFormat, OutputStream};
use crate::value::Value;
use arc_swap::ArcSwapOption;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shape of a defined structure.
#[derive(Debug)]
pub struct StructDefinition {
    pub members: Vec<DataMember>,
    wire_size: usize,
    variable_length: bool,
    min_wire_size: usize,
    uses_classes: bool,
}

impl StructDefinition {
    fn new(members: Vec<DataMember>) -> Self {
        let variable_length = members.iter().any(|m| m.ty.variable_length());
        let wire_size = if variable_length {
            0
        } else {
            members.iter().map(|m| m.ty.wire_size()).sum()
        };
        Self {
            wire_size,
            variable_length,
            min_wire_size: members.iter().map(|m| m.ty.min_wire_size()).sum(),
            uses_classes: members.iter().any(|m| m.ty.uses_classes()),
            members,
        }
    }
}

/// Structure type. May be declared before it is defined so that it can
/// reference itself through a sequence or dictionary.
pub struct StructDescriptor {
    id: String,
    definition: ArcSwapOption<StructDefinition>,
}

impl fmt::Debug for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructDescriptor")
            .field("id", &self.id)
            .field("defined", &self.is_defined())
            .finish()
    }
}

impl StructDescriptor {
    pub fn declared(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            definition: ArcSwapOption::empty(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_defined(&self) -> bool {
        self.definition.load().is_some()
    }

    /// Install the members. Fails if the structure is already defined.
    pub(crate) fn define(&self, members: Vec<DataMember>) -> Result<()> {
        if members.iter().any(|m| m.optional) {
            return Err(Error::configuration(format!(
                "struct `{}` cannot have optional members",
                self.id
            )));
        }
        if self.is_defined() {
            return Err(Error::configuration(format!(
                "struct `{}` is already defined",
                self.id
            )));
        }
        self.definition
            .store(Some(Arc::new(StructDefinition::new(members))));
        Ok(())
    }

    pub fn definition(&self) -> Result<Arc<StructDefinition>> {
        self.definition.load_full().ok_or_else(|| {
            Error::configuration(format!("struct `{}` is declared but not defined", self.id))
        })
    }

    pub fn members(&self) -> Vec<DataMember> {
        self.definition
            .load()
            .as_ref()
            .map(|d| d.members.clone())
            .unwrap_or_default()
    }

    // A declared-only struct is treated as variable length with no classes.
    pub(crate) fn variable_length(&self) -> bool {
        self.definition
            .load()
            .as_ref()
            .map_or(true, |d| d.variable_length)
    }

    pub(crate) fn wire_size(&self) -> usize {
        self.definition.load().as_ref().map_or(0, |d| d.wire_size)
    }

    pub(crate) fn min_wire_size(&self) -> usize {
        self.definition.load().as_ref().map_or(1, |d| d.min_wire_size)
    }

    pub(crate) fn uses_classes(&self) -> bool {
        self.definition.load().as_ref().is_some_and(|d| d.uses_classes)
    }

    pub(crate) fn optional_format(&self) -> OptionalFormat {
        if self.variable_length() {
            OptionalFormat::FSize
        } else {
            OptionalFormat::VSize
        }
    }

    /// Shape check: a struct value holding every member.
    pub fn validate(&self, value: &Value) -> bool {
        let Value::Struct(fields) = value else {
            return false;
        };
        match self.definition.load().as_ref() {
            Some(def) => def
                .members
                .iter()
                .all(|m| fields.get(&m.name).is_some_and(|v| !v.is_unset())),
            None => false,
        }
    }

    pub(crate) fn marshal(
        &self,
        value: &Value,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
        as_optional: bool,
    ) -> Result<()> {
        let def = self.definition()?;
        let Value::Struct(fields) = value else {
            return Err(Error::validation(format!(
                "expected struct `{}` but got {}",
                self.id,
                value.kind_name()
            )));
        };
        if as_optional {
            if def.variable_length {
                let pos = os.start_size();
                marshal_members(&self.id, &def.members, &[], fields, os, graph)?;
                return os.end_size(pos);
            }
            os.write_size(def.wire_size)?;
        }
        marshal_members(&self.id, &def.members, &[], fields, os, graph)
    }

    pub(crate) fn unmarshal(
        &self,
        is: &mut InputStream<'_>,
        resolver: &mut PatchResolver<'_>,
        as_optional: bool,
    ) -> Result<Value> {
        let def = self.definition()?;
        if as_optional {
            if def.variable_length {
                is.skip(4)?;
            } else {
                is.skip_size()?;
            }
        }
        let mut fields = HashMap::with_capacity(def.members.len());
        unmarshal_members(&def.members, &[], is, resolver, &mut fields)?;
        Ok(Value::Struct(fields))
    }

    /// Drop the definition, breaking reference cycles through members.
    pub fn destroy(&self) {
        self.definition.store(None);
    }
}
