// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Polymorphic classes ("values").
//!
//! A class descriptor only describes one level of the hierarchy; encoding an
//! instance walks the base chain from most-derived to base, one slice per
//! level. Slice framing, instance indices and indirection tables are owned by
//! [`crate::graph`]; this module supplies the per-level members.

use super::member::{marshal_members, sort_by_tag, unmarshal_members};
use super::DataMember;
use crate::config::ROOT_CLASS_ID;
use crate::error::{Error, MarshalError, Result};
use crate::graph::{ObjectGraphTracker, PatchResolver};
use crate::stream::{InputStream, OutputStream};
use crate::value::{ObjectRef, Value};
use arc_swap::ArcSwapOption;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shape of a defined class level.
#[derive(Debug)]
pub struct ClassDefinition {
    pub compact_id: Option<i32>,
    pub base: Option<Arc<ClassDescriptor>>,
    /// Required members in declaration order.
    pub members: Vec<DataMember>,
    /// Optional members sorted by tag.
    pub optional_members: Vec<DataMember>,
}

/// Class type. Declared first, defined once its members are known.
pub struct ClassDescriptor {
    id: String,
    definition: ArcSwapOption<ClassDefinition>,
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("defined", &self.is_defined())
            .finish()
    }
}

impl ClassDescriptor {
    pub fn declared(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            definition: ArcSwapOption::empty(),
        }
    }

    /// Root of every hierarchy; accepts any instance.
    pub(crate) fn root() -> Self {
        let root = Self::declared(ROOT_CLASS_ID);
        root.definition.store(Some(Arc::new(ClassDefinition {
            compact_id: None,
            base: None,
            members: Vec::new(),
            optional_members: Vec::new(),
        })));
        root
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_CLASS_ID
    }

    pub fn is_defined(&self) -> bool {
        self.definition.load().is_some()
    }

    pub(crate) fn define(
        &self,
        compact_id: Option<i32>,
        base: Option<Arc<ClassDescriptor>>,
        members: Vec<DataMember>,
    ) -> Result<()> {
        if self.is_defined() {
            return Err(Error::configuration(format!(
                "class `{}` is already defined",
                self.id
            )));
        }
        let base = base.filter(|b| !b.is_root());
        let (optional, required): (Vec<_>, Vec<_>) = members.into_iter().partition(|m| m.optional);
        let optional_members = sort_by_tag(&self.id, optional)?;
        self.definition.store(Some(Arc::new(ClassDefinition {
            compact_id,
            base,
            members: required,
            optional_members,
        })));
        Ok(())
    }

    pub fn definition(&self) -> Result<Arc<ClassDefinition>> {
        self.definition.load_full().ok_or_else(|| {
            Error::configuration(format!("class `{}` is declared but not defined", self.id))
        })
    }

    pub fn compact_id(&self) -> Option<i32> {
        self.definition.load().as_ref().and_then(|d| d.compact_id)
    }

    pub fn base(&self) -> Option<Arc<ClassDescriptor>> {
        self.definition.load().as_ref().and_then(|d| d.base.clone())
    }

    /// `true` if `self` is `type_id` or derives from it.
    pub fn is_a(&self, type_id: &str) -> bool {
        if type_id == ROOT_CLASS_ID || self.id == type_id {
            return true;
        }
        let mut level = self.base();
        while let Some(class) = level {
            if class.id == type_id {
                return true;
            }
            level = class.base();
        }
        false
    }

    /// `true` if `object` may be stored where `self` is expected.
    pub fn accepts(&self, object: &ObjectRef) -> bool {
        if self.is_root() {
            return true;
        }
        object.class().is_some_and(|class| class.is_a(&self.id))
    }

    /// Levels from `self` to the base, each with its definition.
    pub(crate) fn chain(self: &Arc<Self>) -> Result<Vec<(Arc<ClassDescriptor>, Arc<ClassDefinition>)>> {
        let mut levels = Vec::new();
        let mut level = Some(self.clone());
        while let Some(class) = level {
            let def = class.definition()?;
            level = def.base.clone();
            levels.push((class, def));
        }
        Ok(levels)
    }

    pub fn validate(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Object(object) => self.accepts(object),
            _ => false,
        }
    }

    /// Write a reference to an instance; the instance itself is written by
    /// the graph tracker the first time it is seen.
    pub(crate) fn marshal(
        &self,
        value: &Value,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
    ) -> Result<()> {
        match value {
            Value::Null => graph.write_reference(os, None),
            Value::Object(object) if self.accepts(object) => graph.write_reference(os, Some(object)),
            Value::Object(object) => Err(Error::validation(format!(
                "instance of `{}` is not a `{}`",
                object.type_id(),
                self.id
            ))),
            other => Err(Error::validation(format!(
                "expected class `{}` but got {}",
                self.id,
                other.kind_name()
            ))),
        }
    }

    /// Read a reference. Inside a slice with an indirection table the
    /// reference is deferred: a `Value::Null` placeholder is returned and the
    /// resolver patches the real instance in when the table has been read.
    pub(crate) fn unmarshal(
        self: &Arc<Self>,
        is: &mut InputStream<'_>,
        resolver: &mut PatchResolver<'_>,
    ) -> Result<Value> {
        let index = is.read_size()?;
        if index == 0 {
            return Ok(Value::Null);
        }
        if resolver.in_indirect_slice() {
            resolver.defer(index - 1, self.clone())?;
            return Ok(Value::Null);
        }
        let object = resolver.read_instance(is, index)?;
        if !self.accepts(&object) {
            return Err(MarshalError::UnexpectedType {
                expected: self.id.clone(),
                actual: object.type_id().to_string(),
            }
            .into());
        }
        Ok(Value::Object(object))
    }

    /// Drop the definition, breaking cycles through bases and members.
    pub fn destroy(&self) {
        if !self.is_root() {
            self.definition.store(None);
        }
    }
}

impl ClassDefinition {
    pub(crate) fn marshal_members(
        &self,
        owner: &str,
        values: &HashMap<String, Value>,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
    ) -> Result<()> {
        marshal_members(owner, &self.members, &self.optional_members, values, os, graph)
    }

    pub(crate) fn unmarshal_members(
        &self,
        is: &mut InputStream<'_>,
        resolver: &mut PatchResolver<'_>,
        into: &mut HashMap<String, Value>,
    ) -> Result<()> {
        unmarshal_members(&self.members, &self.optional_members, is, resolver, into)
    }
}
