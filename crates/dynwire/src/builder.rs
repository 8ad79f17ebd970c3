// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API over [`SchemaRegistry`].

use crate::descriptor::{
    ClassDescriptor, DataMember, ExceptionDescriptor, MemberMetadata, TypeDescriptor,
};
use crate::error::Result;
use crate::registry::SchemaRegistry;
use std::sync::Arc;

/// Builder for struct types.
#[derive(Debug)]
pub struct StructBuilder<'r> {
    registry: &'r SchemaRegistry,
    id: String,
    members: Vec<DataMember>,
}

impl<'r> StructBuilder<'r> {
    pub fn new(registry: &'r SchemaRegistry, id: impl Into<String>) -> Self {
        Self {
            registry,
            id: id.into(),
            members: Vec::new(),
        }
    }

    /// Add a member.
    pub fn member(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.members.push(DataMember::new(name, ty.into()));
        self
    }

    /// Add a member with container-mapping metadata.
    pub fn member_with_metadata(
        mut self,
        name: impl Into<String>,
        ty: impl Into<TypeDescriptor>,
        metadata: MemberMetadata,
    ) -> Self {
        self.members
            .push(DataMember::new(name, ty.into()).with_metadata(metadata));
        self
    }

    /// Define the struct in the registry.
    pub fn define(self) -> Result<TypeDescriptor> {
        self.registry.define_struct(&self.id, self.members)
    }
}

/// Builder for class types.
#[derive(Debug)]
pub struct ClassBuilder<'r> {
    registry: &'r SchemaRegistry,
    id: String,
    compact_id: Option<i32>,
    base: Option<Arc<ClassDescriptor>>,
    members: Vec<DataMember>,
}

impl<'r> ClassBuilder<'r> {
    pub fn new(registry: &'r SchemaRegistry, id: impl Into<String>) -> Self {
        Self {
            registry,
            id: id.into(),
            compact_id: None,
            base: None,
            members: Vec::new(),
        }
    }

    pub fn compact_id(mut self, compact_id: i32) -> Self {
        self.compact_id = Some(compact_id);
        self
    }

    pub fn base(mut self, base: Arc<ClassDescriptor>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn member(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.members.push(DataMember::new(name, ty.into()));
        self
    }

    /// Add an optional member with `tag`.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        ty: impl Into<TypeDescriptor>,
        tag: i32,
    ) -> Self {
        self.members.push(DataMember::tagged(name, ty.into(), tag));
        self
    }

    /// Add a fully described member.
    pub fn data_member(mut self, member: DataMember) -> Self {
        self.members.push(member);
        self
    }

    /// Define the class, completing an earlier declaration if there is one.
    pub fn define(self) -> Result<Arc<ClassDescriptor>> {
        match self
            .registry
            .define_class(&self.id, self.compact_id, self.base, self.members)?
        {
            TypeDescriptor::Class(class) => Ok(class),
            other => Err(crate::error::Error::configuration(format!(
                "`{}` is not a class",
                other.id()
            ))),
        }
    }
}

/// Builder for exception types.
#[derive(Debug)]
pub struct ExceptionBuilder<'r> {
    registry: &'r SchemaRegistry,
    id: String,
    base: Option<Arc<ExceptionDescriptor>>,
    members: Vec<DataMember>,
}

impl<'r> ExceptionBuilder<'r> {
    pub fn new(registry: &'r SchemaRegistry, id: impl Into<String>) -> Self {
        Self {
            registry,
            id: id.into(),
            base: None,
            members: Vec::new(),
        }
    }

    pub fn base(mut self, base: Arc<ExceptionDescriptor>) -> Self {
        self.base = Some(base);
        self
    }

    pub fn member(mut self, name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        self.members.push(DataMember::new(name, ty.into()));
        self
    }

    pub fn optional(
        mut self,
        name: impl Into<String>,
        ty: impl Into<TypeDescriptor>,
        tag: i32,
    ) -> Self {
        self.members.push(DataMember::tagged(name, ty.into(), tag));
        self
    }

    pub fn define(self) -> Result<Arc<ExceptionDescriptor>> {
        self.registry
            .define_exception(&self.id, self.base, self.members)
    }
}

/// Builder for enum types.
#[derive(Debug)]
pub struct EnumBuilder<'r> {
    registry: &'r SchemaRegistry,
    id: String,
    enumerators: Vec<(String, i32)>,
    next_value: i32,
}

impl<'r> EnumBuilder<'r> {
    pub fn new(registry: &'r SchemaRegistry, id: impl Into<String>) -> Self {
        Self {
            registry,
            id: id.into(),
            enumerators: Vec::new(),
            next_value: 0,
        }
    }

    /// Add an enumerator with auto-incrementing value.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.enumerators.push((name.into(), self.next_value));
        self.next_value = self.next_value.saturating_add(1);
        self
    }

    /// Add an enumerator with explicit value.
    pub fn variant_value(mut self, name: impl Into<String>, value: i32) -> Self {
        self.enumerators.push((name.into(), value));
        self.next_value = value.saturating_add(1);
        self
    }

    pub fn define(self) -> Result<TypeDescriptor> {
        self.registry.define_enum(&self.id, self.enumerators)
    }
}
