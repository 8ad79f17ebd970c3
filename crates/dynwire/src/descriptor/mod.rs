// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors.
//!
//! [`TypeDescriptor`] is a closed set of variants; every operation matches
//! exhaustively. Composite descriptors are shared through `Arc`. Structs,
//! classes and proxies can be declared before they are defined so that
//! schemas may be recursive; [`TypeDescriptor::destroy`] drops definitions to
//! break the resulting reference cycles.
//!
//! # Example
//!
//! ```rust
//! use dynwire::{Codec, SchemaRegistry, TypeDescriptor, PrimitiveKind, Value};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SchemaRegistry::new());
//! let point = registry
//!     .struct_builder("::Demo::Point")
//!     .member("x", TypeDescriptor::Primitive(PrimitiveKind::Int))
//!     .member("y", TypeDescriptor::Primitive(PrimitiveKind::Int))
//!     .define()
//!     .unwrap();
//!
//! let codec = Codec::new(registry);
//! let value = Value::structure([("x", Value::from(1)), ("y", Value::from(-1))]);
//! let bytes = codec.marshal(&point, &value).unwrap();
//! assert_eq!(codec.unmarshal(&point, &bytes).unwrap(), value);
//! ```

mod class;
mod dictionary;
mod enumeration;
mod exception;
mod member;
mod primitive;
mod proxy;
mod sequence;
mod structure;

pub use class::{ClassDefinition, ClassDescriptor};
pub use dictionary::{DictionaryDescriptor, DictionaryFactory, DictionaryMapping};
pub use enumeration::EnumDescriptor;
pub use exception::{ExceptionDefinition, ExceptionDescriptor};
pub use member::{DataMember, MemberMetadata};
pub use primitive::PrimitiveKind;
pub use proxy::{ProxyDefinition, ProxyDescriptor};
pub use sequence::{SequenceDescriptor, SequenceFactory, SequenceMapping};
pub use structure::{StructDefinition, StructDescriptor};

pub(crate) use member::{marshal_members, skip_remaining_optionals, unmarshal_members};

use crate::error::Result;
use crate::graph::{ObjectGraphTracker, PatchResolver};
use crate::stream::{InputStream, OptionalFormat, OutputStream};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A type descriptor.
#[derive(Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Enum(Arc<EnumDescriptor>),
    Struct(Arc<StructDescriptor>),
    Sequence(Arc<SequenceDescriptor>),
    Dictionary(Arc<DictionaryDescriptor>),
    Class(Arc<ClassDescriptor>),
    Proxy(Arc<ProxyDescriptor>),
}

// Descriptors may be cyclic: print the id only.
impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Primitive(_) => "Primitive",
            Self::Enum(_) => "Enum",
            Self::Struct(_) => "Struct",
            Self::Sequence(_) => "Sequence",
            Self::Dictionary(_) => "Dictionary",
            Self::Class(_) => "Class",
            Self::Proxy(_) => "Proxy",
        };
        write!(f, "{}({})", kind, self.id())
    }
}

impl From<PrimitiveKind> for TypeDescriptor {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl TypeDescriptor {
    /// Stable type identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Primitive(kind) => kind.id(),
            Self::Enum(d) => d.id(),
            Self::Struct(d) => d.id(),
            Self::Sequence(d) => d.id(),
            Self::Dictionary(d) => d.id(),
            Self::Class(d) => d.id(),
            Self::Proxy(d) => d.id(),
        }
    }

    /// `true` if the encoded size depends on the value.
    pub fn variable_length(&self) -> bool {
        match self {
            Self::Primitive(kind) => kind.size().is_none(),
            Self::Struct(d) => d.variable_length(),
            Self::Enum(_)
            | Self::Sequence(_)
            | Self::Dictionary(_)
            | Self::Class(_)
            | Self::Proxy(_) => true,
        }
    }

    /// Fixed encoded size. Only meaningful when `!variable_length()`.
    pub fn wire_size(&self) -> usize {
        match self {
            Self::Primitive(kind) => kind.size().unwrap_or(1),
            Self::Struct(d) => d.wire_size(),
            Self::Enum(_) | Self::Sequence(_) | Self::Dictionary(_) | Self::Class(_) => 1,
            Self::Proxy(_) => 2,
        }
    }

    /// Smallest possible encoding, used to sanity-check element counts.
    pub fn min_wire_size(&self) -> usize {
        match self {
            Self::Primitive(kind) => kind.min_wire_size(),
            Self::Struct(d) => d.min_wire_size(),
            Self::Enum(_) | Self::Sequence(_) | Self::Dictionary(_) | Self::Class(_) => 1,
            Self::Proxy(_) => 2,
        }
    }

    /// Format announced in the header of an optional member of this type.
    pub fn optional_format(&self) -> OptionalFormat {
        match self {
            Self::Primitive(kind) => kind.optional_format(),
            Self::Enum(_) => OptionalFormat::Size,
            Self::Struct(d) => d.optional_format(),
            Self::Sequence(d) => d.optional_format(),
            Self::Dictionary(d) => d.optional_format(),
            Self::Class(_) => OptionalFormat::Class,
            Self::Proxy(_) => OptionalFormat::FSize,
        }
    }

    /// `true` if the type transitively contains class references.
    pub fn uses_classes(&self) -> bool {
        match self {
            Self::Primitive(_) | Self::Enum(_) | Self::Proxy(_) => false,
            Self::Struct(d) => d.uses_classes(),
            Self::Sequence(d) => d.uses_classes(),
            Self::Dictionary(d) => d.uses_classes(),
            Self::Class(_) => true,
        }
    }

    /// Cheap shape and range check. Containers check their elements as they
    /// are written.
    pub fn validate(&self, value: &Value) -> bool {
        match self {
            Self::Primitive(kind) => kind.validate(value),
            Self::Enum(d) => d.validate(value),
            Self::Struct(d) => d.validate(value),
            Self::Sequence(d) => d.validate(value),
            Self::Dictionary(d) => d.validate(value),
            Self::Class(d) => d.validate(value),
            Self::Proxy(d) => d.validate(value),
        }
    }

    /// Write `value`. With `as_optional`, variable-length payloads get the
    /// size prefix their optional format requires.
    pub fn marshal(
        &self,
        value: &Value,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
        as_optional: bool,
        _meta: Option<&MemberMetadata>,
    ) -> Result<()> {
        match self {
            Self::Primitive(kind) => kind.marshal(value, os),
            Self::Enum(d) => d.marshal(value, os),
            Self::Struct(d) => d.marshal(value, os, graph, as_optional),
            Self::Sequence(d) => d.marshal(value, os, graph, as_optional),
            Self::Dictionary(d) => d.marshal(value, os, graph, as_optional),
            Self::Class(d) => d.marshal(value, os, graph),
            Self::Proxy(d) => d.marshal(value, os, as_optional),
        }
    }

    /// Read a value. Class references read inside an indirection-table slice
    /// come back as `Value::Null` placeholders that the resolver patches once
    /// the table is known.
    pub fn unmarshal(
        &self,
        is: &mut InputStream<'_>,
        resolver: &mut PatchResolver<'_>,
        as_optional: bool,
        meta: Option<&MemberMetadata>,
    ) -> Result<Value> {
        match self {
            Self::Primitive(kind) => kind.unmarshal(is),
            Self::Enum(d) => d.unmarshal(is),
            Self::Struct(d) => d.unmarshal(is, resolver, as_optional),
            Self::Sequence(d) => d.unmarshal(is, resolver, as_optional, meta),
            Self::Dictionary(d) => d.unmarshal(is, resolver, as_optional, meta),
            Self::Class(d) => d.unmarshal(is, resolver),
            Self::Proxy(d) => d.unmarshal(is, as_optional),
        }
    }

    /// Drop late definitions reachable from this descriptor. Idempotent.
    pub fn destroy(&self) {
        match self {
            Self::Struct(d) => d.destroy(),
            Self::Class(d) => d.destroy(),
            Self::Proxy(d) => d.destroy(),
            Self::Primitive(_) | Self::Enum(_) | Self::Sequence(_) | Self::Dictionary(_) => {}
        }
    }
}
