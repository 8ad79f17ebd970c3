// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequences and their container mappings.
//!
//! The wire form is always `size(count)` followed by the elements; the
//! mapping only decides what container the decoder builds. A primitive
//! sequence mapped to an array is read and written in bulk.

use super::{MemberMetadata, PrimitiveKind, TypeDescriptor};
use crate::error::{Error, HostError, MarshalError, Result};
use crate::graph::{ObjectGraphTracker, PatchResolver, PathStep};
use crate::stream::{InputStream, OptionalFormat, OutputStream};
use crate::value::{PrimitiveArray, Value};
use bytemuck::Pod;
use std::fmt;
use std::sync::Arc;

/// Host callback building a custom container from decoded elements.
pub trait SequenceFactory: Send + Sync {
    fn create(&self, elements: Vec<Value>) -> std::result::Result<Value, HostError>;
}

impl<F> SequenceFactory for F
where
    F: Fn(Vec<Value>) -> std::result::Result<Value, HostError> + Send + Sync,
{
    fn create(&self, elements: Vec<Value>) -> std::result::Result<Value, HostError> {
        self(elements)
    }
}

/// Container produced when unmarshaling a sequence.
#[derive(Clone, Default)]
pub enum SequenceMapping {
    /// `Value::Sequence`.
    #[default]
    List,
    /// `Value::Tuple`.
    Tuple,
    /// `Value::Array`; primitive (non-string) elements only.
    Array,
    Custom(Arc<dyn SequenceFactory>),
}

impl fmt::Debug for SequenceMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("List"),
            Self::Tuple => f.write_str("Tuple"),
            Self::Array => f.write_str("Array"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Byte estimate written ahead of a fixed-size-element sequence used as an
/// optional member.
pub(crate) fn optional_size_estimate(count: usize, element_size: usize) -> usize {
    if count == 0 {
        1
    } else {
        count * element_size + if count > 254 { 5 } else { 1 }
    }
}

/// Sequence type.
pub struct SequenceDescriptor {
    id: String,
    element: TypeDescriptor,
    mapping: SequenceMapping,
}

impl fmt::Debug for SequenceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceDescriptor")
            .field("id", &self.id)
            .field("element", &self.element.id())
            .field("mapping", &self.mapping)
            .finish()
    }
}

impl SequenceDescriptor {
    pub fn new(id: impl Into<String>, element: TypeDescriptor) -> Self {
        Self {
            id: id.into(),
            element,
            mapping: SequenceMapping::default(),
        }
    }

    /// Default mapping, overridden per member by [`MemberMetadata`].
    pub fn with_mapping(mut self, mapping: SequenceMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> &TypeDescriptor {
        &self.element
    }

    pub(crate) fn uses_classes(&self) -> bool {
        self.element.uses_classes()
    }

    pub(crate) fn optional_format(&self) -> OptionalFormat {
        if self.element.variable_length() {
            OptionalFormat::FSize
        } else {
            OptionalFormat::VSize
        }
    }

    /// One-byte elements: the element count is already the payload length,
    /// so the VSize prefix is the count itself.
    fn count_is_byte_length(&self) -> bool {
        !self.element.variable_length() && self.element.wire_size() == 1
    }

    fn primitive_element(&self) -> Option<PrimitiveKind> {
        match self.element {
            TypeDescriptor::Primitive(kind) if kind != PrimitiveKind::String => Some(kind),
            _ => None,
        }
    }

    /// Shape check. Elements are checked as they are written.
    pub fn validate(&self, value: &Value) -> bool {
        match value {
            Value::Sequence(_) | Value::Tuple(_) => true,
            Value::Array(_) => self.primitive_element().is_some(),
            _ => false,
        }
    }

    pub(crate) fn marshal(
        &self,
        value: &Value,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
        as_optional: bool,
    ) -> Result<()> {
        match value {
            Value::Sequence(items) | Value::Tuple(items) => {
                let bracket = self.start_optional(os, as_optional, items.len())?;
                os.write_size(items.len())?;
                for (i, item) in items.iter().enumerate() {
                    if !self.element.validate(item) {
                        return Err(Error::validation(format!(
                            "invalid value for element {i} of `{}`: {}",
                            self.id,
                            item.kind_name()
                        )));
                    }
                    self.element.marshal(item, os, graph, false, None)?;
                }
                end_optional(os, bracket)
            }
            Value::Array(array) => self.marshal_array(array, os, as_optional),
            other => Err(Error::validation(format!(
                "expected sequence `{}` but got {}",
                self.id,
                other.kind_name()
            ))),
        }
    }

    fn start_optional(
        &self,
        os: &mut OutputStream,
        as_optional: bool,
        count: usize,
    ) -> Result<Option<usize>> {
        if !as_optional {
            return Ok(None);
        }
        match self.optional_format() {
            OptionalFormat::FSize => Ok(Some(os.start_size())),
            OptionalFormat::VSize if !self.count_is_byte_length() => {
                os.write_size(optional_size_estimate(count, self.element.wire_size()))?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn marshal_array(
        &self,
        array: &PrimitiveArray,
        os: &mut OutputStream,
        as_optional: bool,
    ) -> Result<()> {
        let kind = self.primitive_element().ok_or_else(|| MarshalError::UnexpectedType {
            expected: self.element.id().to_string(),
            actual: "primitive array".to_string(),
        })?;
        if array.kind() != kind {
            return Err(MarshalError::UnexpectedType {
                expected: kind.id().to_string(),
                actual: array.kind().id().to_string(),
            }
            .into());
        }
        let bracket = self.start_optional(os, as_optional, array.len())?;
        os.write_size(array.len())?;
        match array {
            PrimitiveArray::Bool(v) => v.iter().for_each(|b| os.write_bool(*b)),
            PrimitiveArray::Byte(v) => os.write_blob(v),
            PrimitiveArray::Short(v) => write_pod(os, v, OutputStream::write_i16),
            PrimitiveArray::Int(v) => write_pod(os, v, OutputStream::write_i32),
            PrimitiveArray::Long(v) => write_pod(os, v, OutputStream::write_i64),
            PrimitiveArray::Float(v) => write_pod(os, v, OutputStream::write_f32),
            PrimitiveArray::Double(v) => write_pod(os, v, OutputStream::write_f64),
        }
        end_optional(os, bracket)
    }

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
                OptionalFormat::VSize if !self.count_is_byte_length() => is.skip_size()?,
                _ => {}
            }
        }
        let mapping = meta
            .and_then(MemberMetadata::sequence_mapping)
            .unwrap_or(&self.mapping);
        let count = is.read_and_check_seq_size(
            self.element.min_wire_size(),
            resolver.config().max_sequence_length,
        )?;

        if matches!(mapping, SequenceMapping::Array) {
            return self.unmarshal_array(is, count);
        }

        let mut items = Vec::with_capacity(count);
        if let TypeDescriptor::Primitive(kind) = self.element {
            for _ in 0..count {
                items.push(kind.unmarshal(is)?);
            }
        } else {
            for i in 0..count {
                resolver.enter(PathStep::Index(i));
                let item = self.element.unmarshal(is, resolver, false, None);
                resolver.leave();
                items.push(item?);
            }
        }

        match mapping {
            SequenceMapping::Tuple => Ok(Value::Tuple(items)),
            SequenceMapping::Custom(factory) => Ok(factory.create(items)?),
            SequenceMapping::List | SequenceMapping::Array => Ok(Value::Sequence(items)),
        }
    }

    fn unmarshal_array(&self, is: &mut InputStream<'_>, count: usize) -> Result<Value> {
        let kind = self.primitive_element().ok_or_else(|| MarshalError::UnexpectedType {
            expected: "primitive element".to_string(),
            actual: self.element.id().to_string(),
        })?;
        let size = kind.size().unwrap_or(1);
        let bytes = is.read_bytes(count * size)?;
        let array = match kind {
            PrimitiveKind::Bool => PrimitiveArray::Bool(bytes.iter().map(|b| *b != 0).collect()),
            PrimitiveKind::Byte => PrimitiveArray::Byte(bytes.to_vec()),
            PrimitiveKind::Short => PrimitiveArray::Short(read_pod(bytes, i16::from_le_bytes)),
            PrimitiveKind::Int => PrimitiveArray::Int(read_pod(bytes, i32::from_le_bytes)),
            PrimitiveKind::Long => PrimitiveArray::Long(read_pod(bytes, i64::from_le_bytes)),
            PrimitiveKind::Float => PrimitiveArray::Float(read_pod(bytes, f32::from_le_bytes)),
            PrimitiveKind::Double => PrimitiveArray::Double(read_pod(bytes, f64::from_le_bytes)),
            PrimitiveKind::String => {
                return Err(Error::malformed("string elements cannot map to an array"))
            }
        };
        Ok(Value::Array(array))
    }
}

fn end_optional(os: &mut OutputStream, bracket: Option<usize>) -> Result<()> {
    match bracket {
        Some(pos) => os.end_size(pos),
        None => Ok(()),
    }
}

/// Bulk copy on little-endian hosts, element-wise otherwise.
fn write_pod<T: Pod>(os: &mut OutputStream, items: &[T], write: fn(&mut OutputStream, T)) {
    if cfg!(target_endian = "little") {
        os.write_blob(bytemuck::cast_slice(items));
    } else {
        for item in items {
            write(os, *item);
        }
    }
}

fn read_pod<T: Pod, const N: usize>(bytes: &[u8], from_le: fn([u8; N]) -> T) -> Vec<T> {
    let mut out = vec![T::zeroed(); bytes.len() / N];
    if cfg!(target_endian = "little") {
        bytemuck::cast_slice_mut::<T, u8>(&mut out).copy_from_slice(bytes);
    } else {
        for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(N)) {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            *slot = from_le(raw);
        }
    }
    out
}
