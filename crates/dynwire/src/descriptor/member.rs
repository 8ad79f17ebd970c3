// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data members and the shared member marshaling rules.
//!
//! Required members are written in declaration order with no header.
//! Optional members follow, sorted by tag, each behind an optional header
//! so that a decoder unaware of the tag can skip it.

use super::{DictionaryMapping, SequenceMapping, TypeDescriptor};
use crate::error::{Error, MarshalError, Result};
use crate::graph::{ObjectGraphTracker, PatchResolver, PathStep};
use crate::stream::{InputStream, OptionalFormat, OutputStream};
use crate::value::Value;
use std::collections::HashMap;

/// Per-member directives that do not change the wire bytes, only the shape
/// of the unmarshaled container.
#[derive(Debug, Clone, Default)]
pub struct MemberMetadata {
    sequence: Option<SequenceMapping>,
    dictionary: Option<DictionaryMapping>,
}

impl MemberMetadata {
    /// Parse `mapping:list`, `mapping:tuple` and `mapping:array` directives.
    /// Other directives are ignored.
    pub fn from_directives<I, S>(directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut meta = Self::default();
        for directive in directives {
            match directive.as_ref() {
                "mapping:list" => meta.sequence = Some(SequenceMapping::List),
                "mapping:tuple" => meta.sequence = Some(SequenceMapping::Tuple),
                "mapping:array" => meta.sequence = Some(SequenceMapping::Array),
                other => log::debug!("[metadata] ignoring directive `{}`", other),
            }
        }
        meta
    }

    pub fn with_sequence_mapping(mut self, mapping: SequenceMapping) -> Self {
        self.sequence = Some(mapping);
        self
    }

    pub fn with_dictionary_mapping(mut self, mapping: DictionaryMapping) -> Self {
        self.dictionary = Some(mapping);
        self
    }

    pub fn sequence_mapping(&self) -> Option<&SequenceMapping> {
        self.sequence.as_ref()
    }

    pub fn dictionary_mapping(&self) -> Option<&DictionaryMapping> {
        self.dictionary.as_ref()
    }
}

/// A member of a struct, class or exception, or an operation parameter.
#[derive(Debug, Clone)]
pub struct DataMember {
    pub name: String,
    pub ty: TypeDescriptor,
    pub optional: bool,
    /// Tag of an optional member (ignored for required ones).
    pub tag: i32,
    pub metadata: MemberMetadata,
}

impl DataMember {
    /// Required member.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            tag: 0,
            metadata: MemberMetadata::default(),
        }
    }

    /// Optional member with a tag.
    pub fn tagged(name: impl Into<String>, ty: TypeDescriptor, tag: i32) -> Self {
        Self {
            optional: true,
            tag,
            ..Self::new(name, ty)
        }
    }

    pub fn with_metadata(mut self, metadata: MemberMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validate then write one value of this member. For optional members
    /// the header is written by the caller.
    pub(crate) fn marshal_value(
        &self,
        value: &Value,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
        as_optional: bool,
    ) -> Result<()> {
        if !self.ty.validate(value) {
            return Err(Error::validation(format!(
                "invalid value for member `{}` of type `{}`: {}",
                self.name,
                self.ty.id(),
                value.kind_name()
            )));
        }
        self.ty
            .marshal(value, os, graph, as_optional, Some(&self.metadata))
    }

    /// Write an optional member if it is present.
    pub(crate) fn marshal_optional(
        &self,
        value: Option<&Value>,
        os: &mut OutputStream,
        graph: &mut ObjectGraphTracker,
    ) -> Result<()> {
        match value {
            None | Some(Value::Unset) => Ok(()),
            Some(value) => {
                os.write_optional_header(self.tag, self.ty.optional_format())?;
                graph.mark_optional_members();
                self.marshal_value(value, os, graph, true)
            }
        }
    }

    /// Read one value of this member, tracking the member name as the patch
    /// site for deferred class references.
    pub(crate) fn unmarshal_value(
        &self,
        is: &mut InputStream<'_>,
        resolver: &mut PatchResolver<'_>,
        as_optional: bool,
    ) -> Result<Value> {
        resolver.enter(PathStep::Member(self.name.clone()));
        let value = self
            .ty
            .unmarshal(is, resolver, as_optional, Some(&self.metadata));
        resolver.leave();
        value
    }

    /// Read an optional member, or `Value::Unset` when it is absent.
    pub(crate) fn unmarshal_optional(
        &self,
        is: &mut InputStream<'_>,
        resolver: &mut PatchResolver<'_>,
    ) -> Result<Value> {
        if read_optional(is, resolver, self.tag, self.ty.optional_format())? {
            self.unmarshal_value(is, resolver, true)
        } else {
            Ok(Value::Unset)
        }
    }
}

/// Sort optional members by tag and reject duplicates.
pub(crate) fn sort_by_tag(owner: &str, mut members: Vec<DataMember>) -> Result<Vec<DataMember>> {
    members.sort_by_key(|m| m.tag);
    for pair in members.windows(2) {
        if pair[0].tag == pair[1].tag {
            return Err(Error::configuration(format!(
                "`{owner}`: members `{}` and `{}` share tag {}",
                pair[0].name, pair[1].name, pair[0].tag
            )));
        }
    }
    if let Some(m) = members.iter().find(|m| m.tag < 0) {
        return Err(Error::configuration(format!(
            "`{owner}`: member `{}` has negative tag {}",
            m.name, m.tag
        )));
    }
    Ok(members)
}

/// Write the members of one slice (or struct) from a member map.
pub(crate) fn marshal_members(
    owner: &str,
    required: &[DataMember],
    optional: &[DataMember],
    values: &HashMap<String, Value>,
    os: &mut OutputStream,
    graph: &mut ObjectGraphTracker,
) -> Result<()> {
    for member in required {
        let value = values.get(&member.name).ok_or_else(|| {
            Error::validation(format!("`{owner}`: missing member `{}`", member.name))
        })?;
        member.marshal_value(value, os, graph, false)?;
    }
    for member in optional {
        member.marshal_optional(values.get(&member.name), os, graph)?;
    }
    Ok(())
}

/// Read the members of one slice into `into`. Optional members absent from
/// the wire are stored as `Value::Unset`.
pub(crate) fn unmarshal_members(
    required: &[DataMember],
    optional: &[DataMember],
    is: &mut InputStream<'_>,
    resolver: &mut PatchResolver<'_>,
    into: &mut HashMap<String, Value>,
) -> Result<()> {
    for member in required {
        let value = member.unmarshal_value(is, resolver, false)?;
        into.insert(member.name.clone(), value);
    }
    let has_optionals = resolver.slice_has_optional_members();
    for member in optional {
        let value = if has_optionals {
            member.unmarshal_optional(is, resolver)?
        } else {
            Value::Unset
        };
        into.insert(member.name.clone(), value);
    }
    Ok(())
}

/// Position the stream on the payload of optional `tag`, skipping unknown
/// lower tags. Returns `false`, with the stream left on the next header, when
/// the tag is absent.
pub(crate) fn read_optional(
    is: &mut InputStream<'_>,
    resolver: &mut PatchResolver<'_>,
    tag: i32,
    expected: OptionalFormat,
) -> Result<bool> {
    loop {
        let Some((found, format, start)) = is.read_optional_header()? else {
            return Ok(false);
        };
        if found > tag {
            is.rewind(start);
            return Ok(false);
        }
        if found < tag {
            log::debug!("[optional] skipping unknown tag {}", found);
            skip_optional(is, resolver, format)?;
            continue;
        }
        if format != expected {
            return Err(MarshalError::InvalidOptional {
                tag,
                reason: format!("expected format {expected:?}, found {format:?}"),
            }
            .into());
        }
        return Ok(true);
    }
}

/// Skip one optional payload. Class payloads are decoded and discarded so
/// that instance indices stay in step with the sender.
pub(crate) fn skip_optional(
    is: &mut InputStream<'_>,
    resolver: &mut PatchResolver<'_>,
    format: OptionalFormat,
) -> Result<()> {
    if format == OptionalFormat::Class {
        let root = TypeDescriptor::Class(resolver.registry().root_class());
        resolver.enter(PathStep::Discard);
        let result = root.unmarshal(is, resolver, true, None);
        resolver.leave();
        result.map(|_| ())
    } else {
        is.skip_optional_payload(format)
    }
}

/// Skip every remaining optional member up to the end marker or the end of
/// the encapsulation.
pub(crate) fn skip_remaining_optionals(
    is: &mut InputStream<'_>,
    resolver: &mut PatchResolver<'_>,
) -> Result<()> {
    while let Some((tag, format, _)) = is.read_optional_header()? {
        log::debug!("[optional] skipping unknown tag {}", tag);
        skip_optional(is, resolver, format)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PrimitiveKind;

    #[test]
    fn test_directives() {
        let meta = MemberMetadata::from_directives(["mapping:tuple", "python:foo"]);
        assert!(matches!(meta.sequence_mapping(), Some(SequenceMapping::Tuple)));
        assert!(meta.dictionary_mapping().is_none());
    }

    #[test]
    fn test_sort_by_tag() {
        let int = TypeDescriptor::Primitive(PrimitiveKind::Int);
        let sorted = sort_by_tag(
            "::T",
            vec![
                DataMember::tagged("b", int.clone(), 7),
                DataMember::tagged("a", int.clone(), 2),
            ],
        )
        .expect("distinct tags");
        assert_eq!(sorted[0].name, "a");

        let dup = sort_by_tag(
            "::T",
            vec![
                DataMember::tagged("a", int.clone(), 1),
                DataMember::tagged("b", int, 1),
            ],
        );
        assert!(matches!(dup, Err(Error::Configuration(_))));
    }
}
