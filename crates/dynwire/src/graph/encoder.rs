// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write side of the object graph.

use super::SliceKind;
use crate::config::{
    FormatType, FIRST_INSTANCE_INDEX, FLAG_HAS_INDIRECTION_TABLE, FLAG_HAS_OPTIONAL_MEMBERS,
    FLAG_HAS_SLICE_SIZE, FLAG_HAS_TYPE_ID_COMPACT, FLAG_HAS_TYPE_ID_INDEX,
    FLAG_HAS_TYPE_ID_STRING, FLAG_IS_LAST_SLICE, INSTANCE_INLINE_MARKER, OPTIONAL_END_MARKER,
};
use crate::descriptor::marshal_members;
use crate::error::{Error, Result};
use crate::stream::{checked_size, OutputStream};
use crate::value::{ExceptionValue, ObjectRef, SliceInfo, Value};
use std::collections::HashMap;

#[derive(Debug)]
struct SliceWriter {
    flags: u8,
    flags_pos: usize,
    size_pos: Option<usize>,
    table: Vec<Value>,
    table_index: HashMap<usize, usize>,
}

/// Per-call write state: instance indices, type-id indices and the stack of
/// open slices.
#[derive(Debug)]
pub struct ObjectGraphTracker {
    format: FormatType,
    marshaled: HashMap<usize, usize>,
    next_index: usize,
    type_ids: HashMap<String, usize>,
    slices: Vec<SliceWriter>,
}

impl ObjectGraphTracker {
    pub fn new(format: FormatType) -> Self {
        Self {
            format,
            marshaled: HashMap::new(),
            next_index: FIRST_INSTANCE_INDEX as usize - 1,
            type_ids: HashMap::new(),
            slices: Vec::new(),
        }
    }

    pub fn format(&self) -> FormatType {
        self.format
    }

    /// Number of distinct instances written so far.
    pub fn instance_count(&self) -> usize {
        self.marshaled.len()
    }

    /// Record that the current slice carries optional members.
    pub(crate) fn mark_optional_members(&mut self) {
        if let Some(slice) = self.slices.last_mut() {
            slice.flags |= FLAG_HAS_OPTIONAL_MEMBERS;
        }
    }

    /// Write a class reference. Inside a slice in sliced format the
    /// reference goes through the slice's indirection table; elsewhere the
    /// instance is written inline the first time it is seen.
    pub(crate) fn write_reference(
        &mut self,
        os: &mut OutputStream,
        object: Option<&ObjectRef>,
    ) -> Result<()> {
        let Some(object) = object else {
            return os.write_size(0);
        };
        if self.format == FormatType::Sliced {
            if let Some(slice) = self.slices.last_mut() {
                let position = match slice.table_index.get(&object.identity()) {
                    Some(position) => *position,
                    None => {
                        slice.table.push(Value::Object(object.clone()));
                        let position = slice.table.len();
                        slice.table_index.insert(object.identity(), position);
                        position
                    }
                };
                return os.write_size(position);
            }
        }
        self.write_instance(os, object)
    }

    fn write_instance(&mut self, os: &mut OutputStream, object: &ObjectRef) -> Result<()> {
        if let Some(index) = self.marshaled.get(&object.identity()) {
            return os.write_size(*index);
        }
        self.next_index += 1;
        self.marshaled.insert(object.identity(), self.next_index);
        log::trace!(
            "[graph] instance {} of `{}`",
            self.next_index,
            object.type_id()
        );
        os.write_size(INSTANCE_INLINE_MARKER as usize)?;
        self.write_instance_body(os, object)
    }

    fn write_instance_body(&mut self, os: &mut OutputStream, object: &ObjectRef) -> Result<()> {
        let state = object.lock();
        let mut first = true;

        match (&state.sliced_data, self.format) {
            (Some(sliced), FormatType::Sliced) => {
                for info in &sliced.slices {
                    self.write_preserved(os, info, SliceKind::Value, first)?;
                    first = false;
                }
            }
            (Some(sliced), FormatType::Compact) if !sliced.is_empty() => {
                if object.class().is_none() {
                    return Err(Error::malformed(format!(
                        "instance of unknown type `{}` cannot be written in the compact format",
                        object.type_id()
                    )));
                }
                log::warn!(
                    "[slicing] dropping {} preserved slice(s) of `{}` in compact format",
                    sliced.slices.len(),
                    object.type_id()
                );
            }
            _ => {}
        }

        let Some(class) = object.class() else {
            if first {
                return Err(Error::malformed(format!(
                    "instance of unknown type `{}` has no slices",
                    object.type_id()
                )));
            }
            return Ok(());
        };
        for (level, def) in class.chain()? {
            self.start_slice(
                os,
                SliceKind::Value,
                level.id(),
                def.compact_id,
                first,
                def.base.is_none(),
            )?;
            first = false;
            def.marshal_members(level.id(), &state.members, os, self)?;
            self.end_slice(os)?;
        }
        Ok(())
    }

    /// Write a user exception: every slice sized, string type ids.
    pub(crate) fn write_exception(&mut self, os: &mut OutputStream, ex: &ExceptionValue) -> Result<()> {
        let mut first = true;
        if let Some(sliced) = &ex.sliced_data {
            for info in &sliced.slices {
                self.write_preserved(os, info, SliceKind::Exception, first)?;
                first = false;
            }
        }
        for (level, def) in ex.exception.chain()? {
            self.start_slice(os, SliceKind::Exception, level.id(), None, first, def.base.is_none())?;
            first = false;
            marshal_members(
                level.id(),
                &def.members,
                &def.optional_members,
                &ex.members,
                os,
                self,
            )?;
            self.end_slice(os)?;
        }
        Ok(())
    }

    /// Re-emit a preserved slice: fresh header, original body, original
    /// indirection table entries.
    fn write_preserved(
        &mut self,
        os: &mut OutputStream,
        info: &SliceInfo,
        kind: SliceKind,
        first: bool,
    ) -> Result<()> {
        self.start_slice(
            os,
            kind,
            &info.type_id,
            info.compact_id,
            first,
            info.is_last_slice,
        )?;
        os.write_blob(&info.bytes);
        if let Some(slice) = self.slices.last_mut() {
            if info.has_optional_members {
                slice.flags |= FLAG_HAS_OPTIONAL_MEMBERS;
            }
            slice.table.extend(info.instances.iter().cloned());
        }
        self.end_slice(os)
    }

    fn start_slice(
        &mut self,
        os: &mut OutputStream,
        kind: SliceKind,
        type_id: &str,
        compact_id: Option<i32>,
        first: bool,
        last: bool,
    ) -> Result<()> {
        let flags_pos = os.pos();
        os.write_u8(0);

        let sized = kind == SliceKind::Exception || self.format == FormatType::Sliced;
        let mut flags = 0u8;
        if sized {
            flags |= FLAG_HAS_SLICE_SIZE;
        }
        if last {
            flags |= FLAG_IS_LAST_SLICE;
        }

        match kind {
            SliceKind::Exception => os.write_string(type_id)?,
            SliceKind::Value if sized || first => {
                if let Some(compact_id) = compact_id {
                    flags |= FLAG_HAS_TYPE_ID_COMPACT;
                    os.write_size(compact_id as usize)?;
                } else if let Some(index) = self.type_ids.get(type_id) {
                    flags |= FLAG_HAS_TYPE_ID_INDEX;
                    os.write_size(*index)?;
                } else {
                    self.type_ids
                        .insert(type_id.to_string(), self.type_ids.len() + 1);
                    flags |= FLAG_HAS_TYPE_ID_STRING;
                    os.write_string(type_id)?;
                }
            }
            SliceKind::Value => {}
        }

        let size_pos = sized.then(|| os.start_size());
        self.slices.push(SliceWriter {
            flags,
            flags_pos,
            size_pos,
            table: Vec::new(),
            table_index: HashMap::new(),
        });
        Ok(())
    }

    fn end_slice(&mut self, os: &mut OutputStream) -> Result<()> {
        let mut slice = self
            .slices
            .pop()
            .ok_or_else(|| Error::malformed("end_slice without start_slice"))?;

        if slice.flags & FLAG_HAS_OPTIONAL_MEMBERS != 0 {
            os.write_u8(OPTIONAL_END_MARKER);
        }
        // The slice size counts its own four bytes.
        if let Some(size_pos) = slice.size_pos {
            os.rewrite_i32(checked_size(os.pos() - size_pos)?, size_pos);
        }
        if !slice.table.is_empty() {
            slice.flags |= FLAG_HAS_INDIRECTION_TABLE;
            os.write_size(slice.table.len())?;
            for entry in &slice.table {
                match entry {
                    Value::Object(object) => self.write_instance(os, object)?,
                    _ => os.write_size(0)?,
                }
            }
        }
        os.rewrite_u8(slice.flags, slice.flags_pos);
        Ok(())
    }
}
