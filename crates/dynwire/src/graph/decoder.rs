// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read side of the object graph.

use super::SliceKind;
use crate::config::{
    EncodingConfig, FLAG_HAS_INDIRECTION_TABLE, FLAG_HAS_OPTIONAL_MEMBERS, FLAG_HAS_SLICE_SIZE,
    FLAG_HAS_TYPE_ID_COMPACT, FLAG_HAS_TYPE_ID_INDEX, FLAG_HAS_TYPE_ID_STRING,
    FLAG_IS_LAST_SLICE, INSTANCE_INLINE_MARKER, OPTIONAL_END_MARKER,
};
use crate::descriptor::{skip_remaining_optionals, unmarshal_members, ClassDescriptor};
use crate::error::{Error, MarshalError, Result};
use crate::registry::SchemaRegistry;
use crate::stream::InputStream;
use crate::value::{ExceptionValue, ObjectRef, SliceInfo, SlicedData, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One step from a slice's member map to the place a deferred reference
/// must be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Struct, class or exception member.
    Member(String),
    /// Sequence element.
    Index(usize),
    /// Dictionary entry value.
    Entry(usize),
    /// The value is read only to be skipped.
    Discard,
}

/// A reference read inside a slice with an indirection table.
#[derive(Debug)]
struct IndirectPatch {
    /// Zero-based position in the indirection table.
    index: usize,
    path: Vec<PathStep>,
    expected: Arc<ClassDescriptor>,
}

#[derive(Debug)]
struct SliceReader {
    flags: u8,
    type_id: String,
    compact_id: Option<i32>,
    size: Option<usize>,
    body_start: usize,
    site: Vec<PathStep>,
    patches: Vec<IndirectPatch>,
}

impl SliceReader {
    fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// A table reference to an instance whose slices were still being read
/// when the referring slice ended.
struct WaitingPatch {
    instance: usize,
    path: Vec<PathStep>,
    expected: Arc<ClassDescriptor>,
}

/// Where a waiting reference is stored once its instance is registered.
enum PendingSite {
    /// Member path inside an instance that has been read.
    Member {
        owner: ObjectRef,
        path: Vec<PathStep>,
        expected: Arc<ClassDescriptor>,
    },
    /// Table entry of a slice preserved on `owner`.
    Preserved {
        owner: ObjectRef,
        slice: usize,
        entry: usize,
    },
}

/// A skipped slice whose table entries are still instance indices.
struct PreservedSlice {
    info: SliceInfo,
    indices: Vec<usize>,
}

/// Per-call read state.
pub struct PatchResolver<'r> {
    registry: &'r SchemaRegistry,
    config: &'r EncodingConfig,
    instances: HashMap<usize, ObjectRef>,
    /// Indices assigned to instances whose slices are being read.
    reading: HashSet<usize>,
    /// References to those instances, keyed by index.
    pending: HashMap<usize, Vec<PendingSite>>,
    next_index: usize,
    type_ids: Vec<String>,
    slices: Vec<SliceReader>,
    depth: usize,
}

impl<'r> PatchResolver<'r> {
    pub fn new(registry: &'r SchemaRegistry, config: &'r EncodingConfig) -> Self {
        Self {
            registry,
            config,
            instances: HashMap::new(),
            reading: HashSet::new(),
            pending: HashMap::new(),
            next_index: INSTANCE_INLINE_MARKER as usize,
            type_ids: Vec::new(),
            slices: Vec::new(),
            depth: 0,
        }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    pub fn config(&self) -> &'r EncodingConfig {
        self.config
    }

    /// Number of instances decoded so far.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Descend into a member, element or entry of the value being read.
    pub fn enter(&mut self, step: PathStep) {
        if let Some(slice) = self.slices.last_mut() {
            slice.site.push(step);
        }
    }

    pub fn leave(&mut self) {
        if let Some(slice) = self.slices.last_mut() {
            slice.site.pop();
        }
    }

    /// Optional members can only follow inside a slice that announces them.
    /// Outside any slice (operation parameters) they run to the end of the
    /// encapsulation.
    pub(crate) fn slice_has_optional_members(&self) -> bool {
        self.slices
            .last()
            .map_or(true, |s| s.has(FLAG_HAS_OPTIONAL_MEMBERS))
    }

    pub(crate) fn in_indirect_slice(&self) -> bool {
        self.slices
            .last()
            .is_some_and(|s| s.has(FLAG_HAS_INDIRECTION_TABLE))
    }

    /// Register a reference to table entry `index`, to be stored at the
    /// current site once the table has been read.
    pub(crate) fn defer(&mut self, index: usize, expected: Arc<ClassDescriptor>) -> Result<()> {
        let slice = self
            .slices
            .last_mut()
            .ok_or_else(|| Error::malformed("indirect reference outside a slice"))?;
        slice.patches.push(IndirectPatch {
            index,
            path: slice.site.clone(),
            expected,
        });
        Ok(())
    }

    /// Resolve an instance reference: 1 reads a new instance, larger values
    /// name an instance already registered in this call.
    pub(crate) fn read_instance(&mut self, is: &mut InputStream<'_>, index: usize) -> Result<ObjectRef> {
        if index == INSTANCE_INLINE_MARKER as usize {
            return self.read_new_instance(is);
        }
        self.instances.get(&index).cloned().ok_or_else(|| {
            Error::malformed(format!("reference to unknown instance index {index}"))
        })
    }

    /// End-of-graph check.
    pub fn finish(&self) -> Result<()> {
        if !self.slices.is_empty() {
            return Err(Error::malformed(format!(
                "{} slice(s) left open at end of graph",
                self.slices.len()
            )));
        }
        if let Some(index) = self.pending.keys().min() {
            return Err(Error::malformed(format!(
                "references to instance index {index} were never resolved"
            )));
        }
        Ok(())
    }

    fn read_new_instance(&mut self, is: &mut InputStream<'_>) -> Result<ObjectRef> {
        self.depth += 1;
        if self.depth > self.config.class_graph_depth_max {
            return Err(
                MarshalError::ClassGraphDepthExceeded(self.config.class_graph_depth_max).into(),
            );
        }
        let result = self.read_instance_slices(is);
        self.depth -= 1;
        result
    }

    fn read_instance_slices(&mut self, is: &mut InputStream<'_>) -> Result<ObjectRef> {
        self.next_index += 1;
        let index = self.next_index;
        self.reading.insert(index);

        self.read_slice_header(is, SliceKind::Value)?;
        let most_derived = self.slice_type_id();
        let mut preserved = Vec::new();

        let found = loop {
            let type_id = self.slice_type_id();
            if let Some(found) = self.new_instance(type_id.as_deref())? {
                break Some(found);
            }
            let sized = self.slices.last().is_some_and(|s| s.size.is_some());
            if !sized {
                let name = type_id.unwrap_or_else(|| self.describe_compact_id());
                return Err(MarshalError::NoValueFactory(name).into());
            }
            log::debug!(
                "[slicing] preserving unknown slice `{}`",
                type_id.as_deref().unwrap_or("?")
            );
            let slice = self.skip_slice(is)?;
            let last = slice.info.is_last_slice;
            preserved.push(slice);
            if last {
                break None;
            }
            self.read_slice_header(is, SliceKind::Value)?;
        };

        let Some((object, class)) = found else {
            let type_id = most_derived.unwrap_or_default();
            log::debug!("[slicing] instance {} of unknown type `{}`", index, type_id);
            let object = ObjectRef::unknown(type_id, SlicedData::default());
            self.register(index, &object)?;
            self.attach_preserved(&object, preserved)?;
            return Ok(object);
        };

        self.register(index, &object)?;
        self.attach_preserved(&object, preserved)?;

        for (i, (level, def)) in class.chain()?.into_iter().enumerate() {
            if i > 0 {
                self.read_slice_header(is, SliceKind::Value)?;
                self.check_slice_type(level.id(), def.compact_id)?;
            }
            let last = self.slices.last().is_some_and(|s| s.has(FLAG_IS_LAST_SLICE));
            if last != def.base.is_none() {
                return Err(Error::malformed(format!(
                    "slice of `{}` has an inconsistent last-slice flag",
                    level.id()
                )));
            }
            let mut members = HashMap::new();
            def.unmarshal_members(is, self, &mut members)?;
            let waiting = self.end_slice(is, &mut members)?;
            object.lock().members.extend(members);
            for patch in waiting {
                self.wait_for(
                    patch.instance,
                    PendingSite::Member {
                        owner: object.clone(),
                        path: patch.path,
                        expected: patch.expected,
                    },
                );
            }
        }
        Ok(object)
    }

    /// Make `object` visible under `index` and store it wherever it was
    /// referenced while its slices were being read.
    fn register(&mut self, index: usize, object: &ObjectRef) -> Result<()> {
        self.reading.remove(&index);
        self.instances.insert(index, object.clone());
        for site in self.pending.remove(&index).unwrap_or_default() {
            match site {
                PendingSite::Member {
                    owner,
                    path,
                    expected,
                } => {
                    if !expected.accepts(object) {
                        return Err(MarshalError::UnexpectedType {
                            expected: expected.id().to_string(),
                            actual: object.type_id().to_string(),
                        }
                        .into());
                    }
                    apply_patch(&mut owner.lock().members, &path, Value::Object(object.clone()))?;
                }
                PendingSite::Preserved {
                    owner,
                    slice,
                    entry,
                } => {
                    let mut state = owner.lock();
                    let target = state
                        .sliced_data
                        .as_mut()
                        .and_then(|data| data.slices.get_mut(slice))
                        .and_then(|info| info.instances.get_mut(entry))
                        .ok_or_else(|| {
                            Error::malformed(format!("preserved table entry {slice}/{entry} missing"))
                        })?;
                    *target = Value::Object(object.clone());
                }
            }
        }
        Ok(())
    }

    fn wait_for(&mut self, index: usize, site: PendingSite) {
        log::trace!("[slicing] reference to instance {} deferred until it is read", index);
        self.pending.entry(index).or_default().push(site);
    }

    /// Attach skipped slices to `owner`; table entries naming instances
    /// still being read are filled in when those instances register.
    fn attach_preserved(&mut self, owner: &ObjectRef, preserved: Vec<PreservedSlice>) -> Result<()> {
        let (sliced, waiting) = self.resolve_preserved(preserved)?;
        if sliced.is_none() {
            return Ok(());
        }
        owner.set_sliced_data(sliced);
        for (slice, entry, index) in waiting {
            self.wait_for(
                index,
                PendingSite::Preserved {
                    owner: owner.clone(),
                    slice,
                    entry,
                },
            );
        }
        Ok(())
    }

    /// Read a user exception. Unknown most-derived slices are preserved; if
    /// no slice is known the exception is reported by its most-derived id.
    pub(crate) fn read_exception(&mut self, is: &mut InputStream<'_>) -> Result<ExceptionValue> {
        self.read_slice_header(is, SliceKind::Exception)?;
        let most_derived = self.slice_type_id().unwrap_or_default();
        let mut preserved = Vec::new();

        let exception = loop {
            let type_id = self.slice_type_id().unwrap_or_default();
            if let Some(ex) = self.registry.find_exception(&type_id) {
                break ex;
            }
            if !self.slices.last().is_some_and(|s| s.size.is_some()) {
                return Err(MarshalError::UnknownUserException(most_derived).into());
            }
            log::debug!("[slicing] preserving unknown exception slice `{}`", type_id);
            let slice = self.skip_slice(is)?;
            let last = slice.info.is_last_slice;
            preserved.push(slice);
            if last {
                return Err(MarshalError::UnknownUserException(most_derived).into());
            }
            self.read_slice_header(is, SliceKind::Exception)?;
        };

        let mut value = ExceptionValue::new(&exception);
        let (sliced, waiting) = self.resolve_preserved(preserved)?;
        if let Some(&(_, _, index)) = waiting.first() {
            return Err(incomplete_instance(index));
        }
        value.sliced_data = sliced;
        for (i, (level, def)) in exception.chain()?.into_iter().enumerate() {
            if i > 0 {
                self.read_slice_header(is, SliceKind::Exception)?;
                self.check_slice_type(level.id(), None)?;
            }
            unmarshal_members(
                &def.members,
                &def.optional_members,
                is,
                self,
                &mut value.members,
            )?;
            let waiting = self.end_slice(is, &mut value.members)?;
            if let Some(patch) = waiting.first() {
                return Err(incomplete_instance(patch.instance));
            }
        }
        Ok(value)
    }

    /// Instance for a slice type: a value factory product if one is
    /// registered and willing, otherwise a fresh instance of the class.
    fn new_instance(
        &mut self,
        type_id: Option<&str>,
    ) -> Result<Option<(ObjectRef, Arc<ClassDescriptor>)>> {
        let Some(type_id) = type_id else {
            return Ok(None);
        };
        let class = self.registry.find_class(type_id);
        if let Some(class) = &class {
            if !class.is_defined() {
                return Err(Error::configuration(format!(
                    "class `{type_id}` is declared but not defined"
                )));
            }
        }

        let factory = self
            .registry
            .find_value_factory(type_id)
            .or_else(|| self.registry.find_value_factory(""));
        if let Some(factory) = factory {
            if let Some(object) = factory.create(type_id)? {
                let Some(class) = class.or_else(|| object.class().cloned()) else {
                    return Err(MarshalError::UnexpectedType {
                        expected: type_id.to_string(),
                        actual: object.type_id().to_string(),
                    }
                    .into());
                };
                if !class.accepts(&object) {
                    return Err(MarshalError::UnexpectedType {
                        expected: class.id().to_string(),
                        actual: object.type_id().to_string(),
                    }
                    .into());
                }
                return Ok(Some((object, class)));
            }
        }

        Ok(class.map(|class| (ObjectRef::new(&class), class)))
    }

    fn read_slice_header(&mut self, is: &mut InputStream<'_>, kind: SliceKind) -> Result<()> {
        let flags = is.read_u8()?;
        let (type_id, compact_id) = match kind {
            SliceKind::Exception => (is.read_string()?, None),
            SliceKind::Value => match flags & FLAG_HAS_TYPE_ID_COMPACT {
                FLAG_HAS_TYPE_ID_COMPACT => {
                    let raw = is.read_size()?;
                    let compact = i32::try_from(raw)
                        .map_err(|_| Error::malformed(format!("compact id {raw} too large")))?;
                    (String::new(), Some(compact))
                }
                FLAG_HAS_TYPE_ID_STRING => {
                    let type_id = is.read_string()?;
                    self.type_ids.push(type_id.clone());
                    (type_id, None)
                }
                FLAG_HAS_TYPE_ID_INDEX => {
                    let index = is.read_size()?;
                    let type_id = index
                        .checked_sub(1)
                        .and_then(|i| self.type_ids.get(i))
                        .cloned()
                        .ok_or_else(|| Error::malformed(format!("unknown type id index {index}")))?;
                    (type_id, None)
                }
                _ => (String::new(), None),
            },
        };
        let size = if flags & FLAG_HAS_SLICE_SIZE != 0 {
            let size = is.read_i32()?;
            if size < 4 {
                return Err(MarshalError::InvalidSize(size).into());
            }
            Some(size as usize)
        } else {
            None
        };
        self.slices.push(SliceReader {
            flags,
            type_id,
            compact_id,
            size,
            body_start: is.pos(),
            site: Vec::new(),
            patches: Vec::new(),
        });
        Ok(())
    }

    /// Type id of the current slice, resolving compact ids.
    fn slice_type_id(&self) -> Option<String> {
        let slice = self.slices.last()?;
        if let Some(compact) = slice.compact_id {
            return self
                .registry
                .find_class_by_compact_id(compact)
                .map(|c| c.id().to_string());
        }
        (!slice.type_id.is_empty()).then(|| slice.type_id.clone())
    }

    fn describe_compact_id(&self) -> String {
        match self.slices.last().and_then(|s| s.compact_id) {
            Some(compact) => format!("compact id {compact}"),
            None => "<no type id>".to_string(),
        }
    }

    fn check_slice_type(&self, expected: &str, compact_id: Option<i32>) -> Result<()> {
        let Some(slice) = self.slices.last() else {
            return Ok(());
        };
        let mismatch = match slice.compact_id {
            Some(found) => Some(found) != compact_id,
            None => !slice.type_id.is_empty() && slice.type_id != expected,
        };
        if mismatch {
            return Err(MarshalError::UnexpectedType {
                expected: expected.to_string(),
                actual: if slice.type_id.is_empty() {
                    self.describe_compact_id()
                } else {
                    slice.type_id.clone()
                },
            }
            .into());
        }
        Ok(())
    }

    /// Skip the current slice, keeping its body and table for relay.
    fn skip_slice(&mut self, is: &mut InputStream<'_>) -> Result<PreservedSlice> {
        let slice = self
            .slices
            .pop()
            .ok_or_else(|| Error::malformed("skip_slice without a slice"))?;
        let size = slice
            .size
            .ok_or_else(|| Error::malformed("cannot skip a slice without a size"))?;
        is.skip(size - 4)?;
        let has_optional_members = slice.has(FLAG_HAS_OPTIONAL_MEMBERS);
        let is_last_slice = slice.has(FLAG_IS_LAST_SLICE);
        let mut end = is.pos();
        if has_optional_members {
            if end == slice.body_start {
                return Err(Error::malformed("optional members flagged in an empty slice"));
            }
            end -= 1;
        }
        let bytes = is.slice(slice.body_start, end).to_vec();
        let indices = if slice.has(FLAG_HAS_INDIRECTION_TABLE) {
            self.read_table(is)?
        } else {
            Vec::new()
        };
        Ok(PreservedSlice {
            info: SliceInfo {
                type_id: slice.type_id,
                compact_id: slice.compact_id,
                bytes,
                instances: Vec::new(),
                has_optional_members,
                is_last_slice,
            },
            indices,
        })
    }

    /// Finish the current slice: skip unknown optionals, check the size,
    /// read the indirection table and patch deferred references into
    /// `members`. References to instances still being read are returned.
    fn end_slice(
        &mut self,
        is: &mut InputStream<'_>,
        members: &mut HashMap<String, Value>,
    ) -> Result<Vec<WaitingPatch>> {
        if self.slices.last().is_some_and(|s| s.has(FLAG_HAS_OPTIONAL_MEMBERS)) {
            skip_remaining_optionals(is, self)?;
            let marker = is.read_u8()?;
            if marker != OPTIONAL_END_MARKER {
                return Err(Error::malformed(format!(
                    "expected optional end marker, found {marker:#04x}"
                )));
            }
        }
        let slice = self
            .slices
            .pop()
            .ok_or_else(|| Error::malformed("end_slice without a slice"))?;
        if let Some(size) = slice.size {
            let consumed = is.pos() - slice.body_start + 4;
            if consumed != size {
                return Err(Error::malformed(format!(
                    "slice `{}` declares {} bytes but {} were read",
                    slice.type_id, size, consumed
                )));
            }
        }
        if !slice.has(FLAG_HAS_INDIRECTION_TABLE) {
            return Ok(Vec::new());
        }

        let indices = self.read_table(is)?;
        let mut waiting = Vec::new();
        for patch in slice.patches {
            let index = indices.get(patch.index).copied().ok_or_else(|| {
                Error::malformed(format!(
                    "indirection index {} out of range ({} entries)",
                    patch.index + 1,
                    indices.len()
                ))
            })?;
            let Some(value) = self.lookup_index(index)? else {
                waiting.push(WaitingPatch {
                    instance: index,
                    path: patch.path,
                    expected: patch.expected,
                });
                continue;
            };
            if let Value::Object(object) = &value {
                if !patch.expected.accepts(object) {
                    return Err(MarshalError::UnexpectedType {
                        expected: patch.expected.id().to_string(),
                        actual: object.type_id().to_string(),
                    }
                    .into());
                }
            }
            apply_patch(members, &patch.path, value)?;
        }
        Ok(waiting)
    }

    /// Read an indirection table. Entries are instance indices (0 = null);
    /// new instances are decoded on the way.
    fn read_table(&mut self, is: &mut InputStream<'_>) -> Result<Vec<usize>> {
        let count = is.read_and_check_seq_size(1, self.config.max_sequence_length)?;
        if count == 0 {
            return Err(Error::malformed("empty indirection table"));
        }
        let mut indices = Vec::with_capacity(count);
        for _ in 0..count {
            let index = is.read_size()?;
            if index == INSTANCE_INLINE_MARKER as usize {
                // The new instance takes the next index before its own
                // nested instances are read.
                let assigned = self.next_index + 1;
                self.read_new_instance(is)?;
                indices.push(assigned);
            } else {
                indices.push(index);
            }
        }
        Ok(indices)
    }

    /// Value for an instance index; `None` while that instance is still
    /// being read.
    fn lookup_index(&self, index: usize) -> Result<Option<Value>> {
        if index == 0 {
            return Ok(Some(Value::Null));
        }
        if let Some(object) = self.instances.get(&index) {
            return Ok(Some(Value::Object(object.clone())));
        }
        if self.reading.contains(&index) {
            return Ok(None);
        }
        Err(Error::malformed(format!("reference to unknown instance index {index}")))
    }

    /// Table entries of preserved slices as values. Entries naming an
    /// instance still being read are `Value::Null` and listed as
    /// `(slice, entry, index)`.
    fn resolve_preserved(
        &self,
        preserved: Vec<PreservedSlice>,
    ) -> Result<(Option<SlicedData>, Vec<(usize, usize, usize)>)> {
        if preserved.is_empty() {
            return Ok((None, Vec::new()));
        }
        let mut slices = Vec::with_capacity(preserved.len());
        let mut waiting = Vec::new();
        for (s, PreservedSlice { mut info, indices }) in preserved.into_iter().enumerate() {
            info.instances = Vec::with_capacity(indices.len());
            for (e, index) in indices.into_iter().enumerate() {
                let value = match self.lookup_index(index)? {
                    Some(value) => value,
                    None => {
                        waiting.push((s, e, index));
                        Value::Null
                    }
                };
                info.instances.push(value);
            }
            slices.push(info);
        }
        Ok((Some(SlicedData::new(slices)), waiting))
    }
}

fn incomplete_instance(index: usize) -> Error {
    Error::malformed(format!(
        "exception refers to instance index {index} before it is complete"
    ))
}

/// Store `value` at `path` below `members`.
fn apply_patch(
    members: &mut HashMap<String, Value>,
    path: &[PathStep],
    value: Value,
) -> Result<()> {
    if path.iter().any(|step| *step == PathStep::Discard) {
        return Ok(());
    }
    let Some((PathStep::Member(name), rest)) = path.split_first() else {
        return Err(Error::malformed(format!("invalid patch site {path:?}")));
    };
    let mut target = members
        .get_mut(name)
        .ok_or_else(|| Error::malformed(format!("patch site `{name}` missing")))?;
    for step in rest {
        target = match (step, target) {
            (PathStep::Member(name), Value::Struct(fields)) => fields.get_mut(name),
            (PathStep::Index(i), Value::Sequence(items) | Value::Tuple(items)) => items.get_mut(*i),
            (PathStep::Entry(i), Value::Dictionary(entries)) => {
                entries.get_mut(*i).map(|(_, v)| v)
            }
            (step, other) => {
                return Err(MarshalError::UnexpectedType {
                    expected: format!("container for {step:?}"),
                    actual: other.kind_name().to_string(),
                }
                .into())
            }
        }
        .ok_or_else(|| Error::malformed(format!("patch site {step:?} missing")))?;
    }
    *target = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_patch_navigates_containers() {
        let mut members = HashMap::new();
        members.insert(
            "s".to_string(),
            Value::structure([(
                "list",
                Value::Sequence(vec![
                    Value::Null,
                    Value::Dictionary(vec![(Value::Int(1), Value::Null)]),
                ]),
            )]),
        );
        let path = [
            PathStep::Member("s".into()),
            PathStep::Member("list".into()),
            PathStep::Index(1),
            PathStep::Entry(0),
        ];
        apply_patch(&mut members, &path, Value::Int(42)).expect("patch");
        let dict = &members["s"].get_field("list").and_then(Value::as_slice).expect("list")[1];
        assert_eq!(dict.get_entry(&Value::Int(1)), Some(&Value::Int(42)));
    }

    #[test]
    fn test_apply_patch_into_custom_product_is_type_error() {
        let mut members = HashMap::new();
        members.insert("m".to_string(), Value::String("not a list".into()));
        let path = [PathStep::Member("m".into()), PathStep::Index(0)];
        let err = apply_patch(&mut members, &path, Value::Null).unwrap_err();
        assert!(matches!(err, Error::Marshal(MarshalError::UnexpectedType { .. })));
    }

    #[test]
    fn test_discard_path_is_ignored() {
        let mut members = HashMap::new();
        apply_patch(&mut members, &[PathStep::Discard], Value::Int(1)).expect("discard");
        assert!(members.is_empty());
    }
}
