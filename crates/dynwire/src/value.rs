// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value model.
//!
//! [`Value`] is the host-side view of anything the engine can marshal.
//! Integers and floats are deliberately wide (`i64`, `f64`): the descriptor
//! decides the wire width and range-checks in `validate()`.
//!
//! Class instances are shared handles ([`ObjectRef`]); the pointer is the
//! instance identity used to deduplicate repeated references and to rebuild
//! cycles on unmarshal.

use crate::descriptor::{ClassDescriptor, ExceptionDescriptor, PrimitiveKind};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null class reference or null proxy.
    #[default]
    Null,
    /// Absent optional member or parameter.
    Unset,
    Bool(bool),
    /// byte, short, int and long.
    Int(i64),
    /// float and double.
    Float(f64),
    String(String),
    /// Enumerator value.
    Enum(i32),
    Struct(HashMap<String, Value>),
    /// Ordered list (default sequence mapping).
    Sequence(Vec<Value>),
    /// Fixed tuple (sequence mapping, multi-value results).
    Tuple(Vec<Value>),
    /// Contiguous primitive buffer (array sequence mapping).
    Array(PrimitiveArray),
    /// Dictionary entries in wire order.
    Dictionary(Vec<(Value, Value)>),
    Object(ObjectRef),
    Proxy(ProxyRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<i32> {
        match self {
            Self::Enum(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&ProxyRef> {
        match self {
            Self::Proxy(p) => Some(p),
            _ => None,
        }
    }

    /// Elements of a list or tuple.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(v) | Self::Tuple(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PrimitiveArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// Member of a struct value.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Dictionary lookup by key equality.
    pub fn get_entry(&self, key: &Value) -> Option<&Value> {
        self.as_dictionary()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Build a struct value from `(name, value)` pairs.
    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unset => "unset",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::Struct(_) => "struct",
            Self::Sequence(_) => "sequence",
            Self::Tuple(_) => "tuple",
            Self::Array(_) => "array",
            Self::Dictionary(_) => "dictionary",
            Self::Object(_) => "object",
            Self::Proxy(_) => "proxy",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<ProxyRef> for Value {
    fn from(v: ProxyRef) -> Self {
        Self::Proxy(v)
    }
}

impl From<PrimitiveArray> for Value {
    fn from(v: PrimitiveArray) -> Self {
        Self::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Unset, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Primitive arrays
// ---------------------------------------------------------------------------

/// A contiguous buffer of primitives, marshaled in bulk when its item kind
/// matches the sequence element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveArray {
    Bool(Vec<bool>),
    Byte(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl PrimitiveArray {
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element kind held by this buffer.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::Short(_) => PrimitiveKind::Short,
            Self::Int(_) => PrimitiveKind::Int,
            Self::Long(_) => PrimitiveKind::Long,
            Self::Float(_) => PrimitiveKind::Float,
            Self::Double(_) => PrimitiveKind::Double,
        }
    }

    /// Element at `index`, widened to a [`Value`].
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Self::Bool(v) => v.get(index).map(|x| Value::Bool(*x)),
            Self::Byte(v) => v.get(index).map(|x| Value::Int(i64::from(*x))),
            Self::Short(v) => v.get(index).map(|x| Value::Int(i64::from(*x))),
            Self::Int(v) => v.get(index).map(|x| Value::Int(i64::from(*x))),
            Self::Long(v) => v.get(index).map(|x| Value::Int(*x)),
            Self::Float(v) => v.get(index).map(|x| Value::Float(f64::from(*x))),
            Self::Double(v) => v.get(index).map(|x| Value::Float(*x)),
        }
    }

    /// Widen every element into a list.
    pub fn to_values(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }
}

// ---------------------------------------------------------------------------
// Class instances
// ---------------------------------------------------------------------------

/// Mutable state of one class instance.
#[derive(Debug, Default)]
pub struct ObjectState {
    /// Member values of every known level.
    pub members: HashMap<String, Value>,
    /// Slices preserved because the decoder did not know their type.
    pub sliced_data: Option<SlicedData>,
}

struct ObjectInner {
    /// Most-derived type id. For an instance of a known class this is the
    /// class id; for an unknown-sliced instance it is the id read from the wire.
    type_id: String,
    /// `None` when no slice of the instance was known.
    class: Option<Arc<ClassDescriptor>>,
    state: Mutex<ObjectState>,
}

/// Shared handle to a class instance. Cloning the handle does not copy the
/// instance; equality is identity.
///
/// The type of an instance is fixed at creation and readable without
/// locking, so type checks never contend with a writer holding the state.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectInner>);

impl ObjectRef {
    /// New instance of `class` with no members set.
    pub fn new(class: &Arc<ClassDescriptor>) -> Self {
        Self(Arc::new(ObjectInner {
            type_id: class.id().to_string(),
            class: Some(class.clone()),
            state: Mutex::new(ObjectState::default()),
        }))
    }

    /// Instance none of whose slices were known to the decoder.
    pub fn unknown(type_id: impl Into<String>, sliced_data: SlicedData) -> Self {
        Self(Arc::new(ObjectInner {
            type_id: type_id.into(),
            class: None,
            state: Mutex::new(ObjectState {
                members: HashMap::new(),
                sliced_data: Some(sliced_data),
            }),
        }))
    }

    /// Builder-style member assignment.
    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.0
            .state
            .lock()
            .members
            .insert(name.to_string(), value.into());
    }

    /// Clone of a member value.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.state.lock().members.get(name).cloned()
    }

    /// Member holding a class reference.
    pub fn get_object(&self, name: &str) -> Option<ObjectRef> {
        match self.get(name)? {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn type_id(&self) -> &str {
        &self.0.type_id
    }

    pub fn class(&self) -> Option<&Arc<ClassDescriptor>> {
        self.0.class.as_ref()
    }

    pub fn sliced_data(&self) -> Option<SlicedData> {
        self.0.state.lock().sliced_data.clone()
    }

    pub fn set_sliced_data(&self, sliced_data: Option<SlicedData>) {
        self.0.state.lock().sliced_data = sliced_data;
    }

    pub fn lock(&self) -> MutexGuard<'_, ObjectState> {
        self.0.state.lock()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity of the instance for the lifetime of the handle.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    // Members are not printed: object graphs may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {:#x})", self.0.type_id, self.identity())
    }
}

// ---------------------------------------------------------------------------
// Sliced data
// ---------------------------------------------------------------------------

/// One preserved slice of a class instance or exception.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceInfo {
    /// Type id of the slice (empty when only a compact id was sent).
    pub type_id: String,
    /// Compact id of the slice, if it was sent as one.
    pub compact_id: Option<i32>,
    /// Slice body, without the optional-members end marker.
    pub bytes: Vec<u8>,
    /// Instances of the slice's indirection table, in table order.
    pub instances: Vec<Value>,
    pub has_optional_members: bool,
    pub is_last_slice: bool,
}

/// Slices preserved for lossless relay, most-derived first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlicedData {
    pub slices: Vec<SliceInfo>,
}

impl SlicedData {
    pub fn new(slices: Vec<SliceInfo>) -> Self {
        Self { slices }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Exceptions
// ---------------------------------------------------------------------------

/// A user exception.
#[derive(Debug, Clone)]
pub struct ExceptionValue {
    pub exception: Arc<ExceptionDescriptor>,
    pub members: HashMap<String, Value>,
    pub sliced_data: Option<SlicedData>,
}

impl ExceptionValue {
    pub fn new(exception: &Arc<ExceptionDescriptor>) -> Self {
        Self {
            exception: exception.clone(),
            members: HashMap::new(),
            sliced_data: None,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.members.insert(name.to_string(), value.into());
        self
    }

    pub fn type_id(&self) -> &str {
        self.exception.id()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }
}

// ---------------------------------------------------------------------------
// Proxies
// ---------------------------------------------------------------------------

/// Object identity of a remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Identity {
    pub name: String,
    pub category: String,
}

/// How invocations on a proxy are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum InvocationMode {
    #[default]
    Twoway = 0,
    Oneway = 1,
    BatchOneway = 2,
    Datagram = 3,
    BatchDatagram = 4,
}

impl InvocationMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Twoway),
            1 => Some(Self::Oneway),
            2 => Some(Self::BatchOneway),
            3 => Some(Self::Datagram),
            4 => Some(Self::BatchDatagram),
            _ => None,
        }
    }
}

/// Endpoint carried through unchanged: its type and raw encapsulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueEndpoint {
    pub kind: i16,
    /// Complete encapsulation, header included.
    pub encapsulation: Vec<u8>,
}

/// Reference to a remote object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProxyRef {
    /// Interface type id of the descriptor the proxy was decoded with.
    pub interface: String,
    pub identity: Identity,
    pub facet: Option<String>,
    pub mode: InvocationMode,
    pub secure: bool,
    pub endpoints: Vec<OpaqueEndpoint>,
    /// Object adapter id for indirect proxies (no endpoints).
    pub adapter_id: String,
}

impl ProxyRef {
    /// Indirect proxy `name@adapter_id`.
    pub fn indirect(name: impl Into<String>, adapter_id: impl Into<String>) -> Self {
        Self {
            identity: Identity {
                name: name.into(),
                category: String::new(),
            },
            adapter_id: adapter_id.into(),
            ..Self::default()
        }
    }
}
