// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema registry.
//!
//! Owns every named descriptor of a schema together with the lookup tables
//! the decoder needs: type id → class, compact id → class, type id →
//! exception and type id → value factory.
//!
//! # Concurrency
//!
//! - **Lookups**: `DashMap` shards, no global lock on the decode path
//! - **Definitions**: serialized by `load_lock` so that declare-then-define
//!   sequences from concurrent loaders do not interleave
//!
//! A registry is shared between codecs through `Arc` and is passed
//! explicitly; there is no process-wide instance.

use crate::builder::{ClassBuilder, EnumBuilder, ExceptionBuilder, StructBuilder};
use crate::descriptor::{
    ClassDescriptor, DataMember, DictionaryDescriptor, EnumDescriptor, ExceptionDescriptor,
    ProxyDefinition, ProxyDescriptor, SequenceDescriptor, SequenceMapping, StructDescriptor,
    TypeDescriptor,
};
use crate::error::{Error, HostError, Result};
use crate::operation::Operation;
use crate::value::ObjectRef;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Host callback producing the instance a class slice is decoded into.
///
/// Returning `Ok(None)` declines; the decoder then falls back to the
/// registered class, or slices the instance if there is none. A factory
/// registered under the empty type id is consulted for every type id that
/// has no factory of its own.
pub trait ValueFactory: Send + Sync {
    fn create(&self, type_id: &str) -> std::result::Result<Option<ObjectRef>, HostError>;
}

impl<F> ValueFactory for F
where
    F: Fn(&str) -> std::result::Result<Option<ObjectRef>, HostError> + Send + Sync,
{
    fn create(&self, type_id: &str) -> std::result::Result<Option<ObjectRef>, HostError> {
        self(type_id)
    }
}

/// Named descriptors of one schema.
pub struct SchemaRegistry {
    types: DashMap<String, TypeDescriptor>,
    classes: DashMap<String, Arc<ClassDescriptor>>,
    compact_ids: DashMap<i32, Arc<ClassDescriptor>>,
    proxies: DashMap<String, Arc<ProxyDescriptor>>,
    exceptions: DashMap<String, Arc<ExceptionDescriptor>>,
    value_factories: DashMap<String, Arc<dyn ValueFactory>>,
    load_lock: Mutex<()>,
    root: Arc<ClassDescriptor>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("types", &self.types.len())
            .field("classes", &self.classes.len())
            .field("exceptions", &self.exceptions.len())
            .field("value_factories", &self.value_factories.len())
            .finish()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Empty registry holding only the root class.
    pub fn new() -> Self {
        let root = Arc::new(ClassDescriptor::root());
        let registry = Self {
            types: DashMap::new(),
            classes: DashMap::new(),
            compact_ids: DashMap::new(),
            proxies: DashMap::new(),
            exceptions: DashMap::new(),
            value_factories: DashMap::new(),
            load_lock: Mutex::new(()),
            root: root.clone(),
        };
        registry.register_root(root);
        registry
    }

    fn register_root(&self, root: Arc<ClassDescriptor>) {
        self.types
            .insert(root.id().to_string(), TypeDescriptor::Class(root.clone()));
        self.classes.insert(root.id().to_string(), root);
    }

    /// Base of every class hierarchy (`::Ice::Object`).
    pub fn root_class(&self) -> Arc<ClassDescriptor> {
        self.root.clone()
    }

    /// Any named descriptor.
    pub fn lookup(&self, id: &str) -> Option<TypeDescriptor> {
        self.types.get(id).map(|entry| entry.value().clone())
    }

    fn insert_type(&self, descriptor: TypeDescriptor) -> Result<TypeDescriptor> {
        let id = descriptor.id().to_string();
        if self.types.contains_key(&id) {
            return Err(Error::configuration(format!("type `{id}` is already registered")));
        }
        log::debug!("[registry] registered {:?}", descriptor);
        self.types.insert(id, descriptor.clone());
        Ok(descriptor)
    }

    // -- structs ----------------------------------------------------------

    /// Existing struct `id`, or a new declared-only one.
    pub fn declare_struct(&self, id: &str) -> Result<Arc<StructDescriptor>> {
        let _guard = self.load_lock.lock();
        self.declare_struct_locked(id)
    }

    fn declare_struct_locked(&self, id: &str) -> Result<Arc<StructDescriptor>> {
        match self.lookup(id) {
            Some(TypeDescriptor::Struct(d)) => Ok(d),
            Some(other) => Err(Error::configuration(format!(
                "`{id}` is already registered as {other:?}"
            ))),
            None => {
                let d = Arc::new(StructDescriptor::declared(id));
                self.types.insert(id.to_string(), TypeDescriptor::Struct(d.clone()));
                Ok(d)
            }
        }
    }

    pub fn define_struct(&self, id: &str, members: Vec<DataMember>) -> Result<TypeDescriptor> {
        let _guard = self.load_lock.lock();
        let d = self.declare_struct_locked(id)?;
        d.define(members)?;
        log::debug!("[registry] defined struct `{}`", id);
        Ok(TypeDescriptor::Struct(d))
    }

    // -- classes ----------------------------------------------------------

    /// Existing class `id`, or a new declared-only one.
    pub fn declare_class(&self, id: &str) -> Result<Arc<ClassDescriptor>> {
        let _guard = self.load_lock.lock();
        self.declare_class_locked(id)
    }

    fn declare_class_locked(&self, id: &str) -> Result<Arc<ClassDescriptor>> {
        if let Some(class) = self.find_class(id) {
            return Ok(class);
        }
        if self.types.contains_key(id) {
            return Err(Error::configuration(format!(
                "`{id}` is already registered and is not a class"
            )));
        }
        let class = Arc::new(ClassDescriptor::declared(id));
        self.types.insert(id.to_string(), TypeDescriptor::Class(class.clone()));
        self.classes.insert(id.to_string(), class.clone());
        Ok(class)
    }

    /// Define class `id`. A compact id, when given, must be non-negative and
    /// unique within the registry.
    pub fn define_class(
        &self,
        id: &str,
        compact_id: Option<i32>,
        base: Option<Arc<ClassDescriptor>>,
        members: Vec<DataMember>,
    ) -> Result<TypeDescriptor> {
        let _guard = self.load_lock.lock();
        if let Some(compact) = compact_id {
            if compact < 0 {
                return Err(Error::configuration(format!(
                    "class `{id}`: negative compact id {compact}"
                )));
            }
            if let Some(other) = self.compact_ids.get(&compact) {
                return Err(Error::configuration(format!(
                    "class `{id}`: compact id {compact} is taken by `{}`",
                    other.id()
                )));
            }
        }
        let class = self.declare_class_locked(id)?;
        class.define(compact_id, base, members)?;
        if let Some(compact) = compact_id {
            self.compact_ids.insert(compact, class.clone());
        }
        log::debug!("[registry] defined class `{}` (compact id {:?})", id, compact_id);
        Ok(TypeDescriptor::Class(class))
    }

    pub fn find_class(&self, id: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(id).map(|entry| entry.value().clone())
    }

    pub fn find_class_by_compact_id(&self, compact_id: i32) -> Option<Arc<ClassDescriptor>> {
        self.compact_ids.get(&compact_id).map(|entry| entry.value().clone())
    }

    // -- proxies ----------------------------------------------------------

    /// Existing interface `id`, or a new declared-only one.
    pub fn declare_proxy(&self, id: &str) -> Result<Arc<ProxyDescriptor>> {
        let _guard = self.load_lock.lock();
        self.declare_proxy_locked(id)
    }

    fn declare_proxy_locked(&self, id: &str) -> Result<Arc<ProxyDescriptor>> {
        if let Some(proxy) = self.find_proxy(id) {
            return Ok(proxy);
        }
        if self.types.contains_key(id) {
            return Err(Error::configuration(format!(
                "`{id}` is already registered and is not an interface"
            )));
        }
        let proxy = Arc::new(ProxyDescriptor::declared(id));
        self.types.insert(id.to_string(), TypeDescriptor::Proxy(proxy.clone()));
        self.proxies.insert(id.to_string(), proxy.clone());
        Ok(proxy)
    }

    pub fn define_proxy(
        &self,
        id: &str,
        bases: Vec<Arc<ProxyDescriptor>>,
        operations: Vec<Operation>,
    ) -> Result<TypeDescriptor> {
        let _guard = self.load_lock.lock();
        let proxy = self.declare_proxy_locked(id)?;
        let operations = operations
            .into_iter()
            .map(|op| (op.name().to_string(), Arc::new(op)))
            .collect();
        proxy.define(ProxyDefinition { bases, operations })?;
        log::debug!("[registry] defined interface `{}`", id);
        Ok(TypeDescriptor::Proxy(proxy))
    }

    pub fn find_proxy(&self, id: &str) -> Option<Arc<ProxyDescriptor>> {
        self.proxies.get(id).map(|entry| entry.value().clone())
    }

    // -- exceptions -------------------------------------------------------

    pub fn define_exception(
        &self,
        id: &str,
        base: Option<Arc<ExceptionDescriptor>>,
        members: Vec<DataMember>,
    ) -> Result<Arc<ExceptionDescriptor>> {
        let _guard = self.load_lock.lock();
        if self.exceptions.contains_key(id) {
            return Err(Error::configuration(format!(
                "exception `{id}` is already defined"
            )));
        }
        let exception = Arc::new(ExceptionDescriptor::new(id, base, members)?);
        self.exceptions.insert(id.to_string(), exception.clone());
        log::debug!("[registry] defined exception `{}`", id);
        Ok(exception)
    }

    pub fn find_exception(&self, id: &str) -> Option<Arc<ExceptionDescriptor>> {
        self.exceptions.get(id).map(|entry| entry.value().clone())
    }

    // -- leaves and containers ---------------------------------------------

    pub fn define_enum<I, S>(&self, id: &str, enumerators: I) -> Result<TypeDescriptor>
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let descriptor = EnumDescriptor::new(id, enumerators)?;
        let _guard = self.load_lock.lock();
        self.insert_type(TypeDescriptor::Enum(Arc::new(descriptor)))
    }

    pub fn define_sequence(
        &self,
        id: &str,
        element: TypeDescriptor,
        mapping: SequenceMapping,
    ) -> Result<TypeDescriptor> {
        let descriptor = SequenceDescriptor::new(id, element).with_mapping(mapping);
        let _guard = self.load_lock.lock();
        self.insert_type(TypeDescriptor::Sequence(Arc::new(descriptor)))
    }

    pub fn define_dictionary(
        &self,
        id: &str,
        key: TypeDescriptor,
        value: TypeDescriptor,
    ) -> Result<TypeDescriptor> {
        let descriptor = DictionaryDescriptor::new(id, key, value)?;
        let _guard = self.load_lock.lock();
        self.insert_type(TypeDescriptor::Dictionary(Arc::new(descriptor)))
    }

    // -- value factories ----------------------------------------------------

    /// Register `factory` for `type_id` (empty for the default factory).
    pub fn register_value_factory(
        &self,
        type_id: &str,
        factory: impl ValueFactory + 'static,
    ) -> Result<()> {
        use dashmap::mapref::entry::Entry;
        match self.value_factories.entry(type_id.to_string()) {
            Entry::Occupied(_) => Err(Error::configuration(format!(
                "a value factory is already registered for `{type_id}`"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(factory));
                log::debug!("[registry] value factory for `{}`", type_id);
                Ok(())
            }
        }
    }

    pub fn remove_value_factory(&self, type_id: &str) -> bool {
        self.value_factories.remove(type_id).is_some()
    }

    pub fn find_value_factory(&self, type_id: &str) -> Option<Arc<dyn ValueFactory>> {
        self.value_factories
            .get(type_id)
            .map(|entry| entry.value().clone())
    }

    // -- builders -----------------------------------------------------------

    pub fn struct_builder(&self, id: impl Into<String>) -> StructBuilder<'_> {
        StructBuilder::new(self, id)
    }

    pub fn class_builder(&self, id: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, id)
    }

    pub fn exception_builder(&self, id: impl Into<String>) -> ExceptionBuilder<'_> {
        ExceptionBuilder::new(self, id)
    }

    pub fn enum_builder(&self, id: impl Into<String>) -> EnumBuilder<'_> {
        EnumBuilder::new(self, id)
    }

    // -- teardown -----------------------------------------------------------

    /// Drop every definition and empty the tables, breaking reference
    /// cycles between descriptors. The root class survives.
    pub fn destroy(&self) {
        let _guard = self.load_lock.lock();
        for entry in self.types.iter() {
            entry.value().destroy();
        }
        for entry in self.exceptions.iter() {
            entry.value().destroy();
        }
        let count = self.types.len() + self.exceptions.len();
        self.types.clear();
        self.classes.clear();
        self.compact_ids.clear();
        self.proxies.clear();
        self.exceptions.clear();
        self.value_factories.clear();
        self.register_root(self.root.clone());
        log::debug!("[registry] destroyed {} descriptor(s)", count);
    }
}
