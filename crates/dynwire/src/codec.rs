// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Top-level entry points.
//!
//! Every payload is wrapped in one encapsulation. Each call gets a fresh
//! [`ObjectGraphTracker`] or [`PatchResolver`], so a `Codec` can be shared
//! between threads.

use crate::config::{EncodingConfig, FormatType};
use crate::descriptor::{ExceptionDescriptor, TypeDescriptor};
use crate::error::{Error, Result};
use crate::graph::{ObjectGraphTracker, PatchResolver};
use crate::registry::SchemaRegistry;
use crate::stream::{InputStream, OutputStream};
use crate::value::{ExceptionValue, Value};
use std::sync::Arc;

/// Encoder/decoder bound to a schema registry.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<SchemaRegistry>,
    config: EncodingConfig,
}

impl Codec {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, EncodingConfig::default())
    }

    pub fn with_config(registry: Arc<SchemaRegistry>, config: EncodingConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EncodingConfig {
        &self.config
    }

    /// Encode `value` as `ty`. The value is validated before any byte is
    /// written.
    pub fn marshal(&self, ty: &TypeDescriptor, value: &Value) -> Result<Vec<u8>> {
        if !ty.validate(value) {
            return Err(Error::validation(format!(
                "expected a value of type `{}` but got {}",
                ty.id(),
                value.kind_name()
            )));
        }
        self.encode(self.config.format, |os, graph| {
            ty.marshal(value, os, graph, false, None)
        })
    }

    /// Decode one value of type `ty`. The encapsulation must be consumed
    /// exactly.
    pub fn unmarshal(&self, ty: &TypeDescriptor, bytes: &[u8]) -> Result<Value> {
        self.decode(bytes, |is, resolver| ty.unmarshal(is, resolver, false, None))
    }

    /// Encode a user exception. Exception slices are always sized; class
    /// instances inside them follow the codec format.
    pub fn marshal_exception(&self, exception: &ExceptionValue) -> Result<Vec<u8>> {
        self.encode(self.config.format, |os, graph| {
            graph.write_exception(os, exception)
        })
    }

    /// Decode a user exception, slicing off unknown most-derived levels.
    pub fn unmarshal_exception(&self, bytes: &[u8]) -> Result<ExceptionValue> {
        self.decode(bytes, |is, resolver| resolver.read_exception(is))
    }

    /// Find a registered exception by type id.
    pub fn exception(&self, type_id: &str) -> Option<Arc<ExceptionDescriptor>> {
        self.registry.find_exception(type_id)
    }

    pub(crate) fn encode<F>(&self, format: FormatType, body: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&mut OutputStream, &mut ObjectGraphTracker) -> Result<()>,
    {
        let mut os = OutputStream::new();
        let mut graph = ObjectGraphTracker::new(format);
        os.start_encapsulation();
        body(&mut os, &mut graph)?;
        os.end_encapsulation()?;
        log::trace!(
            "[codec] encoded {} bytes, {} instance(s)",
            os.pos(),
            graph.instance_count()
        );
        Ok(os.into_bytes())
    }

    pub(crate) fn decode<T, F>(&self, bytes: &[u8], body: F) -> Result<T>
    where
        F: FnOnce(&mut InputStream<'_>, &mut PatchResolver<'_>) -> Result<T>,
    {
        let mut is = InputStream::new(bytes);
        let mut resolver = PatchResolver::new(&self.registry, &self.config);
        is.start_encapsulation()?;
        let value = body(&mut is, &mut resolver)?;
        resolver.finish()?;
        is.end_encapsulation()?;
        if !is.is_eof() {
            return Err(Error::malformed(format!(
                "{} trailing byte(s) after the encapsulation",
                bytes.len() - is.pos()
            )));
        }
        log::trace!(
            "[codec] decoded {} bytes, {} instance(s)",
            bytes.len(),
            resolver.instance_count()
        );
        Ok(value)
    }
}
