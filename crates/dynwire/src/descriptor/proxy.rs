// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Proxies: references to remote objects.
//!
//! ```text
//! identity.name identity.category           (empty name = null proxy)
//! facet       : size(0) | size(1) string
//! mode u8, secure bool, protocol 1.0, encoding 1.1
//! endpoints   : size(n) { i16 kind, encapsulation }*
//! adapter id  : string, only when n == 0
//! ```

use crate::config::{ENCODING_MAJOR, ENCODING_MINOR, PROTOCOL_MAJOR, PROTOCOL_MINOR};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::stream::{InputStream, OutputStream};
use crate::value::{Identity, InvocationMode, OpaqueEndpoint, ProxyRef, Value};
use arc_swap::ArcSwapOption;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Interface definition: base interfaces and operations.
#[derive(Debug, Default)]
pub struct ProxyDefinition {
    pub bases: Vec<Arc<ProxyDescriptor>>,
    pub operations: HashMap<String, Arc<Operation>>,
}

/// Proxy type for one interface.
pub struct ProxyDescriptor {
    id: String,
    definition: ArcSwapOption<ProxyDefinition>,
}

impl fmt::Debug for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyDescriptor")
            .field("id", &self.id)
            .field("defined", &self.is_defined())
            .finish()
    }
}

impl ProxyDescriptor {
    pub fn declared(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            definition: ArcSwapOption::empty(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_defined(&self) -> bool {
        self.definition.load().is_some()
    }

    pub(crate) fn define(&self, definition: ProxyDefinition) -> Result<()> {
        if self.is_defined() {
            return Err(Error::configuration(format!(
                "interface `{}` is already defined",
                self.id
            )));
        }
        self.definition.store(Some(Arc::new(definition)));
        Ok(())
    }

    /// Find an operation on this interface or one of its bases.
    pub fn find_operation(&self, name: &str) -> Option<Arc<Operation>> {
        let def = self.definition.load_full()?;
        def.operations
            .get(name)
            .cloned()
            .or_else(|| def.bases.iter().find_map(|b| b.find_operation(name)))
    }

    pub fn validate(&self, value: &Value) -> bool {
        matches!(value, Value::Null | Value::Proxy(_))
    }

    pub(crate) fn marshal(&self, value: &Value, os: &mut OutputStream, as_optional: bool) -> Result<()> {
        let bracket = as_optional.then(|| os.start_size());
        match value {
            Value::Null => {
                os.write_string("")?;
                os.write_string("")?;
            }
            Value::Proxy(proxy) => write_proxy(proxy, os)?,
            other => {
                return Err(Error::validation(format!(
                    "expected proxy `{}` but got {}",
                    self.id,
                    other.kind_name()
                )))
            }
        }
        match bracket {
            Some(pos) => os.end_size(pos),
            None => Ok(()),
        }
    }

    pub(crate) fn unmarshal(&self, is: &mut InputStream<'_>, as_optional: bool) -> Result<Value> {
        if as_optional {
            is.skip(4)?;
        }
        let identity = Identity {
            name: is.read_string()?,
            category: is.read_string()?,
        };
        if identity.name.is_empty() {
            return Ok(Value::Null);
        }
        if !self.is_defined() {
            return Err(Error::configuration(format!(
                "interface `{}` is declared but not defined",
                self.id
            )));
        }

        let facet = match is.read_size()? {
            0 => None,
            1 => Some(is.read_string()?),
            n => return Err(Error::malformed(format!("proxy facet sequence of length {n}"))),
        };
        let raw_mode = is.read_u8()?;
        let mode = InvocationMode::from_u8(raw_mode)
            .ok_or_else(|| Error::malformed(format!("invalid invocation mode {raw_mode}")))?;
        let secure = is.read_bool()?;
        // Protocol and encoding versions.
        is.skip(4)?;

        let count = is.read_and_check_seq_size(8, usize::MAX)?;
        let mut endpoints = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = is.read_i16()?;
            let encapsulation = is.read_encapsulation_blob()?.to_vec();
            endpoints.push(OpaqueEndpoint {
                kind,
                encapsulation,
            });
        }
        let adapter_id = if endpoints.is_empty() {
            is.read_string()?
        } else {
            String::new()
        };

        Ok(Value::Proxy(ProxyRef {
            interface: self.id.clone(),
            identity,
            facet,
            mode,
            secure,
            endpoints,
            adapter_id,
        }))
    }

    pub fn destroy(&self) {
        self.definition.store(None);
    }
}

fn write_proxy(proxy: &ProxyRef, os: &mut OutputStream) -> Result<()> {
    if proxy.identity.name.is_empty() {
        return Err(Error::validation("proxy identity name is empty"));
    }
    os.write_string(&proxy.identity.name)?;
    os.write_string(&proxy.identity.category)?;
    match proxy.facet.as_deref() {
        None | Some("") => os.write_size(0)?,
        Some(facet) => {
            os.write_size(1)?;
            os.write_string(facet)?;
        }
    }
    os.write_u8(proxy.mode as u8);
    os.write_bool(proxy.secure);
    os.write_u8(PROTOCOL_MAJOR);
    os.write_u8(PROTOCOL_MINOR);
    os.write_u8(ENCODING_MAJOR);
    os.write_u8(ENCODING_MINOR);
    os.write_size(proxy.endpoints.len())?;
    for endpoint in &proxy.endpoints {
        os.write_i16(endpoint.kind);
        os.write_blob(&endpoint.encapsulation);
    }
    if proxy.endpoints.is_empty() {
        os.write_string(&proxy.adapter_id)?;
    }
    Ok(())
}
