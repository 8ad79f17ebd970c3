// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Operation parameter lists.
//!
//! Parameters are encoded like the members of a slice without a slice
//! header: required parameters in declaration order, then the optional ones
//! sorted by tag. Optional parameters have no end marker; they run to the end
//! of the encapsulation.
//!
//! A result is the return value (if any) followed by the out parameters. With
//! a single result value the host passes that value directly; with several it
//! passes a `Value::Tuple` of `[return, out...]`.

use crate::codec::Codec;
use crate::config::FormatType;
use crate::descriptor::{DataMember, ExceptionDescriptor};
use crate::error::{Error, MarshalError, Result};
use crate::graph::{ObjectGraphTracker, PatchResolver};
use crate::stream::{InputStream, OutputStream};
use crate::value::{ExceptionValue, Value};
use std::sync::Arc;

/// An interface operation.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    idempotent: bool,
    in_params: Vec<DataMember>,
    out_params: Vec<DataMember>,
    return_value: Option<DataMember>,
    exceptions: Vec<Arc<ExceptionDescriptor>>,
    format: Option<FormatType>,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            idempotent: false,
            in_params: Vec::new(),
            out_params: Vec::new(),
            return_value: None,
            exceptions: Vec::new(),
            format: None,
        }
    }

    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    pub fn in_param(mut self, param: DataMember) -> Self {
        self.in_params.push(param);
        self
    }

    pub fn out_param(mut self, param: DataMember) -> Self {
        self.out_params.push(param);
        self
    }

    /// Return value; a tagged member makes it an optional return.
    pub fn returns(mut self, value: DataMember) -> Self {
        self.return_value = Some(value);
        self
    }

    pub fn throws(mut self, exception: Arc<ExceptionDescriptor>) -> Self {
        self.exceptions.push(exception);
        self
    }

    /// Class format for this operation, overriding the codec's.
    pub fn with_format(mut self, format: FormatType) -> Self {
        self.format = Some(format);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    pub fn exceptions(&self) -> &[Arc<ExceptionDescriptor>] {
        &self.exceptions
    }

    fn format(&self, codec: &Codec) -> FormatType {
        self.format.unwrap_or(codec.config().format)
    }

    /// Encode the in parameters of a request, one value per parameter in
    /// declaration order.
    pub fn marshal_params(&self, codec: &Codec, args: &[Value]) -> Result<Vec<u8>> {
        let params: Vec<&DataMember> = self.in_params.iter().collect();
        check_count(&self.name, "argument", params.len(), args.len())?;
        codec.encode(self.format(codec), |os, graph| {
            write_params(&params, args, os, graph)
        })
    }

    /// Decode the in parameters of a request, in declaration order. Absent
    /// optional parameters are `Value::Unset`.
    pub fn unmarshal_params(&self, codec: &Codec, bytes: &[u8]) -> Result<Vec<Value>> {
        let params: Vec<&DataMember> = self.in_params.iter().collect();
        codec.decode(bytes, |is, resolver| read_params(&params, is, resolver))
    }

    fn results(&self) -> Vec<&DataMember> {
        self.return_value.iter().chain(self.out_params.iter()).collect()
    }

    /// Encode a successful reply.
    pub fn marshal_result(&self, codec: &Codec, result: &Value) -> Result<Vec<u8>> {
        let params = self.results();
        let values = match params.len() {
            0 => Vec::new(),
            1 => vec![result.clone()],
            n => match result {
                Value::Tuple(items) | Value::Sequence(items) if items.len() == n => items.clone(),
                Value::Tuple(items) | Value::Sequence(items) => {
                    return Err(MarshalError::TupleArity {
                        expected: n,
                        actual: items.len(),
                    }
                    .into())
                }
                other => {
                    return Err(Error::validation(format!(
                        "operation `{}` returns {} values; expected a tuple, got {}",
                        self.name,
                        n,
                        other.kind_name()
                    )))
                }
            },
        };
        codec.encode(self.format(codec), |os, graph| {
            write_params(&params, &values, os, graph)
        })
    }

    /// Decode a successful reply: `Value::Null` with no results, the value
    /// itself with one, a `Value::Tuple` with several.
    pub fn unmarshal_result(&self, codec: &Codec, bytes: &[u8]) -> Result<Value> {
        let params = self.results();
        let mut values = codec.decode(bytes, |is, resolver| read_params(&params, is, resolver))?;
        Ok(match values.len() {
            0 => Value::Null,
            1 => values.remove(0),
            _ => Value::Tuple(values),
        })
    }

    /// Encode a user-exception reply. The exception must be one the
    /// operation declares (or derived from one).
    pub fn marshal_exception(&self, codec: &Codec, exception: &ExceptionValue) -> Result<Vec<u8>> {
        if !self.declares(&exception.exception) {
            return Err(MarshalError::UnknownUserException(exception.type_id().to_string()).into());
        }
        codec.encode(self.format(codec), |os, graph| {
            graph.write_exception(os, exception)
        })
    }

    /// Decode a user-exception reply; an exception the operation does not
    /// declare is reported as unknown.
    pub fn unmarshal_exception(&self, codec: &Codec, bytes: &[u8]) -> Result<ExceptionValue> {
        let exception = codec.unmarshal_exception(bytes)?;
        if !self.declares(&exception.exception) {
            log::debug!(
                "[codec] `{}` raised undeclared exception `{}`",
                self.name,
                exception.type_id()
            );
            return Err(MarshalError::UnknownUserException(exception.type_id().to_string()).into());
        }
        Ok(exception)
    }

    fn declares(&self, exception: &ExceptionDescriptor) -> bool {
        self.exceptions.iter().any(|e| exception.is_a(e.id()))
    }
}

fn check_count(operation: &str, what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::validation(format!(
            "operation `{operation}` takes {expected} {what}(s), got {actual}"
        )));
    }
    Ok(())
}

/// Positions of `params` in wire order: required in declaration order, then
/// optional by tag.
fn wire_order(params: &[&DataMember]) -> Vec<usize> {
    let mut required: Vec<usize> = (0..params.len()).filter(|&i| !params[i].optional).collect();
    let mut optional: Vec<usize> = (0..params.len()).filter(|&i| params[i].optional).collect();
    optional.sort_by_key(|&i| params[i].tag);
    required.append(&mut optional);
    required
}

fn write_params(
    params: &[&DataMember],
    values: &[Value],
    os: &mut OutputStream,
    graph: &mut ObjectGraphTracker,
) -> Result<()> {
    for i in wire_order(params) {
        let param = params[i];
        if param.optional {
            param.marshal_optional(values.get(i), os, graph)?;
        } else {
            param.marshal_value(&values[i], os, graph, false)?;
        }
    }
    Ok(())
}

fn read_params(
    params: &[&DataMember],
    is: &mut InputStream<'_>,
    resolver: &mut PatchResolver<'_>,
) -> Result<Vec<Value>> {
    let mut values = vec![Value::Unset; params.len()];
    for i in wire_order(params) {
        let param = params[i];
        values[i] = if param.optional {
            param.unmarshal_optional(is, resolver)?
        } else {
            param.unmarshal_value(is, resolver, false)?
        };
    }
    crate::descriptor::skip_remaining_optionals(is, resolver)?;
    Ok(values)
}
