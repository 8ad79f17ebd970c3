// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive type kinds.

use crate::error::{Error, Result};
use crate::stream::{InputStream, OptionalFormat, OutputStream};
use crate::value::Value;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    /// Unsigned 0..=255.
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl PrimitiveKind {
    /// Type id used in error messages and lookups.
    pub fn id(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
        }
    }

    /// Fixed wire size (None for strings).
    pub fn size(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Byte => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double => Some(8),
            Self::String => None,
        }
    }

    pub fn min_wire_size(self) -> usize {
        self.size().unwrap_or(1)
    }

    pub fn optional_format(self) -> OptionalFormat {
        match self {
            Self::Bool | Self::Byte => OptionalFormat::F1,
            Self::Short => OptionalFormat::F2,
            Self::Int | Self::Float => OptionalFormat::F4,
            Self::Long | Self::Double => OptionalFormat::F8,
            Self::String => OptionalFormat::VSize,
        }
    }

    /// Range and shape check. Floats reject finite magnitudes that do not fit
    /// in four bytes; NaN and infinities pass unchanged.
    pub fn validate(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Byte, Value::Int(v)) => (0..=255).contains(v),
            (Self::Short, Value::Int(v)) => i16::try_from(*v).is_ok(),
            (Self::Int, Value::Int(v)) => i32::try_from(*v).is_ok(),
            (Self::Long, Value::Int(_)) => true,
            (Self::Float, Value::Float(v)) => !v.is_finite() || v.abs() <= f64::from(f32::MAX),
            (Self::Float, Value::Int(v)) => (*v as f64).abs() <= f64::from(f32::MAX),
            (Self::Double, Value::Float(_) | Value::Int(_)) => true,
            (Self::String, Value::String(_)) => true,
            _ => false,
        }
    }

    pub fn marshal(self, value: &Value, os: &mut OutputStream) -> Result<()> {
        let mismatch = || {
            Error::validation(format!("expected {} but got {}", self.id(), value.kind_name()))
        };
        if !self.validate(value) {
            return Err(mismatch());
        }
        match (self, value) {
            (Self::Bool, Value::Bool(v)) => os.write_bool(*v),
            (Self::Byte, Value::Int(v)) => os.write_u8(*v as u8),
            (Self::Short, Value::Int(v)) => os.write_i16(*v as i16),
            (Self::Int, Value::Int(v)) => os.write_i32(*v as i32),
            (Self::Long, Value::Int(v)) => os.write_i64(*v),
            (Self::Float, Value::Float(v)) => os.write_f32(*v as f32),
            (Self::Float, Value::Int(v)) => os.write_f32(*v as f32),
            (Self::Double, Value::Float(v)) => os.write_f64(*v),
            (Self::Double, Value::Int(v)) => os.write_f64(*v as f64),
            (Self::String, Value::String(v)) => os.write_string(v)?,
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    pub fn unmarshal(self, is: &mut InputStream<'_>) -> Result<Value> {
        Ok(match self {
            Self::Bool => Value::Bool(is.read_bool()?),
            Self::Byte => Value::Int(i64::from(is.read_u8()?)),
            Self::Short => Value::Int(i64::from(is.read_i16()?)),
            Self::Int => Value::Int(i64::from(is.read_i32()?)),
            Self::Long => Value::Int(is.read_i64()?),
            Self::Float => Value::Float(f64::from(is.read_f32()?)),
            Self::Double => Value::Float(is.read_f64()?),
            Self::String => Value::String(is.read_string()?),
        })
    }
}
