// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Growable output cursor.

use super::{checked_size, OptionalFormat};
use crate::config::{
    ENCODING_MAJOR, ENCODING_MINOR, OPTIONAL_TAG_INLINE_MAX, SIZE_LONG_MARKER, SIZE_SHORT_MAX,
};
use crate::error::{Error, Result};

/// Generate little-endian write methods for fixed-width primitives.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            self.buffer.extend_from_slice(&value.to_le_bytes());
        }
    };
}

/// Output cursor. Writes always append; placeholders are patched with the
/// `rewrite_*` methods.
#[derive(Debug, Default)]
pub struct OutputStream {
    buffer: Vec<u8>,
    encaps: Vec<usize>,
}

impl OutputStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            encaps: Vec::new(),
        }
    }

    impl_write_le!(write_i16, i16);
    impl_write_le!(write_i32, i32);
    impl_write_le!(write_i64, i64);
    impl_write_le!(write_f32, f32);
    impl_write_le!(write_f64, f64);

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    pub fn write_blob(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Write a size: one byte up to 254, otherwise `0xFF` and an i32.
    pub fn write_size(&mut self, size: usize) -> Result<()> {
        let size = checked_size(size)?;
        if size > SIZE_SHORT_MAX {
            self.write_u8(SIZE_LONG_MARKER);
            self.write_i32(size);
        } else {
            self.write_u8(size as u8);
        }
        Ok(())
    }

    /// Write a size-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_size(value.len())?;
        self.write_blob(value.as_bytes());
        Ok(())
    }

    /// Write an enumerator. The 1.1 encoding uses the size encoding; `max`
    /// is the largest declared enumerator.
    pub fn write_enum(&mut self, value: i32, max: i32) -> Result<()> {
        if value < 0 || value > max {
            return Err(Error::validation(format!(
                "enumerator {value} outside 0..={max}"
            )));
        }
        self.write_size(value as usize)
    }

    /// Write the header of an optional member.
    pub fn write_optional_header(&mut self, tag: i32, format: OptionalFormat) -> Result<()> {
        if tag < 0 {
            return Err(Error::configuration(format!("negative optional tag {tag}")));
        }
        let fmt = format as u8;
        if tag < OPTIONAL_TAG_INLINE_MAX {
            self.write_u8(fmt | ((tag as u8) << 3));
        } else {
            self.write_u8(fmt | ((OPTIONAL_TAG_INLINE_MAX as u8) << 3));
            self.write_size(tag as usize)?;
        }
        Ok(())
    }

    /// Write a 4-byte placeholder for an FSize bracket; returns its position.
    pub fn start_size(&mut self) -> usize {
        let pos = self.buffer.len();
        self.write_i32(0);
        pos
    }

    /// Patch the placeholder written by [`start_size`](Self::start_size) with
    /// the number of bytes written after it.
    pub fn end_size(&mut self, pos: usize) -> Result<()> {
        let len = checked_size(self.buffer.len() - pos - 4)?;
        self.rewrite_i32(len, pos);
        Ok(())
    }

    pub fn rewrite_i32(&mut self, value: i32, pos: usize) {
        self.buffer[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn rewrite_u8(&mut self, value: u8, pos: usize) {
        self.buffer[pos] = value;
    }

    /// Open an encapsulation: size placeholder plus encoding version.
    pub fn start_encapsulation(&mut self) {
        self.encaps.push(self.buffer.len());
        self.write_i32(0);
        self.write_u8(ENCODING_MAJOR);
        self.write_u8(ENCODING_MINOR);
    }

    /// Close the innermost encapsulation. The size includes its header.
    pub fn end_encapsulation(&mut self) -> Result<()> {
        let start = self
            .encaps
            .pop()
            .ok_or_else(|| Error::malformed("end_encapsulation without start"))?;
        let len = checked_size(self.buffer.len() - start)?;
        self.rewrite_i32(len, start);
        Ok(())
    }

    pub fn pos(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
