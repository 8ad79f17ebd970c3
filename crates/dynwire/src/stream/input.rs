// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked input cursor.

use super::OptionalFormat;
use crate::config::{
    ENCAPSULATION_HEADER_SIZE, ENCODING_MAJOR, ENCODING_MINOR, OPTIONAL_END_MARKER,
    OPTIONAL_TAG_INLINE_MAX, SIZE_LONG_MARKER,
};
use crate::error::{Error, MarshalError, Result};

/// Generate little-endian read methods for fixed-width primitives.
///
/// Each generated method checks bounds (returning
/// [`MarshalError::UnexpectedEnd`] on overflow), decodes the bytes and
/// advances the offset.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Input cursor over a borrowed buffer.
#[derive(Debug)]
pub struct InputStream<'a> {
    buffer: &'a [u8],
    offset: usize,
    /// End offsets of the open encapsulations, innermost last.
    encaps: Vec<usize>,
}

impl<'a> InputStream<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            encaps: Vec::new(),
        }
    }

    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_i64, i64, 8);
    impl_read_le!(read_f32, f32, 4);
    impl_read_le!(read_f64, f64, 8);

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let limit = self.limit();
        if len > limit.saturating_sub(self.offset) {
            return Err(MarshalError::UnexpectedEnd {
                offset: self.offset,
                need: len,
                have: limit.saturating_sub(self.offset),
            }
            .into());
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    /// Read a size (see [`OutputStream::write_size`](super::OutputStream::write_size)).
    pub fn read_size(&mut self) -> Result<usize> {
        let first = self.read_u8()?;
        if first == SIZE_LONG_MARKER {
            let size = self.read_i32()?;
            if size < 0 {
                return Err(MarshalError::InvalidSize(size).into());
            }
            Ok(size as usize)
        } else {
            Ok(usize::from(first))
        }
    }

    pub fn skip_size(&mut self) -> Result<()> {
        self.read_size().map(|_| ())
    }

    /// Read an element count and check it against the remaining bytes and
    /// the configured maximum, so a corrupt count cannot trigger a huge
    /// allocation.
    pub fn read_and_check_seq_size(&mut self, min_wire_size: usize, max_len: usize) -> Result<usize> {
        let count = self.read_size()?;
        if count > max_len {
            return Err(Error::malformed(format!(
                "sequence length {count} exceeds maximum allowed ({max_len})"
            )));
        }
        let need = count.saturating_mul(min_wire_size.max(1));
        if need > self.remaining() {
            return Err(MarshalError::UnexpectedEnd {
                offset: self.offset,
                need,
                have: self.remaining(),
            }
            .into());
        }
        Ok(count)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_size()?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::malformed(format!("invalid UTF-8 string: {e}")))
    }

    /// Read an enumerator written by [`OutputStream::write_enum`](super::OutputStream::write_enum).
    /// Range checking against the enumerator map belongs to the caller.
    pub fn read_enum(&mut self) -> Result<i32> {
        let value = self.read_size()?;
        i32::try_from(value).map_err(|_| Error::malformed(format!("enumerator {value} too large")))
    }

    /// Read the next optional-member header without interpreting it.
    ///
    /// Returns `None`, leaving the cursor untouched, at the end marker or at
    /// the end of the current encapsulation. Otherwise returns the tag, the
    /// format and the offset where the header started (to rewind).
    pub fn read_optional_header(&mut self) -> Result<Option<(i32, OptionalFormat, usize)>> {
        if self.offset >= self.limit() {
            return Ok(None);
        }
        let start = self.offset;
        let head = self.read_u8()?;
        if head == OPTIONAL_END_MARKER {
            self.offset = start;
            return Ok(None);
        }
        let format = OptionalFormat::from_bits(head);
        let mut tag = i32::from(head >> 3);
        if tag == OPTIONAL_TAG_INLINE_MAX {
            tag = i32::try_from(self.read_size()?)
                .map_err(|_| Error::malformed("optional tag too large"))?;
        }
        Ok(Some((tag, format, start)))
    }

    /// Skip the payload of an optional member with a non-class format.
    pub fn skip_optional_payload(&mut self, format: OptionalFormat) -> Result<()> {
        match format {
            OptionalFormat::F1 | OptionalFormat::F2 | OptionalFormat::F4 | OptionalFormat::F8 => {
                self.skip(format.fixed_width().unwrap_or(0))
            }
            OptionalFormat::Size => self.skip_size(),
            OptionalFormat::VSize => {
                let len = self.read_size()?;
                self.skip(len)
            }
            OptionalFormat::FSize => {
                let len = self.read_i32()?;
                if len < 0 {
                    return Err(MarshalError::InvalidSize(len).into());
                }
                self.skip(len as usize)
            }
            OptionalFormat::Class => Err(Error::malformed(
                "class optional must be skipped through the object graph",
            )),
        }
    }

    /// Open an encapsulation and return its encoding version.
    pub fn start_encapsulation(&mut self) -> Result<(u8, u8)> {
        let start = self.offset;
        let size = self.read_i32()?;
        if size < ENCAPSULATION_HEADER_SIZE {
            return Err(MarshalError::InvalidSize(size).into());
        }
        let end = start + size as usize;
        if end > self.limit() {
            return Err(MarshalError::UnexpectedEnd {
                offset: start,
                need: size as usize,
                have: self.limit() - start,
            }
            .into());
        }
        let major = self.read_u8()?;
        let minor = self.read_u8()?;
        if (major, minor) != (ENCODING_MAJOR, ENCODING_MINOR) {
            return Err(MarshalError::UnsupportedEncoding { major, minor }.into());
        }
        self.encaps.push(end);
        Ok((major, minor))
    }

    /// Close the innermost encapsulation; every byte must have been consumed.
    pub fn end_encapsulation(&mut self) -> Result<()> {
        let end = self
            .encaps
            .pop()
            .ok_or_else(|| Error::malformed("end_encapsulation without start"))?;
        if self.offset != end {
            return Err(Error::malformed(format!(
                "encapsulation not fully consumed: {} bytes left",
                end.saturating_sub(self.offset)
            )));
        }
        Ok(())
    }

    /// Skip a whole encapsulation without decoding it; returns the raw bytes
    /// including the header.
    pub fn read_encapsulation_blob(&mut self) -> Result<&'a [u8]> {
        let start = self.offset;
        let size = self.read_i32()?;
        if size < ENCAPSULATION_HEADER_SIZE {
            return Err(MarshalError::InvalidSize(size).into());
        }
        self.offset = start;
        self.read_bytes(size as usize)
    }

    pub fn pos(&self) -> usize {
        self.offset
    }

    /// Move the cursor back to a position returned by [`pos`](Self::pos).
    pub fn rewind(&mut self, pos: usize) {
        debug_assert!(pos <= self.offset);
        self.offset = pos;
    }

    /// Bytes left before the end of the current encapsulation (or buffer).
    pub fn remaining(&self) -> usize {
        self.limit().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Raw bytes between two positions already read.
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.buffer[start..end]
    }

    fn limit(&self) -> usize {
        self.encaps.last().copied().unwrap_or(self.buffer.len())
    }
}
