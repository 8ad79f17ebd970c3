// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire primitives for the 1.1 encoding.
//!
//! [`OutputStream`] and [`InputStream`] hold the buffer and the cursor. They
//! know fixed-width little-endian primitives, the size encoding, strings,
//! optional-member headers, size brackets and encapsulations. They know
//! nothing about type descriptors: everything above the byte level lives in
//! [`crate::descriptor`] and [`crate::graph`].
//!
//! ```text
//! size          : v <= 254 -> [v]          | v > 254 -> [0xFF, i32 LE]
//! optional head : tag < 30 -> [tag<<3|fmt] | else    -> [30<<3|fmt, size(tag)]
//! encapsulation : [i32 size incl. header][major][minor] payload
//! ```

mod input;
mod output;

pub use input::InputStream;
pub use output::OutputStream;

use crate::error::{Error, Result};

/// How an optional member announces the extent of its payload, so that a
/// decoder unaware of the member can skip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OptionalFormat {
    /// One byte.
    F1 = 0,
    /// Two bytes.
    F2 = 1,
    /// Four bytes.
    F4 = 2,
    /// Eight bytes.
    F8 = 3,
    /// A single size value (count of one-byte elements, or an enumerator).
    Size = 4,
    /// A size giving the byte length of the payload, then the payload.
    VSize = 5,
    /// A 4-byte byte length, then the payload.
    FSize = 6,
    /// A class instance reference.
    Class = 7,
}

impl OptionalFormat {
    /// Decode the low three bits of an optional header.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::F1,
            1 => Self::F2,
            2 => Self::F4,
            3 => Self::F8,
            4 => Self::Size,
            5 => Self::VSize,
            6 => Self::FSize,
            _ => Self::Class,
        }
    }

    /// Payload width for the fixed formats.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::F1 => Some(1),
            Self::F2 => Some(2),
            Self::F4 => Some(4),
            Self::F8 => Some(8),
            _ => None,
        }
    }
}

/// Convert a host length into a wire size.
pub(crate) fn checked_size(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::validation(format!("length {len} exceeds i32::MAX")))
}
