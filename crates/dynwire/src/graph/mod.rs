// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call object graph state.
//!
//! [`ObjectGraphTracker`] (write side) assigns instance indices, deduplicates
//! repeated references, frames slices and emits indirection tables.
//! [`PatchResolver`] (read side) mirrors it: it registers every instance
//! before its members are read, so back-references and cycles resolve to the
//! same handle, and it patches references deferred through an indirection
//! table into the slice that held them.
//!
//! Both are created fresh for each marshal or unmarshal call and are never
//! shared between calls.
//!
//! ```text
//! reference   : size(0) null | size(1) instance | size(n>1) earlier instance n
//!               (inside a sliced-format slice: size(k) = k-th table entry)
//! instance    : slice+            most-derived first
//! slice       : flags u8, [type id], [i32 size], members, [optionals 0xFF],
//!               [size(n) reference*n]  indirection table
//! ```

mod decoder;
mod encoder;

pub use decoder::{PatchResolver, PathStep};
pub use encoder::ObjectGraphTracker;

/// Slices of class instances and slices of exceptions differ in how the
/// type id is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SliceKind {
    Value,
    Exception,
}
