// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use dynwire::{Codec, PrimitiveKind, SchemaRegistry};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let registry = Arc::new(SchemaRegistry::new());
    let Ok(base) = registry
        .exception_builder("::Fuzz::Failure")
        .member("reason", PrimitiveKind::String)
        .optional("code", PrimitiveKind::Int, 1)
        .define()
    else {
        return;
    };
    let _ = registry
        .exception_builder("::Fuzz::Timeout")
        .base(base)
        .member("millis", PrimitiveKind::Long)
        .define();
    let codec = Codec::new(registry);
    let _ = codec.unmarshal_exception(data);
});
