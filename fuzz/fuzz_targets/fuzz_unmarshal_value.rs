// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use dynwire::{
    Codec, DataMember, PrimitiveKind, SchemaRegistry, SequenceMapping, TypeDescriptor,
};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

/// A schema touching every decoder path: cyclic classes, optionals,
/// sequences, dictionaries and proxies.
fn schema() -> Option<(Codec, TypeDescriptor)> {
    let registry = Arc::new(SchemaRegistry::new());
    let node = registry.declare_class("::Fuzz::Node").ok()?;
    let node_ty = TypeDescriptor::Class(node.clone());
    let nodes = registry
        .define_sequence("::Fuzz::Nodes", node_ty.clone(), SequenceMapping::List)
        .ok()?;
    let index = registry
        .define_dictionary("::Fuzz::Index", PrimitiveKind::String.into(), node_ty.clone())
        .ok()?;
    let peer = registry.define_proxy("::Fuzz::Peer", Vec::new(), Vec::new()).ok()?;
    registry
        .define_class(
            "::Fuzz::Node",
            Some(3),
            None,
            vec![
                DataMember::new("name", PrimitiveKind::String.into()),
                DataMember::new("children", nodes),
                DataMember::new("index", index),
                DataMember::tagged("parent", node_ty.clone(), 1),
                DataMember::tagged("peer", peer, 2),
            ],
        )
        .ok()?;
    registry
        .define_class("::Fuzz::Leaf", None, Some(node), vec![DataMember::new("n", PrimitiveKind::Long.into())])
        .ok()?;
    Some((Codec::new(registry), node_ty))
}

fuzz_target!(|data: &[u8]| {
    let Some((codec, ty)) = schema() else {
        return;
    };
    if let Ok(value) = codec.unmarshal(&ty, data) {
        let _ = codec.marshal(&ty, &value);
    }
});
