// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Golden vectors: byte-exact encodings of small, deterministic values.
//
// Each vector is checked both ways: encode == expected bytes, and
// decode(expected bytes) re-encodes to the same bytes.

use dynwire::{
    Codec, DataMember, EncodingConfig, ExceptionValue, FormatType, Operation, PrimitiveKind,
    ProxyRef, SchemaRegistry, SequenceMapping, TypeDescriptor, Value,
};
use std::sync::Arc;

/// Prefix `payload` with an encapsulation header for the 1.1 encoding.
fn encaps(payload: &[u8]) -> Vec<u8> {
    let size = (payload.len() + 6) as i32;
    let mut out = size.to_le_bytes().to_vec();
    out.extend_from_slice(&[1, 1]);
    out.extend_from_slice(payload);
    out
}

fn check(codec: &Codec, ty: &TypeDescriptor, value: &Value, payload: &[u8]) {
    let expected = encaps(payload);
    let bytes = codec.marshal(ty, value).expect("marshal");
    assert_eq!(bytes, expected, "encoding of {ty:?}");
    let decoded = codec.unmarshal(ty, &expected).expect("unmarshal");
    let again = codec.marshal(ty, &decoded).expect("re-marshal");
    assert_eq!(again, expected, "re-encoding of {ty:?}");
}

fn sliced(registry: &Arc<SchemaRegistry>) -> Codec {
    Codec::new(registry.clone())
}

fn compact(registry: &Arc<SchemaRegistry>) -> Codec {
    Codec::with_config(
        registry.clone(),
        EncodingConfig::default().with_format(FormatType::Compact),
    )
}

#[test]
fn golden_primitives() {
    let registry = Arc::new(SchemaRegistry::new());
    let codec = sliced(&registry);
    check(&codec, &PrimitiveKind::Bool.into(), &Value::Bool(true), &[1]);
    check(&codec, &PrimitiveKind::Byte.into(), &Value::Int(0xAB), &[0xAB]);
    check(&codec, &PrimitiveKind::Short.into(), &Value::Int(-2), &[0xFE, 0xFF]);
    check(
        &codec,
        &PrimitiveKind::Long.into(),
        &Value::Int(0x0102_0304_0506_0708),
        &[8, 7, 6, 5, 4, 3, 2, 1],
    );
    check(
        &codec,
        &PrimitiveKind::Double.into(),
        &Value::Float(1.0),
        &[0, 0, 0, 0, 0, 0, 0xF0, 0x3F],
    );
    check(
        &codec,
        &PrimitiveKind::String.into(),
        &Value::from("hi"),
        &[2, b'h', b'i'],
    );
}

#[test]
fn golden_size_boundaries() {
    let registry = Arc::new(SchemaRegistry::new());
    let bytes_ty = registry
        .define_sequence("::Test::Bytes", PrimitiveKind::Byte.into(), SequenceMapping::List)
        .expect("seq");
    let codec = sliced(&registry);

    let short = Value::Sequence(vec![Value::Int(0); 254]);
    let bytes = codec.marshal(&bytes_ty, &short).expect("254");
    assert_eq!(bytes[6], 254);
    assert_eq!(bytes.len(), 6 + 1 + 254);

    let long = Value::Sequence(vec![Value::Int(0); 255]);
    let bytes = codec.marshal(&bytes_ty, &long).expect("255");
    assert_eq!(&bytes[6..11], &[0xFF, 255, 0, 0, 0]);
    assert_eq!(bytes.len(), 6 + 5 + 255);
}

#[test]
fn golden_256_ints_use_long_size() {
    let registry = Arc::new(SchemaRegistry::new());
    let ints = registry
        .define_sequence("::Test::Ints", PrimitiveKind::Int.into(), SequenceMapping::List)
        .expect("seq");
    let value = Value::Sequence((0..256).map(Value::Int).collect());
    let mut payload = vec![0xFF, 0x00, 0x01, 0x00, 0x00];
    for i in 0..256i32 {
        payload.extend_from_slice(&i.to_le_bytes());
    }
    check(&sliced(&registry), &ints, &value, &payload);
}

#[test]
fn golden_class_sliced_and_compact() {
    let registry = Arc::new(SchemaRegistry::new());
    let leaf = registry
        .class_builder("::Test::Leaf")
        .member("n", PrimitiveKind::Int)
        .define()
        .expect("leaf");
    let ty = TypeDescriptor::Class(leaf.clone());
    let value = Value::Object(dynwire::ObjectRef::new(&leaf).with("n", 7));

    let mut sliced_payload = vec![0x01, 0x31, 12];
    sliced_payload.extend_from_slice(b"::Test::Leaf");
    sliced_payload.extend_from_slice(&[8, 0, 0, 0, 7, 0, 0, 0]);
    check(&sliced(&registry), &ty, &value, &sliced_payload);

    let mut compact_payload = vec![0x01, 0x21, 12];
    compact_payload.extend_from_slice(b"::Test::Leaf");
    compact_payload.extend_from_slice(&[7, 0, 0, 0]);
    check(&compact(&registry), &ty, &value, &compact_payload);
}

#[test]
fn golden_class_compact_id() {
    let registry = Arc::new(SchemaRegistry::new());
    let leaf = registry
        .class_builder("::Test::Leaf")
        .compact_id(5)
        .member("n", PrimitiveKind::Int)
        .define()
        .expect("leaf");
    let ty = TypeDescriptor::Class(leaf.clone());
    let value = Value::Object(dynwire::ObjectRef::new(&leaf).with("n", 7));
    check(
        &sliced(&registry),
        &ty,
        &value,
        &[0x01, 0x33, 5, 8, 0, 0, 0, 7, 0, 0, 0],
    );
}

#[test]
fn golden_repeated_type_id_uses_index() {
    let registry = Arc::new(SchemaRegistry::new());
    let leaf = registry
        .class_builder("::Test::Leaf")
        .member("n", PrimitiveKind::Int)
        .define()
        .expect("leaf");
    let pair = registry
        .struct_builder("::Test::Pair")
        .member("a", TypeDescriptor::Class(leaf.clone()))
        .member("b", TypeDescriptor::Class(leaf.clone()))
        .define()
        .expect("pair");
    let value = Value::structure([
        ("a", Value::Object(dynwire::ObjectRef::new(&leaf).with("n", 1))),
        ("b", Value::Object(dynwire::ObjectRef::new(&leaf).with("n", 2))),
    ]);

    let mut payload = vec![0x01, 0x31, 12];
    payload.extend_from_slice(b"::Test::Leaf");
    payload.extend_from_slice(&[8, 0, 0, 0, 1, 0, 0, 0]);
    // Second instance: type id index 1.
    payload.extend_from_slice(&[0x01, 0x32, 1, 8, 0, 0, 0, 2, 0, 0, 0]);
    check(&sliced(&registry), &pair, &value, &payload);
}

#[test]
fn golden_shared_instance_back_reference() {
    let registry = Arc::new(SchemaRegistry::new());
    let leaf = registry
        .class_builder("::Test::Leaf")
        .member("n", PrimitiveKind::Int)
        .define()
        .expect("leaf");
    let pair = registry
        .struct_builder("::Test::Pair")
        .member("a", TypeDescriptor::Class(leaf.clone()))
        .member("b", TypeDescriptor::Class(leaf.clone()))
        .define()
        .expect("pair");
    let shared = dynwire::ObjectRef::new(&leaf).with("n", 3);
    let value = Value::structure([
        ("a", Value::Object(shared.clone())),
        ("b", Value::Object(shared)),
    ]);

    let mut payload = vec![0x01, 0x21, 12];
    payload.extend_from_slice(b"::Test::Leaf");
    payload.extend_from_slice(&[3, 0, 0, 0]);
    // First instance index is 2.
    payload.push(2);
    check(&compact(&registry), &pair, &value, &payload);

    let decoded = compact(&registry)
        .unmarshal(&pair, &encaps(&payload))
        .expect("unmarshal");
    let a = decoded.get_field("a").and_then(Value::as_object).expect("a");
    let b = decoded.get_field("b").and_then(Value::as_object).expect("b");
    assert!(a.ptr_eq(b));
}

#[test]
fn golden_exception() {
    let registry = Arc::new(SchemaRegistry::new());
    let err = registry
        .exception_builder("::Test::Err")
        .member("code", PrimitiveKind::Int)
        .define()
        .expect("exception");
    let codec = compact(&registry);
    let value = ExceptionValue::new(&err).with("code", 9);

    let mut payload = vec![0x30, 11];
    payload.extend_from_slice(b"::Test::Err");
    payload.extend_from_slice(&[8, 0, 0, 0, 9, 0, 0, 0]);
    let bytes = codec.marshal_exception(&value).expect("marshal");
    assert_eq!(bytes, encaps(&payload));
    let decoded = codec.unmarshal_exception(&bytes).expect("unmarshal");
    assert_eq!(decoded.type_id(), "::Test::Err");
    assert_eq!(decoded.get("code"), Some(&Value::Int(9)));
}

#[test]
fn golden_exception_class_member_inline_in_compact() {
    let registry = Arc::new(SchemaRegistry::new());
    let leaf = registry
        .class_builder("::Test::Leaf")
        .member("n", PrimitiveKind::Int)
        .define()
        .expect("leaf");
    let err = registry
        .exception_builder("::Test::Err")
        .member("item", TypeDescriptor::Class(leaf.clone()))
        .define()
        .expect("exception");
    let item = dynwire::ObjectRef::new(&leaf).with("n", 3);
    let value = ExceptionValue::new(&err).with("item", item);

    // No indirection table: the instance follows its marker inside the slice.
    let mut payload = vec![0x30, 11];
    payload.extend_from_slice(b"::Test::Err");
    payload.extend_from_slice(&[23, 0, 0, 0, 1, 0x21, 12]);
    payload.extend_from_slice(b"::Test::Leaf");
    payload.extend_from_slice(&[3, 0, 0, 0]);
    let codec = compact(&registry);
    let bytes = codec.marshal_exception(&value).expect("marshal");
    assert_eq!(bytes, encaps(&payload));
    let decoded = codec.unmarshal_exception(&bytes).expect("unmarshal");
    let item = decoded.get("item").and_then(Value::as_object).expect("item");
    assert_eq!(item.get("n"), Some(Value::Int(3)));

    // Sliced format moves the instance into the slice's table.
    let bytes = sliced(&registry).marshal_exception(&value).expect("marshal");
    assert_eq!(bytes[6], 0x38);
    let decoded = sliced(&registry).unmarshal_exception(&bytes).expect("unmarshal");
    let item = decoded.get("item").and_then(Value::as_object).expect("item");
    assert_eq!(item.get("n"), Some(Value::Int(3)));
}

#[test]
fn golden_optional_parameter_with_large_tag() {
    let registry = Arc::new(SchemaRegistry::new());
    let codec = sliced(&registry);
    let op = Operation::new("op").in_param(DataMember::tagged("p", PrimitiveKind::Int.into(), 40));
    let bytes = op.marshal_params(&codec, &[Value::Int(1)]).expect("marshal");
    assert_eq!(bytes, encaps(&[(30 << 3) | 2, 40, 1, 0, 0, 0]));
    assert_eq!(
        op.unmarshal_params(&codec, &bytes).expect("unmarshal"),
        vec![Value::Int(1)]
    );
}

#[test]
fn golden_proxies() {
    let registry = Arc::new(SchemaRegistry::new());
    let iface = registry
        .define_proxy("::Test::Printer", Vec::new(), Vec::new())
        .expect("proxy");
    let codec = sliced(&registry);
    check(&codec, &iface, &Value::Null, &[0, 0]);

    let proxy = ProxyRef {
        interface: "::Test::Printer".into(),
        ..ProxyRef::indirect("obj", "adapter")
    };
    let mut payload = vec![3, b'o', b'b', b'j', 0, 0, 0, 0, 1, 0, 1, 1, 0, 7];
    payload.extend_from_slice(b"adapter");
    check(&codec, &iface, &Value::Proxy(proxy), &payload);
}
