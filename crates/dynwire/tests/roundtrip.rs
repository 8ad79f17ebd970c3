// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Round trips across the type system.

#![allow(clippy::float_cmp)]

use dynwire::{
    Codec, DictionaryMapping, Error, HostError, MarshalError, MemberMetadata,
    PrimitiveArray, PrimitiveKind, ProxyRef, SchemaRegistry, SequenceMapping, TypeDescriptor,
    Value,
};
use std::sync::Arc;

const SEQUENCE_SIZES: [usize; 13] = [0, 1, 2, 126, 127, 128, 129, 253, 254, 255, 256, 257, 1000];

fn setup() -> (Arc<SchemaRegistry>, Codec) {
    let registry = Arc::new(SchemaRegistry::new());
    let codec = Codec::new(registry.clone());
    (registry, codec)
}

fn size_prefix_len(count: usize) -> usize {
    if count <= 254 {
        1
    } else {
        5
    }
}

#[test]
fn test_sequence_sizes_every_mapping() {
    let (registry, codec) = setup();
    let ints = registry
        .define_sequence("::Test::Ints", PrimitiveKind::Int.into(), SequenceMapping::List)
        .expect("ints");
    let tuple = registry
        .define_sequence("::Test::IntTuple", PrimitiveKind::Int.into(), SequenceMapping::Tuple)
        .expect("tuple");
    let array = registry
        .define_sequence("::Test::IntArray", PrimitiveKind::Int.into(), SequenceMapping::Array)
        .expect("array");
    let strings = registry
        .define_sequence("::Test::Strings", PrimitiveKind::String.into(), SequenceMapping::List)
        .expect("strings");

    for n in SEQUENCE_SIZES {
        let values: Vec<i32> = (0..n as i32).map(|i| i * 7 - 300).collect();
        let list = Value::Sequence(values.iter().map(|&v| Value::Int(v.into())).collect());
        let bytes = codec.marshal(&ints, &list).expect("list");
        assert_eq!(bytes.len(), 6 + size_prefix_len(n) + 4 * n, "n = {n}");
        assert_eq!(codec.unmarshal(&ints, &bytes).expect("list"), list);

        let tup = Value::Tuple(values.iter().map(|&v| Value::Int(v.into())).collect());
        let tuple_bytes = codec.marshal(&tuple, &tup).expect("tuple");
        assert_eq!(tuple_bytes, bytes);
        assert_eq!(codec.unmarshal(&tuple, &tuple_bytes).expect("tuple"), tup);

        let arr = Value::Array(PrimitiveArray::Int(values.clone()));
        let array_bytes = codec.marshal(&array, &arr).expect("array");
        assert_eq!(array_bytes, bytes, "bulk and element-wise agree, n = {n}");
        assert_eq!(codec.unmarshal(&array, &array_bytes).expect("array"), arr);

        let text = Value::Sequence((0..n).map(|i| Value::from(format!("s{i}"))).collect());
        let bytes = codec.marshal(&strings, &text).expect("strings");
        assert_eq!(codec.unmarshal(&strings, &bytes).expect("strings"), text);
    }
}

#[test]
fn test_array_element_kind_mismatch() {
    let (registry, codec) = setup();
    let shorts = registry
        .define_sequence("::Test::Shorts", PrimitiveKind::Short.into(), SequenceMapping::Array)
        .expect("shorts");
    let err = codec
        .marshal(&shorts, &Value::Array(PrimitiveArray::Int(vec![1, 2])))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Marshal(MarshalError::UnexpectedType { .. })
    ));
}

#[test]
fn test_every_primitive_array() {
    let (registry, codec) = setup();
    let cases = [
        (PrimitiveKind::Bool, PrimitiveArray::Bool(vec![true, false, true])),
        (PrimitiveKind::Byte, PrimitiveArray::Byte(vec![0, 127, 255])),
        (PrimitiveKind::Short, PrimitiveArray::Short(vec![i16::MIN, 0, i16::MAX])),
        (PrimitiveKind::Long, PrimitiveArray::Long(vec![i64::MIN, -1, i64::MAX])),
        (PrimitiveKind::Float, PrimitiveArray::Float(vec![0.5, -1.25, f32::MAX])),
        (PrimitiveKind::Double, PrimitiveArray::Double(vec![1e300, -0.0, 3.5])),
    ];
    for (i, (kind, array)) in cases.into_iter().enumerate() {
        let ty = registry
            .define_sequence(&format!("::Test::Arr{i}"), kind.into(), SequenceMapping::Array)
            .expect("seq");
        let value = Value::Array(array);
        let bytes = codec.marshal(&ty, &value).expect("marshal");
        assert_eq!(codec.unmarshal(&ty, &bytes).expect("unmarshal"), value, "{kind:?}");
    }
}

#[test]
fn test_enum_bounds() {
    let (registry, codec) = setup();
    let sparse = registry
        .enum_builder("::Test::Sparse")
        .variant_value("low", 0)
        .variant_value("high", 300)
        .define()
        .expect("enum");

    let bytes = codec.marshal(&sparse, &Value::Enum(300)).expect("300");
    // Large enumerators use the long size form.
    assert_eq!(&bytes[6..], &[0xFF, 0x2C, 0x01, 0, 0]);
    assert_eq!(codec.unmarshal(&sparse, &bytes).expect("300"), Value::Enum(300));

    assert!(matches!(
        codec.marshal(&sparse, &Value::Enum(5)),
        Err(Error::Validation(_))
    ));

    // 5 is inside 0..=max but not an enumerator.
    let bad = [7, 0, 0, 0, 1, 1, 5];
    assert!(matches!(
        codec.unmarshal(&sparse, &bad),
        Err(Error::Marshal(MarshalError::EnumeratorOutOfRange { value: 5, .. }))
    ));
}

#[test]
fn test_dictionary_and_custom_factories() {
    let (registry, codec) = setup();
    let dict = registry
        .define_dictionary("::Test::Counts", PrimitiveKind::String.into(), PrimitiveKind::Long.into())
        .expect("dict");
    let value = Value::Dictionary(vec![
        (Value::from("a"), Value::Int(1)),
        (Value::from("b"), Value::Int(-1)),
    ]);
    let bytes = codec.marshal(&dict, &value).expect("marshal");
    assert_eq!(codec.unmarshal(&dict, &bytes).expect("unmarshal"), value);

    let counter = |entries: Vec<(Value, Value)>| -> Result<Value, HostError> {
        Ok(Value::Int(entries.len() as i64))
    };
    let rejecting = |_: Vec<Value>| -> Result<Value, HostError> {
        Err(HostError::new(std::io::Error::other("container refused")))
    };
    let seq = registry
        .define_sequence("::Test::Longs", PrimitiveKind::Long.into(), SequenceMapping::List)
        .expect("seq");
    let holder = registry
        .struct_builder("::Test::Holder")
        .member_with_metadata(
            "counts",
            dict,
            MemberMetadata::default().with_dictionary_mapping(DictionaryMapping::Custom(Arc::new(counter))),
        )
        .member_with_metadata(
            "longs",
            seq,
            MemberMetadata::default().with_sequence_mapping(SequenceMapping::Custom(Arc::new(rejecting))),
        )
        .define()
        .expect("holder");

    let input = Value::structure([("counts", value), ("longs", Value::Sequence(vec![Value::Int(4)]))]);
    let bytes = codec.marshal(&holder, &input).expect("marshal");
    let err = codec.unmarshal(&holder, &bytes).unwrap_err();
    let host = err.as_host().expect("host error");
    assert_eq!(host.to_string(), "container refused");
    assert!(!err.is_retryable());
}

#[test]
fn test_dictionary_rejects_class_keys() {
    let (registry, _) = setup();
    let class = registry.class_builder("::Test::K").define().expect("class");
    assert!(matches!(
        registry.define_dictionary(
            "::Test::ByClass",
            TypeDescriptor::Class(class),
            PrimitiveKind::Int.into()
        ),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_optional_struct_and_sequence_members() {
    let (registry, codec) = setup();
    let point = registry
        .struct_builder("::Test::Point")
        .member("x", PrimitiveKind::Int)
        .member("y", PrimitiveKind::Int)
        .define()
        .expect("point");
    let label = registry
        .struct_builder("::Test::Label")
        .member("text", PrimitiveKind::String)
        .define()
        .expect("label");
    let ints = registry
        .define_sequence("::Test::Ints", PrimitiveKind::Int.into(), SequenceMapping::List)
        .expect("ints");
    let words = registry
        .define_sequence("::Test::Words", PrimitiveKind::String.into(), SequenceMapping::List)
        .expect("words");
    let shape = registry
        .class_builder("::Test::Shape")
        .optional("origin", point, 1)
        .optional("label", label, 2)
        .optional("ints", ints, 3)
        .optional("words", words, 4)
        .optional("scale", PrimitiveKind::Float, 5)
        .define()
        .expect("shape");

    let object = dynwire::ObjectRef::new(&shape)
        .with("origin", Value::structure([("x", Value::Int(1)), ("y", Value::Int(2))]))
        .with("label", Value::structure([("text", Value::from("tri"))]))
        .with("ints", Value::Sequence((0..300).map(Value::Int).collect()))
        .with("words", Value::Sequence(vec![Value::from("a"), Value::from("bc")]))
        .with("scale", 2.0);
    let ty = TypeDescriptor::Class(shape.clone());
    let bytes = codec.marshal(&ty, &Value::Object(object.clone())).expect("marshal");
    let decoded = codec.unmarshal(&ty, &bytes).expect("unmarshal");
    let decoded = decoded.as_object().expect("object");
    for name in ["origin", "label", "ints", "words", "scale"] {
        assert_eq!(decoded.get(name), object.get(name), "{name}");
    }

    // A reader with none of the optionals skips every payload format.
    let older = Arc::new(SchemaRegistry::new());
    let bare = older.class_builder("::Test::Shape").define().expect("bare");
    let decoded = Codec::new(older)
        .unmarshal(&TypeDescriptor::Class(bare), &bytes)
        .expect("skip all");
    assert!(decoded.as_object().expect("object").get("origin").is_none());
}

#[test]
fn test_proxy_with_endpoints_and_facet() {
    let (registry, codec) = setup();
    let iface = registry
        .define_proxy("::Test::Printer", Vec::new(), Vec::new())
        .expect("iface");
    let proxy = ProxyRef {
        interface: "::Test::Printer".into(),
        identity: dynwire::Identity {
            name: "printer".into(),
            category: "office".into(),
        },
        facet: Some("color".into()),
        mode: dynwire::InvocationMode::Oneway,
        secure: true,
        endpoints: vec![dynwire::OpaqueEndpoint {
            kind: 1,
            encapsulation: vec![8, 0, 0, 0, 1, 1, 0xAA, 0xBB],
        }],
        adapter_id: String::new(),
    };
    let value = Value::Proxy(proxy);
    let bytes = codec.marshal(&iface, &value).expect("marshal");
    assert_eq!(codec.unmarshal(&iface, &bytes).expect("unmarshal"), value);
}

#[test]
fn test_declared_proxy_cannot_decode() {
    let (registry, codec) = setup();
    let declared = registry.declare_proxy("::Test::Later").expect("declare");
    let ty = TypeDescriptor::Proxy(declared);
    let proxy = ProxyRef {
        interface: "::Test::Later".into(),
        ..ProxyRef::indirect("x", "a")
    };
    let bytes = codec.marshal(&ty, &Value::Proxy(proxy)).expect("marshal");
    assert!(matches!(
        codec.unmarshal(&ty, &bytes),
        Err(Error::Configuration(_))
    ));
    let null = codec.marshal(&ty, &Value::Null).expect("null");
    assert_eq!(codec.unmarshal(&ty, &null).expect("null"), Value::Null);
}

#[test]
fn test_float_range_validation() {
    let (_, codec) = setup();
    let float: TypeDescriptor = PrimitiveKind::Float.into();
    assert!(matches!(
        codec.marshal(&float, &Value::Float(1e39)),
        Err(Error::Validation(_))
    ));
    let bytes = codec.marshal(&float, &Value::Float(f64::INFINITY)).expect("inf");
    assert_eq!(
        codec.unmarshal(&float, &bytes).expect("inf"),
        Value::Float(f64::INFINITY)
    );
}

#[test]
fn test_truncated_input() {
    let (registry, codec) = setup();
    let ints = registry
        .define_sequence("::Test::Ints", PrimitiveKind::Int.into(), SequenceMapping::List)
        .expect("ints");
    let bytes = codec
        .marshal(&ints, &Value::Sequence(vec![Value::Int(1), Value::Int(2)]))
        .expect("marshal");
    for cut in 0..bytes.len() {
        assert!(codec.unmarshal(&ints, &bytes[..cut]).is_err(), "cut at {cut}");
    }
}

#[test]
fn test_randomized_struct_round_trips() {
    let (registry, codec) = setup();
    let doubles = registry
        .define_sequence("::Test::Doubles", PrimitiveKind::Double.into(), SequenceMapping::List)
        .expect("doubles");
    let reading = registry
        .struct_builder("::Test::Reading")
        .member("id", PrimitiveKind::Long)
        .member("flag", PrimitiveKind::Bool)
        .member("level", PrimitiveKind::Short)
        .member("name", PrimitiveKind::String)
        .member("samples", doubles)
        .define()
        .expect("reading");
    let readings = registry
        .define_sequence("::Test::Readings", reading.clone(), SequenceMapping::List)
        .expect("readings");

    let mut rng = fastrand::Rng::with_seed(0x5EED);
    for _ in 0..50 {
        let count = rng.usize(0..20);
        let items = (0..count)
            .map(|_| {
                let name: String = (0..rng.usize(0..300)).map(|_| rng.alphanumeric()).collect();
                let samples = (0..rng.usize(0..40)).map(|_| Value::Float(rng.f64())).collect();
                Value::structure([
                    ("id", Value::Int(rng.i64(..))),
                    ("flag", Value::Bool(rng.bool())),
                    ("level", Value::Int(i64::from(rng.i16(..)))),
                    ("name", Value::String(name)),
                    ("samples", Value::Sequence(samples)),
                ])
            })
            .collect();
        let value = Value::Sequence(items);
        let bytes = codec.marshal(&readings, &value).expect("marshal");
        assert_eq!(codec.unmarshal(&readings, &bytes).expect("unmarshal"), value);
    }
}

#[test]
fn test_struct_member_declaration_order() {
    // Members are encoded in declaration order regardless of map order.
    let (registry, codec) = setup();
    let pair = registry
        .struct_builder("::Test::Pair")
        .member("b", PrimitiveKind::Byte)
        .member("a", PrimitiveKind::Byte)
        .define()
        .expect("pair");
    let bytes = codec
        .marshal(&pair, &Value::structure([("a", Value::Int(1)), ("b", Value::Int(2))]))
        .expect("marshal");
    assert_eq!(&bytes[6..], &[2, 1]);
}
