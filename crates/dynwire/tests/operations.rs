// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request and reply bodies built from operation signatures.

use dynwire::{
    Codec, DataMember, EncodingConfig, Error, ExceptionValue, FormatType, MarshalError, ObjectRef,
    Operation, PrimitiveKind, SchemaRegistry, TypeDescriptor, Value,
};
use std::sync::Arc;

fn int() -> TypeDescriptor {
    PrimitiveKind::Int.into()
}

#[test]
fn test_shared_instance_across_parameters() {
    let registry = Arc::new(SchemaRegistry::new());
    let doc = registry
        .class_builder("::Test::Document")
        .member("title", PrimitiveKind::String)
        .define()
        .expect("document");
    let op = Operation::new("compare")
        .in_param(DataMember::new("left", TypeDescriptor::Class(doc.clone())))
        .in_param(DataMember::new("right", TypeDescriptor::Class(doc.clone())));
    let codec = Codec::new(registry);

    let shared = ObjectRef::new(&doc).with("title", "draft");
    let bytes = op
        .marshal_params(&codec, &[Value::Object(shared.clone()), Value::Object(shared)])
        .expect("marshal");
    let args = op.unmarshal_params(&codec, &bytes).expect("unmarshal");
    let left = args[0].as_object().expect("left");
    let right = args[1].as_object().expect("right");
    assert!(left.ptr_eq(right));
    assert_eq!(left.get("title"), Some(Value::from("draft")));
}

#[test]
fn test_optional_out_params() {
    let codec = Codec::new(Arc::new(SchemaRegistry::new()));
    let op = Operation::new("lookup")
        .returns(DataMember::new("found", PrimitiveKind::Bool.into()))
        .out_param(DataMember::tagged("hits", int(), 2))
        .out_param(DataMember::tagged("label", PrimitiveKind::String.into(), 1));

    let full = Value::Tuple(vec![Value::Bool(true), Value::Int(4), Value::from("x")]);
    let bytes = op.marshal_result(&codec, &full).expect("marshal");
    assert_eq!(op.unmarshal_result(&codec, &bytes).expect("unmarshal"), full);

    let sparse = Value::Tuple(vec![Value::Bool(false), Value::Unset, Value::Unset]);
    let bytes = op.marshal_result(&codec, &sparse).expect("marshal");
    assert_eq!(bytes.len(), 6 + 1);
    assert_eq!(op.unmarshal_result(&codec, &bytes).expect("unmarshal"), sparse);
}

#[test]
fn test_newer_reply_read_by_older_signature() {
    let codec = Codec::new(Arc::new(SchemaRegistry::new()));
    let newer = Operation::new("stat")
        .returns(DataMember::new("size", PrimitiveKind::Long.into()))
        .out_param(DataMember::tagged("owner", PrimitiveKind::String.into(), 5));
    let older = Operation::new("stat").returns(DataMember::new("size", PrimitiveKind::Long.into()));

    let bytes = newer
        .marshal_result(&codec, &Value::Tuple(vec![Value::Int(1024), Value::from("root")]))
        .expect("marshal");
    assert_eq!(older.unmarshal_result(&codec, &bytes).expect("unmarshal"), Value::Int(1024));
}

#[test]
fn test_declared_exceptions() {
    let registry = Arc::new(SchemaRegistry::new());
    let base = registry
        .exception_builder("::Test::IoError")
        .member("path", PrimitiveKind::String)
        .define()
        .expect("base");
    let derived = registry
        .exception_builder("::Test::NotFound")
        .base(base.clone())
        .define()
        .expect("derived");
    let unrelated = registry
        .exception_builder("::Test::Busy")
        .define()
        .expect("unrelated");
    let codec = Codec::new(registry);
    let op = Operation::new("open").throws(base);

    // Derived from a declared exception: accepted both ways.
    let thrown = ExceptionValue::new(&derived).with("path", "/tmp/x");
    let bytes = op.marshal_exception(&codec, &thrown).expect("marshal");
    let caught = op.unmarshal_exception(&codec, &bytes).expect("unmarshal");
    assert_eq!(caught.type_id(), "::Test::NotFound");
    assert_eq!(caught.get("path"), Some(&Value::from("/tmp/x")));

    let err = op
        .marshal_exception(&codec, &ExceptionValue::new(&unrelated))
        .unwrap_err();
    assert!(matches!(err, Error::Marshal(MarshalError::UnknownUserException(_))));

    // Raised by a peer that does not respect the signature.
    let bytes = codec
        .marshal_exception(&ExceptionValue::new(&unrelated))
        .expect("marshal");
    let err = op.unmarshal_exception(&codec, &bytes).unwrap_err();
    assert!(matches!(
        err,
        Error::Marshal(MarshalError::UnknownUserException(ref id)) if id == "::Test::Busy"
    ));
}

#[test]
fn test_operation_format_overrides_codec() {
    let registry = Arc::new(SchemaRegistry::new());
    let leaf = registry
        .class_builder("::Test::Leaf")
        .member("n", PrimitiveKind::Int)
        .define()
        .expect("leaf");
    let sliced = Codec::new(registry.clone());
    let compact = Codec::with_config(
        registry,
        EncodingConfig::default().with_format(FormatType::Compact),
    );
    let param = || DataMember::new("leaf", TypeDescriptor::Class(leaf.clone()));
    let args = [Value::Object(ObjectRef::new(&leaf).with("n", 1))];

    let default_op = Operation::new("put").in_param(param());
    let compact_op = Operation::new("put")
        .in_param(param())
        .with_format(FormatType::Compact);

    let a = compact_op.marshal_params(&sliced, &args).expect("override");
    let b = default_op.marshal_params(&compact, &args).expect("codec compact");
    let c = default_op.marshal_params(&sliced, &args).expect("codec sliced");
    assert_eq!(a, b);
    // The sliced body carries a 4-byte slice size.
    assert_eq!(c.len(), a.len() + 4);
    assert!(compact_op.unmarshal_params(&sliced, &a).is_ok());
}
