// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Marshaling Throughput Benchmark
//!
//! Measures encode and decode cost for:
//! - Primitive sequences (element-wise list vs bulk array mapping)
//! - Structs with string members
//! - Class graphs (linked lists) in compact and sliced format

#![allow(clippy::uninlined_format_args)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dynwire::{
    Codec, EncodingConfig, FormatType, ObjectRef, PrimitiveArray, PrimitiveKind, SchemaRegistry,
    SequenceMapping, TypeDescriptor, Value,
};
use std::hint::black_box as bb;
use std::sync::Arc;

fn bench_int_sequences(c: &mut Criterion) {
    let mut group = c.benchmark_group("int_sequence");
    let registry = Arc::new(SchemaRegistry::new());
    let list = registry
        .define_sequence("::Bench::IntList", PrimitiveKind::Int.into(), SequenceMapping::List)
        .expect("list");
    let array = registry
        .define_sequence("::Bench::IntArray", PrimitiveKind::Int.into(), SequenceMapping::Array)
        .expect("array");
    let codec = Codec::new(registry);

    for len in [16usize, 1024, 65536] {
        group.throughput(Throughput::Bytes((len * 4) as u64));
        let as_list = Value::Sequence((0..len as i64).map(Value::Int).collect());
        let as_array = Value::Array(PrimitiveArray::Int((0..len as i32).collect()));

        group.bench_with_input(BenchmarkId::new("list_encode", len), &as_list, |b, v| {
            b.iter(|| codec.marshal(&list, bb(v)).expect("encode"));
        });
        group.bench_with_input(BenchmarkId::new("array_encode", len), &as_array, |b, v| {
            b.iter(|| codec.marshal(&array, bb(v)).expect("encode"));
        });

        let bytes = codec.marshal(&array, &as_array).expect("encode");
        group.bench_with_input(BenchmarkId::new("list_decode", len), &bytes, |b, bytes| {
            b.iter(|| codec.unmarshal(&list, bb(bytes)).expect("decode"));
        });
        group.bench_with_input(BenchmarkId::new("array_decode", len), &bytes, |b, bytes| {
            b.iter(|| codec.unmarshal(&array, bb(bytes)).expect("decode"));
        });
    }

    group.finish();
}

fn bench_struct(c: &mut Criterion) {
    let registry = Arc::new(SchemaRegistry::new());
    let reading = registry
        .struct_builder("::Bench::Reading")
        .member("sensor", PrimitiveKind::String)
        .member("value", PrimitiveKind::Double)
        .member("sequence", PrimitiveKind::Long)
        .define()
        .expect("struct");
    let codec = Codec::new(registry);
    let value = Value::structure([
        ("sensor", Value::from("thermo-01")),
        ("value", Value::Float(21.5)),
        ("sequence", Value::Int(42)),
    ]);
    let bytes = codec.marshal(&reading, &value).expect("encode");

    c.bench_function("struct_encode", |b| {
        b.iter(|| codec.marshal(&reading, bb(&value)).expect("encode"));
    });
    c.bench_function("struct_decode", |b| {
        b.iter(|| codec.unmarshal(&reading, bb(&bytes)).expect("decode"));
    });
}

/// Linked list of `len` nodes.
fn chain(node: &Arc<dynwire::ClassDescriptor>, len: usize) -> Value {
    let mut next = Value::Null;
    for i in 0..len {
        next = Value::Object(ObjectRef::new(node).with("value", i as i32).with("next", next));
    }
    next
}

fn bench_class_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("class_graph");
    let registry = Arc::new(SchemaRegistry::new());
    let node = registry.declare_class("::Bench::Node").expect("declare");
    registry
        .define_class(
            "::Bench::Node",
            None,
            None,
            vec![
                dynwire::DataMember::new("value", PrimitiveKind::Int.into()),
                dynwire::DataMember::new("next", TypeDescriptor::Class(node.clone())),
            ],
        )
        .expect("define");
    let ty = TypeDescriptor::Class(node.clone());
    let value = chain(&node, 50);

    for format in [FormatType::Compact, FormatType::Sliced] {
        let codec = Codec::with_config(
            registry.clone(),
            EncodingConfig::default().with_format(format),
        );
        let bytes = codec.marshal(&ty, &value).expect("encode");
        let name = format!("{:?}", format).to_lowercase();
        group.bench_with_input(BenchmarkId::new("encode", &name), &value, |b, v| {
            b.iter(|| codec.marshal(&ty, bb(v)).expect("encode"));
        });
        group.bench_with_input(BenchmarkId::new("decode", &name), &bytes, |b, bytes| {
            b.iter(|| codec.unmarshal(&ty, bb(bytes)).expect("decode"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_int_sequences, bench_struct, bench_class_graph);
criterion_main!(benches);
