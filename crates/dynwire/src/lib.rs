// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! dynwire: descriptor-driven marshaling for the 1.1 encoding
//!
//! Encodes dynamically typed [`Value`]s against [`TypeDescriptor`]s built at
//! run time, and decodes them back, without generated code.
//!
//! # Features
//!
//! - **Full type system**: primitives, enums, structs, sequences,
//!   dictionaries, classes, proxies and user exceptions
//! - **Slicing**: unknown derived class and exception slices are skipped and
//!   preserved, then re-emitted byte for byte
//! - **Object graphs**: shared and cyclic class instances keep their
//!   identity across a round trip
//! - **Optional members**: tagged members an older decoder skips
//! - **Compact or sliced** class format, per codec or per operation
//!
//! # Quick Start
//!
//! ```rust
//! use dynwire::{Codec, PrimitiveKind, SchemaRegistry, Value};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SchemaRegistry::new());
//! let node = registry
//!     .class_builder("::Demo::Node")
//!     .member("value", PrimitiveKind::Int)
//!     .define()
//!     .unwrap();
//! let node_ty = dynwire::TypeDescriptor::Class(node.clone());
//!
//! let object = dynwire::ObjectRef::new(&node).with("value", 7);
//! let codec = Codec::new(registry);
//! let bytes = codec.marshal(&node_ty, &Value::Object(object)).unwrap();
//! let decoded = codec.unmarshal(&node_ty, &bytes).unwrap();
//! assert_eq!(decoded.as_object().unwrap().get("value"), Some(Value::Int(7)));
//! ```
//!
//! # Configuration File
//!
//! With the default `config-loaders` feature an [`EncodingConfig`] can be
//! loaded from YAML:
//!
//! ```yaml
//! format: compact
//! class_graph_depth_max: 64
//! max_sequence_length: 100000
//! ```

pub mod builder;
pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod operation;
pub mod registry;
pub mod stream;
pub mod value;

pub use builder::{ClassBuilder, EnumBuilder, ExceptionBuilder, StructBuilder};
pub use codec::Codec;
pub use config::{EncodingConfig, FormatType};
pub use descriptor::{
    ClassDescriptor, DataMember, DictionaryDescriptor, DictionaryFactory, DictionaryMapping,
    EnumDescriptor, ExceptionDescriptor, MemberMetadata, PrimitiveKind, ProxyDescriptor,
    SequenceDescriptor, SequenceFactory, SequenceMapping, StructDescriptor, TypeDescriptor,
};
pub use error::{Error, HostError, MarshalError, Result};
pub use operation::Operation;
pub use registry::{SchemaRegistry, ValueFactory};
pub use value::{
    ExceptionValue, Identity, InvocationMode, ObjectRef, OpaqueEndpoint, PrimitiveArray,
    ProxyRef, SliceInfo, SlicedData, Value,
};
