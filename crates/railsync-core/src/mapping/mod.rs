//! Bidirectional conversion between object graphs and nested JSON
//!
//! `serializer` produces the wire form of an object graph; `deserializer`
//! applies a response mapping back onto one, with change detection. Both are
//! driven by the type's property collection and recurse through nested
//! associations.

pub mod deserializer;
pub mod serializer;

pub use deserializer::apply;
pub use serializer::{serialize, wrap_in_model_name};
