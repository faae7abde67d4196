//! Declarative field specifications and their resolution
//!
//! `field` parses one type level's sync spec string into `SyncField`
//! descriptors; `collection` merges the parsed levels across a type's
//! ancestor chain into the cached `PropertyCollection` the serializer and
//! deserializer are driven by.

pub mod collection;
pub mod field;

pub use collection::{PropertyCollection, REMOTE_ID_FIELD};
pub use field::{parse_sync_spec, ParsedSpec, SyncField, INCLUDE_ALL, NO_CARRY_FROM_SUPER};
