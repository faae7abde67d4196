//! Object graph serialization
//!
//! Walks a remote object against its property collection and produces the
//! nested JSON mapping the server expects: scalars under their remote keys,
//! one-to-one associations inline or under `<key>_attributes`, one-to-many
//! associations as arrays (or indexed hashes when configured), and destroy
//! markers for associations flagged for destruction.
//!
//! Traversal is a pure read of the graph. Termination is guaranteed by the
//! ownership model: association values are exclusively owned (`Box`/`Vec`),
//! so an object graph cannot contain reference cycles.

use serde_json::{Map, Value};

use crate::config::RemoteConfig;
use crate::model::{FieldValue, ModelType, RemoteObject, TypeRegistry};
use crate::property::{PropertyCollection, REMOTE_ID_FIELD};

/// Serialize an object's declared fields into a flat-to-nested JSON mapping.
///
/// With `for_send`, receive-only fields are skipped, destroy-on-nesting
/// markers are honored, and `-a` associations go under their `_attributes`
/// key; without it, the full declared state is emitted response-shaped,
/// under bare keys. Fields with no value set are omitted; an explicit
/// [`FieldValue::Null`] is emitted as JSON `null`.
pub fn serialize(
    object: &RemoteObject,
    collection: &PropertyCollection,
    for_send: bool,
    config: &RemoteConfig,
    registry: &TypeRegistry,
) -> Map<String, Value> {
    let mut out = Map::new();

    for field in collection.fields() {
        if for_send && field.receive_only {
            continue;
        }
        let key = field.remote_key(config.auto_inflect);

        if field.local_name == REMOTE_ID_FIELD {
            if let Some(id) = object.remote_id {
                out.insert(key, Value::from(id));
            }
            continue;
        }

        let value = match object.get(&field.local_name) {
            Some(value) => value,
            None => continue,
        };

        match value {
            FieldValue::Null => {
                out.insert(key, Value::Null);
            }
            FieldValue::Scalar(scalar) => {
                out.insert(key, scalar.clone());
            }
            FieldValue::Date(date) => {
                out.insert(
                    key,
                    Value::String(date.format(&config.date_format).to_string()),
                );
            }
            FieldValue::One(child) => {
                let key = nested_key(&key, field.nested_as_attributes, for_send, config);
                if let Some(serialized) = serialize_nested(child, for_send, config, registry) {
                    out.insert(key, serialized);
                }
            }
            FieldValue::Many(children) => {
                let key = nested_key(&key, field.nested_as_attributes, for_send, config);
                let elements: Vec<Value> = children
                    .iter()
                    .filter_map(|child| serialize_nested(child, for_send, config, registry))
                    .collect();
                out.insert(key, encode_collection(elements, config));
            }
        }
    }

    out
}

// The attributes suffix is a send-side convention; responses carry bare keys.
fn nested_key(key: &str, as_attributes: bool, for_send: bool, config: &RemoteConfig) -> String {
    if as_attributes && for_send {
        format!("{key}{}", config.attributes_suffix)
    } else {
        key.to_string()
    }
}

/// Serialize one nested association slot.
///
/// A child flagged for destruction collapses to `{"id": N, "_destroy": true}`
/// when it has a remote ID and is omitted entirely when it does not: an
/// object that was never created remotely cannot be destroyed.
fn serialize_nested(
    child: &RemoteObject,
    for_send: bool,
    config: &RemoteConfig,
    registry: &TypeRegistry,
) -> Option<Value> {
    if for_send && child.destroy_on_nesting {
        return child.remote_id.map(|id| {
            let mut marker = Map::new();
            marker.insert("id".to_string(), Value::from(id));
            marker.insert("_destroy".to_string(), Value::Bool(true));
            Value::Object(marker)
        });
    }
    let collection = child.collection(registry);
    Some(Value::Object(serialize(
        child, &collection, for_send, config, registry,
    )))
}

/// Encode a serialized collection as an array or, when configured, as a
/// mapping from stringified index to element. The indexed-hash form exists
/// solely for server frameworks that expect indexed nested-attribute
/// payloads.
fn encode_collection(elements: Vec<Value>, config: &RemoteConfig) -> Value {
    if config.has_many_as_hash {
        let mut indexed = Map::new();
        for (i, element) in elements.into_iter().enumerate() {
            indexed.insert(i.to_string(), element);
        }
        Value::Object(indexed)
    } else {
        Value::Array(elements)
    }
}

impl RemoteObject {
    /// The serialized send form of this object, without the model-name
    /// envelope.
    pub fn dictionary_of_remote_properties(
        &self,
        registry: &TypeRegistry,
        config: &RemoteConfig,
    ) -> Map<String, Value> {
        let collection = self.collection(registry);
        serialize(self, &collection, true, config, registry)
    }

    /// The full request-body representation: the serialized fields wrapped
    /// under a single top-level key equal to the resolved model name, e.g.
    /// `{"article": {"title": "..."}}`.
    pub fn remote_json_representation(
        &self,
        registry: &TypeRegistry,
        config: &RemoteConfig,
    ) -> Value {
        wrap_in_model_name(
            self.model(),
            Value::Object(self.dictionary_of_remote_properties(registry, config)),
            config,
        )
    }
}

/// Wrap a serialized mapping under the type's resolved model name.
pub fn wrap_in_model_name(model: &ModelType, body: Value, config: &RemoteConfig) -> Value {
    let mut envelope = Map::new();
    envelope.insert(model.resolved_model_name(config.auto_inflect), body);
    Value::Object(envelope)
}
