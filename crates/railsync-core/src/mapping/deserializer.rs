//! Applying server responses onto object graphs
//!
//! Walks an incoming JSON mapping against the target's property collection,
//! assigning matched fields with value-equality change detection and
//! recursing into nested associations. Keys with no declared counterpart end
//! up only in the `remote_attributes` snapshot, which is replaced wholesale
//! after every application; the server is the source of truth on read.
//!
//! Nested collections are reconciled by full replacement with the
//! deserialized elements. Merge-by-id is a possible alternate policy; it
//! would only have to replace [`apply_nested_many`].

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::model::{FieldValue, ModelType, RemoteObject, TypeRegistry};
use crate::property::{PropertyCollection, SyncField, REMOTE_ID_FIELD};
use std::sync::Arc;

/// Apply an incoming mapping onto an object.
///
/// Returns whether any declared field's effective value changed; the
/// `remote_attributes` replacement never counts as a change.
pub fn apply(
    object: &mut RemoteObject,
    incoming: &Map<String, Value>,
    collection: &PropertyCollection,
    registry: &TypeRegistry,
    config: &RemoteConfig,
) -> Result<bool> {
    let mut changed = false;

    for (key, value) in incoming {
        let field = match collection.field_for_remote_key(key, config.auto_inflect) {
            Some(field) => field.clone(),
            None => {
                log::debug!(
                    "'{}': unrecognized key '{}' kept in remote attributes only",
                    object.model().name(),
                    key
                );
                continue;
            }
        };
        if field.send_only {
            continue;
        }

        if field.local_name == REMOTE_ID_FIELD {
            let new_id = parse_remote_id(value)?;
            if object.remote_id != new_id {
                object.remote_id = new_id;
                changed = true;
            }
            continue;
        }

        if field.nested {
            changed |= apply_nested(object, &field, value, registry, config)?;
        } else {
            changed |= apply_scalar(object, &field, value, config)?;
        }
    }

    object.remote_attributes = incoming.clone();
    Ok(changed)
}

fn apply_scalar(
    object: &mut RemoteObject,
    field: &SyncField,
    value: &Value,
    config: &RemoteConfig,
) -> Result<bool> {
    // Date-ness comes from the declared marker, or from a date already held
    // by the field (an instance populated by hand without the marker). Either
    // way incoming strings parse back through the configured format.
    let wants_date =
        field.date || matches!(object.get(&field.local_name), Some(FieldValue::Date(_)));
    let new_value = match value {
        Value::Null => FieldValue::Null,
        Value::String(raw) if wants_date => {
            let parsed = NaiveDateTime::parse_from_str(raw, &config.date_format).map_err(|e| {
                Error::LocalMapping {
                    message: format!(
                        "field '{}': cannot parse '{}' as date: {}",
                        field.local_name, raw, e
                    ),
                }
            })?;
            FieldValue::Date(parsed.and_utc())
        }
        other => FieldValue::Scalar(other.clone()),
    };

    if object.get(&field.local_name) == Some(&new_value) {
        return Ok(false);
    }
    object.set(field.local_name.clone(), new_value);
    Ok(true)
}

fn apply_nested(
    object: &mut RemoteObject,
    field: &SyncField,
    value: &Value,
    registry: &TypeRegistry,
    config: &RemoteConfig,
) -> Result<bool> {
    match value {
        Value::Null => {
            if object.get(&field.local_name) == Some(&FieldValue::Null) {
                Ok(false)
            } else {
                object.set(field.local_name.clone(), FieldValue::Null);
                Ok(true)
            }
        }
        Value::Object(map) => apply_nested_one(object, field, map, registry, config),
        Value::Array(elements) => apply_nested_many(object, field, elements, registry, config),
        other => Err(Error::LocalMapping {
            message: format!(
                "field '{}': expected object or array for nested association, found {}",
                field.local_name,
                type_name(other)
            ),
        }),
    }
}

fn apply_nested_one(
    object: &mut RemoteObject,
    field: &SyncField,
    map: &Map<String, Value>,
    registry: &TypeRegistry,
    config: &RemoteConfig,
) -> Result<bool> {
    if let Some(FieldValue::One(child)) = object.fields.get_mut(&field.local_name) {
        let collection = child.collection(registry);
        return apply(child, map, &collection, registry, config);
    }

    // No instance held yet: construct one and apply onto it. This always
    // counts as a change.
    let mut child = RemoteObject::new(nested_model(field, registry)?);
    let collection = child.collection(registry);
    apply(&mut child, map, &collection, registry, config)?;
    object.set(field.local_name.clone(), FieldValue::One(Box::new(child)));
    Ok(true)
}

/// Replace the local collection with the deserialized incoming elements.
fn apply_nested_many(
    object: &mut RemoteObject,
    field: &SyncField,
    elements: &[Value],
    registry: &TypeRegistry,
    config: &RemoteConfig,
) -> Result<bool> {
    let model = nested_model(field, registry)?;
    let mut replacement = Vec::with_capacity(elements.len());
    for element in elements {
        let map = element.as_object().ok_or_else(|| Error::LocalMapping {
            message: format!(
                "field '{}': expected object element in nested collection, found {}",
                field.local_name,
                type_name(element)
            ),
        })?;
        let mut child = RemoteObject::new(model.clone());
        let collection = child.collection(registry);
        apply(&mut child, map, &collection, registry, config)?;
        replacement.push(child);
    }

    let new_value = FieldValue::Many(replacement);
    if object.get(&field.local_name) == Some(&new_value) {
        return Ok(false);
    }
    object.set(field.local_name.clone(), new_value);
    Ok(true)
}

fn nested_model(field: &SyncField, registry: &TypeRegistry) -> Result<Arc<ModelType>> {
    let name = field
        .nested_type
        .as_deref()
        .ok_or_else(|| Error::Configuration {
            message: format!(
                "nested field '{}' declares no element type",
                field.local_name
            ),
            source: None,
        })?;
    registry.get(name).ok_or_else(|| Error::Configuration {
        message: format!(
            "nested field '{}': no registered model type named '{}'",
            field.local_name, name
        ),
        source: None,
    })
}

/// Interpret an incoming `id` value. Numbers and numeric strings are
/// accepted; anything else non-null is a mapping error rather than a
/// silently cleared id.
fn parse_remote_id(value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| Error::LocalMapping {
            message: format!("cannot interpret id {n} as an integer"),
        }),
        Value::String(raw) => raw.parse().map(Some).map_err(|_| Error::LocalMapping {
            message: format!("cannot interpret id '{raw}' as an integer"),
        }),
        other => Err(Error::LocalMapping {
            message: format!("expected numeric id, found {}", type_name(other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl RemoteObject {
    /// Materialize a new instance of a type from a response mapping.
    pub fn from_remote_map(
        model: Arc<ModelType>,
        map: &Map<String, Value>,
        registry: &TypeRegistry,
        config: &RemoteConfig,
    ) -> Result<Self> {
        let mut object = Self::new(model);
        let collection = object.collection(registry);
        apply(&mut object, map, &collection, registry, config)?;
        Ok(object)
    }

    /// Apply a response mapping onto this object, returning whether any
    /// declared field changed.
    pub fn set_properties_from_remote(
        &mut self,
        map: &Map<String, Value>,
        registry: &TypeRegistry,
        config: &RemoteConfig,
    ) -> Result<bool> {
        let collection = self.collection(registry);
        apply(self, map, &collection, registry, config)
    }
}
