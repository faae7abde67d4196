//! Model type descriptors and remote object instances
//!
//! A `ModelType` is registration-time metadata describing one mapped type:
//! its sync spec, its registered public fields (backing the implicit-sync
//! fallback), its ancestor chain, and its naming/config overrides. Types are
//! registered in an explicit `TypeRegistry` held by the context, which also
//! memoizes their property collections.
//!
//! A `RemoteObject` is one mapped instance: the optional remote identifier,
//! the last attribute snapshot received from the server, the destroy marker
//! for nested sends, and the field values themselves as a tagged variant
//! type.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::RemoteConfig;
use crate::inflect::underscore;
use crate::property::PropertyCollection;

/// Registration-time descriptor for one mapped type.
#[derive(Debug, Clone)]
pub struct ModelType {
    name: String,
    sync: Option<String>,
    fields: Vec<String>,
    parent: Option<Arc<ModelType>>,
    model_name: Option<String>,
    plural_name: Option<String>,
    config: Option<RemoteConfig>,
}

impl ModelType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sync: None,
            fields: Vec::new(),
            parent: None,
            model_name: None,
            plural_name: None,
            config: None,
        }
    }

    /// Declare the sync spec for this type. Without one, every registered
    /// field participates with convention-derived remote keys.
    pub fn with_sync(mut self, spec: impl Into<String>) -> Self {
        self.sync = Some(spec.into());
        self
    }

    /// Register the type's public fields, used by the implicit-sync
    /// fallback and the `*` spec token.
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Attach the ancestor type whose sync rules this type inherits.
    pub fn with_parent(mut self, parent: Arc<ModelType>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Override the remote model name (the JSON envelope key and the
    /// singular the resource name is pluralized from).
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    /// Override the pluralized resource name verbatim.
    pub fn with_plural_name(mut self, plural: impl Into<String>) -> Self {
        self.plural_name = Some(plural.into());
        self
    }

    /// Attach a per-type config. It fully replaces the context default for
    /// operations on this type; nothing is merged.
    pub fn with_config(mut self, config: RemoteConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sync(&self) -> Option<&str> {
        self.sync.as_deref()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn parent(&self) -> Option<&Arc<ModelType>> {
        self.parent.as_ref()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn plural_name(&self) -> Option<&str> {
        self.plural_name.as_deref()
    }

    pub fn config(&self) -> Option<&RemoteConfig> {
        self.config.as_ref()
    }

    /// The model name used as the JSON envelope key for write bodies.
    pub fn resolved_model_name(&self, auto_inflect: bool) -> String {
        match &self.model_name {
            Some(name) => name.clone(),
            None if auto_inflect => underscore(&self.name),
            None => self.name.clone(),
        }
    }
}

/// Explicit registry of model types and their memoized property collections.
///
/// Collections are built lazily on first use and never invalidated; they are
/// immutable afterwards, so concurrent reads need no further coordination.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Arc<ModelType>>>,
    collections: RwLock<HashMap<String, Arc<PropertyCollection>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type under its name, replacing any previous
    /// registration of that name.
    pub fn register(&self, model: Arc<ModelType>) -> Arc<ModelType> {
        self.types
            .write()
            .expect("type registry lock poisoned")
            .insert(model.name().to_string(), model.clone());
        model
    }

    /// Look up a registered type by name.
    pub fn get(&self, name: &str) -> Option<Arc<ModelType>> {
        self.types
            .read()
            .expect("type registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// The memoized property collection for a type.
    pub fn collection_for(&self, model: &ModelType) -> Arc<PropertyCollection> {
        if let Some(collection) = self
            .collections
            .read()
            .expect("collection cache lock poisoned")
            .get(model.name())
        {
            return collection.clone();
        }
        let built = Arc::new(PropertyCollection::build(model));
        self.collections
            .write()
            .expect("collection cache lock poisoned")
            .entry(model.name().to_string())
            .or_insert(built)
            .clone()
    }
}

/// The value held by one field of a remote object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicitly null; serialized as JSON `null`.
    Null,
    /// A plain JSON scalar (or opaque structure passed through verbatim).
    Scalar(Value),
    /// A date, serialized through the configured date format.
    Date(DateTime<Utc>),
    /// A one-to-one association.
    One(Box<RemoteObject>),
    /// A one-to-many association.
    Many(Vec<RemoteObject>),
}

/// A mapped model instance synchronized with a remote resource.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    model: Arc<ModelType>,
    /// Remote identifier; absent means "not yet created remotely".
    pub remote_id: Option<i64>,
    /// Last full attribute dictionary received from the server, verbatim.
    /// Replaced wholesale after every applied response; holds fields the
    /// local type does not declare.
    pub remote_attributes: Map<String, Value>,
    /// Emit a `_destroy` marker when this object is sent nested.
    pub destroy_on_nesting: bool,
    pub(crate) fields: HashMap<String, FieldValue>,
    custom_sync: Option<Arc<PropertyCollection>>,
}

impl RemoteObject {
    pub fn new(model: Arc<ModelType>) -> Self {
        Self {
            model,
            remote_id: None,
            remote_attributes: Map::new(),
            destroy_on_nesting: false,
            fields: HashMap::new(),
            custom_sync: None,
        }
    }

    /// Create an instance that uses its own sync spec instead of its type's
    /// cached collection. Uncommon; the instance keeps this collection for
    /// its whole lifetime.
    pub fn with_custom_sync(model: Arc<ModelType>, spec: &str) -> Self {
        let collection = Arc::new(PropertyCollection::from_spec(spec, model.fields()));
        let mut object = Self::new(model);
        object.custom_sync = Some(collection);
        object
    }

    pub fn model(&self) -> &Arc<ModelType> {
        &self.model
    }

    /// The property collection governing this instance.
    pub fn collection(&self, registry: &TypeRegistry) -> Arc<PropertyCollection> {
        match &self.custom_sync {
            Some(collection) => collection.clone(),
            None => registry.collection_for(&self.model),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Convenience setter for scalar values.
    pub fn set_scalar(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set(name, FieldValue::Scalar(value.into()));
    }
}

/// Value equality over the mapped state: type name, remote ID, destroy
/// marker, and field values. The `remote_attributes` snapshot is transport
/// bookkeeping and deliberately not part of equality.
impl PartialEq for RemoteObject {
    fn eq(&self, other: &Self) -> bool {
        self.model.name() == other.model.name()
            && self.remote_id == other.remote_id
            && self.destroy_on_nesting == other.destroy_on_nesting
            && self.fields == other.fields
    }
}
