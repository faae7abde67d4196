//! Property collection building
//!
//! A `PropertyCollection` is the resolved, inheritance-merged set of sync
//! fields for a type: an ordered sequence unique by local name. Collections
//! are built once per type and cached by the registry for the life of the
//! process; types are static in this domain, so the cache is never
//! invalidated.

use crate::model::ModelType;
use crate::property::field::{parse_sync_spec, SyncField};

/// Local name of the implicit identifier field present on every collection.
pub const REMOTE_ID_FIELD: &str = "remote_id";

/// The resolved set of sync fields for a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCollection {
    fields: Vec<SyncField>,
}

impl PropertyCollection {
    /// Build the collection for a type by walking its ancestor chain.
    ///
    /// The walk runs most-derived to least-derived; a level's `_NO_SUPER_`
    /// marker stops it after that level's own fields are included. A field
    /// name declared by a more-derived level is never overwritten by an
    /// ancestor's declaration. Levels with no spec, an empty spec, or a `*`
    /// token contribute every field registered on that level that is not
    /// already declared.
    pub fn build(model: &ModelType) -> Self {
        let mut fields = vec![remote_id_field()];

        let mut level = Some(model);
        while let Some(current) = level {
            let (parsed, include_all) = match current.sync() {
                Some(spec) => {
                    let parsed = parse_sync_spec(spec);
                    // An explicitly empty spec falls back the same way as
                    // a missing one.
                    let include_all = parsed.include_all || parsed.fields.is_empty();
                    (parsed, include_all)
                }
                None => (Default::default(), true),
            };

            for field in parsed.fields {
                push_if_absent(&mut fields, field);
            }
            if include_all {
                for name in current.fields() {
                    push_if_absent(&mut fields, SyncField::new(name.clone()));
                }
            }

            if parsed.no_carry_from_super {
                break;
            }
            level = current.parent().map(|p| p.as_ref());
        }

        Self { fields }
    }

    /// Build a collection from a raw spec string, for per-instance
    /// custom sync specs. `registered_fields` backs the include-all
    /// fallback exactly as at type level.
    pub fn from_spec(spec: &str, registered_fields: &[String]) -> Self {
        let parsed = parse_sync_spec(spec);
        let include_all = parsed.include_all || parsed.fields.is_empty();

        let mut fields = vec![remote_id_field()];
        for field in parsed.fields {
            push_if_absent(&mut fields, field);
        }
        if include_all {
            for name in registered_fields {
                push_if_absent(&mut fields, SyncField::new(name.clone()));
            }
        }
        Self { fields }
    }

    /// All fields, in resolution order.
    pub fn fields(&self) -> &[SyncField] {
        &self.fields
    }

    /// Look up a field by local name.
    pub fn field(&self, local_name: &str) -> Option<&SyncField> {
        self.fields.iter().find(|f| f.local_name == local_name)
    }

    /// Resolve an incoming remote key to its declared field, if any.
    pub fn field_for_remote_key(&self, key: &str, auto_inflect: bool) -> Option<&SyncField> {
        self.fields
            .iter()
            .find(|f| f.remote_key(auto_inflect) == key)
    }
}

fn remote_id_field() -> SyncField {
    let mut field = SyncField::new(REMOTE_ID_FIELD);
    field.remote_name = Some("id".to_string());
    field
}

fn push_if_absent(fields: &mut Vec<SyncField>, field: SyncField) {
    if !fields.iter().any(|f| f.local_name == field.local_name) {
        fields.push(field);
    }
}
