//! Sync spec parsing
//!
//! A sync spec is the per-type declarative field list governing
//! synchronization. Grammar: comma-separated tokens, each a local field name
//! optionally followed by whitespace-separated modifiers:
//!
//! - `=remote_name`: explicit remote key override
//! - `-r`: receive-only (never sent)
//! - `-s`: send-only (never populated from a response)
//! - `-n`: nested association (value is a mapped object or collection)
//! - `-a`: nested association sent under a `<key>_attributes` key
//! - `-d`: include a destroy marker when sent nested
//! - `-t`: date-valued field (incoming strings parse through the
//!   configured date format)
//! - `:TypeName`: registered element type for a nested association
//!
//! `*` as a standalone token also includes every registered public field not
//! otherwise declared; the standalone token `_NO_SUPER_` stops inheritance
//! of ancestor declarations. `=remote` and `:Type` may be attached directly
//! to the field name (`author=author_name`, `comments:Comment`).

use crate::inflect::underscore;

/// Standalone token that stops inheritance of ancestor sync rules.
pub const NO_CARRY_FROM_SUPER: &str = "_NO_SUPER_";

/// Standalone token that pulls in every registered public field.
pub const INCLUDE_ALL: &str = "*";

/// One declared synchronization rule for a single local field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncField {
    /// Local field identifier.
    pub local_name: String,
    /// Explicit remote key override; `None` derives the key by convention.
    pub remote_name: Option<String>,
    /// Field is sent but never populated from a response.
    pub send_only: bool,
    /// Field is populated from responses but never sent.
    pub receive_only: bool,
    /// Field's value is itself a mapped object or a collection of them.
    pub nested: bool,
    /// Emit the association under `<key>_attributes` rather than the bare key.
    pub nested_as_attributes: bool,
    /// Emit a destroy marker for the association when sent nested.
    pub destroy_on_nesting: bool,
    /// Field holds a date; incoming strings are parsed through the
    /// configured date format instead of kept as raw scalars.
    pub date: bool,
    /// Registered type name for nested elements.
    pub nested_type: Option<String>,
}

impl SyncField {
    /// A plain field with convention-derived remote key and no modifiers.
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            remote_name: None,
            send_only: false,
            receive_only: false,
            nested: false,
            nested_as_attributes: false,
            destroy_on_nesting: false,
            date: false,
            nested_type: None,
        }
    }

    /// Resolve the remote JSON key for this field.
    pub fn remote_key(&self, auto_inflect: bool) -> String {
        match &self.remote_name {
            Some(name) => name.clone(),
            None if auto_inflect => underscore(&self.local_name),
            None => self.local_name.clone(),
        }
    }
}

/// Result of parsing one type level's sync spec.
#[derive(Debug, Clone, Default)]
pub struct ParsedSpec {
    /// Declared fields, in declaration order, unique by local name.
    pub fields: Vec<SyncField>,
    /// `*` was present: also include registered fields not declared here.
    pub include_all: bool,
    /// `_NO_SUPER_` was present: ancestors contribute nothing past this level.
    pub no_carry_from_super: bool,
}

/// Parse a sync spec string into structured field descriptors.
///
/// Whitespace around tokens is insignificant. An empty or whitespace-only
/// spec yields an empty field list; the fallback to "all registered fields"
/// is decided at the collection layer. Duplicate local names within one
/// spec: the later declaration replaces the earlier one in place.
pub fn parse_sync_spec(spec: &str) -> ParsedSpec {
    let mut parsed = ParsedSpec::default();

    for token in spec.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token == NO_CARRY_FROM_SUPER {
            parsed.no_carry_from_super = true;
            continue;
        }
        if token == INCLUDE_ALL {
            parsed.include_all = true;
            continue;
        }

        let mut chunks = token.split_whitespace();
        let head = match chunks.next() {
            Some(head) => head,
            None => continue,
        };
        let mut field = split_head(head);
        for chunk in chunks {
            apply_modifier(&mut field, chunk);
        }
        if field.local_name.is_empty() {
            continue;
        }

        match parsed
            .fields
            .iter()
            .position(|f| f.local_name == field.local_name)
        {
            Some(i) => parsed.fields[i] = field,
            None => parsed.fields.push(field),
        }
    }

    parsed
}

/// Split a `name[=remote][:Type]` head chunk into a base field.
fn split_head(head: &str) -> SyncField {
    let (rest, nested_type) = match head.split_once(':') {
        Some((rest, ty)) => (rest, Some(ty.to_string())),
        None => (head, None),
    };
    let (name, remote_name) = match rest.split_once('=') {
        Some((name, remote)) => (name, Some(remote.to_string())),
        None => (rest, None),
    };
    let mut field = SyncField::new(name);
    field.remote_name = remote_name;
    if nested_type.is_some() {
        field.nested = true;
        field.nested_type = nested_type;
    }
    field
}

fn apply_modifier(field: &mut SyncField, chunk: &str) {
    match chunk {
        "-r" => {
            field.receive_only = true;
            field.send_only = false;
        }
        "-s" => {
            field.send_only = true;
            field.receive_only = false;
        }
        "-n" => field.nested = true,
        "-a" => {
            field.nested = true;
            field.nested_as_attributes = true;
        }
        "-d" => field.destroy_on_nesting = true,
        "-t" => field.date = true,
        _ => {
            if let Some(remote) = chunk.strip_prefix('=') {
                field.remote_name = Some(remote.to_string());
            } else if let Some(ty) = chunk.strip_prefix(':') {
                field.nested = true;
                field.nested_type = Some(ty.to_string());
            } else {
                log::debug!(
                    "ignoring unknown sync modifier '{}' on field '{}'",
                    chunk,
                    field.local_name
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_fields() {
        let parsed = parse_sync_spec("title, body, createdAt");
        assert_eq!(parsed.fields.len(), 3);
        assert_eq!(parsed.fields[0].local_name, "title");
        assert_eq!(parsed.fields[2].local_name, "createdAt");
        assert!(!parsed.no_carry_from_super);
        assert!(!parsed.include_all);
    }

    #[test]
    fn test_parse_modifiers() {
        let parsed = parse_sync_spec("secret -s, updatedAt -r, comments -n -a -d");
        let secret = &parsed.fields[0];
        assert!(secret.send_only);
        let updated = &parsed.fields[1];
        assert!(updated.receive_only);
        let comments = &parsed.fields[2];
        assert!(comments.nested);
        assert!(comments.nested_as_attributes);
        assert!(comments.destroy_on_nesting);
    }

    #[test]
    fn test_parse_date_marker() {
        let parsed = parse_sync_spec("title, updatedAt -t -r");
        assert!(!parsed.fields[0].date);
        let updated = &parsed.fields[1];
        assert!(updated.date);
        assert!(updated.receive_only);
    }

    #[test]
    fn test_parse_remote_name_override() {
        let parsed = parse_sync_spec("author=author_name, body =content");
        assert_eq!(parsed.fields[0].remote_name.as_deref(), Some("author_name"));
        assert_eq!(parsed.fields[1].remote_name.as_deref(), Some("content"));
    }

    #[test]
    fn test_parse_nested_type_annotation() {
        let parsed = parse_sync_spec("comments:Comment -a, author :Person");
        assert_eq!(parsed.fields[0].nested_type.as_deref(), Some("Comment"));
        assert!(parsed.fields[0].nested);
        assert!(parsed.fields[0].nested_as_attributes);
        assert_eq!(parsed.fields[1].nested_type.as_deref(), Some("Person"));
        assert!(parsed.fields[1].nested);
    }

    #[test]
    fn test_no_carry_from_super_token() {
        let parsed = parse_sync_spec("title, _NO_SUPER_, body");
        assert!(parsed.no_carry_from_super);
        assert_eq!(parsed.fields.len(), 2);
    }

    #[test]
    fn test_include_all_token() {
        let parsed = parse_sync_spec("*, secret -s");
        assert!(parsed.include_all);
        assert_eq!(parsed.fields.len(), 1);
    }

    #[test]
    fn test_empty_spec() {
        assert!(parse_sync_spec("").fields.is_empty());
        assert!(parse_sync_spec("  ,  , ").fields.is_empty());
    }

    #[test]
    fn test_duplicate_last_wins() {
        let parsed = parse_sync_spec("title -s, body, title=headline");
        assert_eq!(parsed.fields.len(), 2);
        let title = &parsed.fields[0];
        assert_eq!(title.remote_name.as_deref(), Some("headline"));
        assert!(!title.send_only);
    }

    #[test]
    fn test_direction_later_wins() {
        let parsed = parse_sync_spec("field -r -s");
        assert!(parsed.fields[0].send_only);
        assert!(!parsed.fields[0].receive_only);
    }

    #[test]
    fn test_remote_key_derivation() {
        let field = SyncField::new("myProperty");
        assert_eq!(field.remote_key(true), "my_property");
        assert_eq!(field.remote_key(false), "myProperty");

        let mut overridden = SyncField::new("myProperty");
        overridden.remote_name = Some("MixedCase".to_string());
        assert_eq!(overridden.remote_key(true), "MixedCase");
    }
}
