//! Naming transforms between local identifiers and remote keys
//!
//! Pure string utilities: word-boundary underscoring, its camel-case inverse,
//! and a rule-based pluralizer with a pluggable irregulars table. Resource
//! names are derived here; lower-casing of assembled paths is left to the
//! dispatcher since it must run after name resolution.

use std::collections::HashMap;

/// Convert a camel-cased identifier to its underscored remote form.
///
/// Inserts an underscore at each word-boundary transition and lower-cases
/// the result: `myProperty` -> `my_property`, `HTTPResponse` ->
/// `http_response`. Identifiers already underscored pass through unchanged.
pub fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let boundary = match i.checked_sub(1).map(|p| chars[p]) {
                None => false,
                Some(prev) => {
                    prev.is_lowercase()
                        || prev.is_ascii_digit()
                        || (prev.is_uppercase()
                            && chars.get(i + 1).is_some_and(|n| n.is_lowercase()))
                }
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert an underscored remote key back to a camel-cased local identifier.
///
/// `my_property` -> `myProperty`. The first segment keeps its casing, so the
/// round trip recovers identifiers in canonical camelCase form; ambiguous
/// casing (consecutive capitals) is normalized rather than recovered.
pub fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Rule-based pluralizer for resource names.
///
/// Default rules cover the regular English suffix patterns; irregular forms
/// go through a replaceable lookup table seeded with the common cases.
#[derive(Debug, Clone)]
pub struct Pluralizer {
    irregulars: HashMap<String, String>,
}

impl Pluralizer {
    pub fn new() -> Self {
        let mut irregulars = HashMap::new();
        for (singular, plural) in [
            ("person", "people"),
            ("man", "men"),
            ("woman", "women"),
            ("child", "children"),
            ("mouse", "mice"),
        ] {
            irregulars.insert(singular.to_string(), plural.to_string());
        }
        Self { irregulars }
    }

    /// Register an irregular form, replacing any existing rule for it.
    pub fn add_irregular(&mut self, singular: impl Into<String>, plural: impl Into<String>) {
        self.irregulars.insert(singular.into(), plural.into());
    }

    /// Pluralize a (lower-cased, underscored) resource word.
    pub fn pluralize(&self, word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }
        if let Some(plural) = self.irregulars.get(word) {
            return plural.clone();
        }
        if let Some(stem) = word.strip_suffix('y') {
            // "city" -> "cities", but "day" -> "days"
            if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) && !stem.is_empty() {
                return format!("{stem}ies");
            }
        }
        if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
            return format!("{word}es");
        }
        format!("{word}s")
    }
}

impl Default for Pluralizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the pluralized resource name for a type.
///
/// An explicit plural override is used verbatim. Otherwise the explicit
/// model name (or the underscored type name, when `auto_inflect`) is run
/// through the pluralizer.
pub fn resource_name(
    type_name: &str,
    model_name: Option<&str>,
    plural_name: Option<&str>,
    auto_inflect: bool,
    pluralizer: &Pluralizer,
) -> String {
    if let Some(plural) = plural_name {
        return plural.to_string();
    }
    let singular = match model_name {
        Some(name) => name.to_string(),
        None if auto_inflect => underscore(type_name),
        None => type_name.to_string(),
    };
    pluralizer.pluralize(&singular)
}
