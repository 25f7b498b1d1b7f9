//! Mapping of attribute names onto DBF field names.
//!
//! DBF limits field names to 10 characters. Names are sanitized to
//! `[A-Za-z0-9_]`, truncated, and made unique with numeric suffixes in the
//! order they were first seen, so the same input always maps the same way.

use std::collections::HashSet;

pub const MAX_FIELD_NAME_LENGTH: usize = 10;

/// Used when a name sanitizes to nothing.
const EMPTY_FIELD_NAME: &str = "field";

/// Ordered, one-to-one mapping from attribute names to field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldNameMapping {
    entries: Vec<(String, String)>,
}

impl FieldNameMapping {
    /// Map `names` in iteration order. Repeated names keep their first mapping.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = FieldNameMapping::default();
        // DBF field names compare case-insensitively.
        let mut used: HashSet<String> = HashSet::new();
        for name in names {
            let name = name.as_ref();
            if mapping.get(name).is_some() {
                continue;
            }
            let candidate = candidate_field_name(name);
            let field_name = if used.contains(&candidate.to_ascii_lowercase()) {
                resolve_collision(&candidate, &used)
            } else {
                candidate
            };
            if field_name != name {
                log::debug!("Mapping attribute '{}' to field '{}'", name, field_name);
            }
            used.insert(field_name.to_ascii_lowercase());
            mapping.entries.push((name.to_string(), field_name));
        }
        mapping
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == original)
            .map(|(_, field_name)| field_name.as_str())
    }

    /// `(original, field name)` pairs in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, field_name)| (name.as_str(), field_name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn candidate_field_name(name: &str) -> String {
    let candidate: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .take(MAX_FIELD_NAME_LENGTH)
        .collect();
    match candidate.chars().next() {
        None => EMPTY_FIELD_NAME.to_string(),
        // DBF field names must start with a letter or an underscore.
        Some(first) if first.is_ascii_digit() => {
            let tail: String = candidate.chars().take(MAX_FIELD_NAME_LENGTH - 1).collect();
            format!("_{}", tail)
        }
        Some(_) => candidate,
    }
}

/// Replace the tail of `candidate` with `_1`, `_2`, ... until the name is unused.
fn resolve_collision(candidate: &str, used: &HashSet<String>) -> String {
    (1..)
        .map(|counter| {
            let suffix = format!("_{}", counter);
            let base_length = MAX_FIELD_NAME_LENGTH.saturating_sub(suffix.len());
            let base: String = candidate.chars().take(base_length).collect();
            base + &suffix
        })
        .find(|field_name| !used.contains(&field_name.to_ascii_lowercase()))
        .unwrap_or_else(|| candidate.to_string())
}
