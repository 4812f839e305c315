//! Feature list parsing.
//!
//! Upload requests carry the feature list as a single form field that may be
//! either a JSON array (`["Tags","Objects"]`) or a comma-separated string
//! (`Tags, Objects`). The structured form is tried first.

use crate::analysis::types::FeatureTag;

/// The encoding a `features` form field was successfully parsed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureField {
    StructuredList(Vec<String>),
    DelimitedString(Vec<String>),
}

impl FeatureField {
    /// Parse a raw form field. Never fails: anything that is not a JSON array
    /// of strings is treated as a delimited list.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(list) => FeatureField::StructuredList(list),
            Err(_) => FeatureField::DelimitedString(
                raw.split(',').map(|item| item.trim().to_string()).collect(),
            ),
        }
    }

    pub fn into_names(self) -> Vec<String> {
        match self {
            FeatureField::StructuredList(names) | FeatureField::DelimitedString(names) => names,
        }
    }
}

/// Resolve names to tags, or return every name that is not a known tag.
///
/// All-or-nothing: a single unknown name rejects the list.
pub fn resolve_tags<S: AsRef<str>>(names: &[S]) -> Result<Vec<FeatureTag>, Vec<String>> {
    let mut tags = Vec::with_capacity(names.len());
    let mut invalid = Vec::new();

    for name in names {
        match name.as_ref().parse::<FeatureTag>() {
            Ok(tag) => tags.push(tag),
            Err(()) => invalid.push(name.as_ref().to_string()),
        }
    }

    if invalid.is_empty() {
        Ok(tags)
    } else {
        Err(invalid)
    }
}
