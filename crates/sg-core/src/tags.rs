//! Free-form OSM tag maps.
//!
//! Tags are kept as JSON values so numbers and booleans survive a round trip
//! to the serialization layer unchanged.  `BTreeMap` gives deterministic key
//! order in query output.

use std::collections::BTreeMap;

use serde_json::Value;

/// Key/value tag map attached to addresses and points of interest.
pub type Tags = BTreeMap<String, Value>;

/// Render a tag value as plain text.
///
/// Strings are returned without quotes, `null` becomes `None`, everything
/// else uses its JSON representation.
pub fn tag_text(tags: &Tags, key: &str) -> Option<String> {
    match tags.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Merge `incoming` into `target`, last write wins per key.
pub fn merge_tags(target: &mut Tags, incoming: Tags) {
    for (k, v) in incoming {
        target.insert(k, v);
    }
}
