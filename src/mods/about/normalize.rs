//! Descriptor tree normalization
//!
//! The descriptor format writes arrays as a wrapper element of repeated
//! `<li>` item tags. The deserializer already turns the repeated tags into
//! a list; this pass un-nests the wrapper so `{"loadAfter": {"li": [..]}}`
//! becomes `{"loadAfter": [..]}`, and strips the empty-string/zero
//! artifacts malformed documents leave behind.

use super::document::DocValue;

/// Tag name the descriptor format uses for list items.
const LIST_ITEM_TAG: &str = "li";

/// Collapse `li` wrappers and drop parsing artifacts, recursively through
/// maps. A map containing the item tag is replaced outright by the item
/// value(s); list contents are taken as-is.
pub fn collapse_list_wrappers(value: DocValue) -> DocValue {
    match value {
        DocValue::Map(map) => {
            let mut out = std::collections::HashMap::with_capacity(map.len());
            for (key, child) in map {
                if is_artifact(&child) {
                    continue;
                }
                if key == LIST_ITEM_TAG {
                    return child;
                }
                out.insert(key, collapse_list_wrappers(child));
            }
            DocValue::Map(out)
        }
        other => other,
    }
}

/// Force a scalar-or-list value into a list, so the mapper only ever sees
/// arrays. Absent values become the empty list.
pub fn into_list(value: Option<DocValue>) -> Vec<DocValue> {
    match value {
        None | Some(DocValue::Null) => Vec::new(),
        Some(DocValue::List(items)) => items,
        Some(other) => vec![other],
    }
}

/// Empty strings and literal zeroes sometimes appear where a field was
/// deleted or left blank; treat them as if the key were missing.
fn is_artifact(value: &DocValue) -> bool {
    matches!(value, DocValue::Str(s) if s.is_empty()) || matches!(value, DocValue::Num(n) if *n == 0.0)
}
