//! Render-prop merge for page views.
//!
//! Precedence, later wins:
//! 1. own props
//! 2. fields of the cached result (when it is an object)
//! 3. `{ data: __collectionData }` when the page context carries collection data
//! 4. extracted route params
//!
//! Step 3 replaces any `data` field the cached result brought along. That is
//! the collection-data override rule; it is applied silently.

use serde_json::{Map, Value};

use crate::core::types::{PageView, Props, ResultPayload};

/// Page-context key holding collection data.
pub const COLLECTION_DATA_KEY: &str = "__collectionData";

/// Render-prop key collection data is written to.
pub const DATA_KEY: &str = "data";

/// Merge the layers of a page render into one props object.
pub fn merge_render_props(
    own: &Props,
    entry: &ResultPayload,
    page_context: Option<&Map<String, Value>>,
    params: &Map<String, Value>,
) -> Props {
    let mut merged = own.clone();

    if let Value::Object(fields) = entry {
        extend(&mut merged, fields);
    }

    if let Some(collection) = collection_data(page_context) {
        merged.insert(DATA_KEY.to_string(), collection.clone());
    }

    extend(&mut merged, params);
    merged
}

/// Build the view for a possibly missing cache entry.
///
/// A falsy payload (`null`, `false`, `0`, `""`) is treated like a missing one.
pub fn page_view(
    own: &Props,
    entry: Option<&ResultPayload>,
    page_context: Option<&Map<String, Value>>,
    params: &Map<String, Value>,
) -> PageView {
    match entry {
        Some(entry) if is_truthy(entry) => {
            PageView::Page(merge_render_props(own, entry, page_context, params))
        }
        _ => PageView::Placeholder,
    }
}

/// Collection data counts only when present and truthy.
fn collection_data(page_context: Option<&Map<String, Value>>) -> Option<&Value> {
    page_context
        .and_then(|ctx| ctx.get(COLLECTION_DATA_KEY))
        .filter(|value| is_truthy(value))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn extend(target: &mut Props, source: &Map<String, Value>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}
