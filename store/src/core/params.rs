//! Route parameter extraction from declared route templates.
//!
//! Only single-segment, all-lowercase placeholders (`:id`, `:slug`) are
//! recognized. Anything broader would change which props collide with which
//! placeholders.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Page-context key holding explicit params, which win over extracted ones.
pub const CONTEXT_PARAMS_KEY: &str = "__params";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-z]+)").expect("placeholder regex"));

/// Placeholder names declared by `route_path`, in order of appearance.
pub fn placeholder_names(route_path: &str) -> Vec<&str> {
    PLACEHOLDER_RE
        .captures_iter(route_path)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Build the params object for a render.
///
/// Each placeholder in `route_path` takes the own prop of the same name, or
/// `null` when the prop is absent. `__params` from the page context is then
/// shallow-merged on top.
pub fn extract_params(
    route_path: Option<&str>,
    props: &Map<String, Value>,
    page_context: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let mut params = Map::new();
    if let Some(route_path) = route_path {
        for name in placeholder_names(route_path) {
            let value = props.get(name).cloned().unwrap_or(Value::Null);
            params.insert(name.to_string(), value);
        }
    }

    let explicit = page_context.and_then(|ctx| ctx.get(CONTEXT_PARAMS_KEY));
    if let Some(Value::Object(explicit)) = explicit {
        for (key, value) in explicit {
            params.insert(key.clone(), value.clone());
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn extracts_single_placeholder_from_props() {
        let props = obj(json!({ "id": "42", "other": true }));
        let params = extract_params(Some("/users/:id"), &props, None);
        assert_eq!(Value::Object(params), json!({ "id": "42" }));
    }

    #[test]
    fn context_params_win_on_collision() {
        let props = obj(json!({ "id": "42" }));
        let ctx = obj(json!({ "__params": { "id": "99" } }));
        let params = extract_params(Some("/users/:id"), &props, Some(&ctx));
        assert_eq!(Value::Object(params), json!({ "id": "99" }));
    }

    #[test]
    fn missing_prop_yields_null() {
        let params = extract_params(Some("/posts/:slug"), &Map::new(), None);
        assert_eq!(Value::Object(params), json!({ "slug": null }));
    }

    #[test]
    fn uppercase_and_digit_names_are_not_placeholders() {
        assert_eq!(placeholder_names("/a/:Id/:x1"), vec!["x"]);
        assert!(placeholder_names("/static/page").is_empty());
    }

    #[test]
    fn every_placeholder_is_extracted() {
        let props = obj(json!({ "year": "2024", "slug": "hello" }));
        let params = extract_params(Some("/blog/:year/:slug"), &props, None);
        assert_eq!(
            Value::Object(params),
            json!({ "year": "2024", "slug": "hello" })
        );
    }

    #[test]
    fn non_object_context_params_are_ignored() {
        let props = obj(json!({ "id": "1" }));
        let ctx = obj(json!({ "__params": "nope" }));
        let params = extract_params(Some("/:id"), &props, Some(&ctx));
        assert_eq!(Value::Object(params), json!({ "id": "1" }));
    }
}
