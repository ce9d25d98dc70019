//! Shorthand expansion: turns a terse client Op into a canonical command.
//!
//! `w`, `h`, `bg` and `radius` expand to their full field names; a bare `id`
//! becomes `layerId` for the `layer` target and `elementId` everywhere else.
//! When an Op carries both an alias and the full name, the alias wins.

use serde::Serialize;
use serde_json::{Map, Value};

use super::schema;

const ALIASES: &[(&str, &str)] = &[
    ("w", "width"),
    ("h", "height"),
    ("bg", "background"),
    ("radius", "cornerRadius"),
];

/// Keys that discriminate an Op and are never part of the payload.
const DISCRIMINATORS: &[&str] = &["target", "op"];

/// The normalized, dispatchable form of an Op. Constructed, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalCommand {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Map<String, Value>,
}

/// The canonical field name `key` stands for under `target`.
pub fn canonical_name<'a>(target: &str, key: &'a str) -> &'a str {
    if key == "id" {
        return if target == "layer" { "layerId" } else { "elementId" };
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or(key, |&(_, full)| full)
}

/// Read an Op's `target` and `op` strings, if present.
pub fn discriminators(op: &Map<String, Value>) -> (Option<&str>, Option<&str>) {
    (
        op.get("target").and_then(Value::as_str),
        op.get("op").and_then(Value::as_str),
    )
}

/// Normalize an Op that has already passed validation. Never fails: an Op
/// missing its discriminators simply yields an unroutable type string.
pub fn normalize(op: &Map<String, Value>) -> CanonicalCommand {
    let (target, operation) = discriminators(op);
    let target = target.unwrap_or_default();
    let operation = operation.unwrap_or_default();

    let params = op
        .iter()
        .filter(|(key, _)| !DISCRIMINATORS.contains(&key.as_str()));

    let mut payload = Map::new();
    // Full names first, then aliases so they overwrite on conflict.
    let (full, aliased): (Vec<_>, Vec<_>) =
        params.partition(|(key, _)| canonical_name(target, key) == key.as_str());
    for (key, value) in full.into_iter().chain(aliased) {
        payload.insert(canonical_name(target, key).to_string(), value.clone());
    }

    CanonicalCommand {
        kind: schema::canonical_type(target, operation),
        payload,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn bytes(cmd: &CanonicalCommand) -> String {
        serde_json::to_string(cmd).unwrap()
    }

    #[test]
    fn strips_discriminators_and_maps_type() {
        let cmd = normalize(&op(json!({ "target": "shape", "op": "rect", "x": 1, "y": 2 })));
        assert_eq!(cmd.kind, "shape:rectangle");
        assert_eq!(Value::Object(cmd.payload), json!({ "x": 1, "y": 2 }));
    }

    #[test]
    fn aliases_normalize_identically_to_full_names() {
        let pairs = [
            (
                json!({ "target": "shape", "op": "rect", "x": 0, "y": 0, "w": 100, "h": 50 }),
                json!({ "target": "shape", "op": "rect", "x": 0, "y": 0, "width": 100, "height": 50 }),
            ),
            (
                json!({ "target": "canvas", "op": "create", "bg": "#000" }),
                json!({ "target": "canvas", "op": "create", "background": "#000" }),
            ),
            (
                json!({ "target": "element", "op": "style", "id": "e1", "radius": 8 }),
                json!({ "target": "element", "op": "style", "elementId": "e1", "cornerRadius": 8 }),
            ),
            (
                json!({ "target": "layer", "op": "lock", "id": "l1", "locked": true }),
                json!({ "target": "layer", "op": "lock", "layerId": "l1", "locked": true }),
            ),
        ];
        for (short, long) in pairs {
            assert_eq!(bytes(&normalize(&op(short))), bytes(&normalize(&op(long))));
        }
    }

    #[test]
    fn id_is_disambiguated_by_target() {
        let layer = normalize(&op(json!({ "target": "layer", "op": "delete", "id": "L" })));
        assert_eq!(layer.payload.get("layerId"), Some(&json!("L")));
        assert!(layer.payload.get("id").is_none());

        let element = normalize(&op(json!({ "target": "text", "op": "update", "id": "E" })));
        assert_eq!(element.payload.get("elementId"), Some(&json!("E")));
    }

    #[test]
    fn alias_wins_over_full_name() {
        let cmd = normalize(&op(json!({
            "target": "shape", "op": "rect", "x": 0, "y": 0, "width": 10, "w": 99
        })));
        assert_eq!(cmd.payload.get("width"), Some(&json!(99)));
    }
}
