//! The closed set of `(target, op)` pairs an automation client may send in a
//! batch, with each pair's canonical dispatch type and required parameters.
//!
//! Required parameters are listed by canonical name; presence checks accept
//! any alias that normalizes to that name (see [`super::normalize`]).

use std::sync::LazyLock;

use indexmap::IndexMap;

#[derive(Debug)]
pub struct OpSpec {
    pub op: &'static str,
    pub canonical: &'static str,
    pub required: &'static [&'static str],
    pub description: &'static str,
}

#[derive(Debug)]
pub struct TargetSpec {
    pub target: &'static str,
    pub ops: &'static [OpSpec],
}

macro_rules! ops {
    ( $( $op:literal => $canonical:literal [ $( $req:literal ),* ] : $desc:literal ; )* ) => {
        &[ $( OpSpec {
            op: $op,
            canonical: $canonical,
            required: &[ $( $req ),* ],
            description: $desc,
        }, )* ]
    };
}

pub static TARGETS: &[TargetSpec] = &[
    TargetSpec {
        target: "canvas",
        ops: ops! {
            "create" => "canvas:create" []: "Start a new document (width, height, background)";
            "get_state" => "canvas:get-state" []: "Current document and undo/redo availability";
            "screenshot" => "canvas:screenshot" []: "Capture the rendered canvas to a file";
            "clear" => "canvas:clear" []: "Remove every element from every layer";
        },
    },
    TargetSpec {
        target: "layer",
        ops: ops! {
            "create" => "layer:create" ["name"]: "Add a layer at the top of the stack";
            "delete" => "layer:delete" ["layerId"]: "Delete a layer (never the last one)";
            "reorder" => "layer:reorder" ["layerId", "newIndex"]: "Move a layer to a new position";
            "visibility" => "layer:set-visibility" ["layerId", "visible"]: "Show or hide a layer";
            "opacity" => "layer:set-opacity" ["layerId", "opacity"]: "Set layer opacity (0-100)";
            "lock" => "layer:lock" ["layerId", "locked"]: "Lock or unlock a layer";
        },
    },
    TargetSpec {
        target: "shape",
        ops: ops! {
            "rect" => "shape:rectangle" ["x", "y"]: "Add a rectangle to the first unlocked layer";
            "ellipse" => "shape:ellipse" ["x", "y"]: "Add an ellipse to the first unlocked layer";
            "line" => "shape:line" ["x1", "y1", "x2", "y2"]: "Add a line to the first unlocked layer";
        },
    },
    TargetSpec {
        target: "text",
        ops: ops! {
            "create" => "text:create" ["x", "y", "content"]: "Add a text element";
            "update" => "text:update" ["elementId"]: "Change text content or typography";
        },
    },
    TargetSpec {
        target: "element",
        ops: ops! {
            "transform" => "element:transform" ["elementId"]: "Move, resize, rotate or fade an element";
            "style" => "element:style" ["elementId"]: "Change fill, stroke and other style fields";
            "delete" => "element:delete" ["elementId"]: "Delete an element";
            "duplicate" => "element:duplicate" ["elementId"]: "Copy an element with a small offset";
        },
    },
    TargetSpec {
        target: "image",
        ops: ops! {
            "add" => "image:import" ["path"]: "Embed an image file";
        },
    },
    TargetSpec {
        target: "export",
        ops: ops! {
            "png" => "export:png" []: "Render the canvas to a PNG file";
            "canvas" => "export:canvas" []: "Return the serialized document";
        },
    },
    TargetSpec {
        target: "project",
        ops: ops! {
            "save" => "project:save" []: "Write the document to durable storage";
            "load" => "project:load" []: "Replace the document with a saved one";
        },
    },
    TargetSpec {
        target: "history",
        ops: ops! {
            "undo" => "history:undo" []: "Revert the last mutation";
            "redo" => "history:redo" []: "Re-apply the last undone mutation";
        },
    },
];

static INDEX: LazyLock<IndexMap<&'static str, IndexMap<&'static str, &'static OpSpec>>> =
    LazyLock::new(|| {
        TARGETS
            .iter()
            .map(|t| (t.target, t.ops.iter().map(|o| (o.op, o)).collect()))
            .collect()
    });

pub fn is_target(target: &str) -> bool {
    INDEX.contains_key(target)
}

pub fn lookup(target: &str, op: &str) -> Option<&'static OpSpec> {
    INDEX.get(target)?.get(op).copied()
}

/// Map a `(target, op)` pair to its canonical dispatch type. Most op names
/// pass through unchanged.
pub fn canonical_type(target: &str, op: &str) -> String {
    lookup(target, op).map_or_else(|| format!("{target}:{op}"), |spec| spec.canonical.to_string())
}

/// True if `kind` is the canonical type of some whitelisted op.
#[cfg(test)]
pub fn is_canonical_type(kind: &str) -> bool {
    TARGETS
        .iter()
        .flat_map(|t| t.ops.iter())
        .any(|o| o.canonical == kind)
}

/// Plain-text listing of every target and op, for `canvas-cli ops`.
pub fn describe() -> String {
    let mut out = String::new();
    for target in TARGETS {
        out.push_str(target.target);
        out.push('\n');
        for op in target.ops {
            let required = if op.required.is_empty() {
                String::new()
            } else {
                format!(" (requires {})", op.required.join(", "))
            };
            out.push_str(&format!("  {:<11} {}{required}\n", op.op, op.description));
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn renamed_ops_map_to_explicit_verbs() {
        assert_eq!(canonical_type("shape", "rect"), "shape:rectangle");
        assert_eq!(canonical_type("canvas", "get_state"), "canvas:get-state");
        assert_eq!(canonical_type("layer", "visibility"), "layer:set-visibility");
        assert_eq!(canonical_type("image", "add"), "image:import");
        assert_eq!(canonical_type("element", "delete"), "element:delete");
    }

    #[test]
    fn unknown_pairs_pass_through() {
        assert!(lookup("shape", "star").is_none());
        assert_eq!(canonical_type("shape", "star"), "shape:star");
    }

    #[test]
    fn canonical_types_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for op in TARGETS.iter().flat_map(|t| t.ops.iter()) {
            assert!(seen.insert(op.canonical), "duplicate {}", op.canonical);
        }
        assert!(is_canonical_type("layer:set-opacity"));
        assert!(!is_canonical_type("batch:execute"));
    }

    #[test]
    fn describe_lists_required_params() {
        let text = describe();
        assert!(text.contains("layer\n"));
        assert!(text.contains("requires layerId, visible"));
    }
}
