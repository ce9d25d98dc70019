//! Op validation and shared value checks.
//!
//! Op validation is pure: it only inspects the Op and never touches the
//! document. A batch is validated as a whole before anything executes.

use serde_json::{Map, Value};

use super::normalize::{canonical_name, discriminators};
use super::schema;
use crate::error::AppError;

fn shown(value: Option<&str>) -> &str {
    value.unwrap_or("undefined")
}

/// Validate one Op at zero-based position `index` of its batch. Error texts
/// carry the 1-based position.
pub fn validate_op(op: &Value, index: usize) -> Result<(), AppError> {
    let n = index + 1;
    let Some(fields) = op.as_object() else {
        return Err(AppError::validation(format!("op {n}: must be an object")));
    };
    let (target, operation) = discriminators(fields);

    let Some(target) = target.filter(|t| schema::is_target(t)) else {
        return Err(AppError::validation(format!(
            "op {n}: unknown target \"{}\"",
            shown(target)
        )));
    };

    let Some(spec) = operation.and_then(|o| schema::lookup(target, o)) else {
        return Err(AppError::validation(format!(
            "op {n}: unknown op \"{target}.{}\"",
            shown(operation)
        )));
    };

    for required in spec.required {
        if !has_param(fields, target, required) {
            return Err(AppError::validation(format!(
                "op {n}: {} requires {required}",
                spec.op
            )));
        }
    }
    Ok(())
}

/// Presence check that accepts the canonical name or any alias of it.
fn has_param(fields: &Map<String, Value>, target: &str, canonical: &str) -> bool {
    fields
        .keys()
        .filter(|k| k.as_str() != "target" && k.as_str() != "op")
        .any(|k| canonical_name(target, k) == canonical)
}

/// Validate a whole batch: it must be a non-empty list and every Op must
/// pass [`validate_op`]. Returns the Ops on success.
pub fn validate_ops(ops: &Value) -> Result<&Vec<Value>, AppError> {
    let Some(list) = ops.as_array() else {
        return Err(AppError::validation("ops must be array"));
    };
    if list.is_empty() {
        return Err(AppError::validation("ops array empty"));
    }
    for (i, op) in list.iter().enumerate() {
        validate_op(op, i)?;
    }
    Ok(list)
}

// ── Value checks used by the executor ───────────────────────────

/// Validate that opacity is a finite number in [0, 100].
pub fn validate_opacity(opacity: f64) -> Result<(), AppError> {
    validate_finite(opacity, "Opacity")?;
    if !(0.0..=100.0).contains(&opacity) {
        return Err(AppError::invalid(format!(
            "Opacity ({opacity:.1}) must be between 0 and 100"
        )));
    }
    Ok(())
}

/// Validate that a value is finite and positive.
pub fn validate_positive_finite(value: f64, name: &str) -> Result<(), AppError> {
    validate_finite(value, name)?;
    if value <= 0.0 {
        return Err(AppError::invalid(format!("{name} must be positive")));
    }
    Ok(())
}

/// Validate that a value is finite.
pub fn validate_finite(value: f64, name: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::invalid(format!("{name} must be finite")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(result: Result<(), AppError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn unknown_target() {
        let err = message(validate_op(&json!({ "target": "device", "op": "frame" }), 0));
        assert_eq!(err, "op 1: unknown target \"device\"");
        let err = message(validate_op(&json!({ "op": "rect" }), 2));
        assert_eq!(err, "op 3: unknown target \"undefined\"");
    }

    #[test]
    fn unknown_op() {
        let err = message(validate_op(&json!({ "target": "shape", "op": "star" }), 1));
        assert_eq!(err, "op 2: unknown op \"shape.star\"");
    }

    #[test]
    fn missing_required_param_names_op_and_param() {
        let err = message(validate_op(&json!({ "target": "text", "op": "create", "x": 0, "y": 0 }), 0));
        assert_eq!(err, "op 1: create requires content");
        let err = message(validate_op(&json!({ "target": "layer", "op": "visibility", "id": "L" }), 0));
        assert_eq!(err, "op 1: visibility requires visible");
    }

    #[test]
    fn required_params_accept_aliases_and_full_names() {
        assert!(validate_op(&json!({ "target": "element", "op": "delete", "id": "e" }), 0).is_ok());
        assert!(validate_op(&json!({ "target": "element", "op": "delete", "elementId": "e" }), 0).is_ok());
        assert!(validate_op(&json!({ "target": "layer", "op": "delete", "layerId": "l" }), 0).is_ok());
        // `elementId` does not satisfy a layer op's `layerId`.
        assert!(validate_op(&json!({ "target": "layer", "op": "delete", "elementId": "l" }), 0).is_err());
    }

    #[test]
    fn batch_shape_errors() {
        assert_eq!(validate_ops(&json!({ "a": 1 })).unwrap_err().to_string(), "ops must be array");
        assert_eq!(validate_ops(&json!([])).unwrap_err().to_string(), "ops array empty");
        assert_eq!(
            validate_ops(&json!([{ "target": "canvas", "op": "clear" }, 42])).unwrap_err().to_string(),
            "op 2: must be an object"
        );
    }

    #[test]
    fn batch_fails_at_first_invalid_op() {
        let ops = json!([
            { "target": "shape", "op": "rect", "x": 0, "y": 0 },
            { "target": "shape", "op": "rect", "x": 0 },
            { "target": "nope", "op": "x" }
        ]);
        assert_eq!(validate_ops(&ops).unwrap_err().to_string(), "op 2: rect requires y");
    }

    #[test]
    fn value_checks() {
        assert!(validate_opacity(50.0).is_ok());
        assert!(validate_opacity(101.0).is_err());
        assert!(validate_opacity(f64::NAN).is_err());
        assert!(validate_positive_finite(0.0, "Width").is_err());
        assert!(validate_positive_finite(2.0, "Width").is_ok());
    }
}
