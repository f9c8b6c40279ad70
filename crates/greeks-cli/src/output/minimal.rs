use serde_json::Value;

use super::format_cell;

/// Result fields printed by `--output minimal`, most specific first.
const PRIORITY_KEYS: &[&str] = &["early_exercise_premium", "value", "values"];

/// Print just the key answer value from the output.
///
/// Falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal(value));
}

fn minimal(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
                return format_cell(val, "null");
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_cell(val, "null"));
        }
    }

    format_cell(result_obj, "null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_prints_value() {
        let out = json!({ "result": { "engine": "analytic", "value": 10.5 } });
        assert_eq!(minimal(&out), "10.5");
    }

    #[test]
    fn test_compare_prints_premium() {
        let out = json!({ "result": { "lattice_value": 6.09, "early_exercise_premium": 0.52 } });
        assert_eq!(minimal(&out), "0.52");
    }

    #[test]
    fn test_fallback_first_field() {
        let out = json!({ "result": { "engine": "lattice" } });
        assert_eq!(minimal(&out), "engine: lattice");
    }
}
