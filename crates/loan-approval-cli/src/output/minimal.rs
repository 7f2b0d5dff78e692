use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Decisions print their status (or error); training prints the held-out
/// accuracy; anything else falls back to the first field.
pub fn print_minimal(value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                println!("{}", minimal_line(item));
            }
        }
        other => println!("{}", minimal_line(other)),
    }
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_paths: [&[&str]; 4] = [
        &["status"],
        &["error"],
        &["level"],
        &["evaluation", "accuracy"],
    ];

    for path in priority_paths {
        if let Some(val) = lookup(result_obj, path) {
            if !val.is_null() {
                return format_minimal(val);
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }
    format_minimal(result_obj)
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
