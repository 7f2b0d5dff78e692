use serde_json::Value;
use std::io;

use super::flatten_object;

/// Write output as CSV to stdout.
///
/// Objects (or a `result` envelope) become `field,value` rows with nested
/// keys flattened; arrays of objects become one row per element.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match value {
        Value::Object(map) => {
            let fields = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            write_fields(&mut wtr, fields)
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => wtr.write_record([format_csv_value(value)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_fields<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &serde_json::Map<String, Value>,
) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in flatten_object(map) {
        wtr.write_record([key, format_csv_value(&val)])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([format_csv_value(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        match value {
            Value::Array(arr) => write_rows(&mut wtr, arr).unwrap(),
            Value::Object(map) => write_fields(&mut wtr, map).unwrap(),
            _ => unreachable!(),
        }
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_batch_rows_render_with_headers() {
        let v = json!([
            { "http_status": 200, "status": "High Risk" },
            { "http_status": 400, "status": null }
        ]);
        assert_eq!(render(&v), "http_status,status\n200,High Risk\n400,\n");
    }

    #[test]
    fn test_fields_are_flattened() {
        let v = json!({ "evaluation": { "accuracy": 0.5 }, "rows": 2 });
        assert_eq!(render(&v), "field,value\nevaluation.accuracy,0.5\nrows,2\n");
    }
}
