use serde_json::Value;
use std::io;

use super::flatten;

/// Write output as CSV to stdout. The first record list in the result
/// (daily predictions, trend rows, ...) becomes the rows; results without
/// one are written as `field,value` pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(arr) => write_records(&mut wtr, arr),
        _ => {
            let flat = flatten(result);
            if let Some((_, records)) = flat.tables.first() {
                write_records(&mut wtr, records);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in &flat.fields {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
    }

    let _ = wtr.flush();
}

fn write_records(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
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
