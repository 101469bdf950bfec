use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::flatten;

/// Scalars as a Field/Value table, then one table per record list.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            let result = map.get("result").unwrap_or(value);
            print_result(result);

            if let Some(Value::Array(warnings)) = map.get("warnings") {
                if !warnings.is_empty() {
                    println!("\nWarnings:");
                    for w in warnings.iter().filter_map(Value::as_str) {
                        println!("  - {}", w);
                    }
                }
            }
            if let Some(Value::String(meth)) = map.get("methodology") {
                println!("\nMethodology: {}", meth);
            }
        }
        Value::Array(arr) => print_records(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    let flat = flatten(result);
    if !flat.fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &flat.fields {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
    for (name, records) in flat.tables {
        println!("\n{}", name);
        print_records(records);
    }
}

fn print_records(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
