pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// A result split into dotted scalar paths and nested lists of records.
#[derive(Default)]
pub struct Flattened<'a> {
    pub fields: Vec<(String, &'a Value)>,
    pub tables: Vec<(String, &'a [Value])>,
}

/// Walk nested objects, keeping `a.b.c` paths for scalars and collecting
/// arrays of objects (daily predictions, trend rows, ...) as tables.
pub fn flatten(value: &Value) -> Flattened<'_> {
    let mut out = Flattened::default();
    walk("", value, &mut out);
    out
}

fn walk<'a>(prefix: &str, value: &'a Value, out: &mut Flattened<'a>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                walk(&path, val, out);
            }
        }
        Value::Array(items) if items.first().map_or(false, Value::is_object) => {
            out.tables.push((prefix.to_string(), items.as_slice()));
        }
        _ => out.fields.push((prefix.to_string(), value)),
    }
}
