use serde_json::Value;

/// Headline figure per analysis, by JSON pointer into the result object.
const HEADLINES: [(&str, &str); 8] = [
    ("/totalPredicted", "predicted revenue"),
    ("/insights/predictedRevenue", "predicted revenue"),
    ("/basicStats/totalRevenue", "collected revenue"),
    ("/nextQuarter/estimated", "next quarter"),
    ("/insights/bestMonth/name", "best month"),
    ("/insights/mostPopularUniform", "most popular uniform"),
    ("/popularConfigs/0", "top configuration"),
    ("/recommendedStock", "recommended stock"),
];

/// Print just the headline value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for (pointer, label) in HEADLINES {
        if let Some(val) = result_obj.pointer(pointer) {
            if !val.is_null() {
                println!("{}: {}", label, format_minimal(val));
                return;
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", format_minimal(v)))
            .collect::<Vec<_>>()
            .join(" "),
        Value::Array(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
