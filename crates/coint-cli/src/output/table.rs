use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Arrays longer than this are summarized instead of listed.
const MAX_INLINE_ITEMS: usize = 8;

/// Format output as a two-column table, nested objects flattened into
/// dotted field names.
pub fn print_table(value: &Value) {
    let (body, envelope) = match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => (result, Some(map)),
            None => (value, None),
        },
        _ => (value, None),
    };

    let mut rows = Vec::new();
    flatten("", body, &mut rows);

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in rows {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));

    if let Some(envelope) = envelope {
        print_envelope(envelope);
    }
}

fn print_envelope(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, val, rows);
            }
        }
        _ => {
            let key = if prefix.is_empty() { "value" } else { prefix };
            rows.push((key.to_string(), format_value(value)));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) if arr.len() > MAX_INLINE_ITEMS => format!(
            "[{} values] {} .. {}",
            arr.len(),
            format_value(&arr[0]),
            format_value(&arr[arr.len() - 1])
        ),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
