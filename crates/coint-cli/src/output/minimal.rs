use serde_json::Value;

/// Headline fields, first match wins. Dotted paths reach into nested objects.
const PRIORITY_PATHS: [&str; 8] = [
    "selected_rank",
    "b_on_a.p_value",
    "p_value",
    "backtest.summary.total_return",
    "summary.total_return",
    "rank.selected_rank",
    "total_return",
    "summary.mean",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(val) = PRIORITY_PATHS
        .iter()
        .filter_map(|path| lookup(result_obj, path))
        .find(|v| !v.is_null())
    {
        println!("{}", format_minimal(val));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_path() {
        let v = json!({"backtest": {"summary": {"total_return": 1.5}}});
        assert_eq!(lookup(&v, "backtest.summary.total_return"), Some(&json!(1.5)));
        assert_eq!(lookup(&v, "backtest.missing"), None);
    }
}
