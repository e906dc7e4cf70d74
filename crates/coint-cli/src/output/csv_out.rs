use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// When the result carries per-bar (or per-rank) series, the longest
/// same-length scalar arrays become columns with an `index` column in
/// front; otherwise a two-column `field,value` listing is written.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    for record in records(body) {
        let _ = wtr.write_record(&record);
    }
    let _ = wtr.flush();
}

fn records(body: &Value) -> Vec<Vec<String>> {
    match body {
        Value::Object(map) => match series_columns(map) {
            Some(columns) => column_records(&columns),
            None => {
                let mut out = vec![vec!["field".to_string(), "value".to_string()]];
                out.extend(
                    map.iter()
                        .map(|(key, val)| vec![key.clone(), format_csv_value(val)]),
                );
                out
            }
        },
        Value::Array(arr) => arr.iter().map(|v| vec![format_csv_value(v)]).collect(),
        _ => vec![vec![format_csv_value(body)]],
    }
}

/// Scalar arrays of the longest common length, in field order.
fn series_columns(map: &Map<String, Value>) -> Option<Vec<(&str, &[Value])>> {
    let scalar_arrays: Vec<(&str, &[Value])> = map
        .iter()
        .filter_map(|(key, val)| match val {
            Value::Array(arr) if !arr.is_empty() && arr.iter().all(is_scalar) => {
                Some((key.as_str(), arr.as_slice()))
            }
            _ => None,
        })
        .collect();
    let len = scalar_arrays.iter().map(|(_, arr)| arr.len()).max()?;
    Some(
        scalar_arrays
            .into_iter()
            .filter(|(_, arr)| arr.len() == len)
            .collect(),
    )
}

fn column_records(columns: &[(&str, &[Value])]) -> Vec<Vec<String>> {
    let len = columns.first().map_or(0, |(_, arr)| arr.len());
    let mut out = Vec::with_capacity(len + 1);
    out.push(
        std::iter::once("index".to_string())
            .chain(columns.iter().map(|(key, _)| key.to_string()))
            .collect(),
    );
    for t in 0..len {
        out.push(
            std::iter::once(t.to_string())
                .chain(columns.iter().map(|(_, arr)| format_csv_value(&arr[t])))
                .collect(),
        );
    }
    out
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
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
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_series_become_columns() {
        let body = json!({
            "spread": [1.0, 2.0],
            "zscore": [null, 0.5],
            "weights": [1.0],
            "summary": {"trades": 1}
        });
        assert_eq!(
            records(&body),
            vec![
                vec!["index", "spread", "zscore"],
                vec!["0", "1.0", ""],
                vec!["1", "2.0", "0.5"],
            ]
        );
    }

    #[test]
    fn test_scalar_result_is_field_value() {
        let body = json!({"p_value": 0.01, "is_stationary": true});
        assert_eq!(
            records(&body),
            vec![
                vec!["field", "value"],
                vec!["is_stationary", "true"],
                vec!["p_value", "0.01"],
            ]
        );
    }
}
