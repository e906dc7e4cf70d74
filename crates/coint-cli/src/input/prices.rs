use chrono::NaiveDate;
use coint_core::PriceSeriesStore;
use std::io::Read;

use super::file::resolve_path;

/// Load a wide price CSV: a `date` column (`YYYY-MM-DD`) followed by one
/// column per instrument. Empty and `NaN` cells are dropped, then the
/// columns are aligned on the dates every instrument has.
pub fn read_price_csv(path: &str) -> Result<PriceSeriesStore, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_price_csv(file).map_err(|e| format!("{}: {}", canonical.display(), e).into())
}

pub fn parse_price_csv<R: Read>(reader: R) -> Result<PriceSeriesStore, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 || !headers[0].eq_ignore_ascii_case("date") {
        return Err("Expected a header of the form 'date,TICKER,...'".into());
    }
    let mut observations: Vec<(String, Vec<(NaiveDate, f64)>)> = headers
        .iter()
        .skip(1)
        .map(|name| (name.to_string(), Vec::new()))
        .collect();

    let mut previous: Option<NaiveDate> = None;
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let row = line + 2;
        let date = NaiveDate::parse_from_str(&record[0], "%Y-%m-%d")
            .map_err(|e| format!("Row {row}: invalid date '{}': {e}", &record[0]))?;
        if previous.is_some_and(|p| date <= p) {
            return Err(format!("Row {row}: dates must be strictly increasing, got {date}").into());
        }
        previous = Some(date);

        for (j, cell) in record.iter().skip(1).enumerate() {
            if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                continue;
            }
            let price: f64 = cell
                .parse()
                .map_err(|e| format!("Row {row}, column '{}': '{cell}': {e}", observations[j].0))?;
            observations[j].1.push((date, price));
        }
    }

    tracing::debug!(instruments = observations.len(), "loaded price csv");
    Ok(PriceSeriesStore::align(observations)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_and_aligns() {
        let data = "date,AAA,BBB\n\
                    2024-01-02,10.0,20.0\n\
                    2024-01-03,,21.0\n\
                    2024-01-04,11.0,NaN\n\
                    2024-01-05,12.0,22.0\n";
        let store = parse_price_csv(data.as_bytes()).unwrap();
        assert_eq!(store.instruments(), ["AAA".to_string(), "BBB".to_string()]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.column("BBB").unwrap(), [20.0, 22.0]);
    }

    #[test]
    fn test_rejects_unsorted_dates() {
        let data = "date,AAA\n2024-01-03,1.0\n2024-01-02,1.0\n";
        assert!(parse_price_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_missing_date_header() {
        assert!(parse_price_csv("AAA,BBB\n1,2\n".as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_bad_number() {
        let data = "date,AAA\n2024-01-02,abc\n";
        assert!(parse_price_csv(data.as_bytes()).is_err());
    }
}
