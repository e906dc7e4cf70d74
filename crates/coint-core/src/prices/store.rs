use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CointError;
use crate::types::Instrument;
use crate::CointResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw, unvalidated price table as supplied by a data provider or an input
/// document. `prices` holds one column per instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTable {
    pub instruments: Vec<Instrument>,
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<Vec<f64>>,
}

/// Aligned, cleaned price history for a fixed set of instruments.
///
/// Every column has one finite, strictly positive price per calendar date and
/// the calendar is strictly increasing. Construction is the only way in, so
/// downstream stages never re-check these invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceTable", into = "PriceTable")]
pub struct PriceSeriesStore {
    instruments: Vec<Instrument>,
    dates: Vec<NaiveDate>,
    columns: Vec<Vec<f64>>,
}

impl TryFrom<PriceTable> for PriceSeriesStore {
    type Error = CointError;

    fn try_from(table: PriceTable) -> Result<Self, Self::Error> {
        PriceSeriesStore::new(table.instruments, table.dates, table.prices)
    }
}

impl From<PriceSeriesStore> for PriceTable {
    fn from(store: PriceSeriesStore) -> Self {
        PriceTable {
            instruments: store.instruments,
            dates: store.dates,
            prices: store.columns,
        }
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl PriceSeriesStore {
    /// Build a store from already-aligned columns, validating every invariant.
    pub fn new(
        instruments: Vec<Instrument>,
        dates: Vec<NaiveDate>,
        columns: Vec<Vec<f64>>,
    ) -> CointResult<Self> {
        if instruments.is_empty() {
            return Err(CointError::InvalidInput {
                field: "instruments".into(),
                reason: "At least one instrument is required".into(),
            });
        }
        if columns.len() != instruments.len() {
            return Err(CointError::DimensionMismatch {
                context: "price store columns".into(),
                expected: instruments.len(),
                actual: columns.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for name in &instruments {
            if !seen.insert(name.as_str()) {
                return Err(CointError::InvalidInput {
                    field: "instruments".into(),
                    reason: format!("Duplicate instrument '{name}'"),
                });
            }
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(CointError::InvalidInput {
                field: "dates".into(),
                reason: format!(
                    "Dates must be strictly increasing ({} is followed by {})",
                    w[0], w[1]
                ),
            });
        }
        for (name, column) in instruments.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(CointError::LengthMismatch {
                    context: format!("price column '{name}' vs calendar"),
                    left: column.len(),
                    right: dates.len(),
                });
            }
            if let Some((i, p)) = column
                .iter()
                .enumerate()
                .find(|(_, p)| !p.is_finite() || **p <= 0.0)
            {
                return Err(CointError::InvalidInput {
                    field: format!("prices.{name}"),
                    reason: format!(
                        "Price on {} must be finite and positive, got {}",
                        dates[i], p
                    ),
                });
            }
        }

        Ok(Self {
            instruments,
            dates,
            columns,
        })
    }

    /// Align raw per-instrument observations onto a common calendar.
    ///
    /// Non-finite prices are discarded, then only dates observed for every
    /// instrument are kept. Duplicate dates within one instrument keep the
    /// last observation.
    pub fn align(observations: Vec<(Instrument, Vec<(NaiveDate, f64)>)>) -> CointResult<Self> {
        let mut instruments = Vec::with_capacity(observations.len());
        let mut by_instrument: Vec<BTreeMap<NaiveDate, f64>> =
            Vec::with_capacity(observations.len());
        let mut dropped = 0usize;

        for (name, points) in observations {
            let mut series = BTreeMap::new();
            for (date, price) in points {
                if price.is_finite() {
                    series.insert(date, price);
                } else {
                    dropped += 1;
                }
            }
            instruments.push(name);
            by_instrument.push(series);
        }

        let common: Vec<NaiveDate> = match by_instrument.split_first() {
            Some((first, rest)) => first
                .keys()
                .filter(|d| rest.iter().all(|s| s.contains_key(*d)))
                .copied()
                .collect(),
            None => Vec::new(),
        };

        let columns = by_instrument
            .iter()
            .map(|s| common.iter().map(|d| s[d]).collect())
            .collect();

        if dropped > 0 {
            tracing::debug!(dropped, kept = common.len(), "discarded non-finite observations");
        }

        Self::new(instruments, common, columns)
    }
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

impl PriceSeriesStore {
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of observations (rows).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    pub fn column(&self, instrument: &str) -> Option<&[f64]> {
        self.instruments
            .iter()
            .position(|i| i == instrument)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Prices of every instrument at observation `t`, or `None` past the end.
    pub fn row(&self, t: usize) -> Option<Vec<f64>> {
        if t >= self.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[t]).collect())
    }

    /// Restrict to the named instruments, in the order given.
    pub fn select(&self, instruments: &[Instrument]) -> CointResult<Self> {
        let mut columns = Vec::with_capacity(instruments.len());
        for name in instruments {
            let column = self.column(name).ok_or_else(|| CointError::InvalidInput {
                field: "instruments".into(),
                reason: format!("Unknown instrument '{name}'"),
            })?;
            columns.push(column.to_vec());
        }
        Self::new(instruments.to_vec(), self.dates.clone(), columns)
    }

    /// Restrict to observations with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> CointResult<Self> {
        if end < start {
            return Err(CointError::InvalidInput {
                field: "end".into(),
                reason: format!("End date {end} precedes start date {start}"),
            });
        }
        let from = self.dates.partition_point(|d| *d < start);
        let to = self.dates.partition_point(|d| *d <= end);
        Self::new(
            self.instruments.clone(),
            self.dates[from..to].to_vec(),
            self.columns.iter().map(|c| c[from..to].to_vec()).collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, 1, d).unwrap()
    }

    fn sample_store() -> PriceSeriesStore {
        PriceSeriesStore::new(
            vec!["AAPL".into(), "MSFT".into()],
            vec![day(2), day(3), day(4)],
            vec![vec![10.0, 11.0, 12.0], vec![20.0, 21.0, 22.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_unsorted_dates() {
        let result = PriceSeriesStore::new(
            vec!["A".into()],
            vec![day(3), day(2)],
            vec![vec![1.0, 2.0]],
        );
        assert!(matches!(result, Err(CointError::InvalidInput { .. })));
    }

    #[test]
    fn test_rejects_repeated_dates() {
        let result = PriceSeriesStore::new(
            vec!["A".into()],
            vec![day(2), day(2)],
            vec![vec![1.0, 2.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_nan_and_non_positive_prices() {
        let nan = PriceSeriesStore::new(vec!["A".into()], vec![day(2)], vec![vec![f64::NAN]]);
        assert!(nan.is_err());
        let zero = PriceSeriesStore::new(vec!["A".into()], vec![day(2)], vec![vec![0.0]]);
        assert!(zero.is_err());
    }

    #[test]
    fn test_rejects_short_column() {
        let result = PriceSeriesStore::new(
            vec!["A".into()],
            vec![day(2), day(3)],
            vec![vec![1.0]],
        );
        assert!(matches!(result, Err(CointError::LengthMismatch { .. })));
    }

    #[test]
    fn test_rejects_duplicate_instrument() {
        let result = PriceSeriesStore::new(
            vec!["A".into(), "A".into()],
            vec![day(2)],
            vec![vec![1.0], vec![2.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_align_keeps_common_dates_only() {
        let store = PriceSeriesStore::align(vec![
            (
                "A".into(),
                vec![(day(3), 2.0), (day(2), 1.0), (day(4), f64::NAN), (day(5), 4.0)],
            ),
            ("B".into(), vec![(day(2), 10.0), (day(4), 30.0), (day(5), 40.0)]),
        ])
        .unwrap();
        assert_eq!(store.dates(), &[day(2), day(5)]);
        assert_eq!(store.column("A").unwrap(), &[1.0, 4.0]);
        assert_eq!(store.column("B").unwrap(), &[10.0, 40.0]);
    }

    #[test]
    fn test_rows_and_select() {
        let store = sample_store();
        assert_eq!(store.row(1), Some(vec![11.0, 21.0]));
        let swapped = store.select(&["MSFT".into(), "AAPL".into()]).unwrap();
        assert_eq!(swapped.row(0), Some(vec![20.0, 10.0]));
        assert!(store.select(&["XOM".into()]).is_err());
    }

    #[test]
    fn test_row_past_end_is_none() {
        let store = sample_store();
        assert!(store.row(store.len() - 1).is_some());
        assert_eq!(store.row(store.len()), None);
        assert_eq!(store.row(usize::MAX), None);
    }

    #[test]
    fn test_between_is_inclusive() {
        let store = sample_store();
        let window = store.between(day(3), day(4)).unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window.column("AAPL").unwrap(), &[11.0, 12.0]);
        assert!(store.between(day(4), day(3)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"instruments":["A"],"dates":["2012-01-03","2012-01-02"],"prices":[[1.0,2.0]]}"#;
        let parsed: Result<PriceSeriesStore, _> = serde_json::from_str(json);
        assert!(parsed.is_err());

        let json = r#"{"instruments":["A"],"dates":["2012-01-02","2012-01-03"],"prices":[[1.0,2.0]]}"#;
        let parsed: PriceSeriesStore = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 2);
    }
}
