use chrono::NaiveDate;

use super::store::PriceSeriesStore;
use crate::types::Instrument;
use crate::CointResult;

/// Source of historical adjusted-close prices.
///
/// Implementations return a store that is already aligned and cleaned; the
/// numeric stages never fetch data themselves.
pub trait PriceProvider {
    fn fetch(
        &self,
        instruments: &[Instrument],
        start: NaiveDate,
        end: NaiveDate,
    ) -> CointResult<PriceSeriesStore>;
}

/// Provider backed by a price table held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    store: PriceSeriesStore,
}

impl InMemoryProvider {
    pub fn new(store: PriceSeriesStore) -> Self {
        Self { store }
    }
}

impl PriceProvider for InMemoryProvider {
    fn fetch(
        &self,
        instruments: &[Instrument],
        start: NaiveDate,
        end: NaiveDate,
    ) -> CointResult<PriceSeriesStore> {
        let store = self.store.select(instruments)?.between(start, end)?;
        tracing::debug!(
            instruments = ?instruments,
            %start,
            %end,
            rows = store.len(),
            "served prices from memory"
        );
        Ok(store)
    }
}
