pub mod provider;
pub mod store;

pub use provider::{InMemoryProvider, PriceProvider};
pub use store::{PriceSeriesStore, PriceTable};
