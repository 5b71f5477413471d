//! External data collaborators for report generation
//!
//! Every provider here is a documented black box behind a trait so the
//! pipeline receives already-constructed clients (or test doubles):
//!
//! - [`MarketData`] / [`FmpClient`]: Financial Modeling Prep API
//! - [`Extractor`] / [`HttpExtractor`]: LLM-extraction scraping service
//! - [`FearGreedFeed`] / [`CnnFearGreedClient`]: CNN fear & greed index
//! - [`DataCache`]: timed in-process cache for fundamental data

pub mod cache;
pub mod error;
pub mod extract;
pub mod fear_greed;
pub mod fmp;

pub use cache::{CacheKey, DataCache};
pub use error::{DataError, Result};
pub use extract::{Extractor, ExtractionRequest, HttpExtractor, coerce_json, first_entry};
pub use fear_greed::{CnnFearGreedClient, FearGreedFeed};
pub use fmp::{FmpClient, MarketData};
