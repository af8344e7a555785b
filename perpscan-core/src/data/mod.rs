//! Market data acquisition: transport, retry, paging, universe, derivatives.

pub mod bybit;
pub mod cache;
pub mod derivatives;
pub mod fetcher;
pub mod series_builder;
pub mod transport;
pub mod universe;

pub use bybit::Endpoints;
pub use cache::SeriesCache;
pub use derivatives::DerivativesClient;
pub use fetcher::{RateLimitedFetcher, RetryPolicy};
pub use series_builder::{KlineSeriesBuilder, DEFAULT_TARGET_BARS, MIN_BARS};
pub use transport::{HttpTransport, Transport, TransportError};
pub use universe::SymbolUniverse;
