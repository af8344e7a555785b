//! Domain types shared by the data and indicator layers.

pub mod bar;
pub mod market;

pub use bar::{parse_decimal, Bar, Series};
pub use market::{FundingRate, OpenInterestSnapshot, OpenInterestWindow, TickerEntry};
