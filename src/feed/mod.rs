pub mod models;
pub mod odds_api;
pub mod traits;

pub use models::{FeedRecord, RawEvent, RawMarket, RawOutcome};
pub use odds_api::OddsApiClient;
pub use traits::FeedSource;
