pub mod deal_filter;
pub mod listing_parser;
pub mod price;
pub mod types;

pub use deal_filter::filter;
pub use listing_parser::{extract, Extraction, RawListing, SkipReason};
pub use price::{parse_price_token, PriceToken, PriceUnit};
pub use types::ProductEntry;
