mod bar;
mod errors;
mod source;
pub mod user_agent;
mod yahoo;
pub use self::bar::DailyBar;
pub use self::errors::SourceError;
pub use self::source::PriceSource;
pub use self::yahoo::{date_to_offset_datetime, YahooSource};
