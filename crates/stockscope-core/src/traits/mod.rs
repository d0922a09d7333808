//! Core traits.

mod clock;
mod indicator;
mod provider;

pub use clock::{Clock, ManualClock, SystemClock};
pub use indicator::{Indicator, MultiOutputIndicator, OhlcIndicator};
pub use provider::MarketDataProvider;
