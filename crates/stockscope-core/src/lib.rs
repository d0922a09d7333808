//! Core types and traits for the market data and analysis backend.
//!
//! Holds the market data types every other crate passes around (bars,
//! quotes, institutional flow, fundamentals, holdings) and the traits at the
//! seams: indicators, data providers and the clock.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{DataError, IndicatorError, ValidationError};
pub use traits::*;
pub use types::*;
