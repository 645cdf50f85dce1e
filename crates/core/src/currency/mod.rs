//! Currency conversion arithmetic for Outlay.
//!
//! The network-facing normalizer lives in the engine crate; this module
//! owns the pure pieces: rate tables and conversion arithmetic.

pub mod conversion;

pub use conversion::{RateTable, convert_amount};
