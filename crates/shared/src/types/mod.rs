//! Shared domain types.

pub mod currency;
pub mod id;
