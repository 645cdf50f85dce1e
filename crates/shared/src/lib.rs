//! Shared types and configuration for Outlay.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Currency code type
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
pub use types::currency::CurrencyCode;
pub use types::id::{
    ApprovalRecordId, ApprovalRuleId, CompanyId, ExpenseId, UserId, UserSetId,
};
