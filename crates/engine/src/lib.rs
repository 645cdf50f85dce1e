//! Approval workflow engine for Outlay.
//!
//! This crate orchestrates the pure logic in `outlay-core` over injected
//! store traits. Persistence and authentication are external collaborators:
//! the engine consumes [`store::WorkflowStore`], [`store::RuleCatalog`] and
//! [`store::CompanyDirectory`] implementations plus an opaque actor context
//! supplied per operation.
//!
//! # Modules
//!
//! - `store` - Repository traits and their error type
//! - `memory` - In-memory store for tests and embedding
//! - `rates` - Currency normalizer and rate sources
//! - `service` - The workflow operations: submit, advance, override,
//!   escalation sweep, pending listing

pub mod memory;
pub mod rates;
pub mod service;
pub mod store;

pub use memory::InMemoryStore;
pub use rates::{CurrencyNormalizer, HttpRateSource, RateSource, StaticRateSource};
pub use service::{ExpenseDraft, ExpenseService};
pub use store::{CompanyDirectory, RuleCatalog, StoreError, UserRef, WorkflowStore};
