//! Core business logic for Outlay.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, rule matching, and state transitions
//! live here.
//!
//! # Modules
//!
//! - `workflow` - Expense approval workflow: data model, rule selection,
//!   stage-advancement state machine, escalation policy
//! - `currency` - Conversion arithmetic and rate tables

pub mod currency;
pub mod workflow;
