//! Guna Core - Shared gift card types and matching rules.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clock reads. Everything that depends on time takes the
//! evaluation instant as an argument.
//!
//! # Modules
//!
//! - [`types`] - Gift card snapshot, page, lookup key and public response
//! - [`matching`] - Eligibility rules used while scanning pages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod matching;
pub mod types;

pub use matching::{first_eligible, is_eligible};
pub use types::*;
