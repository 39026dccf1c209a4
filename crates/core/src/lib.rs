//! Thread and Hanger Core - Shared types library.
//!
//! This crate provides the domain types used across all Thread and Hanger
//! components:
//! - `storefront` - Public boutique site and admin dashboard
//! - `cli` - Command-line tools for migrations, seeding, and admin setup
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. The bag, price arithmetic, and form validation
//! live here so they can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, categories, sizes, order status, product and
//!   order rows, and the shopping bag

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
