//! Atelier Core - Shared domain types and storefront logic.
//!
//! This crate provides the types and pure logic used across all Atelier components:
//! - `server` - JSON REST API for the storefront and its admin surface
//! - `cli` - Command-line tools for migrations, admin bootstrap and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. The server runs the stock planner from [`stock`] inside its
//! order transaction, and clients can reuse [`cart`] and [`wishlist`] to manage
//! locally persisted state.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and order status
//! - [`stock`] - Stock models, line items, and the all-or-nothing stock planner
//! - [`cart`] - Cart state keyed by `productId_size` with legacy schema migration
//! - [`wishlist`] - Wishlist state with invalid-key cleanup
//! - [`pricing`] - Delivery fee rules and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod wishlist;

pub use types::*;
