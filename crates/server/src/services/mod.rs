//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password authentication and bearer tokens
//! - `orders` - Order placement with transactional stock decrement
//! - `settings` - Cached delivery settings

pub mod auth;
pub mod orders;
pub mod settings;
