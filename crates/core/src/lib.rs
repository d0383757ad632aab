//! Prostore Core - Domain types and rules.
//!
//! This crate provides the types and business rules shared by every Prostore component:
//! - `storefront` - Public JSON API (catalog, cart, checkout, payments, reviews)
//! - `admin` - Back-office API (dashboard, products, orders, users)
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database access,
//! no HTTP clients. Cart pricing and line mutation live here so they can be tested
//! without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, roles and addresses
//! - [`pricing`] - Cart totals (items, shipping, tax, total)
//! - [`cart`] - Adding and removing cart lines against stock
//! - [`catalog`] - Search filters, sorting and pagination
//! - [`forms`] - Validated input payloads
//! - [`validation`] - Field error collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod forms;
pub mod pricing;
pub mod types;
pub mod validation;

pub use types::*;
