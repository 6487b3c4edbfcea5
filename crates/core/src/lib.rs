//! Emporium Core - domain types and pure catalog logic.
//!
//! This crate is shared by every Emporium component:
//! - `admin` - REST client and admin services
//! - `cli` - Command-line front end (`emp`)
//!
//! # Architecture
//!
//! The core crate performs no I/O: no HTTP, no storage, no clocks. Anything
//! time-dependent (date buckets, recommendation seeds) takes the current time
//! as an argument so results are reproducible in tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, money helpers, order status
//! - [`models`] - Wire models for products, orders, users, wishlists, carts
//! - [`query`] - Filter, sort and paginate pipeline for admin lists
//! - [`simulation`] - Seeded recommendation simulator (not a predictive model)
//! - [`forms`] - Draft state and client-side validation for CRUD forms
//! - [`search`] - Recent search history bookkeeping

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod forms;
pub mod models;
pub mod query;
pub mod search;
pub mod simulation;
pub mod types;

pub use types::*;
