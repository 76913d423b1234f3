//! # PowerCoffee Shared Library
//!
//! This crate contains the domain types, persistence seams and business logic
//! used by the PowerCoffee API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, JWT issuance, reset tokens, external identity, authorization
//! - `db`: PostgreSQL pool and embedded migrations
//! - `identity`: The user identity and role-assignment workflow
//! - `models`: Database models and data structures
//! - `notify`: Delivery of password reset tokens
//! - `pagination`: Page/sort request and response types
//! - `shops`: Coffee shops, their catalog, people and orders
//! - `store`: Storage traits with PostgreSQL and in-memory implementations

pub mod auth;
pub mod db;
pub mod identity;
pub mod models;
pub mod notify;
pub mod pagination;
pub mod shops;
pub mod store;

/// Current version of the PowerCoffee shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
