/// Database models for PowerCoffee
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, credentials and reset-token state
/// - `role`: The fixed role catalog
/// - `coffee_shop`: Coffee shops owned by admin users
/// - `category`: Product categories owned by a shop
/// - `product`: Products owned by a shop
/// - `employee`, `customer`, `supplier`: People a shop deals with
/// - `order`: Orders placed at a shop
///
/// Owned rows hold only their shop's ID; nothing points the other way in memory.

pub mod category;
pub mod coffee_shop;
pub mod customer;
pub mod employee;
pub mod order;
pub mod product;
pub mod role;
pub mod supplier;
pub mod user;
