//! Coffee shops, their catalog, and the people and orders they track
//!
//! [`ShopService`] enforces ownership on top of [`crate::store::CoffeeShopStore`]:
//! an `admin` works only inside shops it owns, a `super_admin` anywhere.

pub mod orders;
pub mod people;
pub mod service;

pub use orders::NewOrderInput;
pub use people::{NewCustomerInput, NewEmployeeInput, NewSupplierInput};
pub use service::{NewProductInput, NewShopInput, ShopService};

use crate::auth::authorization::AuthzError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("Coffee shop not found")]
    ShopNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Owner not found")]
    OwnerNotFound,

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Supplier not found")]
    SupplierNotFound,

    #[error("Order not found")]
    OrderNotFound,

    /// An employee or customer was linked to a user account that does not exist
    #[error("Linked user not found")]
    LinkedUserNotFound,

    #[error("Category does not belong to this coffee shop")]
    CategoryNotInShop,

    #[error("Employee does not belong to this coffee shop")]
    EmployeeNotInShop,

    #[error("Customer does not belong to this coffee shop")]
    CustomerNotInShop,

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
