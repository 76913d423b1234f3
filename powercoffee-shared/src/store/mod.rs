//! Persistence seams
//!
//! The identity workflow and the shop service only see these traits. Two
//! implementations exist: [`postgres::PgStore`] over a sqlx pool and
//! [`memory::MemoryStore`] for tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::category::{Category, NewCategory};
use crate::models::coffee_shop::{CoffeeShop, NewCoffeeShop, UpdateCoffeeShop};
use crate::models::customer::{Customer, NewCustomer, UpdateCustomer};
use crate::models::employee::{Employee, NewEmployee, UpdateEmployee};
use crate::models::order::{NewOrder, Order, UpdateOrder};
use crate::models::product::{NewProduct, Product, UpdateProduct};
use crate::models::role::{Role, RoleName};
use crate::models::supplier::{NewSupplier, Supplier, UpdateSupplier};
use crate::models::user::{NewUser, UpdateUser, User};
use crate::pagination::PageRequest;

/// User field guarded by a unique index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    PhoneNumber,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A write collided with an existing row on a unique field
    #[error("Unique constraint violated on {0:?}")]
    UniqueViolation(UniqueField),

    /// A referenced row does not exist
    #[error("Referenced record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// User records and their credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Cheap liveness probe
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks up the user holding a reset token with this SHA-256 digest
    async fn find_by_reset_token(&self, digest: &str) -> Result<Option<User>, StoreError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
    async fn exists_by_phone_number(&self, phone_number: &str) -> Result<bool, StoreError>;

    /// Persists a user together with its role links
    ///
    /// Fails with `UniqueViolation` when another user already holds the
    /// username, email or phone number.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Swaps in `password_hash` and clears the token, if `digest` names an
    /// unexpired reset token
    ///
    /// Matching and writing happen atomically: of two concurrent calls with
    /// the same digest, at most one gets `Some`.
    async fn consume_reset_token(
        &self,
        digest: &str,
        password_hash: &str,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Applies a partial update; `None` when the user does not exist
    async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<User>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// One page of users plus the total count
    async fn list(&self, page: &PageRequest) -> Result<(Vec<User>, i64), StoreError>;
}

/// The fixed role catalog
#[async_trait]
pub trait RoleCatalog: Send + Sync {
    async fn find_by_name(&self, name: RoleName) -> Result<Option<Role>, StoreError>;
}

/// Coffee shops and the entities they own
#[async_trait]
pub trait CoffeeShopStore: Send + Sync {
    async fn create_shop(&self, shop: NewCoffeeShop) -> Result<CoffeeShop, StoreError>;
    async fn find_shop(&self, id: Uuid) -> Result<Option<CoffeeShop>, StoreError>;

    /// One page of shops, restricted to `admin_id` when given, plus the total count
    async fn list_shops(
        &self,
        admin_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<(Vec<CoffeeShop>, i64), StoreError>;

    async fn update_shop(
        &self,
        id: Uuid,
        changes: UpdateCoffeeShop,
    ) -> Result<Option<CoffeeShop>, StoreError>;

    /// Deletes a shop and everything it owns
    async fn delete_shop(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_category(&self, category: NewCategory) -> Result<Category, StoreError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError>;
    async fn list_categories(&self, shop_id: Uuid) -> Result<Vec<Category>, StoreError>;
    async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    async fn list_products(&self, shop_id: Uuid) -> Result<Vec<Product>, StoreError>;
    async fn update_product(
        &self,
        id: Uuid,
        changes: UpdateProduct,
    ) -> Result<Option<Product>, StoreError>;
    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Fails with `NotFound` when the shop or the linked user does not exist
    async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError>;
    async fn find_employee(&self, id: Uuid) -> Result<Option<Employee>, StoreError>;
    async fn list_employees(&self, shop_id: Uuid) -> Result<Vec<Employee>, StoreError>;
    async fn update_employee(
        &self,
        id: Uuid,
        changes: UpdateEmployee,
    ) -> Result<Option<Employee>, StoreError>;

    /// Orders served by the employee keep existing with no employee
    async fn delete_employee(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError>;
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;
    async fn list_customers(&self, shop_id: Uuid) -> Result<Vec<Customer>, StoreError>;
    async fn update_customer(
        &self,
        id: Uuid,
        changes: UpdateCustomer,
    ) -> Result<Option<Customer>, StoreError>;
    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_supplier(&self, supplier: NewSupplier) -> Result<Supplier, StoreError>;
    async fn find_supplier(&self, id: Uuid) -> Result<Option<Supplier>, StoreError>;
    async fn list_suppliers(&self, shop_id: Uuid) -> Result<Vec<Supplier>, StoreError>;
    async fn update_supplier(
        &self,
        id: Uuid,
        changes: UpdateSupplier,
    ) -> Result<Option<Supplier>, StoreError>;
    async fn delete_supplier(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Fails with `NotFound` when a named customer or employee does not exist
    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError>;
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Newest first
    async fn list_orders(&self, shop_id: Uuid) -> Result<Vec<Order>, StoreError>;
    async fn update_order(&self, id: Uuid, changes: UpdateOrder)
        -> Result<Option<Order>, StoreError>;
    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError>;
}
