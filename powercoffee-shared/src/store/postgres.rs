//! PostgreSQL-backed stores
//!
//! Thin adapters from the store traits onto the model functions in
//! [`crate::models`]. The interesting part is error mapping: unique-index
//! violations are reported per field so callers can say which value clashed.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CoffeeShopStore, CredentialStore, RoleCatalog, StoreError, UniqueField};
use crate::db::pool::health_check;
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

/// Store over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// User unique constraints, as named by the migrations
const UNIQUE_CONSTRAINTS: &[(&str, UniqueField)] = &[
    ("users_username_key", UniqueField::Username),
    ("users_email_key", UniqueField::Email),
    ("users_phone_number_key", UniqueField::PhoneNumber),
];

/// Which user field a unique constraint guards
pub fn unique_field_for_constraint(constraint: &str) -> Option<UniqueField> {
    UNIQUE_CONSTRAINTS
        .iter()
        .find(|(name, _)| *name == constraint)
        .map(|(_, field)| *field)
}

/// Translates constraint failures into store errors
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(unique_field_for_constraint) {
                return StoreError::UniqueViolation(field);
            }
        }

        if db_err.is_foreign_key_violation() {
            return StoreError::NotFound;
        }
    }

    StoreError::Database(err)
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await.map_err(StoreError::from)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        User::find_by_id(&self.pool, id).await.map_err(map_sqlx_error)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        User::find_by_username(&self.pool, username)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        User::find_by_email(&self.pool, email)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_by_reset_token(&self, digest: &str) -> Result<Option<User>, StoreError> {
        User::find_by_reset_token_hash(&self.pool, digest)
            .await
            .map_err(map_sqlx_error)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        User::exists_by_username(&self.pool, username)
            .await
            .map_err(map_sqlx_error)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        User::exists_by_email(&self.pool, email)
            .await
            .map_err(map_sqlx_error)
    }

    async fn exists_by_phone_number(&self, phone_number: &str) -> Result<bool, StoreError> {
        User::exists_by_phone_number(&self.pool, phone_number)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        User::create(&self.pool, user).await.map_err(map_sqlx_error)
    }

    async fn consume_reset_token(
        &self,
        digest: &str,
        password_hash: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        User::consume_reset_token(&self.pool, digest, password_hash)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<User>, StoreError> {
        User::update(&self.pool, id, changes)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        User::delete(&self.pool, id).await.map_err(map_sqlx_error)
    }

    async fn list(&self, page: &PageRequest) -> Result<(Vec<User>, i64), StoreError> {
        let users = User::list(&self.pool, page).await.map_err(map_sqlx_error)?;
        let total = User::count(&self.pool).await.map_err(map_sqlx_error)?;
        Ok((users, total))
    }
}

#[async_trait]
impl RoleCatalog for PgStore {
    async fn find_by_name(&self, name: RoleName) -> Result<Option<Role>, StoreError> {
        Role::find_by_name(&self.pool, name)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl CoffeeShopStore for PgStore {
    async fn create_shop(&self, shop: NewCoffeeShop) -> Result<CoffeeShop, StoreError> {
        CoffeeShop::create(&self.pool, shop)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_shop(&self, id: Uuid) -> Result<Option<CoffeeShop>, StoreError> {
        CoffeeShop::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_shops(
        &self,
        admin_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<(Vec<CoffeeShop>, i64), StoreError> {
        let shops = CoffeeShop::list(&self.pool, admin_id, page)
            .await
            .map_err(map_sqlx_error)?;
        let total = CoffeeShop::count(&self.pool, admin_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok((shops, total))
    }

    async fn update_shop(
        &self,
        id: Uuid,
        changes: UpdateCoffeeShop,
    ) -> Result<Option<CoffeeShop>, StoreError> {
        CoffeeShop::update(&self.pool, id, changes)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_shop(&self, id: Uuid) -> Result<bool, StoreError> {
        CoffeeShop::delete(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, StoreError> {
        Category::create(&self.pool, category)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        Category::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_categories(&self, shop_id: Uuid) -> Result<Vec<Category>, StoreError> {
        Category::list_by_shop(&self.pool, shop_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError> {
        Category::delete(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        Product::create(&self.pool, product)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Product::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_products(&self, shop_id: Uuid) -> Result<Vec<Product>, StoreError> {
        Product::list_by_shop(&self.pool, shop_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        Product::update(&self.pool, id, changes)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        Product::delete(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        Employee::create(&self.pool, employee)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_employee(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        Employee::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_employees(&self, shop_id: Uuid) -> Result<Vec<Employee>, StoreError> {
        Employee::list_by_shop(&self.pool, shop_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_employee(
        &self,
        id: Uuid,
        changes: UpdateEmployee,
    ) -> Result<Option<Employee>, StoreError> {
        Employee::update(&self.pool, id, changes)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_employee(&self, id: Uuid) -> Result<bool, StoreError> {
        Employee::delete(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        Customer::create(&self.pool, customer)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Customer::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_customers(&self, shop_id: Uuid) -> Result<Vec<Customer>, StoreError> {
        Customer::list_by_shop(&self.pool, shop_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_customer(
        &self,
        id: Uuid,
        changes: UpdateCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        Customer::update(&self.pool, id, changes)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        Customer::delete(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_supplier(&self, supplier: NewSupplier) -> Result<Supplier, StoreError> {
        Supplier::create(&self.pool, supplier)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_supplier(&self, id: Uuid) -> Result<Option<Supplier>, StoreError> {
        Supplier::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_suppliers(&self, shop_id: Uuid) -> Result<Vec<Supplier>, StoreError> {
        Supplier::list_by_shop(&self.pool, shop_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_supplier(
        &self,
        id: Uuid,
        changes: UpdateSupplier,
    ) -> Result<Option<Supplier>, StoreError> {
        Supplier::update(&self.pool, id, changes)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_supplier(&self, id: Uuid) -> Result<bool, StoreError> {
        Supplier::delete(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        Order::create(&self.pool, order)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Order::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_orders(&self, shop_id: Uuid) -> Result<Vec<Order>, StoreError> {
        Order::list_by_shop(&self.pool, shop_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_order(
        &self,
        id: Uuid,
        changes: UpdateOrder,
    ) -> Result<Option<Order>, StoreError> {
        Order::update(&self.pool, id, changes)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        Order::delete(&self.pool, id)
            .await
            .map_err(map_sqlx_error)
    }
}
