//! In-memory store
//!
//! Mirrors the PostgreSQL schema's guarantees closely enough for tests:
//! unique username/email/phone, seeded roles, foreign keys, and the cascade
//! rules (user → shops → everything a shop owns; `SET NULL` for a deleted
//! category, a deleted order party, and a deleted user linked to staff or
//! customers).
//! All state sits behind one mutex, so a uniqueness check and the insert
//! that follows it happen atomically.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{CoffeeShopStore, CredentialStore, RoleCatalog, StoreError, UniqueField};
use crate::models::category::{Category, NewCategory};
use crate::models::coffee_shop::{CoffeeShop, NewCoffeeShop, UpdateCoffeeShop, SHOP_SORT_COLUMNS};
use crate::models::customer::{Customer, NewCustomer, UpdateCustomer};
use crate::models::employee::{Employee, NewEmployee, UpdateEmployee};
use crate::models::order::{NewOrder, Order, UpdateOrder};
use crate::models::product::{NewProduct, Product, UpdateProduct};
use crate::models::role::{Role, RoleName};
use crate::models::supplier::{NewSupplier, Supplier, UpdateSupplier};
use crate::models::user::{NewUser, UpdateUser, User, USER_SORT_COLUMNS};
use crate::pagination::{PageRequest, SortDirection};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    roles: Vec<Role>,
    shops: HashMap<Uuid, CoffeeShop>,
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
    employees: HashMap<Uuid, Employee>,
    customers: HashMap<Uuid, Customer>,
    suppliers: HashMap<Uuid, Supplier>,
    orders: HashMap<Uuid, Order>,
}

impl Inner {
    /// First of the given values already held by a user other than `except`
    fn collision(
        &self,
        except: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Option<UniqueField> {
        let others = || self.users.values().filter(move |u| Some(u.id) != except);

        if let Some(username) = username {
            if others().any(|u| u.username == username) {
                return Some(UniqueField::Username);
            }
        }
        if let Some(email) = email {
            if others().any(|u| u.email == email) {
                return Some(UniqueField::Email);
            }
        }
        if let Some(phone_number) = phone_number {
            if others().any(|u| u.phone_number == phone_number) {
                return Some(UniqueField::PhoneNumber);
            }
        }
        None
    }

    fn remove_shop(&mut self, id: Uuid) -> bool {
        if self.shops.remove(&id).is_none() {
            return false;
        }
        self.categories.retain(|_, c| c.coffee_shop_id != id);
        self.products.retain(|_, p| p.coffee_shop_id != id);
        self.employees.retain(|_, e| e.coffee_shop_id != id);
        self.customers.retain(|_, c| c.coffee_shop_id != id);
        self.suppliers.retain(|_, s| s.coffee_shop_id != id);
        self.orders.retain(|_, o| o.coffee_shop_id != id);
        self.detach_orders();
        true
    }

    /// Clears order links to customers and employees that no longer exist
    fn detach_orders(&mut self) {
        let (customers, employees) = (&self.customers, &self.employees);
        for order in self.orders.values_mut() {
            if order.customer_id.is_some_and(|id| !customers.contains_key(&id)) {
                order.customer_id = None;
            }
            if order.employee_id.is_some_and(|id| !employees.contains_key(&id)) {
                order.employee_id = None;
            }
        }
    }

    fn user_exists(&self, user_id: Option<Uuid>) -> bool {
        user_id.map_or(true, |id| self.users.contains_key(&id))
    }
}

/// Thread-safe in-memory implementation of every store trait
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Store seeded with the full role catalog
    pub fn new() -> Self {
        Self::with_roles(&RoleName::ALL)
    }

    /// Store whose catalog holds only `roles`
    pub fn with_roles(roles: &[RoleName]) -> Self {
        let roles = roles
            .iter()
            .enumerate()
            .map(|(i, name)| Role {
                id: i as i32 + 1,
                name: *name,
            })
            .collect();

        Self {
            inner: Mutex::new(Inner {
                roles,
                ..Inner::default()
            }),
        }
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_users(a: &User, b: &User, column: &str) -> Ordering {
    match column {
        "username" => a.username.cmp(&b.username),
        "email" => a.email.cmp(&b.email),
        "first_name" => a.first_name.cmp(&b.first_name),
        "last_name" => a.last_name.cmp(&b.last_name),
        "created_at" => a.created_at.cmp(&b.created_at),
        _ => a.id.cmp(&b.id),
    }
}

fn compare_shops(a: &CoffeeShop, b: &CoffeeShop, column: &str) -> Ordering {
    match column {
        "name" => a.name.cmp(&b.name),
        "city" => a.city.cmp(&b.city),
        "created_at" => a.created_at.cmp(&b.created_at),
        _ => a.id.cmp(&b.id),
    }
}

/// Sorts, then slices out one page
fn paginate<T: Clone>(
    mut items: Vec<T>,
    page: &PageRequest,
    cmp: impl Fn(&T, &T) -> Ordering,
    id: impl Fn(&T) -> Uuid,
) -> Vec<T> {
    items.sort_by(|a, b| {
        let primary = match page.sort_dir {
            SortDirection::Asc => cmp(a, b),
            SortDirection::Desc => cmp(b, a),
        };
        primary.then_with(|| id(a).cmp(&id(b)))
    });

    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(&self, digest: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.reset_token_hash.as_deref() == Some(digest))
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.lock().users.values().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.lock().users.values().any(|u| u.email == email))
    }

    async fn exists_by_phone_number(&self, phone_number: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .users
            .values()
            .any(|u| u.phone_number == phone_number))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock();

        if let Some(field) = inner.collision(
            None,
            Some(&user.username),
            Some(&user.email),
            Some(&user.phone_number),
        ) {
            return Err(StoreError::UniqueViolation(field));
        }

        let mut roles: Vec<RoleName> = user.roles.iter().map(|r| r.name).collect();
        roles.sort();
        roles.dedup();

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            roles,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn consume_reset_token(
        &self,
        digest: &str,
        password_hash: &str,
    ) -> Result<Option<Uuid>, StoreError> {
        let mut inner = self.lock();
        let now = Utc::now();

        let Some(user) = inner.users.values_mut().find(|u| {
            u.reset_token_hash.as_deref() == Some(digest)
                && u.reset_token_expires_at.is_some_and(|at| at > now)
        }) else {
            return Ok(None);
        };

        user.password_hash = password_hash.to_string();
        user.reset_token_hash = None;
        user.reset_token_expires_at = None;
        user.updated_at = now;

        Ok(Some(user.id))
    }

    async fn update(&self, id: Uuid, changes: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock();

        if !inner.users.contains_key(&id) {
            return Ok(None);
        }

        if let Some(field) = inner.collision(
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
            changes.phone_number.as_deref(),
        ) {
            return Err(StoreError::UniqueViolation(field));
        }

        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(phone_number) = changes.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(reset_token) = changes.reset_token {
            match reset_token {
                Some(state) => {
                    user.reset_token_hash = Some(state.digest);
                    user.reset_token_expires_at = Some(state.expires_at);
                }
                None => {
                    user.reset_token_hash = None;
                    user.reset_token_expires_at = None;
                }
            }
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();

        if inner.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned: Vec<Uuid> = inner
            .shops
            .values()
            .filter(|s| s.admin_id == id)
            .map(|s| s.id)
            .collect();
        for shop_id in owned {
            inner.remove_shop(shop_id);
        }
        for employee in inner.employees.values_mut() {
            if employee.user_id == Some(id) {
                employee.user_id = None;
            }
        }
        for customer in inner.customers.values_mut() {
            if customer.user_id == Some(id) {
                customer.user_id = None;
            }
        }

        Ok(true)
    }

    async fn list(&self, page: &PageRequest) -> Result<(Vec<User>, i64), StoreError> {
        let users: Vec<User> = self.lock().users.values().cloned().collect();
        let total = users.len() as i64;
        let column = page.sort_column(USER_SORT_COLUMNS).to_string();

        let content = paginate(users, page, |a, b| compare_users(a, b, &column), |u| u.id);
        Ok((content, total))
    }
}

#[async_trait]
impl RoleCatalog for MemoryStore {
    async fn find_by_name(&self, name: RoleName) -> Result<Option<Role>, StoreError> {
        Ok(self.lock().roles.iter().find(|r| r.name == name).cloned())
    }
}

#[async_trait]
impl CoffeeShopStore for MemoryStore {
    async fn create_shop(&self, shop: NewCoffeeShop) -> Result<CoffeeShop, StoreError> {
        let mut inner = self.lock();

        if !inner.users.contains_key(&shop.admin_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let created = CoffeeShop {
            id: Uuid::new_v4(),
            name: shop.name,
            address: shop.address,
            city: shop.city,
            admin_id: shop.admin_id,
            created_at: now,
            updated_at: now,
        };
        inner.shops.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_shop(&self, id: Uuid) -> Result<Option<CoffeeShop>, StoreError> {
        Ok(self.lock().shops.get(&id).cloned())
    }

    async fn list_shops(
        &self,
        admin_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<(Vec<CoffeeShop>, i64), StoreError> {
        let shops: Vec<CoffeeShop> = self
            .lock()
            .shops
            .values()
            .filter(|s| admin_id.map_or(true, |id| s.admin_id == id))
            .cloned()
            .collect();
        let total = shops.len() as i64;
        let column = page.sort_column(SHOP_SORT_COLUMNS).to_string();

        let content = paginate(shops, page, |a, b| compare_shops(a, b, &column), |s| s.id);
        Ok((content, total))
    }

    async fn update_shop(
        &self,
        id: Uuid,
        changes: UpdateCoffeeShop,
    ) -> Result<Option<CoffeeShop>, StoreError> {
        let mut inner = self.lock();
        let Some(shop) = inner.shops.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            shop.name = name;
        }
        if let Some(address) = changes.address {
            shop.address = address;
        }
        if let Some(city) = changes.city {
            shop.city = city;
        }
        shop.updated_at = Utc::now();

        Ok(Some(shop.clone()))
    }

    async fn delete_shop(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().remove_shop(id))
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, StoreError> {
        let mut inner = self.lock();

        if !inner.shops.contains_key(&category.coffee_shop_id) {
            return Err(StoreError::NotFound);
        }

        let created = Category {
            id: Uuid::new_v4(),
            name: category.name,
            description: category.description,
            coffee_shop_id: category.coffee_shop_id,
            created_at: Utc::now(),
        };
        inner.categories.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        Ok(self.lock().categories.get(&id).cloned())
    }

    async fn list_categories(&self, shop_id: Uuid) -> Result<Vec<Category>, StoreError> {
        let mut categories: Vec<Category> = self
            .lock()
            .categories
            .values()
            .filter(|c| c.coffee_shop_id == shop_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();

        if inner.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for product in inner.products.values_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }

        Ok(true)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut inner = self.lock();

        if !inner.shops.contains_key(&product.coffee_shop_id) {
            return Err(StoreError::NotFound);
        }
        if let Some(category_id) = product.category_id {
            if !inner.categories.contains_key(&category_id) {
                return Err(StoreError::NotFound);
            }
        }

        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            image_url: product.image_url,
            purchase_price: product.purchase_price,
            sale_price: product.sale_price,
            stock: product.stock,
            category_id: product.category_id,
            coffee_shop_id: product.coffee_shop_id,
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn list_products(&self, shop_id: Uuid) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .lock()
            .products
            .values()
            .filter(|p| p.coffee_shop_id == shop_id)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        let mut inner = self.lock();

        if let Some(Some(category_id)) = changes.category_id {
            if !inner.categories.contains_key(&category_id) {
                return Err(StoreError::NotFound);
            }
        }

        let Some(product) = inner.products.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = Some(description);
        }
        if let Some(image_url) = changes.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(purchase_price) = changes.purchase_price {
            product.purchase_price = purchase_price;
        }
        if let Some(sale_price) = changes.sale_price {
            product.sale_price = sale_price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(category_id) = changes.category_id {
            product.category_id = category_id;
        }
        product.updated_at = Utc::now();

        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().products.remove(&id).is_some())
    }

    async fn create_employee(&self, employee: NewEmployee) -> Result<Employee, StoreError> {
        let mut inner = self.lock();

        if !inner.shops.contains_key(&employee.coffee_shop_id) || !inner.user_exists(employee.user_id)
        {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let created = Employee {
            id: Uuid::new_v4(),
            user_id: employee.user_id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            position: employee.position,
            coffee_shop_id: employee.coffee_shop_id,
            created_at: now,
            updated_at: now,
        };
        inner.employees.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_employee(&self, id: Uuid) -> Result<Option<Employee>, StoreError> {
        Ok(self.lock().employees.get(&id).cloned())
    }

    async fn list_employees(&self, shop_id: Uuid) -> Result<Vec<Employee>, StoreError> {
        let mut employees: Vec<Employee> = self
            .lock()
            .employees
            .values()
            .filter(|e| e.coffee_shop_id == shop_id)
            .cloned()
            .collect();
        employees.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(employees)
    }

    async fn update_employee(
        &self,
        id: Uuid,
        changes: UpdateEmployee,
    ) -> Result<Option<Employee>, StoreError> {
        let mut inner = self.lock();
        let Some(employee) = inner.employees.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(first_name) = changes.first_name {
            employee.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            employee.last_name = last_name;
        }
        if let Some(position) = changes.position {
            employee.position = Some(position);
        }
        employee.updated_at = Utc::now();

        Ok(Some(employee.clone()))
    }

    async fn delete_employee(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();

        if inner.employees.remove(&id).is_none() {
            return Ok(false);
        }
        inner.detach_orders();

        Ok(true)
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let mut inner = self.lock();

        if !inner.shops.contains_key(&customer.coffee_shop_id) || !inner.user_exists(customer.user_id)
        {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let created = Customer {
            id: Uuid::new_v4(),
            user_id: customer.user_id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone_number: customer.phone_number,
            coffee_shop_id: customer.coffee_shop_id,
            created_at: now,
            updated_at: now,
        };
        inner.customers.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(self.lock().customers.get(&id).cloned())
    }

    async fn list_customers(&self, shop_id: Uuid) -> Result<Vec<Customer>, StoreError> {
        let mut customers: Vec<Customer> = self
            .lock()
            .customers
            .values()
            .filter(|c| c.coffee_shop_id == shop_id)
            .cloned()
            .collect();
        customers.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(customers)
    }

    async fn update_customer(
        &self,
        id: Uuid,
        changes: UpdateCustomer,
    ) -> Result<Option<Customer>, StoreError> {
        let mut inner = self.lock();
        let Some(customer) = inner.customers.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(first_name) = changes.first_name {
            customer.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            customer.last_name = last_name;
        }
        if let Some(email) = changes.email {
            customer.email = Some(email);
        }
        if let Some(phone_number) = changes.phone_number {
            customer.phone_number = Some(phone_number);
        }
        customer.updated_at = Utc::now();

        Ok(Some(customer.clone()))
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();

        if inner.customers.remove(&id).is_none() {
            return Ok(false);
        }
        inner.detach_orders();

        Ok(true)
    }

    async fn create_supplier(&self, supplier: NewSupplier) -> Result<Supplier, StoreError> {
        let mut inner = self.lock();

        if !inner.shops.contains_key(&supplier.coffee_shop_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let created = Supplier {
            id: Uuid::new_v4(),
            name: supplier.name,
            phone_number: supplier.phone_number,
            email: supplier.email,
            coffee_shop_id: supplier.coffee_shop_id,
            created_at: now,
            updated_at: now,
        };
        inner.suppliers.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_supplier(&self, id: Uuid) -> Result<Option<Supplier>, StoreError> {
        Ok(self.lock().suppliers.get(&id).cloned())
    }

    async fn list_suppliers(&self, shop_id: Uuid) -> Result<Vec<Supplier>, StoreError> {
        let mut suppliers: Vec<Supplier> = self
            .lock()
            .suppliers
            .values()
            .filter(|s| s.coffee_shop_id == shop_id)
            .cloned()
            .collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(suppliers)
    }

    async fn update_supplier(
        &self,
        id: Uuid,
        changes: UpdateSupplier,
    ) -> Result<Option<Supplier>, StoreError> {
        let mut inner = self.lock();
        let Some(supplier) = inner.suppliers.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            supplier.name = name;
        }
        if let Some(phone_number) = changes.phone_number {
            supplier.phone_number = Some(phone_number);
        }
        if let Some(email) = changes.email {
            supplier.email = Some(email);
        }
        supplier.updated_at = Utc::now();

        Ok(Some(supplier.clone()))
    }

    async fn delete_supplier(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().suppliers.remove(&id).is_some())
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut inner = self.lock();

        if !inner.shops.contains_key(&order.coffee_shop_id) {
            return Err(StoreError::NotFound);
        }
        if order.customer_id.is_some_and(|id| !inner.customers.contains_key(&id))
            || order.employee_id.is_some_and(|id| !inner.employees.contains_key(&id))
        {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let created = Order {
            id: Uuid::new_v4(),
            customer_id: order.customer_id,
            employee_id: order.employee_id,
            total: order.total,
            coffee_shop_id: order.coffee_shop_id,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.lock().orders.get(&id).cloned())
    }

    async fn list_orders(&self, shop_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .lock()
            .orders
            .values()
            .filter(|o| o.coffee_shop_id == shop_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn update_order(
        &self,
        id: Uuid,
        changes: UpdateOrder,
    ) -> Result<Option<Order>, StoreError> {
        let mut inner = self.lock();

        if let Some(Some(customer_id)) = changes.customer_id {
            if !inner.customers.contains_key(&customer_id) {
                return Err(StoreError::NotFound);
            }
        }
        if let Some(Some(employee_id)) = changes.employee_id {
            if !inner.employees.contains_key(&employee_id) {
                return Err(StoreError::NotFound);
            }
        }

        let Some(order) = inner.orders.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(customer_id) = changes.customer_id {
            order.customer_id = customer_id;
        }
        if let Some(employee_id) = changes.employee_id {
            order.employee_id = employee_id;
        }
        if let Some(total) = changes.total {
            order.total = total;
        }
        order.updated_at = Utc::now();

        Ok(Some(order.clone()))
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock().orders.remove(&id).is_some())
    }
}
