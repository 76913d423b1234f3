//! Employees, customers and suppliers of a shop
//!
//! Same access rule as the catalog: the shop's owner or a super_admin. A
//! record is only reachable through the shop that owns it.

use tracing::{info, instrument};
use uuid::Uuid;

use super::{ShopError, ShopService};
use crate::auth::middleware::AuthContext;
use crate::models::customer::{Customer, NewCustomer, UpdateCustomer};
use crate::models::employee::{Employee, NewEmployee, UpdateEmployee};
use crate::models::supplier::{NewSupplier, Supplier, UpdateSupplier};
use crate::store::StoreError;

#[derive(Debug, Clone)]
pub struct NewEmployeeInput {
    /// Existing user account to link, if any
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCustomerInput {
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSupplierInput {
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

fn linked_user_error(err: StoreError) -> ShopError {
    match err {
        StoreError::NotFound => ShopError::LinkedUserNotFound,
        other => other.into(),
    }
}

impl ShopService {
    #[instrument(skip(self, auth, input), fields(user_id = %auth.user_id))]
    pub async fn create_employee(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        input: NewEmployeeInput,
    ) -> Result<Employee, ShopError> {
        self.authorized_shop(auth, shop_id).await?;

        let employee = self
            .store
            .create_employee(NewEmployee {
                user_id: input.user_id,
                first_name: input.first_name,
                last_name: input.last_name,
                position: input.position,
                coffee_shop_id: shop_id,
            })
            .await
            .map_err(linked_user_error)?;

        info!(%shop_id, employee_id = %employee.id, "employee_created");
        Ok(employee)
    }

    pub async fn list_employees(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
    ) -> Result<Vec<Employee>, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        Ok(self.store.list_employees(shop_id).await?)
    }

    pub(super) async fn employee_in_shop(
        &self,
        shop_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Employee, ShopError> {
        match self.store.find_employee(employee_id).await? {
            Some(employee) if employee.coffee_shop_id == shop_id => Ok(employee),
            _ => Err(ShopError::EmployeeNotFound),
        }
    }

    pub async fn get_employee(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Employee, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.employee_in_shop(shop_id, employee_id).await
    }

    pub async fn update_employee(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        employee_id: Uuid,
        changes: UpdateEmployee,
    ) -> Result<Employee, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.employee_in_shop(shop_id, employee_id).await?;

        self.store
            .update_employee(employee_id, changes)
            .await?
            .ok_or(ShopError::EmployeeNotFound)
    }

    /// Orders the employee served stay, with no employee
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn delete_employee(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        employee_id: Uuid,
    ) -> Result<(), ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.employee_in_shop(shop_id, employee_id).await?;

        if !self.store.delete_employee(employee_id).await? {
            return Err(ShopError::EmployeeNotFound);
        }
        info!(%shop_id, %employee_id, "employee_deleted");
        Ok(())
    }

    pub async fn create_customer(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        input: NewCustomerInput,
    ) -> Result<Customer, ShopError> {
        self.authorized_shop(auth, shop_id).await?;

        Ok(self
            .store
            .create_customer(NewCustomer {
                user_id: input.user_id,
                first_name: input.first_name,
                last_name: input.last_name,
                email: input.email,
                phone_number: input.phone_number,
                coffee_shop_id: shop_id,
            })
            .await
            .map_err(linked_user_error)?)
    }

    pub async fn list_customers(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
    ) -> Result<Vec<Customer>, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        Ok(self.store.list_customers(shop_id).await?)
    }

    pub(super) async fn customer_in_shop(
        &self,
        shop_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Customer, ShopError> {
        match self.store.find_customer(customer_id).await? {
            Some(customer) if customer.coffee_shop_id == shop_id => Ok(customer),
            _ => Err(ShopError::CustomerNotFound),
        }
    }

    pub async fn get_customer(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Customer, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.customer_in_shop(shop_id, customer_id).await
    }

    pub async fn update_customer(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        customer_id: Uuid,
        changes: UpdateCustomer,
    ) -> Result<Customer, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.customer_in_shop(shop_id, customer_id).await?;

        self.store
            .update_customer(customer_id, changes)
            .await?
            .ok_or(ShopError::CustomerNotFound)
    }

    pub async fn delete_customer(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(), ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.customer_in_shop(shop_id, customer_id).await?;

        if !self.store.delete_customer(customer_id).await? {
            return Err(ShopError::CustomerNotFound);
        }
        Ok(())
    }

    pub async fn create_supplier(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        input: NewSupplierInput,
    ) -> Result<Supplier, ShopError> {
        self.authorized_shop(auth, shop_id).await?;

        Ok(self
            .store
            .create_supplier(NewSupplier {
                name: input.name,
                phone_number: input.phone_number,
                email: input.email,
                coffee_shop_id: shop_id,
            })
            .await?)
    }

    pub async fn list_suppliers(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
    ) -> Result<Vec<Supplier>, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        Ok(self.store.list_suppliers(shop_id).await?)
    }

    async fn supplier_in_shop(
        &self,
        shop_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Supplier, ShopError> {
        match self.store.find_supplier(supplier_id).await? {
            Some(supplier) if supplier.coffee_shop_id == shop_id => Ok(supplier),
            _ => Err(ShopError::SupplierNotFound),
        }
    }

    pub async fn get_supplier(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Supplier, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.supplier_in_shop(shop_id, supplier_id).await
    }

    pub async fn update_supplier(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        supplier_id: Uuid,
        changes: UpdateSupplier,
    ) -> Result<Supplier, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.supplier_in_shop(shop_id, supplier_id).await?;

        self.store
            .update_supplier(supplier_id, changes)
            .await?
            .ok_or(ShopError::SupplierNotFound)
    }

    pub async fn delete_supplier(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<(), ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.supplier_in_shop(shop_id, supplier_id).await?;

        if !self.store.delete_supplier(supplier_id).await? {
            return Err(ShopError::SupplierNotFound);
        }
        Ok(())
    }
}
