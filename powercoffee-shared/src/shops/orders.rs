//! Orders placed at a shop
//!
//! The customer and employee an order names must belong to the same shop.

use tracing::{info, instrument};
use uuid::Uuid;

use super::{ShopError, ShopService};
use crate::auth::middleware::AuthContext;
use crate::models::order::{NewOrder, Order, UpdateOrder};
use crate::store::StoreError;

#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub total: f64,
}

impl ShopService {
    /// Checks that each named party belongs to `shop_id`
    async fn order_parties_in_shop(
        &self,
        shop_id: Uuid,
        customer_id: Option<Uuid>,
        employee_id: Option<Uuid>,
    ) -> Result<(), ShopError> {
        if let Some(customer_id) = customer_id {
            self.customer_in_shop(shop_id, customer_id)
                .await
                .map_err(|_| ShopError::CustomerNotInShop)?;
        }
        if let Some(employee_id) = employee_id {
            self.employee_in_shop(shop_id, employee_id)
                .await
                .map_err(|_| ShopError::EmployeeNotInShop)?;
        }
        Ok(())
    }

    /// Turns a store `NotFound` on write into the party that went missing
    async fn vanished_party(
        &self,
        shop_id: Uuid,
        customer_id: Option<Uuid>,
        employee_id: Option<Uuid>,
        err: StoreError,
    ) -> ShopError {
        if !matches!(err, StoreError::NotFound) {
            return err.into();
        }
        match self
            .order_parties_in_shop(shop_id, customer_id, employee_id)
            .await
        {
            Err(missing) => missing,
            Ok(()) => err.into(),
        }
    }

    #[instrument(skip(self, auth, input), fields(user_id = %auth.user_id))]
    pub async fn create_order(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        input: NewOrderInput,
    ) -> Result<Order, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.order_parties_in_shop(shop_id, input.customer_id, input.employee_id)
            .await?;

        let result = self
            .store
            .create_order(NewOrder {
                customer_id: input.customer_id,
                employee_id: input.employee_id,
                total: input.total,
                coffee_shop_id: shop_id,
            })
            .await;

        let order = match result {
            Ok(order) => order,
            Err(err) => {
                return Err(self
                    .vanished_party(shop_id, input.customer_id, input.employee_id, err)
                    .await)
            }
        };

        info!(%shop_id, order_id = %order.id, total = order.total, "order_created");
        Ok(order)
    }

    pub async fn list_orders(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
    ) -> Result<Vec<Order>, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        Ok(self.store.list_orders(shop_id).await?)
    }

    async fn order_in_shop(&self, shop_id: Uuid, order_id: Uuid) -> Result<Order, ShopError> {
        match self.store.find_order(order_id).await? {
            Some(order) if order.coffee_shop_id == shop_id => Ok(order),
            _ => Err(ShopError::OrderNotFound),
        }
    }

    pub async fn get_order(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.order_in_shop(shop_id, order_id).await
    }

    pub async fn update_order(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        order_id: Uuid,
        changes: UpdateOrder,
    ) -> Result<Order, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.order_in_shop(shop_id, order_id).await?;

        let customer_id = changes.customer_id.flatten();
        let employee_id = changes.employee_id.flatten();
        self.order_parties_in_shop(shop_id, customer_id, employee_id)
            .await?;

        match self.store.update_order(order_id, changes).await {
            Ok(order) => order.ok_or(ShopError::OrderNotFound),
            Err(err) => Err(self
                .vanished_party(shop_id, customer_id, employee_id, err)
                .await),
        }
    }

    pub async fn delete_order(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        order_id: Uuid,
    ) -> Result<(), ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.order_in_shop(shop_id, order_id).await?;

        if !self.store.delete_order(order_id).await? {
            return Err(ShopError::OrderNotFound);
        }
        Ok(())
    }
}
