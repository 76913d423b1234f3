use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::ShopError;
use crate::auth::authorization::{require_any_role, require_shop_access};
use crate::auth::middleware::AuthContext;
use crate::models::category::{Category, NewCategory};
use crate::models::coffee_shop::{CoffeeShop, NewCoffeeShop, UpdateCoffeeShop};
use crate::models::product::{NewProduct, Product, UpdateProduct};
use crate::models::role::RoleName;
use crate::pagination::{PageRequest, PaginationResponse};
use crate::store::{CoffeeShopStore, StoreError};

const SHOP_MANAGERS: &[RoleName] = &[RoleName::Admin, RoleName::SuperAdmin];

#[derive(Debug, Clone)]
pub struct NewShopInput {
    pub name: String,
    pub address: String,
    pub city: String,

    /// Owner; defaults to the caller. Only a super_admin may name someone else.
    pub admin_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewProductInput {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_price: f64,
    pub sale_price: f64,
    pub stock: i32,
    pub category_id: Option<Uuid>,
}

pub struct ShopService {
    pub(super) store: Arc<dyn CoffeeShopStore>,
}

impl ShopService {
    pub fn new(store: Arc<dyn CoffeeShopStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, auth, input), fields(user_id = %auth.user_id))]
    pub async fn create_shop(
        &self,
        auth: &AuthContext,
        input: NewShopInput,
    ) -> Result<CoffeeShop, ShopError> {
        require_any_role(auth, SHOP_MANAGERS)?;

        let admin_id = input.admin_id.unwrap_or(auth.user_id);
        require_shop_access(auth, admin_id)?;

        let shop = self
            .store
            .create_shop(NewCoffeeShop {
                name: input.name,
                address: input.address,
                city: input.city,
                admin_id,
            })
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::OwnerNotFound,
                other => other.into(),
            })?;

        info!(shop_id = %shop.id, %admin_id, "coffee_shop_created");
        Ok(shop)
    }

    /// Loads a shop the caller may manage
    pub(super) async fn authorized_shop(&self, auth: &AuthContext, id: Uuid) -> Result<CoffeeShop, ShopError> {
        require_any_role(auth, SHOP_MANAGERS)?;

        let shop = self
            .store
            .find_shop(id)
            .await?
            .ok_or(ShopError::ShopNotFound)?;
        require_shop_access(auth, shop.admin_id)?;

        Ok(shop)
    }

    pub async fn get_shop(&self, auth: &AuthContext, id: Uuid) -> Result<CoffeeShop, ShopError> {
        self.authorized_shop(auth, id).await
    }

    /// Super admins see every shop; admins see their own
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn list_shops(
        &self,
        auth: &AuthContext,
        page: PageRequest,
    ) -> Result<PaginationResponse<CoffeeShop>, ShopError> {
        require_any_role(auth, SHOP_MANAGERS)?;

        let filter = if auth.has_role(RoleName::SuperAdmin) {
            None
        } else {
            Some(auth.user_id)
        };
        let (shops, total) = self.store.list_shops(filter, &page).await?;

        Ok(PaginationResponse::new(shops, &page, total))
    }

    #[instrument(skip(self, auth, changes), fields(user_id = %auth.user_id))]
    pub async fn update_shop(
        &self,
        auth: &AuthContext,
        id: Uuid,
        changes: UpdateCoffeeShop,
    ) -> Result<CoffeeShop, ShopError> {
        self.authorized_shop(auth, id).await?;

        self.store
            .update_shop(id, changes)
            .await?
            .ok_or(ShopError::ShopNotFound)
    }

    /// Deletes a shop along with everything it owns
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn delete_shop(&self, auth: &AuthContext, id: Uuid) -> Result<(), ShopError> {
        self.authorized_shop(auth, id).await?;

        if !self.store.delete_shop(id).await? {
            return Err(ShopError::ShopNotFound);
        }
        info!(shop_id = %id, "coffee_shop_deleted");
        Ok(())
    }

    pub async fn create_category(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        name: String,
        description: Option<String>,
    ) -> Result<Category, ShopError> {
        self.authorized_shop(auth, shop_id).await?;

        Ok(self
            .store
            .create_category(NewCategory {
                name,
                description,
                coffee_shop_id: shop_id,
            })
            .await?)
    }

    pub async fn list_categories(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
    ) -> Result<Vec<Category>, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        Ok(self.store.list_categories(shop_id).await?)
    }

    /// Products in the category stay, uncategorized
    pub async fn delete_category(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.category_in_shop(shop_id, category_id)
            .await
            .map_err(|_| ShopError::CategoryNotFound)?;

        if !self.store.delete_category(category_id).await? {
            return Err(ShopError::CategoryNotFound);
        }
        Ok(())
    }

    async fn category_in_shop(&self, shop_id: Uuid, category_id: Uuid) -> Result<(), ShopError> {
        match self.store.find_category(category_id).await? {
            Some(category) if category.coffee_shop_id == shop_id => Ok(()),
            _ => Err(ShopError::CategoryNotInShop),
        }
    }

    #[instrument(skip(self, auth, input), fields(user_id = %auth.user_id))]
    pub async fn create_product(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        input: NewProductInput,
    ) -> Result<Product, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        if let Some(category_id) = input.category_id {
            self.category_in_shop(shop_id, category_id).await?;
        }

        let product = self
            .store
            .create_product(NewProduct {
                name: input.name,
                description: input.description,
                image_url: input.image_url,
                purchase_price: input.purchase_price,
                sale_price: input.sale_price,
                stock: input.stock,
                category_id: input.category_id,
                coffee_shop_id: shop_id,
            })
            .await
            .map_err(|e| match e {
                // Category deleted between the check and the insert
                StoreError::NotFound => ShopError::CategoryNotInShop,
                other => other.into(),
            })?;

        Ok(product)
    }

    pub async fn list_products(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
    ) -> Result<Vec<Product>, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        Ok(self.store.list_products(shop_id).await?)
    }

    async fn product_in_shop(&self, shop_id: Uuid, product_id: Uuid) -> Result<Product, ShopError> {
        match self.store.find_product(product_id).await? {
            Some(product) if product.coffee_shop_id == shop_id => Ok(product),
            _ => Err(ShopError::ProductNotFound),
        }
    }

    pub async fn get_product(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        product_id: Uuid,
    ) -> Result<Product, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.product_in_shop(shop_id, product_id).await
    }

    pub async fn update_product(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        product_id: Uuid,
        changes: UpdateProduct,
    ) -> Result<Product, ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.product_in_shop(shop_id, product_id).await?;
        if let Some(Some(category_id)) = changes.category_id {
            self.category_in_shop(shop_id, category_id).await?;
        }

        self.store
            .update_product(product_id, changes)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ShopError::CategoryNotInShop,
                other => other.into(),
            })?
            .ok_or(ShopError::ProductNotFound)
    }

    pub async fn delete_product(
        &self,
        auth: &AuthContext,
        shop_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), ShopError> {
        self.authorized_shop(auth, shop_id).await?;
        self.product_in_shop(shop_id, product_id).await?;

        if !self.store.delete_product(product_id).await? {
            return Err(ShopError::ProductNotFound);
        }
        Ok(())
    }
}
