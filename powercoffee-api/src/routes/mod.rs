/// API route handlers
///
/// - `health`: liveness and store ping
/// - `users`: identity workflow endpoints under `/api/users`
/// - `coffee_shops`: shop, category and product endpoints under `/api/coffee-shops`
/// - `people`: employees, customers and suppliers nested under a shop
/// - `orders`: orders nested under a shop

pub mod coffee_shops;
pub mod health;
pub mod orders;
pub mod people;
pub mod users;

use powercoffee_shared::pagination::PageRequest;
use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Paging query string shared by list endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        PageRequest::new(
            params.page_number,
            params.page_size,
            params.sort_by,
            params.sort_dir,
        )
    }
}
