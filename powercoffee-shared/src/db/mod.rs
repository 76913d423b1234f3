//! Database layer for PowerCoffee
//!
//! - `pool`: PostgreSQL connection pool with health checks
//! - `migrations`: embedded schema migrations from `migrations/`
//!
//! Row types and their queries live in [`crate::models`].
//!
//! ```no_run
//! use powercoffee_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig {
//!         url: std::env::var("DATABASE_URL")?,
//!         ..Default::default()
//!     };
//!
//!     let pool = create_pool(config).await?;
//!     powercoffee_shared::db::migrations::run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod migrations;
pub mod pool;
