/// Database layer for Noteleaf
///
/// This module provides connection pooling, migrations, and the generic
/// record controller that the entity models build on.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Database migration runner
/// - `controller`: Type-parameterized CRUD operations shared by all entities
///
/// # Example
///
/// ```no_run
/// use noteleaf_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod controller;
pub mod migrations;
pub mod pool;
