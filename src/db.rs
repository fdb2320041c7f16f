pub mod customer_repo;
pub use customer_repo::{CustomerDirectory, CustomerRepository, PgCustomerRepository};
pub mod quote_repo;
pub use quote_repo::{PgQuoteRepository, QuoteRepository};
pub mod job_repo;
pub use job_repo::{JobRepository, PgJobRepository};
pub mod memory_store;
pub use memory_store::MemoryStore;

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

// Conecta ao Postgres e aplica as migrações da pasta `migrations/`.
pub async fn connect_pg(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

    sqlx::migrate!().run(&pool).await?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    Ok(pool)
}
