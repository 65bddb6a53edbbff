use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::DbResult;

/// Connection options shared by every tenant; the database is chosen per query
pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
}

/// Opens the MySQL pool. One connection is established up front so an
/// unreachable server is reported here rather than during extraction.
pub async fn initialize_pool(config: &DatabaseConfig) -> DbResult<MySqlPool> {
    info!("📊 Connecting to database at {}:{}...", config.host, config.port);

    let pool = MySqlPoolOptions::new()
        .max_connections(config.pool_size)
        .min_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(connect_options(config))
        .await?;

    info!(
        "✓ Database pool configured: {} max connections",
        config.pool_size
    );
    Ok(pool)
}
