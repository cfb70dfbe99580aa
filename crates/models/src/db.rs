use std::time::Duration;

use configs::DatabaseConfig;
use mongodb::{bson::doc, options::ClientOptions, Client, Database};
use tracing::info;

/// Connect to MongoDB with pool settings from config and verify with a ping.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Database> {
    let mut opts = ClientOptions::parse(&cfg.url).await?;
    opts.app_name = Some(cfg.app_name.clone());
    opts.max_pool_size = Some(cfg.max_pool_size);
    opts.min_pool_size = Some(cfg.min_pool_size);
    opts.connect_timeout = Some(Duration::from_secs(cfg.connect_timeout_secs));
    opts.server_selection_timeout = Some(Duration::from_secs(cfg.server_selection_timeout_secs));

    let client = Client::with_options(opts)?;
    let db = client.database(&cfg.name);
    db.run_command(doc! { "ping": 1 }).await?;
    info!(database = %cfg.name, event = "db_connected", "connected to document store");
    Ok(db)
}
