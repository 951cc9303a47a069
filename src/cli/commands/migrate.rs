use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::PgStore;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    if config.database.url.is_none() {
        anyhow::bail!("DATABASE_URL is not set; the in-memory store needs no migration");
    }

    let store = PgStore::connect(&config.database).await?;
    store.migrate().await?;
    store.close().await;

    output_success(output_format, "Schema is up to date", Some(json!({ "backend": "postgres" })))
}
