use std::path::PathBuf;

use serde::Deserialize;
use serde_json::json;

use crate::cli::utils::{open_store, output_success};
use crate::cli::OutputFormat;
use crate::services::catalog::{BoxInput, CatalogError};
use crate::services::Services;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    boxes: Vec<BoxInput>,
}

/// Create every box in the file. Boxes whose slug already exists are skipped.
pub async fn handle(file: PathBuf, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let catalog: CatalogFile = serde_yaml::from_str(&raw)?;

    let (config, store) = open_store().await?;
    if config.database.url.is_none() {
        tracing::warn!("Seeding the in-memory store; boxes disappear when this command exits");
    }
    let services = Services::new(store, config);

    let (mut created, mut skipped) = (0u32, 0u32);
    for input in catalog.boxes {
        let name = input.name.clone();
        match services.catalog.create(input).await {
            Ok(b) => {
                tracing::debug!("Seeded {} ({})", b.name, b.slug);
                created += 1;
            }
            Err(CatalogError::SlugTaken(slug)) => {
                tracing::info!("Skipping {}: slug {} exists", name, slug);
                skipped += 1;
            }
            Err(e) => return Err(anyhow::anyhow!("Failed to seed {}: {}", name, e)),
        }
    }

    output_success(
        output_format,
        &format!("Seeded {} boxes from {}", created, file.display()),
        Some(json!({ "created": created, "skipped": skipped })),
    )
}
