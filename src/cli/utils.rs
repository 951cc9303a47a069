use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::{config, AppConfig};
use crate::database::{self, DocumentStore};

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    match value {
                        Value::String(s) => println!("  {}: {}", key, s),
                        other => println!("  {}: {}", key, other),
                    }
                }
            }
        }
    }
    Ok(())
}

/// Validated config plus a store connection, as the server would open it.
pub async fn open_store() -> anyhow::Result<(&'static AppConfig, std::sync::Arc<dyn DocumentStore>)> {
    let config = config();
    config.validate()?;
    let store = database::connect(&config.database).await?;
    Ok((config, store))
}
