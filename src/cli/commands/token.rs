use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::types::Role;

pub fn handle(user: Uuid, email: String, role: String, hours: Option<u64>, output_format: OutputFormat) -> anyhow::Result<()> {
    let role = match role.to_ascii_lowercase().as_str() {
        "customer" => Role::Customer,
        "admin" => Role::Admin,
        other => anyhow::bail!("Unknown role '{}'; expected customer or admin", other),
    };

    let config = config();
    config.validate()?;
    let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
    let claims = Claims::new(user, email, role, hours);
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    output_success(
        output_format,
        &format!("Token valid for {} hours", hours),
        Some(json!({ "token": token, "expires_at": claims.exp })),
    )
}
