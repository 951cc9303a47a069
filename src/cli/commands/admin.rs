use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{open_store, output_success};
use crate::cli::OutputFormat;
use crate::services::UserService;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an admin, or promote and reset an existing account")]
    Create {
        #[arg(long, help = "Admin email")]
        email: String,
        #[arg(long, help = "Display name", default_value = "Administrator")]
        name: String,
        #[arg(long, help = "Password")]
        password: String,
    },
}

pub async fn handle(cmd: AdminCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create { email, name, password } => {
            let (config, store) = open_store().await?;
            let user = UserService::new(store, config.security.password_cost)
                .ensure_admin(&email, &password, &name)
                .await?;
            output_success(
                output_format,
                &format!("Admin {} is ready", user.email),
                Some(json!({ "id": user.id, "email": user.email })),
            )
        }
    }
}
