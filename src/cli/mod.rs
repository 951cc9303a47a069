pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "tokri")]
#[command(about = "Surprise Tokri operations CLI - schema, catalog seeding, admin accounts and tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the document table in the configured Postgres database")]
    Migrate,

    #[command(about = "Load catalog boxes from a YAML file")]
    Seed {
        #[arg(long, help = "Catalog file", default_value = "demos/catalog.yaml")]
        file: std::path::PathBuf,
    },

    #[command(about = "Admin account management")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Mint a bearer token signed with the configured secret")]
    Token {
        #[arg(long, help = "User id (UUID)")]
        user: uuid::Uuid,
        #[arg(long, help = "Email carried in the token")]
        email: String,
        #[arg(long, help = "customer or admin", default_value = "customer")]
        role: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::Seed { file } => commands::seed::handle(file, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, output_format).await,
        Commands::Token { user, email, role, hours } => {
            commands::token::handle(user, email, role, hours, output_format)
        }
    }
}
