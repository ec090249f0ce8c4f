pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::tenancy::CallerIdentity;

#[derive(Parser)]
#[command(name = "dugsi")]
#[command(about = "Dugsi CLI - tenant administration and local tooling for the Dugsi API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Tenant directory management")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Password hashing and token issuing")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Load the demo tenants, admins and students")]
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

/// Identity the CLI acts under; it never carries a tenant claim
pub fn operator() -> CallerIdentity {
    CallerIdentity {
        id: "dugsi-cli".to_string(),
        claimed_tenant_id: None,
        role: "superadmin".to_string(),
    }
}

/// Database-backed state for commands that touch tenants or records
pub async fn connect(config: &AppConfig) -> anyhow::Result<AppState> {
    if config.database.url.is_empty() {
        anyhow::bail!("DATABASE_URL must be set for this command");
    }
    AppState::connect(config.clone()).await
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, config, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, config, output_format).await,
        Commands::Seed => commands::seed::handle(config, output_format).await,
    }
}
