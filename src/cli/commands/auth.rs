use clap::Subcommand;
use serde_json::json;

use crate::auth;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::tenancy::{CallerIdentity, TenantId};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Hash a password with the configured bcrypt cost")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },

    #[command(about = "Issue a session token for a user")]
    Token {
        #[arg(help = "User id (token subject)")]
        user_id: String,
        #[arg(long, help = "Tenant id the session is bound to")]
        tenant_id: Option<String>,
        #[arg(long, default_value = "admin", help = "Role claim")]
        role: String,
    },
}

pub async fn handle(cmd: AuthCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::HashPassword { password } => {
            let hash = auth::hash_password(&password, config.security.bcrypt_cost)?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "hash": hash }))?),
                OutputFormat::Text => println!("{}", hash),
            }
            Ok(())
        }
        AuthCommands::Token { user_id, tenant_id, role } => {
            if tenant_id.is_none() {
                tracing::warn!("Issuing a token without a tenant claim; it relies on the bootstrap fallback");
            }

            let caller = CallerIdentity {
                id: user_id,
                claimed_tenant_id: tenant_id.map(TenantId::new),
                role,
            };
            let token = auth::issue_token(&config.security, &caller)?;

            output_item(
                output_format,
                &json!({
                    "token": token,
                    "expires_in": config.security.jwt_expiry_hours * 3600,
                }),
            )
        }
    }
}
