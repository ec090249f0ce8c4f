use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{connect, operator, OutputFormat};
use crate::config::AppConfig;
use crate::tenancy::NewTenant;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all tenants with user and student counts")]
    List,

    #[command(about = "Show one tenant by slug")]
    Show {
        #[arg(help = "Tenant slug")]
        slug: String,
    },

    #[command(about = "Create new tenant")]
    Create {
        #[arg(help = "Display name")]
        name: String,
        #[arg(long, help = "URL slug, used as the subdomain")]
        slug: String,
        #[arg(long, help = "Logo (emoji or image URL)")]
        logo: Option<String>,
    },
}

pub async fn handle(cmd: TenantCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = connect(config).await?;

    match cmd {
        TenantCommands::List => {
            let summaries = state.tenants.list_summaries().await?;
            if summaries.is_empty() {
                return output_empty_collection(output_format, "tenants", "No tenants found");
            }

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "tenants": summaries }))?),
                OutputFormat::Text => {
                    println!("{:<20} {:<36} {:<32} {:>6} {:>9}", "SLUG", "ID", "NAME", "USERS", "STUDENTS");
                    println!("{}", "-".repeat(107));
                    for summary in &summaries {
                        println!(
                            "{:<20} {:<36} {:<32} {:>6} {:>9}",
                            summary.slug.as_str(),
                            summary.id.as_str(),
                            summary.name,
                            summary.counts.users,
                            summary.counts.students
                        );
                    }
                }
            }
            Ok(())
        }
        TenantCommands::Show { slug } => {
            let summary = state.tenants.lookup_summary(&slug).await?;
            output_item(output_format, &json!(summary))
        }
        TenantCommands::Create { name, slug, logo } => {
            let tenant = state
                .tenants
                .create_tenant(&operator(), NewTenant { name, slug, logo })
                .await?;
            output_success(
                output_format,
                &format!("Tenant '{}' created with id {}", tenant.slug, tenant.id),
                Some(json!(tenant)),
            )
        }
    }
}
