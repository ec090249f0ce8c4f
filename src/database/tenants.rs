use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::tenancy::{NewTenant, Tenant, TenancyError, TenantDirectory, TenantId, TenantSlug};

use super::manager::DatabaseError;

#[derive(Debug, FromRow)]
struct TenantRow {
    id: String,
    name: String,
    slug: String,
    logo: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: TenantId::new(row.id),
            name: row.name,
            slug: TenantSlug::from_label(row.slug),
            logo: row.logo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TENANT_COLUMNS: &str = "id, name, slug, logo, created_at, updated_at";

/// Tenant directory backed by the `tenants` table
#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Tenant>, TenancyError> {
        let query = format!("SELECT {} FROM tenants WHERE {} = $1", TENANT_COLUMNS, column);
        let row = sqlx::query_as::<_, TenantRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Tenant::from))
    }
}

fn store_error(err: sqlx::Error) -> TenancyError {
    tracing::error!("Tenant directory query failed: {}", err);
    DatabaseError::Sqlx(err).into()
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    async fn lookup_by_slug(&self, slug: &str) -> Result<Tenant, TenancyError> {
        self.fetch_one_by("slug", slug)
            .await?
            .ok_or_else(|| TenancyError::NotFound(slug.to_string()))
    }

    async fn lookup_by_id(&self, id: &TenantId) -> Result<Tenant, TenancyError> {
        self.fetch_one_by("id", id.as_str())
            .await?
            .ok_or_else(|| TenancyError::NotFound(id.to_string()))
    }

    async fn create(&self, input: NewTenant) -> Result<Tenant, TenancyError> {
        let slug = input.validate()?;

        // The unique index on slug decides races; a skipped insert means the slug was taken
        let query = format!(
            "INSERT INTO tenants (id, name, slug, logo)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (slug) DO NOTHING
             RETURNING {}",
            TENANT_COLUMNS
        );
        let id = TenantId::generate();
        let row = sqlx::query_as::<_, TenantRow>(&query)
            .bind(id.as_str())
            .bind(input.name.trim())
            .bind(slug.as_str())
            .bind(input.logo.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => {
                let tenant = Tenant::from(row);
                tracing::info!("Created tenant '{}' ({})", tenant.slug, tenant.id);
                Ok(tenant)
            }
            None => Err(TenancyError::SlugConflict(slug.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<Tenant>, TenancyError> {
        let query = format!("SELECT {} FROM tenants ORDER BY created_at DESC", TENANT_COLUMNS);
        let rows = sqlx::query_as::<_, TenantRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }
}
