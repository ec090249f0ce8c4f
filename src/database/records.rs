use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::records::{
    ensure_in_scope, EntityKind, ListQuery, Record, RecordError, RecordStore, StoredCredentials,
};
use crate::tenancy::{TenantCounts, TenantFilter, TenantId};

use super::manager::{quote_identifier, DatabaseError};

/// SQL text plus its positional text parameters
#[derive(Debug, PartialEq)]
pub(crate) struct SqlResult {
    pub query: String,
    pub params: Vec<String>,
}

/// Builds statements that always carry the tenant predicate as `$1`.
///
/// Column names are checked against the entity definition before they are
/// quoted into SQL; values only ever travel as bind parameters.
pub(crate) struct ScopedSql {
    kind: EntityKind,
    table: String,
}

impl ScopedSql {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            table: quote_identifier(kind.table()),
        }
    }

    pub fn list(&self, filter: &TenantFilter, query: &ListQuery, max_limit: usize) -> Result<SqlResult, RecordError> {
        query.validate(filter, self.kind)?;

        let mut params = vec![filter.tenant_id().as_str().to_string()];
        let mut sql = format!(
            "SELECT to_jsonb(t) AS row FROM {} t WHERE t.tenant_id = $1",
            self.table
        );

        for (column, value) in &query.filters {
            if column == "tenant_id" {
                continue;
            }
            params.push(value.clone());
            sql.push_str(&format!(
                " AND t.{}::text = ${}",
                quote_identifier(column),
                params.len()
            ));
        }

        let (order_column, direction) = self.kind.order_by();
        sql.push_str(&format!(
            " ORDER BY t.{} {} LIMIT {}",
            quote_identifier(order_column),
            direction.as_sql(),
            query.limit.unwrap_or(max_limit).min(max_limit)
        ));

        Ok(SqlResult { query: sql, params })
    }

    pub fn get(&self) -> String {
        format!(
            "SELECT to_jsonb(t) AS row FROM {} t WHERE t.tenant_id = $1 AND t.id = $2",
            self.table
        )
    }

    /// `$1` record as jsonb, already stamped with the tenant
    pub fn insert(&self) -> String {
        format!(
            "INSERT INTO {table} AS t SELECT * FROM jsonb_populate_record(NULL::{table}, $1::jsonb) \
             RETURNING to_jsonb(t) AS row",
            table = self.table
        )
    }

    /// `$1` tenant, `$2` record id, `$3` patch as jsonb
    pub fn update(&self, patch: &Record) -> Result<String, RecordError> {
        let mut assignments = Vec::new();
        for column in patch.keys() {
            if column == "tenant_id" || column == "id" {
                continue;
            }
            if !self.kind.is_known_column(column) {
                return Err(RecordError::UnknownColumn {
                    entity: self.kind.path(),
                    column: column.clone(),
                });
            }
            let quoted = quote_identifier(column);
            assignments.push(format!("{} = p.{}", quoted, quoted));
        }

        if assignments.is_empty() {
            return Err(RecordError::InvalidPayload("no fields to update".to_string()));
        }

        Ok(format!(
            "UPDATE {table} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $3::jsonb) AS p \
             WHERE t.tenant_id = $1 AND t.id = $2 \
             RETURNING to_jsonb(t) AS row",
            table = self.table,
            assignments = assignments.join(", ")
        ))
    }

    pub fn delete(&self) -> String {
        format!("DELETE FROM {} WHERE tenant_id = $1 AND id = $2", self.table)
    }
}

/// Record store backed by one Postgres database shared by all tenants
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    max_limit: usize,
}

impl PgRecordStore {
    pub fn new(pool: PgPool, max_limit: usize) -> Self {
        Self { pool, max_limit }
    }
}

fn store_error(err: sqlx::Error) -> RecordError {
    tracing::error!("Record store query failed: {}", err);
    DatabaseError::Sqlx(err).into()
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<Record, RecordError> {
    match row.try_get::<Value, _>("row").map_err(store_error)? {
        Value::Object(map) => Ok(map),
        other => Err(RecordError::Store(format!("unexpected row format: {}", other))),
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        query: &ListQuery,
    ) -> Result<Vec<Record>, RecordError> {
        let sql = ScopedSql::new(kind).list(filter, query, self.max_limit)?;

        let mut q = sqlx::query(&sql.query);
        for param in &sql.params {
            q = q.bind(param);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(store_error)?;
        rows.iter().map(row_to_record).collect()
    }

    async fn get(&self, filter: &TenantFilter, kind: EntityKind, id: &str) -> Result<Record, RecordError> {
        let row = sqlx::query(&ScopedSql::new(kind).get())
            .bind(filter.tenant_id().as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| RecordError::NotFound(format!("{} {}", kind.path(), id)))?;
        row_to_record(&row)
    }

    async fn insert(&self, filter: &TenantFilter, kind: EntityKind, mut record: Record) -> Result<Record, RecordError> {
        ensure_in_scope(filter, &record)?;
        record.insert(
            "tenant_id".to_string(),
            Value::String(filter.tenant_id().as_str().to_string()),
        );

        let row = sqlx::query(&ScopedSql::new(kind).insert())
            .bind(Value::Object(record))
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        row_to_record(&row)
    }

    async fn update(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> Result<Record, RecordError> {
        ensure_in_scope(filter, &patch)?;

        let sql = ScopedSql::new(kind).update(&patch)?;
        let row = sqlx::query(&sql)
            .bind(filter.tenant_id().as_str())
            .bind(id)
            .bind(Value::Object(patch))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or_else(|| RecordError::NotFound(format!("{} {}", kind.path(), id)))?;
        row_to_record(&row)
    }

    async fn delete(&self, filter: &TenantFilter, kind: EntityKind, id: &str) -> Result<(), RecordError> {
        let result = sqlx::query(&ScopedSql::new(kind).delete())
            .bind(filter.tenant_id().as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(RecordError::NotFound(format!("{} {}", kind.path(), id)));
        }
        Ok(())
    }

    async fn counts_for_tenant(&self, tenant_id: &TenantId) -> Result<TenantCounts, RecordError> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM users WHERE tenant_id = $1) AS users,
                (SELECT COUNT(*) FROM students WHERE tenant_id = $1) AS students",
        )
        .bind(tenant_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(TenantCounts {
            users: row.try_get("users").map_err(store_error)?,
            students: row.try_get("students").map_err(store_error)?,
        })
    }

    async fn find_credentials(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> Result<Option<StoredCredentials>, RecordError> {
        let row = sqlx::query(
            "SELECT id, email, full_name, role, password_hash, is_active
             FROM users
             WHERE tenant_id = $1 AND lower(email) = lower($2)",
        )
        .bind(tenant_id.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(|row| -> Result<StoredCredentials, RecordError> {
            Ok(StoredCredentials {
                user_id: row.try_get("id").map_err(store_error)?,
                tenant_id: tenant_id.clone(),
                email: row.try_get("email").map_err(store_error)?,
                full_name: row.try_get("full_name").map_err(store_error)?,
                role: row.try_get("role").map_err(store_error)?,
                password_hash: row.try_get("password_hash").map_err(store_error)?,
                is_active: row.try_get("is_active").map_err(store_error)?,
            })
        })
        .transpose()
    }
}
