use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::tenancy::{TenantCounts, TenantFilter, TenantId};

use super::{
    ensure_in_scope, EntityKind, ListQuery, Record, RecordError, RecordStore, SortDirection,
    StoredCredentials,
};

/// Process-local record store with the same scoping and limit rules as the SQL store
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<EntityKind, Vec<Record>>>,
    max_limit: usize,
}

impl MemoryRecordStore {
    pub fn new(max_limit: usize) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            max_limit,
        }
    }
}

fn owned_by(record: &Record, filter: &TenantFilter) -> bool {
    matches!(record.get("tenant_id"), Some(Value::String(id)) if filter.admits(id))
}

fn has_id(record: &Record, id: &str) -> bool {
    matches!(record.get("id"), Some(Value::String(v)) if v == id)
}

/// Compares a stored value with a query-string value the way `col::text = $n` would
fn value_matches(stored: Option<&Value>, wanted: &str) -> bool {
    match stored {
        Some(Value::String(s)) => s == wanted,
        Some(Value::Number(n)) => n.to_string() == wanted,
        Some(Value::Bool(b)) => b.to_string() == wanted,
        _ => false,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        // Nulls sort last, as in Postgres ascending order
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        query: &ListQuery,
    ) -> Result<Vec<Record>, RecordError> {
        query.validate(filter, kind)?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Record> = tables
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .filter(|r| owned_by(r, filter))
                    .filter(|r| {
                        query
                            .filters
                            .iter()
                            .filter(|(column, _)| column != "tenant_id")
                            .all(|(column, value)| value_matches(r.get(column), value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let (column, direction) = kind.order_by();
        rows.sort_by(|a, b| {
            let ord = compare_values(a.get(column), b.get(column));
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        rows.truncate(query.limit.unwrap_or(self.max_limit).min(self.max_limit));
        Ok(rows)
    }

    async fn get(&self, filter: &TenantFilter, kind: EntityKind, id: &str) -> Result<Record, RecordError> {
        self.tables
            .read()
            .await
            .get(&kind)
            .and_then(|rows| rows.iter().find(|r| has_id(r, id) && owned_by(r, filter)))
            .cloned()
            .ok_or_else(|| RecordError::NotFound(format!("{} {}", kind.path(), id)))
    }

    async fn insert(&self, filter: &TenantFilter, kind: EntityKind, mut record: Record) -> Result<Record, RecordError> {
        ensure_in_scope(filter, &record)?;
        record.insert(
            "tenant_id".to_string(),
            Value::String(filter.tenant_id().as_str().to_string()),
        );

        let id = match record.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Err(RecordError::InvalidPayload("record id is required".to_string())),
        };

        let mut tables = self.tables.write().await;
        let rows = tables.entry(kind).or_default();
        if rows.iter().any(|r| has_id(r, &id)) {
            return Err(RecordError::InvalidPayload(format!("duplicate id {}", id)));
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> Result<Record, RecordError> {
        ensure_in_scope(filter, &patch)?;

        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|r| has_id(r, id) && owned_by(r, filter)))
            .ok_or_else(|| RecordError::NotFound(format!("{} {}", kind.path(), id)))?;

        for (column, value) in patch {
            // Ownership and identity are fixed at creation
            if column == "tenant_id" || column == "id" {
                continue;
            }
            record.insert(column, value);
        }
        Ok(record.clone())
    }

    async fn delete(&self, filter: &TenantFilter, kind: EntityKind, id: &str) -> Result<(), RecordError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(kind).or_default();
        let before = rows.len();
        rows.retain(|r| !(has_id(r, id) && owned_by(r, filter)));

        if rows.len() == before {
            return Err(RecordError::NotFound(format!("{} {}", kind.path(), id)));
        }

        // Student deletion cascades to the records that reference it
        if kind == EntityKind::Students {
            for dependent in EntityKind::ALL.iter().filter(|k| k.references_student()) {
                if let Some(rows) = tables.get_mut(dependent) {
                    rows.retain(|r| !(owned_by(r, filter) && value_matches(r.get("student_id"), id)));
                }
            }
        }
        Ok(())
    }

    async fn counts_for_tenant(&self, tenant_id: &TenantId) -> Result<TenantCounts, RecordError> {
        let tables = self.tables.read().await;
        let count = |kind: EntityKind| -> i64 {
            tables
                .get(&kind)
                .map(|rows| {
                    rows.iter()
                        .filter(|r| value_matches(r.get("tenant_id"), tenant_id.as_str()))
                        .count() as i64
                })
                .unwrap_or(0)
        };

        Ok(TenantCounts {
            users: count(EntityKind::Users),
            students: count(EntityKind::Students),
        })
    }

    async fn find_credentials(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> Result<Option<StoredCredentials>, RecordError> {
        let tables = self.tables.read().await;
        let user = tables.get(&EntityKind::Users).and_then(|rows| {
            rows.iter().find(|r| {
                value_matches(r.get("tenant_id"), tenant_id.as_str())
                    && matches!(r.get("email"), Some(Value::String(e)) if e.eq_ignore_ascii_case(email))
            })
        });

        Ok(user.map(|r| {
            let text = |column: &str| r.get(column).and_then(Value::as_str).map(str::to_string);
            StoredCredentials {
                user_id: text("id").unwrap_or_default(),
                tenant_id: tenant_id.clone(),
                email: text("email").unwrap_or_default(),
                full_name: text("full_name"),
                role: text("role").unwrap_or_else(|| "user".to_string()),
                password_hash: text("password_hash").unwrap_or_default(),
                is_active: r.get("is_active").and_then(Value::as_bool).unwrap_or(true),
            }
        }))
    }
}
