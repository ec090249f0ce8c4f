use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use crate::auth;
use crate::tenancy::{CallerIdentity, TenantCounts, TenantFilter, TenantId};

use super::{
    EntityKind, ListQuery, Record, RecordError, RecordStore, StoredCredentials, SYSTEM_FIELDS,
};

/// Role reserved for operator tokens; never assignable through the record API
pub const RESERVED_ROLE: &str = "superadmin";

/// Payload validation and shaping in front of a [`RecordStore`].
///
/// Stamps system fields, hashes user passwords, checks that referenced
/// students belong to the same tenant and strips hidden columns from output.
/// User accounts are only writable by admins.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    bcrypt_cost: u32,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn list(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        query: &ListQuery,
    ) -> Result<Vec<Record>, RecordError> {
        let rows = self.store.list(filter, kind, query).await?;
        Ok(rows.into_iter().map(|r| present(kind, r)).collect())
    }

    pub async fn get(&self, filter: &TenantFilter, kind: EntityKind, id: &str) -> Result<Record, RecordError> {
        self.store.get(filter, kind, id).await.map(|r| present(kind, r))
    }

    pub async fn create(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        caller: &CallerIdentity,
        payload: Value,
    ) -> Result<Record, RecordError> {
        authorize_write(caller, kind, "create")?;
        let mut record = self.prepare_fields(filter, kind, payload)?;

        for (column, value) in kind.defaults() {
            record.entry(column.to_string()).or_insert(value);
        }
        if let Some(actor) = kind.actor_column() {
            record
                .entry(actor.to_string())
                .or_insert_with(|| Value::String(caller.id.clone()));
        }
        if kind == EntityKind::Progress {
            record
                .entry("assessment_date".to_string())
                .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        }

        for required in kind.required_columns() {
            if matches!(record.get(*required), None | Some(Value::Null)) {
                let field = if *required == "password_hash" { "password" } else { *required };
                return Err(RecordError::MissingRequiredField(field.to_string()));
            }
        }

        self.check_references(filter, kind, &record).await?;

        let now = Value::String(Utc::now().to_rfc3339());
        record.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        record.insert(
            "tenant_id".to_string(),
            Value::String(filter.tenant_id().as_str().to_string()),
        );
        record.insert("created_at".to_string(), now.clone());
        record.insert("updated_at".to_string(), now);

        let created = self.store.insert(filter, kind, record).await?;
        let created_id = created.get("id").and_then(|id| id.as_str()).unwrap_or_default();
        tracing::info!("Created {} {} in tenant {}", kind.path(), created_id, filter.tenant_id());
        Ok(present(kind, created))
    }

    pub async fn update(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        caller: &CallerIdentity,
        id: &str,
        payload: Value,
    ) -> Result<Record, RecordError> {
        authorize_write(caller, kind, "update")?;
        let mut patch = self.prepare_fields(filter, kind, payload)?;
        if patch.is_empty() {
            return Err(RecordError::InvalidPayload("no fields to update".to_string()));
        }

        self.check_references(filter, kind, &patch).await?;
        patch.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));

        self.store
            .update(filter, kind, id, patch)
            .await
            .map(|r| present(kind, r))
    }

    pub async fn delete(
        &self,
        filter: &TenantFilter,
        kind: EntityKind,
        caller: &CallerIdentity,
        id: &str,
    ) -> Result<(), RecordError> {
        authorize_write(caller, kind, "delete")?;
        self.store.delete(filter, kind, id).await?;
        tracing::info!("Deleted {} {} in tenant {}", kind.path(), id, filter.tenant_id());
        Ok(())
    }

    pub async fn counts_for_tenant(&self, tenant_id: &TenantId) -> Result<TenantCounts, RecordError> {
        self.store.counts_for_tenant(tenant_id).await
    }

    pub async fn find_credentials(
        &self,
        tenant_id: &TenantId,
        email: &str,
    ) -> Result<Option<StoredCredentials>, RecordError> {
        self.store.find_credentials(tenant_id, email).await
    }

    /// Validates client-supplied columns shared by create and update.
    ///
    /// A `tenant_id` naming the scoped tenant is dropped; any other value is a
    /// bypass attempt and is rejected.
    fn prepare_fields(&self, filter: &TenantFilter, kind: EntityKind, payload: Value) -> Result<Record, RecordError> {
        let Value::Object(mut fields) = payload else {
            return Err(RecordError::InvalidPayload("expected a JSON object".to_string()));
        };

        // Accept the camelCase spelling older clients send
        let tenant = fields.remove("tenant_id").or_else(|| fields.remove("tenantId"));
        match tenant {
            None | Some(Value::Null) => {}
            Some(Value::String(id)) if filter.admits(&id) => {}
            Some(other) => {
                let requested = other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string());
                tracing::warn!(
                    "Rejected {} write naming tenant '{}' from scope {}",
                    kind.path(),
                    requested,
                    filter.tenant_id()
                );
                return Err(RecordError::TenantBypass { requested });
            }
        }

        if kind == EntityKind::Users {
            match fields.get("role") {
                None => {}
                Some(Value::String(role)) if role == RESERVED_ROLE => {
                    return Err(RecordError::Forbidden(format!(
                        "role '{}' cannot be assigned through the API",
                        RESERVED_ROLE
                    )));
                }
                Some(Value::String(role)) if !role.trim().is_empty() => {}
                Some(_) => {
                    return Err(RecordError::InvalidPayload("role must be a non-empty string".to_string()));
                }
            }

            if let Some(password) = fields.remove("password") {
                let password = password
                    .as_str()
                    .filter(|p| p.len() >= 6)
                    .ok_or_else(|| {
                        RecordError::InvalidPayload("password must be at least 6 characters".to_string())
                    })?;
                let hash = auth::hash_password(password, self.bcrypt_cost)
                    .map_err(|e| RecordError::Store(e.to_string()))?;
                fields.insert("password_hash".to_string(), Value::String(hash));
            } else if fields.contains_key("password_hash") {
                return Err(RecordError::UnknownColumn {
                    entity: kind.path(),
                    column: "password_hash".to_string(),
                });
            }
        }

        for column in fields.keys() {
            if SYSTEM_FIELDS.contains(&column.as_str()) {
                return Err(RecordError::SystemFieldNotAllowed(column.clone()));
            }
            if !kind.columns().contains(&column.as_str()) {
                return Err(RecordError::UnknownColumn {
                    entity: kind.path(),
                    column: column.clone(),
                });
            }
        }

        Ok(fields)
    }

    async fn check_references(&self, filter: &TenantFilter, kind: EntityKind, record: &Record) -> Result<(), RecordError> {
        if !kind.references_student() {
            return Ok(());
        }

        let Some(student_id) = record.get("student_id") else {
            return Ok(());
        };
        let student_id = student_id
            .as_str()
            .ok_or_else(|| RecordError::InvalidPayload("student_id must be a string".to_string()))?;

        match self.store.get(filter, EntityKind::Students, student_id).await {
            Ok(_) => Ok(()),
            Err(RecordError::NotFound(_)) => Err(RecordError::CrossTenantReference {
                entity: EntityKind::Students.path(),
                id: student_id.to_string(),
            }),
            Err(other) => Err(other),
        }
    }
}

/// User accounts carry roles and credentials, so only admins may write them
fn authorize_write(caller: &CallerIdentity, kind: EntityKind, action: &str) -> Result<(), RecordError> {
    if kind != EntityKind::Users || caller.is_admin() {
        return Ok(());
    }

    tracing::warn!(
        "Caller '{}' with role '{}' attempted to {} a user account",
        caller.id,
        caller.role,
        action
    );
    Err(RecordError::Forbidden(format!(
        "role '{}' may not {} user accounts",
        caller.role, action
    )))
}

fn present(kind: EntityKind, mut record: Record) -> Record {
    for hidden in kind.hidden_columns() {
        record.remove(*hidden);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MemoryRecordStore;
    use crate::tenancy::guard::filter_for_tests;
    use serde_json::json;

    fn service() -> RecordService {
        RecordService::new(Arc::new(MemoryRecordStore::new(100)), 4)
    }

    fn caller(role: &str) -> CallerIdentity {
        CallerIdentity {
            id: "u1".to_string(),
            claimed_tenant_id: Some(TenantId::new("t1")),
            role: role.to_string(),
        }
    }

    fn teacher() -> CallerIdentity {
        caller("teacher")
    }

    #[tokio::test]
    async fn create_stamps_system_fields_and_defaults() {
        let svc = service();
        let t1 = filter_for_tests("t1");

        let student = svc
            .create(&t1, EntityKind::Students, &teacher(), json!({"english_name": "Amina", "tenantId": "t1"}))
            .await
            .unwrap();

        assert_eq!(student["tenant_id"], "t1");
        assert_eq!(student["status"], "Active");
        assert!(student["id"].as_str().is_some());
        assert!(student["created_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn create_rejects_foreign_tenant_in_body() {
        let svc = service();
        let result = svc
            .create(
                &filter_for_tests("t1"),
                EntityKind::Students,
                &teacher(),
                json!({"english_name": "Amina", "tenantId": "t2"}),
            )
            .await;
        assert!(matches!(result, Err(RecordError::TenantBypass { requested }) if requested == "t2"));
    }

    #[tokio::test]
    async fn create_rejects_unknown_and_system_columns() {
        let svc = service();
        let t1 = filter_for_tests("t1");

        let unknown = svc
            .create(&t1, EntityKind::Classes, &teacher(), json!({"name": "Hifz", "colour": "red"}))
            .await;
        assert!(matches!(unknown, Err(RecordError::UnknownColumn { .. })));

        let system = svc
            .create(&t1, EntityKind::Classes, &teacher(), json!({"name": "Hifz", "id": "fixed"}))
            .await;
        assert!(matches!(system, Err(RecordError::SystemFieldNotAllowed(f)) if f == "id"));
    }

    #[tokio::test]
    async fn attendance_must_reference_a_student_of_the_same_tenant() {
        let svc = service();
        let t1 = filter_for_tests("t1");
        let t2 = filter_for_tests("t2");

        let foreign = svc
            .create(&t2, EntityKind::Students, &teacher(), json!({"english_name": "Bilal"}))
            .await
            .unwrap();

        let result = svc
            .create(
                &t1,
                EntityKind::Attendance,
                &teacher(),
                json!({"student_id": foreign["id"], "date": "2024-03-01", "status": "Present"}),
            )
            .await;
        assert!(matches!(result, Err(RecordError::CrossTenantReference { .. })));

        let own = svc
            .create(&t1, EntityKind::Students, &teacher(), json!({"english_name": "Amina"}))
            .await
            .unwrap();
        let record = svc
            .create(
                &t1,
                EntityKind::Attendance,
                &teacher(),
                json!({"student_id": own["id"], "date": "2024-03-01", "status": "Present"}),
            )
            .await
            .unwrap();
        assert_eq!(record["marked_by"], "u1");
    }

    #[tokio::test]
    async fn user_passwords_are_hashed_and_hidden() {
        let svc = service();
        let t1 = filter_for_tests("t1");

        let user = svc
            .create(
                &t1,
                EntityKind::Users,
                &caller("admin"),
                json!({"email": "admin@alnoor.test", "password": "s3cret-pass"}),
            )
            .await
            .unwrap();
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());
        assert_eq!(user["role"], "user");

        let creds = svc
            .find_credentials(&TenantId::new("t1"), "ADMIN@alnoor.test")
            .await
            .unwrap()
            .unwrap();
        assert!(auth::verify_password("s3cret-pass", &creds.password_hash));
    }

    #[tokio::test]
    async fn user_requires_password() {
        let result = service()
            .create(&filter_for_tests("t1"), EntityKind::Users, &caller("admin"), json!({"email": "x@y.test"}))
            .await;
        assert!(matches!(result, Err(RecordError::MissingRequiredField(f)) if f == "password"));
    }

    #[tokio::test]
    async fn update_cannot_touch_tenant_or_other_scope() {
        let svc = service();
        let t1 = filter_for_tests("t1");
        let t2 = filter_for_tests("t2");

        let student = svc
            .create(&t1, EntityKind::Students, &teacher(), json!({"english_name": "Amina"}))
            .await
            .unwrap();
        let id = student["id"].as_str().unwrap();

        let moved = svc
            .update(&t1, EntityKind::Students, &teacher(), id, json!({"tenant_id": "t2"}))
            .await;
        assert!(matches!(moved, Err(RecordError::TenantBypass { .. })));

        let foreign = svc
            .update(&t2, EntityKind::Students, &teacher(), id, json!({"status": "Left"}))
            .await;
        assert!(matches!(foreign, Err(RecordError::NotFound(_))));

        let updated = svc
            .update(&t1, EntityKind::Students, &teacher(), id, json!({"status": "Graduated"}))
            .await
            .unwrap();
        assert_eq!(updated["status"], "Graduated");
        assert_eq!(updated["tenant_id"], "t1");
    }

    #[tokio::test]
    async fn only_admins_write_user_accounts() {
        let svc = service();
        let t1 = filter_for_tests("t1");
        let account = json!({"email": "staff@alnoor.test", "password": "s3cret-pass", "role": "teacher"});

        let denied = svc.create(&t1, EntityKind::Users, &teacher(), account.clone()).await;
        assert!(matches!(denied, Err(RecordError::Forbidden(_))));

        let user = svc.create(&t1, EntityKind::Users, &caller("admin"), account).await.unwrap();
        let id = user["id"].as_str().unwrap();

        for patch in [json!({"role": "admin"}), json!({"password": "taken-over"})] {
            let result = svc.update(&t1, EntityKind::Users, &teacher(), id, patch).await;
            assert!(matches!(result, Err(RecordError::Forbidden(_))));
        }
        assert!(matches!(
            svc.delete(&t1, EntityKind::Users, &teacher(), id).await,
            Err(RecordError::Forbidden(_))
        ));

        let creds = svc
            .find_credentials(&TenantId::new("t1"), "staff@alnoor.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.role, "teacher");
        assert!(auth::verify_password("s3cret-pass", &creds.password_hash));
    }

    #[tokio::test]
    async fn reserved_role_is_never_assignable() {
        let svc = service();
        let t1 = filter_for_tests("t1");

        for actor in [caller("admin"), caller("superadmin")] {
            let result = svc
                .create(
                    &t1,
                    EntityKind::Users,
                    &actor,
                    json!({"email": "root@alnoor.test", "password": "s3cret-pass", "role": "superadmin"}),
                )
                .await;
            assert!(matches!(result, Err(RecordError::Forbidden(_))));
        }

        let user = svc
            .create(
                &t1,
                EntityKind::Users,
                &caller("admin"),
                json!({"email": "deputy@alnoor.test", "password": "s3cret-pass", "role": "admin"}),
            )
            .await
            .unwrap();
        let promoted = svc
            .update(&t1, EntityKind::Users, &caller("admin"), user["id"].as_str().unwrap(), json!({"role": "superadmin"}))
            .await;
        assert!(matches!(promoted, Err(RecordError::Forbidden(_))));
    }
}
