use serde_json::{json, Value};

use super::RecordError;

/// Tenant-owned record kinds exposed under `/api/:entity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    Students,
    Attendance,
    Classes,
    Finance,
    Progress,
    Announcements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Columns every record carries and the API may never set directly
pub const SYSTEM_FIELDS: &[&str] = &["id", "tenant_id", "created_at", "updated_at"];

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Users,
        EntityKind::Students,
        EntityKind::Attendance,
        EntityKind::Classes,
        EntityKind::Finance,
        EntityKind::Progress,
        EntityKind::Announcements,
    ];

    pub fn from_path(segment: &str) -> Result<Self, RecordError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == segment)
            .ok_or_else(|| RecordError::UnknownEntity(segment.to_string()))
    }

    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Students => "students",
            EntityKind::Attendance => "attendance",
            EntityKind::Classes => "classes",
            EntityKind::Finance => "finance",
            EntityKind::Progress => "progress",
            EntityKind::Announcements => "announcements",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Students => "students",
            EntityKind::Attendance => "attendance_records",
            EntityKind::Classes => "classes",
            EntityKind::Finance => "fee_records",
            EntityKind::Progress => "progress_records",
            EntityKind::Announcements => "announcements",
        }
    }

    /// Writable columns, excluding system fields
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Users => &[
                "username",
                "email",
                "password_hash",
                "role",
                "full_name",
                "phone",
                "is_active",
                "last_login",
            ],
            EntityKind::Students => &[
                "student_id",
                "english_name",
                "arabic_name",
                "date_of_birth",
                "gender",
                "class_level",
                "year_group",
                "status",
                "phone",
                "email",
                "address",
                "guardian_name",
                "guardian_phone",
                "guardian_email",
                "guardian_relationship",
                "quran_progress",
                "attendance_rate",
                "outstanding_fees",
            ],
            EntityKind::Attendance => &["student_id", "date", "status", "notes", "marked_by"],
            EntityKind::Classes => &[
                "name",
                "level",
                "teacher",
                "schedule",
                "capacity",
                "enrolled",
                "description",
            ],
            EntityKind::Finance => &[
                "student_id",
                "fee_type",
                "amount",
                "due_date",
                "paid_amount",
                "payment_date",
                "payment_method",
                "status",
                "notes",
            ],
            EntityKind::Progress => &[
                "student_id",
                "subject",
                "progress_type",
                "current_level",
                "progress_percentage",
                "grade",
                "notes",
                "assessed_by",
                "assessment_date",
            ],
            EntityKind::Announcements => &["title", "content", "priority", "author"],
        }
    }

    /// Columns that never leave the store in API responses
    pub fn hidden_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Users => &["password_hash"],
            _ => &[],
        }
    }

    /// Columns that must be present on create
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Users => &["email", "password_hash"],
            EntityKind::Students => &["english_name"],
            EntityKind::Attendance => &["student_id", "date", "status"],
            EntityKind::Classes => &["name"],
            EntityKind::Finance => &["student_id", "fee_type", "amount", "due_date"],
            EntityKind::Progress => &["student_id", "subject"],
            EntityKind::Announcements => &["title", "content"],
        }
    }

    /// Columns usable as equality filters on list
    pub fn filterable(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Users => &["role", "is_active"],
            EntityKind::Students => &["status", "class_level"],
            EntityKind::Attendance => &["student_id", "date", "status"],
            EntityKind::Classes => &["level"],
            EntityKind::Finance => &["student_id", "status"],
            EntityKind::Progress => &["student_id", "subject"],
            EntityKind::Announcements => &["priority"],
        }
    }

    pub fn order_by(&self) -> (&'static str, SortDirection) {
        match self {
            EntityKind::Attendance => ("date", SortDirection::Desc),
            EntityKind::Classes => ("name", SortDirection::Asc),
            EntityKind::Finance => ("due_date", SortDirection::Desc),
            EntityKind::Progress => ("assessment_date", SortDirection::Desc),
            _ => ("created_at", SortDirection::Desc),
        }
    }

    /// Values applied on create when the payload omits the column
    pub fn defaults(&self) -> Vec<(&'static str, Value)> {
        match self {
            EntityKind::Users => vec![("role", json!("user")), ("is_active", json!(true))],
            EntityKind::Students => vec![
                ("status", json!("Active")),
                ("quran_progress", json!(0)),
                ("attendance_rate", json!(0)),
                ("outstanding_fees", json!(0)),
            ],
            EntityKind::Classes => vec![("capacity", json!(20)), ("enrolled", json!(0))],
            EntityKind::Finance => vec![("paid_amount", json!(0)), ("status", json!("Pending"))],
            EntityKind::Progress => vec![("progress_percentage", json!(0))],
            EntityKind::Announcements => vec![("priority", json!("normal"))],
            EntityKind::Attendance => vec![],
        }
    }

    /// Column stamped with the acting caller on create
    pub fn actor_column(&self) -> Option<&'static str> {
        match self {
            EntityKind::Attendance => Some("marked_by"),
            EntityKind::Progress => Some("assessed_by"),
            EntityKind::Announcements => Some("author"),
            _ => None,
        }
    }

    /// True for records that point at a student of the same tenant
    pub fn references_student(&self) -> bool {
        matches!(
            self,
            EntityKind::Attendance | EntityKind::Finance | EntityKind::Progress
        )
    }

    pub fn is_known_column(&self, column: &str) -> bool {
        SYSTEM_FIELDS.contains(&column) || self.columns().contains(&column)
    }
}
