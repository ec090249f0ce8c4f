pub mod manager;
pub mod records;
pub mod tenants;

pub use manager::{DatabaseError, DatabaseManager};
pub use records::PgRecordStore;
pub use tenants::PgTenantDirectory;
