use serde_json::{json, Value};

use crate::cli::utils::*;
use crate::cli::{connect, operator, OutputFormat};
use crate::config::AppConfig;
use crate::records::EntityKind;
use crate::state::AppState;
use crate::tenancy::{CallerIdentity, NewTenant, Tenant, TenancyError};

struct SeedTenant {
    name: &'static str,
    slug: &'static str,
    logo: &'static str,
    admin_email: &'static str,
    admin_name: &'static str,
    students: fn() -> Vec<Value>,
}

const DEMO_PASSWORD: &str = "123456";

fn tenants() -> Vec<SeedTenant> {
    vec![
        SeedTenant {
            name: "Al-Noor Islamic Academy",
            slug: "alnoor",
            logo: "🕌",
            admin_email: "admin@alnoor.com",
            admin_name: "Ahmed Hassan",
            students: || {
                vec![
                    json!({
                        "student_id": "STU001",
                        "english_name": "Fatima Al-Zahra",
                        "arabic_name": "فاطمة الزهراء",
                        "date_of_birth": "2010-03-15",
                        "gender": "Female",
                        "class_level": "Fasal 7",
                        "year_group": "Intermediate",
                        "guardian_name": "Ahmad Al-Zahra",
                        "guardian_relationship": "Father",
                        "quran_progress": 15,
                        "attendance_rate": 96
                    }),
                    json!({
                        "student_id": "STU002",
                        "english_name": "Omar Ibn Khattab",
                        "arabic_name": "عمر بن الخطاب",
                        "date_of_birth": "2008-07-22",
                        "gender": "Male",
                        "class_level": "Fasal 9",
                        "year_group": "Advanced",
                        "guardian_name": "Abdullah Ibn Khattab",
                        "guardian_relationship": "Father",
                        "quran_progress": 25,
                        "attendance_rate": 94,
                        "outstanding_fees": 150
                    }),
                ]
            },
        },
        SeedTenant {
            name: "Madinah Learning Center",
            slug: "madinah",
            logo: "📚",
            admin_email: "admin@madinah.com",
            admin_name: "Fatima Ali",
            students: || {
                vec![json!({
                    "student_id": "STU001",
                    "english_name": "Aisha Siddique",
                    "arabic_name": "عائشة صديقة",
                    "date_of_birth": "2012-11-08",
                    "gender": "Female",
                    "class_level": "Fasal 5",
                    "year_group": "Beginner",
                    "guardian_name": "Khadija Siddique",
                    "guardian_relationship": "Mother",
                    "quran_progress": 3,
                    "attendance_rate": 98
                })]
            },
        },
    ]
}

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = connect(config).await?;

    let mut seeded = Vec::new();
    for seed in tenants() {
        let tenant = ensure_tenant(&state, &seed).await?;
        seed_records(&state, &tenant, &seed).await?;
        seeded.push(tenant.slug.to_string());
    }

    output_success(
        output_format,
        &format!("Seeded tenants: {}", seeded.join(", ")),
        Some(json!({ "tenants": seeded })),
    )
}

async fn ensure_tenant(state: &AppState, seed: &SeedTenant) -> anyhow::Result<Tenant> {
    match state.tenants.directory().lookup_by_slug(seed.slug).await {
        Ok(tenant) => Ok(tenant),
        Err(TenancyError::NotFound(_)) => {
            let input = NewTenant {
                name: seed.name.to_string(),
                slug: seed.slug.to_string(),
                logo: Some(seed.logo.to_string()),
            };
            Ok(state.tenants.create_tenant(&operator(), input).await?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Writes go through the scoping guard like any session bound to the tenant
async fn seed_records(state: &AppState, tenant: &Tenant, seed: &SeedTenant) -> anyhow::Result<()> {
    let caller = CallerIdentity {
        id: "dugsi-seed".to_string(),
        claimed_tenant_id: Some(tenant.id.clone()),
        role: "admin".to_string(),
    };
    let (filter, _) = state
        .guard
        .authorize_tenant_scope(Some(&tenant.slug), Some(&caller), None)
        .await?;

    if state.records.find_credentials(&tenant.id, seed.admin_email).await?.is_none() {
        state
            .records
            .create(
                &filter,
                EntityKind::Users,
                &caller,
                json!({
                    "username": "admin",
                    "email": seed.admin_email,
                    "password": DEMO_PASSWORD,
                    "role": "admin",
                    "full_name": seed.admin_name,
                }),
            )
            .await?;
    }

    let counts = state.records.counts_for_tenant(&tenant.id).await?;
    if counts.students == 0 {
        for student in (seed.students)() {
            state.records.create(&filter, EntityKind::Students, &caller, student).await?;
        }
    }

    tracing::info!("Seeded tenant '{}'", tenant.slug);
    Ok(())
}
