//! # carehubd: carehub daemon
//!
//! Composition root that wires the storage adapter into the facility
//! services.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Install the tracing subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the repository and the facility operations service
//! - Audit the stored records and report every broken invariant
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::process::ExitCode;

use carehub_adapter_storage_sqlite_sqlx::SqliteResourceRepository;
use carehub_app::services::facility_service::FacilityOperationsService;
use carehub_app::shift_compliance::ShiftPolicy;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = carehub_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;

    // Services
    let repo = SqliteResourceRepository::new(db.pool().clone());
    let policy = ShiftPolicy::with_daily_hours(config.compliance.max_daily_hours);
    let service = FacilityOperationsService::new(repo, policy);

    tracing::info!(
        database = config.database_url(),
        max_daily_hours = config.compliance.max_daily_hours,
        "carehubd started"
    );

    let violations = service.audit_consistency().await?;
    if violations.is_empty() {
        tracing::info!("store is consistent");
        return Ok(ExitCode::SUCCESS);
    }

    for violation in &violations {
        tracing::error!(?violation, "invariant violated");
    }
    Ok(ExitCode::FAILURE)
}
