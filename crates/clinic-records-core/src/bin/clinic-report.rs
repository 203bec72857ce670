//! Print the practice report of a clinic records store as JSON.
//!
//! # Environment Variables
//! - `CLINIC_DB_PATH`: SQLite file to open (default: in-memory store)
//! - `CLINIC_SEED_ROLES`: seed the DOCTOR/PATIENT/ADMIN roles on open (default: true)
//! - `RUST_LOG`: log filter (default directive: `clinic_records_core=info`)

use clinic_records_core::{ClinicRecords, RecordsConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_records_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = RecordsConfig::from_env_values(
        std::env::var("CLINIC_DB_PATH").ok(),
        std::env::var("CLINIC_SEED_ROLES").ok(),
    )?;

    let records = ClinicRecords::open(&config)?;
    let report = records.with_services(|s| s.reporting().practice_report())?;
    tracing::info!(
        doctors = report.totals.doctors,
        patients = report.totals.patients,
        "Generated practice report"
    );

    println!("{}", report.to_json()?);
    Ok(())
}
