//! Provisioning script - resets every `production_envN` database and seeds it
//!
//! Run with:
//! ```
//! cargo run -p provisioner --bin provision
//! ```
//!
//! Set `PROVISION_SEED` to reproduce the same rows on every run.

use provisioner::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ProvisionConfig::from_env()?;
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| config.connection.url());

    let mut provisioner = Provisioner::connect(&database_url, &config).await?;
    tracing::info!("Connected to database");

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let registry = SchemaRegistry::from_config(&config);
    let report = provisioner.provision(&registry, &mut rng).await?;
    provisioner.close().await?;

    tracing::info!("Provisioning completed!");
    tracing::info!("  Databases: {}", report.databases);
    tracing::info!("  Tables: {}", report.tables);
    tracing::info!("  Rows: {}", report.rows);
    tracing::info!("  Report: {}", serde_json::to_string(&report)?);

    Ok(())
}
