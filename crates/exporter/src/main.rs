use exporter::{Database, ExportConfig, export_table, verify};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = ExportConfig::from_env()?;

    tracing::info!("Connecting to database at {}", config.database_url);
    let mut db = Database::connect(&config.database_url).await?;

    let stats = export_table(&mut db, &config).await?;
    let source_rows = db.count_rows(&config.database, &config.table).await?;
    db.close().await?;

    tracing::info!(
        "Exported {} rows from {}.{} in {}ms",
        stats.rows_exported,
        stats.database,
        stats.table,
        stats.elapsed_ms
    );

    let report = verify(&stats.output, config.preview_rows)?;
    println!("{report}");

    if report.num_rows as i64 != source_rows {
        tracing::warn!(
            "Row count mismatch: table has {} rows, file has {}",
            source_rows,
            report.num_rows
        );
    }

    Ok(())
}
