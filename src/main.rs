use anyhow::{Context, Result};
use clap::Parser;
use sheetload::{
    config::Config,
    fetch::GoogleSheets,
    load::BigQueryWarehouse,
    pipeline::Pipeline,
    process::CorrectionRules,
    schema::YamlSchemaStore,
    storage::GcsStore,
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config ───────────────────────────────────────────────────
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // ─── 2) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
    info!("startup");

    if let Some(key) = &config.credentials {
        env::set_var("GOOGLE_APPLICATION_CREDENTIALS", key);
    }
    let mapping = config.sheet_table_mapping()?;
    info!(
        bucket = %config.bucket,
        dataset = %config.dataset,
        schema_folder = %config.schema_folder.display(),
        sheets = mapping.sheet_count(),
        "configuration"
    );

    // ─── 3) backend handles ──────────────────────────────────────────
    let sheets = GoogleSheets::connect(&config.sheet_url).await?;
    let objects = GcsStore::connect().await?;
    let warehouse = BigQueryWarehouse::connect(
        config.project.clone(),
        config.location.clone(),
        config.poll_interval(),
    )
    .await?;
    let schemas = YamlSchemaStore::new(&config.schema_folder);

    // ─── 4) run ──────────────────────────────────────────────────────
    let pipeline = Pipeline {
        sheets: &sheets,
        objects: &objects,
        warehouse: &warehouse,
        schemas: &schemas,
        corrections: CorrectionRules::default(),
        bucket: config.bucket.clone(),
        dataset: config.dataset.clone(),
        staging_dir: config.staging_dir.clone(),
    };

    let summary = pipeline
        .run(&mapping)
        .await
        .inspect_err(|e| error!(error = %e, "run aborted"))
        .context("sheet load run failed")?;

    info!(
        staged = summary.staged.len(),
        loaded = summary.load_jobs.len(),
        "all done"
    );
    Ok(())
}
