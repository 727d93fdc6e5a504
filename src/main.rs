use anyhow::{Context, Result};
use diploma_verify::{
    api,
    config::{Config, ServerSettings},
    fetch::HttpSheetSource,
    Lookup,
};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ServerSettings::from_env();
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(settings.log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    info!("Starting diploma verification service");

    let config = Config::load()?;
    info!(
        spreadsheet = %config.spreadsheet_id,
        sheets = config.sheets.len(),
        strategies = ?config.strategies,
        "configuration loaded"
    );

    let source = HttpSheetSource::new(&config).context("building HTTP client")?;
    let lookup = Arc::new(Lookup::new(source, config));
    let routes = api::routes(lookup, settings.public_dir.clone());

    info!("Server starting on port {}", settings.port);
    info!("Health check: http://localhost:{}/health", settings.port);
    info!(
        "Verify endpoint: http://localhost:{}/api/verify-diploma?id=",
        settings.port
    );

    warp::serve(routes).run(([0, 0, 0, 0], settings.port)).await;

    Ok(())
}
