// Mortality Globe - Web Server
// Serves the derived views as JSON plus the static front-end

use anyhow::{Context, Result};
use mortality_globe::{
    api::{router, AppState},
    logging, AppConfig, Dataset,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_stderr();

    println!("🌐 Mortality Globe - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::load(args.get(1).map(Path::new))?;

    if !config.records_path.exists() {
        eprintln!("❌ Records CSV not found at {:?}", config.records_path);
        eprintln!("   Set records_path in mortality-globe.json");
        std::process::exit(1);
    }

    let (dataset, report) = Dataset::load(&config.records_path, &config.regions_path)
        .context("Failed to load datasets")?;
    info!(
        rows = report.rows,
        coerced = report.coerced_fields(),
        regions = dataset.regions().len(),
        "dataset loaded"
    );
    println!(
        "✓ Loaded {} records, {} regions",
        dataset.records().len(),
        dataset.regions().len()
    );

    let state = AppState {
        dataset: Arc::new(dataset),
        options: config.view_options(),
        base_filter: config.initial_filter()?,
    };
    let app = router(state, config.static_dir.clone());

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    info!(addr = %config.server_addr, "server listening");
    println!("\n🚀 Server running on http://{}", config.server_addr);
    println!("   API: http://{}/api/views", config.server_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}
