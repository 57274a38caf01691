// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use mortality_globe::{compute_views_with, logging, AppConfig, Dataset};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "summary" {
        // Summary mode: print the initial views and exit
        let config = AppConfig::load(args.get(2).map(Path::new))?;
        run_summary(config)?;
    } else {
        // UI mode (default)
        let config = AppConfig::load(args.get(1).map(Path::new))?;
        run_ui_mode(config)?;
    }

    Ok(())
}

fn load_dataset(config: &AppConfig) -> Result<Dataset> {
    let (dataset, report) = Dataset::load(&config.records_path, &config.regions_path)
        .context("Failed to load datasets")?;
    tracing::info!(
        rows = report.rows,
        coerced = report.coerced_fields(),
        age_mismatch = report.age_mismatch,
        "load report"
    );
    Ok(dataset)
}

fn run_summary(config: AppConfig) -> Result<()> {
    logging::init_stderr();

    println!("🌍 Mortality Globe - Summary");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let dataset = load_dataset(&config)?;
    println!("✓ Loaded {} records, {} regions", dataset.records().len(), dataset.regions().len());

    let filter = config.initial_filter()?;
    let views = compute_views_with(&dataset, &filter, &config.view_options());
    println!("\n🔍 Filter: {}", filter);
    println!("✓ {} records match", views.matched);

    println!("\n🏆 Top regions");
    for region in &views.globe.top_regions {
        println!("   {:>2}. {} ({} records)", region.rank, region.name, region.count);
    }

    println!("\n📦 Age of death by occupation");
    for entry in &views.boxplot.summaries {
        match &entry.summary {
            Some(s) => println!(
                "   {:<10} n={:<6} q1={:>6.1} median={:>6.1} q3={:>6.1}",
                entry.category.as_str(),
                s.count,
                s.q1,
                s.median,
                s.q3
            ),
            None => println!("   {:<10} no data", entry.category.as_str()),
        }
    }

    println!(
        "\n☠️  Heatmap: {} classified, {} unclassified",
        views.heatmap.total, views.heatmap.unclassified
    );

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: AppConfig) -> Result<()> {
    use mortality_globe::{Dashboard, Playback};

    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| "mortality-globe.log".into());
    logging::init_file(&log_file)?;

    println!("🖥️  Loading Mortality Globe...\n");
    let dataset = load_dataset(&config)?;
    println!("✓ Loaded {} records\n", dataset.records().len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let dashboard = Dashboard::new(dataset, config.initial_filter()?, config.view_options());
    let mut app = ui::App::new(dashboard, Playback::new(config.tick()));
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web API: cargo run --bin mortality-server --features server");
    std::process::exit(1);
}
