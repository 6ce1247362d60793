use anyhow::Context;
use clap::Parser;
use geo_enrich::core::{ConfigProvider, Pipeline};
use geo_enrich::utils::error::ErrorSeverity;
use geo_enrich::utils::{logger, validation::Validate};
use geo_enrich::{EtlEngine, GeocodePipeline, GoogleGeocoder, LocalStorage, TomlConfig};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "toml-geocode")]
#[command(about = "Geocoding tool with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "geocode.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the pacing delay (milliseconds) from config
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Dry run - check the input file without calling the geocoder
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose || config.verbose(), config.json_logs());
    tracing::info!("🚀 Starting TOML-based geocoding tool");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(pacing_ms) = args.pacing_ms {
        config.geocoder.pacing_ms = Some(pacing_ms);
        tracing::info!("🔧 Pacing overridden to: {}ms", pacing_ms);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let geocoder = GoogleGeocoder::from_config(&config).context("failed to build geocoding client")?;
    let pipeline = GeocodePipeline::new(LocalStorage::default(), config, geocoder);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No lookups will be issued");
        return perform_dry_run(&pipeline).await;
    }

    let engine = EtlEngine::new(pipeline);
    match engine.run().await {
        Ok(summary) => {
            println!("✅ Generated {}", summary.output_path);
            println!(
                "📊 {} of {} items geocoded, {} dropped, took {:?}",
                summary.geocoded, summary.total_records, summary.dropped, summary.duration
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Geocoding run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Address attribute: {}", config.address_field());
    println!("  Geocoder: {}", config.api_endpoint());
    println!(
        "  API key: {}",
        if config.api_key().is_some() { "configured" } else { "none" }
    );
    println!("  Pacing: {:?}", config.pacing());
    match config.request_timeout() {
        Some(timeout) => println!("  Request timeout: {:?}", timeout),
        None => println!("  Request timeout: none"),
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(
    pipeline: &GeocodePipeline<LocalStorage, TomlConfig, GoogleGeocoder>,
) -> anyhow::Result<()> {
    let config = pipeline.config();
    let records = pipeline
        .extract()
        .await
        .with_context(|| format!("input file {} is not usable", config.input_path()))?;

    let with_address = records
        .iter()
        .filter(|r| r.address(config.address_field()).is_some())
        .count();

    println!("🔍 Dry Run Analysis:");
    println!("  Items: {}", records.len());
    println!("  Items with a textual address: {}", with_address);
    println!(
        "  Items that would be dropped without lookup: {}",
        records.len() - with_address
    );
    println!(
        "  Minimum run time from pacing alone: {:?}",
        minimum_pacing_time(config.pacing(), with_address)
    );
    println!();
    println!("✅ Dry run analysis complete.");

    Ok(())
}

/// 每筆有地址的資料之後都要等待一次
fn minimum_pacing_time(pacing: Duration, lookups: usize) -> Duration {
    pacing.mul_f64(lookups as f64)
}
