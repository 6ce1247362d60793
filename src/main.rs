use clap::Parser;
use geo_enrich::utils::error::ErrorSeverity;
use geo_enrich::utils::{logger, validation::Validate};
use geo_enrich::{CliConfig, EtlEngine, GeocodePipeline, GoogleGeocoder, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.log_json);

    tracing::info!("Starting geo-enrich CLI");
    if config.verbose {
        tracing::debug!(
            "Input: {}, output: {}, address attribute: {}, pacing: {}ms",
            config.input_file,
            config.output_file,
            config.address_field,
            config.pacing_ms
        );
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let geocoder = match GoogleGeocoder::from_config(&config) {
        Ok(geocoder) => geocoder,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    if config.api_key.is_none() {
        tracing::warn!("No API key configured, requests may be rejected by the geocoder");
    }

    let pipeline = GeocodePipeline::new(LocalStorage::default(), config, geocoder);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!(
                "✅ Geocoded {} of {} items ({} dropped)",
                summary.geocoded,
                summary.total_records,
                summary.dropped
            );
            println!("✅ Generated {}", summary.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Geocoding run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
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
