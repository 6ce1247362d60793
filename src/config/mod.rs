pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::http::DEFAULT_ENDPOINT;
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::time::Duration;

pub const MAX_PACING_MS: u64 = 60_000;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "geo-enrich")]
#[command(about = "Geocodes each item of a JSON array and writes the enriched items")]
pub struct CliConfig {
    /// Input JSON file (array of objects)
    pub input_file: String,

    /// Output JSON file
    pub output_file: String,

    /// Name of the attribute holding the address text
    pub address_field: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, env = "GEOCODER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value = "100", help = "Delay between lookups in milliseconds")]
    pub pacing_ms: u64,

    #[arg(long, help = "Per request timeout in seconds (no timeout when omitted)")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input_file
    }

    fn output_path(&self) -> &str {
        &self.output_file
    }

    fn address_field(&self) -> &str {
        &self.address_field
    }

    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input_file", &self.input_file)?;
        validation::validate_file_extension("input_file", &self.input_file, &["json"])?;
        validation::validate_path("output_file", &self.output_file)?;
        validation::validate_file_extension("output_file", &self.output_file, &["json"])?;
        validation::validate_non_empty_string("address_field", &self.address_field)?;
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        validation::validate_range("pacing_ms", self.pacing_ms, 0, MAX_PACING_MS)?;
        if let Some(timeout) = self.request_timeout_secs {
            validation::validate_positive_number("request_timeout_secs", timeout, 1)?;
        }
        Ok(())
    }
}
