use crate::adapters::http::DEFAULT_ENDPOINT;
use crate::config::MAX_PACING_MS;
use crate::core::sequencer::DEFAULT_PACING;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    #[serde(default = "default_address_field")]
    pub address_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub pacing_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

fn default_address_field() -> String {
    "address".to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEOCODER_API_KEY})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    pub fn pacing_ms(&self) -> u64 {
        self.geocoder
            .pacing_ms
            .unwrap_or(DEFAULT_PACING.as_millis() as u64)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn address_field(&self) -> &str {
        &self.input.address_field
    }

    fn api_endpoint(&self) -> &str {
        self.geocoder.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn api_key(&self) -> Option<&str> {
        self.geocoder.api_key.as_deref()
    }

    fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms())
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.geocoder.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extension("input.path", &self.input.path, &["json"])?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_file_extension("output.path", &self.output.path, &["json"])?;
        validation::validate_non_empty_string("input.address_field", &self.input.address_field)?;
        validation::validate_url("geocoder.endpoint", self.api_endpoint())?;
        validation::validate_range("geocoder.pacing_ms", self.pacing_ms(), 0, MAX_PACING_MS)?;
        if let Some(timeout) = self.geocoder.request_timeout_secs {
            validation::validate_positive_number("geocoder.request_timeout_secs", timeout, 1)?;
        }
        // 未被替換的 ${VAR} 代表環境變數沒有設定
        if let Some(key) = &self.geocoder.api_key {
            if key.starts_with("${") {
                return Err(EtlError::MissingConfigError {
                    field: format!("geocoder.api_key ({})", key),
                });
            }
        }
        Ok(())
    }
}
