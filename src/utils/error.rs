use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Could not obtain geo location for '{address}': {reason}")]
    LookupError { address: String, reason: String },

    #[error("Could not write output file '{path}': {reason}")]
    OutputWriteError { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Data,
    Configuration,
    Input,
    Lookup,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::InputError { .. } => ErrorCategory::Input,
            EtlError::LookupError { .. } => ErrorCategory::Lookup,
            EtlError::OutputWriteError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆地址查詢失敗只會被略過
            EtlError::LookupError { .. } => ErrorSeverity::Low,
            EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::InputError { .. }
            | EtlError::SerializationError(_)
            | EtlError::OutputWriteError { .. } => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check network connectivity and the geocoding endpoint, then rerun".to_string()
            }
            EtlError::IoError(_) => "Check that the file exists and is readable".to_string(),
            EtlError::SerializationError(_) => {
                "Make sure the input file contains valid JSON".to_string()
            }
            EtlError::ConfigError { .. } | EtlError::ConfigValidationError { .. } => {
                "Review the configuration file and command line arguments".to_string()
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Provide a valid value for '{}'", field)
            }
            EtlError::MissingConfigError { field } => {
                format!("Set '{}' in the configuration", field)
            }
            EtlError::InputError { .. } => {
                "The input must be a JSON array of objects whose first item has the address attribute"
                    .to_string()
            }
            EtlError::LookupError { .. } => {
                "Verify the address text and the geocoding API key".to_string()
            }
            EtlError::OutputWriteError { .. } => {
                "Check that the output directory exists and is writable".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(_) => format!("Geocoding service unreachable: {}", self),
            EtlError::IoError(e) => format!("Could not access file: {}", e),
            EtlError::SerializationError(e) => format!("Could not parse JSON: {}", e),
            EtlError::InputError { message } => message.clone(),
            EtlError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
