//! Configuration schema types
//!
//! Every section is optional in the TOML file; missing sections and keys
//! take the defaults below.

use crate::config::SecretString;
use crate::domain::TransmissionProtocol;
use crate::hl7::{MappingOptions, ObservationGrouping};
use serde::{Deserialize, Serialize};

/// Lower and upper bounds for `transmission.max_message_size_bytes`
pub const MIN_MESSAGE_SIZE_BYTES: usize = 1024;
pub const MAX_MESSAGE_SIZE_BYTES: usize = 16 * 1024 * 1024;

/// Main gateway configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Message header defaults and layout
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Retry, timeout and concurrency policy
    #[serde(default)]
    pub transmission: TransmissionConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.conversion.validate()?;
        self.transmission.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Conversion settings: MSH defaults and observation layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// MSH-3 when the input does not name a sending application
    #[serde(default = "default_sending_application")]
    pub sending_application: String,

    /// MSH-5 when the input does not name a receiving application
    #[serde(default)]
    pub receiving_application: String,

    /// MSH-4 fallback
    #[serde(default)]
    pub default_sending_facility: String,

    /// MSH-6 fallback
    #[serde(default)]
    pub default_receiving_facility: String,

    /// MSH-11: P (production), T (training) or D (debugging)
    #[serde(default = "default_processing_id")]
    pub processing_id: String,

    /// MSH-12
    #[serde(default = "default_hl7_version")]
    pub version: String,

    /// Accept inputs with an empty observation list
    #[serde(default = "default_true")]
    pub allow_empty_observations: bool,

    /// single_order or order_per_observation
    #[serde(default)]
    pub observation_grouping: ObservationGrouping,

    /// OBR-4 code when all observations share one order
    #[serde(default = "default_panel_code")]
    pub panel_code: String,

    /// OBR-4 text when all observations share one order
    #[serde(default = "default_panel_description")]
    pub panel_description: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sending_application: default_sending_application(),
            receiving_application: String::new(),
            default_sending_facility: String::new(),
            default_receiving_facility: String::new(),
            processing_id: default_processing_id(),
            version: default_hl7_version(),
            allow_empty_observations: true,
            observation_grouping: ObservationGrouping::default(),
            panel_code: default_panel_code(),
            panel_description: default_panel_description(),
        }
    }
}

impl ConversionConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_ids = ["P", "T", "D"];
        if !valid_ids.contains(&self.processing_id.as_str()) {
            return Err(format!(
                "Invalid conversion.processing_id '{}'. Must be one of: {}",
                self.processing_id,
                valid_ids.join(", ")
            ));
        }
        if self.version.trim().is_empty() {
            return Err("conversion.version cannot be empty".to_string());
        }
        if self.sending_application.contains(['\r', '\n']) {
            return Err("conversion.sending_application cannot contain line breaks".to_string());
        }
        Ok(())
    }

    /// Mapper options derived from this section
    pub fn mapping_options(&self) -> MappingOptions {
        MappingOptions {
            sending_application: self.sending_application.clone(),
            receiving_application: self.receiving_application.clone(),
            default_sending_facility: self.default_sending_facility.clone(),
            default_receiving_facility: self.default_receiving_facility.clone(),
            processing_id: self.processing_id.clone(),
            version: self.version.clone(),
            grouping: self.observation_grouping,
            panel_code: self.panel_code.clone(),
            panel_description: self.panel_description.clone(),
            ..MappingOptions::default()
        }
    }
}

/// Transmission policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmissionConfig {
    /// Per-attempt timeout when a request does not set one (1-300)
    #[serde(default = "default_timeout_seconds")]
    pub default_timeout_seconds: u64,

    /// Total attempts per request, first attempt included (1-10)
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Fixed wait between attempts (0-300)
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,

    /// Largest message accepted for transmission (1 KiB - 16 MiB)
    #[serde(default = "default_max_message_size_bytes")]
    pub max_message_size_bytes: usize,

    /// In-flight transmission limit (1-256)
    #[serde(default = "default_max_concurrent_transmissions")]
    pub max_concurrent_transmissions: usize,

    /// Whether a timed-out attempt is retried
    #[serde(default = "default_true")]
    pub retry_on_timeout: bool,

    /// Protocols the provider factory registers
    #[serde(default = "default_enabled_protocols")]
    pub enabled_protocols: Vec<TransmissionProtocol>,

    /// HTTP and HTTPS provider settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: default_timeout_seconds(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_seconds: default_retry_delay_seconds(),
            max_message_size_bytes: default_max_message_size_bytes(),
            max_concurrent_transmissions: default_max_concurrent_transmissions(),
            retry_on_timeout: true,
            enabled_protocols: default_enabled_protocols(),
            http: HttpConfig::default(),
        }
    }
}

impl TransmissionConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=300).contains(&self.default_timeout_seconds) {
            return Err(format!(
                "transmission.default_timeout_seconds must be between 1 and 300, got {}",
                self.default_timeout_seconds
            ));
        }
        if !(1..=10).contains(&self.max_retry_attempts) {
            return Err(format!(
                "transmission.max_retry_attempts must be between 1 and 10, got {}",
                self.max_retry_attempts
            ));
        }
        if self.retry_delay_seconds > 300 {
            return Err(format!(
                "transmission.retry_delay_seconds must be between 0 and 300, got {}",
                self.retry_delay_seconds
            ));
        }
        if !(MIN_MESSAGE_SIZE_BYTES..=MAX_MESSAGE_SIZE_BYTES)
            .contains(&self.max_message_size_bytes)
        {
            return Err(format!(
                "transmission.max_message_size_bytes must be between {} and {}, got {}",
                MIN_MESSAGE_SIZE_BYTES, MAX_MESSAGE_SIZE_BYTES, self.max_message_size_bytes
            ));
        }
        if !(1..=256).contains(&self.max_concurrent_transmissions) {
            return Err(format!(
                "transmission.max_concurrent_transmissions must be between 1 and 256, got {}",
                self.max_concurrent_transmissions
            ));
        }
        if self.enabled_protocols.is_empty() {
            return Err("transmission.enabled_protocols cannot be empty".to_string());
        }
        self.http.validate()
    }
}

/// HTTP provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// TLS certificate verification enabled
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Username for basic authentication (optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Bearer token (optional, exclusive with basic authentication)
    #[serde(default)]
    pub bearer_token: Option<SecretString>,

    /// User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Content-Type of the POST body
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            tls_verify: true,
            username: None,
            password: None,
            bearer_token: None,
            user_agent: default_user_agent(),
            content_type: default_content_type(),
        }
    }
}

impl HttpConfig {
    fn validate(&self) -> Result<(), String> {
        if self.password.is_some() && self.username.is_none() {
            return Err("transmission.http.password requires transmission.http.username".to_string());
        }
        if self.username.is_some() && self.bearer_token.is_some() {
            return Err(
                "transmission.http: configure either basic authentication or bearer_token, not both"
                    .to_string(),
            );
        }
        if self.content_type.trim().is_empty() {
            return Err("transmission.http.content_type cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Audit repository backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    /// Process-local, lost on exit
    #[default]
    Memory,
    /// Append-only JSON lines file
    File,
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Record one log per orchestrated transmission
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: AuditBackend,

    /// File path for the `file` backend
    #[serde(default = "default_audit_path")]
    pub path: String,

    /// Logs older than this are removed by `purge` (1-3650)
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: AuditBackend::Memory,
            path: default_audit_path(),
            retention_days: default_retention_days(),
        }
    }
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=3650).contains(&self.retention_days) {
            return Err(format!(
                "audit.retention_days must be between 1 and 3650, got {}",
                self.retention_days
            ));
        }
        if self.backend == AuditBackend::File && self.path.trim().is_empty() {
            return Err("audit.path is required when audit.backend = 'file'".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path is required when local logging is enabled".to_string());
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_sending_application() -> String {
    "HL7GW".to_string()
}

fn default_processing_id() -> String {
    "P".to_string()
}

fn default_hl7_version() -> String {
    "2.5".to_string()
}

fn default_panel_code() -> String {
    "LAB".to_string()
}

fn default_panel_description() -> String {
    "Laboratory Results".to_string()
}

fn default_timeout_seconds() -> u64 {
    crate::domain::transmission::DEFAULT_TIMEOUT_SECONDS
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_seconds() -> u64 {
    5
}

fn default_max_message_size_bytes() -> usize {
    1024 * 1024
}

fn default_max_concurrent_transmissions() -> usize {
    10
}

fn default_enabled_protocols() -> Vec<TransmissionProtocol> {
    TransmissionProtocol::ALL.to_vec()
}

fn default_user_agent() -> String {
    format!("hl7-gateway/{}", env!("CARGO_PKG_VERSION"))
}

fn default_content_type() -> String {
    "application/hl7-v2".to_string()
}

fn default_audit_path() -> String {
    "./audit/transmissions.jsonl".to_string()
}

fn default_retention_days() -> u32 {
    90
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transmission.max_retry_attempts, 3);
        assert_eq!(config.transmission.default_timeout_seconds, 30);
        assert_eq!(config.transmission.enabled_protocols.len(), 4);
        assert!(config.conversion.allow_empty_observations);
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transmission_ranges() {
        let mut config = TransmissionConfig::default();
        assert!(config.validate().is_ok());

        config.default_timeout_seconds = 0;
        assert!(config.validate().is_err());
        config.default_timeout_seconds = 301;
        assert!(config.validate().is_err());
        config.default_timeout_seconds = 300;
        assert!(config.validate().is_ok());

        config.max_retry_attempts = 0;
        assert!(config.validate().is_err());
        config.max_retry_attempts = 11;
        assert!(config.validate().is_err());
        config.max_retry_attempts = 10;

        config.retry_delay_seconds = 0;
        assert!(config.validate().is_ok());
        config.retry_delay_seconds = 301;
        assert!(config.validate().is_err());
        config.retry_delay_seconds = 5;

        config.max_message_size_bytes = 512;
        assert!(config.validate().is_err());
        config.max_message_size_bytes = MAX_MESSAGE_SIZE_BYTES + 1;
        assert!(config.validate().is_err());
        config.max_message_size_bytes = MAX_MESSAGE_SIZE_BYTES;

        config.max_concurrent_transmissions = 0;
        assert!(config.validate().is_err());
        config.max_concurrent_transmissions = 257;
        assert!(config.validate().is_err());
        config.max_concurrent_transmissions = 1;

        config.enabled_protocols.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_processing_id_validation() {
        let mut config = ConversionConfig::default();
        config.processing_id = "T".to_string();
        assert!(config.validate().is_ok());
        config.processing_id = "X".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_auth_validation() {
        let mut config = HttpConfig {
            password: Some(secret_string("pw".to_string())),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.username = Some("user".to_string());
        assert!(config.validate().is_ok());

        config.bearer_token = Some(secret_string("token".to_string()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_audit_validation() {
        let mut config = AuditConfig::default();
        assert!(config.validate().is_ok());

        config.retention_days = 0;
        assert!(config.validate().is_err());
        config.retention_days = 3651;
        assert!(config.validate().is_err());

        config.retention_days = 30;
        config.backend = AuditBackend::File;
        config.path = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mapping_options_follow_conversion_section() {
        let config = ConversionConfig {
            default_sending_facility: "LAB".to_string(),
            observation_grouping: ObservationGrouping::OrderPerObservation,
            ..Default::default()
        };
        let options = config.mapping_options();
        assert_eq!(options.default_sending_facility, "LAB");
        assert_eq!(options.grouping, ObservationGrouping::OrderPerObservation);
        assert_eq!(options.version, "2.5");
    }

    #[test]
    fn test_parse_from_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
[transmission]
max_retry_attempts = 5
enabled_protocols = ["mllp", "file"]

[audit]
backend = "file"
path = "/tmp/audit.jsonl"
"#,
        )
        .unwrap();
        assert_eq!(config.transmission.max_retry_attempts, 5);
        assert_eq!(
            config.transmission.enabled_protocols,
            vec![TransmissionProtocol::Mllp, TransmissionProtocol::File]
        );
        assert_eq!(config.audit.backend, AuditBackend::File);
        assert_eq!(config.application.log_level, "info");
    }
}
