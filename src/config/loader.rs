//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AuditBackend, GatewayConfig};
use super::secret::secret_string;
use crate::domain::{GatewayError, Result, TransmissionProtocol};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "HL7_GATEWAY_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into GatewayConfig
/// 4. Applies environment variable overrides (HL7_GATEWAY_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`GatewayError::Configuration`] if the file cannot be read or
/// parsed, a referenced variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use hl7_gateway::config::loader::load_config;
///
/// let config = load_config("hl7-gateway.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GatewayError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        GatewayError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`] for TOML text already in memory
pub fn load_config_from_str(contents: &str) -> Result<GatewayConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: GatewayConfig = toml::from_str(&contents)
        .map_err(|e| GatewayError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        GatewayError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Loads the file if given, otherwise defaults plus environment overrides
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig> {
    match path {
        Some(path) => load_config(path),
        None => load_config_from_str(""),
    }
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| GatewayError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(GatewayError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env(key) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            GatewayError::Configuration(format!("Invalid value '{raw}' for {ENV_PREFIX}{key}"))
        }),
        None => Ok(None),
    }
}

/// Applies environment variable overrides using the HL7_GATEWAY_* prefix
///
/// Variables follow the pattern `HL7_GATEWAY_<SECTION>_<KEY>`, for example
/// `HL7_GATEWAY_TRANSMISSION_MAX_RETRY_ATTEMPTS`.
fn apply_env_overrides(config: &mut GatewayConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Conversion overrides
    let conversion = &mut config.conversion;
    if let Some(val) = env("CONVERSION_SENDING_APPLICATION") {
        conversion.sending_application = val;
    }
    if let Some(val) = env("CONVERSION_RECEIVING_APPLICATION") {
        conversion.receiving_application = val;
    }
    if let Some(val) = env("CONVERSION_DEFAULT_SENDING_FACILITY") {
        conversion.default_sending_facility = val;
    }
    if let Some(val) = env("CONVERSION_DEFAULT_RECEIVING_FACILITY") {
        conversion.default_receiving_facility = val;
    }
    if let Some(val) = env("CONVERSION_PROCESSING_ID") {
        conversion.processing_id = val;
    }
    if let Some(val) = env_parse("CONVERSION_ALLOW_EMPTY_OBSERVATIONS")? {
        conversion.allow_empty_observations = val;
    }

    // Transmission overrides
    let transmission = &mut config.transmission;
    if let Some(val) = env_parse("TRANSMISSION_DEFAULT_TIMEOUT_SECONDS")? {
        transmission.default_timeout_seconds = val;
    }
    if let Some(val) = env_parse("TRANSMISSION_MAX_RETRY_ATTEMPTS")? {
        transmission.max_retry_attempts = val;
    }
    if let Some(val) = env_parse("TRANSMISSION_RETRY_DELAY_SECONDS")? {
        transmission.retry_delay_seconds = val;
    }
    if let Some(val) = env_parse("TRANSMISSION_MAX_MESSAGE_SIZE_BYTES")? {
        transmission.max_message_size_bytes = val;
    }
    if let Some(val) = env_parse("TRANSMISSION_MAX_CONCURRENT_TRANSMISSIONS")? {
        transmission.max_concurrent_transmissions = val;
    }
    if let Some(val) = env_parse("TRANSMISSION_RETRY_ON_TIMEOUT")? {
        transmission.retry_on_timeout = val;
    }
    if let Some(val) = env("TRANSMISSION_ENABLED_PROTOCOLS") {
        transmission.enabled_protocols = val
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(TransmissionProtocol::from_str)
            .collect::<std::result::Result<_, _>>()
            .map_err(GatewayError::Configuration)?;
    }
    if let Some(val) = env_parse("TRANSMISSION_HTTP_TLS_VERIFY")? {
        transmission.http.tls_verify = val;
    }
    if let Some(val) = env("TRANSMISSION_HTTP_USERNAME") {
        transmission.http.username = Some(val);
    }
    if let Some(val) = env("TRANSMISSION_HTTP_PASSWORD") {
        transmission.http.password = Some(secret_string(val));
    }
    if let Some(val) = env("TRANSMISSION_HTTP_BEARER_TOKEN") {
        transmission.http.bearer_token = Some(secret_string(val));
    }

    // Audit overrides
    if let Some(val) = env_parse("AUDIT_ENABLED")? {
        config.audit.enabled = val;
    }
    if let Some(val) = env("AUDIT_BACKEND") {
        config.audit.backend = match val.to_lowercase().as_str() {
            "memory" => AuditBackend::Memory,
            "file" => AuditBackend::File,
            other => {
                return Err(GatewayError::Configuration(format!(
                    "Invalid audit backend '{other}'. Must be one of: memory, file"
                )))
            }
        };
    }
    if let Some(val) = env("AUDIT_PATH") {
        config.audit.path = val;
    }
    if let Some(val) = env_parse("AUDIT_RETENTION_DAYS")? {
        config.audit.retention_days = val;
    }

    // Logging overrides
    if let Some(val) = env_parse("LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
