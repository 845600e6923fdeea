//! Send command implementation
//!
//! Delivers one message through the orchestrator. JSON input is converted
//! first; input that already starts with an MSH segment is sent as is.

use super::{load_command_config, read_input};
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use crate::core::Gateway;
use crate::domain::TransmissionProtocol;
use clap::Args;
use std::str::FromStr;
use tokio::sync::watch;

/// Arguments for the send command
#[derive(Args, Debug)]
pub struct SendArgs {
    /// JSON input or HL7 v2 message file (`-` for stdin)
    pub input: String,

    /// Destination (URL, host:port or directory, depending on protocol)
    #[arg(short, long)]
    pub endpoint: String,

    /// Transmission protocol (http, https, mllp, file)
    #[arg(short, long, value_parser = TransmissionProtocol::from_str)]
    pub protocol: TransmissionProtocol,

    /// Extra header as NAME=VALUE (repeatable, HTTP only)
    #[arg(long = "header", value_name = "NAME=VALUE")]
    pub header: Vec<String>,

    /// Per-attempt timeout in seconds (overrides configuration)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout: Option<u64>,
}

impl SendArgs {
    /// Execute the send command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };

        let headers = match parse_headers(&self.header) {
            Ok(headers) => headers,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_FAILURE);
            }
        };

        let gateway = match Gateway::from_config(config, shutdown).await {
            Ok(gateway) => gateway,
            Err(e) => {
                println!("❌ Failed to initialize gateway");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let raw = read_input(&self.input).await?;
        let message = if looks_like_er7(&raw) {
            raw.trim_end().replace("\r\n", "\r").replace('\n', "\r")
        } else {
            let conversion = gateway.converter().convert_json(&raw);
            match conversion.hl7 {
                Some(hl7) if conversion.success => hl7,
                _ => {
                    println!(
                        "❌ Conversion failed: {}",
                        conversion.error_message.as_deref().unwrap_or("unknown error")
                    );
                    for error in &conversion.errors {
                        println!("   - {error}");
                    }
                    return Ok(EXIT_FAILURE);
                }
            }
        };

        let mut request = gateway.request(&self.endpoint, message, self.protocol);
        for (name, value) in headers {
            request = request.with_header(name, value);
        }
        if let Some(timeout) = self.timeout {
            request = request.with_timeout_seconds(timeout);
        }

        let result = gateway.orchestrator().transmit(&request).await;
        println!("{}", serde_json::to_string_pretty(&result)?);

        if result.success {
            println!(
                "✅ Delivered to {} in {} attempt(s)",
                self.endpoint, result.attempts
            );
            Ok(EXIT_OK)
        } else {
            println!(
                "❌ {}",
                result.error_message.as_deref().unwrap_or("Transmission failed")
            );
            Ok(EXIT_FAILURE)
        }
    }
}

fn looks_like_er7(raw: &str) -> bool {
    raw.trim_start().starts_with("MSH")
}

/// Splits `NAME=VALUE` pairs
fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(format!("Invalid header '{pair}', expected NAME=VALUE")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&["X-Trace = abc".to_string(), "A=b=c".to_string()]).unwrap();
        assert_eq!(
            headers,
            vec![
                ("X-Trace".to_string(), "abc".to_string()),
                ("A".to_string(), "b=c".to_string())
            ]
        );
        assert!(parse_headers(&["novalue".to_string()]).is_err());
        assert!(parse_headers(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_looks_like_er7() {
        assert!(looks_like_er7("MSH|^~\\&|A"));
        assert!(looks_like_er7("\n MSH|^~\\&|A"));
        assert!(!looks_like_er7("{\"patient\": {}}"));
    }

    #[tokio::test]
    async fn test_send_json_to_file_endpoint() {
        let _guard = crate::config::env_lock();
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.json");
        let outbox = dir.path().join("outbox");
        std::fs::write(
            &input,
            r#"{
                "patient": {"patientId": "P12345", "firstName": "John", "lastName": "Doe"},
                "observations": [{"observationId": "GLU", "description": "Glucose", "value": "95"}],
                "messageInfo": {"messageControlId": "CTRL-7"}
            }"#,
        )
        .unwrap();

        let args = SendArgs {
            input: input.display().to_string(),
            endpoint: outbox.display().to_string(),
            protocol: TransmissionProtocol::File,
            header: Vec::new(),
            timeout: Some(5),
        };
        let (_tx, rx) = watch::channel(false);
        let code = args.execute(crate::cli::DEFAULT_CONFIG_PATH, rx).await.unwrap();

        assert_eq!(code, EXIT_OK);
        let written = std::fs::read_to_string(outbox.join("CTRL-7.hl7")).unwrap();
        assert!(written.starts_with("MSH|"));
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_input_before_transmitting() {
        let _guard = crate::config::env_lock();
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.json");
        let outbox = dir.path().join("outbox");
        std::fs::write(&input, r#"{"observations": []}"#).unwrap();

        let args = SendArgs {
            input: input.display().to_string(),
            endpoint: outbox.display().to_string(),
            protocol: TransmissionProtocol::File,
            header: Vec::new(),
            timeout: None,
        };
        let (_tx, rx) = watch::channel(false);
        let code = args.execute(crate::cli::DEFAULT_CONFIG_PATH, rx).await.unwrap();

        assert_eq!(code, EXIT_FAILURE);
        assert!(!outbox.exists());
    }
}
