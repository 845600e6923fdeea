//! Test connection command implementation

use super::load_command_config;
use crate::adapters::transport::TransmissionProviderFactory;
use crate::cli::{EXIT_CONFIG, EXIT_FAILURE, EXIT_OK};
use crate::domain::TransmissionProtocol;
use clap::Args;
use std::str::FromStr;

/// Arguments for the test-connection command
#[derive(Args, Debug)]
pub struct TestConnectionArgs {
    /// Destination to check
    #[arg(short, long)]
    pub endpoint: String,

    /// Transmission protocol (http, https, mllp, file)
    #[arg(short, long, value_parser = TransmissionProtocol::from_str)]
    pub protocol: TransmissionProtocol,
}

impl TestConnectionArgs {
    /// Execute the test-connection command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };

        println!(
            "🔌 Testing {} connection to {}",
            self.protocol, self.endpoint
        );

        let factory = match TransmissionProviderFactory::from_config(&config.transmission) {
            Ok(factory) => factory,
            Err(e) => {
                println!("❌ Failed to initialize providers");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let provider = match factory.create_provider(self.protocol) {
            Ok(provider) => provider,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_FAILURE);
            }
        };

        if !provider.validate_endpoint(&self.endpoint).await {
            println!(
                "❌ Endpoint is not valid for {}: {}",
                self.protocol, self.endpoint
            );
            return Ok(EXIT_FAILURE);
        }

        if provider.test_connection(&self.endpoint).await {
            println!("✅ Connection successful ({})", provider.name());
            Ok(EXIT_OK)
        } else {
            println!("❌ Connection failed");
            Ok(EXIT_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connection_to_writable_directory() {
        let _guard = crate::config::env_lock();
        let dir = TempDir::new().unwrap();
        let args = TestConnectionArgs {
            endpoint: dir.path().display().to_string(),
            protocol: TransmissionProtocol::File,
        };
        assert_eq!(
            args.execute(crate::cli::DEFAULT_CONFIG_PATH).await.unwrap(),
            EXIT_OK
        );
    }

    #[tokio::test]
    async fn test_connection_rejects_malformed_endpoint() {
        let _guard = crate::config::env_lock();
        let args = TestConnectionArgs {
            endpoint: "no-port-here".to_string(),
            protocol: TransmissionProtocol::Mllp,
        };
        assert_eq!(
            args.execute(crate::cli::DEFAULT_CONFIG_PATH).await.unwrap(),
            EXIT_FAILURE
        );
    }
}
