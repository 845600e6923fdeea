//! Protocols command implementation

use super::load_command_config;
use crate::adapters::transport::TransmissionProviderFactory;
use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::domain::TransmissionProtocol;
use clap::Args;

/// Arguments for the protocols command
#[derive(Args, Debug)]
pub struct ProtocolsArgs {
    /// Print as a JSON array
    #[arg(long)]
    pub json: bool,
}

impl ProtocolsArgs {
    /// Execute the protocols command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let Some(config) = load_command_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };

        let factory = match TransmissionProviderFactory::from_config(&config.transmission) {
            Ok(factory) => factory,
            Err(e) => {
                println!("❌ Failed to initialize providers");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let supported = factory.supported_protocols();
        if self.json {
            println!("{}", serde_json::to_string(&supported)?);
            return Ok(EXIT_OK);
        }

        println!("Transmission Protocols:");
        for protocol in TransmissionProtocol::ALL {
            match factory.provider_name(protocol) {
                Some(name) => println!("  ✅ {protocol:<6} {name}"),
                None => println!("  ⏸️  {protocol:<6} disabled"),
            }
        }
        Ok(EXIT_OK)
    }
}
