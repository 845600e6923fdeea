//! Gateway facade
//!
//! Wires the converter, provider factory, orchestrator and audit repository
//! from one [`GatewayConfig`].

use super::converter::{ConversionResult, Converter};
use super::transmission::TransmissionOrchestrator;
use crate::adapters::audit::{create_audit_repository, SharedAuditRepository};
use crate::adapters::transport::TransmissionProviderFactory;
use crate::config::GatewayConfig;
use crate::domain::{JsonInput, Result, TransmissionProtocol, TransmissionRequest, TransmissionResult};
use serde::Serialize;
use tokio::sync::watch;

/// Conversion outcome plus, when conversion succeeded, the delivery outcome
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub conversion: ConversionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<TransmissionResult>,
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        self.conversion.success && self.transmission.as_ref().is_some_and(|t| t.success)
    }
}

pub struct Gateway {
    config: GatewayConfig,
    converter: Converter,
    orchestrator: TransmissionOrchestrator,
    audit: Option<SharedAuditRepository>,
}

impl Gateway {
    /// Create a gateway from validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a provider cannot
    /// be built or the audit backend cannot be opened.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use hl7_gateway::config::GatewayConfig;
    /// use hl7_gateway::core::Gateway;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    /// let gateway = Gateway::from_config(GatewayConfig::default(), shutdown_rx).await?;
    /// println!("{:?}", gateway.orchestrator().factory().supported_protocols());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_config(
        config: GatewayConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(crate::domain::GatewayError::Configuration)?;

        let converter = Converter::from_config(&config.conversion);
        let factory = TransmissionProviderFactory::from_config(&config.transmission)?;
        let audit = create_audit_repository(&config.audit).await?;
        let orchestrator =
            TransmissionOrchestrator::new(&config.transmission, factory, audit.clone())
                .with_shutdown(shutdown);

        Ok(Self {
            config,
            converter,
            orchestrator,
            audit,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn orchestrator(&self) -> &TransmissionOrchestrator {
        &self.orchestrator
    }

    pub fn audit(&self) -> Option<&SharedAuditRepository> {
        self.audit.as_ref()
    }

    /// Builds a request carrying the configured default timeout
    pub fn request(
        &self,
        endpoint: impl Into<String>,
        message: impl Into<String>,
        protocol: TransmissionProtocol,
    ) -> TransmissionRequest {
        TransmissionRequest::new(endpoint, message, protocol)
            .with_timeout_seconds(self.config.transmission.default_timeout_seconds)
    }

    /// Sends ER7 text that is already built
    pub async fn send_message(
        &self,
        endpoint: &str,
        message: &str,
        protocol: TransmissionProtocol,
    ) -> TransmissionResult {
        let request = self.request(endpoint, message, protocol);
        self.orchestrator.transmit(&request).await
    }

    /// Converts the input and, if that succeeds, delivers it
    pub async fn convert_and_send(
        &self,
        input: &JsonInput,
        endpoint: &str,
        protocol: TransmissionProtocol,
    ) -> DeliveryReport {
        let conversion = self.converter.convert(input);
        let transmission = match conversion.hl7.as_deref() {
            Some(hl7) if conversion.success => {
                Some(self.send_message(endpoint, hl7, protocol).await)
            }
            _ => None,
        };

        DeliveryReport {
            conversion,
            transmission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, Patient};
    use tempfile::TempDir;

    fn input() -> JsonInput {
        JsonInput::new(
            Patient::new("P12345", "John", "Doe"),
            vec![Observation::new("GLU", "Glucose", "95")],
        )
    }

    async fn gateway() -> Gateway {
        let (_tx, rx) = watch::channel(false);
        Gateway::from_config(GatewayConfig::default(), rx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_convert_and_send_to_file_drop() {
        let gateway = gateway().await;
        let dir = TempDir::new().unwrap();

        let report = gateway
            .convert_and_send(&input(), dir.path().to_str().unwrap(), TransmissionProtocol::File)
            .await;

        assert!(report.is_success());
        let audit = gateway.audit().unwrap();
        let stats = audit
            .get_statistics(&crate::adapters::audit::StatisticsPeriod::all())
            .await
            .unwrap();
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_conversion_failure_skips_transmission() {
        let gateway = gateway().await;
        let report = gateway
            .convert_and_send(&JsonInput::default(), "/tmp/unused", TransmissionProtocol::File)
            .await;

        assert!(!report.is_success());
        assert!(report.transmission.is_none());
    }

    #[tokio::test]
    async fn test_request_uses_configured_timeout() {
        let (_tx, rx) = watch::channel(false);
        let mut config = GatewayConfig::default();
        config.transmission.default_timeout_seconds = 7;
        let gateway = Gateway::from_config(config, rx).await.unwrap();

        let request = gateway.request("/tmp", "MSH|^~\\&|A", TransmissionProtocol::File);
        assert_eq!(request.timeout_seconds(), 7);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let (_tx, rx) = watch::channel(false);
        let mut config = GatewayConfig::default();
        config.transmission.max_retry_attempts = 0;
        assert!(Gateway::from_config(config, rx).await.is_err());
    }
}
