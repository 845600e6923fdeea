//! Transmission provider registry
//!
//! Maps each protocol to the provider that serves it. Registration happens
//! once at startup; the factory holds no request-scoped state.

use super::file::FileProvider;
use super::http::HttpProvider;
use super::mllp::MllpProvider;
use super::traits::SharedProvider;
use crate::config::TransmissionConfig;
use crate::domain::{GatewayError, Result, TransmissionProtocol};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Registry of providers keyed by protocol
#[derive(Clone, Default)]
pub struct TransmissionProviderFactory {
    providers: BTreeMap<TransmissionProtocol, SharedProvider>,
}

impl TransmissionProviderFactory {
    /// Creates an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a factory holding a provider for every enabled protocol
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn from_config(config: &TransmissionConfig) -> Result<Self> {
        let mut factory = Self::new();
        for protocol in &config.enabled_protocols {
            let provider = create_transmission_provider(*protocol, config)?;
            factory.register(provider);
        }

        tracing::info!(
            protocols = ?factory.supported_protocols(),
            "Registered transmission providers"
        );
        Ok(factory)
    }

    /// Adds or replaces the provider for its protocol
    pub fn register(&mut self, provider: SharedProvider) {
        self.providers.insert(provider.protocol(), provider);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_provider(mut self, provider: SharedProvider) -> Self {
        self.register(provider);
        self
    }

    /// Returns the provider for `protocol`
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedProtocol`] if none is registered.
    pub fn create_provider(&self, protocol: TransmissionProtocol) -> Result<SharedProvider> {
        self.providers
            .get(&protocol)
            .cloned()
            .ok_or_else(|| GatewayError::UnsupportedProtocol(protocol.to_string()))
    }

    pub fn supported_protocols(&self) -> BTreeSet<TransmissionProtocol> {
        self.providers.keys().copied().collect()
    }

    pub fn is_protocol_supported(&self, protocol: TransmissionProtocol) -> bool {
        self.providers.contains_key(&protocol)
    }

    pub fn provider_name(&self, protocol: TransmissionProtocol) -> Option<&'static str> {
        self.providers.get(&protocol).map(|provider| provider.name())
    }
}

/// Create the built-in provider for a protocol
///
/// # Errors
///
/// Returns an error if the provider cannot be constructed from the
/// configuration.
pub fn create_transmission_provider(
    protocol: TransmissionProtocol,
    config: &TransmissionConfig,
) -> Result<SharedProvider> {
    match protocol {
        TransmissionProtocol::Http | TransmissionProtocol::Https => {
            tracing::debug!(%protocol, "Creating HTTP provider");
            let provider = HttpProvider::new(protocol, config.http.clone())?;
            Ok(Arc::new(provider) as SharedProvider)
        }
        TransmissionProtocol::Mllp => Ok(Arc::new(MllpProvider::new()) as SharedProvider),
        TransmissionProtocol::File => Ok(Arc::new(FileProvider::new()) as SharedProvider),
    }
}
