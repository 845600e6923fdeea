//! HTTP and HTTPS provider
//!
//! POSTs the ER7 message as the request body. A 2xx answer is a success;
//! when the body is itself an HL7 ACK, a negative code turns the result into
//! a rejection carrying the NACK.

use super::traits::{measure, DeliveryFailure, TransmissionProvider};
use crate::config::{expose_non_empty, HttpConfig};
use crate::domain::{
    GatewayError, Result, TransmissionError, TransmissionProtocol, TransmissionRequest,
    TransmissionResult,
};
use crate::hl7::Acknowledgment;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Provider for `http://` and `https://` endpoints
pub struct HttpProvider {
    protocol: TransmissionProtocol,
    client: Client,
    config: HttpConfig,
}

impl HttpProvider {
    /// Creates a provider for [`TransmissionProtocol::Http`] or
    /// [`TransmissionProtocol::Https`]
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any other protocol or if the HTTP
    /// client cannot be built.
    pub fn new(protocol: TransmissionProtocol, config: HttpConfig) -> Result<Self> {
        if !matches!(
            protocol,
            TransmissionProtocol::Http | TransmissionProtocol::Https
        ) {
            return Err(GatewayError::Configuration(format!(
                "HttpProvider cannot serve protocol '{protocol}'"
            )));
        }

        let mut client_builder = ClientBuilder::new()
            .user_agent(config.user_agent.clone())
            .connect_timeout(CONNECT_TIMEOUT);

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for HTTPS transmissions");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            protocol,
            client,
            config,
        })
    }

    /// Build authorization header value
    fn auth_header_value(&self) -> Option<String> {
        if let Some(token) = expose_non_empty(&self.config.bearer_token) {
            Some(format!("Bearer {token}"))
        } else if let (Some(username), Some(password)) = (
            self.config.username.as_deref(),
            expose_non_empty(&self.config.password),
        ) {
            let credentials = format!("{username}:{password}");
            let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
            Some(format!("Basic {encoded}"))
        } else {
            None
        }
    }

    fn parse_endpoint(&self, endpoint: &str) -> std::result::Result<Url, TransmissionError> {
        let url = Url::parse(endpoint)
            .map_err(|e| TransmissionError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if url.scheme() != self.protocol.as_str() {
            return Err(TransmissionError::InvalidEndpoint(format!(
                "{endpoint}: expected a {}:// URL",
                self.protocol
            )));
        }
        if url.host_str().is_none() {
            return Err(TransmissionError::InvalidEndpoint(format!(
                "{endpoint}: missing host"
            )));
        }
        Ok(url)
    }

    async fn deliver(
        &self,
        request: &TransmissionRequest,
    ) -> std::result::Result<Option<String>, DeliveryFailure> {
        let url = self.parse_endpoint(request.endpoint())?;

        let mut builder = self
            .client
            .post(url)
            .timeout(request.timeout())
            .header(reqwest::header::CONTENT_TYPE, &self.config.content_type)
            .body(request.message().to_string());

        if let Some(auth) = self.auth_header_value() {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth);
        }
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransmissionError::Timeout(request.timeout_seconds())
            } else {
                TransmissionError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransmissionError::Transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(status_failure(status, body));
        }

        interpret_body(body)
    }
}

/// Maps a non-2xx status to a failure
///
/// Server-side and throttling statuses are transport failures (retryable);
/// other client errors mean the receiver refused the message.
fn status_failure(status: StatusCode, body: String) -> DeliveryFailure {
    let reason = format!("HTTP {status}");
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        TransmissionError::Transport(reason).into()
    } else if body.is_empty() {
        TransmissionError::Rejected(reason).into()
    } else {
        DeliveryFailure::rejected(reason, body)
    }
}

fn interpret_body(body: String) -> std::result::Result<Option<String>, DeliveryFailure> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    if body.trim_start_matches('\x0b').starts_with("MSH") {
        if let Ok(ack) = Acknowledgment::parse(&body) {
            if !ack.is_positive() {
                return Err(DeliveryFailure::rejected(ack.summary(), body));
            }
        }
    }
    Ok(Some(body))
}

#[async_trait]
impl TransmissionProvider for HttpProvider {
    fn protocol(&self) -> TransmissionProtocol {
        self.protocol
    }

    fn name(&self) -> &'static str {
        match self.protocol {
            TransmissionProtocol::Https => "HTTPS Provider",
            _ => "HTTP Provider",
        }
    }

    async fn send(&self, request: &TransmissionRequest) -> TransmissionResult {
        tracing::debug!(
            request_id = %request.request_id(),
            endpoint = %request.endpoint(),
            protocol = %self.protocol,
            "Posting HL7 message"
        );
        measure(self.deliver(request)).await
    }

    async fn validate_endpoint(&self, endpoint: &str) -> bool {
        self.parse_endpoint(endpoint).is_ok()
    }

    async fn test_connection(&self, endpoint: &str) -> bool {
        let Ok(url) = self.parse_endpoint(endpoint) else {
            return false;
        };
        // Any HTTP answer, including 404 or 405, proves the server is reachable
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => {
                tracing::debug!(endpoint, status = %response.status(), "Connection test answered");
                true
            }
            Err(e) => {
                tracing::debug!(endpoint, error = %e, "Connection test failed");
                false
            }
        }
    }
}
