//! Result type alias for the gateway
//!
//! This module provides a convenient Result type alias that uses GatewayError
//! as the error type.

use super::errors::GatewayError;

/// Result type alias for gateway operations
///
/// # Examples
///
/// ```
/// use hl7_gateway::domain::result::Result;
/// use hl7_gateway::domain::errors::GatewayError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(GatewayError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, GatewayError>;
