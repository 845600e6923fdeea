//! Domain identifier types with validation
//!
//! Newtype wrappers keep transmission ids and message control ids from being
//! mixed up with each other or with free-form strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Transmission identifier newtype wrapper
///
/// Assigned once when a `TransmissionRequest` is built and used as the
/// correlation key for audit lookups.
///
/// # Examples
///
/// ```
/// use hl7_gateway::domain::ids::TransmissionId;
/// use std::str::FromStr;
///
/// let id = TransmissionId::from_str("5f0c7a2e-8d1b-4c3e-9a6f-2b7d4e1c0a9b").unwrap();
/// assert_eq!(id.as_str(), "5f0c7a2e-8d1b-4c3e-9a6f-2b7d4e1c0a9b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransmissionId(String);

impl TransmissionId {
    /// Generates a new random transmission id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a TransmissionId from an existing string
    ///
    /// # Returns
    ///
    /// Returns `Ok(TransmissionId)` if the ID is non-empty, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Transmission ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TransmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransmissionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TransmissionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// HL7 message control id (MSH-10)
///
/// At most 20 characters per HL7 v2.5 and free of segment terminators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageControlId(String);

impl MessageControlId {
    /// Maximum length of MSH-10 in HL7 v2.5
    pub const MAX_LEN: usize = 20;

    /// Generates a new control id from a UUID, truncated to the HL7 limit
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(simple[..Self::MAX_LEN].to_string())
    }

    /// Creates a MessageControlId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Message control ID cannot be empty".to_string());
        }
        if id.len() > Self::MAX_LEN {
            return Err(format!(
                "Message control ID must be at most {} characters, got {}",
                Self::MAX_LEN,
                id.len()
            ));
        }
        if id.contains(['\r', '\n']) {
            return Err("Message control ID cannot contain line breaks".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageControlId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmission_id_generate_is_unique() {
        let a = TransmissionId::generate();
        let b = TransmissionId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_transmission_id_empty() {
        assert!(TransmissionId::new("").is_err());
        assert!(TransmissionId::new("   ").is_err());
    }

    #[test]
    fn test_transmission_id_display() {
        let id = TransmissionId::new("tx-1").unwrap();
        assert_eq!(format!("{id}"), "tx-1");
        assert_eq!(id.into_inner(), "tx-1");
    }

    #[test]
    fn test_control_id_generate_length() {
        let id = MessageControlId::generate();
        assert_eq!(id.as_str().len(), MessageControlId::MAX_LEN);
    }

    #[test]
    fn test_control_id_validation() {
        assert!(MessageControlId::new("MSG00001").is_ok());
        assert!(MessageControlId::new("").is_err());
        assert!(MessageControlId::new("A".repeat(21)).is_err());
        assert!(MessageControlId::new("MSG\r1").is_err());
    }
}
