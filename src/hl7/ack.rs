//! HL7 acknowledgement (ACK) messages

use super::datetime;
use super::message::{Field, Hl7Message, Segment};
use crate::domain::{MappingError, MessageControlId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MSA-1 acknowledgement code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckCode {
    /// AA
    ApplicationAccept,
    /// AE
    ApplicationError,
    /// AR
    ApplicationReject,
    /// CA
    CommitAccept,
    /// CE
    CommitError,
    /// CR
    CommitReject,
}

impl AckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationAccept => "AA",
            Self::ApplicationError => "AE",
            Self::ApplicationReject => "AR",
            Self::CommitAccept => "CA",
            Self::CommitError => "CE",
            Self::CommitReject => "CR",
        }
    }

    /// True for AA and CA
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::ApplicationAccept | Self::CommitAccept)
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AckCode {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AA" => Ok(Self::ApplicationAccept),
            "AE" => Ok(Self::ApplicationError),
            "AR" => Ok(Self::ApplicationReject),
            "CA" => Ok(Self::CommitAccept),
            "CE" => Ok(Self::CommitError),
            "CR" => Ok(Self::CommitReject),
            other => Err(MappingError::InvalidField {
                field: "MSA-1".to_string(),
                message: format!("unknown acknowledgment code '{other}'"),
            }),
        }
    }
}

/// A parsed acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub code: AckCode,
    /// MSA-2, control id of the acknowledged message
    pub control_id: String,
    /// MSA-3 text message, if any
    pub text: Option<String>,
}

impl Acknowledgment {
    /// Parses an ACK from ER7 text (MLLP framing bytes are tolerated)
    ///
    /// # Errors
    ///
    /// Fails if the text is not a valid message, has no MSA segment or
    /// MSA-1 is not a known code.
    pub fn parse(raw: &str) -> Result<Self, MappingError> {
        let message = Hl7Message::parse(raw)?;
        let msa = message
            .segment("MSA")
            .ok_or_else(|| MappingError::InvalidSegment("acknowledgment has no MSA segment".into()))?;

        Ok(Self {
            code: msa.value(1).parse()?,
            control_id: msa.value(2).to_string(),
            text: msa.value_opt(3),
        })
    }

    pub fn is_positive(&self) -> bool {
        self.code.is_positive()
    }

    /// Human-readable summary, e.g. `AE: Unknown patient`
    pub fn summary(&self) -> String {
        match &self.text {
            Some(text) => format!("{}: {text}", self.code),
            None => self.code.to_string(),
        }
    }

    /// Builds an ACK answering `original`, with sender and receiver swapped
    pub fn respond_to(
        original: &Hl7Message,
        code: AckCode,
        text: Option<&str>,
    ) -> Result<Hl7Message, MappingError> {
        let header = original.header();
        let delimiters = original.delimiters;
        let field = |n: usize| header.field(n).cloned().unwrap_or_default();

        let msh = Segment::new("MSH")
            .with_field(1, Field::text(delimiters.field.to_string()))
            .with_field(2, Field::text(delimiters.encoding_characters()))
            .with_field(3, field(5))
            .with_field(4, field(6))
            .with_field(5, field(3))
            .with_field(6, field(4))
            .with_field(7, Field::text(datetime::now_hl7()))
            .with_field(9, Field::components(["ACK", header.field(9).map_or("", |f| f.component(2)), "ACK"]))
            .with_field(10, Field::text(MessageControlId::generate().to_string()))
            .with_field(11, field(11))
            .with_field(12, field(12));

        let msa = Segment::new("MSA")
            .with_field(1, Field::text(code.as_str()))
            .with_field(2, Field::text(original.control_id()))
            .with_field(3, Field::text(text.unwrap_or_default()));

        Hl7Message::new(delimiters, vec![msh, msa])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "MSH|^~\\&|LIS|LAB|EHR|HOSP|20240115083000||ORU^R01^ORU_R01|MSG001|P|2.5";

    #[test]
    fn test_parse_positive_ack() {
        let ack = Acknowledgment::parse(
            "MSH|^~\\&|EHR|HOSP|LIS|LAB|20240115083001||ACK^R01^ACK|A1|P|2.5\rMSA|AA|MSG001",
        )
        .unwrap();
        assert_eq!(ack.code, AckCode::ApplicationAccept);
        assert_eq!(ack.control_id, "MSG001");
        assert!(ack.is_positive());
        assert_eq!(ack.summary(), "AA");
    }

    #[test]
    fn test_parse_negative_ack_with_text() {
        let ack = Acknowledgment::parse(
            "MSH|^~\\&|EHR|HOSP|LIS|LAB|20240115083001||ACK|A1|P|2.5\rMSA|AE|MSG001|Unknown patient",
        )
        .unwrap();
        assert!(!ack.is_positive());
        assert_eq!(ack.summary(), "AE: Unknown patient");
    }

    #[test]
    fn test_parse_without_msa_fails() {
        assert!(matches!(
            Acknowledgment::parse(ORIGINAL),
            Err(MappingError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_parse_unknown_code_fails() {
        let result = Acknowledgment::parse(&format!("{ORIGINAL}\rMSA|ZZ|MSG001"));
        assert!(matches!(result, Err(MappingError::InvalidField { .. })));
    }

    #[test]
    fn test_respond_to_swaps_parties() {
        let original = Hl7Message::parse(ORIGINAL).unwrap();
        let ack = Acknowledgment::respond_to(&original, AckCode::ApplicationAccept, None).unwrap();
        let msh = ack.header();
        assert_eq!(msh.value(3), "EHR");
        assert_eq!(msh.value(5), "LIS");
        assert_eq!(ack.message_type(), "ACK^R01");

        let parsed = Acknowledgment::parse(&ack.encode()).unwrap();
        assert_eq!(parsed.control_id, "MSG001");
        assert!(parsed.is_positive());
    }

    #[test]
    fn test_code_is_positive() {
        assert!(AckCode::CommitAccept.is_positive());
        assert!(!AckCode::CommitReject.is_positive());
        assert_eq!("ar".parse::<AckCode>().unwrap(), AckCode::ApplicationReject);
    }
}
