//! JSON to HL7 conversion
//!
//! [`Converter`] runs validation, mapping and encoding as one operation.
//! Failures come back as values; nothing is half-built.

use super::validation::{InputValidator, ValidationResult};
use crate::config::ConversionConfig;
use crate::domain::{GatewayError, JsonInput, Result};
use crate::hl7::{DecodedMessage, Hl7Message, MessageMapper};
use serde::Serialize;

/// Outcome of one conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub success: bool,

    /// Parsed message structure, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Hl7Message>,

    /// ER7 wire text, present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hl7: Option<String>,

    /// Summary of what went wrong, present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Individual validation errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ConversionResult {
    fn converted(message: Hl7Message) -> Self {
        let hl7 = message.encode();
        Self {
            success: true,
            message: Some(message),
            hl7: Some(hl7),
            error_message: None,
            errors: Vec::new(),
        }
    }

    fn failed(error: &GatewayError) -> Self {
        let errors = match error {
            GatewayError::Validation(errors) => errors.clone(),
            _ => Vec::new(),
        };
        Self {
            success: false,
            message: None,
            hl7: None,
            error_message: Some(error.to_string()),
            errors,
        }
    }

    /// Converts into a `Result` over the wire text
    pub fn into_result(self) -> Result<String> {
        match (self.success, self.hl7) {
            (true, Some(hl7)) => Ok(hl7),
            _ if !self.errors.is_empty() => Err(GatewayError::Validation(self.errors)),
            _ => Err(GatewayError::Other(
                self.error_message
                    .unwrap_or_else(|| "Conversion failed".to_string()),
            )),
        }
    }
}

/// Validator, mapper and codec behind one call
#[derive(Debug, Clone, Default)]
pub struct Converter {
    validator: InputValidator,
    mapper: MessageMapper,
}

impl Converter {
    pub fn new(validator: InputValidator, mapper: MessageMapper) -> Self {
        Self { validator, mapper }
    }

    /// Builds a converter from the `[conversion]` section
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(
            InputValidator::new(config.allow_empty_observations),
            MessageMapper::new(config.mapping_options()),
        )
    }

    pub fn mapper(&self) -> &MessageMapper {
        &self.mapper
    }

    /// Validates the input without converting it
    pub fn validate(&self, input: &JsonInput) -> ValidationResult {
        self.validator.validate(input)
    }

    /// Converts the input to a message and its wire text
    ///
    /// # Examples
    ///
    /// ```
    /// use hl7_gateway::core::converter::Converter;
    /// use hl7_gateway::domain::{JsonInput, Observation, Patient};
    ///
    /// let input = JsonInput::new(
    ///     Patient::new("P12345", "John", "Doe"),
    ///     vec![Observation::new("GLU", "Glucose", "95").with_units("mg/dL")],
    /// );
    /// let result = Converter::default().convert(&input);
    /// assert!(result.success);
    /// assert!(result.hl7.unwrap().contains("DOE^JOHN"));
    /// ```
    pub fn convert(&self, input: &JsonInput) -> ConversionResult {
        match self.build(input) {
            Ok(message) => {
                tracing::debug!(
                    control_id = %message.control_id(),
                    segments = message.segments().len(),
                    "Converted input to HL7"
                );
                ConversionResult::converted(message)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Conversion failed");
                ConversionResult::failed(&e)
            }
        }
    }

    /// Converts the input straight to wire text
    pub fn convert_to_string(&self, input: &JsonInput) -> Result<String> {
        Ok(self.build(input)?.encode())
    }

    /// Parses raw JSON text and converts it
    ///
    /// Malformed JSON is reported as a failed result, not an error.
    pub fn convert_json(&self, json: &str) -> ConversionResult {
        match serde_json::from_str::<JsonInput>(json) {
            Ok(input) => self.convert(&input),
            Err(e) => ConversionResult::failed(&GatewayError::Serialization(format!(
                "Invalid JSON input: {e}"
            ))),
        }
    }

    /// Parses wire text back into the input model
    pub fn parse(&self, wire: &str) -> Result<DecodedMessage> {
        let message = Hl7Message::parse(wire)?;
        Ok(self.mapper.from_message(&message)?)
    }

    fn build(&self, input: &JsonInput) -> Result<Hl7Message> {
        self.validator.validate(input).into_result()?;
        Ok(self.mapper.to_message(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, Patient};

    fn input() -> JsonInput {
        JsonInput::new(
            Patient::new("P12345", "John", "Doe").with_gender("M"),
            vec![Observation::new("GLU", "Glucose", "95").with_units("mg/dL")],
        )
    }

    #[test]
    fn test_convert_success_has_both_outputs() {
        let result = Converter::default().convert(&input());
        assert!(result.success);
        let message = result.message.as_ref().unwrap();
        assert_eq!(result.hl7.as_deref(), Some(message.encode().as_str()));
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_convert_validation_failure_has_no_output() {
        let mut bad = input();
        bad.patient.as_mut().unwrap().last_name.clear();

        let result = Converter::default().convert(&bad);
        assert!(!result.success);
        assert!(result.hl7.is_none());
        assert!(result.message.is_none());
        assert_eq!(result.errors, ["patient.lastName is required"]);
        assert!(result
            .error_message
            .unwrap()
            .contains("patient.lastName is required"));
    }

    #[test]
    fn test_convert_to_string_propagates_validation_error() {
        let err = Converter::default()
            .convert_to_string(&JsonInput::default())
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref e) if e.len() == 2));
    }

    #[test]
    fn test_convert_json_reports_parse_error() {
        let result = Converter::default().convert_json("{not json");
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("Invalid JSON input"));
    }

    #[test]
    fn test_convert_json_success() {
        let json = r#"{"patient":{"patientId":"P1","firstName":"Ann","lastName":"Lee"},"observations":[]}"#;
        let result = Converter::default().convert_json(json);
        assert!(result.success);
        assert!(!result.hl7.unwrap().contains("OBX"));
    }

    #[test]
    fn test_parse_round_trip() {
        let converter = Converter::default();
        let wire = converter.convert_to_string(&input()).unwrap();
        let decoded = converter.parse(&wire).unwrap();
        assert_eq!(decoded.input.patient.unwrap().patient_id, "P12345");
        assert_eq!(decoded.input.observations.unwrap()[0].value, "95");
    }

    #[test]
    fn test_parse_rejects_non_hl7() {
        assert!(matches!(
            Converter::default().parse("hello"),
            Err(GatewayError::Mapping(_))
        ));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = Converter::default().convert(&JsonInput::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("errorMessage").is_some());
        assert!(json.get("hl7").is_none());
    }
}
