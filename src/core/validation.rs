//! Input validation
//!
//! Checks a [`JsonInput`] for completeness and field formats before it is
//! mapped. Every rule is evaluated; the result carries all violations.

use crate::domain::{GatewayError, JsonInput, MessageControlId, Observation, Patient};
use crate::hl7::datetime;
use serde::{Deserialize, Serialize};

/// Administrative sex codes accepted in `patient.gender`
pub const GENDER_CODES: [&str; 4] = ["M", "F", "O", "U"];

/// Result status codes accepted in `observations[].status`
pub const STATUS_CODES: [&str; 4] = ["N", "A", "C", "P"];

/// HL7 value types accepted in `observations[].valueType`
pub const VALUE_TYPES: [&str; 6] = ["NM", "ST", "TX", "DT", "TM", "TS"];

/// Outcome of validating one input
///
/// A failed result always carries at least one error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Failure with a single error
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![error.into()],
        }
    }

    /// Success if `errors` is empty, failure otherwise
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Converts into a `Result`, failing with [`GatewayError::Validation`]
    pub fn into_result(self) -> crate::domain::Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(GatewayError::Validation(self.errors))
        }
    }
}

/// Flat rule-list validator for [`JsonInput`]
#[derive(Debug, Clone)]
pub struct InputValidator {
    allow_empty_observations: bool,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self {
            allow_empty_observations: true,
        }
    }
}

impl InputValidator {
    pub fn new(allow_empty_observations: bool) -> Self {
        Self {
            allow_empty_observations,
        }
    }

    pub fn allows_empty_observations(&self) -> bool {
        self.allow_empty_observations
    }

    /// Validates the input, collecting every violation
    ///
    /// # Examples
    ///
    /// ```
    /// use hl7_gateway::core::validation::InputValidator;
    /// use hl7_gateway::domain::{JsonInput, Patient};
    ///
    /// let input = JsonInput::new(Patient::new("P1", "", "Doe"), vec![]);
    /// let result = InputValidator::default().validate(&input);
    /// assert!(!result.is_valid());
    /// assert_eq!(result.errors(), ["patient.firstName is required"]);
    /// ```
    pub fn validate(&self, input: &JsonInput) -> ValidationResult {
        let mut errors = Vec::new();

        match &input.patient {
            Some(patient) => validate_patient(patient, &mut errors),
            None => errors.push("patient is required".to_string()),
        }

        match &input.observations {
            Some(observations) => {
                if observations.is_empty() && !self.allow_empty_observations {
                    errors.push("observations must contain at least one observation".to_string());
                }
                for (index, observation) in observations.iter().enumerate() {
                    validate_observation(index, observation, &mut errors);
                }
            }
            None => errors.push("observations is required".to_string()),
        }

        if let Some(info) = &input.message_info {
            if let Some(timestamp) = present(&info.timestamp) {
                if datetime::parse_timestamp(timestamp).is_none() {
                    errors.push(
                        "messageInfo.timestamp must be RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYYMMDDHHMMSS"
                            .to_string(),
                    );
                }
            }
            if let Some(control_id) = present(&info.message_control_id) {
                if let Err(e) = MessageControlId::new(control_id) {
                    errors.push(format!("messageInfo.messageControlId: {e}"));
                }
            }
        }

        ValidationResult::from_errors(errors)
    }
}

fn validate_patient(patient: &Patient, errors: &mut Vec<String>) {
    require("patient.patientId", &patient.patient_id, errors);
    require("patient.firstName", &patient.first_name, errors);
    require("patient.lastName", &patient.last_name, errors);

    if patient.patient_id.contains(['\r', '\n']) {
        errors.push("patient.patientId must not contain line breaks".to_string());
    }

    if let Some(dob) = present(&patient.date_of_birth) {
        if datetime::parse_date(dob).is_none() {
            errors.push(
                "patient.dateOfBirth must be a valid date (YYYY-MM-DD or YYYYMMDD)".to_string(),
            );
        }
    }

    if let Some(gender) = present(&patient.gender) {
        one_of("patient.gender", gender, &GENDER_CODES, errors);
    }
}

fn validate_observation(index: usize, observation: &Observation, errors: &mut Vec<String>) {
    let prefix = format!("observations[{index}]");
    require(&format!("{prefix}.observationId"), &observation.observation_id, errors);
    require(&format!("{prefix}.description"), &observation.description, errors);
    require(&format!("{prefix}.value"), &observation.value, errors);

    if let Some(status) = present(&observation.status) {
        one_of(&format!("{prefix}.status"), status, &STATUS_CODES, errors);
    }
    if let Some(value_type) = present(&observation.value_type) {
        one_of(&format!("{prefix}.valueType"), value_type, &VALUE_TYPES, errors);
    }
}

fn require(name: &str, value: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{name} is required"));
    }
}

fn one_of(name: &str, value: &str, allowed: &[&str], errors: &mut Vec<String>) {
    if !allowed.contains(&value) {
        errors.push(format!(
            "{name} must be one of {} (got '{value}')",
            allowed.join(", ")
        ));
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageInfo;
    use test_case::test_case;

    fn valid_input() -> JsonInput {
        JsonInput::new(
            Patient::new("P12345", "John", "Doe")
                .with_gender("M")
                .with_date_of_birth("1990-01-15"),
            vec![Observation::new("GLU", "Glucose", "95")
                .with_units("mg/dL")
                .with_status("N")
                .with_value_type("NM")],
        )
    }

    #[test]
    fn test_valid_input_passes() {
        let result = InputValidator::default().validate(&valid_input());
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_missing_patient_and_observations() {
        let result = InputValidator::default().validate(&JsonInput::default());
        assert!(!result.is_valid());
        assert_eq!(
            result.errors(),
            ["patient is required", "observations is required"]
        );
    }

    #[test]
    fn test_collects_every_violation() {
        let input = JsonInput::new(
            Patient::new("", "", "").with_gender("X"),
            vec![Observation::new("", "", "").with_status("Z")],
        );
        let result = InputValidator::default().validate(&input);
        assert_eq!(result.errors().len(), 8);
        assert!(result
            .errors()
            .contains(&"observations[0].value is required".to_string()));
    }

    #[test_case(|p: &mut Patient| p.patient_id.clear(), "patient.patientId" ; "missing patient id")]
    #[test_case(|p: &mut Patient| p.first_name.clear(), "patient.firstName" ; "missing first name")]
    #[test_case(|p: &mut Patient| p.last_name = "  ".to_string(), "patient.lastName" ; "blank last name")]
    #[test_case(|p: &mut Patient| p.gender = Some("male".to_string()), "patient.gender" ; "bad gender")]
    #[test_case(|p: &mut Patient| p.date_of_birth = Some("15/01/1990".to_string()), "patient.dateOfBirth" ; "bad dob format")]
    #[test_case(|p: &mut Patient| p.date_of_birth = Some("1990-02-30".to_string()), "patient.dateOfBirth" ; "impossible dob")]
    #[test_case(|p: &mut Patient| p.patient_id = "P1\rMSH".to_string(), "patient.patientId" ; "line break in id")]
    fn test_patient_rule(mutate: fn(&mut Patient), field: &str) {
        let mut input = valid_input();
        if let Some(patient) = input.patient.as_mut() {
            mutate(patient);
        }
        let result = InputValidator::default().validate(&input);
        assert!(!result.is_valid());
        assert!(
            result.errors().iter().any(|e| e.starts_with(field)),
            "expected an error for {field}, got {:?}",
            result.errors()
        );
    }

    #[test_case("N", true)]
    #[test_case("A", true)]
    #[test_case("C", true)]
    #[test_case("P", true)]
    #[test_case("X", false)]
    #[test_case("n", false)]
    fn test_status_codes(status: &str, valid: bool) {
        let mut input = valid_input();
        input.observations = Some(vec![Observation::new("GLU", "Glucose", "95").with_status(status)]);
        assert_eq!(InputValidator::default().validate(&input).is_valid(), valid);
    }

    #[test_case("NM", true)]
    #[test_case("ST", true)]
    #[test_case("TX", true)]
    #[test_case("DT", true)]
    #[test_case("TM", true)]
    #[test_case("TS", true)]
    #[test_case("CE", false)]
    fn test_value_types(value_type: &str, valid: bool) {
        let mut input = valid_input();
        input.observations =
            Some(vec![Observation::new("GLU", "Glucose", "95").with_value_type(value_type)]);
        assert_eq!(InputValidator::default().validate(&input).is_valid(), valid);
    }

    #[test]
    fn test_empty_observations_policy() {
        let mut input = valid_input();
        input.observations = Some(vec![]);

        assert!(InputValidator::new(true).validate(&input).is_valid());

        let strict = InputValidator::new(false).validate(&input);
        assert_eq!(
            strict.errors(),
            ["observations must contain at least one observation"]
        );
    }

    #[test_case("2024-01-15T08:30:00Z", true)]
    #[test_case("2024-01-15T08:30:00", true)]
    #[test_case("20240115083000", true)]
    #[test_case("15 Jan 2024", false)]
    fn test_message_timestamp(timestamp: &str, valid: bool) {
        let input = valid_input().with_message_info(MessageInfo {
            timestamp: Some(timestamp.to_string()),
            ..Default::default()
        });
        assert_eq!(InputValidator::default().validate(&input).is_valid(), valid);
    }

    #[test]
    fn test_control_id_too_long() {
        let input = valid_input().with_message_info(MessageInfo {
            message_control_id: Some("X".repeat(21)),
            ..Default::default()
        });
        let result = InputValidator::default().validate(&input);
        assert!(result.errors()[0].starts_with("messageInfo.messageControlId"));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let input = JsonInput::new(Patient::new("", "John", "Doe"), vec![]);
        let validator = InputValidator::default();
        assert_eq!(validator.validate(&input), validator.validate(&input));
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationResult::success().into_result().is_ok());
        let err = ValidationResult::failure("patient is required")
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: patient is required");
    }
}
