//! JSON input model
//!
//! The structure an upstream caller hands to the converter: one patient, an
//! ordered list of lab observations and optional message metadata. Field
//! names follow the camelCase JSON contract.
//!
//! Required strings default to empty when absent so that the validator, not
//! the deserializer, reports which field is missing.

use serde::{Deserialize, Serialize};

/// Root input document
///
/// # Examples
///
/// ```
/// use hl7_gateway::domain::JsonInput;
///
/// let input: JsonInput = serde_json::from_str(r#"{
///     "patient": {"patientId": "P12345", "firstName": "John", "lastName": "Doe"},
///     "observations": [],
///     "messageInfo": {"sendingFacility": "LAB"}
/// }"#).unwrap();
///
/// assert_eq!(input.patient.unwrap().patient_id, "P12345");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonInput {
    /// Patient demographics (required)
    #[serde(default)]
    pub patient: Option<Patient>,

    /// Lab observations in output order (the container is required)
    #[serde(default)]
    pub observations: Option<Vec<Observation>>,

    /// Message header metadata
    #[serde(default)]
    pub message_info: Option<MessageInfo>,
}

impl JsonInput {
    /// Creates an input for a patient with the given observations
    pub fn new(patient: Patient, observations: Vec<Observation>) -> Self {
        Self {
            patient: Some(patient),
            observations: Some(observations),
            message_info: None,
        }
    }

    /// Sets the message metadata
    pub fn with_message_info(mut self, message_info: MessageInfo) -> Self {
        self.message_info = Some(message_info);
        self
    }

    /// Observations as a slice, empty if the container is absent
    pub fn observations(&self) -> &[Observation] {
        self.observations.as_deref().unwrap_or_default()
    }
}

/// Patient demographics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Patient identifier (PID-3)
    #[serde(default)]
    pub patient_id: String,

    /// Given name
    #[serde(default)]
    pub first_name: String,

    /// Family name
    #[serde(default)]
    pub last_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,

    /// Date of birth, `YYYY-MM-DD` or `YYYYMMDD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    /// Administrative sex code: M, F, O or U
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl Patient {
    /// Creates a patient with the three required fields
    pub fn new(
        patient_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    /// Sets the middle name
    pub fn with_middle_name(mut self, middle_name: impl Into<String>) -> Self {
        self.middle_name = Some(middle_name.into());
        self
    }

    /// Sets the date of birth
    pub fn with_date_of_birth(mut self, date_of_birth: impl Into<String>) -> Self {
        self.date_of_birth = Some(date_of_birth.into());
        self
    }

    /// Sets the gender code
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Sets the address
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }
}

/// Postal address, rendered as an XAD composite in PID-11
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// True when no address part is set
    pub fn is_empty(&self) -> bool {
        [
            &self.street,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .all(|part| part.as_deref().map_or(true, str::is_empty))
    }
}

/// A single lab observation
///
/// The value is always text. A value type of `NM` does not trigger numeric
/// coercion; interpreting it is up to the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Observation code (OBX-3.1)
    #[serde(default)]
    pub observation_id: String,

    /// Observation description (OBX-3.2)
    #[serde(default)]
    pub description: String,

    /// Result value (OBX-5)
    #[serde(default)]
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,

    /// Result status code: N, A, C or P
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// HL7 value type: NM, ST, TX, DT, TM or TS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

impl Observation {
    /// Creates an observation with the three required fields
    pub fn new(
        observation_id: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            observation_id: observation_id.into(),
            description: description.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Sets the units
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Sets the reference range
    pub fn with_reference_range(mut self, range: impl Into<String>) -> Self {
        self.reference_range = Some(range.into());
        self
    }

    /// Sets the status code
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the value type
    pub fn with_value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }
}

/// Message header metadata (MSH)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sending_application: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sending_facility: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiving_application: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiving_facility: Option<String>,

    /// MSH-10; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_control_id: Option<String>,

    /// Message time; current time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}
