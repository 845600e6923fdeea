//! Message mapper
//!
//! Maps the JSON input model to an ORU^R01 message and back. Positional
//! contract used in both directions:
//!
//! | Segment | Field | Content                                         |
//! |---------|-------|-------------------------------------------------|
//! | MSH     | 3-6   | sending app/facility, receiving app/facility    |
//! | MSH     | 7     | message time, `YYYYMMDDHHMMSS`                  |
//! | MSH     | 9-12  | `ORU^R01^ORU_R01`, control id, processing id, version |
//! | PID     | 3     | patient identifier                              |
//! | PID     | 5     | `LAST^FIRST^MIDDLE`                             |
//! | PID     | 7-8   | date of birth `YYYYMMDD`, sex                   |
//! | PID     | 11    | `street^^city^state^zip^country`                |
//! | OBX     | 1-3   | set id, value type, `code^description`          |
//! | OBX     | 5-7   | value, units, reference range                   |
//! | OBX     | 11,14 | result status, observation time                 |
//!
//! Segments the mapper does not own are kept on decode together with their
//! position so [`MessageMapper::rebuild`] can put them back.

use super::codec::minimum_field_count;
use super::datetime;
use super::delimiters::Delimiters;
use super::message::{Field, Hl7Message, Segment};
use crate::domain::{
    Address, JsonInput, MappingError, MessageControlId, MessageInfo, Observation, Patient,
};
use serde::{Deserialize, Serialize};

const MAPPED_TAGS: [&str; 4] = ["MSH", "PID", "OBR", "OBX"];

/// How observations are grouped under OBR orders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationGrouping {
    /// One OBR followed by every OBX
    #[default]
    SingleOrder,
    /// An OBR/OBX pair per observation
    OrderPerObservation,
}

/// Header defaults and layout choices for outgoing messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingOptions {
    pub sending_application: String,
    pub receiving_application: String,
    pub default_sending_facility: String,
    pub default_receiving_facility: String,
    pub processing_id: String,
    pub version: String,
    pub grouping: ObservationGrouping,
    pub panel_code: String,
    pub panel_description: String,
    pub delimiters: Delimiters,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            sending_application: "HL7GW".to_string(),
            receiving_application: String::new(),
            default_sending_facility: String::new(),
            default_receiving_facility: String::new(),
            processing_id: "P".to_string(),
            version: "2.5".to_string(),
            grouping: ObservationGrouping::SingleOrder,
            panel_code: "LAB".to_string(),
            panel_description: "Laboratory Results".to_string(),
            delimiters: Delimiters::default(),
        }
    }
}

/// A segment the mapper does not interpret, with its original index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservedSegment {
    pub position: usize,
    pub segment: Segment,
}

/// Result of mapping a message back to the input model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMessage {
    pub message_type: String,
    pub input: JsonInput,
    pub preserved_segments: Vec<PreservedSegment>,
}

/// Bidirectional mapping between [`JsonInput`] and [`Hl7Message`]
#[derive(Debug, Clone, Default)]
pub struct MessageMapper {
    options: MappingOptions,
}

impl MessageMapper {
    pub fn new(options: MappingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MappingOptions {
        &self.options
    }

    /// Builds an ORU^R01 message from the input
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidField`] if the patient is missing or a
    /// date/timestamp cannot be parsed.
    pub fn to_message(&self, input: &JsonInput) -> Result<Hl7Message, MappingError> {
        let patient = input.patient.as_ref().ok_or_else(|| MappingError::InvalidField {
            field: "patient".to_string(),
            message: "patient is required".to_string(),
        })?;
        let info = input.message_info.clone().unwrap_or_default();

        let timestamp = match non_empty(&info.timestamp) {
            Some(ts) => datetime::to_hl7_timestamp(datetime::parse_timestamp(ts).ok_or_else(
                || MappingError::InvalidField {
                    field: "messageInfo.timestamp".to_string(),
                    message: format!("unrecognised timestamp '{ts}'"),
                },
            )?),
            None => datetime::now_hl7(),
        };
        let control_id = non_empty(&info.message_control_id)
            .map(str::to_string)
            .unwrap_or_else(|| MessageControlId::generate().to_string());

        let mut segments = vec![
            self.build_msh(&info, &timestamp, &control_id),
            build_pid(patient)?,
        ];

        let mut set_id = 0usize;
        for (index, chunk) in self.order_groups(input.observations()).into_iter().enumerate() {
            segments.push(self.build_obr(index + 1, &control_id, &timestamp, chunk));
            for observation in chunk {
                set_id += 1;
                segments.push(build_obx(set_id, observation, &timestamp));
            }
        }

        Hl7Message::new(self.options.delimiters, segments)
    }

    /// Maps a parsed message back to the input model
    ///
    /// A message without PID yields no patient; zero OBX segments yield an
    /// empty observation list.
    pub fn from_message(&self, message: &Hl7Message) -> Result<DecodedMessage, MappingError> {
        let msh = message.header();
        let component = message.delimiters.component;

        let message_info = MessageInfo {
            sending_application: msh.value_opt(3),
            sending_facility: msh.value_opt(4),
            receiving_application: msh.value_opt(5),
            receiving_facility: msh.value_opt(6),
            message_control_id: msh.value_opt(10),
            timestamp: msh.value_opt(7).map(|ts| datetime::from_hl7_timestamp(&ts)),
        };

        let patient = message.segment("PID").map(read_pid);
        let observations: Vec<Observation> = message
            .segments_by_tag("OBX")
            .map(|obx| read_obx(obx, component))
            .collect();

        let preserved_segments = message
            .segments()
            .iter()
            .enumerate()
            .filter(|(_, s)| !MAPPED_TAGS.contains(&s.tag.as_str()))
            .map(|(position, segment)| PreservedSegment {
                position,
                segment: segment.clone(),
            })
            .collect();

        Ok(DecodedMessage {
            message_type: message.message_type(),
            input: JsonInput {
                patient,
                observations: Some(observations),
                message_info: Some(message_info),
            },
            preserved_segments,
        })
    }

    /// Re-creates a message from a decoded model, restoring preserved
    /// segments at their original positions
    pub fn rebuild(&self, decoded: &DecodedMessage) -> Result<Hl7Message, MappingError> {
        let mut message = self.to_message(&decoded.input)?;
        let mut preserved: Vec<&PreservedSegment> = decoded.preserved_segments.iter().collect();
        preserved.sort_by_key(|p| p.position);
        for p in preserved {
            message.insert(p.position, p.segment.clone());
        }
        Ok(message)
    }

    fn order_groups<'a>(&self, observations: &'a [Observation]) -> Vec<&'a [Observation]> {
        if observations.is_empty() {
            return Vec::new();
        }
        match self.options.grouping {
            ObservationGrouping::SingleOrder => vec![observations],
            ObservationGrouping::OrderPerObservation => observations.chunks(1).collect(),
        }
    }

    fn build_msh(&self, info: &MessageInfo, timestamp: &str, control_id: &str) -> Segment {
        let opts = &self.options;
        let pick = |value: &Option<String>, fallback: &str| {
            non_empty(value).unwrap_or(fallback).to_string()
        };

        let mut msh = Segment::new("MSH")
            .with_field(1, Field::text(opts.delimiters.field.to_string()))
            .with_field(2, Field::text(opts.delimiters.encoding_characters()))
            .with_field(3, Field::text(pick(&info.sending_application, &opts.sending_application)))
            .with_field(4, Field::text(pick(&info.sending_facility, &opts.default_sending_facility)))
            .with_field(
                5,
                Field::text(pick(&info.receiving_application, &opts.receiving_application)),
            )
            .with_field(
                6,
                Field::text(pick(&info.receiving_facility, &opts.default_receiving_facility)),
            )
            .with_field(7, Field::text(timestamp))
            .with_field(9, Field::components(["ORU", "R01", "ORU_R01"]))
            .with_field(10, Field::text(control_id))
            .with_field(11, Field::text(&opts.processing_id))
            .with_field(12, Field::text(&opts.version));
        msh.pad_to(minimum_field_count("MSH"));
        msh
    }

    fn build_obr(
        &self,
        set_id: usize,
        control_id: &str,
        timestamp: &str,
        group: &[Observation],
    ) -> Segment {
        let service = match (self.options.grouping, group) {
            (ObservationGrouping::OrderPerObservation, [single]) => {
                Field::components([single.observation_id.as_str(), single.description.as_str()])
            }
            _ => Field::components([
                self.options.panel_code.as_str(),
                self.options.panel_description.as_str(),
            ]),
        };

        let mut obr = Segment::new("OBR")
            .with_field(1, Field::text(set_id.to_string()))
            .with_field(2, Field::text(control_id))
            .with_field(4, service)
            .with_field(7, Field::text(timestamp));
        obr.pad_to(minimum_field_count("OBR"));
        obr
    }
}

fn build_pid(patient: &Patient) -> Result<Segment, MappingError> {
    let mut pid = Segment::new("PID")
        .with_field(1, Field::text("1"))
        .with_field(3, Field::text(&patient.patient_id))
        .with_field(
            5,
            Field::components([
                patient.last_name.to_uppercase(),
                patient.first_name.to_uppercase(),
                patient
                    .middle_name
                    .as_deref()
                    .unwrap_or_default()
                    .to_uppercase(),
            ]),
        );

    if let Some(dob) = non_empty(&patient.date_of_birth) {
        let date = datetime::parse_date(dob).ok_or_else(|| MappingError::InvalidField {
            field: "patient.dateOfBirth".to_string(),
            message: format!("unrecognised date '{dob}'"),
        })?;
        pid.set_field(7, Field::text(datetime::to_hl7_date(date)));
    }
    if let Some(gender) = non_empty(&patient.gender) {
        pid.set_field(8, Field::text(gender.to_uppercase()));
    }
    if let Some(address) = patient.address.as_ref().filter(|a| !a.is_empty()) {
        let part = |p: &Option<String>| p.clone().unwrap_or_default();
        pid.set_field(
            11,
            Field::components([
                part(&address.street),
                String::new(),
                part(&address.city),
                part(&address.state),
                part(&address.postal_code),
                part(&address.country),
            ]),
        );
    }

    pid.pad_to(minimum_field_count("PID"));
    Ok(pid)
}

fn build_obx(set_id: usize, observation: &Observation, timestamp: &str) -> Segment {
    let value_type = non_empty(&observation.value_type).unwrap_or("ST");
    let optional = |v: &Option<String>| Field::text(v.clone().unwrap_or_default());

    let mut obx = Segment::new("OBX")
        .with_field(1, Field::text(set_id.to_string()))
        .with_field(2, Field::text(value_type))
        .with_field(
            3,
            Field::components([
                observation.observation_id.as_str(),
                observation.description.as_str(),
            ]),
        )
        .with_field(5, Field::text(&observation.value))
        .with_field(6, optional(&observation.units))
        .with_field(7, optional(&observation.reference_range))
        .with_field(11, optional(&observation.status))
        .with_field(14, Field::text(timestamp));
    obx.pad_to(minimum_field_count("OBX"));
    obx
}

fn read_pid(pid: &Segment) -> Patient {
    let name = pid.field(5).cloned().unwrap_or_default();
    let address = pid.field(11).map(|f| Address {
        street: f.component_opt(1),
        city: f.component_opt(3),
        state: f.component_opt(4),
        postal_code: f.component_opt(5),
        country: f.component_opt(6),
    });

    Patient {
        patient_id: pid.value(3).to_string(),
        first_name: name.component(2).to_string(),
        last_name: name.component(1).to_string(),
        middle_name: name.component_opt(3),
        date_of_birth: pid.value_opt(7).map(|d| datetime::from_hl7_date(&d)),
        gender: pid.value_opt(8),
        address: address.filter(|a| !a.is_empty()),
    }
}

fn read_obx(obx: &Segment, component: char) -> Observation {
    let code = obx.field(3).cloned().unwrap_or_default();
    let value = obx.field(5).map(|f| f.joined(component)).unwrap_or_default();

    Observation {
        observation_id: code.component(1).to_string(),
        description: code.component(2).to_string(),
        value,
        units: obx.field(6).and_then(|f| f.component_opt(1)),
        reference_range: obx.value_opt(7),
        status: obx.value_opt(11),
        value_type: obx.value_opt(2),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
