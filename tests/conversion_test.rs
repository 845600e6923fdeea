//! End-to-end conversion tests: JSON input to ER7 wire text and back

use hl7_gateway::config::ConversionConfig;
use hl7_gateway::core::Converter;
use hl7_gateway::domain::{Address, JsonInput, MessageInfo, Observation, Patient};
use hl7_gateway::hl7::{Hl7Message, ObservationGrouping};

fn glucose_input() -> JsonInput {
    JsonInput::new(
        Patient::new("P12345", "John", "Doe")
            .with_gender("M")
            .with_date_of_birth("1990-01-15"),
        vec![Observation::new("GLU", "Glucose", "95")
            .with_units("mg/dL")
            .with_status("N")],
    )
}

fn segment_lines(wire: &str) -> Vec<&str> {
    wire.split('\r').filter(|s| !s.is_empty()).collect()
}

#[test]
fn test_single_observation_message() {
    let result = Converter::default().convert(&glucose_input());
    assert!(result.success, "{:?}", result.error_message);

    let wire = result.hl7.unwrap();
    let lines = segment_lines(&wire);
    let tags: Vec<&str> = lines.iter().map(|l| &l[..3]).collect();
    assert_eq!(tags, ["MSH", "PID", "OBR", "OBX"]);

    assert!(lines[0].starts_with("MSH|^~\\&|"));
    assert!(lines[0].contains("|ORU^R01^ORU_R01|"));

    let pid = lines[1];
    assert!(pid.contains("P12345"));
    assert!(pid.contains("DOE^JOHN"));
    assert!(pid.contains("19900115"));

    let obx = lines[3];
    assert!(obx.starts_with("OBX|1|"));
    assert!(obx.contains("|95|"));
    assert!(obx.contains("mg/dL"));
}

#[test]
fn test_empty_observations_produce_msh_and_pid_only() {
    let input = JsonInput::new(Patient::new("P12345", "John", "Doe"), vec![]);
    let result = Converter::default().convert(&input);
    assert!(result.success);

    let message = result.message.unwrap();
    let tags: Vec<&str> = message.segments().iter().map(|s| s.tag.as_str()).collect();
    assert_eq!(tags, ["MSH", "PID"]);
}

#[test]
fn test_empty_observations_rejected_when_disallowed() {
    let config = ConversionConfig {
        allow_empty_observations: false,
        ..Default::default()
    };
    let input = JsonInput::new(Patient::new("P12345", "John", "Doe"), vec![]);
    let result = Converter::from_config(&config).convert(&input);

    assert!(!result.success);
    assert!(result.hl7.is_none());
    assert_eq!(
        result.errors,
        vec!["observations must contain at least one observation".to_string()]
    );
}

#[test]
fn test_validation_reports_every_problem() {
    let input = JsonInput::new(
        Patient::new("", "John", "").with_gender("X"),
        vec![Observation::new("GLU", "", "95").with_status("Z")],
    );
    let result = Converter::default().convert(&input);

    assert!(!result.success);
    assert_eq!(result.errors.len(), 5, "{:?}", result.errors);
    assert!(result.errors.iter().any(|e| e.contains("patient.patientId")));
    assert!(result.errors.iter().any(|e| e.contains("patient.lastName")));
    assert!(result.errors.iter().any(|e| e.contains("patient.gender")));
    assert!(result.errors.iter().any(|e| e.contains("observations[0].description")));
    assert!(result.errors.iter().any(|e| e.contains("observations[0].status")));
}

#[test]
fn test_observation_set_ids_are_sequential() {
    let observations: Vec<Observation> = (1..=5)
        .map(|n| Observation::new(format!("T{n}"), format!("Test {n}"), n.to_string()))
        .collect();
    let input = JsonInput::new(Patient::new("P1", "Jane", "Roe"), observations);

    let message = Converter::default().convert(&input).message.unwrap();
    let set_ids: Vec<&str> = message.segments_by_tag("OBX").map(|s| s.value(1)).collect();
    assert_eq!(set_ids, ["1", "2", "3", "4", "5"]);
    assert_eq!(message.segments_by_tag("OBR").count(), 1);
}

#[test]
fn test_order_per_observation_grouping() {
    let config = ConversionConfig {
        observation_grouping: ObservationGrouping::OrderPerObservation,
        ..Default::default()
    };
    let input = JsonInput::new(
        Patient::new("P1", "Jane", "Roe"),
        vec![
            Observation::new("GLU", "Glucose", "95"),
            Observation::new("HGB", "Hemoglobin", "13.5"),
        ],
    );

    let message = Converter::from_config(&config).convert(&input).message.unwrap();
    let tags: Vec<&str> = message.segments().iter().map(|s| s.tag.as_str()).collect();
    assert_eq!(tags, ["MSH", "PID", "OBR", "OBX", "OBR", "OBX"]);

    // set ids keep counting across orders
    let set_ids: Vec<&str> = message.segments_by_tag("OBX").map(|s| s.value(1)).collect();
    assert_eq!(set_ids, ["1", "2"]);
}

#[test]
fn test_delimiters_in_values_are_escaped() {
    let input = JsonInput::new(
        Patient::new("P1", "Sean", "O'Brien^Jr"),
        vec![Observation::new("NOTE", "Comment", "A|B & C")],
    );

    let wire = Converter::default().convert(&input).hl7.unwrap();
    assert!(wire.contains("O'BRIEN\\S\\JR^SEAN"));
    assert!(wire.contains("A\\F\\B \\T\\ C"));

    let decoded = Converter::default().parse(&wire).unwrap();
    let patient = decoded.input.patient.unwrap();
    assert_eq!(patient.last_name, "O'BRIEN^JR");
    assert_eq!(decoded.input.observations.unwrap()[0].value, "A|B & C");
}

#[test]
fn test_line_breaks_in_values_stay_inside_their_segment() {
    let input = JsonInput::new(
        Patient::new("P1", "John\nPID|2||X", "Doe"),
        vec![Observation::new("GLU", "Glucose", "95\rOBX|99|ST|EVIL^Injected||666")],
    );

    let result = Converter::default().convert(&input);
    assert!(result.success, "errors: {:?}", result.errors);
    let wire = result.hl7.unwrap();

    let tags: Vec<&str> = segment_lines(&wire).iter().map(|l| &l[..3]).collect();
    assert_eq!(tags, ["MSH", "PID", "OBR", "OBX"]);
    assert!(wire.contains("95\\X0D\\OBX\\F\\99"));
    assert!(wire.contains("JOHN\\X0A\\PID\\F\\2"));

    let decoded = Converter::default().parse(&wire).unwrap();
    assert_eq!(decoded.input.patient.unwrap().first_name, "JOHN\nPID|2||X");
    let observations = decoded.input.observations.unwrap();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].value, "95\rOBX|99|ST|EVIL^Injected||666");
}

#[test]
fn test_round_trip_preserves_content() {
    let input = JsonInput::new(
        Patient::new("P12345", "John", "Doe")
            .with_middle_name("Q")
            .with_gender("M")
            .with_date_of_birth("1990-01-15")
            .with_address(Address {
                street: Some("1 Main St".to_string()),
                city: Some("Springfield".to_string()),
                state: Some("IL".to_string()),
                postal_code: Some("62701".to_string()),
                country: Some("USA".to_string()),
            }),
        vec![
            Observation::new("GLU", "Glucose", "95")
                .with_units("mg/dL")
                .with_reference_range("70-99")
                .with_status("N")
                .with_value_type("NM"),
            Observation::new("HGB", "Hemoglobin", "13.5").with_units("g/dL"),
        ],
    )
    .with_message_info(MessageInfo {
        sending_facility: Some("NORTH_LAB".to_string()),
        message_control_id: Some("MSG0001".to_string()),
        timestamp: Some("2024-01-15T10:30:00".to_string()),
        ..Default::default()
    });

    let converter = Converter::default();
    let wire = converter.convert(&input).hl7.unwrap();
    let decoded = converter.parse(&wire).unwrap();

    assert_eq!(decoded.message_type, "ORU^R01");
    assert!(decoded.preserved_segments.is_empty());

    let patient = decoded.input.patient.as_ref().unwrap();
    assert_eq!(patient.patient_id, "P12345");
    assert_eq!(patient.last_name, "DOE");
    assert_eq!(patient.first_name, "JOHN");
    assert_eq!(patient.middle_name.as_deref(), Some("Q"));
    assert_eq!(patient.date_of_birth.as_deref(), Some("1990-01-15"));
    assert_eq!(patient.gender.as_deref(), Some("M"));
    assert_eq!(
        patient.address.as_ref().and_then(|a| a.city.as_deref()),
        Some("Springfield")
    );

    let observations = decoded.input.observations();
    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].observation_id, "GLU");
    assert_eq!(observations[0].units.as_deref(), Some("mg/dL"));
    assert_eq!(observations[0].reference_range.as_deref(), Some("70-99"));
    assert_eq!(observations[0].value_type.as_deref(), Some("NM"));
    assert_eq!(observations[1].value, "13.5");

    let info = decoded.input.message_info.as_ref().unwrap();
    assert_eq!(info.message_control_id.as_deref(), Some("MSG0001"));
    assert_eq!(info.sending_facility.as_deref(), Some("NORTH_LAB"));
    assert_eq!(info.timestamp.as_deref(), Some("2024-01-15T10:30:00"));

    // re-encoding the decoded model yields the same wire text
    let again = converter.mapper().rebuild(&decoded).unwrap().encode();
    assert_eq!(again, wire);
}

#[test]
fn test_unknown_segments_survive_rebuild() {
    let wire = "MSH|^~\\&|LAB|HOSP|EHR|HOSP|20240115103000||ORU^R01|MSG1|P|2.5\r\
                PID|1||P1||ROE^JANE\r\
                NTE|1||Fasting sample\r\
                OBR|1|MSG1||LAB^Laboratory Results\r\
                OBX|1|NM|GLU^Glucose||95||||||N";

    let converter = Converter::default();
    let decoded = converter.parse(wire).unwrap();
    assert_eq!(decoded.preserved_segments.len(), 1);
    assert_eq!(decoded.preserved_segments[0].position, 2);
    assert_eq!(decoded.preserved_segments[0].segment.tag, "NTE");

    let rebuilt = converter.mapper().rebuild(&decoded).unwrap();
    let tags: Vec<&str> = rebuilt.segments().iter().map(|s| s.tag.as_str()).collect();
    assert_eq!(tags[2], "NTE");
}

#[test]
fn test_parse_rejects_non_hl7() {
    assert!(Converter::default().parse("PID|1||P1").is_err());
    assert!(Converter::default().parse("").is_err());
    assert!(Hl7Message::parse("MSH").is_err());
}

#[test]
fn test_convert_json_reports_malformed_input() {
    let result = Converter::default().convert_json("{\"patient\": ");
    assert!(!result.success);
    assert!(result
        .error_message
        .unwrap()
        .contains("Invalid JSON input"));
}
