//! In-memory HL7 v2 message model
//!
//! A message is an ordered list of segments whose first member is always MSH.
//! Each segment holds fields numbered the HL7 way (1-based); for MSH, field 1
//! is the field separator itself and field 2 the encoding characters.

use super::codec::{decode_segment, encode_segment};
use super::delimiters::Delimiters;
use crate::domain::MappingError;
use serde::{Deserialize, Serialize};

/// HL7 segment terminator
pub const SEGMENT_TERMINATOR: char = '\r';

/// A field value: repetitions of components of subcomponents
///
/// Stored unescaped. An empty field has no repetitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub repetitions: Vec<Vec<Vec<String>>>,
}

impl Field {
    /// A single-valued field; empty input yields an empty field
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            return Self::default();
        }
        Self {
            repetitions: vec![vec![vec![value]]],
        }
    }

    /// A composite field from component values, trailing empties trimmed
    pub fn components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts: Vec<Vec<String>> = components
            .into_iter()
            .map(|c| vec![c.into()])
            .collect();
        while parts.last().is_some_and(|c| c.iter().all(String::is_empty)) {
            parts.pop();
        }
        if parts.is_empty() {
            return Self::default();
        }
        Self {
            repetitions: vec![parts],
        }
    }

    /// True if every leaf is empty
    pub fn is_empty(&self) -> bool {
        self.repetitions
            .iter()
            .flatten()
            .flatten()
            .all(String::is_empty)
    }

    /// First component of the first repetition
    pub fn value(&self) -> &str {
        self.component(1)
    }

    /// Component `n` (1-based) of the first repetition, first subcomponent
    pub fn component(&self, n: usize) -> &str {
        n.checked_sub(1)
            .and_then(|i| self.repetitions.first()?.get(i)?.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Component value as an owned option, `None` when empty
    pub fn component_opt(&self, n: usize) -> Option<String> {
        let value = self.component(n);
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Components of the first repetition joined with `separator`
    pub fn joined(&self, separator: char) -> String {
        self.repetitions
            .first()
            .map(|rep| {
                rep.iter()
                    .map(|c| c.first().map(String::as_str).unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join(&separator.to_string())
            })
            .unwrap_or_default()
    }
}

/// One segment: a three-character tag and its fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub tag: String,
    pub fields: Vec<Field>,
}

impl Segment {
    /// Creates an empty segment
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            fields: Vec::new(),
        }
    }

    /// Sets field `n` (1-based), padding with empty fields as needed
    pub fn with_field(mut self, n: usize, field: Field) -> Self {
        self.set_field(n, field);
        self
    }

    /// Sets field `n` (1-based), padding with empty fields as needed
    pub fn set_field(&mut self, n: usize, field: Field) {
        if n == 0 {
            return;
        }
        if self.fields.len() < n {
            self.fields.resize(n, Field::default());
        }
        self.fields[n - 1] = field;
    }

    /// Field `n` (1-based)
    pub fn field(&self, n: usize) -> Option<&Field> {
        n.checked_sub(1).and_then(|i| self.fields.get(i))
    }

    /// First component of field `n`, or empty
    pub fn value(&self, n: usize) -> &str {
        self.field(n).map(Field::value).unwrap_or("")
    }

    /// First component of field `n` as an option, `None` when empty
    pub fn value_opt(&self, n: usize) -> Option<String> {
        self.field(n).and_then(|f| f.component_opt(1))
    }

    /// Pads the segment to at least `count` fields
    pub fn pad_to(&mut self, count: usize) {
        if self.fields.len() < count {
            self.fields.resize(count, Field::default());
        }
    }
}

/// A complete HL7 v2 message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hl7Message {
    pub delimiters: Delimiters,
    segments: Vec<Segment>,
}

impl Hl7Message {
    /// Creates a message from its segments
    ///
    /// # Errors
    ///
    /// Returns a mapping error if the first segment is not MSH.
    pub fn new(delimiters: Delimiters, segments: Vec<Segment>) -> Result<Self, MappingError> {
        delimiters.validate()?;
        match segments.first() {
            Some(first) if first.tag == "MSH" => Ok(Self {
                delimiters,
                segments,
            }),
            Some(first) => Err(MappingError::MissingMsh(first.tag.clone())),
            None => Err(MappingError::EmptyMessage),
        }
    }

    /// Parses ER7 text
    ///
    /// Accepts CR, LF or CRLF segment terminators and strips MLLP framing
    /// bytes. The delimiter set is read from MSH before any other segment
    /// is decoded.
    ///
    /// # Example
    ///
    /// ```
    /// use hl7_gateway::hl7::Hl7Message;
    ///
    /// let msg = Hl7Message::parse("MSH|^~\\&|APP|FAC|||20240101120000||ORU^R01|MSG1|P|2.5\rPID|1||P1").unwrap();
    /// assert_eq!(msg.message_type(), "ORU^R01");
    /// assert_eq!(msg.segment("PID").unwrap().value(3), "P1");
    /// ```
    pub fn parse(input: &str) -> Result<Self, MappingError> {
        let input = input.trim_matches(|c| c == '\x0b' || c == '\x1c');
        let mut lines = input
            .split(['\r', '\n'])
            .filter(|line| !line.trim().is_empty());

        let first = lines.next().ok_or(MappingError::EmptyMessage)?;
        let delimiters = Delimiters::from_msh(first)?;

        let mut segments = vec![decode_segment(first, &delimiters)?];
        for line in lines {
            segments.push(decode_segment(line, &delimiters)?);
        }

        Ok(Self {
            delimiters,
            segments,
        })
    }

    /// Renders ER7 text, segments joined by the segment terminator
    pub fn encode(&self) -> String {
        self.segments
            .iter()
            .map(|segment| encode_segment(segment, &self.delimiters))
            .collect::<Vec<_>>()
            .join(&SEGMENT_TERMINATOR.to_string())
    }

    /// All segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Appends a segment
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Inserts a segment at `index` (clamped; never before MSH)
    pub fn insert(&mut self, index: usize, segment: Segment) {
        let index = index.clamp(1, self.segments.len());
        self.segments.insert(index, segment);
    }

    /// The MSH segment
    pub fn header(&self) -> &Segment {
        &self.segments[0]
    }

    /// First segment with the given tag
    pub fn segment(&self, tag: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.tag == tag)
    }

    /// All segments with the given tag
    pub fn segments_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.tag == tag)
    }

    /// MSH-9 message code and trigger event, e.g. `ORU^R01`
    pub fn message_type(&self) -> String {
        let field = self.header().field(9).cloned().unwrap_or_default();
        match (field.component(1), field.component(2)) {
            ("", _) => String::new(),
            (code, "") => code.to_string(),
            (code, event) => format!("{code}{}{event}", self.delimiters.component),
        }
    }

    /// MSH-10 message control id
    pub fn control_id(&self) -> &str {
        self.header().value(10)
    }

    /// MSH-12 version id
    pub fn version(&self) -> &str {
        self.header().value(12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "MSH|^~\\&|LIS|LAB|EHR|HOSP|20240115083000||ORU^R01^ORU_R01|MSG001|P|2.5\r\
PID|1||P12345||DOE^JOHN||19900115|M\r\
OBR|1|MSG001||LAB^Laboratory Results|||20240115083000\r\
OBX|1|NM|GLU^Glucose||95|mg/dL|70-99||||N";

    #[test]
    fn test_field_text_and_components() {
        assert!(Field::text("").is_empty());
        assert_eq!(Field::text("abc").value(), "abc");

        let name = Field::components(["DOE", "JOHN", ""]);
        assert_eq!(name.repetitions[0].len(), 2);
        assert_eq!(name.component(2), "JOHN");
        assert_eq!(name.component(3), "");
        assert_eq!(name.component(0), "");
        assert_eq!(name.joined('^'), "DOE^JOHN");
    }

    #[test]
    fn test_segment_set_field_pads() {
        let seg = Segment::new("PID").with_field(3, Field::text("P1"));
        assert_eq!(seg.fields.len(), 3);
        assert_eq!(seg.value(1), "");
        assert_eq!(seg.value(3), "P1");
        assert_eq!(seg.value(99), "");
        assert_eq!(seg.value_opt(1), None);
    }

    #[test]
    fn test_parse_sample() {
        let msg = Hl7Message::parse(SAMPLE).unwrap();
        assert_eq!(msg.segments().len(), 4);
        assert_eq!(msg.message_type(), "ORU^R01");
        assert_eq!(msg.control_id(), "MSG001");
        assert_eq!(msg.version(), "2.5");
        assert_eq!(msg.segment("OBX").unwrap().value(6), "mg/dL");
    }

    #[test]
    fn test_parse_accepts_lf_and_crlf() {
        let lf = SAMPLE.replace('\r', "\n");
        let crlf = SAMPLE.replace('\r', "\r\n");
        assert_eq!(Hl7Message::parse(&lf).unwrap().segments().len(), 4);
        assert_eq!(Hl7Message::parse(&crlf).unwrap().segments().len(), 4);
    }

    #[test]
    fn test_parse_strips_mllp_framing() {
        let framed = format!("\x0b{SAMPLE}\x1c");
        assert_eq!(Hl7Message::parse(&framed).unwrap().control_id(), "MSG001");
    }

    #[test]
    fn test_parse_requires_msh_first() {
        assert!(matches!(
            Hl7Message::parse("PID|1||P1"),
            Err(MappingError::MissingMsh(_))
        ));
        assert!(matches!(
            Hl7Message::parse("  \r\n"),
            Err(MappingError::EmptyMessage)
        ));
    }

    #[test]
    fn test_encode_round_trip() {
        let msg = Hl7Message::parse(SAMPLE).unwrap();
        assert_eq!(msg.encode(), SAMPLE);
    }

    #[test]
    fn test_new_requires_msh() {
        let result = Hl7Message::new(Delimiters::default(), vec![Segment::new("PID")]);
        assert!(matches!(result, Err(MappingError::MissingMsh(_))));
        assert!(matches!(
            Hl7Message::new(Delimiters::default(), vec![]),
            Err(MappingError::EmptyMessage)
        ));
    }

    #[test]
    fn test_insert_never_before_msh() {
        let mut msg = Hl7Message::parse(SAMPLE).unwrap();
        msg.insert(0, Segment::new("ZZZ"));
        assert_eq!(msg.segments()[0].tag, "MSH");
        assert_eq!(msg.segments()[1].tag, "ZZZ");
    }

    #[test]
    fn test_segments_by_tag() {
        let msg = Hl7Message::parse(SAMPLE).unwrap();
        assert_eq!(msg.segments_by_tag("OBX").count(), 1);
        assert_eq!(msg.segments_by_tag("NTE").count(), 0);
    }
}
