//! Segment codec
//!
//! Converts a single [`Segment`] to and from its ER7 text form. Leaf values
//! are escaped on encode and unescaped on decode, so the in-memory model
//! always holds plain text.

use super::delimiters::Delimiters;
use super::message::{Field, Segment};
use crate::domain::MappingError;

/// Minimum number of fields each known segment is padded to on decode
pub fn minimum_field_count(tag: &str) -> usize {
    match tag {
        "MSH" => 12,
        "PID" => 11,
        "OBR" => 7,
        "OBX" => 14,
        _ => 0,
    }
}

/// Renders a segment as one line of ER7 text (without terminator)
///
/// MSH-1 and MSH-2 are emitted raw from the delimiter set. Trailing empty
/// fields and components are dropped.
pub fn encode_segment(segment: &Segment, delimiters: &Delimiters) -> String {
    let is_header = segment.tag == "MSH";
    let mut out = segment.tag.clone();

    let skip = if is_header {
        out.push(delimiters.field);
        out.push_str(&delimiters.encoding_characters());
        2
    } else {
        0
    };

    let fields = &segment.fields[skip.min(segment.fields.len())..];
    let used = fields
        .iter()
        .rposition(|f| !f.is_empty())
        .map_or(0, |i| i + 1);

    for field in &fields[..used] {
        out.push(delimiters.field);
        out.push_str(&encode_field(field, delimiters));
    }
    out
}

fn encode_field(field: &Field, delimiters: &Delimiters) -> String {
    let repetitions: Vec<String> = field
        .repetitions
        .iter()
        .map(|components| {
            let used = components
                .iter()
                .rposition(|c| c.iter().any(|s| !s.is_empty()))
                .map_or(0, |i| i + 1);
            components[..used]
                .iter()
                .map(|subs| {
                    subs.iter()
                        .map(|leaf| delimiters.escape(leaf))
                        .collect::<Vec<_>>()
                        .join(&delimiters.subcomponent.to_string())
                })
                .collect::<Vec<_>>()
                .join(&delimiters.component.to_string())
        })
        .collect();

    // An all-empty repetition list renders as nothing
    if repetitions.iter().all(String::is_empty) {
        return String::new();
    }
    repetitions.join(&delimiters.repetition.to_string())
}

/// Parses one line of ER7 text into a segment
///
/// The delimiter set must already be known (read it from MSH with
/// [`Delimiters::from_msh`]). Known segments with fewer fields than their
/// minimum are padded with empty fields.
///
/// # Errors
///
/// Returns [`MappingError::InvalidSegment`] when the tag is not three upper
/// case letters or digits, or is not followed by the field separator.
pub fn decode_segment(line: &str, delimiters: &Delimiters) -> Result<Segment, MappingError> {
    let tag: String = line.chars().take(3).collect();
    if tag.len() != 3
        || !tag
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(MappingError::InvalidSegment(format!(
            "invalid segment tag '{}'",
            line.chars().take(8).collect::<String>()
        )));
    }

    let rest = &line[3..];
    let body = match rest.chars().next() {
        None => "",
        Some(c) if c == delimiters.field => &rest[c.len_utf8()..],
        Some(_) => {
            return Err(MappingError::InvalidSegment(format!(
                "segment {tag} is not followed by the field separator"
            )))
        }
    };

    let mut segment = Segment::new(tag.clone());
    if tag == "MSH" {
        let mut parts = body.split(delimiters.field);
        let encoding = parts.next().unwrap_or_default();
        segment.fields.push(Field::text(delimiters.field.to_string()));
        segment.fields.push(Field::text(encoding));
        segment
            .fields
            .extend(parts.map(|raw| decode_field(raw, delimiters)));
    } else if !body.is_empty() || rest.starts_with(delimiters.field) {
        segment.fields = body
            .split(delimiters.field)
            .map(|raw| decode_field(raw, delimiters))
            .collect();
    }

    segment.pad_to(minimum_field_count(&tag));
    Ok(segment)
}

fn decode_field(raw: &str, delimiters: &Delimiters) -> Field {
    if raw.is_empty() {
        return Field::default();
    }
    Field {
        repetitions: raw
            .split(delimiters.repetition)
            .map(|rep| {
                rep.split(delimiters.component)
                    .map(|component| {
                        component
                            .split(delimiters.subcomponent)
                            .map(|leaf| delimiters.unescape(leaf))
                            .collect()
                    })
                    .collect()
            })
            .collect(),
    }
}
