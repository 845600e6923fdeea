//! Message delimiters and the HL7 escape scheme
//!
//! Delimiters are message-local: MSH-1 and MSH-2 declare them and every other
//! segment in the message is parsed and rendered with that set.

use crate::domain::MappingError;
use serde::{Deserialize, Serialize};

/// The five HL7 v2 delimiter characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Delimiters {
    /// Reads the delimiter set from the fixed positions of an MSH segment
    ///
    /// MSH-1 is the character right after the tag and MSH-2 holds the
    /// component, repetition, escape and (optionally) subcomponent characters.
    ///
    /// # Errors
    ///
    /// Returns a mapping error if the line is not an MSH segment or the
    /// declared characters are unusable.
    pub fn from_msh(line: &str) -> Result<Self, MappingError> {
        if !line.starts_with("MSH") {
            return Err(MappingError::MissingMsh(line.chars().take(3).collect()));
        }

        let chars: Vec<char> = line.chars().skip(3).take(5).collect();
        if chars.len() < 4 {
            return Err(MappingError::InvalidDelimiters(
                "MSH segment too short to declare delimiters".to_string(),
            ));
        }

        let field = chars[0];
        let subcomponent = match chars.get(4) {
            Some(&c) if c != field => c,
            _ => '&',
        };

        let delimiters = Self {
            field,
            component: chars[1],
            repetition: chars[2],
            escape: chars[3],
            subcomponent,
        };
        delimiters.validate()?;
        Ok(delimiters)
    }

    /// Checks that the characters are distinct and usable as separators
    pub fn validate(&self) -> Result<(), MappingError> {
        let all = self.as_array();
        for (i, c) in all.iter().enumerate() {
            if c.is_alphanumeric() || c.is_whitespace() {
                return Err(MappingError::InvalidDelimiters(format!(
                    "'{}' cannot be used as a delimiter",
                    c.escape_default()
                )));
            }
            if all[i + 1..].contains(c) {
                return Err(MappingError::InvalidDelimiters(format!(
                    "'{c}' is declared more than once"
                )));
            }
        }
        Ok(())
    }

    /// MSH-2 value: component, repetition, escape and subcomponent characters
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    fn as_array(&self) -> [char; 5] {
        [
            self.field,
            self.component,
            self.repetition,
            self.escape,
            self.subcomponent,
        ]
    }

    /// Escapes delimiter characters in a leaf value
    ///
    /// `\F\` field, `\S\` component, `\T\` subcomponent, `\R\` repetition,
    /// `\E\` escape (shown with the default escape character). Carriage
    /// returns and line feeds become `\X0D\` and `\X0A\`.
    pub fn escape(&self, value: &str) -> String {
        if !value
            .chars()
            .any(|c| c == '\r' || c == '\n' || self.as_array().contains(&c))
        {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len() + 8);
        for c in value.chars() {
            let code = if c == self.field {
                Some('F')
            } else if c == self.component {
                Some('S')
            } else if c == self.subcomponent {
                Some('T')
            } else if c == self.repetition {
                Some('R')
            } else if c == self.escape {
                Some('E')
            } else {
                None
            };

            if c == '\r' || c == '\n' {
                out.push(self.escape);
                out.push_str(&format!("X{:02X}", u32::from(c)));
                out.push(self.escape);
                continue;
            }

            match code {
                Some(code) => {
                    out.push(self.escape);
                    out.push(code);
                    out.push(self.escape);
                }
                None => out.push(c),
            }
        }
        out
    }

    /// Reverses [`Delimiters::escape`]
    ///
    /// Hex sequences such as `\X0D\` decode to their characters.
    /// Unrecognised sequences such as `\.br\`, malformed hex and unterminated
    /// escapes are kept verbatim.
    pub fn unescape(&self, value: &str) -> String {
        if !value.contains(self.escape) {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find(self.escape) {
            out.push_str(&rest[..start]);
            let after = &rest[start + self.escape.len_utf8()..];

            let Some(end) = after.find(self.escape) else {
                out.push_str(&rest[start..]);
                return out;
            };

            let sequence = &after[..end];
            match sequence {
                "F" => out.push(self.field),
                "S" => out.push(self.component),
                "T" => out.push(self.subcomponent),
                "R" => out.push(self.repetition),
                "E" => out.push(self.escape),
                _ => match decode_hex(sequence) {
                    Some(text) => out.push_str(&text),
                    None => {
                        out.push(self.escape);
                        out.push_str(sequence);
                        out.push(self.escape);
                    }
                },
            }
            rest = &after[end + self.escape.len_utf8()..];
        }
        out.push_str(rest);
        out
    }
}

/// Decodes the body of an `Xhh..` escape as UTF-8
fn decode_hex(sequence: &str) -> Option<String> {
    let digits = sequence.strip_prefix('X')?;
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encoding_characters() {
        assert_eq!(Delimiters::default().encoding_characters(), "^~\\&");
    }

    #[test]
    fn test_from_msh_default() {
        let d = Delimiters::from_msh("MSH|^~\\&|APP|FAC").unwrap();
        assert_eq!(d, Delimiters::default());
    }

    #[test]
    fn test_from_msh_custom() {
        let d = Delimiters::from_msh("MSH#*!@%#APP").unwrap();
        assert_eq!(d.field, '#');
        assert_eq!(d.component, '*');
        assert_eq!(d.repetition, '!');
        assert_eq!(d.escape, '@');
        assert_eq!(d.subcomponent, '%');
    }

    #[test]
    fn test_from_msh_without_subcomponent() {
        let d = Delimiters::from_msh("MSH|^~\\|APP").unwrap();
        assert_eq!(d.subcomponent, '&');
    }

    #[test]
    fn test_from_msh_rejects_non_msh() {
        assert!(matches!(
            Delimiters::from_msh("PID|1"),
            Err(MappingError::MissingMsh(_))
        ));
    }

    #[test]
    fn test_from_msh_rejects_duplicates() {
        assert!(matches!(
            Delimiters::from_msh("MSH|^^\\&|APP"),
            Err(MappingError::InvalidDelimiters(_))
        ));
    }

    #[test]
    fn test_from_msh_rejects_alphanumeric() {
        assert!(Delimiters::from_msh("MSH|A~\\&|APP").is_err());
    }

    #[test]
    fn test_from_msh_too_short() {
        assert!(Delimiters::from_msh("MSH|^").is_err());
    }

    #[test]
    fn test_escape_all_delimiters() {
        let d = Delimiters::default();
        assert_eq!(d.escape("a|b^c~d\\e&f"), "a\\F\\b\\S\\c\\R\\d\\E\\e\\T\\f");
    }

    #[test]
    fn test_escape_plain_value_unchanged() {
        assert_eq!(Delimiters::default().escape("Glucose 95"), "Glucose 95");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let d = Delimiters::default();
        let original = "O'Brien^Jr|x~y&z\\w";
        assert_eq!(d.unescape(&d.escape(original)), original);
    }

    #[test]
    fn test_unescape_keeps_unknown_sequences() {
        let d = Delimiters::default();
        assert_eq!(d.unescape("line1\\.br\\line2"), "line1\\.br\\line2");
        assert_eq!(d.unescape("\\XZZ\\"), "\\XZZ\\");
        assert_eq!(d.unescape("\\X0\\"), "\\X0\\");
    }

    #[test]
    fn test_escape_line_breaks_as_hex() {
        let d = Delimiters::default();
        let escaped = d.escape("95\rOBX|99\nmore");
        assert_eq!(escaped, "95\\X0D\\OBX\\F\\99\\X0A\\more");
        assert!(!escaped.contains(['\r', '\n']));
        assert_eq!(d.unescape(&escaped), "95\rOBX|99\nmore");
    }

    #[test]
    fn test_unescape_hex_sequences() {
        let d = Delimiters::default();
        assert_eq!(d.unescape("a\\X0D0A\\b"), "a\r\nb");
        assert_eq!(d.unescape("\\X41\\"), "A");
    }

    #[test]
    fn test_unescape_unterminated() {
        let d = Delimiters::default();
        assert_eq!(d.unescape("abc\\F"), "abc\\F");
    }

    #[test]
    fn test_custom_escape_character() {
        let d = Delimiters::from_msh("MSH|^~#&|APP").unwrap();
        assert_eq!(d.escape("a^b"), "a#S#b");
        assert_eq!(d.unescape("a#S#b"), "a^b");
    }
}
