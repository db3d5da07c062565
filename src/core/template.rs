//! Message template parsing
//!
//! A template is literal text interleaved with named holes:
//!
//! ```text
//! User {user} logged in from {ip}
//! Payload {@body} took {elapsed:.2f} ms, retry token {$token}
//! ```
//!
//! * `{{` and `}}` are literal braces.
//! * A hole body is `[sigil]name[:format]`. The `@` sigil captures the
//!   value as structured data, `$` forces it to a string.
//! * `format` is carried through untouched to the renderer.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::core::template::{parse, Operator, Segment};
//!
//! let template = parse("Count: {count:05d}").unwrap();
//! let holes = template.holes().collect::<Vec<_>>();
//! assert_eq!(holes[0].name, "count");
//! assert_eq!(holes[0].format.as_deref(), Some("05d"));
//! assert_eq!(holes[0].operator, Operator::Default);
//! assert!(matches!(template.segments()[0], Segment::Text(_)));
//! ```

use super::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// Sigil selecting [`Operator::Structure`]
pub const STRUCTURE_SIGIL: char = '@';
/// Sigil selecting [`Operator::Stringify`]
pub const STRINGIFY_SIGIL: char = '$';

/// How a hole's value is captured into the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// Keep the value as-is, by JSON type
    #[default]
    Default,
    /// Convert the value to its display string
    Stringify,
    /// Keep structured data; decode strings that hold a JSON object or array
    Structure,
}

impl Operator {
    fn sigil(&self) -> Option<char> {
        match self {
            Operator::Default => None,
            Operator::Stringify => Some(STRINGIFY_SIGIL),
            Operator::Structure => Some(STRUCTURE_SIGIL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hole {
    pub name: String,
    pub format: Option<String>,
    pub operator: Operator,
}

impl fmt::Display for Hole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        if let Some(sigil) = self.operator.sigil() {
            write!(f, "{}", sigil)?;
        }
        f.write_str(&self.name)?;
        if let Some(ref format) = self.format {
            write!(f, ":{}", format)?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Text(String),
    Hole(Hole),
}

/// A parsed message template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for unterminated holes, empty names and
    /// names containing characters other than letters, digits or `_`.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        parse(source)
    }

    /// A template with no holes that renders `text` verbatim
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Text(text.clone())]
        };
        Self {
            source: text,
            segments,
        }
    }

    /// The original template string
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn holes(&self) -> impl Iterator<Item = &Hole> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Hole(hole) => Some(hole),
            Segment::Text(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Placeholder metadata of a template, in order of appearance
pub fn extract_holes(template: &Template) -> Vec<Hole> {
    template.holes().cloned().collect()
}

/// Parse a template string into text and hole segments
///
/// # Errors
///
/// See [`Template::parse`].
pub fn parse(source: &str) -> Result<Template, ParseError> {
    let bytes = source.as_bytes();
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut run_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                text.push_str(&source[run_start..i]);
                text.push('{');
                i += 2;
                run_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                text.push_str(&source[run_start..i]);
                text.push('}');
                i += 2;
                run_start = i;
            }
            b'{' => {
                text.push_str(&source[run_start..i]);
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                let close = source[i + 1..]
                    .find('}')
                    .map(|offset| i + 1 + offset)
                    .ok_or(ParseError::UnterminatedHole { position: i })?;
                segments.push(Segment::Hole(parse_hole(source, i, close)?));
                i = close + 1;
                run_start = i;
            }
            _ => i += 1,
        }
    }

    text.push_str(&source[run_start..]);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(Template {
        source: source.to_string(),
        segments,
    })
}

/// Parse the body between `open` (`{`) and `close` (`}`)
fn parse_hole(source: &str, open: usize, close: usize) -> Result<Hole, ParseError> {
    let body_start = open + 1;
    let body = &source[body_start..close];

    let (operator, name_start) = match body.chars().next() {
        Some(STRUCTURE_SIGIL) => (Operator::Structure, body_start + 1),
        Some(STRINGIFY_SIGIL) => (Operator::Stringify, body_start + 1),
        _ => (Operator::Default, body_start),
    };

    let rest = &source[name_start..close];
    let (name, format) = match rest.find(':') {
        Some(colon) => (&rest[..colon], Some(rest[colon + 1..].to_string())),
        None => (rest, None),
    };

    if name.is_empty() {
        return Err(ParseError::EmptyName { position: open });
    }

    if let Some((offset, character)) = name
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
    {
        return Err(ParseError::InvalidCharacter {
            position: name_start + offset,
            character,
        });
    }

    Ok(Hole {
        name: name.to_string(),
        format,
        operator,
    })
}

impl FromStr for Template {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Re-serializes the segments, escaping literal braces
impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => {
                    for c in text.chars() {
                        match c {
                            '{' => f.write_str("{{")?,
                            '}' => f.write_str("}}")?,
                            c => write!(f, "{}", c)?,
                        }
                    }
                }
                Segment::Hole(hole) => write!(f, "{}", hole)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(name: &str, format: Option<&str>, operator: Operator) -> Segment {
        Segment::Hole(Hole {
            name: name.to_string(),
            format: format.map(str::to_string),
            operator,
        })
    }

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_empty_template() {
        let template = parse("").unwrap();
        assert!(template.is_empty());
        assert_eq!(template.source(), "");
    }

    #[test]
    fn test_text_and_holes() {
        let template = parse("User {user} logged in from {ip}").unwrap();
        assert_eq!(
            template.segments(),
            &[
                text("User "),
                hole("user", None, Operator::Default),
                text(" logged in from "),
                hole("ip", None, Operator::Default),
            ]
        );
    }

    #[test]
    fn test_escaped_braces() {
        let template = parse("{{literal}} and }} alone").unwrap();
        assert_eq!(template.segments(), &[text("{literal} and } alone")]);
    }

    #[test]
    fn test_lone_closing_brace_is_text() {
        let template = parse("a } b").unwrap();
        assert_eq!(template.segments(), &[text("a } b")]);
    }

    #[test]
    fn test_operators_and_format() {
        let template = parse("{@body}{$token}{elapsed:.2f}").unwrap();
        assert_eq!(
            template.segments(),
            &[
                hole("body", None, Operator::Structure),
                hole("token", None, Operator::Stringify),
                hole("elapsed", Some(".2f"), Operator::Default),
            ]
        );
    }

    #[test]
    fn test_format_is_opaque() {
        let template = parse("{when:yyyy-MM-dd HH:mm}").unwrap();
        let holes = extract_holes(&template);
        assert_eq!(holes[0].format.as_deref(), Some("yyyy-MM-dd HH:mm"));
    }

    #[test]
    fn test_unterminated_hole() {
        assert_eq!(
            parse("Hello {name"),
            Err(ParseError::UnterminatedHole { position: 6 })
        );
    }

    #[test]
    fn test_empty_names() {
        assert_eq!(parse("a {} b"), Err(ParseError::EmptyName { position: 2 }));
        assert_eq!(parse("{:d}"), Err(ParseError::EmptyName { position: 0 }));
        assert_eq!(parse("{@}"), Err(ParseError::EmptyName { position: 0 }));
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            parse("{user name}"),
            Err(ParseError::InvalidCharacter {
                position: 5,
                character: ' '
            })
        );
        assert_eq!(
            parse("{@$x}"),
            Err(ParseError::InvalidCharacter {
                position: 2,
                character: '$'
            })
        );
        assert!(matches!(
            parse("{a{b}"),
            Err(ParseError::InvalidCharacter { character: '{', .. })
        ));
    }

    #[test]
    fn test_unicode_text_and_names() {
        let template = parse("héllo {naïve} ✓").unwrap();
        assert_eq!(
            template.segments(),
            &[
                text("héllo "),
                hole("naïve", None, Operator::Default),
                text(" ✓"),
            ]
        );
    }

    #[test]
    fn test_display_round_trip() {
        let source = "{{x}} {@a:fmt} and {$b} }} {c}";
        let template = parse(source).unwrap();
        let reparsed = parse(&template.to_string()).unwrap();
        assert_eq!(template.segments(), reparsed.segments());
    }

    #[test]
    fn test_repeated_holes() {
        let template = parse("{x} + {x}").unwrap();
        assert_eq!(template.holes().count(), 2);
    }

    #[test]
    fn test_literal_template() {
        let template = Template::literal("{not a hole");
        assert_eq!(template.segments(), &[text("{not a hole")]);
        assert_eq!(template.source(), "{not a hole");
    }
}
