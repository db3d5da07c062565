//! printf-style format specifiers for hole values
//!
//! Grammar: `[flags][width][.precision][conversion]`
//!
//! * flags: `-` left-align, `0` zero-pad, `+` always sign, ` ` space for
//!   positive numbers, `#` alternate form (`0x`, `0o`, `0b` prefixes)
//! * conversions: `d i u` integers, `x X o b` integer bases, `f F e E`
//!   floating point, `s` string. No conversion applies width and
//!   precision to the value's textual form.
//!
//! A specifier that does not parse, or that does not apply to the value's
//! kind (e.g. `d` on a string), yields `None` and the caller renders the
//! raw value. Widths and precisions above [`MAX_FIELD`] count as not
//! parsing.

use super::property::display_value;
use serde_json::{Number, Value};

/// Largest accepted width or precision
pub const MAX_FIELD: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Flags {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    alternate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: Option<char>,
}

impl FormatSpec {
    /// Parse a specifier; `None` when it is not printf-shaped
    pub fn parse(spec: &str) -> Option<Self> {
        let mut chars = spec.chars().peekable();
        let mut flags = Flags::default();

        while let Some(&c) = chars.peek() {
            match c {
                '-' => flags.left = true,
                '0' => flags.zero = true,
                '+' => flags.plus = true,
                ' ' => flags.space = true,
                '#' => flags.alternate = true,
                _ => break,
            }
            chars.next();
        }

        let width = take_number(&mut chars);

        let precision = if chars.peek() == Some(&'.') {
            chars.next();
            Some(take_number(&mut chars).unwrap_or(0))
        } else {
            None
        };

        if width.is_some_and(|w| w > MAX_FIELD) || precision.is_some_and(|p| p > MAX_FIELD) {
            return None;
        }

        let conversion = chars.next();
        if chars.next().is_some() {
            return None;
        }
        if let Some(c) = conversion {
            if !"diuxXobfFeEs".contains(c) {
                return None;
            }
        }

        Some(Self {
            flags,
            width,
            precision,
            conversion,
        })
    }

    /// Format a value; `None` when the specifier does not apply to it
    pub fn apply(&self, value: &Value) -> Option<String> {
        match (self.conversion, value) {
            (Some('d' | 'i' | 'u'), Value::Number(n)) => {
                let (negative, magnitude) = integer_parts(n)?;
                Some(self.pad_number(negative, "", magnitude.to_string()))
            }
            (Some(radix @ ('x' | 'X' | 'o' | 'b')), Value::Number(n)) => {
                let (negative, magnitude) = integer_parts(n)?;
                let (digits, prefix) = match radix {
                    'x' => (format!("{:x}", magnitude), "0x"),
                    'X' => (format!("{:X}", magnitude), "0X"),
                    'o' => (format!("{:o}", magnitude), "0o"),
                    _ => (format!("{:b}", magnitude), "0b"),
                };
                let prefix = if self.flags.alternate { prefix } else { "" };
                Some(self.pad_number(negative, prefix, digits))
            }
            (Some(conv @ ('f' | 'F' | 'e' | 'E')), Value::Number(n)) => {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                let precision = self.precision.unwrap_or(6);
                let digits = match conv {
                    'f' | 'F' => format!("{:.*}", precision, f.abs()),
                    'e' => exponent(f.abs(), precision, false),
                    _ => exponent(f.abs(), precision, true),
                };
                Some(self.pad_number(f.is_sign_negative() && f != 0.0, "", digits))
            }
            (Some('s') | None, Value::String(s)) => Some(self.pad_text(s)),
            (Some('s') | None, Value::Bool(_)) => Some(self.pad_text(&display_value(value))),
            (None, Value::Number(n)) => {
                let text = n.to_string();
                match text.strip_prefix('-') {
                    Some(digits) => Some(self.pad_number(true, "", digits.to_string())),
                    None => Some(self.pad_number(false, "", text)),
                }
            }
            (Some('s'), Value::Number(_)) => Some(self.pad_text(&display_value(value))),
            _ => None,
        }
    }

    fn pad_number(&self, negative: bool, prefix: &str, digits: String) -> String {
        let sign = if negative {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        };

        let body_len = sign.len() + prefix.len() + digits.chars().count();
        let width = self.width.unwrap_or(0);
        if body_len >= width {
            return format!("{}{}{}", sign, prefix, digits);
        }

        let fill = width - body_len;
        if self.flags.left {
            format!("{}{}{}{}", sign, prefix, digits, " ".repeat(fill))
        } else if self.flags.zero {
            format!("{}{}{}{}", sign, prefix, "0".repeat(fill), digits)
        } else {
            format!("{}{}{}{}", " ".repeat(fill), sign, prefix, digits)
        }
    }

    fn pad_text(&self, text: &str) -> String {
        let truncated: String = match self.precision {
            Some(p) => text.chars().take(p).collect(),
            None => text.to_string(),
        };
        let width = self.width.unwrap_or(0);
        let len = truncated.chars().count();
        if len >= width {
            return truncated;
        }
        let fill = " ".repeat(width - len);
        if self.flags.left {
            truncated + &fill
        } else {
            fill + &truncated
        }
    }
}

/// Format `value` with `spec`, falling back to its raw textual form
pub fn format_value(value: &Value, spec: &str) -> String {
    FormatSpec::parse(spec)
        .and_then(|s| s.apply(value))
        .unwrap_or_else(|| display_value(value))
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(usize::MAX))
}

/// Sign and magnitude of an integral JSON number
fn integer_parts(n: &Number) -> Option<(bool, u64)> {
    if let Some(u) = n.as_u64() {
        Some((false, u))
    } else {
        n.as_i64().map(|i| (i < 0, i.unsigned_abs()))
    }
}

/// C-style exponent notation: `1.500000e+02`
fn exponent(f: f64, precision: usize, upper: bool) -> String {
    let rust = format!("{:.*e}", precision, f);
    let (mantissa, exp) = rust.split_once('e').unwrap_or((rust.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:02}", mantissa, e, sign, exp.abs())
}
