//! Template rendering and property capture
//!
//! [`render`] produces the display string of an event, [`capture`] the
//! structured properties its holes contribute. Both look values up by hole
//! name in the caller's property list, where later entries win.

use super::format_spec::format_value;
use super::property::{display_value, Properties, Property};
use super::template::{Hole, Operator, Segment, Template};
use serde_json::Value;

/// Render a template against a property list
///
/// Holes with no matching property render as the empty string. Stringify
/// holes are formatted as text, other holes by the value's JSON kind.
pub fn render(template: &Template, properties: &Properties) -> String {
    let mut out = String::with_capacity(template.source().len());
    for segment in template.segments() {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Hole(hole) => {
                if let Some(value) = properties.get(&hole.name) {
                    out.push_str(&render_hole(hole, value));
                }
            }
        }
    }
    out
}

fn render_hole(hole: &Hole, value: &Value) -> String {
    let value = match hole.operator {
        Operator::Stringify => Value::String(display_value(value)),
        Operator::Default | Operator::Structure => value.clone(),
    };
    match hole.format {
        Some(ref spec) => format_value(&value, spec),
        None => display_value(&value),
    }
}

/// Properties captured by a template's holes
///
/// One entry per distinct hole name, in order of first appearance, with the
/// value encoded according to that hole's operator. Holes the caller did not
/// supply are skipped.
pub fn capture(template: &Template, properties: &Properties) -> Properties {
    let mut captured = Properties::new();
    for hole in template.holes() {
        if captured.contains(&hole.name) {
            continue;
        }
        if let Some(value) = properties.get(&hole.name) {
            captured.push_property(Property {
                name: hole.name.clone(),
                value: capture_value(hole.operator, value),
            });
        }
    }
    captured
}

fn capture_value(operator: Operator, value: &Value) -> Value {
    match operator {
        Operator::Default => value.clone(),
        Operator::Stringify => Value::String(display_value(value)),
        Operator::Structure => match value {
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
                _ => value.clone(),
            },
            _ => value.clone(),
        },
    }
}
