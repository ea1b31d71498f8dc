//! DMI descriptor parsing and rendering
//!
//! A DMI file carries its state table as plain text in the PNG `Description`
//! chunk:
//!
//! ```text
//! # BEGIN DMI
//! version = 4.0
//! 	width = 32
//! 	height = 32
//! state = "box"
//! 	dirs = 4
//! 	frames = 2
//! 	delay = 1,2
//! # END DMI
//! ```
//!
//! Unindented body lines open a state, tab-indented lines are attributes of
//! the most recently opened state. Every line is classified once and checked
//! once, so a malformed descriptor fails on the exact line that broke it.

use serde::Serialize;

use crate::error::{ConvertError, Result};

/// First line of every descriptor
pub const BEGIN_MARKER: &str = "# BEGIN DMI";
/// Last line of every descriptor
pub const END_MARKER: &str = "# END DMI";

const SEPARATOR: &str = " = ";
const INDENT: char = '\t';

/// Index of the first state line; line 3 holds `height`, which is never read.
const FIRST_STATE_LINE: usize = 4;

/// Value of a state attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// All-digit value, e.g. `dirs = 4`
    Integer(u64),
    /// Comma separated value, e.g. `hotspot = 12,13,1`
    List(Vec<f64>),
}

/// An attribute the converter keeps but does not interpret (`rewind`, `loop`, `hotspot`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
}

/// One state entry of the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDescriptor {
    pub name: String,
    /// Direction count: 1, 4 or 8
    pub dirs: u32,
    /// Frames per direction
    pub frames: u32,
    /// Per-frame delays in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Attribute>,
}

impl StateDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), dirs: 1, frames: 1, delay: None, extra: Vec::new() }
    }

    /// Number of sheet cells this state occupies, saturating at `u32::MAX`.
    pub fn cell_count(&self) -> u32 {
        self.dirs.saturating_mul(self.frames)
    }
}

/// A parsed descriptor: header plus the ordered state table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub version: String,
    pub width: u32,
    pub height: u32,
    pub states: Vec<StateDescriptor>,
}

impl Descriptor {
    /// Total cells consumed by all states, laid out contiguously from cell 0.
    pub fn total_cells(&self) -> u32 {
        self.states.iter().map(StateDescriptor::cell_count).fold(0, u32::saturating_add)
    }
}

/// A classified body line.
#[derive(Debug, PartialEq)]
enum Line<'a> {
    State(String),
    Attribute { key: &'a str, value: &'a str },
}

/// Split `key = value`, rejecting lines without exactly one separator.
fn split_pair(line: &str, number: usize) -> Result<(&str, &str)> {
    let mut parts = line.split(SEPARATOR);
    let key = parts.next().unwrap_or_default();
    let value = parts
        .next()
        .ok_or_else(|| ConvertError::parse(number, format!("expected 'key = value', got '{}'", line)))?;
    if parts.next().is_some() {
        return Err(ConvertError::parse(
            number,
            format!("more than one '{}' separator in '{}'", SEPARATOR.trim(), line),
        ));
    }
    Ok((key, value))
}

fn classify(line: &str, number: usize) -> Result<Line<'_>> {
    let (key, value) = split_pair(line, number)?;
    match key.strip_prefix(INDENT) {
        Some(key) => Ok(Line::Attribute { key, value }),
        None => Ok(Line::State(value.replace('"', ""))),
    }
}

/// Parse an attribute value: all digits is an integer, anything with a comma
/// is a list of floats, everything else is rejected.
fn parse_value(raw: &str, number: usize) -> Result<AttributeValue> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse::<u64>()
            .map(AttributeValue::Integer)
            .map_err(|e| ConvertError::parse(number, format!("'{}': {}", raw, e)));
    }

    if raw.contains(',') {
        // A lone trailing comma marks a single-element list.
        let body = raw.strip_suffix(',').unwrap_or(raw);
        return body
            .split(',')
            .map(|token| {
                token
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        ConvertError::parse(number, format!("'{}' in '{}' is not a number", token, raw))
                    })
            })
            .collect::<Result<Vec<_>>>()
            .map(AttributeValue::List);
    }

    Err(ConvertError::parse(number, format!("unable to find value format for '{}'", raw)))
}

fn expect_integer(key: &str, value: AttributeValue, number: usize) -> Result<u32> {
    match value {
        AttributeValue::Integer(n) => u32::try_from(n)
            .map_err(|_| ConvertError::parse(number, format!("{} value {} is too large", key, n))),
        AttributeValue::List(_) => {
            Err(ConvertError::parse(number, format!("{} must be an integer", key)))
        }
    }
}

fn apply_attribute(
    state: &mut StateDescriptor,
    key: &str,
    value: AttributeValue,
    number: usize,
) -> Result<()> {
    match key {
        "dirs" => {
            let dirs = expect_integer(key, value, number)?;
            if !matches!(dirs, 1 | 4 | 8) {
                return Err(ConvertError::parse(
                    number,
                    format!("state '{}' has {} directions, expected 1, 4 or 8", state.name, dirs),
                ));
            }
            state.dirs = dirs;
        }
        "frames" => {
            let frames = expect_integer(key, value, number)?;
            if frames == 0 {
                return Err(ConvertError::parse(
                    number,
                    format!("state '{}' has zero frames", state.name),
                ));
            }
            state.frames = frames;
        }
        // Stored in tenths of a second
        "delay" => {
            let tenths = match value {
                AttributeValue::Integer(n) => vec![n as f64],
                AttributeValue::List(list) => list,
            };
            state.delay = Some(tenths.into_iter().map(|d| d / 10.0).collect());
        }
        _ => state.extra.push(Attribute { key: key.to_string(), value }),
    }
    if state.dirs.checked_mul(state.frames).is_none() {
        return Err(ConvertError::parse(
            number,
            format!("state '{}' has too many cells ({} dirs x {} frames)", state.name, state.dirs, state.frames),
        ));
    }
    Ok(())
}

fn header_value<'a>(lines: &[&'a str], index: usize, expected: &str) -> Result<&'a str> {
    let number = index + 1;
    let line = lines
        .get(index)
        .ok_or_else(|| ConvertError::parse(number, format!("missing '{}' line", expected)))?;
    let (key, value) = split_pair(line, number)?;
    if key.trim_start_matches(INDENT) != expected {
        return Err(ConvertError::parse(
            number,
            format!("expected '{}', found '{}'", expected, key.trim()),
        ));
    }
    Ok(value)
}

/// Parse a DMI descriptor into its header and ordered state table.
///
/// Height is read from the `width` line. DMI cells are square in practice and
/// the `height` line is skipped, matching the format as written by the engine.
///
/// # Errors
///
/// `MetadataParseError` naming the 1-based line for missing markers, a line
/// with zero or several ` = ` separators, an attribute before any state, or a
/// value that is neither all digits nor a comma separated list of numbers.
pub fn parse_descriptor(text: &str) -> Result<Descriptor> {
    let lines: Vec<&str> = text.lines().collect();

    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .ok_or_else(|| ConvertError::parse(1, "descriptor is empty"))?;
    if lines[0].trim() != BEGIN_MARKER {
        return Err(ConvertError::parse(1, format!("expected '{}'", BEGIN_MARKER)));
    }
    if lines[end].trim() != END_MARKER {
        return Err(ConvertError::parse(end + 1, format!("expected '{}'", END_MARKER)));
    }
    if end < FIRST_STATE_LINE - 1 {
        return Err(ConvertError::parse(end + 1, "descriptor header is truncated"));
    }

    let version = header_value(&lines, 1, "version")?.to_string();
    let width_raw = header_value(&lines, 2, "width")?;
    let width = match parse_value(width_raw, 3)? {
        AttributeValue::Integer(n) => u32::try_from(n)
            .ok()
            .filter(|&w| w > 0)
            .ok_or_else(|| ConvertError::parse(3, format!("invalid width {}", n)))?,
        AttributeValue::List(_) => return Err(ConvertError::parse(3, "width must be an integer")),
    };

    let mut states: Vec<StateDescriptor> = Vec::new();
    for (index, line) in lines.iter().enumerate().take(end).skip(FIRST_STATE_LINE) {
        let number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        match classify(line, number)? {
            Line::State(name) => states.push(StateDescriptor::new(name)),
            Line::Attribute { key, value } => {
                let state = states.last_mut().ok_or_else(|| {
                    ConvertError::parse(number, format!("attribute '{}' before any state", key))
                })?;
                let value = parse_value(value, number)?;
                apply_attribute(state, key, value, number)?;
            }
        }
    }

    states
        .iter()
        .try_fold(0u32, |total, state| total.checked_add(state.cell_count()))
        .ok_or_else(|| ConvertError::parse(end + 1, "states need more cells than a sheet can hold"))?;

    Ok(Descriptor { version, width, height: width, states })
}

fn format_number(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    format!("{}", rounded)
}

fn format_list(values: &[f64]) -> String {
    let joined = values.iter().map(|v| format_number(*v)).collect::<Vec<_>>().join(",");
    if values.len() == 1 {
        format!("{},", joined)
    } else {
        joined
    }
}

fn format_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Integer(n) => n.to_string(),
        AttributeValue::List(list) => format_list(list),
    }
}

/// Render a descriptor back to DMI text, delays converted back to tenths.
///
/// The output parses back to an equal [`Descriptor`].
pub fn render_descriptor(descriptor: &Descriptor) -> String {
    let mut out = String::new();
    out.push_str(BEGIN_MARKER);
    out.push('\n');
    out.push_str(&format!("version = {}\n", descriptor.version));
    out.push_str(&format!("{}width = {}\n", INDENT, descriptor.width));
    out.push_str(&format!("{}height = {}\n", INDENT, descriptor.height));

    for state in &descriptor.states {
        out.push_str(&format!("state = \"{}\"\n", state.name));
        out.push_str(&format!("{}dirs = {}\n", INDENT, state.dirs));
        out.push_str(&format!("{}frames = {}\n", INDENT, state.frames));
        if let Some(delay) = &state.delay {
            let tenths: Vec<f64> = delay.iter().map(|d| d * 10.0).collect();
            let rendered = match tenths.as_slice() {
                [single] if single.fract() == 0.0 && *single >= 0.0 => format!("{}", *single as u64),
                _ => format_list(&tenths),
            };
            out.push_str(&format!("{}delay = {}\n", INDENT, rendered));
        }
        for attribute in &state.extra {
            out.push_str(&format!("{}{} = {}\n", INDENT, attribute.key, format_value(&attribute.value)));
        }
    }

    out.push_str(END_MARKER);
    out.push('\n');
    out
}
