//! PPS object text codec
//!
//! PPS objects are exchanged as plain text. A read yields one or more
//! objects, each introduced by an `@name` line and followed by
//! `attribute:encoding:value` lines:
//!
//! ```text
//! @00:11:22:33:44:55
//! cod::0x5a020c
//! name::Phone
//! paired:b:true
//! rssi::-60
//! ```
//!
//! Delta reads may additionally carry `+@name` (object created),
//! `-@name` (object deleted) and `-attribute` (attribute removed) lines.
//!
//! Decoding never fails a whole read. An attribute whose value does not
//! match its encoding is left out of its object and its name is listed in
//! [`PpsMessage::invalid`]; other objects in the same read are unaffected.
//! A line without separators directly after a plain string attribute is
//! taken as a raw line break inside that value.

use std::collections::BTreeMap;
use std::fmt;

/// Attribute set of a PPS object, ordered by attribute name
pub type Attributes = BTreeMap<String, PpsValue>;

/// A single decoded attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum PpsValue {
    /// Plain (`::`) or C-escaped (`:c:`) string
    String(String),
    /// Boolean (`:b:`)
    Bool(bool),
    /// Number (`:n:`)
    Number(f64),
    /// JSON document (`:json:`)
    Json(serde_json::Value),
}

impl PpsValue {
    /// Borrow the value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PpsValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a boolean
    ///
    /// Accepts `:b:` values, the strings `"true"` and `"false"`, which some
    /// publishers emit without an encoding, and numbers (non-zero is true).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PpsValue::Bool(b) => Some(*b),
            PpsValue::Number(n) => Some(*n != 0.0),
            PpsValue::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Render scalar values as text
    ///
    /// Strings are returned as-is and numbers in their shortest form.
    /// Booleans and JSON documents return `None`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            PpsValue::String(s) => Some(s.clone()),
            PpsValue::Number(n) => Some(n.to_string()),
            PpsValue::Bool(_) | PpsValue::Json(_) => None,
        }
    }
}

impl From<&str> for PpsValue {
    fn from(s: &str) -> Self {
        PpsValue::String(s.to_string())
    }
}

impl From<String> for PpsValue {
    fn from(s: String) -> Self {
        PpsValue::String(s)
    }
}

impl From<bool> for PpsValue {
    fn from(b: bool) -> Self {
        PpsValue::Bool(b)
    }
}

impl From<f64> for PpsValue {
    fn from(n: f64) -> Self {
        PpsValue::Number(n)
    }
}

impl fmt::Display for PpsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PpsValue::String(s) => write!(f, "{}", s),
            PpsValue::Bool(b) => write!(f, "{}", b),
            PpsValue::Number(n) => write!(f, "{}", n),
            PpsValue::Json(v) => write!(f, "{}", v),
        }
    }
}

/// How an object changed in a delta read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectChange {
    /// Attributes were set (`@name`)
    Updated,
    /// The object was created (`+@name`)
    Created,
    /// The object was deleted (`-@name`)
    Deleted,
}

/// One object's worth of data from a PPS read
#[derive(Debug, Clone, PartialEq)]
pub struct PpsMessage {
    /// Object name (for `.all` reads this is the file name within the directory)
    pub object: String,
    /// Kind of change reported for the object
    pub change: ObjectChange,
    /// Attributes set in this read
    pub attributes: Attributes,
    /// Attributes removed in this read (`-attribute` lines)
    pub removed: Vec<String>,
    /// Attributes present in this read whose value could not be decoded
    pub invalid: Vec<String>,
}

impl PpsMessage {
    /// Create an empty update message for an object
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            change: ObjectChange::Updated,
            attributes: Attributes::new(),
            removed: Vec::new(),
            invalid: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PpsValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up an attribute
    pub fn get(&self, name: &str) -> Option<&PpsValue> {
        self.attributes.get(name)
    }
}

/// Decode the text of a single PPS read into messages
pub fn decode(text: &str) -> Vec<PpsMessage> {
    let mut messages: Vec<PpsMessage> = Vec::new();
    // Plain string attribute a stray line can continue
    let mut open_string: Option<String> = None;

    for (line_no, line) in text.split('\n').enumerate() {
        if line.is_empty() {
            continue;
        }

        if let Some(object) = line.strip_prefix("-@") {
            let mut message = PpsMessage::new(object);
            message.change = ObjectChange::Deleted;
            messages.push(message);
            open_string = None;
            continue;
        }
        if let Some(object) = line.strip_prefix("+@") {
            let mut message = PpsMessage::new(object);
            message.change = ObjectChange::Created;
            messages.push(message);
            open_string = None;
            continue;
        }
        if let Some(object) = line.strip_prefix('@') {
            messages.push(PpsMessage::new(object));
            open_string = None;
            continue;
        }

        let current = match messages.last_mut() {
            Some(current) => current,
            None => {
                tracing::debug!("Skipping line {} before any object header", line_no + 1);
                continue;
            }
        };

        match decode_attribute(line) {
            AttributeLine::Value(name, value) => {
                open_string = match &value {
                    PpsValue::String(_) if is_plain(line) => Some(name.clone()),
                    _ => None,
                };
                current.invalid.retain(|n| *n != name);
                current.attributes.insert(name, value);
            }
            AttributeLine::Removed(name) => {
                current.removed.push(name);
                open_string = None;
            }
            AttributeLine::Invalid(name, reason) => {
                tracing::debug!(
                    "Dropping attribute {} of {} (line {}): {}",
                    name,
                    current.object,
                    line_no + 1,
                    reason
                );
                current.attributes.remove(&name);
                if !current.invalid.contains(&name) {
                    current.invalid.push(name);
                }
                open_string = None;
            }
            AttributeLine::Unstructured => {
                let continued = open_string
                    .as_ref()
                    .and_then(|name| current.attributes.get_mut(name));
                match continued {
                    Some(PpsValue::String(value)) => {
                        value.push('\n');
                        value.push_str(line);
                    }
                    _ => tracing::debug!(
                        "Skipping unstructured line {} of {}: {:?}",
                        line_no + 1,
                        current.object,
                        line
                    ),
                }
            }
        }
    }

    messages
}

/// Encode an attribute set for writing to a PPS object
pub fn encode(attributes: &Attributes) -> String {
    let mut out = String::new();
    for (name, value) in attributes {
        match value {
            PpsValue::String(s) if needs_escape(s) => {
                out.push_str(&format!("{}:c:{}\n", name, escape(s)));
            }
            PpsValue::String(s) => out.push_str(&format!("{}::{}\n", name, s)),
            PpsValue::Bool(b) => out.push_str(&format!("{}:b:{}\n", name, b)),
            PpsValue::Number(n) => out.push_str(&format!("{}:n:{}\n", name, n)),
            PpsValue::Json(v) => out.push_str(&format!("{}:json:{}\n", name, v)),
        }
    }
    out
}

enum AttributeLine {
    Value(String, PpsValue),
    Removed(String),
    /// Well-formed line whose value does not match its encoding
    Invalid(String, String),
    /// No `name:encoding:` prefix
    Unstructured,
}

fn is_plain(line: &str) -> bool {
    line.split_once(':')
        .map(|(_, rest)| rest.starts_with(':'))
        .unwrap_or(false)
}

fn decode_attribute(line: &str) -> AttributeLine {
    if let Some(name) = line.strip_prefix('-') {
        return AttributeLine::Removed(name.to_string());
    }

    let (name, encoding, raw) = match line.split_once(':').and_then(|(name, rest)| {
        rest.split_once(':')
            .map(|(encoding, raw)| (name, encoding, raw))
    }) {
        Some(parts) if !parts.0.is_empty() => parts,
        _ => return AttributeLine::Unstructured,
    };

    let value = match encoding {
        "" => PpsValue::String(raw.to_string()),
        "b" => match raw {
            "true" => PpsValue::Bool(true),
            "false" => PpsValue::Bool(false),
            other => return AttributeLine::Invalid(name.to_string(), format!("invalid boolean {:?}", other)),
        },
        "n" => match raw.trim().parse::<f64>() {
            Ok(n) => PpsValue::Number(n),
            Err(_) => return AttributeLine::Invalid(name.to_string(), format!("invalid number {:?}", raw)),
        },
        "c" => PpsValue::String(unescape(raw)),
        "json" => match serde_json::from_str(raw) {
            Ok(v) => PpsValue::Json(v),
            Err(e) => return AttributeLine::Invalid(name.to_string(), format!("invalid JSON: {}", e)),
        },
        other => {
            tracing::trace!("Unknown PPS encoding {:?} for {}, keeping raw text", other, name);
            PpsValue::String(raw.to_string())
        }
    };

    AttributeLine::Value(name.to_string(), value)
}

fn needs_escape(s: &str) -> bool {
    s.contains(['\n', '\r', '\\', '\0'])
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
