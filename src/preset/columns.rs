use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::CoerceError;

/// Absent or `null` fields fall back to their defaults; scalar non-string
/// values are stringified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: ColumnType,
    #[serde(default)]
    pub important: Importance,
    #[serde(default, deserialize_with = "lenient_string")]
    pub write: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, value: impl Into<String>, write: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: ColumnType::Text,
            important: Importance::No,
            write: write.into(),
        }
    }

    pub fn with_kind(mut self, kind: ColumnType) -> Self {
        self.kind = kind;
        self
    }

    pub fn required(mut self) -> Self {
        self.important = Importance::Yes;
        self
    }

    pub fn is_required(&self) -> bool {
        self.important == Importance::Yes
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Boolean,
    Json,
    /// A type name this crate does not know; handled like `Text`.
    Other(String),
}

impl ColumnType {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Boolean => "boolean",
            ColumnType::Json => "json",
            ColumnType::Other(name) => name,
        }
    }

    pub fn coerce(&self, raw: &str) -> Result<Value, CoerceError> {
        match self {
            ColumnType::Number => coerce_number(raw),
            ColumnType::Boolean => Ok(Value::Bool(coerce_bool(raw))),
            ColumnType::Text | ColumnType::Json | ColumnType::Other(_) => {
                Ok(Value::String(raw.to_string()))
            }
        }
    }
}

impl From<String> for ColumnType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "" | "text" => ColumnType::Text,
            "number" => ColumnType::Number,
            "boolean" => ColumnType::Boolean,
            "json" => ColumnType::Json,
            _ => ColumnType::Other(name),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(lenient_string(deserializer)?.into())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Importance {
    Yes,
    #[default]
    No,
}

impl Serialize for Importance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            Importance::Yes => "yes",
            Importance::No => "no",
        })
    }
}

impl<'de> Deserialize<'de> for Importance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match lenient_string(deserializer)?.as_str() {
            "yes" => Importance::Yes,
            _ => Importance::No,
        })
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

fn coerce_number(raw: &str) -> Result<Value, CoerceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::from(0));
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Value::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| CoerceError::InvalidNumber {
            input: raw.to_string(),
        })
}

fn coerce_bool(raw: &str) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "off" | "0" => false,
        _ => true,
    }
}
