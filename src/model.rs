use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    error::{InvalidPresetFormat, RowError},
    preset::{self, ParsedPreset},
    render::{self, Export},
};

pub const ROW_ID_KEY: &str = "__id";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "__id", default = "new_row_id")]
    pub id: String,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

impl Row {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            id: new_row_id(),
            values,
        }
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Builds a row from `KEY=VALUE` inputs, coercing each value with the
    /// type of the matching column.
    pub fn from_pairs<I, S>(preset: &ParsedPreset, pairs: I) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = Map::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, raw) = pair
                .split_once('=')
                .ok_or_else(|| RowError::MalformedPair(pair.to_string()))?;
            let column = preset
                .column(key)
                .ok_or_else(|| RowError::UnknownColumn(key.to_string()))?;
            let value = column.kind.coerce(raw).map_err(|source| RowError::Coerce {
                column: key.to_string(),
                source,
            })?;
            values.insert(key.to_string(), value);
        }
        Ok(Self::new(values))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// True when the cell is absent, `null` or an empty string.
    pub fn is_empty_cell(&self, key: &str) -> bool {
        match self.values.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub preset_string: String,
    #[serde(default, rename = "data")]
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, preset_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preset_string: preset_string.into(),
            rows: Vec::new(),
        }
    }

    pub fn preset(&self) -> Result<ParsedPreset, InvalidPresetFormat> {
        preset::parse(&self.preset_string)
    }

    pub fn export(&self) -> Result<Export, InvalidPresetFormat> {
        let preset = self.preset()?;
        Ok(render::export(&self.name, &preset, &self.rows))
    }
}
