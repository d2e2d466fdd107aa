use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, de};
use serde_json::Value;
use tracing::debug;

use super::columns::ColumnDef;
use crate::error::InvalidPresetFormat;

pub const DEFAULT_EXPORT_AS: &str = ".txt";

const EXPORT_AS_KEY: &str = "EXPORT-AS";
const WRITE_AS_KEY: &str = "WRITE-AS";

static ENVELOPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[TABLE\((.*?)\):\s*([\s\S]*?)\]$").expect("envelope pattern compiles")
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPreset {
    pub columns: Vec<ColumnDef>,
    pub export_as: String,
    pub write_as: String,
}

impl ParsedPreset {
    /// Last column with the given key, matching how rows are indexed.
    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().rev().find(|col| col.value == key)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|col| col.is_required())
    }
}

/// Envelope and body failures are both reported as [`InvalidPresetFormat`].
pub fn parse(preset: &str) -> Result<ParsedPreset, InvalidPresetFormat> {
    let Some(caps) = ENVELOPE.captures(preset) else {
        debug!("preset does not match the [TABLE(..):..] envelope");
        return Err(InvalidPresetFormat);
    };
    let options = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    let (export_as, write_as) = parse_options(options);

    let columns = parse_columns(body).map_err(|err| {
        debug!(error = %err, "preset body is not a JSON array of columns");
        InvalidPresetFormat
    })?;

    Ok(ParsedPreset {
        columns,
        export_as,
        write_as,
    })
}

fn parse_options(options: &str) -> (String, String) {
    let options = options.strip_suffix(')').unwrap_or(options);
    let mut export_as = DEFAULT_EXPORT_AS.to_string();
    let mut write_as = String::new();

    for opt in options.split(")(") {
        let (key, value) = opt.split_once(':').unwrap_or((opt, ""));
        match key {
            EXPORT_AS_KEY => export_as = value.to_string(),
            WRITE_AS_KEY => write_as = value.to_string(),
            _ => {}
        }
    }

    (export_as, write_as)
}

fn parse_columns(body: &str) -> serde_json::Result<Vec<ColumnDef>> {
    let body = body.trim();
    let items: Vec<Value> = if body.starts_with('[') && body.ends_with(']') {
        serde_json::from_str(body)?
    } else {
        // Older presets stored the column objects without the array brackets.
        serde_json::from_str(&format!("[{body}]"))?
    };

    // Going through a map first keeps the last of any repeated key.
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => serde_json::from_value(Value::Object(map)),
            other => Err(<serde_json::Error as de::Error>::custom(format!(
                "column is not an object: {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::columns::{ColumnType, Importance};

    const JSONL_PRESET: &str = r#"[TABLE(EXPORT-AS:.jsonl)(WRITE-AS:{"prompt":"ID1","completion":"ID2"}):[
 {"name":"Question","value":"q","type":"text","important":"yes","write":"ID1"},
 {"name":"Answer","value":"a","type":"text","important":"no","write":"ID2"}
]]"#;

    #[test]
    fn parses_full_preset() {
        let preset = parse(JSONL_PRESET).unwrap();
        assert_eq!(preset.export_as, ".jsonl");
        assert_eq!(preset.write_as, r#"{"prompt":"ID1","completion":"ID2"}"#);
        assert_eq!(preset.columns.len(), 2);
        assert_eq!(preset.columns[0].name, "Question");
        assert_eq!(preset.columns[0].important, Importance::Yes);
        assert_eq!(preset.columns[1].value, "a");
        assert_eq!(preset.columns[1].write, "ID2");
        assert_eq!(preset.columns[1].kind, ColumnType::Text);
    }

    #[test]
    fn missing_options_use_defaults() {
        let preset = parse(r#"[TABLE(OTHER:1):[{"value":"x","write":"X"}]]"#).unwrap();
        assert_eq!(preset.export_as, ".txt");
        assert_eq!(preset.write_as, "");
        assert_eq!(preset.columns.len(), 1);
    }

    #[test]
    fn option_values_keep_their_colons() {
        let preset =
            parse(r#"[TABLE(EXPORT-AS:.md)(WRITE-AS:see https://example.com/ID1 at C:\x):[]]"#)
                .unwrap();
        assert_eq!(preset.write_as, r"see https://example.com/ID1 at C:\x");
        assert!(preset.columns.is_empty());
    }

    #[test]
    fn option_without_colon_is_empty() {
        let preset = parse("[TABLE(EXPORT-AS):[]]").unwrap();
        assert_eq!(preset.export_as, "");
    }

    #[test]
    fn template_ending_in_paren_loses_it() {
        // The lazy envelope stops at the first "):" and one trailing ")" is stripped.
        let preset =
            parse(r#"[TABLE(EXPORT-AS:.txt)(WRITE-AS:(ID1)):[{"value":"x","write":"ID1"}]]"#)
                .unwrap();
        assert_eq!(preset.write_as, "(ID1");
    }

    #[test]
    fn legacy_body_without_brackets() {
        let bare = parse(
            r#"[TABLE(EXPORT-AS:.csv)(WRITE-AS:X):{"name":"A","value":"a","type":"text","important":"yes","write":"X"}]"#,
        )
        .unwrap();
        let wrapped = parse(
            r#"[TABLE(EXPORT-AS:.csv)(WRITE-AS:X):[{"name":"A","value":"a","type":"text","important":"yes","write":"X"}]]"#,
        )
        .unwrap();
        assert_eq!(bare, wrapped);
    }

    #[test]
    fn legacy_body_with_several_objects() {
        let preset = parse(
            r#"[TABLE(EXPORT-AS:.csv)(WRITE-AS:A,B):{"value":"a","write":"A"},{"value":"b","write":"B"}]"#,
        )
        .unwrap();
        assert_eq!(preset.columns.len(), 2);
    }

    #[test]
    fn repeated_column_key_keeps_last_value() {
        let preset = parse(
            r#"[TABLE(EXPORT-AS:.csv)(WRITE-AS:X):[{"name":"a","name":"b","value":"x","write":"X"}]]"#,
        )
        .unwrap();
        assert_eq!(preset.columns[0].name, "b");
        assert_eq!(preset.columns[0].value, "x");
    }

    #[test]
    fn invalid_envelope_fails() {
        assert_eq!(parse("hello world"), Err(InvalidPresetFormat));
        assert_eq!(parse(""), Err(InvalidPresetFormat));
        assert_eq!(parse("[TABLE(EXPORT-AS:.csv)[]]"), Err(InvalidPresetFormat));
    }

    #[test]
    fn invalid_body_fails() {
        assert_eq!(
            parse("[TABLE(EXPORT-AS:.csv)(WRITE-AS:X):not json]"),
            Err(InvalidPresetFormat)
        );
        assert_eq!(
            parse("[TABLE(EXPORT-AS:.csv)(WRITE-AS:X):[1, 2]]"),
            Err(InvalidPresetFormat)
        );
    }

    #[test]
    fn keys_are_case_sensitive() {
        let preset = parse("[TABLE(export-as:.csv)(WRITE-AS:X):[]]").unwrap();
        assert_eq!(preset.export_as, ".txt");
    }

    #[test]
    fn column_lookup_prefers_last_duplicate() {
        let preset = parse(
            r#"[TABLE(WRITE-AS:X):[{"name":"first","value":"k"},{"name":"second","value":"k"}]]"#,
        )
        .unwrap();
        assert_eq!(preset.column("k").unwrap().name, "second");
        assert!(preset.column("missing").is_none());
    }
}
