mod prompts;

use std::collections::HashMap;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    error::AiError,
    model::{ROW_ID_KEY, Row},
    preset::{self, ParsedPreset},
};

pub const DEFAULT_MODEL: &str = "googleai/gemini-1.5-flash";

const MIN_PROMPT_CHARS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
}

pub trait TextCompletion: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiConfig {
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPreset {
    pub preset_string: String,
    pub preset: ParsedPreset,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedFile {
    pub converted_content: String,
    pub file_name: String,
}

#[derive(Deserialize)]
struct PresetResponse {
    preset: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PopulateResponse {
    updated_data: Vec<Map<String, Value>>,
}

pub struct Assistant<C> {
    client: C,
    config: AiConfig,
}

impl<C: TextCompletion> Assistant<C> {
    pub fn new(client: C, config: AiConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn generate_preset(&self, description: &str) -> Result<GeneratedPreset, AiError> {
        if description.trim().is_empty() {
            return Err(AiError::InvalidInput("description is empty".into()));
        }

        let text = self.ask(prompts::GENERATE_PRESET_SYSTEM, prompts::generate_preset(description))?;
        let body = strip_code_fence(&text);
        let preset_string = match serde_json::from_str::<PresetResponse>(body) {
            Ok(resp) => resp.preset.trim().to_string(),
            Err(_) if body.starts_with("[TABLE(") => body.to_string(),
            Err(err) => return Err(AiError::MalformedResponse(err.to_string())),
        };
        let preset = preset::parse(&preset_string)?;

        Ok(GeneratedPreset {
            preset_string,
            preset,
        })
    }

    pub fn convert_file(&self, file_content: &str, user_prompt: &str) -> Result<ConvertedFile, AiError> {
        check_prompt(user_prompt)?;
        if file_content.is_empty() {
            return Err(AiError::InvalidInput("file is empty".into()));
        }

        let text = self.ask(
            prompts::CONVERT_FILE_SYSTEM,
            prompts::convert_file(file_content, user_prompt),
        )?;
        let converted: ConvertedFile = decode(&text)?;
        if converted.file_name.trim().is_empty() {
            return Err(AiError::MalformedResponse("empty fileName".into()));
        }
        Ok(converted)
    }

    /// Fills empty cells of `columns` in every row. Only cells that are empty
    /// in `rows` change; row order, count and ids are preserved.
    pub fn populate_columns(
        &self,
        preset_string: &str,
        rows: &[Row],
        columns: &[String],
        user_prompt: &str,
    ) -> Result<Vec<Row>, AiError> {
        check_prompt(user_prompt)?;
        if columns.is_empty() {
            return Err(AiError::InvalidInput("select at least one column".into()));
        }
        if rows.is_empty() {
            return Err(AiError::InvalidInput("there is no data in the table".into()));
        }
        let preset = preset::parse(preset_string)
            .map_err(|err| AiError::InvalidInput(err.to_string()))?;
        if let Some(unknown) = columns.iter().find(|c| preset.column(c).is_none()) {
            return Err(AiError::InvalidInput(format!("unknown column {unknown:?}")));
        }

        let table_data = serde_json::to_value(rows)
            .map_err(|err| AiError::InvalidInput(err.to_string()))?;
        let text = self.ask(
            prompts::POPULATE_COLUMNS_SYSTEM,
            prompts::populate_columns(preset_string, user_prompt, columns, &table_data),
        )?;
        let response: PopulateResponse = decode(&text)?;

        let (updated, filled) = merge_filled(rows, &response.updated_data, columns);
        debug!(filled, rows = rows.len(), "populated empty cells");
        Ok(updated)
    }

    fn ask(&self, system: &str, prompt: String) -> Result<String, AiError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system: system.to_string(),
            prompt,
        };
        self.client.complete(&request)
    }
}

fn check_prompt(prompt: &str) -> Result<(), AiError> {
    if prompt.chars().count() < MIN_PROMPT_CHARS {
        return Err(AiError::InvalidInput(format!(
            "prompt must be at least {MIN_PROMPT_CHARS} characters"
        )));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|err| AiError::MalformedResponse(err.to_string()))
}

/// Models often wrap JSON answers in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Copies model-provided values into the empty requested cells. Returned
/// objects are matched by `__id`, falling back to position.
fn merge_filled(rows: &[Row], updated: &[Map<String, Value>], columns: &[String]) -> (Vec<Row>, usize) {
    let by_id: HashMap<&str, &Map<String, Value>> = updated
        .iter()
        .filter_map(|obj| Some((obj.get(ROW_ID_KEY)?.as_str()?, obj)))
        .collect();

    let mut filled = 0;
    let out = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut row = row.clone();
            let Some(source) = by_id.get(row.id.as_str()).copied().or_else(|| updated.get(idx)) else {
                return row;
            };
            for key in columns {
                if !row.is_empty_cell(key) {
                    continue;
                }
                match source.get(key) {
                    None | Some(Value::Null) => {}
                    Some(Value::String(s)) if s.is_empty() => {}
                    Some(value) => {
                        row.values.insert(key.clone(), value.clone());
                        filled += 1;
                    }
                }
            }
            row
        })
        .collect();

    (out, filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct FakeCompletion {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeCompletion {
        fn replying(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextCompletion for FakeCompletion {
        fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct FailingCompletion;

    impl TextCompletion for FailingCompletion {
        fn complete(&self, _: &CompletionRequest) -> Result<String, AiError> {
            Err(AiError::Completion("quota exceeded".into()))
        }
    }

    const PRESET: &str = r#"[TABLE(EXPORT-AS:.csv)(WRITE-AS:ID1,ID2):[{"name":"Word","value":"word","type":"text","important":"yes","write":"ID1"},{"name":"Translation","value":"fr","type":"text","important":"no","write":"ID2"}]]"#;

    fn assistant(reply: &str) -> Assistant<FakeCompletion> {
        Assistant::new(FakeCompletion::replying(reply), AiConfig::default())
    }

    #[test]
    fn generate_preset_accepts_json_answer() {
        let reply = json!({ "preset": PRESET }).to_string();
        let ai = assistant(&reply);
        let generated = ai.generate_preset("a vocabulary list exported as csv").unwrap();
        assert_eq!(generated.preset_string, PRESET);
        assert_eq!(generated.preset.columns.len(), 2);

        let seen = ai.client.seen.lock().unwrap();
        assert_eq!(seen[0].model, DEFAULT_MODEL);
        assert!(seen[0].prompt.contains("a vocabulary list exported as csv"));
    }

    #[test]
    fn generate_preset_accepts_fenced_bare_preset() {
        let reply = format!("```\n{PRESET}\n```");
        let generated = assistant(&reply).generate_preset("vocabulary").unwrap();
        assert_eq!(generated.preset.export_as, ".csv");
    }

    #[test]
    fn generate_preset_rejects_unparseable_preset() {
        let reply = json!({ "preset": "[TABLE(EXPORT-AS:.csv):not json]" }).to_string();
        assert_eq!(
            assistant(&reply).generate_preset("vocabulary"),
            Err(AiError::InvalidPreset)
        );
        assert!(matches!(
            assistant("sure, here you go").generate_preset("vocabulary"),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn generate_preset_passes_provider_errors_through() {
        let ai = Assistant::new(FailingCompletion, AiConfig { model: "m".into() });
        assert_eq!(
            ai.generate_preset("vocabulary"),
            Err(AiError::Completion("quota exceeded".into()))
        );
    }

    #[test]
    fn convert_file_decodes_output() {
        let reply = "```json\n{\"convertedContent\":\"a,b\\n1,2\\n\",\"fileName\":\"data.csv\"}\n```";
        let out = assistant(reply)
            .convert_file("a=1 b=2", "turn this into a csv file")
            .unwrap();
        assert_eq!(out.file_name, "data.csv");
        assert_eq!(out.converted_content, "a,b\n1,2\n");
    }

    #[test]
    fn convert_file_validates_input() {
        let ai = assistant("{}");
        assert!(matches!(ai.convert_file("x", "short"), Err(AiError::InvalidInput(_))));
        assert!(matches!(
            ai.convert_file("", "a long enough prompt"),
            Err(AiError::InvalidInput(_))
        ));
        assert!(ai.client.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn populate_fills_only_empty_requested_cells() {
        let rows = vec![
            Row::from_value(json!({"__id": "r1", "word": "cat", "fr": ""})).unwrap(),
            Row::from_value(json!({"__id": "r2", "word": "dog", "fr": "chien"})).unwrap(),
        ];
        let reply = json!({
            "updatedData": [
                {"__id": "r2", "word": "DOG", "fr": "toutou"},
                {"__id": "r1", "word": "CAT", "fr": "chat", "extra": 1}
            ]
        })
        .to_string();

        let updated = assistant(&reply)
            .populate_columns(PRESET, &rows, &["fr".to_string()], "translate the word to french")
            .unwrap();

        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].id, "r1");
        assert_eq!(updated[0].get("fr"), Some(&json!("chat")));
        assert_eq!(updated[0].get("word"), Some(&json!("cat")));
        assert!(updated[0].get("extra").is_none());
        assert_eq!(updated[1].get("fr"), Some(&json!("chien")));
    }

    #[test]
    fn populate_falls_back_to_position_without_ids() {
        let rows = vec![Row::from_value(json!({"__id": "r1", "word": "cat"})).unwrap()];
        let reply = json!({"updatedData": [{"word": "cat", "fr": "chat"}]}).to_string();
        let updated = assistant(&reply)
            .populate_columns(PRESET, &rows, &["fr".to_string()], "translate the word to french")
            .unwrap();
        assert_eq!(updated[0].get("fr"), Some(&json!("chat")));
    }

    #[test]
    fn populate_validates_input() {
        let rows = vec![Row::from_value(json!({"word": "cat"})).unwrap()];
        let ai = assistant("{}");
        let fr = vec!["fr".to_string()];
        let prompt = "translate the word to french";

        assert!(matches!(ai.populate_columns(PRESET, &rows, &[], prompt), Err(AiError::InvalidInput(_))));
        assert!(matches!(ai.populate_columns(PRESET, &[], &fr, prompt), Err(AiError::InvalidInput(_))));
        assert!(matches!(ai.populate_columns("bad", &rows, &fr, prompt), Err(AiError::InvalidInput(_))));
        assert!(matches!(
            ai.populate_columns(PRESET, &rows, &["de".to_string()], prompt),
            Err(AiError::InvalidInput(_))
        ));
        assert!(matches!(
            ai.populate_columns(PRESET, &rows, &fr, prompt),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }
}
