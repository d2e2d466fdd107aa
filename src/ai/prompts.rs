use serde_json::Value;

pub(super) const GENERATE_PRESET_SYSTEM: &str = "You are an expert at generating table presets based on user descriptions.";

pub(super) fn generate_preset(description: &str) -> String {
    format!(
        r#"Given the following description of the desired table structure and export format, generate a table preset.

Description: {description}

The table preset must be a string in exactly this format:

[TABLE(EXPORT-AS:<file_extension>)(WRITE-AS:<template_string>):[
 {{"name":"Column Name 1", "value":"column1", "type":"text", "important":"no", "write":"ID1"}},
 {{"name":"Column Name 2", "value":"column2", "type":"number", "important":"yes", "write":"ID2"}}
]]

Replace <file_extension> with the appropriate extension including the leading dot (e.g. .jsonl, .csv, .md).
Replace <template_string> with the template written once per exported row.
The part after the colon MUST be a valid JSON array enclosed in square brackets.
Each column is a JSON object with "name", "value", "type", "important" and "write" fields.
"write" is the placeholder used for that column inside <template_string>.
"type" is one of text, number, boolean or json; use boolean for a checkbox.
"important" is yes when the column must be filled before a row is exported, otherwise no.

Respond with a JSON object {{"preset": "<the preset string>"}} and nothing else."#
    )
}

pub(super) const CONVERT_FILE_SYSTEM: &str = "You are an expert data conversion engine. You transform unstructured or semi-structured text into a well-structured format following the user's instructions.";

pub(super) fn convert_file(file_content: &str, user_prompt: &str) -> String {
    format!(
        r#"First, analyze the structure of the input file to understand the data patterns.
File Content:
```
{file_content}
```

Next, carefully analyze the user's instructions for the conversion.
User Instructions:
```
{user_prompt}
```

Based on both, perform the conversion.
- Determine the output file extension from the instructions (e.g. .jsonl, .csv, .md).
- Choose a suitable filename with that extension.
- Transform the raw data into the requested structure.

Respond with a JSON object with exactly two keys, "convertedContent" (the full text of the converted file) and "fileName", and nothing else."#
    )
}

pub(super) const POPULATE_COLUMNS_SYSTEM: &str = r#"You are a data completion assistant. You fill empty or null values in specific columns of a dataset following the user's instructions.

For every object in the table data, check the listed columns. If a value is missing, null or an empty string, generate one from the user's prompt and the other columns of the same object.
Do not modify existing values. Do not add or remove rows. Keep every "__id" unchanged.

Respond with a JSON object {"updatedData": [...]} holding the full table and nothing else."#;

pub(super) fn populate_columns(
    preset_string: &str,
    user_prompt: &str,
    columns: &[String],
    table_data: &Value,
) -> String {
    let columns: String = columns.iter().map(|c| format!("- {c}\n")).collect();
    format!(
        r#"**Table Structure (Preset):**
```
{preset_string}
```

**User Prompt:**
```
{user_prompt}
```

**Columns to Populate:**
{columns}
**Current Table Data:**
```json
{table_data}
```

Now, generate the updated data."#
    )
}
