use std::{collections::HashMap, fmt};

use super::{columns::ColumnDef, parser::ParsedPreset};
use crate::model::Row;

/// Non-fatal findings about a preset. None of these stop an export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    MissingPlaceholder { column: String, token: String },
    DuplicateWriteToken { token: String, columns: Vec<String> },
    DuplicateValueKey { key: String, columns: Vec<String> },
    EmptyWriteToken { column: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingPlaceholder { column, token } => write!(
                f,
                "column {column:?}: token {token:?} does not appear in WRITE-AS"
            ),
            Diagnostic::DuplicateWriteToken { token, columns } => write!(
                f,
                "token {token:?} is shared by {}; the last one wins",
                columns.join(", ")
            ),
            Diagnostic::DuplicateValueKey { key, columns } => write!(
                f,
                "key {key:?} is shared by {}; the last one wins",
                columns.join(", ")
            ),
            Diagnostic::EmptyWriteToken { column } => {
                write!(f, "column {column:?} has no write token")
            }
        }
    }
}

pub fn lint(preset: &ParsedPreset) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    for col in &preset.columns {
        if col.write.is_empty() {
            out.push(Diagnostic::EmptyWriteToken {
                column: label(col),
            });
        } else if !preset.write_as.contains(&col.write) {
            out.push(Diagnostic::MissingPlaceholder {
                column: label(col),
                token: col.write.clone(),
            });
        }
    }

    for (token, columns) in shared_by(preset, |col| &col.write) {
        out.push(Diagnostic::DuplicateWriteToken { token, columns });
    }
    for (key, columns) in shared_by(preset, |col| &col.value) {
        out.push(Diagnostic::DuplicateValueKey { key, columns });
    }

    out
}

/// Columns marked `important: yes` whose cell is absent, `null` or an empty
/// string in `row`.
pub fn missing_required<'a>(preset: &'a ParsedPreset, row: &Row) -> Vec<&'a ColumnDef> {
    preset
        .required_columns()
        .filter(|col| row.is_empty_cell(&col.value))
        .collect()
}

fn label(col: &ColumnDef) -> String {
    if col.name.is_empty() {
        col.value.clone()
    } else {
        col.name.clone()
    }
}

fn shared_by<F>(preset: &ParsedPreset, field: F) -> Vec<(String, Vec<String>)>
where
    F: Fn(&ColumnDef) -> &String,
{
    let mut order: Vec<&String> = Vec::new();
    let mut groups: HashMap<&String, Vec<String>> = HashMap::new();
    for col in &preset.columns {
        let key = field(col);
        if key.is_empty() {
            continue;
        }
        let group = groups.entry(key).or_default();
        if group.is_empty() {
            order.push(key);
        }
        group.push(label(col));
    }
    order
        .into_iter()
        .filter_map(|key| {
            let columns = groups.remove(key)?;
            (columns.len() > 1).then(|| (key.clone(), columns))
        })
        .collect()
}
