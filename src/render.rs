use std::collections::HashMap;

use regex::{NoExpand, Regex, escape};
use serde_json::Value;
use tracing::warn;

use crate::{
    model::{ROW_ID_KEY, Row},
    preset::ParsedPreset,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub contents: String,
}

pub fn export(table_name: &str, preset: &ParsedPreset, rows: &[Row]) -> Export {
    Export {
        file_name: suggested_file_name(table_name, preset),
        contents: render(preset, rows),
    }
}

/// `<table name><EXPORT-AS>`, without any sanitizing of the name.
pub fn suggested_file_name(table_name: &str, preset: &ParsedPreset) -> String {
    format!("{table_name}{}", preset.export_as)
}

pub fn render(preset: &ParsedPreset, rows: &[Row]) -> String {
    let placeholders = placeholders(preset);
    let mut out = String::new();
    for row in rows {
        let mut line = preset.write_as.clone();
        for (key, placeholder) in &placeholders {
            line = placeholder.replace_all(&line, &cell_text(row, key));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn cell_text(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(value) => stringify(value),
        None if key == ROW_ID_KEY => row.id.clone(),
        None => String::new(),
    }
}

/// Text substituted for a cell, numbers formatted the way JavaScript's
/// `String(number)` does.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

fn format_number(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if !f.is_finite() {
        return f.to_string();
    }

    // Shortest round-trip digits and exponent, e.g. "1.5e16".
    let sci = format!("{:e}", f.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exp + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { String::new() } else { format!(".{rest}") };
        format!("{first}{rest}e{sign}{}", (n - 1).abs())
    };

    if f < 0.0 { format!("-{body}") } else { body }
}

enum Placeholder {
    Pattern(Regex),
    Literal(String),
}

impl Placeholder {
    fn new(token: &str) -> Self {
        match Regex::new(&escape(token)) {
            Ok(re) => Placeholder::Pattern(re),
            Err(err) => {
                // Only reachable for tokens past the regex size limit.
                warn!(error = %err, "write token too large for a pattern, matching literally");
                Placeholder::Literal(token.to_string())
            }
        }
    }

    fn replace_all(&self, haystack: &str, value: &str) -> String {
        match self {
            Placeholder::Pattern(re) => re.replace_all(haystack, NoExpand(value)).into_owned(),
            Placeholder::Literal(token) => haystack.replace(token.as_str(), value),
        }
    }
}

/// One matcher per distinct token, placed where the token first appears in
/// schema order and bound to the last column carrying it.
fn placeholders(preset: &ParsedPreset) -> Vec<(&str, Placeholder)> {
    let mut last: HashMap<&str, &str> = HashMap::new();
    for col in &preset.columns {
        last.insert(col.write.as_str(), col.value.as_str());
    }

    let mut out = Vec::new();
    for col in &preset.columns {
        if col.write.is_empty() {
            continue;
        }
        if let Some(key) = last.remove(col.write.as_str()) {
            out.push((key, Placeholder::new(&col.write)));
        }
    }
    out
}
