use std::{
    fs::File,
    io::{self, BufRead, BufReader, IsTerminal, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::model::Row;

pub enum InputSource {
    Stdin,
    File(PathBuf),
}

/// `-` or no path means stdin, which must not be an interactive terminal.
pub fn resolve_input_source(path: Option<&Path>) -> Result<InputSource> {
    match path {
        Some(path) if path != Path::new("-") => Ok(InputSource::File(path.to_path_buf())),
        _ if io::stdin().is_terminal() => bail!("no input file given and stdin is a terminal"),
        _ => Ok(InputSource::Stdin),
    }
}

fn open(source: &InputSource) -> Result<Box<dyn BufRead>> {
    Ok(match source {
        InputSource::Stdin => Box::new(BufReader::new(io::stdin())),
        InputSource::File(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
    })
}

pub fn read_to_string(source: &InputSource) -> Result<String> {
    let mut text = String::new();
    open(source)?
        .read_to_string(&mut text)
        .context("reading input")?;
    Ok(text)
}

/// Reads rows stored either as one JSON array or as JSON Lines.
pub fn read_rows(source: &InputSource) -> Result<Vec<Row>> {
    let text = read_to_string(source)?;
    parse_rows(&text)
}

pub fn parse_rows(text: &str) -> Result<Vec<Row>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed).context("invalid JSON array of rows")?;
        return values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| Row::from_value(value).with_context(|| format!("row {}", idx + 1)))
            .collect();
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let value: Value =
                serde_json::from_str(line).with_context(|| format!("line {}: invalid JSON", idx + 1))?;
            Row::from_value(value).with_context(|| format!("line {}: not a row object", idx + 1))
        })
        .collect()
}
