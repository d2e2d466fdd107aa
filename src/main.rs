mod args;

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use args::{Args, Command};
use tablecraft::{
    ParsedPreset, Row,
    input::{self, InputSource},
    preset, render,
};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Check { preset, json } => check(preset.as_deref(), json),
        Command::Export {
            preset,
            rows,
            name,
            out,
            stdout,
        } => export(&preset, rows.as_deref(), &name, &out, stdout),
        Command::Row { preset, pairs } => row(&preset, &pairs),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_preset(source: &InputSource) -> Result<ParsedPreset> {
    let text = input::read_to_string(source)?;
    // Preset files usually end with a newline the envelope would reject.
    Ok(preset::parse(text.trim_end())?)
}

fn check(path: Option<&Path>, as_json: bool) -> Result<()> {
    let source = input::resolve_input_source(path)?;
    let preset = load_preset(&source)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if as_json {
        serde_json::to_writer_pretty(&mut out, &preset).context("writing preset")?;
        writeln!(out)?;
    } else {
        writeln!(out, "export as: {}", preset.export_as)?;
        writeln!(out, "write as:  {}", preset.write_as)?;
        writeln!(out)?;
        write_columns(&mut out, &preset)?;
    }

    let findings = preset::lint(&preset);
    for finding in &findings {
        warn!("{finding}");
    }
    if findings.is_empty() {
        info!("preset is clean");
    }
    Ok(())
}

fn write_columns(out: &mut impl Write, preset: &ParsedPreset) -> Result<()> {
    let header = ["NAME", "KEY", "TYPE", "REQUIRED", "TOKEN"];
    let rows: Vec<[String; 5]> = preset
        .columns
        .iter()
        .map(|col| {
            [
                col.name.clone(),
                col.value.clone(),
                col.kind.to_string(),
                if col.is_required() { "yes" } else { "no" }.to_string(),
                col.write.clone(),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let header = header.map(String::from);
    for cells in std::iter::once(&header).chain(&rows) {
        let mut line = String::new();
        for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
            line.push_str(cell);
            if idx + 1 < cells.len() {
                let pad = width - cell.width() + 2;
                line.push_str(&" ".repeat(pad));
            }
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

fn export(preset_path: &Path, rows_path: Option<&Path>, name: &str, out_dir: &Path, to_stdout: bool) -> Result<()> {
    let preset = load_preset(&InputSource::File(preset_path.to_path_buf()))?;
    for finding in preset::lint(&preset) {
        warn!("{finding}");
    }

    let rows = input::read_rows(&input::resolve_input_source(rows_path)?)?;
    for (idx, row) in rows.iter().enumerate() {
        let missing = preset::missing_required(&preset, row);
        if !missing.is_empty() {
            let keys: Vec<&str> = missing.iter().map(|c| c.value.as_str()).collect();
            warn!(row = idx + 1, id = %row.id, "missing required columns: {}", keys.join(", "));
        }
    }

    let export = render::export(name, &preset, &rows);
    if to_stdout {
        io::stdout()
            .write_all(export.contents.as_bytes())
            .context("writing export")?;
        return Ok(());
    }

    let path = out_dir.join(&export.file_name);
    fs::write(&path, &export.contents).with_context(|| format!("writing {}", path.display()))?;
    info!(rows = rows.len(), path = %path.display(), "exported");
    eprintln!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn row(preset_path: &Path, pairs: &[String]) -> Result<()> {
    let preset = load_preset(&InputSource::File(preset_path.to_path_buf()))?;
    let row = Row::from_pairs(&preset, pairs)?;
    for col in preset::missing_required(&preset, &row) {
        warn!("required column {:?} is empty", col.value);
    }
    let line = serde_json::to_string(&row).context("encoding row")?;
    println!("{line}");
    Ok(())
}
