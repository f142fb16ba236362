//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::{Table, Tabled, settings::Style};

use erpdesk_core::Record;
use erpdesk_core::model::display_value;
use erpdesk_core::resource::Column;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Status line on stderr: `✓ message`, green when color is on.
pub fn success(mode: &ColorMode, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    if should_color(mode) {
        eprintln!("{} {message}", "✓".green());
    } else {
        eprintln!("✓ {message}");
    }
}

/// Dimmed hint on stderr, e.g. the pagination footer.
pub fn note(mode: &ColorMode, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    if should_color(mode) {
        eprintln!("{}", message.dimmed());
    } else {
        eprintln!("{message}");
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render backend records under a resource's columns.
///
/// Tables show only `columns`; structured formats carry whole records.
pub fn render_records(format: &OutputFormat, columns: &[Column], records: &[Record]) -> String {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|c| c.header.to_owned()));
            for record in records {
                builder.push_record(columns.iter().map(|c| record.text(c.key)));
            }
            builder.build().with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => records
            .iter()
            .filter_map(Record::id)
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        other => render_structured(other, records),
    }
}

/// Render one record as a two-column field/value table.
pub fn render_record(format: &OutputFormat, record: &Record) -> String {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Field".to_owned(), "Value".to_owned()]);
            for (key, value) in record.fields() {
                builder.push_record([key.clone(), display_value(value)]);
            }
            builder.build().with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => record.id().map(|id| id.to_string()).unwrap_or_default(),
        other => render_structured(other, record),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table output uses `detail_fn`, since summaries don't fit one `Tabled` row type.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Plain => id_fn(data),
        other => render_structured(other, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_structured<T: serde::Serialize + ?Sized>(format: &OutputFormat, data: &T) -> String {
    match format {
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Plain => render_json(data, false),
    }
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}
