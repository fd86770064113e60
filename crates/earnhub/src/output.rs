//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`, structured formats use serde, plain emits one
//! identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use tabled::{Table, Tabled, settings::Style};

use earnhub_core::TrackingStatus;

use crate::cli::{ColorMode, OutputFormat};

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Status label, colored by how far along it is.
pub fn status_label(status: Option<TrackingStatus>, color: bool) -> String {
    let Some(status) = status else {
        return "-".into();
    };
    let text = status.to_string();
    if !color {
        return text;
    }
    match status {
        TrackingStatus::Completed => text.green().to_string(),
        TrackingStatus::Failed => text.red().to_string(),
        TrackingStatus::Started => text.yellow().to_string(),
        TrackingStatus::Clicked => text.cyan().to_string(),
    }
}

/// `1234.5` -> `1234.50 INR`.
pub fn money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {currency}", amount.round_dp(2))
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list in the chosen format. `to_row` feeds the table view,
/// `id_fn` the plain view; structured formats serialize `data` as-is.
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
            if data.is_empty() {
                return "(none)".into();
            }
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item. The table view is a pre-formatted detail block.
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
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
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

/// Status line on stderr, suppressed by `--quiet`.
pub fn notice(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn money_uses_two_decimals() {
        assert_eq!(money(Decimal::new(12345, 1), "INR"), "1234.50 INR");
        assert_eq!(money(Decimal::new(5, 0), "INR"), "5.00 INR");
    }

    #[test]
    fn uncolored_status_is_plain_text() {
        assert_eq!(status_label(Some(TrackingStatus::Completed), false), "completed");
        assert_eq!(status_label(None, false), "-");
    }

    #[test]
    fn empty_table_says_none() {
        #[derive(Tabled)]
        struct Row {
            id: String,
        }
        let data: Vec<String> = Vec::new();
        let out = render_list(&OutputFormat::Table, &data, |s| Row { id: s.clone() }, Clone::clone);
        assert_eq!(out, "(none)");
    }
}
