//! Terminal output: ANSI notes, tables and workflow result rendering.

use idguard_core::{IdentityRecord, NotificationOutcome, WorkflowResult, WorkflowStatus};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

fn paint(color: &str, s: &str, enabled: bool) -> String {
    if enabled {
        format!("{color}{s}{RESET}")
    } else {
        s.to_string()
    }
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub header: String,
    pub align: Align,
    /// Longer cells are cut and end in `…`.
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left, max_width: None }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right, max_width: None }
    }

    pub fn max(mut self, width: usize) -> Self {
        self.max_width = Some(width.max(1));
        self
    }
}

fn truncate(s: &str, max: Option<usize>) -> String {
    let plain = strip_ansi(s);
    match max {
        Some(max) if plain.chars().count() > max => {
            let mut cut: String = plain.chars().take(max - 1).collect();
            cut.push('…');
            cut
        }
        _ => s.to_string(),
    }
}

pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, col)| truncate(row.get(i).map(String::as_str).unwrap_or(""), col.max_width))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            cells
                .iter()
                .map(|row| visible_width(&row[i]))
                .chain(std::iter::once(visible_width(&col.header)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |row: Vec<String>| -> String {
        let padded: Vec<String> = row
            .iter()
            .zip(columns)
            .zip(&widths)
            .map(|((cell, col), width)| {
                let pad = " ".repeat(width.saturating_sub(visible_width(cell)));
                match col.align {
                    Align::Left => format!("{cell}{pad}"),
                    Align::Right => format!("{pad}{cell}"),
                }
            })
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(columns.iter().map(|c| c.header.clone()).collect());
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in cells {
        out.push_str(&line(row));
    }
    out
}

// ---------------------------------------------------------------------------
// Workflow results
// ---------------------------------------------------------------------------

pub fn status_badge(status: WorkflowStatus, color: bool) -> String {
    let (c, label) = match status {
        WorkflowStatus::Legitimate => (GREEN, "LEGITIMATE"),
        WorkflowStatus::FraudSuspected => (RED, "FRAUD SUSPECTED"),
        WorkflowStatus::ExtractionFailed => (YELLOW, "EXTRACTION FAILED"),
        WorkflowStatus::InternalError => (RED, "INTERNAL ERROR"),
    };
    paint(c, label, color)
}

fn record_lines(title: &str, record: &IdentityRecord, out: &mut String) {
    out.push_str(&format!("{title}\n"));
    out.push_str(&format!("  Identity number: {}\n", record.id_number));
    out.push_str(&format!("  Full name:       {}\n", record.full_name));
    out.push_str(&format!("  Birth date:      {}\n", record.birth_date));
    for (k, v) in &record.attributes {
        out.push_str(&format!("  {k}: {v}\n"));
    }
}

/// Human-readable rendering of a run, as printed by `idguard check`.
pub fn render_result(result: &WorkflowResult, color: bool) -> String {
    let mut out = format!(
        "{} {}\n{}\n",
        status_badge(result.status, color),
        paint(DIM, &format!("(run {})", result.run_id), color),
        result.message
    );
    if let Some(record) = &result.record {
        record_lines("\nSubmitted record", record, &mut out);
    }
    if let Some(matched) = &result.matched {
        record_lines("\nRecord on file", matched, &mut out);
    }
    match &result.notification {
        Some(NotificationOutcome::Delivered) => out.push_str("\nAlert: delivered\n"),
        Some(NotificationOutcome::Failed { reason }) => {
            out.push_str(&format!("\nAlert: failed ({reason})\n"))
        }
        None => {}
    }
    let states: Vec<String> = result.states.iter().map(|s| s.to_string()).collect();
    out.push_str(&paint(CYAN, &format!("\nStates: {}\n", states.join(" → ")), color));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use idguard_core::WorkflowState;

    #[test]
    fn strips_ansi() {
        assert_eq!(strip_ansi(&format!("{GREEN}hello{RESET}")), "hello");
    }

    #[test]
    fn renders_aligned_and_truncated_table() {
        let cols = vec![Column::left("Name").max(6), Column::right("Count")];
        let rows = vec![
            vec!["Alexandria".to_string(), "42".to_string()],
            vec!["Bob".to_string(), "7".to_string()],
        ];
        let table = render_table(&cols, &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "  Name    Count");
        assert_eq!(lines[2], "  Alexa…     42");
        assert_eq!(lines[3], "  Bob         7");
    }

    #[test]
    fn renders_fraud_result_without_color() {
        let day = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let record = IdentityRecord::new("X123", "Jane Doe", day).unwrap();
        let result = WorkflowResult {
            run_id: uuid::Uuid::nil(),
            status: WorkflowStatus::FraudSuspected,
            record: Some(record.clone()),
            matched: Some(record),
            message: "already on record".into(),
            notification: Some(NotificationOutcome::Delivered),
            states: vec![WorkflowState::Start, WorkflowState::Done],
            completed_at: Utc::now(),
        };
        let text = render_result(&result, false);
        assert!(text.starts_with("FRAUD SUSPECTED"));
        assert!(text.contains("Record on file"));
        assert!(text.contains("Alert: delivered"));
        assert!(text.contains("START → DONE"));
    }
}
