//! Text encodings for query results
//!
//! Rendering is a pure function of the result, the format and whether type
//! labels are shown, so every encoding is testable without an engine.

use crate::types::{ColumnInfo, QueryResult, ResultFormat, Value};

/// Rows printed by the tabular encoding
pub const TABULAR_MAX_ROWS: usize = 100;

/// Widest cell printed by the tabular encoding, in characters
pub const TABULAR_MAX_WIDTH: usize = 20;

const ELLIPSIS: char = '…';

pub fn render(result: &QueryResult, format: ResultFormat, show_types: bool) -> String {
    match format {
        ResultFormat::Markdown => markdown(result, show_types),
        ResultFormat::Tabular => tabular(result, show_types),
        ResultFormat::Raw => raw(result),
    }
}

// ============================================================================
// Markdown
// ============================================================================

fn markdown(result: &QueryResult, show_types: bool) -> String {
    if result.columns.is_empty() {
        return String::new();
    }

    let header: Vec<String> = result
        .columns
        .iter()
        .map(|c| {
            if show_types {
                format!("{}<br>{}", escape_markdown(&c.name), c.data_type)
            } else {
                escape_markdown(&c.name)
            }
        })
        .collect();

    let mut lines = Vec::with_capacity(result.rows.len() + 2);
    lines.push(markdown_row(&header));
    lines.push(markdown_row(&vec!["---".to_string(); header.len()]));
    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| escape_markdown(&v.to_string()))
            .collect();
        lines.push(markdown_row(&cells));
    }
    lines.join("\n")
}

fn markdown_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}

// ============================================================================
// Tabular
// ============================================================================

fn tabular(result: &QueryResult, show_types: bool) -> String {
    if result.columns.is_empty() {
        return String::new();
    }

    let header_lines: Vec<Vec<String>> = result
        .columns
        .iter()
        .map(|c| header_cell(c, show_types))
        .collect();
    let header_height = header_lines.iter().map(Vec::len).max().unwrap_or(1);

    let rows: Vec<Vec<(String, bool)>> = result
        .rows
        .iter()
        .take(TABULAR_MAX_ROWS)
        .map(|row| {
            row.iter()
                .map(|v| (truncate(&v.to_string().replace('\n', " ")), is_numeric(v)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..result.columns.len())
        .map(|idx| {
            let header = header_lines[idx].iter().map(|l| width(l)).max().unwrap_or(0);
            let cells = rows
                .iter()
                .filter_map(|r| r.get(idx))
                .map(|(cell, _)| width(cell))
                .max()
                .unwrap_or(0);
            header.max(cells)
        })
        .collect();

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut lines = vec![border.clone()];
    for line in 0..header_height {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(idx, w)| {
                let text = header_lines[idx].get(line).map(String::as_str).unwrap_or("");
                align_left(text, *w)
            })
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.push(border.clone());
    for row in &rows {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(idx, w)| match row.get(idx) {
                Some((cell, true)) => align_right(cell, *w),
                Some((cell, false)) => align_left(cell, *w),
                None => align_left("", *w),
            })
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    if !rows.is_empty() {
        lines.push(border);
    }
    lines.join("\n")
}

fn header_cell(column: &ColumnInfo, show_types: bool) -> Vec<String> {
    let mut lines = vec![truncate(&column.name)];
    if show_types {
        lines.push(truncate(&column.data_type));
    }
    lines
}

fn is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn truncate(text: &str) -> String {
    if width(text) <= TABULAR_MAX_WIDTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(TABULAR_MAX_WIDTH - 1).collect();
    cut.push(ELLIPSIS);
    cut
}

fn align_left(text: &str, w: usize) -> String {
    format!("{}{}", text, " ".repeat(w.saturating_sub(width(text))))
}

fn align_right(text: &str, w: usize) -> String {
    format!("{}{}", " ".repeat(w.saturating_sub(width(text))), text)
}

// ============================================================================
// Raw
// ============================================================================

fn raw(result: &QueryResult) -> String {
    let rows: Vec<String> = result
        .rows
        .iter()
        .map(|row| {
            let values: Vec<String> = row.iter().map(raw_value).collect();
            if values.len() == 1 {
                format!("({},)", values[0])
            } else {
                format!("({})", values.join(", "))
            }
        })
        .collect();
    format!("[{}]", rows.join(", "))
}

fn raw_value(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}
