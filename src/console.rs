//! Plain-text table rendering for the console commands.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders `rows` under `headers`, right-aligning every column whose cells
/// are all numeric (percent signs allowed).
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let aligns = (0..headers.len())
        .map(|idx| {
            let numeric = !rows.is_empty()
                && rows
                    .iter()
                    .all(|row| row.get(idx).is_none_or(|cell| looks_numeric(cell)));
            if numeric { Align::Right } else { Align::Left }
        })
        .collect::<Vec<_>>();
    render_aligned(headers, rows, &aligns)
}

pub fn render_aligned(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(&sanitize_cell(cell)));
        }
    }

    let mut output = String::new();
    let header_aligns = vec![Align::Left; column_count];
    let _ = writeln!(output, "{}", format_row(headers, &widths, &header_aligns));

    let separator = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(
        output,
        "{}",
        format_row(&separator, &separator_widths, &header_aligns)
    );

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match aligns.get(idx).copied().unwrap_or(Align::Left) {
                Align::Left => format!("{sanitized}{padding}"),
                Align::Right => format!("{padding}{sanitized}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn looks_numeric(cell: &str) -> bool {
    let trimmed = cell.trim().trim_end_matches('%');
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
