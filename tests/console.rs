use data_profiler::console::{Align, render_aligned, render_table};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn render_table_right_aligns_numeric_columns() {
    let headers = strings(&["id", "name"]);
    let rows = vec![strings(&["1", "Alice"]), strings(&["2", "Bob"])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines, vec!["id  name", "---  -----", " 1  Alice", " 2  Bob"]);
}

#[test]
fn percent_cells_count_as_numeric() {
    let headers = strings(&["column", "percent"]);
    let rows = vec![strings(&["a", "50.00%"]), strings(&["bb", "5.00%"])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[2], format!("a{}50.00%", " ".repeat(8)));
    assert_eq!(lines[3], format!("bb{}5.00%", " ".repeat(8)));
}

#[test]
fn explicit_alignment_overrides_detection() {
    let headers = strings(&["n"]);
    let rows = vec![strings(&["7"]), strings(&["10"])];

    let rendered = render_aligned(&headers, &rows, &[Align::Left]);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[2], "7");
    assert_eq!(lines[3], "10");
}

#[test]
fn render_table_normalizes_control_characters() {
    let headers = strings(&["note"]);
    let rows = vec![strings(&["line1\nline2\tvalue"])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "line1 line2 value");
}

#[test]
fn render_table_handles_unicode_and_ansi_widths() {
    let headers = strings(&["résumé", "status"]);
    let rows = vec![strings(&["café", "\u{1b}[31mERR\u{1b}[0m"])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "résumé  status");
    assert_eq!(lines[2], "café    \u{1b}[31mERR\u{1b}[0m");
}
