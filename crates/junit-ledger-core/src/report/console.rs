use crate::reader::{Cell, DecodedRow};
use crate::storage::SqlValue;
use prettytable::{format, Table};
use std::time::Duration;

/// Header label and the column it shows, in display order.
pub const COLUMNS: &[(&str, &str)] = &[
    ("ID", "id"),
    ("Name", "name"),
    ("Status", "status"),
    ("Duration", "duration"),
    ("Error", "error"),
    ("Message", "message"),
    ("Stdout", "systemout"),
    ("Stderr", "systemerr"),
    ("Classname", "classname"),
    ("Properties", "properties"),
];

pub fn print_results(rows: &[DecodedRow]) {
    print!("{}", render_table(rows));
}

/// Boxed, left-aligned table. Missing or null cells render empty.
pub fn render_table(rows: &[DecodedRow]) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(prettytable::Row::new(
        COLUMNS.iter().map(|(h, _)| prettytable::Cell::new(h)).collect(),
    ));

    for row in rows {
        let cells = COLUMNS
            .iter()
            .map(|(_, col)| {
                let text = row.get(*col).map(|c| format_cell(col, c)).unwrap_or_default();
                prettytable::Cell::new(&text)
            })
            .collect();
        table.add_row(prettytable::Row::new(cells));
    }

    table.to_string()
}

fn format_cell(column: &str, cell: &Cell) -> String {
    let s = match (column, cell) {
        (_, Cell::Null) => String::new(),
        ("duration", Cell::Json(v)) => match v.as_u64() {
            Some(nanos) => format!("{:.3}s", Duration::from_nanos(nanos).as_secs_f64()),
            None => v.to_string(),
        },
        // Show the error's message; fall back to the whole object.
        ("error", Cell::Json(v)) => match v.get("message").and_then(|m| m.as_str()) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => json_text(v),
        },
        (_, Cell::Json(v)) => json_text(v),
        (_, Cell::Integer(i)) => i.to_string(),
        (_, Cell::Text(t)) => t.clone(),
        (_, Cell::Raw(raw)) => match raw {
            SqlValue::Null => String::new(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Real(f) => f.to_string(),
            SqlValue::Text(t) => t.clone(),
            SqlValue::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        },
    };
    s.replace('\r', "").replace('\n', "\\n")
}

fn json_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
