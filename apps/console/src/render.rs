//! Plain-text tables and feedback lines.

use client_core::{visible_columns, CapabilitySet, ColumnSpec, FeedbackEvent};
use shared::domain::Record;

/// Permission code gating the edit column on the visual-test list.
pub const PERM_EDIT_VISUAL_TEST: u32 = 104;
/// Permission code gating the accept/assign columns on allotted items.
pub const PERM_HANDLE_ACTION_ITEM: u32 = 211;
/// Permission code gating the approve/reject columns on revision requests.
pub const PERM_DECIDE_REVISION: u32 = 305;

pub fn visual_test_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("id", "Id"),
        ColumnSpec::new("description", "Description"),
        ColumnSpec::new("createdat", "Created"),
        ColumnSpec::new("edit", "Edit").gated(PERM_EDIT_VISUAL_TEST),
    ]
}

pub fn action_item_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("id", "Id"),
        ColumnSpec::new("title", "Item"),
        ColumnSpec::new("status", "Status"),
        ColumnSpec::new("accept", "Accept").gated(PERM_HANDLE_ACTION_ITEM),
        ColumnSpec::new("assign", "Assign").gated(PERM_HANDLE_ACTION_ITEM),
    ]
}

pub fn revision_request_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("revrequestid", "Id"),
        ColumnSpec::new("instrument", "Instrument"),
        ColumnSpec::new("requestedby", "Requested by"),
        ColumnSpec::new("status", "Status"),
        ColumnSpec::new("approve", "Approve").gated(PERM_DECIDE_REVISION),
        ColumnSpec::new("reject", "Reject").gated(PERM_DECIDE_REVISION),
    ]
}

/// Action columns render as a marker; data columns render the field text.
fn cell(column: &ColumnSpec, row: &Record) -> String {
    if column.required.is_some() {
        "[x]".to_string()
    } else {
        row.text(&column.key)
    }
}

pub fn render_table(columns: &[ColumnSpec], caps: &CapabilitySet, rows: &[Record]) -> String {
    let shown = visible_columns(columns, caps);
    let mut widths: Vec<usize> = shown.iter().map(|c| c.title.chars().count()).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| shown.iter().map(|c| cell(c, row)).collect())
        .collect();
    for line in &cells {
        for (width, value) in widths.iter_mut().zip(line) {
            *width = (*width).max(value.chars().count());
        }
    }

    let format_line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![format_line(shown.iter().map(|c| c.title.as_str()).collect())];
    for line in &cells {
        out.push(format_line(line.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

pub fn feedback_line(event: &FeedbackEvent) -> String {
    match event {
        FeedbackEvent::Success(message) => format!("ok: {message}"),
        FeedbackEvent::Error(err) => format!("error: {}", err.user_message()),
    }
}
