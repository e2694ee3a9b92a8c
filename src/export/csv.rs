//! Tabular export of a scene list.
//!
//! The table has four fixed columns and one row per scene. Fields are quoted
//! RFC-4180 style, and the scene delimiter also forces quoting so spreadsheet
//! tools never split on it.

use std::fmt::Display;

use crate::parsing::DELIMITER;
use crate::types::storyboard::Scene;

/// Prepended so spreadsheet tools read the blob as UTF-8.
pub const BOM: char = '\u{FEFF}';
pub const HEADER: [&str; 4] = ["Scene Number", "VO/Script", "Files", "Notes"];
pub const DEFAULT_FILENAME: &str = "script_breakdown.csv";
pub const MIME_TYPE: &str = "text/csv; charset=utf-8";

const FIELD_SEPARATOR: &str = ",";
const ROW_SEPARATOR: &str = "\n";

/// A data row: sequence number, script text, files and notes placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow<'a> {
    pub number: usize,
    pub script: &'a str,
    pub files: &'a str,
    pub notes: &'a str,
}

impl TableRow<'_> {
    fn fields(&self) -> [String; 4] {
        [
            escape_field(self.number),
            escape_field(self.script),
            escape_field(self.files),
            escape_field(self.notes),
        ]
    }
}

/// Rows for `scenes`, numbered from 1 by position.
pub fn rows(scenes: &[Scene]) -> Vec<TableRow<'_>> {
    scenes
        .iter()
        .enumerate()
        .map(|(index, scene)| TableRow {
            number: index + 1,
            script: scene.as_str(),
            files: "",
            notes: "",
        })
        .collect()
}

/// Quotes `field` if it holds a comma, quote, newline or the scene delimiter.
pub fn escape_field(field: impl Display) -> String {
    let text = field.to_string();
    let needs_quotes = text
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n') || c == DELIMITER);
    if needs_quotes {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// Renders the scene table, BOM first, rows joined by newlines.
pub fn serialize(scenes: &[Scene]) -> String {
    let header = HEADER
        .iter()
        .map(|label| escape_field(label))
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR);

    let mut lines = Vec::with_capacity(scenes.len() + 1);
    lines.push(header);
    lines.extend(rows(scenes).iter().map(|row| row.fields().join(FIELD_SEPARATOR)));

    let mut document = String::new();
    document.push(BOM);
    document.push_str(&lines.join(ROW_SEPARATOR));
    document
}
