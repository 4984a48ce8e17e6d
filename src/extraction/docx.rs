//! DOCX text extraction via `docx-rs`.
//!
//! The parsed document is walked through its JSON form, which keeps us independent of the
//! crate's internal element types. Every top-level block (paragraph, table) becomes one
//! paragraph of output; blocks are separated by blank lines. Table cells are tab-separated
//! and table rows end with a newline.

use super::ExtractionError;
use serde_json::Value;

pub(super) fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = docx_rs::read_docx(bytes).map_err(|error| ExtractionError::Docx(error.to_string()))?;
    let json: Value = serde_json::from_str(&docx.json())
        .map_err(|error| ExtractionError::Docx(format!("JSON parsing error: {error}")))?;

    let blocks = json
        .pointer("/document/children")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let paragraphs: Vec<String> = blocks
        .iter()
        .map(|block| {
            let mut text = String::new();
            collect_text(block, &mut text);
            text.trim().to_string()
        })
        .filter(|paragraph| !paragraph.is_empty())
        .collect();

    Ok(paragraphs.join("\n\n"))
}

/// Append every text run beneath `value` in document order.
fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let kind = map.get("type").and_then(Value::as_str);
            match kind {
                Some("text") => {
                    if let Some(text) = map
                        .get("data")
                        .and_then(|data| data.get("text"))
                        .and_then(Value::as_str)
                    {
                        out.push_str(text);
                    }
                }
                Some("tab") => out.push('\t'),
                Some("break") => out.push('\n'),
                _ => {
                    match kind {
                        Some("tableRow") => push_separator(out, '\n'),
                        Some("tableCell") => push_separator(out, '\t'),
                        Some("paragraph") => push_separator(out, ' '),
                        _ => {}
                    }
                    for child in map.values() {
                        collect_text(child, out);
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}

/// Keep sibling cells, rows, and nested paragraphs from running together.
fn push_separator(out: &mut String, separator: char) {
    if out.chars().last().is_some_and(|last| !last.is_whitespace()) {
        out.push(separator);
    }
}
