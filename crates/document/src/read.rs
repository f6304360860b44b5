use std::path::Path;

use {
    docx_rs::{
        DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
        TableRowChild,
    },
    tracing::debug,
};

use crate::error::{DocumentError, Result};

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for piece in &run.children {
                match piece {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    _ => {},
                }
            }
        }
    }
    text
}

/// One line per table row, cells separated by tabs.
fn table_text(table: &Table, out: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell| match cell {
                TableRowChild::TableCell(cell) => cell
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
            .collect();
        out.push(cells.join("\t"));
    }
}

/// Text of every non-empty paragraph and table row in document order.
pub fn extract_text(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| DocumentError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => lines.push(paragraph_text(p)),
            DocumentChild::Table(t) => table_text(t, &mut lines),
            _ => {},
        }
    }
    lines.retain(|line| !line.trim().is_empty());
    debug!(path = %path.display(), lines = lines.len(), "extracted text");
    Ok(lines)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{build::build_document, schema::DocumentSpec},
        serde_json::json,
    };

    #[test]
    fn reads_back_built_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        let spec: DocumentSpec = serde_json::from_value(json!({
            "title": "Weekly report",
            "sections": [
                { "type": "heading", "text": "Summary", "level": 2 },
                { "type": "paragraph", "text": "All checks passed.", "options": { "italic": true } },
                { "type": "bullet", "items": ["uptime 99.9%", "no incidents"] },
                { "type": "numbered", "items": ["deploy", "verify"] },
                { "type": "page_break" },
                { "type": "table", "rows": [["metric", "value"], ["p95", 120]] }
            ]
        }))
        .unwrap();
        let report = build_document(&spec, &path).unwrap();
        assert_eq!(report.sections, 6);
        assert_eq!(report.images, 0);

        let lines = extract_text(&path).unwrap();
        assert_eq!(lines, vec![
            "Weekly report",
            "Summary",
            "All checks passed.",
            "uptime 99.9%",
            "no incidents",
            "deploy",
            "verify",
            "metric\tvalue",
            "p95\t120",
        ]);
    }

    #[test]
    fn garbage_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            extract_text(&path).unwrap_err(),
            DocumentError::Parse { .. }
        ));
    }
}
