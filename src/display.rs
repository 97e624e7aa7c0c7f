// src/display.rs
//! Plain-text rendering shared by the CLI and the CSV extractor.

use crate::record::{AnalysisRecord, EntityMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Column-aligned table: header row, a dashed rule for left-aligned tables, then rows.
/// Short rows are padded with empty cells.
pub fn render_table(headers: &[String], rows: &[Vec<String>], align: Align) -> String {
    let cols = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if cols == 0 {
        return String::new();
    }

    fn cell(row: &[String], i: usize) -> String {
        row.get(i).map(String::as_str).unwrap_or("").to_string()
    }

    let mut widths = vec![0usize; cols];
    for (i, w) in widths.iter_mut().enumerate() {
        *w = std::iter::once(cell(headers, i))
            .chain(rows.iter().map(|r| cell(r.as_slice(), i)))
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);
    }

    let fmt_row = |row: &[String]| -> String {
        let sep = if align == Align::Left { "  " } else { " " };
        let line = (0..cols)
            .map(|i| {
                let c = cell(row, i);
                match align {
                    Align::Left => format!("{:<width$}", c, width = widths[i]),
                    Align::Right => format!("{:>width$}", c, width = widths[i]),
                }
            })
            .collect::<Vec<_>>()
            .join(sep);
        line.trim_end().to_string()
    };

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(fmt_row(headers));
    if align == Align::Left {
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
    }
    out.extend(rows.iter().map(|r| fmt_row(r.as_slice())));
    out.join("\n")
}

/// `text / category / confidence` table for entities and PII.
pub fn entity_table(entities: &[EntityMatch]) -> String {
    let headers = ["text", "category", "confidence"].map(String::from);
    let rows: Vec<Vec<String>> = entities
        .iter()
        .map(|e| vec![e.text.clone(), e.category.clone(), format!("{:.2}", e.confidence)])
        .collect();
    render_table(&headers, &rows, Align::Left)
}

/// Full CLI report, one banner per section.
pub fn render_report(record: &AnalysisRecord) -> String {
    let mut out = String::new();
    let mut section = |title: &str, body: String| {
        out.push_str(&format!("\n===== {title} =====\n"));
        out.push_str(&body);
        out.push('\n');
    };

    section("SUMMARY", record.summary.join("\n"));

    let lang = &record.language;
    section(
        "LANGUAGE DETECTION",
        format!(
            "Language: {} ({}) - Confidence: {:.2}",
            lang.name, lang.iso6391, lang.confidence
        ),
    );

    let multi = if record.multi_language.is_empty() {
        "No multilingual content detected.".to_string()
    } else {
        record
            .multi_language
            .iter()
            .map(|l| format!("{} ({}): {:.2}", l.name, l.iso6391, l.confidence))
            .collect::<Vec<_>>()
            .join("\n")
    };
    section("MULTI-LANGUAGE", multi);

    let s = &record.sentiment;
    section(
        "SENTIMENT",
        format!(
            "Overall: {} (positive {:.2}, neutral {:.2}, negative {:.2})",
            s.overall, s.scores.positive, s.scores.neutral, s.scores.negative
        ),
    );

    let c = &record.classification;
    section(
        "CLASSIFICATION",
        format!(
            "Label: {}\nConfidence: {:.2}\nExplanation: {}",
            c.label, c.confidence, c.explanation
        ),
    );

    let phrases = if record.key_phrases.is_empty() {
        "No key phrases found.".to_string()
    } else {
        record.key_phrases.join(", ")
    };
    section("KEY PHRASES", phrases);

    let entities = if record.entities.is_empty() {
        "No entities detected.".to_string()
    } else {
        entity_table(&record.entities)
    };
    section("ENTITIES", entities);

    let pii = if record.pii.is_empty() {
        "No PII entities found.".to_string()
    } else {
        entity_table(&record.pii)
    };
    section("PII", pii);

    out
}
