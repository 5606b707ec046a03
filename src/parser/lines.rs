use super::dom::{ContentBlock, Row};
use super::fields::LABEL_SEP;
use super::record::WinnerRow;
use super::winners::WinnerDetector;

const VALUE_JOIN: &str = "、";

/// Layout of one content child, judged from its rows alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableShape {
    /// No table, or a single row.
    Plain,
    /// Label cell, value cell.
    TwoColumn,
    /// Header row over a data row.
    VerticalPair,
    /// Anything else: flat label/value pairs or winner tables.
    Irregular,
}

impl TableShape {
    pub fn of(rows: &[Row]) -> Self {
        if rows.len() <= 1 {
            return TableShape::Plain;
        }
        match rows[0].cells.len() {
            2 => TableShape::TwoColumn,
            n if n >= 3 && rows.len() == 2 => TableShape::VerticalPair,
            _ => TableShape::Irregular,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub lines: Vec<String>,
    pub winners: Vec<WinnerRow>,
}

/// Flatten the content block into candidate lines, in document order.
pub fn extract_lines(block: &ContentBlock, detector: Option<&WinnerDetector>) -> Extraction {
    let mut out = Extraction::default();
    for node in &block.children {
        match TableShape::of(&node.rows) {
            TableShape::Plain => push_plain(&node.text, &mut out.lines),
            TableShape::TwoColumn => two_column(&node.rows, &mut out.lines),
            TableShape::VerticalPair => vertical_pair(&node.rows, &mut out.lines),
            TableShape::Irregular => irregular(&node.rows, detector, &mut out),
        }
    }
    out
}

/// Remove all whitespace.
pub fn squash(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_line(text: &str) -> bool {
    text.chars().count() > 3
}

fn split_trimmed(text: &str) -> impl Iterator<Item = &str> {
    text.trim().split('\n').map(str::trim)
}

fn push_plain(text: &str, lines: &mut Vec<String>) {
    lines.extend(split_trimmed(text).filter(|t| is_line(t)).map(String::from));
}

/// "<label>：<value、value>", or None if too short to be useful.
fn label_value(label: &str, value: &str) -> Option<String> {
    let mut line = squash(label);
    if !line.ends_with(LABEL_SEP) {
        line.push(LABEL_SEP);
    }
    let values: Vec<&str> = split_trimmed(value).filter(|v| !v.is_empty()).collect();
    line.push_str(&values.join(VALUE_JOIN));
    is_line(&line).then_some(line)
}

fn two_column(rows: &[Row], lines: &mut Vec<String>) {
    for row in rows {
        let (Some(label), Some(value)) = (row.cell(0), row.cell(1)) else {
            continue;
        };
        if value.trim().is_empty() {
            push_plain(label, lines);
        } else {
            lines.extend(label_value(label, value));
        }
    }
}

fn vertical_pair(rows: &[Row], lines: &mut Vec<String>) {
    for idx in 0..rows[0].cells.len() {
        if let (Some(label), Some(value)) = (rows[0].cell(idx), rows[1].cell(idx)) {
            lines.extend(label_value(label, value));
        }
    }
}

// TODO: winner tables led by a sequence-number column with the winner/price
// cells elsewhere in the row are not recognised; needs sample pages first.
fn irregular(rows: &[Row], detector: Option<&WinnerDetector>, out: &mut Extraction) {
    let mut i = 0;
    while i < rows.len() {
        let row = &rows[i];
        if let Some(d) = detector.filter(|d| d.is_header(row)) {
            let found = d.collect(rows, i);
            i += found.len();
            out.winners.extend(found);
        } else if row.cells.len() % 2 == 0 {
            for pair in row.cells.chunks(2) {
                out.lines.extend(label_value(&pair[0], &pair[1]));
            }
        }
        i += 1;
    }
}
