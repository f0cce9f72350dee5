//! # Text diffs
//!
//! Minimal edits between two versions of a document, from a character
//! longest-common-subsequence table.
//!
//! Offsets in [`EditRecord`] are char offsets into the old text. Deletes and
//! replacements cover `start..=end_inclusive`; for an insert both offsets
//! name the point the text goes before.
//!
//! Consumers:
//! - [`to_text_edits`] turns records into editor ranges with exclusive ends.
//! - [`render_patches`] prints records as patch expressions, last first.
//! - [`apply_records`] applies records to the old text.

use crate::position::{LineIndex, Range};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    pub kind: EditKind,
    pub start: usize,
    pub end_inclusive: usize,
    pub new_content: String,
}

/// An edit in editor coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Keep,
    Delete(usize),
    Insert(usize),
}

/// Edit records turning `old` into `new`, in document order
pub fn diff(old: &str, new: &str) -> Vec<EditRecord> {
    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let steps = lcs_steps(a_mid, b_mid, prefix);
    let records = group_steps(&steps, &b);
    tracing::debug!(
        "[Diff] {} record(s) for {} -> {} chars",
        records.len(),
        a.len(),
        b.len()
    );
    records
}

/// Walk the LCS table; offsets are shifted by `base`
///
/// When dropping an old char and taking a new one are equally good, the
/// delete comes first.
fn lcs_steps(a: &[char], b: &[char], base: usize) -> Vec<(Step, usize)> {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    // table[i * width + j] = LCS length of a[i..] and b[j..]
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a[i] == b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    // Each step carries the old offset it happens at
    let mut steps = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && a[i] == b[j] {
            steps.push((Step::Keep, base + i));
            i += 1;
            j += 1;
        } else if j == m || (i < n && table[(i + 1) * width + j] >= table[i * width + j + 1]) {
            steps.push((Step::Delete(base + i), base + i));
            i += 1;
        } else {
            steps.push((Step::Insert(base + j), base + i));
            j += 1;
        }
    }
    steps
}

/// Merge runs of deletes and inserts between kept chars into records
fn group_steps(steps: &[(Step, usize)], new: &[char]) -> Vec<EditRecord> {
    let mut records = Vec::new();
    let mut run: Vec<(Step, usize)> = Vec::new();

    let mut flush = |run: &mut Vec<(Step, usize)>| {
        if run.is_empty() {
            return;
        }
        let deleted: Vec<usize> = run
            .iter()
            .filter_map(|(step, _)| match step {
                Step::Delete(offset) => Some(*offset),
                _ => None,
            })
            .collect();
        let inserted: String = run
            .iter()
            .filter_map(|(step, _)| match step {
                Step::Insert(offset) => Some(new[*offset]),
                _ => None,
            })
            .collect();
        let at = run[0].1;
        let record = match (deleted.first(), deleted.last()) {
            (Some(&start), Some(&end)) if !inserted.is_empty() => EditRecord {
                kind: EditKind::Replace,
                start,
                end_inclusive: end,
                new_content: inserted,
            },
            (Some(&start), Some(&end)) => EditRecord {
                kind: EditKind::Delete,
                start,
                end_inclusive: end,
                new_content: String::new(),
            },
            _ => EditRecord {
                kind: EditKind::Insert,
                start: at,
                end_inclusive: at,
                new_content: inserted,
            },
        };
        records.push(record);
        run.clear();
    };

    for step in steps {
        match step.0 {
            Step::Keep => flush(&mut run),
            _ => run.push(*step),
        }
    }
    flush(&mut run);
    records
}

/// Editor edits for `records` against `old`
///
/// A run ending with a newline ends at the start of the next line.
pub fn to_text_edits(old: &str, records: &[EditRecord]) -> Vec<TextEdit> {
    let index = LineIndex::new(old);
    records
        .iter()
        .map(|record| {
            let start = index.position(record.start);
            let end = match record.kind {
                EditKind::Insert => start,
                EditKind::Delete | EditKind::Replace => index.position(record.end_inclusive + 1),
            };
            TextEdit {
                range: Range::new(start, end),
                new_text: record.new_content.clone(),
            }
        })
        .collect()
}

/// Records sorted last-first, so applying them in order never shifts an
/// offset that is still to be used
fn descending(records: &[EditRecord]) -> Vec<&EditRecord> {
    let mut sorted: Vec<&EditRecord> = records.iter().collect();
    sorted.sort_by(|x, y| y.start.cmp(&x.start));
    sorted
}

/// Patch expressions, one per record, in application order
pub fn render_patches(records: &[EditRecord]) -> Vec<String> {
    descending(records)
        .into_iter()
        .map(|record| {
            let text = serde_json::Value::String(record.new_content.clone()).to_string();
            match record.kind {
                EditKind::Insert => format!("insert({}, {})", record.start, text),
                EditKind::Delete => {
                    format!("delete({}, {})", record.start, record.end_inclusive + 1)
                }
                EditKind::Replace => format!(
                    "replace({}, {}, {})",
                    record.start,
                    record.end_inclusive + 1,
                    text
                ),
            }
        })
        .collect()
}

/// Apply `records` to `old`
pub fn apply_records(old: &str, records: &[EditRecord]) -> String {
    let mut chars: Vec<char> = old.chars().collect();
    for record in descending(records) {
        let start = record.start.min(chars.len());
        let end = match record.kind {
            EditKind::Insert => start,
            EditKind::Delete | EditKind::Replace => (record.end_inclusive + 1).min(chars.len()),
        };
        chars.splice(start..end, record.new_content.chars());
    }
    chars.into_iter().collect()
}
