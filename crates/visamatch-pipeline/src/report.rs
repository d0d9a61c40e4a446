//! Per-run reports and their console rendering.

use crate::layout::Side;
use serde::Serialize;
use std::path::PathBuf;
use visamatch_core::{Classification, Strategy, Verdict};

/// Outcome category of one report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    Skip,
    Warning,
    Failure,
}

impl Outcome {
    pub fn symbol(&self) -> &'static str {
        match self {
            Outcome::Success => "✅",
            Outcome::Skip => "⏭",
            Outcome::Warning => "⚠️",
            Outcome::Failure => "❌",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyEntry {
    pub filename: String,
    #[serde(flatten)]
    pub classification: Classification,
    /// Where the file went; `None` when it was left in place.
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifyReport {
    pub entries: Vec<ClassifyEntry>,
}

impl ClassifyReport {
    pub fn count(&self, verdict: Verdict) -> usize {
        self.entries
            .iter()
            .filter(|e| e.classification.verdict() == verdict)
            .count()
    }

    pub fn lines(&self) -> Vec<(Outcome, String)> {
        let mut lines: Vec<(Outcome, String)> = self
            .entries
            .iter()
            .map(|e| match &e.classification {
                Classification::Visa(r) => (
                    Outcome::Success,
                    format!("{} → visa (area: {:.3}, y_ratio: {:.2})", e.filename, r.size, r.y),
                ),
                Classification::Personal(r) => (
                    Outcome::Success,
                    format!("{} → personal (area: {:.3}, y_ratio: {:.2})", e.filename, r.size, r.y),
                ),
                Classification::Unknown(reason) => (Outcome::Skip, format!("{} → skipped: {reason}", e.filename)),
            })
            .collect();
        lines.push((
            Outcome::Success,
            format!(
                "Classification complete: {} visa, {} personal, {} skipped",
                self.count(Verdict::Visa),
                self.count(Verdict::Personal),
                self.count(Verdict::Unknown)
            ),
        ));
        lines
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedEntry {
    pub id: u32,
    pub distance: f32,
    pub personal: PathBuf,
    pub visa: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct FiledEntry {
    pub filename: String,
    pub side: Side,
    pub destination: PathBuf,
    /// Why the embedding failed, for unprocessable files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub strategy: Strategy,
    pub threshold: f32,
    pub matched: Vec<MatchedEntry>,
    pub unmatched: Vec<FiledEntry>,
    pub unprocessable: Vec<FiledEntry>,
}

impl MatchReport {
    pub fn lines(&self) -> Vec<(Outcome, String)> {
        let mut lines = Vec::new();
        for m in &self.matched {
            lines.push((
                Outcome::Success,
                format!(
                    "Match {} + {} → folder {} (score: {:.3})",
                    file_label(&m.personal),
                    file_label(&m.visa),
                    m.id,
                    1.0 - m.distance
                ),
            ));
        }
        for u in &self.unmatched {
            lines.push((Outcome::Warning, format!("Unmatched {}: {}", u.side, u.filename)));
        }
        for u in &self.unprocessable {
            lines.push((
                Outcome::Failure,
                format!(
                    "Unprocessable {}: {} ({})",
                    u.side,
                    u.filename,
                    u.reason.as_deref().unwrap_or("unknown error")
                ),
            ));
        }
        lines.push((
            Outcome::Success,
            format!(
                "Matching complete ({}, threshold {}): {} pairs, {} unmatched, {} unprocessable",
                self.strategy,
                self.threshold,
                self.matched.len(),
                self.unmatched.len(),
                self.unprocessable.len()
            ),
        ));
        lines
    }
}

fn file_label(path: &std::path::Path) -> String {
    crate::layout::file_name(path)
}
