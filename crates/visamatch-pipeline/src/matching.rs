//! Pair personal and visa images and file the results.

use crate::embed::{self, Unprocessable};
use crate::error::Result;
use crate::layout::{self, Layout, Relocation, Side};
use crate::report::{FiledEntry, MatchReport, MatchedEntry};
use visamatch_core::{FaceEmbed, Pairing, Strategy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub strategy: Strategy,
    pub threshold: f32,
    pub relocation: Relocation,
}

impl Default for MatchOptions {
    fn default() -> Self {
        let strategy = Strategy::default();
        Self {
            strategy,
            threshold: strategy.default_threshold(),
            relocation: Relocation::Move,
        }
    }
}

/// Embed `personal/` and `visa/`, pair them, and file every image into
/// `people/<id>/`, `unmatched/<side>/` or `unprocessable/<side>/`.
pub fn match_directories<E: FaceEmbed + ?Sized>(
    embedder: &mut E,
    layout: &Layout,
    options: &MatchOptions,
) -> Result<MatchReport> {
    layout.ensure()?;
    let personal = embed::load_records(&layout.personal, embedder)?;
    let visa = embed::load_records(&layout.visa, embedder)?;

    let pairing = options
        .strategy
        .pair(personal.records, visa.records, options.threshold);
    tracing::info!(
        strategy = %options.strategy,
        threshold = options.threshold,
        groups = pairing.groups.len(),
        unmatched_personal = pairing.unmatched_personal.len(),
        unmatched_visa = pairing.unmatched_visa.len(),
        "pairing done"
    );

    let mut report = file_pairing(pairing, layout, options)?;
    for (side, failed) in [(Side::Personal, personal.unprocessable), (Side::Visa, visa.unprocessable)] {
        report
            .unprocessable
            .extend(file_unprocessable(failed, side, layout, options.relocation)?);
    }
    Ok(report)
}

/// Relocate a finished pairing. Stops at the first filesystem error.
pub fn file_pairing(pairing: Pairing, layout: &Layout, options: &MatchOptions) -> Result<MatchReport> {
    let mode = options.relocation;
    let mut report = MatchReport {
        strategy: options.strategy,
        threshold: options.threshold,
        matched: Vec::with_capacity(pairing.groups.len()),
        unmatched: Vec::new(),
        unprocessable: Vec::new(),
    };

    for group in pairing.groups {
        let dir = layout.group(group.id);
        let personal = layout::relocate(&group.personal.path, &dir, &group.personal.filename, mode)?;
        let visa = layout::relocate(&group.visa.path, &dir, &group.visa.filename, mode)?;
        tracing::info!(
            id = group.id,
            personal = %group.personal.filename,
            visa = %group.visa.filename,
            score = 1.0 - group.distance,
            "matched"
        );
        report.matched.push(MatchedEntry {
            id: group.id,
            distance: group.distance,
            personal,
            visa,
        });
    }

    for (side, records) in [
        (Side::Personal, pairing.unmatched_personal),
        (Side::Visa, pairing.unmatched_visa),
    ] {
        let dir = layout.unmatched(side);
        for record in records {
            let destination = layout::relocate(&record.path, &dir, &record.filename, mode)?;
            tracing::warn!(file = %record.filename, %side, "unmatched");
            report.unmatched.push(FiledEntry {
                filename: record.filename,
                side,
                destination,
                reason: None,
            });
        }
    }

    Ok(report)
}

fn file_unprocessable(
    failed: Vec<Unprocessable>,
    side: Side,
    layout: &Layout,
    mode: Relocation,
) -> Result<Vec<FiledEntry>> {
    let dir = layout.unprocessable(side);
    failed
        .into_iter()
        .map(|u| {
            let destination = layout::relocate(&u.path, &dir, &u.filename, mode)?;
            Ok(FiledEntry {
                filename: u.filename,
                side,
                destination,
                reason: Some(u.reason),
            })
        })
        .collect()
}
