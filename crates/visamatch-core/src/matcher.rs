//! Pairing personal photos with visa photos by embedding distance.
//!
//! Two greedy strategies share the [`PairingStrategy`] interface. Neither
//! searches for the optimal bipartite assignment.

use crate::types::{ImageRecord, MatchGroup, Pairing};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cross pair, by index into the personal and visa lists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    pub distance: f32,
    pub personal: usize,
    pub visa: usize,
}

/// Cosine distance for every personal × visa pair, sorted ascending.
///
/// The sort is stable, so equal distances keep personal-major input order.
pub fn candidate_pairs(personal: &[ImageRecord], visa: &[ImageRecord]) -> Vec<CandidatePair> {
    let mut pairs = Vec::with_capacity(personal.len() * visa.len());
    for (pi, p) in personal.iter().enumerate() {
        for (vi, v) in visa.iter().enumerate() {
            pairs.push(CandidatePair {
                distance: p.embedding.cosine_distance(&v.embedding),
                personal: pi,
                visa: vi,
            });
        }
    }
    pairs.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    pairs
}

pub trait PairingStrategy {
    /// Pair records whose distance is strictly below `threshold`. Consumes
    /// both lists; every record ends up in exactly one slot of the result.
    fn pair(&self, personal: Vec<ImageRecord>, visa: Vec<ImageRecord>, threshold: f32) -> Pairing;
}

/// Accept pairs in globally ascending distance order, each record at most once.
pub struct GlobalGreedy;

impl PairingStrategy for GlobalGreedy {
    fn pair(&self, personal: Vec<ImageRecord>, visa: Vec<ImageRecord>, threshold: f32) -> Pairing {
        let mut used_personal = vec![false; personal.len()];
        let mut used_visa = vec![false; visa.len()];
        let mut accepted = Vec::new();

        for pair in candidate_pairs(&personal, &visa) {
            if used_personal[pair.personal] || used_visa[pair.visa] {
                continue;
            }
            // NaN distances never compare below the threshold.
            if pair.distance < threshold {
                used_personal[pair.personal] = true;
                used_visa[pair.visa] = true;
                accepted.push(pair);
            }
        }

        assemble(personal, visa, accepted)
    }
}

/// For each personal in order, take the closest visa not yet taken.
///
/// Only candidates closer than [`BEST_AVAILABLE_CEILING`] are considered, so
/// a threshold above it behaves like the ceiling.
pub struct BestAvailable;

/// Starting "best so far" distance for [`BestAvailable`].
pub const BEST_AVAILABLE_CEILING: f32 = 1.0;

impl PairingStrategy for BestAvailable {
    fn pair(&self, personal: Vec<ImageRecord>, visa: Vec<ImageRecord>, threshold: f32) -> Pairing {
        let mut used_visa = vec![false; visa.len()];
        let mut accepted = Vec::new();

        for (pi, p) in personal.iter().enumerate() {
            let mut best: Option<CandidatePair> = None;
            let mut best_distance = BEST_AVAILABLE_CEILING;
            for (vi, v) in visa.iter().enumerate() {
                if used_visa[vi] {
                    continue;
                }
                let distance = p.embedding.cosine_distance(&v.embedding);
                if distance < best_distance {
                    best_distance = distance;
                    best = Some(CandidatePair { distance, personal: pi, visa: vi });
                }
            }

            match best {
                Some(pair) if pair.distance < threshold => {
                    used_visa[pair.visa] = true;
                    accepted.push(pair);
                }
                _ => {}
            }
        }

        assemble(personal, visa, accepted)
    }
}

/// Move records into groups (ids from 1, in acceptance order) and the
/// unmatched lists (input order).
fn assemble(personal: Vec<ImageRecord>, visa: Vec<ImageRecord>, accepted: Vec<CandidatePair>) -> Pairing {
    let mut personal: Vec<Option<ImageRecord>> = personal.into_iter().map(Some).collect();
    let mut visa: Vec<Option<ImageRecord>> = visa.into_iter().map(Some).collect();

    let groups = accepted
        .into_iter()
        .zip(1u32..)
        .filter_map(|(pair, id)| {
            Some(MatchGroup {
                id,
                distance: pair.distance,
                personal: personal[pair.personal].take()?,
                visa: visa[pair.visa].take()?,
            })
        })
        .collect();

    Pairing {
        groups,
        unmatched_personal: personal.into_iter().flatten().collect(),
        unmatched_visa: visa.into_iter().flatten().collect(),
    }
}

/// Selectable pairing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    GlobalGreedy,
    BestAvailable,
}

impl Strategy {
    /// Threshold used when none is configured.
    pub fn default_threshold(&self) -> f32 {
        match self {
            Strategy::GlobalGreedy => 0.25,
            Strategy::BestAvailable => 0.5,
        }
    }

    pub fn pair(&self, personal: Vec<ImageRecord>, visa: Vec<ImageRecord>, threshold: f32) -> Pairing {
        match self {
            Strategy::GlobalGreedy => GlobalGreedy.pair(personal, visa, threshold),
            Strategy::BestAvailable => BestAvailable.pair(personal, visa, threshold),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::GlobalGreedy => "global-greedy",
            Strategy::BestAvailable => "best-available",
        })
    }
}
