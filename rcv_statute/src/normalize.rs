//! Ballot corrections of the Maine RCV rules, section 4.2.B.
//!
//! Walking the ranks from first to last:
//! - an overvote exhausts the ballot at this rank and all the following ones,
//! - two blank ranks in a row (or a blank last rank) exhaust the ballot from there,
//! - a single blank rank is skipped and the later choices move up,
//! - a repeated candidate is skipped and the later choices move up.

use log::debug;
use std::collections::HashSet;
use std::hash::Hash;

use crate::config::*;

/// One rank of a ballot, once the sentinels have been recognized.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) enum Slot<C> {
    Filled(C),
    Overvote,
    // Undervotes and empty ranks are treated the same way.
    Blank,
}

impl<C> Slot<C> {
    fn is_blank(&self) -> bool {
        matches!(self, Slot::Blank)
    }
}

/// Applies the corrections and returns the choices packed to the front,
/// in their original order and without repetition.
///
/// The input is truncated or padded to `MAX_RANKINGS` ranks.
pub(crate) fn normalize_slots<C: Eq + Hash + Clone>(slots: &[Slot<C>]) -> Vec<C> {
    let mut ranks: Vec<Slot<C>> = slots.iter().take(MAX_RANKINGS).cloned().collect();
    ranks.resize(MAX_RANKINGS, Slot::Blank);

    let mut seen: HashSet<C> = HashSet::new();
    let mut removed: Vec<usize> = Vec::new();
    // Everything at or after this rank is cleared.
    let mut cutoff = MAX_RANKINGS;

    for (idx, slot) in ranks.iter().enumerate() {
        match slot {
            Slot::Overvote => {
                cutoff = idx;
                break;
            }
            Slot::Blank => {
                let next_is_blank = ranks.get(idx + 1).map_or(true, |s| s.is_blank());
                if next_is_blank {
                    cutoff = idx;
                    break;
                }
                removed.push(idx);
            }
            Slot::Filled(c) => {
                if !seen.insert(c.clone()) {
                    removed.push(idx);
                }
            }
        }
    }

    let mut ranking: Vec<Option<C>> = ranks
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| match slot {
            Slot::Filled(c) if idx < cutoff => Some(c),
            _ => None,
        })
        .collect();

    // Close the gaps, starting from the last one so that the marked indices stay valid.
    for &idx in removed.iter().rev() {
        ranking.remove(idx);
        ranking.push(None);
    }

    ranking.into_iter().map_while(|c| c).collect()
}

/// Recognizes the sentinels in a raw choice.
///
/// A candidate with an empty name is not a valid value and counts as blank.
pub(crate) fn classify(choice: &BallotChoice) -> Slot<String> {
    match choice {
        BallotChoice::Candidate(name) if name.trim().is_empty() => Slot::Blank,
        BallotChoice::Candidate(name) => Slot::Filled(name.trim().to_string()),
        BallotChoice::Overvote => Slot::Overvote,
        BallotChoice::Undervote | BallotChoice::Blank => Slot::Blank,
    }
}

/// Applies the statutory corrections to a single ballot.
///
/// ```
/// use rcv_statute::{normalize, BallotChoice, RawBallot};
///
/// let raw = RawBallot::new(
///     "b1",
///     vec![
///         BallotChoice::from_label("Anna"),
///         BallotChoice::Undervote,
///         BallotChoice::from_label("Bob"),
///     ],
/// );
/// assert_eq!(normalize(&raw).ranking, vec!["Anna".to_string(), "Bob".to_string()]);
/// ```
pub fn normalize(ballot: &RawBallot) -> NormalizedBallot {
    normalize_with_candidates(ballot, None)
}

/// Applies the corrections with a list of declared candidates.
///
/// Any other name is a blank rank, as in the tabulation. Without a list, every
/// name is accepted.
pub fn normalize_with_candidates(
    ballot: &RawBallot,
    candidates: Option<&[String]>,
) -> NormalizedBallot {
    let declared: Option<HashSet<&str>> =
        candidates.map(|names| names.iter().map(|s| s.trim()).collect());
    let slots: Vec<Slot<String>> = ballot
        .choices
        .iter()
        .map(|c| match (classify(c), &declared) {
            (Slot::Filled(name), Some(d)) if !d.contains(name.as_str()) => Slot::Blank,
            (slot, _) => slot,
        })
        .collect();
    let ranking = normalize_slots(&slots);
    debug!("normalize: ballot {}: {:?} -> {:?}", ballot.id, ballot.choices, ranking);
    NormalizedBallot {
        id: ballot.id.clone(),
        ranking,
        metadata: ballot.metadata.clone(),
    }
}
