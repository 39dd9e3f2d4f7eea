use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::MAX_RANKINGS;
use crate::{CandidateId, VoteCount};

/// The rank that currently decides where a ballot goes.
///
/// Positions only move forward, and `Exhausted` is terminal.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub(crate) enum RankPosition {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Exhausted,
}

impl RankPosition {
    pub(crate) fn next(self) -> RankPosition {
        match self {
            RankPosition::First => RankPosition::Second,
            RankPosition::Second => RankPosition::Third,
            RankPosition::Third => RankPosition::Fourth,
            RankPosition::Fourth => RankPosition::Fifth,
            RankPosition::Fifth | RankPosition::Exhausted => RankPosition::Exhausted,
        }
    }

    pub(crate) fn index(self) -> Option<usize> {
        match self {
            RankPosition::First => Some(0),
            RankPosition::Second => Some(1),
            RankPosition::Third => Some(2),
            RankPosition::Fourth => Some(3),
            RankPosition::Fifth => Some(4),
            RankPosition::Exhausted => None,
        }
    }
}

/// A normalized ballot and its active choice.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct BallotState {
    // Invariant: no repetition, at most MAX_RANKINGS elements.
    ranking: Vec<CandidateId>,
    active: RankPosition,
}

impl BallotState {
    pub(crate) fn new(ranking: Vec<CandidateId>) -> BallotState {
        debug_assert!(ranking.len() <= MAX_RANKINGS);
        BallotState {
            ranking,
            active: RankPosition::First,
        }
    }

    pub(crate) fn ranking(&self) -> &[CandidateId] {
        &self.ranking
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> RankPosition {
        self.active
    }

    /// The candidate this ballot currently counts for, if any.
    pub(crate) fn current(&self) -> Option<CandidateId> {
        self.active
            .index()
            .and_then(|idx| self.ranking.get(idx))
            .copied()
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.active == RankPosition::Exhausted
    }

    /// Moves the active choice to the next rank naming a running candidate.
    ///
    /// Returns true if the position changed.
    fn advance(&mut self, still_running: &BTreeSet<CandidateId>) -> bool {
        let start = self.active;
        // Each step moves one rank forward: the bound is reached at the latest
        // when falling off the last rank.
        for _ in 0..=MAX_RANKINGS {
            if self.is_exhausted() {
                break;
            }
            if let Some(cid) = self.current() {
                if still_running.contains(&cid) {
                    break;
                }
            }
            self.active = self.active.next();
        }
        self.active != start
    }
}

/// Where the moved ballots went, for each candidate they were counting for.
///
/// Ballots that were not counting for anyone are recorded under `None`.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub(crate) struct TransferStats {
    pub(crate) moves: BTreeMap<Option<CandidateId>, (BTreeMap<CandidateId, VoteCount>, VoteCount)>,
}

impl TransferStats {
    fn record(&mut self, from: Option<CandidateId>, to: Option<CandidateId>) {
        let e = self
            .moves
            .entry(from)
            .or_insert((BTreeMap::new(), VoteCount::EMPTY));
        match to {
            Some(cid) => {
                let c = e.0.entry(cid).or_insert(VoteCount::EMPTY);
                *c += VoteCount(1);
            }
            None => {
                e.1 += VoteCount(1);
            }
        }
    }

    /// The transfers and the exhausted ballots coming from the given candidate.
    pub(crate) fn from_candidate(
        &self,
        cid: CandidateId,
    ) -> (Vec<(CandidateId, VoteCount)>, VoteCount) {
        match self.moves.get(&Some(cid)) {
            Some((transfers, exhausted)) => (
                transfers.iter().map(|(c, vc)| (*c, *vc)).collect(),
                *exhausted,
            ),
            None => (Vec::new(), VoteCount::EMPTY),
        }
    }

    /// Ballots that became exhausted without counting for anyone before.
    pub(crate) fn exhausted_without_candidate(&self) -> VoteCount {
        self.moves
            .get(&None)
            .map(|(_, exhausted)| *exhausted)
            .unwrap_or(VoteCount::EMPTY)
    }
}

/// Moves every ballot whose choice is no longer running to its next valid choice,
/// or exhausts it.
///
/// Ballots already counting for a running candidate, and exhausted ballots,
/// are left untouched. Running it twice with the same candidates is the same as
/// running it once.
pub(crate) fn advance_ballots(
    ballots: &mut [BallotState],
    still_running: &BTreeSet<CandidateId>,
) -> TransferStats {
    let mut stats = TransferStats::default();
    for ballot in ballots.iter_mut() {
        let from = ballot.current();
        if ballot.advance(still_running) {
            let to = ballot.current();
            stats.record(from, to);
        }
    }
    debug!("advance_ballots: transfers: {:?}", stats);
    stats
}
