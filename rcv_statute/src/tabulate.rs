use log::debug;
use snafu::ensure;
use std::collections::{BTreeMap, BTreeSet};

use crate::ballot::BallotState;
use crate::config::*;
use crate::{CandidateId, RoundId, VoteCount};

/// The counts of one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct RoundTally {
    pub(crate) round: RoundId,
    /// All the running candidates, by decreasing count. Equal counts follow
    /// the candidate order.
    pub(crate) counts: Vec<(CandidateId, VoteCount)>,
    pub(crate) continuing: VoteCount,
    pub(crate) exhausted: VoteCount,
}

impl RoundTally {
    pub(crate) fn leader(&self) -> Option<(CandidateId, VoteCount)> {
        self.counts.first().cloned()
    }

    /// The fraction of the continuing ballots.
    pub(crate) fn share(&self, count: VoteCount) -> f64 {
        if self.continuing == VoteCount::EMPTY {
            0.0
        } else {
            count.0 as f64 / self.continuing.0 as f64
        }
    }

    /// More than half of the continuing ballots.
    pub(crate) fn has_majority(&self, count: VoteCount) -> bool {
        2 * count.0 > self.continuing.0
    }

    /// Exactly half of the continuing ballots.
    pub(crate) fn is_half(&self, count: VoteCount) -> bool {
        2 * count.0 == self.continuing.0
    }

    /// Smallest count reaching a majority.
    pub(crate) fn threshold(&self) -> VoteCount {
        VoteCount(self.continuing.0 / 2 + 1)
    }
}

/// Counts the ballots for the running candidates.
///
/// Exhausted ballots do not count towards the total used for the shares.
pub(crate) fn tabulate(
    round: RoundId,
    ballots: &[BallotState],
    still_running: &BTreeSet<CandidateId>,
) -> Result<RoundTally, VotingErrors> {
    // Start with all the candidates to also report the ones without votes.
    let mut tally: BTreeMap<CandidateId, VoteCount> = still_running
        .iter()
        .map(|cid| (*cid, VoteCount::EMPTY))
        .collect();
    for ballot in ballots.iter() {
        if let Some(vc) = ballot.current().and_then(|cid| tally.get_mut(&cid)) {
            *vc += VoteCount(1);
        }
    }

    let continuing: VoteCount = tally.values().cloned().sum();
    ensure!(
        continuing > VoteCount::EMPTY,
        NoContinuingBallotsSnafu { round }
    );

    let mut counts: Vec<(CandidateId, VoteCount)> = tally.into_iter().collect();
    // Stable sort: equal counts keep the candidate order.
    counts.sort_by(|(_, vc1), (_, vc2)| vc2.cmp(vc1));
    debug!("tabulate: round {}: {:?}", round, counts);

    Ok(RoundTally {
        round,
        counts,
        continuing,
        exhausted: VoteCount(ballots.len() as u64 - continuing.0),
    })
}
