use log::{debug, warn};
use rand::Rng;
use snafu::OptionExt;
use std::collections::BTreeSet;

use crate::config::*;
use crate::tabulate::RoundTally;
use crate::CandidateId;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub(crate) enum Decision {
    Elected(CandidateId),
    Eliminated(CandidateId),
}

/// A random draw, kept for the report.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct TieBreak {
    pub(crate) kind: TieBreakKind,
    // In candidate order.
    pub(crate) participants: Vec<CandidateId>,
    pub(crate) selected: CandidateId,
}

/// Decides the outcome of a round.
///
/// - a candidate with more than half of the continuing ballots wins,
/// - with two candidates left at exactly one half each, the winner is drawn at random,
/// - otherwise the candidate with the fewest votes is eliminated, drawn at random
///   among the tied ones if needed.
///
/// An eliminated candidate is removed from `still_running`.
pub(crate) fn decide<R: Rng + ?Sized>(
    tally: &RoundTally,
    still_running: &mut BTreeSet<CandidateId>,
    rng: &mut R,
) -> Result<(Decision, Option<TieBreak>), VotingErrors> {
    let round = tally.round;
    let (leader, leader_count) = tally
        .leader()
        .context(NoContinuingBallotsSnafu { round })?;

    if tally.has_majority(leader_count) {
        debug!("decide: round {}: {:?} has a majority", round, leader);
        return Ok((Decision::Elected(leader), None));
    }

    if still_running.len() == 2 && tally.is_half(leader_count) {
        let participants: Vec<CandidateId> = still_running.iter().cloned().collect();
        let selected = draw(&participants, rng);
        warn!(
            "decide: round {}: candidates {:?} are tied, {:?} elected by random draw",
            round, participants, selected
        );
        let tb = TieBreak {
            kind: TieBreakKind::Election,
            participants,
            selected,
        };
        return Ok((Decision::Elected(selected), Some(tb)));
    }

    let min_count = tally
        .counts
        .iter()
        .map(|(_, vc)| *vc)
        .min()
        .context(NoContinuingBallotsSnafu { round })?;
    let mut lowest: Vec<CandidateId> = tally
        .counts
        .iter()
        .filter_map(|(cid, vc)| if *vc == min_count { Some(*cid) } else { None })
        .collect();
    lowest.sort();
    debug!("decide: round {}: lowest candidates: {:?}", round, lowest);

    let (eliminated, tiebreak) = if lowest.len() == 1 {
        (lowest[0], None)
    } else {
        let selected = draw(&lowest, rng);
        warn!(
            "decide: round {}: candidates {:?} are tied for last place, {:?} eliminated by random draw",
            round, lowest, selected
        );
        (
            selected,
            Some(TieBreak {
                kind: TieBreakKind::Elimination,
                participants: lowest,
                selected,
            }),
        )
    };
    still_running.remove(&eliminated);
    Ok((Decision::Eliminated(eliminated), tiebreak))
}

// Uniform draw. The participants are never empty.
fn draw<R: Rng + ?Sized>(participants: &[CandidateId], rng: &mut R) -> CandidateId {
    let idx = rng.gen_range(0..participants.len());
    participants[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VoteCount;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tally(counts: &[(u32, u64)]) -> RoundTally {
        let mut counts: Vec<(CandidateId, VoteCount)> = counts
            .iter()
            .map(|(c, v)| (CandidateId(*c), VoteCount(*v)))
            .collect();
        counts.sort_by(|(_, a), (_, b)| b.cmp(a));
        let continuing = counts.iter().map(|(_, vc)| *vc).sum();
        RoundTally {
            round: 1,
            counts,
            continuing,
            exhausted: VoteCount::EMPTY,
        }
    }

    fn running(xs: &[u32]) -> BTreeSet<CandidateId> {
        xs.iter().map(|x| CandidateId(*x)).collect()
    }

    #[test]
    fn majority_wins() {
        let mut r = running(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(0);
        let (d, tb) = decide(&tally(&[(1, 51), (2, 30), (3, 19)]), &mut r, &mut rng).unwrap();
        assert_eq!(d, Decision::Elected(CandidateId(1)));
        assert_eq!(tb, None);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn exactly_half_with_three_candidates_is_not_a_win() {
        let mut r = running(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(0);
        let (d, tb) = decide(&tally(&[(1, 50), (2, 30), (3, 20)]), &mut r, &mut rng).unwrap();
        assert_eq!(d, Decision::Eliminated(CandidateId(3)));
        assert_eq!(tb, None);
        assert_eq!(r, running(&[1, 2]));
    }

    #[test]
    fn lowest_is_eliminated() {
        let mut r = running(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(0);
        let (d, tb) = decide(&tally(&[(1, 40), (2, 35), (3, 25)]), &mut r, &mut rng).unwrap();
        assert_eq!(d, Decision::Eliminated(CandidateId(3)));
        assert!(tb.is_none());
        assert_eq!(r, running(&[1, 2]));
    }

    #[test]
    fn tie_for_last_place_is_drawn() {
        for seed in 0..20 {
            let mut r = running(&[1, 2, 3, 4]);
            let mut rng = StdRng::seed_from_u64(seed);
            let (d, tb) = decide(
                &tally(&[(1, 40), (2, 30), (3, 15), (4, 15)]),
                &mut r,
                &mut rng,
            )
            .unwrap();
            let tb = tb.unwrap();
            assert_eq!(tb.kind, TieBreakKind::Elimination);
            assert_eq!(tb.participants, vec![CandidateId(3), CandidateId(4)]);
            assert_eq!(d, Decision::Eliminated(tb.selected));
            assert!(!r.contains(&tb.selected));
            assert_eq!(r.len(), 3);
        }
    }

    #[test]
    fn two_way_deadlock_is_drawn() {
        let mut r = running(&[1, 2]);
        let mut rng = StdRng::seed_from_u64(7);
        let (d, tb) = decide(&tally(&[(1, 50), (2, 50)]), &mut r, &mut rng).unwrap();
        let tb = tb.unwrap();
        assert_eq!(tb.kind, TieBreakKind::Election);
        assert_eq!(tb.participants, vec![CandidateId(1), CandidateId(2)]);
        assert_eq!(d, Decision::Elected(tb.selected));
        // Nobody is eliminated on a final draw.
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn draws_follow_the_seed() {
        let t = tally(&[(1, 10), (2, 10), (3, 10), (4, 10), (5, 10)]);
        let run = |seed: u64| {
            let mut r = running(&[1, 2, 3, 4, 5]);
            let mut rng = StdRng::seed_from_u64(seed);
            decide(&t, &mut r, &mut rng).unwrap()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn every_tied_candidate_can_be_drawn() {
        let t = tally(&[(1, 10), (2, 10), (3, 10)]);
        let mut seen: BTreeSet<CandidateId> = BTreeSet::new();
        for seed in 0..200 {
            let mut r = running(&[1, 2, 3]);
            let mut rng = StdRng::seed_from_u64(seed);
            if let (Decision::Eliminated(cid), Some(_)) = decide(&t, &mut r, &mut rng).unwrap() {
                seen.insert(cid);
            }
        }
        assert_eq!(seen, running(&[1, 2, 3]));
    }
}
