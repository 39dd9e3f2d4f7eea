/*!
Statutory instant-runoff tabulation for single-winner races.

The ballots are corrected once following the Maine rules (see the [`manual`]),
then candidates are eliminated one at a time until one of them holds a majority
of the continuing ballots. Ties are broken by a seeded random draw, so that the
same ballots and the same seed always produce the same outcome.

```
use rcv_statute::{BallotChoice, ElectionRunner, RawBallot};

let ballots: Vec<RawBallot> = [["Anna", "Bob"], ["Anna", "Clara"], ["Bob", "Anna"]]
    .iter()
    .enumerate()
    .map(|(idx, b)| {
        let choices = b.iter().map(|s| BallotChoice::from_label(s)).collect();
        RawBallot::new(&format!("b{}", idx), choices)
    })
    .collect();

let result = ElectionRunner::new(1).run(&ballots, None)?;
assert_eq!(result.winner, "Anna");
# Ok::<(), rcv_statute::VotingErrors>(())
```
*/

mod ballot;
pub mod builder;
mod config;
mod elimination;
pub mod manual;
mod normalize;
mod tabulate;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use std::{
    collections::{BTreeSet, HashMap},
    ops::{Add, AddAssign},
};

pub use crate::config::*;
pub use crate::normalize::{normalize, normalize_with_candidates};

use crate::ballot::{advance_ballots, BallotState};
use crate::elimination::{decide, Decision, TieBreak};
use crate::normalize::{classify, normalize_slots, Slot};
use crate::tabulate::{tabulate, RoundTally};

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

/// The names of the candidates, indexed by their identifiers.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct CandidateRegistry {
    names: Vec<String>,
    ids: HashMap<String, CandidateId>,
    // When set, names outside of the registry are not accepted.
    closed: bool,
}

impl CandidateRegistry {
    fn declared(names: &[String]) -> CandidateRegistry {
        let mut reg = CandidateRegistry::default();
        for name in names.iter() {
            reg.lookup(name.trim());
        }
        reg.closed = true;
        reg
    }

    fn lookup(&mut self, name: &str) -> Option<CandidateId> {
        if let Some(cid) = self.ids.get(name) {
            return Some(*cid);
        }
        if self.closed {
            return None;
        }
        let cid = CandidateId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), cid);
        Some(cid)
    }

    fn name(&self, cid: CandidateId) -> &str {
        self.names
            .get(cid.0 as usize)
            .map(|s| s.as_str())
            .unwrap_or_default()
    }

    fn names(&self, cids: &[CandidateId]) -> Vec<String> {
        cids.iter().map(|cid| self.name(*cid).to_string()).collect()
    }
}

/// Runs the tabulation of a single election.
///
/// The runner owns the random generator used for the tie breaks. It is consumed
/// by [`ElectionRunner::run`]: a new runner is needed for every election.
#[derive(Debug, Clone)]
pub struct ElectionRunner {
    rng: StdRng,
}

impl ElectionRunner {
    pub fn new(seed: u64) -> ElectionRunner {
        ElectionRunner::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> ElectionRunner {
        ElectionRunner { rng }
    }

    /// Runs the voting algorithm for the given ballots.
    ///
    /// Arguments:
    /// * `ballots` the ballots, as recorded
    /// * `candidates` the registered candidates for this election. If not provided, the
    /// candidates will be inferred from the ballots. If provided, any other name on a
    /// ballot is treated as a blank rank.
    pub fn run(
        mut self,
        ballots: &[RawBallot],
        candidates: Option<&[String]>,
    ) -> Result<VotingResult, VotingErrors> {
        info!(
            "Processing {:?} ballots, candidates: {:?}",
            ballots.len(),
            candidates
        );

        let mut registry = match candidates {
            Some(names) => CandidateRegistry::declared(names),
            None => CandidateRegistry::default(),
        };
        let mut states: Vec<BallotState> = ballots
            .iter()
            .map(|b| BallotState::new(normalize_ballot(b, &mut registry)))
            .collect();
        let ballot_digest = ballot_digest(ballots, &states, &registry);
        debug!("run: ballot digest: {}", ballot_digest);

        // Candidates without any first choice are out from the start.
        let mut still_running: BTreeSet<CandidateId> =
            states.iter().filter_map(|b| b.current()).collect();
        if still_running.is_empty() {
            return EmptyElectionSnafu {}.fail();
        }
        for cid in still_running.iter() {
            info!("Candidate: {}: {}", cid.0, registry.name(*cid));
        }

        let initial_transfers = advance_ballots(&mut states, &still_running);
        let initially_exhausted = initial_transfers.exhausted_without_candidate();
        info!(
            "{} ballots do not rank any candidate and are exhausted",
            initially_exhausted.0
        );

        let max_rounds = still_running.len() as RoundId;
        let mut round_stats: Vec<RoundStats> = Vec::new();
        let mut tiebreaks: Vec<TieBreakEvent> = Vec::new();

        for round in 1..=max_rounds {
            let tally = tabulate(round, &states, &still_running)?;
            let (decision, tiebreak) = decide(&tally, &mut still_running, &mut self.rng)?;
            let tiebreak = tiebreak.map(|tb| tiebreak_event(round, &tb, &registry));
            if let Some(tb) = tiebreak.clone() {
                tiebreaks.push(tb);
            }

            let decision = match decision {
                Decision::Elected(cid) => RoundDecision::Elected(registry.name(cid).to_string()),
                Decision::Eliminated(cid) => {
                    let transfers = advance_ballots(&mut states, &still_running);
                    let (moved, exhausted) = transfers.from_candidate(cid);
                    RoundDecision::Eliminated(EliminationStats {
                        name: registry.name(cid).to_string(),
                        transfers: moved
                            .iter()
                            .map(|(to, vc)| (registry.name(*to).to_string(), vc.0))
                            .collect(),
                        exhausted: exhausted.0,
                    })
                }
            };

            let stats = round_tally_to_stats(&tally, decision, tiebreak, &registry);
            info!("Round {}: {:?}", round, stats);
            let elected = match &stats.decision {
                RoundDecision::Elected(name) => Some(name.clone()),
                RoundDecision::Eliminated(_) => None,
            };
            round_stats.push(stats);

            if let Some(winner) = elected {
                info!("Winner: {} after {} rounds", winner, round);
                return Ok(VotingResult {
                    winner,
                    rounds: round,
                    ballot_count: ballots.len() as u64,
                    initially_exhausted: initially_exhausted.0,
                    ballot_digest,
                    round_stats,
                    tiebreaks,
                });
            }
        }
        Err(VotingErrors::NoConvergence { rounds: max_rounds })
    }
}

/// Runs an election with a fresh runner seeded with `seed`.
pub fn run_election(
    ballots: &[RawBallot],
    candidates: Option<&[String]>,
    seed: u64,
) -> Result<VotingResult, VotingErrors> {
    ElectionRunner::new(seed).run(ballots, candidates)
}

fn normalize_ballot(ballot: &RawBallot, registry: &mut CandidateRegistry) -> Vec<CandidateId> {
    if ballot.choices.len() > MAX_RANKINGS {
        warn!(
            "ballot {}: {} choices, only the first {} are considered",
            ballot.id,
            ballot.choices.len(),
            MAX_RANKINGS
        );
    }
    let slots: Vec<Slot<CandidateId>> = ballot
        .choices
        .iter()
        .take(MAX_RANKINGS)
        .map(|c| match classify(c) {
            Slot::Filled(name) => match registry.lookup(&name) {
                Some(cid) => Slot::Filled(cid),
                None => {
                    warn!(
                        "ballot {}: unknown candidate {:?}, treated as blank",
                        ballot.id, name
                    );
                    Slot::Blank
                }
            },
            Slot::Overvote => Slot::Overvote,
            Slot::Blank => Slot::Blank,
        })
        .collect();
    normalize_slots(&slots)
}

/// Hash of the corrected ballots. Two tabulations of the same ballots have the same digest.
fn ballot_digest(
    ballots: &[RawBallot],
    states: &[BallotState],
    registry: &CandidateRegistry,
) -> String {
    let mut content = String::new();
    for (raw, state) in ballots.iter().zip(states.iter()) {
        content.push_str(&raw.id);
        content.push('\t');
        content.push_str(&registry.names(state.ranking()).join("\t"));
        content.push('\n');
    }
    sha256::digest(content)
}

fn tiebreak_event(round: RoundId, tb: &TieBreak, registry: &CandidateRegistry) -> TieBreakEvent {
    TieBreakEvent {
        round,
        kind: tb.kind,
        participants: registry.names(&tb.participants),
        selected: registry.name(tb.selected).to_string(),
    }
}

fn round_tally_to_stats(
    tally: &RoundTally,
    decision: RoundDecision,
    tiebreak: Option<TieBreakEvent>,
    registry: &CandidateRegistry,
) -> RoundStats {
    RoundStats {
        round: tally.round,
        tally: tally
            .counts
            .iter()
            .map(|(cid, vc)| CandidateTally {
                name: registry.name(*cid).to_string(),
                votes: vc.0,
                share: tally.share(*vc),
            })
            .collect(),
        continuing: tally.continuing.0,
        exhausted: tally.exhausted.0,
        threshold: tally.threshold().0,
        decision,
        tiebreak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // Each ballot is written as comma-separated labels, with its number of copies.
    fn election(ballots: &[(&str, usize)]) -> Builder {
        let mut builder = Builder::new();
        for (line, count) in ballots.iter() {
            let choices: Vec<&str> = line.split(',').collect();
            for _ in 0..*count {
                builder.add_ballot_simple(&choices);
            }
        }
        builder
    }

    fn eliminated(stats: &RoundStats) -> Option<&EliminationStats> {
        match &stats.decision {
            RoundDecision::Eliminated(es) => Some(es),
            RoundDecision::Elected(_) => None,
        }
    }

    #[test]
    fn majority_in_first_round() {
        init();
        let res = election(&[("A,B", 6), ("B,A", 4)]).run(0).unwrap();
        assert_eq!(res.winner, "A");
        assert_eq!(res.rounds, 1);
        assert_eq!(res.round_stats[0].threshold, 6);
        assert!(res.tiebreaks.is_empty());
    }

    #[test]
    fn three_candidates_lowest_is_eliminated() {
        init();
        let res = election(&[
            ("A,,", 40),
            ("B,,", 35),
            ("C,B,", 20),
            ("C,,", 5),
        ])
        .run(0)
        .unwrap();

        let r1 = &res.round_stats[0];
        let counts: Vec<(&str, u64)> = r1.tally.iter().map(|t| (t.name.as_str(), t.votes)).collect();
        assert_eq!(counts, vec![("A", 40), ("B", 35), ("C", 25)]);
        assert!(r1.tiebreak.is_none());
        let es = eliminated(r1).unwrap();
        assert_eq!(es.name, "C");
        assert_eq!(es.transfers, vec![("B".to_string(), 20)]);
        assert_eq!(es.exhausted, 5);

        let r2 = &res.round_stats[1];
        let counts: Vec<(&str, u64)> = r2.tally.iter().map(|t| (t.name.as_str(), t.votes)).collect();
        assert_eq!(counts, vec![("B", 55), ("A", 40)]);
        assert_eq!(r2.continuing, 95);
        assert_eq!(r2.exhausted, 5);
        assert_eq!(r2.decision, RoundDecision::Elected("B".to_string()));
        assert_eq!(res.winner, "B");
        assert_eq!(res.rounds, 2);
    }

    #[test]
    fn final_tie_is_drawn() {
        init();
        let b = election(&[("A", 3), ("B", 3), ("C,A", 1), ("C,B", 1)]);
        let res = b.clone().run(3).unwrap();
        assert_eq!(res.rounds, 2);
        assert!(res.winner == "A" || res.winner == "B");
        assert_eq!(res.tiebreaks.len(), 1);
        let tb = &res.tiebreaks[0];
        assert_eq!(tb.kind, TieBreakKind::Election);
        assert_eq!(tb.round, 2);
        assert_eq!(tb.participants, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(tb.selected, res.winner);
        // Same seed, same outcome.
        assert_eq!(b.run(3).unwrap(), res);
    }

    #[test]
    fn candidates_without_first_choice_are_not_running() {
        init();
        let res = election(&[("A,D", 3), ("B,D", 2), ("C,D", 1)])
            .run(0)
            .unwrap();
        let names: Vec<&str> = res.round_stats[0].tally.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        // C is eliminated, D is skipped and the ballot is exhausted.
        let es = eliminated(&res.round_stats[0]).unwrap();
        assert_eq!(es.name, "C");
        assert_eq!(es.exhausted, 1);
        assert_eq!(res.winner, "A");
    }

    #[test]
    fn one_candidate_is_eliminated_per_round() {
        init();
        let res = election(&[
            ("A,B,C,D,E", 5),
            ("B,C,D,E,A", 4),
            ("C,D,E,A,B", 4),
            ("D,E,A,B,C", 3),
            ("E,A,B,C,D", 2),
        ])
        .run(11)
        .unwrap();
        assert!(res.rounds as usize <= 5 - 1 + 1);
        for (idx, rs) in res.round_stats.iter().enumerate() {
            assert_eq!(rs.tally.len(), 5 - idx);
            let total: f64 = rs.tally.iter().filter(|t| t.votes > 0).map(|t| t.share).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
        assert_eq!(res.ballot_count, 18);
    }

    #[test]
    fn corrections_are_applied_before_counting() {
        init();
        let res = election(&[
            ("A,A,B", 2),
            ("B,overvote,A", 2),
            ("C,undervote,B", 1),
            ("undervote,undervote,A", 1),
        ])
        .run(0)
        .unwrap();
        assert_eq!(res.initially_exhausted, 1);
        assert_eq!(res.round_stats[0].continuing, 5);
        let es = eliminated(&res.round_stats[0]).unwrap();
        assert_eq!(es.name, "C");
        assert_eq!(es.transfers, vec![("B".to_string(), 1)]);
        assert_eq!(res.winner, "B");
    }

    #[test]
    fn declared_candidates_reject_other_names() {
        init();
        let mut b = Builder::new().candidates(&["A".to_string(), "B".to_string()]);
        b.add_ballot_simple(&["Z", "A"]);
        b.add_ballot_simple(&["B"]);
        b.add_ballot_simple(&["B"]);
        let res = b.run(0).unwrap();
        // "Z" is a blank first rank, skipped in favor of "A".
        let counts: Vec<(&str, u64)> = res.round_stats[0]
            .tally
            .iter()
            .map(|t| (t.name.as_str(), t.votes))
            .collect();
        assert_eq!(counts, vec![("B", 2), ("A", 1)]);
    }

    #[test]
    fn counted_rankings_match_the_corrected_ballots() {
        init();
        let declared = vec!["A".to_string(), "B".to_string()];
        let mut b = Builder::new().candidates(&declared);
        b.add_ballot_simple(&["Zed", "Yan", "A"]);
        b.add_ballot_simple(&["Zed", "A", "B"]);
        b.add_ballot_simple(&["B", "B", "overvote"]);
        assert_eq!(b.ballots().len(), 3);

        let mut registry = CandidateRegistry::declared(&declared);
        for raw in b.ballots() {
            let cids = normalize_ballot(raw, &mut registry);
            let counted = registry.names(&cids);
            let corrected = normalize_with_candidates(raw, Some(declared.as_slice()));
            assert_eq!(counted, corrected.ranking, "ballot {}", raw.id);
        }

        let res = b.run(0).unwrap();
        assert_eq!(res.initially_exhausted, 1);
        assert_eq!(res.round_stats[0].continuing, 2);
    }

    #[test]
    fn empty_election_is_an_error() {
        init();
        let b = election(&[("overvote,A", 2), (",", 1)]);
        assert_eq!(b.run(0), Err(VotingErrors::EmptyElection {}));
        assert_eq!(
            run_election(&[], None, 0),
            Err(VotingErrors::EmptyElection {})
        );
    }

    #[test]
    fn digest_depends_on_the_corrected_ballots() {
        init();
        let r1 = election(&[("A,A,B", 1), ("B", 1), ("A", 1)]).run(0).unwrap();
        let r2 = election(&[("A,B", 1), ("B", 1), ("A", 1)]).run(5).unwrap();
        let r3 = election(&[("A", 1), ("B", 1), ("A", 1)]).run(0).unwrap();
        assert_eq!(r1.ballot_digest, r2.ballot_digest);
        assert_ne!(r1.ballot_digest, r3.ballot_digest);
        assert_eq!(r1.ballot_digest.len(), 64);
    }
}
