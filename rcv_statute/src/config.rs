// ********* Input data structures ***********

use snafu::Snafu;

/// Number of ranking positions on a ballot.
pub const MAX_RANKINGS: usize = 5;

/// Label used by cast vote records to mark an overvote.
pub const OVERVOTE_LABEL: &str = "overvote";
/// Label used by cast vote records to mark an undervote.
pub const UNDERVOTE_LABEL: &str = "undervote";

/// All the possible states corresponding to a choice in a ballot.
///
/// In most cases, it is enough to use the higher-level builder API.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum BallotChoice {
    /// A candidate. The name is expected to be cleaned up already.
    Candidate(String),
    /// More than one candidate was marked for this rank.
    /// The ballot is exhausted from this rank onward.
    Overvote,
    /// The voter explicitly skipped this rank.
    Undervote,
    /// Nothing was recorded at this rank, or the content was not understood.
    Blank,
}

impl BallotChoice {
    /// Interprets a cell with the default sentinel labels.
    ///
    /// Empty (or whitespace-only) content is blank.
    pub fn from_label(s: &str) -> BallotChoice {
        match s.trim() {
            "" => BallotChoice::Blank,
            OVERVOTE_LABEL => BallotChoice::Overvote,
            UNDERVOTE_LABEL => BallotChoice::Undervote,
            name => BallotChoice::Candidate(name.to_string()),
        }
    }
}

/// Information attached to a ballot that plays no role in the tabulation.
#[derive(Eq, PartialEq, Debug, Clone, Default, Hash)]
pub struct BallotMetadata {
    pub precinct: Option<String>,
    pub ballot_style: Option<String>,
}

/// A ballot as recorded, before the statutory corrections.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawBallot {
    pub id: String,
    pub choices: Vec<BallotChoice>,
    pub metadata: BallotMetadata,
}

impl RawBallot {
    pub fn new(id: &str, choices: Vec<BallotChoice>) -> RawBallot {
        RawBallot {
            id: id.to_string(),
            choices,
            metadata: BallotMetadata::default(),
        }
    }
}

/// A ballot after overvotes, undervotes and duplicates have been resolved.
///
/// The ranking holds at most `MAX_RANKINGS` distinct names, packed to the front.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizedBallot {
    pub id: String,
    pub ranking: Vec<String>,
    pub metadata: BallotMetadata,
}

// ******** Output data structures *********

/// The count of one candidate in a round.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateTally {
    pub name: String,
    pub votes: u64,
    /// Fraction (between 0 and 1) of the continuing ballots.
    pub share: f64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakKind {
    /// The last two candidates were exactly tied.
    Election,
    /// Several candidates shared the lowest count.
    Elimination,
}

/// A random draw between tied candidates. Reported for auditing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TieBreakEvent {
    pub round: u32,
    pub kind: TieBreakKind,
    pub participants: Vec<String>,
    pub selected: String,
}

/// Where the ballots of an eliminated candidate went.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    pub name: String,
    pub transfers: Vec<(String, u64)>,
    pub exhausted: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RoundDecision {
    Elected(String),
    Eliminated(EliminationStats),
}

/// Statistics for one round
#[derive(PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// Ordered by decreasing number of votes.
    pub tally: Vec<CandidateTally>,
    /// Number of ballots counting for a candidate in this round.
    pub continuing: u64,
    pub exhausted: u64,
    /// Smallest number of votes that makes a majority.
    pub threshold: u64,
    pub decision: RoundDecision,
    pub tiebreak: Option<TieBreakEvent>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct VotingResult {
    pub winner: String,
    pub rounds: u32,
    pub ballot_count: u64,
    /// Ballots that did not rank any candidate once corrected.
    pub initially_exhausted: u64,
    /// SHA-256 of the normalized ballots, in input order.
    pub ballot_digest: String,
    pub round_stats: Vec<RoundStats>,
    pub tiebreaks: Vec<TieBreakEvent>,
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VotingErrors {
    #[snafu(display("no ballot ranks a candidate first, the election is empty"))]
    EmptyElection {},
    #[snafu(display("round {round}: all the ballots are exhausted and no candidate won"))]
    NoContinuingBallots { round: u32 },
    #[snafu(display("no winner found after {rounds} rounds"))]
    NoConvergence { rounds: u32 },
}
