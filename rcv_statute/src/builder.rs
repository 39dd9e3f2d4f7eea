pub use crate::config::*;
use crate::ElectionRunner;

/// A builder for adding ballots.
///
/// ```
/// pub use rcv_statute::builder::Builder;
/// # use rcv_statute::VotingErrors;
///
/// let mut builder = Builder::new()
///     .candidates(&["Anna".to_string(), "Bob".to_string()]);
///
/// builder.add_ballot_simple(&["Anna", "undervote", "Bob"]);
/// builder.add_ballot_simple(&["Bob", "overvote", "Anna"]);
/// builder.add_ballot_simple(&["Anna", "", ""]);
///
/// let result = builder.run(42)?;
/// assert_eq!(result.winner, "Anna");
///
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _ballots: Vec<RawBallot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Declares the candidates. Names that are not declared will be treated as blanks.
    pub fn candidates(self, cands: &[String]) -> Builder {
        Builder {
            _candidates: Some(cands.to_vec()),
            _ballots: self._ballots,
        }
    }

    /// Adds a ballot from the content of its cells.
    ///
    /// Empty cells are blank, `overvote` and `undervote` are understood as such and
    /// everything else is a candidate name. The ballot gets an identifier following
    /// its insertion order.
    pub fn add_ballot_simple(&mut self, choices: &[&str]) {
        let id = format!("ballot-{:08}", self._ballots.len());
        let choices = choices.iter().map(|s| BallotChoice::from_label(s)).collect();
        self.add_ballot(RawBallot::new(&id, choices));
    }

    pub fn add_ballot(&mut self, ballot: RawBallot) {
        self._ballots.push(ballot);
    }

    pub fn ballots(&self) -> &[RawBallot] {
        &self._ballots
    }

    /// Tabulates the ballots added so far, with the given seed for the tie breaks.
    pub fn run(&self, seed: u64) -> Result<VotingResult, VotingErrors> {
        ElectionRunner::new(seed).run(&self._ballots, self._candidates.as_deref())
    }
}
