use std::collections::HashMap;
use std::path::Path;

use crate::rcv::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Removes the surrounding spaces, repeated spaces and a trailing numeric code in
/// parentheses: `Golden, Jared F. (13380)` becomes `Golden, Jared F.`.
pub fn clean_candidate_name(name: &str) -> String {
    let collapsed: String = name.split_whitespace().collect::<Vec<&str>>().join(" ");
    if let Some(stripped) = collapsed.strip_suffix(')') {
        if let Some(open) = stripped.rfind('(') {
            let code = &stripped[open + 1..];
            if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
                return stripped[..open].trim_end().to_string();
            }
        }
    }
    collapsed
}

/// The position of the interesting columns in a file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnMapping {
    pub id: Option<usize>,
    pub precinct: Option<usize>,
    pub ballot_style: Option<usize>,
    pub choices: Vec<usize>,
}

/// Finds the columns from the names in the header.
///
/// The choice columns are mandatory. The other ones are dropped with a warning.
pub fn get_col_index_mapping(
    path: &str,
    cfs: &FileSource,
    header: &[Option<String>],
) -> RcvResult<ColumnMapping> {
    let col_names: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, x)| x.as_ref().map(|s| (s.trim().to_string(), idx)))
        .collect();
    debug!("get_col_index_mapping: col_names: {:?}", col_names);

    let optional = |name: &Option<String>| -> Option<usize> {
        let name = name.as_ref()?;
        let idx = col_names.get(name.trim()).cloned();
        if idx.is_none() {
            warn!("{}: no column {:?}, ignoring it", path, name);
        }
        idx
    };

    let mut choices: Vec<usize> = Vec::new();
    for cname in cfs.choice_columns.iter() {
        let idx = col_names
            .get(cname.trim())
            .context(MissingColumnSnafu {
                path,
                column: cname.clone(),
            })?;
        choices.push(*idx);
    }

    Ok(ColumnMapping {
        id: optional(&cfs.id_column),
        precinct: optional(&cfs.precinct_column),
        ballot_style: optional(&cfs.ballot_style_column),
        choices,
    })
}

/// A ballot, as parsed by the readers
/// This is before interpreting the labels for undervotes, overvotes, etc.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: String,
    pub precinct: Option<String>,
    pub ballot_style: Option<String>,
    pub choices: Vec<String>,
}

/// Extracts a ballot from the cells of a row. Missing cells are empty.
pub fn parse_row(mapping: &ColumnMapping, cells: &[String], default_id: String) -> ParsedBallot {
    let get = |idx: usize| cells.get(idx).map(|s| s.trim().to_string()).unwrap_or_default();
    let non_empty = |idx: Option<usize>| idx.map(get).filter(|s| !s.is_empty());
    ParsedBallot {
        id: non_empty(mapping.id).unwrap_or(default_id),
        precinct: non_empty(mapping.precinct),
        ballot_style: non_empty(mapping.ballot_style),
        choices: mapping.choices.iter().map(|idx| get(*idx)).collect(),
    }
}

pub fn read_choice(s: &str, cfs: &FileSource) -> BallotChoice {
    match s.trim() {
        "" => BallotChoice::Blank,
        c if c == cfs.overvote_label => BallotChoice::Overvote,
        c if c == cfs.undervote_label => BallotChoice::Undervote,
        c => BallotChoice::Candidate(clean_candidate_name(c)),
    }
}

pub fn validate_ballots(parsed_ballots: &[ParsedBallot], cfs: &FileSource) -> Vec<RawBallot> {
    parsed_ballots
        .iter()
        .map(|pb| {
            let choices: Vec<BallotChoice> = pb.choices.iter().map(|s| read_choice(s, cfs)).collect();
            debug!("Choices for ballot {:?}: {:?}", pb.id, choices);
            RawBallot {
                id: pb.id.clone(),
                choices,
                metadata: BallotMetadata {
                    precinct: pb.precinct.clone(),
                    ballot_style: pb.ballot_style.clone(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<Option<String>> {
        names.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn candidate_names_are_cleaned() {
        assert_eq!(clean_candidate_name(" Golden, Jared F. (13380) "), "Golden, Jared F.");
        assert_eq!(clean_candidate_name("Poliquin,  Bruce L."), "Poliquin, Bruce L.");
        assert_eq!(clean_candidate_name("Write-in (Other)"), "Write-in (Other)");
        assert_eq!(clean_candidate_name("Bond, Tiffany L.()"), "Bond, Tiffany L.()");
    }

    #[test]
    fn default_ids_follow_the_file() {
        let f = make_default_id("/data/cvr1.csv");
        assert_eq!(f(12), "cvr1.csv-00000012");
    }

    #[test]
    fn columns_are_found_by_name() {
        let cfs = FileSource {
            choice_columns: vec!["c1".to_string(), "c2".to_string()],
            ..FileSource::with_defaults("f.csv")
        };
        let m = get_col_index_mapping(
            "f.csv",
            &cfs,
            &header(&["Cast Vote Record", "c2", "Precinct", "c1"]),
        )
        .unwrap();
        assert_eq!(
            m,
            ColumnMapping {
                id: Some(0),
                precinct: Some(2),
                ballot_style: None,
                choices: vec![3, 1],
            }
        );
    }

    #[test]
    fn missing_choice_column_is_an_error() {
        let cfs = FileSource::with_defaults("f.csv");
        let res = get_col_index_mapping("f.csv", &cfs, &header(&["Cast Vote Record"]));
        assert!(matches!(res, Err(RcvError::MissingColumn { .. })));
    }

    #[test]
    fn rows_are_interpreted_with_the_labels() {
        let cfs = FileSource {
            overvote_label: "OV".to_string(),
            ..FileSource::with_defaults("f.csv")
        };
        let mapping = ColumnMapping {
            id: Some(0),
            precinct: None,
            ballot_style: Some(1),
            choices: vec![2, 3, 4, 5],
        };
        let cells: Vec<String> = ["7", "S1", "Golden, Jared F. (13380)", "OV", "undervote", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let pb = parse_row(&mapping, &cells, "default".to_string());
        assert_eq!(pb.id, "7");
        let raw = validate_ballots(&[pb], &cfs);
        assert_eq!(
            raw[0].choices,
            vec![
                BallotChoice::Candidate("Golden, Jared F.".to_string()),
                BallotChoice::Overvote,
                BallotChoice::Undervote,
                BallotChoice::Blank,
            ]
        );
        assert_eq!(raw[0].metadata.ballot_style, Some("S1".to_string()));
        assert_eq!(raw[0].metadata.precinct, None);
    }

    #[test]
    fn short_rows_have_blank_choices() {
        let mapping = ColumnMapping {
            id: Some(0),
            precinct: None,
            ballot_style: None,
            choices: vec![1, 2],
        };
        let pb = parse_row(&mapping, &["".to_string(), "A".to_string()], "f-1".to_string());
        assert_eq!(pb.id, "f-1");
        assert_eq!(pb.choices, vec!["A".to_string(), "".to_string()]);
    }
}
