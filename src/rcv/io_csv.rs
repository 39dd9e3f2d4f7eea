// Primitives for reading CSV files.

use crate::rcv::{
    io_common::{get_col_index_mapping, make_default_id, parse_row, ParsedBallot},
    *,
};

pub fn read_csv_ranking(path: &str, cfs: &FileSource) -> RcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header: Vec<Option<String>> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu { path, lineno: 1u64 })?
            .iter()
            .map(|s| Some(s.to_string()))
            .collect(),
        None => Vec::new(),
    };
    debug!("read_csv_ranking: header: {:?}", header);
    let mapping = get_col_index_mapping(path, cfs, &header)?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path,
            lineno: lineno as u64,
        })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        let pb = parse_row(&mapping, &cells, default_id(lineno));
        debug!("read_csv_ranking: lineno: {:?} ballot: {:?}", lineno, pb);
        res.push(pb);
    }
    info!("read_csv_ranking: {}: {} ballots", path, res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcv::tests::write_file;

    #[test]
    fn reads_rows_by_column_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "cvr.csv",
            "Precinct,Cast Vote Record,Ballot Style,c1,c2,c3\n\
             P1,10,S1,A,B,\n\
             P2,11,S1,B,,\n\
             ,,S2,overvote\n",
        );
        let cfs = FileSource {
            choice_columns: vec!["c1".to_string(), "c2".to_string(), "c3".to_string()],
            ..FileSource::with_defaults("cvr.csv")
        };
        let ballots = read_csv_ranking(&path, &cfs).unwrap();
        assert_eq!(ballots.len(), 3);
        assert_eq!(ballots[0].id, "10");
        assert_eq!(ballots[0].precinct, Some("P1".to_string()));
        assert_eq!(ballots[0].choices, vec!["A", "B", ""]);
        // No id in the file: the name of the file and the line are used.
        assert_eq!(ballots[2].id, "cvr.csv-00000004");
        assert_eq!(ballots[2].precinct, None);
        assert_eq!(ballots[2].choices, vec!["overvote", "", ""]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let cfs = FileSource::with_defaults("missing.csv");
        let res = read_csv_ranking("/nonexistent/missing.csv", &cfs);
        assert!(matches!(res, Err(RcvError::CsvOpen { .. })));
    }
}
