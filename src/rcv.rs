use log::{debug, info, warn};

use rcv_statute::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rcv::config_reader::*;
use crate::rcv::io_common::validate_ballots;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RcvError {
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} has no content"))]
    EmptyExcel { path: String },
    #[snafu(display("Excel file {path} has no worksheet {worksheet}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("{path}, line {lineno}: could not understand cell {content}"))]
    ExcelWrongCellType {
        path: String,
        lineno: u64,
        content: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("{path}, line {lineno}: could not parse the line"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: u64,
    },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("File {path} has no column {column:?}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Unknown provider {provider:?} for file {path}"))]
    UnknownProvider { provider: String, path: String },
    #[snafu(display("File {path} could not be loaded"))]
    FileNotLoaded {
        path: String,
        #[snafu(source(from(RcvError, Box::new)))]
        source: Box<RcvError>,
    },
    #[snafu(display("No ballot could be loaded"))]
    NoBallots {},
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error with the JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Random seed {seed:?} is not a positive integer"))]
    InvalidSeed { seed: String },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Tabulation failed"))]
    Voting { source: VotingErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
}

pub type RcvResult<T> = Result<T, RcvError>;

fn percent(share: f64) -> String {
    format!("{:.2}%", share * 100.0)
}

fn result_stats_to_json(rs: &VotingResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        let mut shares: JSMap<String, JSValue> = JSMap::new();
        for ct in round_stat.tally.iter() {
            tally.insert(ct.name.clone(), json!(ct.votes.to_string()));
            shares.insert(ct.name.clone(), json!(percent(ct.share)));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        match &round_stat.decision {
            RoundDecision::Elected(name) => {
                tally_results.push(json!({
                    "elected": name,
                    "transfers": {}
                }));
            }
            RoundDecision::Eliminated(elim_stats) => {
                let mut transfers: JSMap<String, JSValue> = JSMap::new();
                for (name, count) in elim_stats.transfers.iter() {
                    transfers.insert(name.clone(), json!(count.to_string()));
                }
                if elim_stats.exhausted > 0 {
                    transfers.insert(
                        "exhausted".to_string(),
                        json!(elim_stats.exhausted.to_string()),
                    );
                }
                tally_results.push(json!({
                    "eliminated": elim_stats.name,
                    "transfers": transfers
                }));
            }
        }

        let js = json!({
            "round": round_stat.round,
            "tally": tally,
            "shares": shares,
            "continuing": round_stat.continuing.to_string(),
            "exhausted": round_stat.exhausted.to_string(),
            "threshold": round_stat.threshold.to_string(),
            "tallyResults": tally_results
        });
        l.push(js);
    }
    l
}

fn tiebreaks_to_json(rs: &VotingResult) -> Vec<JSValue> {
    rs.tiebreaks
        .iter()
        .map(|tb| {
            let kind = match tb.kind {
                TieBreakKind::Election => "election",
                TieBreakKind::Elimination => "elimination",
            };
            json!({
                "round": tb.round,
                "kind": kind,
                "candidates": tb.participants,
                "selected": tb.selected
            })
        })
        .collect()
}

fn build_summary_js(config: &RcvConfig, rv: &VotingResult, seed: u64) -> JSValue {
    let threshold = rv.round_stats.last().map(|rs| rs.threshold.to_string());
    let c = OutputConfig {
        contest: config
            .output_settings
            .contest_name
            .clone()
            .unwrap_or_default(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        threshold,
    };
    json!({
        "config": c,
        "winner": rv.winner,
        "rounds": rv.rounds,
        "randomSeed": seed.to_string(),
        "ballots": rv.ballot_count.to_string(),
        "initiallyExhausted": rv.initially_exhausted.to_string(),
        "ballotDigest": rv.ballot_digest,
        "tieBreaks": tiebreaks_to_json(rv),
        "results": result_stats_to_json(rv)
    })
}

/// Logs the outcome of each round and prints the winner.
fn print_report(rv: &VotingResult) {
    info!(
        "{} ballots, {} without any valid ranking",
        rv.ballot_count, rv.initially_exhausted
    );
    for rs in rv.round_stats.iter() {
        info!(
            "Round {} (winning threshold: {}, continuing: {}, exhausted: {})",
            rs.round, rs.threshold, rs.continuing, rs.exhausted
        );
        for ct in rs.tally.iter() {
            let status = match &rs.decision {
                RoundDecision::Elected(name) if *name == ct.name => " -> elected".to_string(),
                RoundDecision::Eliminated(es) if es.name == ct.name => {
                    let mut s = " -> eliminated:".to_string();
                    for (to, count) in es.transfers.iter() {
                        s.push_str(&format!("{} to {}, ", count, to));
                    }
                    s.push_str(&format!("{} exhausted", es.exhausted));
                    s
                }
                _ => "".to_string(),
            };
            info!(
                "{:>10} {:>8} {}{}",
                ct.votes,
                percent(ct.share),
                ct.name,
                status
            );
        }
        if let Some(tb) = &rs.tiebreak {
            warn!(
                "Round {}: random draw between {:?}: {} selected",
                tb.round, tb.participants, tb.selected
            );
        }
    }
    println!("Winner: {} ({} rounds)", rv.winner, rv.rounds);
}

fn read_file_source(root_path: &Path, cfs: &FileSource) -> RcvResult<Vec<RawBallot>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    let parsed_ballots = match cfs.provider()? {
        Provider::Xlsx => io_excel::read_excel_file(&p2, cfs),
        Provider::Csv => io_csv::read_csv_ranking(&p2, cfs),
    }?;
    Ok(validate_ballots(&parsed_ballots, cfs))
}

/// Reads all the sources. A file that cannot be read is skipped, unless `strict` is set.
fn read_all_sources(root_path: &Path, config: &RcvConfig, strict: bool) -> RcvResult<Vec<RawBallot>> {
    let mut data: Vec<RawBallot> = Vec::new();
    for cfs in config.cvr_file_sources.iter() {
        match read_file_source(root_path, cfs) {
            Ok(mut file_data) => {
                data.append(&mut file_data);
            }
            Err(e) if !strict => {
                warn!("File {} not loaded, skipping it: {}", cfs.file_path, e);
            }
            Err(e) => {
                return Err(e).context(FileNotLoadedSnafu {
                    path: cfs.file_path.clone(),
                });
            }
        }
    }
    ensure!(!data.is_empty(), NoBallotsSnafu {});
    Ok(data)
}

/// Writes the corrected ballots, with their precinct and ballot style.
///
/// The corrections use the declared candidates, so that the file holds the
/// rankings that are counted.
fn write_normalized_ballots(
    path: &str,
    ballots: &[RawBallot],
    candidates: Option<&[String]>,
) -> RcvResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    let mut header: Vec<String> = vec![
        "id".to_string(),
        "precinct".to_string(),
        "ballot_style".to_string(),
    ];
    header.extend((1..=MAX_RANKINGS).map(|idx| format!("choice_{}", idx)));
    wtr.write_record(&header).context(CsvWriteSnafu { path })?;
    for b in ballots.iter() {
        let nb = normalize_with_candidates(b, candidates);
        let mut record: Vec<String> = vec![
            nb.id,
            nb.metadata.precinct.unwrap_or_default(),
            nb.metadata.ballot_style.unwrap_or_default(),
        ];
        let mut ranking = nb.ranking;
        ranking.resize(MAX_RANKINGS, "".to_string());
        record.extend(ranking);
        wtr.write_record(&record).context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingOutputSnafu { path })?;
    Ok(())
}

fn write_summary(out: &str, pretty_js_stats: &str) -> RcvResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js_stats);
        Ok(())
    } else {
        info!("Writing summary to {}", out);
        fs::write(out, pretty_js_stats).context(WritingOutputSnafu { path: out })
    }
}

fn check_reference(summary_p: &str, pretty_js_stats: &str) -> RcvResult<()> {
    let summary_ref = read_summary(summary_p)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("The summary matches the reference {}", summary_p);
    Ok(())
}

pub fn run_election(args: &Args) -> RcvResult<VotingResult> {
    let config = match &args.config {
        Some(config_path) => read_config(config_path)?,
        None => RcvConfig::maine_2018_cd2(),
    };
    info!("config: {:?}", config);

    // Relative paths are resolved from the data directory, then from the
    // directory of the configuration file.
    let root_p: PathBuf = match (&args.data_dir, &args.config) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(config_path)) => Path::new(config_path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
        (None, None) => PathBuf::from("."),
    };

    let seed: u64 = match args.seed {
        Some(s) => s,
        None => config.rules.random_seed()?.unwrap_or(0),
    };
    info!("Random seed for the tie breaks: {}", seed);

    let data = read_all_sources(&root_p, &config, args.strict)?;
    info!("Loaded {} ballots", data.len());

    if let Some(normalized_p) = &args.normalized {
        info!("Writing corrected ballots to {}", normalized_p);
        write_normalized_ballots(normalized_p, &data, config.candidates.as_deref())?;
    }

    let result = ElectionRunner::new(seed)
        .run(&data, config.candidates.as_deref())
        .context(VotingSnafu {})?;

    print_report(&result);

    let result_js = build_summary_js(&config, &result, seed);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    if let Some(out) = &args.out {
        write_summary(out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        check_reference(summary_p, &pretty_js_stats)?;
    }

    Ok(result)
}
