use clap::Parser;

/// Tabulates the ranked choice election of the Maine 2nd congressional district.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (directory, optional) The directory containing the cast vote records. Relative file paths of the
    /// configuration are resolved from it. Defaults to the directory of the configuration, or to the
    /// current directory.
    #[clap(value_parser)]
    pub data_dir: Option<String>,

    /// (file path, optional) The JSON file describing the contest and the cast vote record files.
    /// If not provided, the files of the November 2018 election are read with their usual layout.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (integer, optional) The seed of the random draws that break ties. Overrides the `randomSeed`
    /// rule of the configuration. Defaults to 0.
    #[clap(short, long, value_parser)]
    pub seed: Option<u64>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the outcome of an election in JSON format. If provided,
    /// the tabulated output is checked against the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path) If specified, the corrected ballots are written to this CSV file.
    #[clap(short, long, value_parser)]
    pub normalized: Option<String>,

    /// If passed as an argument, a file that cannot be read stops the tabulation instead of being skipped.
    #[clap(long, takes_value = false)]
    pub strict: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
