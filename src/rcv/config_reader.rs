use crate::rcv::*;

use serde::{Deserialize, Serialize};

/// The files published for the 2018 election of the 2nd congressional district.
pub const MAINE_2018_CD2_FILES: [&str; 8] = [
    "NOV18CVRExportFINAL1.xlsx",
    "NOV18CVRExportFINAL2.xlsx",
    "NOV18CVRExportFINAL3.xlsx",
    "UOCAVA-FINALRepCD2.xlsx",
    "UOCAVA-AUX-CVRRepCD2.xlsx",
    "UOCAVA2CVRRepCD2.xlsx",
    "AUXCVRProofedCVR95RepCD2.xlsx",
    "RepCD2-8final.xlsx",
];

pub const MAINE_2018_CD2_CHOICES: [&str; 5] = [
    "Rep. to Congress 1st Choice District 2",
    "Rep. to Congress 2nd Choice District 2",
    "Rep. to Congress 3rd Choice District 2",
    "Rep. to Congress 4th Choice District 2",
    "Rep. to Congress 5th Choice District 2",
];

fn default_id_column() -> Option<String> {
    Some("Cast Vote Record".to_string())
}

fn default_precinct_column() -> Option<String> {
    Some("Precinct".to_string())
}

fn default_ballot_style_column() -> Option<String> {
    Some("Ballot Style".to_string())
}

fn default_choice_columns() -> Vec<String> {
    MAINE_2018_CD2_CHOICES.iter().map(|s| s.to_string()).collect()
}

fn default_overvote_label() -> String {
    OVERVOTE_LABEL.to_string()
}

fn default_undervote_label() -> String {
    UNDERVOTE_LABEL.to_string()
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName", default)]
    pub contest_name: Option<String>,
    #[serde(rename = "contestDate", default)]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction", default)]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice", default)]
    pub contest_office: Option<String>,
}

/// The header of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub threshold: Option<String>,
}

/// The file formats that can be read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Xlsx,
    Csv,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// `xlsx` or `csv`. Deduced from the extension when missing.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(rename = "excelWorksheetName", default)]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "idColumn", default = "default_id_column")]
    pub id_column: Option<String>,
    #[serde(rename = "precinctColumn", default = "default_precinct_column")]
    pub precinct_column: Option<String>,
    #[serde(rename = "ballotStyleColumn", default = "default_ballot_style_column")]
    pub ballot_style_column: Option<String>,
    /// The columns of the choices, from the first to the last.
    #[serde(rename = "choiceColumns", default = "default_choice_columns")]
    pub choice_columns: Vec<String>,
    #[serde(rename = "overvoteLabel", default = "default_overvote_label")]
    pub overvote_label: String,
    #[serde(rename = "undervoteLabel", default = "default_undervote_label")]
    pub undervote_label: String,
}

impl FileSource {
    /// A source with the layout of the Maine exports.
    pub fn with_defaults(file_path: &str) -> FileSource {
        FileSource {
            file_path: file_path.to_string(),
            provider: None,
            excel_worksheet_name: None,
            id_column: default_id_column(),
            precinct_column: default_precinct_column(),
            ballot_style_column: default_ballot_style_column(),
            choice_columns: default_choice_columns(),
            overvote_label: default_overvote_label(),
            undervote_label: default_undervote_label(),
        }
    }

    pub fn provider(&self) -> RcvResult<Provider> {
        let provider = match &self.provider {
            Some(p) => p.to_lowercase(),
            None => Path::new(&self.file_path)
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
        };
        match provider.as_str() {
            "xlsx" | "excel" => Ok(Provider::Xlsx),
            "csv" => Ok(Provider::Csv),
            _ => UnknownProviderSnafu {
                provider,
                path: self.file_path.clone(),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RcvRules {
    #[serde(rename = "randomSeed", default)]
    pub random_seed: Option<String>,
}

impl RcvRules {
    pub fn random_seed(&self) -> RcvResult<Option<u64>> {
        match &self.random_seed {
            None => Ok(None),
            Some(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .map(Some)
                .context(InvalidSeedSnafu { seed: s.clone() }),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources", default)]
    pub cvr_file_sources: Vec<FileSource>,
    /// The declared candidates. Inferred from the ballots when missing.
    #[serde(default)]
    pub candidates: Option<Vec<String>>,
    #[serde(default)]
    pub rules: RcvRules,
}

impl RcvConfig {
    /// The configuration used when no file is provided.
    pub fn maine_2018_cd2() -> RcvConfig {
        RcvConfig {
            output_settings: OutputSettings {
                contest_name: Some("Rep. to Congress District 2".to_string()),
                contest_date: Some("2018-11-06".to_string()),
                contest_jurisdiction: Some("Maine".to_string()),
                contest_office: Some("Representative to Congress".to_string()),
            },
            cvr_file_sources: MAINE_2018_CD2_FILES
                .iter()
                .map(|f| FileSource::with_defaults(f))
                .collect(),
            candidates: None,
            rules: RcvRules::default(),
        }
    }
}

pub fn read_config(path: &str) -> RcvResult<RcvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RcvConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> RcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
