//! Configuration file handling.
//!
//! This module handles loading `.citeview.toml`, merging it with CLI
//! arguments, and resolving the result into validated
//! [`AnalysisSettings`].

use crate::analysis::TreatmentFilter;
use crate::catalog::{self, Level};
use crate::cli::OutputFormat;
use crate::error::EdaResult;
use crate::models::{
    AggMethod, AnalysisSettings, CitationDesign, ContextStakeness, Grouping, SourceReliability,
    SplitBy, Treatment,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".citeview.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input files.
    #[serde(default)]
    pub data: DataConfig,

    /// Treatment levels to include.
    #[serde(default)]
    pub filters: FiltersConfig,

    /// Participant grouping.
    #[serde(default)]
    pub grouping: GroupingConfig,

    /// Variables and plot options.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Task-level CSV path.
    #[serde(default = "default_task_data")]
    pub task_data: String,

    /// User-level CSV path.
    #[serde(default = "default_user_data")]
    pub user_data: String,

    /// Task-level duration column, stored in milliseconds.
    #[serde(default = "default_duration_column")]
    pub duration_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            task_data: default_task_data(),
            user_data: default_user_data(),
            duration_column: default_duration_column(),
        }
    }
}

fn default_task_data() -> String {
    "0_final_data.csv".to_string()
}

fn default_user_data() -> String {
    "0_final_user_data.csv".to_string()
}

fn default_duration_column() -> String {
    "task_duration".to_string()
}

/// Treatment filter settings, as human-readable level labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default = "default_citation_design")]
    pub citation_design: Vec<String>,

    #[serde(default = "default_context_stakeness")]
    pub context_stakeness: Vec<String>,

    #[serde(default = "default_source_reliability")]
    pub source_reliability: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            citation_design: default_citation_design(),
            context_stakeness: default_context_stakeness(),
            source_reliability: default_source_reliability(),
        }
    }
}

fn all_labels<T: Treatment>() -> Vec<String> {
    T::all().iter().map(|l| l.label().to_string()).collect()
}

fn default_citation_design() -> Vec<String> {
    all_labels::<CitationDesign>()
}

fn default_context_stakeness() -> Vec<String> {
    all_labels::<ContextStakeness>()
}

fn default_source_reliability() -> Vec<String> {
    all_labels::<SourceReliability>()
}

/// Grouping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// `none` or `user`.
    #[serde(default = "default_group_by")]
    pub group_by: String,

    /// `mean`, `median`, `max` or `min`. Ignored without grouping.
    #[serde(default = "default_method")]
    pub method: String,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            group_by: default_group_by(),
            method: default_method(),
        }
    }
}

fn default_group_by() -> String {
    "none".to_string()
}

fn default_method() -> String {
    "mean".to_string()
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Treatment to split distributions by, or `None`.
    #[serde(default = "default_split_by")]
    pub split_by: String,

    /// Histogram bins for numeric variables.
    #[serde(default = "default_bins")]
    pub bins: usize,

    #[serde(default = "default_task_variables")]
    pub task_variables: Vec<String>,

    #[serde(default = "default_survey_variables")]
    pub survey_variables: Vec<String>,

    #[serde(default = "default_demographic_variables")]
    pub demographic_variables: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            split_by: default_split_by(),
            bins: default_bins(),
            task_variables: default_task_variables(),
            survey_variables: default_survey_variables(),
            demographic_variables: default_demographic_variables(),
        }
    }
}

fn default_split_by() -> String {
    "None".to_string()
}

fn default_bins() -> usize {
    20
}

fn default_task_variables() -> Vec<String> {
    catalog::default_labels(Level::Task)
}

fn default_survey_variables() -> Vec<String> {
    catalog::default_labels(Level::Survey)
}

fn default_demographic_variables() -> Vec<String> {
    catalog::default_labels(Level::Demographic)
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output() -> String {
    "citeview_report.md".to_string()
}

/// Drop blank entries, so an empty CLI value selects nothing.
fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only options given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.task_data {
            self.data.task_data = path.display().to_string();
        }
        if let Some(ref path) = args.user_data {
            self.data.user_data = path.display().to_string();
        }

        if let Some(ref levels) = args.citation_design {
            self.filters.citation_design = non_blank(levels);
        }
        if let Some(ref levels) = args.context_stakeness {
            self.filters.context_stakeness = non_blank(levels);
        }
        if let Some(ref levels) = args.source_reliability {
            self.filters.source_reliability = non_blank(levels);
        }

        if let Some(ref group_by) = args.group_by {
            self.grouping.group_by = group_by.clone();
        }
        if let Some(ref method) = args.method {
            self.grouping.method = method.clone();
        }

        if let Some(ref split_by) = args.split_by {
            self.display.split_by = split_by.clone();
        }
        if let Some(bins) = args.bins {
            self.display.bins = bins;
        }
        if let Some(ref vars) = args.task_vars {
            self.display.task_variables = non_blank(vars);
        }
        if let Some(ref vars) = args.survey_vars {
            self.display.survey_variables = non_blank(vars);
        }
        if let Some(ref vars) = args.dem_vars {
            self.display.demographic_variables = non_blank(vars);
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
    }

    /// Resolve every name in the configuration.
    ///
    /// Unknown treatment levels, groupings, methods, splits or variables
    /// fail with a configuration error.
    pub fn settings(&self) -> EdaResult<AnalysisSettings> {
        Ok(AnalysisSettings {
            filter: TreatmentFilter::from_labels(
                &self.filters.citation_design,
                &self.filters.context_stakeness,
                &self.filters.source_reliability,
            )?,
            grouping: self.grouping.group_by.parse::<Grouping>()?,
            method: self.grouping.method.parse::<AggMethod>()?,
            split_by: self.display.split_by.parse::<SplitBy>()?,
            bins: self.display.bins.max(1),
            task_variables: catalog::resolve(Level::Task, &self.display.task_variables)?,
            survey_variables: catalog::resolve(Level::Survey, &self.display.survey_variables)?,
            demographic_variables: catalog::resolve(
                Level::Demographic,
                &self.display.demographic_variables,
            )?,
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
