//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap. Every analysis
//! option is optional here so that unset flags fall through to the
//! configuration file.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// citeview - distribution reports for the AI-overview citation study
///
/// Filters task observations by treatment, optionally collapses them to one
/// row per participant, and reports the distribution of task-level, survey
/// and demographic variables.
///
/// Examples:
///   citeview --task-data 0_final_data.csv --user-data 0_final_user_data.csv
///   citeview --citation-design Icon,Domain --group-by user --method median
///   citeview --split-by "Source Reliability" --format json -o report.json
///   citeview --task-vars "Task Duration;Number of scrolls"
///   citeview --dry-run
///   citeview --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Task-level CSV (one row per participant and task)
    #[arg(long, value_name = "FILE", env = "CITEVIEW_TASK_DATA")]
    pub task_data: Option<PathBuf>,

    /// User-level CSV (one row per participant)
    #[arg(long, value_name = "FILE", env = "CITEVIEW_USER_DATA")]
    pub user_data: Option<PathBuf>,

    /// Citation design levels to include (comma-separated)
    ///
    /// Values: Icon, Number, Domain. Pass an empty string to select none.
    #[arg(long, value_name = "LEVELS", value_delimiter = ',')]
    pub citation_design: Option<Vec<String>>,

    /// Context stakeness levels to include (comma-separated)
    ///
    /// Values: Low, High
    #[arg(long, value_name = "LEVELS", value_delimiter = ',')]
    pub context_stakeness: Option<Vec<String>>,

    /// Source reliability levels to include (comma-separated)
    ///
    /// Values: Low, Original, High
    #[arg(long, value_name = "LEVELS", value_delimiter = ',')]
    pub source_reliability: Option<Vec<String>>,

    /// Group task observations before summarizing (none, user)
    #[arg(long, value_name = "GROUPING")]
    pub group_by: Option<String>,

    /// Aggregation method when grouping (mean, median, max, min)
    #[arg(long, value_name = "METHOD")]
    pub method: Option<String>,

    /// Treatment used to split every distribution
    ///
    /// Values: None, "Citation Design", "Context Stakeness", "Source Reliability"
    #[arg(long, value_name = "TREATMENT")]
    pub split_by: Option<String>,

    /// Task-level variables to report (semicolon-separated labels or columns)
    #[arg(long, value_name = "VARS", value_delimiter = ';')]
    pub task_vars: Option<Vec<String>>,

    /// Survey variables to report (semicolon-separated labels or columns)
    #[arg(long, value_name = "VARS", value_delimiter = ';')]
    pub survey_vars: Option<Vec<String>>,

    /// Demographic variables to report (semicolon-separated labels or columns)
    #[arg(long, value_name = "VARS", value_delimiter = ';')]
    pub dem_vars: Option<Vec<String>>,

    /// Number of histogram bins for numeric variables
    #[arg(long, value_name = "COUNT")]
    pub bins: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .citeview.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load both tables and print their columns without a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .citeview.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.bins == Some(0) {
            return Err("Bins must be at least 1".to_string());
        }

        for path in [&self.task_data, &self.user_data].into_iter().flatten() {
            if path.is_dir() {
                return Err(format!("Expected a CSV file, got a directory: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "citeview",
            "--citation-design",
            "Icon,Domain",
            "--group-by",
            "user",
            "--method",
            "median",
            "--task-vars",
            "Task Duration;Number of clicks",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(
            args.citation_design,
            Some(vec!["Icon".to_string(), "Domain".to_string()])
        );
        assert_eq!(args.group_by.as_deref(), Some("user"));
        assert_eq!(args.method.as_deref(), Some("median"));
        assert_eq!(
            args.task_vars,
            Some(vec![
                "Task Duration".to_string(),
                "Number of clicks".to_string()
            ])
        );
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.context_stakeness.is_none());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = Args {
            verbose: true,
            quiet: true,
            ..Args::default()
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_bins() {
        let args = Args {
            bins: Some(0),
            ..Args::default()
        };
        assert!(args.validate().is_err());
        assert!(Args::default().validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::default();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
