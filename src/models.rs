//! Data models for the study analysis.
//!
//! Treatments, grouping and aggregation choices are closed enumerations.
//! Free-form names coming from the CLI or the config file are parsed into
//! them once, at the boundary, and rejected there if unknown.

use crate::analysis::{Distribution, TreatmentFilter};
use crate::catalog::{Level, Variable};
use crate::error::{EdaError, EdaResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const PARTICIPANT_ID: &str = "participant_id";
pub const CITATION_DESIGN: &str = "citation_design";
pub const CONTEXT_STAKENESS: &str = "context_stakeness";
pub const SOURCE_RELIABILITY: &str = "source_reliability";

/// An experimental manipulation with a fixed set of levels.
///
/// Each level has a human-readable label (what an analyst selects) and the
/// code stored in the data files.
pub trait Treatment: Copy + Ord + fmt::Debug + 'static {
    /// Column holding this treatment's codes.
    const COLUMN: &'static str;
    /// Human-readable treatment name.
    const NAME: &'static str;

    fn all() -> &'static [Self];
    fn label(&self) -> &'static str;
    fn code(&self) -> &'static str;

    /// Look a level up by its human-readable label.
    fn from_label(label: &str) -> EdaResult<Self> {
        let wanted = label.trim();
        Self::all()
            .iter()
            .copied()
            .find(|level| level.label() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::all().iter().map(|l| l.label()).collect();
                EdaError::configuration(format!(
                    "unknown {} level '{}' (expected one of: {})",
                    Self::NAME,
                    label,
                    known.join(", ")
                ))
            })
    }
}

/// How AI-generated citations are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CitationDesign {
    Icon,
    Number,
    Domain,
}

impl Treatment for CitationDesign {
    const COLUMN: &'static str = CITATION_DESIGN;
    const NAME: &'static str = "Citation Design";

    fn all() -> &'static [Self] {
        &[
            CitationDesign::Icon,
            CitationDesign::Number,
            CitationDesign::Domain,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            CitationDesign::Icon => "Icon",
            CitationDesign::Number => "Number",
            CitationDesign::Domain => "Domain",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CitationDesign::Icon => "icon",
            CitationDesign::Number => "number",
            CitationDesign::Domain => "domain",
        }
    }
}

/// Whether the search context was framed as low or high stakes.
///
/// Varies within a participant across tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContextStakeness {
    Low,
    High,
}

impl Treatment for ContextStakeness {
    const COLUMN: &'static str = CONTEXT_STAKENESS;
    const NAME: &'static str = "Context Stakeness";

    fn all() -> &'static [Self] {
        &[ContextStakeness::Low, ContextStakeness::High]
    }

    fn label(&self) -> &'static str {
        match self {
            ContextStakeness::Low => "Low",
            ContextStakeness::High => "High",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ContextStakeness::Low => "low",
            ContextStakeness::High => "high",
        }
    }
}

/// Perceived reliability of the cited source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceReliability {
    Low,
    Original,
    High,
}

impl Treatment for SourceReliability {
    const COLUMN: &'static str = SOURCE_RELIABILITY;
    const NAME: &'static str = "Source Reliability";

    fn all() -> &'static [Self] {
        &[
            SourceReliability::Low,
            SourceReliability::Original,
            SourceReliability::High,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            SourceReliability::Low => "Low",
            SourceReliability::Original => "Original",
            SourceReliability::High => "High",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            SourceReliability::Low => "low_reliability",
            SourceReliability::Original => "original",
            SourceReliability::High => "high_reliability",
        }
    }
}

/// Row grouping applied before distributions are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// Keep one row per (participant, task).
    #[default]
    None,
    /// Collapse to one row per participant.
    Participant,
}

impl FromStr for Grouping {
    type Err = EdaError;

    fn from_str(s: &str) -> EdaResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Grouping::None),
            "user" | "participant" | "participant_id" => Ok(Grouping::Participant),
            other => Err(EdaError::configuration(format!(
                "unknown grouping '{}' (expected none or user)",
                other
            ))),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::None => write!(f, "None"),
            Grouping::Participant => write!(f, "User"),
        }
    }
}

/// Statistic used to collapse a participant's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggMethod {
    #[default]
    Mean,
    Median,
    Max,
    Min,
}

impl FromStr for AggMethod {
    type Err = EdaError;

    fn from_str(s: &str) -> EdaResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(AggMethod::Mean),
            "median" => Ok(AggMethod::Median),
            "max" => Ok(AggMethod::Max),
            "min" => Ok(AggMethod::Min),
            other => Err(EdaError::configuration(format!(
                "unknown aggregation method '{}' (expected mean, median, max or min)",
                other
            ))),
        }
    }
}

impl fmt::Display for AggMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggMethod::Mean => write!(f, "mean"),
            AggMethod::Median => write!(f, "median"),
            AggMethod::Max => write!(f, "max"),
            AggMethod::Min => write!(f, "min"),
        }
    }
}

/// Treatment used to split each distribution into series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitBy {
    #[default]
    None,
    CitationDesign,
    ContextStakeness,
    SourceReliability,
}

impl SplitBy {
    /// Column to split on, if any.
    pub fn column(&self) -> Option<&'static str> {
        match self {
            SplitBy::None => None,
            SplitBy::CitationDesign => Some(CITATION_DESIGN),
            SplitBy::ContextStakeness => Some(CONTEXT_STAKENESS),
            SplitBy::SourceReliability => Some(SOURCE_RELIABILITY),
        }
    }

    /// Split to use for user-level tables. Context stakeness varies within a
    /// participant, so it has no per-user value and is ignored there.
    pub fn for_user_level(&self) -> SplitBy {
        match self {
            SplitBy::ContextStakeness => SplitBy::None,
            other => *other,
        }
    }
}

impl FromStr for SplitBy {
    type Err = EdaError;

    fn from_str(s: &str) -> EdaResult<Self> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "none" | "" => Ok(SplitBy::None),
            CITATION_DESIGN => Ok(SplitBy::CitationDesign),
            CONTEXT_STAKENESS => Ok(SplitBy::ContextStakeness),
            SOURCE_RELIABILITY => Ok(SplitBy::SourceReliability),
            _ => Err(EdaError::configuration(format!(
                "unknown split '{}' (expected None, Citation Design, Context Stakeness or Source Reliability)",
                s
            ))),
        }
    }
}

impl fmt::Display for SplitBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitBy::None => write!(f, "None"),
            SplitBy::CitationDesign => write!(f, "{}", CitationDesign::NAME),
            SplitBy::ContextStakeness => write!(f, "{}", ContextStakeness::NAME),
            SplitBy::SourceReliability => write!(f, "{}", SourceReliability::NAME),
        }
    }
}

/// Everything one analysis run needs, resolved and validated.
///
/// Built once from the configuration and passed explicitly into the
/// filter, aggregator and report stages.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub filter: TreatmentFilter,
    pub grouping: Grouping,
    pub method: AggMethod,
    pub split_by: SplitBy,
    pub bins: usize,
    pub task_variables: Vec<Variable>,
    pub survey_variables: Vec<Variable>,
    pub demographic_variables: Vec<Variable>,
}

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Task-level input file.
    pub task_data: String,
    /// User-level input file.
    pub user_data: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Selected citation design labels.
    pub citation_design: Vec<String>,
    /// Selected context stakeness labels.
    pub context_stakeness: Vec<String>,
    /// Selected source reliability labels.
    pub source_reliability: Vec<String>,
    pub grouping: Grouping,
    /// Aggregation method; only meaningful when grouped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<AggMethod>,
    pub split_by: SplitBy,
    /// Task rows before filtering.
    pub task_rows_loaded: usize,
    /// Task rows after the treatment filter.
    pub task_rows_filtered: usize,
    /// Rows behind the task-level distributions.
    pub task_rows_analyzed: usize,
    /// Rows in the user-level table.
    pub participants: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// Distributions for one level of variables.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub level: Level,
    pub distributions: Vec<Distribution>,
}

/// The complete distribution report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub sections: Vec<ReportSection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treatment_codes() {
        assert_eq!(CitationDesign::from_label("Icon").unwrap().code(), "icon");
        assert_eq!(
            SourceReliability::from_label("Low").unwrap().code(),
            "low_reliability"
        );
        assert_eq!(
            SourceReliability::from_label("High").unwrap().code(),
            "high_reliability"
        );
        assert_eq!(ContextStakeness::from_label("High").unwrap().code(), "high");
    }

    #[test]
    fn test_unknown_treatment_label() {
        let err = CitationDesign::from_label("NotALevel").unwrap_err();
        assert!(matches!(err, EdaError::Configuration(_)));
        assert!(err.to_string().contains("Citation Design"));

        // labels, not stored codes
        assert!(CitationDesign::from_label("icon").is_err());
    }

    #[test]
    fn test_parse_grouping() {
        assert_eq!("None".parse::<Grouping>().unwrap(), Grouping::None);
        assert_eq!("User".parse::<Grouping>().unwrap(), Grouping::Participant);
        assert!(matches!(
            "task".parse::<Grouping>(),
            Err(EdaError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_agg_method() {
        assert_eq!("median".parse::<AggMethod>().unwrap(), AggMethod::Median);
        assert_eq!("MAX".parse::<AggMethod>().unwrap(), AggMethod::Max);
        assert!(matches!(
            "first".parse::<AggMethod>(),
            Err(EdaError::Configuration(_))
        ));
    }

    #[test]
    fn test_parse_split_by() {
        assert_eq!(
            "Citation Design".parse::<SplitBy>().unwrap(),
            SplitBy::CitationDesign
        );
        assert_eq!(
            "source_reliability".parse::<SplitBy>().unwrap(),
            SplitBy::SourceReliability
        );
        assert!("colour".parse::<SplitBy>().is_err());
    }

    #[test]
    fn test_user_level_split_ignores_context() {
        assert_eq!(SplitBy::ContextStakeness.for_user_level(), SplitBy::None);
        assert_eq!(
            SplitBy::CitationDesign.for_user_level(),
            SplitBy::CitationDesign
        );
    }
}
