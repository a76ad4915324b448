//! Catalog of the study's display variables.
//!
//! Maps the human-readable names an analyst picks to the columns of the
//! task-level and user-level tables.

use crate::error::{EdaError, EdaResult};
use serde::Serialize;

/// Tick labels for the 1-5 workload items.
pub const LIKERT_LABELS: [&str; 5] = ["Very low", "Low", "Moderate", "High", "Very High"];

/// Which part of the study a variable comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// One value per (participant, task).
    Task,
    /// Post-study questionnaire.
    Survey,
    /// Participant demographics.
    Demographic,
}

/// A display variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub label: String,
    pub column: String,
    pub likert: bool,
}

impl Variable {
    fn known(label: &str, column: &str) -> Self {
        Self {
            label: label.to_string(),
            column: column.to_string(),
            likert: LIKERT_COLUMNS.contains(&column),
        }
    }

    /// Display label for a category value (Likert items show their tick text).
    pub fn category_label(&self, value: &str) -> String {
        if !self.likert {
            return value.to_string();
        }
        match value.parse::<f64>() {
            Ok(v) if v.fract() == 0.0 && (1.0..=5.0).contains(&v) => {
                format!("{} ({})", value, LIKERT_LABELS[v as usize - 1])
            }
            _ => value.to_string(),
        }
    }
}

const LIKERT_COLUMNS: &[&str] = &[
    "s_mental_demand",
    "s_temporal_demand",
    "s_effort",
    "s_frustration",
];

const TASK_VARIABLES: &[(&str, &str)] = &[
    ("Task Duration", "task_duration"),
    ("Number of clicks", "n_clicks"),
    (
        "Number of clicks on Search Result elements",
        "n_clicks_search_results",
    ),
    (
        "Number of clicks on AI Overview elements",
        "n_clicks_ai_overview",
    ),
    (
        "Number of clicks on citation design elements",
        "n_clicks_citation_design",
    ),
    ("Was the show more button clicked?", "show_more_clicked"),
    ("Number of clicks to external websites", "n_clicks_external"),
    (
        "Amount of time when the cursor was on AI Overview",
        "hover_time_ai_overview",
    ),
    (
        "Amount of time when the cursor was on Search Result elements",
        "hover_time_search_results",
    ),
    (
        "Amount of time when the cursor was on Citation Design elements",
        "hover_time_citation_design",
    ),
    (
        "Total amount of time when the cursor was on AI Overview and Search Results",
        "hover_time_total",
    ),
    (
        "Fraction of time cursor was on Search Results",
        "hover_frac_search_results",
    ),
    (
        "Fraction of time cursor was on AI Overview",
        "hover_frac_ai_overview",
    ),
    (
        "Fraction of time cursor was on Citation Design",
        "hover_frac_citation_design",
    ),
    ("Number of mouse movements", "n_mouse_moves"),
    ("Number of scrolls", "n_scrolls"),
    ("Number of down (default direction) scrolls", "n_scrolls_down"),
    ("Number of up scrolls", "n_scrolls_up"),
    (
        "Median scroll duration across all scrolls",
        "scroll_duration_median",
    ),
    (
        "Median scroll duration across up scrolls",
        "scroll_duration_median_up",
    ),
    (
        "Median scroll duration across down scrolls",
        "scroll_duration_median_down",
    ),
    ("Median scroll distance", "scroll_distance_median"),
    (
        "Median scroll distance for up scrolls",
        "scroll_distance_median_up",
    ),
    (
        "Median scroll distance for down scrolls",
        "scroll_distance_median_down",
    ),
];

const SURVEY_VARIABLES: &[(&str, &str)] = &[
    ("Survey Duration", "survey_duration"),
    ("How mentally demanding were the tasks?", "s_mental_demand"),
    (
        "How hurried or rushed was the pace of the tasks?",
        "s_temporal_demand",
    ),
    (
        "How hard did you have to work to accomplish your level of performance?",
        "s_effort",
    ),
    (
        "How insecure, discouraged, irritated, stressed, and annoyed were you?",
        "s_frustration",
    ),
    ("Search Frequency", "s_search_frequency"),
    ("Information Navigation", "s_information_navigation"),
    ("Search Engine", "s_search_engine"),
];

const DEMOGRAPHIC_VARIABLES: &[(&str, &str)] = &[
    ("Gender", "gender"),
    ("Employment", "employment_status"),
    ("Highest education level completed", "education_level"),
    ("Age", "age"),
    ("Ethnicity (simplified)", "ethnicity_simplified"),
];

fn entries(level: Level) -> &'static [(&'static str, &'static str)] {
    match level {
        Level::Task => TASK_VARIABLES,
        Level::Survey => SURVEY_VARIABLES,
        Level::Demographic => DEMOGRAPHIC_VARIABLES,
    }
}

/// All variables of a level, in display order.
pub fn variables(level: Level) -> Vec<Variable> {
    entries(level)
        .iter()
        .map(|(label, column)| Variable::known(label, column))
        .collect()
}

/// Resolve a variable by label or by column name.
pub fn lookup(level: Level, name: &str) -> EdaResult<Variable> {
    let wanted = name.trim();
    entries(level)
        .iter()
        .find(|(label, column)| *label == wanted || *column == wanted)
        .map(|(label, column)| Variable::known(label, column))
        .ok_or_else(|| {
            EdaError::configuration(format!("unknown {:?} variable '{}'", level, name))
        })
}

/// Resolve a list of names, failing on the first unknown one.
pub fn resolve<S: AsRef<str>>(level: Level, names: &[S]) -> EdaResult<Vec<Variable>> {
    names.iter().map(|n| lookup(level, n.as_ref())).collect()
}

/// Labels selected when nothing is configured.
pub fn default_labels(level: Level) -> Vec<String> {
    let labels: &[&str] = match level {
        Level::Task => &[
            "Task Duration",
            "Number of clicks",
            "Number of clicks on Search Result elements",
        ],
        Level::Survey => &[
            "How mentally demanding were the tasks?",
            "How hurried or rushed was the pace of the tasks?",
        ],
        Level::Demographic => &["Gender", "Employment"],
    };
    labels.iter().map(|s| s.to_string()).collect()
}
