//! Analysis pipeline: treatment filter, participant aggregation and
//! distribution summaries.

pub mod aggregator;
pub mod distribution;
pub mod filter;

pub use aggregator::aggregate;
pub use distribution::{distribution, BoxSummary, Distribution};
pub use filter::{filter_by_treatments, TreatmentFilter};

use crate::catalog::{Level, Variable};
use crate::data::{StudyData, Table};
use crate::error::EdaResult;
use crate::models::{AnalysisSettings, Grouping, ReportSection, SplitBy};
use tracing::{info, warn};

/// Result of one filter -> aggregate -> summarize run.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Task rows before filtering.
    pub task_rows_loaded: usize,
    /// Task rows left after the treatment filter.
    pub task_rows_filtered: usize,
    /// Rows the task-level distributions were computed from.
    pub task_rows_analyzed: usize,
    pub sections: Vec<ReportSection>,
}

/// Run the whole pipeline against freshly loaded study data.
pub fn analyze(data: &StudyData, settings: &AnalysisSettings) -> EdaResult<Analysis> {
    let filtered = filter_by_treatments(&data.tasks, &settings.filter)?;
    let tasks = aggregate(&filtered, settings.grouping, settings.method)?;

    info!(
        "Task rows: {} loaded, {} after filtering, {} analyzed",
        data.tasks.n_rows(),
        filtered.n_rows(),
        tasks.n_rows()
    );

    let task_split = task_level_split(settings.split_by, settings.grouping);
    let user_split = settings.split_by.for_user_level();

    let sections = vec![
        section(
            "Task level (dependent) variables",
            Level::Task,
            &tasks,
            &settings.task_variables,
            task_split,
            settings.bins,
        )?,
        section(
            "Survey",
            Level::Survey,
            &data.users,
            &settings.survey_variables,
            user_split,
            settings.bins,
        )?,
        section(
            "Demographics",
            Level::Demographic,
            &data.users,
            &settings.demographic_variables,
            user_split,
            settings.bins,
        )?,
    ];

    Ok(Analysis {
        task_rows_loaded: data.tasks.n_rows(),
        task_rows_filtered: filtered.n_rows(),
        task_rows_analyzed: tasks.n_rows(),
        sections,
    })
}

/// Context stakeness is dropped by participant aggregation, so it cannot
/// split grouped task data.
fn task_level_split(split_by: SplitBy, grouping: Grouping) -> SplitBy {
    if grouping == Grouping::Participant && split_by == SplitBy::ContextStakeness {
        warn!("Context Stakeness varies within a participant; grouped task data is not split");
        return SplitBy::None;
    }
    split_by
}

fn section(
    title: &str,
    level: Level,
    table: &Table,
    variables: &[Variable],
    split_by: SplitBy,
    bins: usize,
) -> EdaResult<ReportSection> {
    let distributions = variables
        .iter()
        .map(|v| distribution(table, v, split_by, bins))
        .collect::<EdaResult<Vec<_>>>()?;

    Ok(ReportSection {
        title: title.to_string(),
        level,
        distributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_labels, resolve};
    use crate::data::{DataSource, StudyData};
    use crate::models::AggMethod;
    use std::path::Path;

    fn study() -> StudyData {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        StudyData::load(&DataSource {
            task_data: fixtures.join("task_data.csv"),
            user_data: fixtures.join("user_data.csv"),
            duration_column: "task_duration".to_string(),
        })
        .unwrap()
    }

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            filter: TreatmentFilter::default(),
            grouping: Grouping::None,
            method: AggMethod::Mean,
            split_by: SplitBy::None,
            bins: 5,
            task_variables: resolve(Level::Task, &default_labels(Level::Task)).unwrap(),
            survey_variables: resolve(Level::Survey, &default_labels(Level::Survey)).unwrap(),
            demographic_variables: resolve(Level::Demographic, &default_labels(Level::Demographic))
                .unwrap(),
        }
    }

    #[test]
    fn test_analyze_fixture() {
        let analysis = analyze(&study(), &settings()).unwrap();

        assert_eq!(analysis.task_rows_loaded, 8);
        assert_eq!(analysis.task_rows_filtered, 8);
        assert_eq!(analysis.task_rows_analyzed, 8);
        assert_eq!(analysis.sections.len(), 3);
        assert_eq!(analysis.sections[0].distributions.len(), 3);
        assert_eq!(analysis.sections[2].distributions[0].column, "gender");
    }

    #[test]
    fn test_analyze_filtered_and_grouped() {
        let mut settings = settings();
        settings.filter = TreatmentFilter::from_labels(
            &["Icon", "Number"],
            &["Low", "High"],
            &["Low", "Original", "High"],
        )
        .unwrap();
        settings.grouping = Grouping::Participant;
        settings.split_by = SplitBy::ContextStakeness;

        let analysis = analyze(&study(), &settings).unwrap();

        assert_eq!(analysis.task_rows_filtered, 6);
        assert_eq!(analysis.task_rows_analyzed, 2);
        // context stakeness cannot split grouped or user-level data
        for section in &analysis.sections {
            for dist in &section.distributions {
                assert_eq!(dist.split_by, SplitBy::None);
                assert_eq!(dist.series.len(), 1);
            }
        }
    }

    #[test]
    fn test_user_level_split() {
        let mut settings = settings();
        settings.split_by = SplitBy::SourceReliability;

        let analysis = analyze(&study(), &settings).unwrap();
        let gender = &analysis.sections[2].distributions[0];
        assert_eq!(gender.series.len(), 4);
    }
}
