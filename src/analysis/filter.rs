//! Treatment filtering.
//!
//! Restricts task observations to the selected levels of the three
//! treatments. All three membership tests are applied together to each row
//! of the original table.

use crate::data::{Table, Value};
use crate::error::EdaResult;
use crate::models::{CitationDesign, ContextStakeness, SourceReliability, Treatment};
use std::collections::BTreeSet;
use tracing::debug;

/// Selected levels of each treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreatmentFilter {
    pub citation_designs: BTreeSet<CitationDesign>,
    pub context_stakenesses: BTreeSet<ContextStakeness>,
    pub source_reliabilities: BTreeSet<SourceReliability>,
}

impl Default for TreatmentFilter {
    /// Every level of every treatment.
    fn default() -> Self {
        Self {
            citation_designs: CitationDesign::all().iter().copied().collect(),
            context_stakenesses: ContextStakeness::all().iter().copied().collect(),
            source_reliabilities: SourceReliability::all().iter().copied().collect(),
        }
    }
}

impl TreatmentFilter {
    /// Build a filter from human-readable level labels.
    ///
    /// An empty list selects nothing for that treatment.
    pub fn from_labels<S: AsRef<str>>(
        citation_designs: &[S],
        context_stakenesses: &[S],
        source_reliabilities: &[S],
    ) -> EdaResult<Self> {
        Ok(Self {
            citation_designs: parse_levels(citation_designs)?,
            context_stakenesses: parse_levels(context_stakenesses)?,
            source_reliabilities: parse_levels(source_reliabilities)?,
        })
    }

    /// Labels of the selected levels, in enumeration order.
    pub fn labels(&self) -> (Vec<&'static str>, Vec<&'static str>, Vec<&'static str>) {
        (
            self.citation_designs.iter().map(|l| l.label()).collect(),
            self.context_stakenesses.iter().map(|l| l.label()).collect(),
            self.source_reliabilities.iter().map(|l| l.label()).collect(),
        )
    }

    /// Whether one row's treatment cells pass all three selections.
    fn accepts(&self, cd: &Value, cs: &Value, sr: &Value) -> bool {
        selected(&self.citation_designs, cd)
            && selected(&self.context_stakenesses, cs)
            && selected(&self.source_reliabilities, sr)
    }
}

fn parse_levels<T: Treatment, S: AsRef<str>>(labels: &[S]) -> EdaResult<BTreeSet<T>> {
    labels.iter().map(|l| T::from_label(l.as_ref())).collect()
}

fn selected<T: Treatment>(levels: &BTreeSet<T>, cell: &Value) -> bool {
    match cell.as_str() {
        Some(code) => levels.iter().any(|level| level.code() == code),
        None => false,
    }
}

/// Keep the rows whose treatments are all selected by `filter`.
///
/// Row order is preserved. The table must carry all three treatment columns.
pub fn filter_by_treatments(table: &Table, filter: &TreatmentFilter) -> EdaResult<Table> {
    let cd = table.require(CitationDesign::COLUMN)?;
    let cs = table.require(ContextStakeness::COLUMN)?;
    let sr = table.require(SourceReliability::COLUMN)?;

    let rows: Vec<usize> = (0..table.n_rows())
        .filter(|&i| filter.accepts(&cd.values[i], &cs.values[i], &sr.values[i]))
        .collect();

    debug!("Treatment filter kept {} of {} rows", rows.len(), table.n_rows());

    Ok(table.take_rows(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::error::EdaError;

    fn sample_table() -> Table {
        Table::new(vec![
            Column::numeric(
                "participant_id",
                vec![Some(1.0), Some(1.0), Some(2.0), Some(2.0), Some(3.0), Some(4.0)],
            ),
            Column::text(
                "citation_design",
                vec![
                    Some("icon"),
                    Some("icon"),
                    Some("number"),
                    Some("number"),
                    Some("domain"),
                    None,
                ],
            ),
            Column::text(
                "context_stakeness",
                vec![
                    Some("low"),
                    Some("high"),
                    Some("low"),
                    Some("high"),
                    Some("high"),
                    Some("low"),
                ],
            ),
            Column::text(
                "source_reliability",
                vec![
                    Some("original"),
                    Some("original"),
                    Some("high_reliability"),
                    Some("high_reliability"),
                    Some("low_reliability"),
                    Some("original"),
                ],
            ),
            Column::numeric(
                "clicks",
                vec![Some(2.0), Some(4.0), Some(10.0), Some(1.0), Some(0.0), Some(5.0)],
            ),
        ])
    }

    fn all_labels() -> (Vec<&'static str>, Vec<&'static str>, Vec<&'static str>) {
        (
            vec!["Icon", "Number", "Domain"],
            vec!["Low", "High"],
            vec!["Low", "Original", "High"],
        )
    }

    #[test]
    fn test_default_keeps_every_labelled_row() {
        let table = sample_table();
        let filtered = filter_by_treatments(&table, &TreatmentFilter::default()).unwrap();

        // the row with a missing citation design never matches
        assert_eq!(filtered.n_rows(), 5);
        assert_eq!(filtered.column_names(), table.column_names());
    }

    #[test]
    fn test_default_matches_all_labels() {
        let (cd, cs, sr) = all_labels();
        let from_labels = TreatmentFilter::from_labels(&cd, &cs, &sr).unwrap();
        assert_eq!(from_labels, TreatmentFilter::default());
    }

    #[test]
    fn test_conjunctive_filter() {
        let filter =
            TreatmentFilter::from_labels(&["Icon", "Number"], &["High"], &["Original", "High"])
                .unwrap();
        let filtered = filter_by_treatments(&sample_table(), &filter).unwrap();

        let clicks: Vec<_> = filtered.column("clicks").unwrap().values.clone();
        assert_eq!(clicks, vec![Value::Number(4.0), Value::Number(1.0)]);

        for i in 0..filtered.n_rows() {
            let row = filtered.row(i);
            assert!(filter.accepts(row[1], row[2], row[3]));
        }
    }

    #[test]
    fn test_empty_selection_yields_empty_table() {
        let empty: Vec<&str> = Vec::new();
        let filter =
            TreatmentFilter::from_labels(&empty, &["Low", "High"], &["Low", "Original", "High"])
                .unwrap();
        let filtered = filter_by_treatments(&sample_table(), &filter).unwrap();

        assert_eq!(filtered.n_rows(), 0);
        assert_eq!(filtered.n_columns(), 5);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let filter = TreatmentFilter::from_labels(&["Number", "Domain"], &["High"], &["High", "Low"])
            .unwrap();
        let once = filter_by_treatments(&sample_table(), &filter).unwrap();
        let twice = filter_by_treatments(&once, &filter).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_label() {
        let result = TreatmentFilter::from_labels(&["NotALevel"], &["Low"], &["Original"]);
        assert!(matches!(result, Err(EdaError::Configuration(_))));
    }

    #[test]
    fn test_missing_treatment_column() {
        let table = sample_table().without_column("source_reliability");
        let result = filter_by_treatments(&table, &TreatmentFilter::default());
        assert!(matches!(result, Err(EdaError::Schema { .. })));
    }
}
