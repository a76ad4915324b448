//! Distribution summaries.
//!
//! Turns one column of a table into histogram counts plus a box summary,
//! optionally split into one series per treatment level. Numeric columns
//! are binned into equal-width bins; boolean, text and Likert columns are
//! counted per category.

use crate::catalog::Variable;
use crate::data::{ColumnKind, Table, Value};
use crate::error::EdaResult;
use crate::models::SplitBy;
use serde::Serialize;
use std::cmp::Ordering;

/// Name of the series covering every row.
pub const ALL_SERIES: &str = "All";

/// One histogram bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

/// Five-number summary plus mean, as drawn by a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub n: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl BoxSummary {
    /// Summarize the finite values of a set. `None` when there are none.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }

        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let n = sorted.len();
        Some(Self {
            n,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
        })
    }
}

/// Linear-interpolated quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Counts for one group of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub counts: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BoxSummary>,
}

/// Distribution of one variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub label: String,
    pub column: String,
    pub kind: ColumnKind,
    pub split_by: SplitBy,
    /// Rows with no value for this variable.
    pub missing: usize,
    pub bins: Vec<Bin>,
    /// `All` first, then one series per split level in ascending order.
    pub series: Vec<Series>,
}

impl Distribution {
    pub fn total(&self) -> usize {
        self.series
            .first()
            .map_or(0, |s| s.counts.iter().sum())
    }
}

/// Compute the distribution of `variable` in `table`.
///
/// Fails with a schema error when the variable's column, or the split
/// column, is absent.
pub fn distribution(
    table: &Table,
    variable: &Variable,
    split_by: SplitBy,
    bin_count: usize,
) -> EdaResult<Distribution> {
    let column = table.require(&variable.column)?;
    let split = match split_by.column() {
        Some(name) => Some(table.require(name)?),
        None => None,
    };

    let categorical = column.kind != ColumnKind::Numeric || variable.likert;
    let bucketer = if categorical {
        Bucketer::categories(&column.values, column.kind, variable)
    } else {
        Bucketer::ranges(&column.values, bin_count)
    };

    let mut groups: Vec<(String, Vec<usize>)> = vec![(ALL_SERIES.to_string(), Vec::new())];
    for row in 0..column.len() {
        groups[0].1.push(row);
        let Some(split) = split else { continue };
        let level = &split.values[row];
        if level.is_missing() {
            continue;
        }
        let name = level.to_string();
        match groups[1..].iter_mut().find(|(n, _)| *n == name) {
            Some(group) => group.1.push(row),
            None => groups.push((name, vec![row])),
        }
    }
    groups[1..].sort_by(|a, b| a.0.cmp(&b.0));

    let series = groups
        .into_iter()
        .map(|(name, rows)| {
            let mut counts = vec![0; bucketer.bins.len()];
            let mut numbers = Vec::new();
            for &row in &rows {
                let value = &column.values[row];
                if let Some(idx) = bucketer.index(value) {
                    counts[idx] += 1;
                }
                if column.kind == ColumnKind::Numeric {
                    if let Some(v) = value.as_f64() {
                        numbers.push(v);
                    }
                }
            }
            Series {
                name,
                counts,
                summary: BoxSummary::compute(&numbers),
            }
        })
        .collect();

    Ok(Distribution {
        label: variable.label.clone(),
        column: variable.column.clone(),
        kind: column.kind,
        split_by,
        missing: column.missing_count(),
        bins: bucketer.bins,
        series,
    })
}

/// Maps values to bin positions.
struct Bucketer {
    bins: Vec<Bin>,
    rule: Rule,
}

enum Rule {
    Categories(Vec<String>),
    Range { min: f64, width: f64, count: usize },
}

impl Bucketer {
    fn categories(values: &[Value], kind: ColumnKind, variable: &Variable) -> Self {
        let mut distinct: Vec<&Value> = Vec::new();
        for value in values.iter().filter(|v| !v.is_missing()) {
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }

        distinct.sort_by(|a, b| match (kind, a.as_f64(), b.as_f64()) {
            (ColumnKind::Numeric, Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.to_string().cmp(&b.to_string()),
        });

        let keys: Vec<String> = distinct.iter().map(|v| v.to_string()).collect();
        let bins = keys
            .iter()
            .map(|k| Bin {
                label: variable.category_label(k),
                lower: None,
                upper: None,
            })
            .collect();

        Self {
            bins,
            rule: Rule::Categories(keys),
        }
    }

    fn ranges(values: &[Value], count: usize) -> Self {
        let numbers: Vec<f64> = values
            .iter()
            .filter_map(Value::as_f64)
            .filter(|v| v.is_finite())
            .collect();
        if numbers.is_empty() {
            return Self {
                bins: Vec::new(),
                rule: Rule::Categories(Vec::new()),
            };
        }

        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let count = if max > min { count.max(1) } else { 1 };
        let width = if max > min {
            (max - min) / count as f64
        } else {
            0.0
        };

        let bins = (0..count)
            .map(|i| {
                let lower = min + width * i as f64;
                let upper = if i + 1 == count { max } else { lower + width };
                Bin {
                    label: format!("{:.3}-{:.3}", lower, upper),
                    lower: Some(lower),
                    upper: Some(upper),
                }
            })
            .collect();

        Self {
            bins,
            rule: Rule::Range { min, width, count },
        }
    }

    fn index(&self, value: &Value) -> Option<usize> {
        if value.is_missing() {
            return None;
        }
        match &self.rule {
            Rule::Categories(keys) => {
                let key = value.to_string();
                keys.iter().position(|k| *k == key)
            }
            Rule::Range { min, width, count } => {
                let v = value.as_f64().filter(|v| v.is_finite())?;
                if *width == 0.0 {
                    return Some(0);
                }
                let idx = ((v - min) / width).floor() as usize;
                Some(idx.min(count - 1))
            }
        }
    }
}
