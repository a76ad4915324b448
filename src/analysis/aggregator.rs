//! Per-participant aggregation.
//!
//! Collapses repeated task observations into one row per participant,
//! reducing every numeric or boolean column with the chosen statistic and
//! carrying the between-subject treatments along by first value.

use crate::data::{Column, ColumnKind, Table, Value};
use crate::error::EdaResult;
use crate::models::{
    AggMethod, Grouping, CITATION_DESIGN, CONTEXT_STAKENESS, PARTICIPANT_ID, SOURCE_RELIABILITY,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Columns that are constant per participant and kept by first value.
const KEEP_FIRST: &[&str] = &[CITATION_DESIGN, SOURCE_RELIABILITY];

/// Group and aggregate a task-level table.
///
/// `Grouping::None` returns the table unchanged.
pub fn aggregate(table: &Table, grouping: Grouping, method: AggMethod) -> EdaResult<Table> {
    match grouping {
        Grouping::None => Ok(table.clone()),
        Grouping::Participant => aggregate_by_participant(table, method),
    }
}

/// How one output column is computed from a partition.
#[derive(Debug, Clone, Copy)]
enum Reducer {
    Stat(AggMethod),
    First,
}

fn aggregate_by_participant(table: &Table, method: AggMethod) -> EdaResult<Table> {
    let key = table.require(PARTICIPANT_ID)?;
    let working = table.without_column(CONTEXT_STAKENESS);
    let groups = partition(key);

    let mut plan: Vec<(&Column, Reducer)> = working
        .columns()
        .iter()
        .filter(|c| c.kind.is_numeric_like() && c.name != PARTICIPANT_ID)
        .map(|c| (c, Reducer::Stat(method)))
        .collect();
    plan.sort_by(|a, b| a.0.name.cmp(&b.0.name));

    for name in KEEP_FIRST {
        let Some(column) = working.column(name) else {
            continue;
        };
        match plan.iter_mut().find(|(c, _)| c.name == *name) {
            Some(slot) => slot.1 = Reducer::First,
            None => plan.push((column, Reducer::First)),
        }
    }

    let mut columns = Vec::with_capacity(plan.len() + 1);
    columns.push(Column {
        name: PARTICIPANT_ID.to_string(),
        kind: key.kind,
        values: groups.keys().map(GroupKey::to_value).collect(),
    });

    for (column, reducer) in plan {
        columns.push(reduce_column(column, reducer, &groups));
    }

    debug!(
        "Aggregated {} rows into {} participants using {}",
        table.n_rows(),
        groups.len(),
        method
    );

    Ok(Table::new(columns))
}

/// Row positions of each participant, ordered by ascending identifier.
/// Rows without an identifier belong to no group.
fn partition(key: &Column) -> BTreeMap<GroupKey, Vec<usize>> {
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();

    for (row, value) in key.values.iter().enumerate() {
        if let Some(k) = GroupKey::from_value(value) {
            groups.entry(k).or_default().push(row);
        }
    }

    groups
}

fn reduce_column(
    column: &Column,
    reducer: Reducer,
    groups: &BTreeMap<GroupKey, Vec<usize>>,
) -> Column {
    let kind = match (reducer, column.kind) {
        (Reducer::Stat(AggMethod::Mean | AggMethod::Median), ColumnKind::Boolean) => {
            ColumnKind::Numeric
        }
        _ => column.kind,
    };

    let values = groups
        .iter()
        .map(|(key, rows)| match reducer {
            Reducer::Stat(method) => reduce_stat(column, rows, method),
            Reducer::First => first_value(column, rows, key),
        })
        .collect();

    Column {
        name: column.name.clone(),
        kind,
        values,
    }
}

fn reduce_stat(column: &Column, rows: &[usize], method: AggMethod) -> Value {
    let mut present: Vec<f64> = rows
        .iter()
        .filter_map(|&i| column.values[i].as_f64())
        .collect();

    if present.is_empty() {
        return Value::Missing;
    }

    let result = match method {
        AggMethod::Mean => present.iter().sum::<f64>() / present.len() as f64,
        AggMethod::Median => {
            present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mid = present.len() / 2;
            if present.len() % 2 == 0 {
                (present[mid - 1] + present[mid]) / 2.0
            } else {
                present[mid]
            }
        }
        AggMethod::Max => present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggMethod::Min => present.iter().copied().fold(f64::INFINITY, f64::min),
    };

    match (column.kind, method) {
        (ColumnKind::Boolean, AggMethod::Max | AggMethod::Min) => Value::Bool(result != 0.0),
        _ => Value::Number(result),
    }
}

/// First non-missing value in row order.
///
/// The kept columns are expected to be constant per participant; a
/// partition that disagrees is logged and the first value still wins.
fn first_value(column: &Column, rows: &[usize], key: &GroupKey) -> Value {
    let mut present = rows
        .iter()
        .map(|&i| &column.values[i])
        .filter(|v| !v.is_missing());

    let Some(first) = present.next() else {
        return Value::Missing;
    };

    let distinct: BTreeSet<String> = present
        .filter(|v| *v != first)
        .map(|v| v.to_string())
        .collect();
    if !distinct.is_empty() {
        warn!(
            "Participant {} has more than one '{}' value ({} and {}); keeping the first",
            key.to_value(),
            column.name,
            first,
            distinct.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    first.clone()
}

/// Orderable participant identifier.
#[derive(Debug, Clone)]
enum GroupKey {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl GroupKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(GroupKey::Bool(*b)),
            Value::Number(n) => Some(GroupKey::Number(*n)),
            Value::Text(s) => Some(GroupKey::Text(s.clone())),
            Value::Missing => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            GroupKey::Bool(b) => Value::Bool(*b),
            GroupKey::Number(n) => Value::Number(*n),
            GroupKey::Text(s) => Value::Text(s.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            GroupKey::Bool(_) => 0,
            GroupKey::Number(_) => 1,
            GroupKey::Text(_) => 2,
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Bool(a), GroupKey::Bool(b)) => a.cmp(b),
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}
