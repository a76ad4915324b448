//! CSV loading.
//!
//! Both study tables are plain CSV files with a header row. Any read or
//! parse failure is fatal; there is no partial-load recovery.

use super::table::{Column, ColumnKind, Table, Value};
use crate::error::{EdaError, EdaResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Load a CSV file into a [`Table`].
pub fn load_table(path: &Path) -> EdaResult<Table> {
    let file = File::open(path).map_err(|e| EdaError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let table = read_table(file, path)?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        table.n_rows(),
        table.n_columns(),
        path.display()
    );
    Ok(table)
}

/// Read CSV data from any reader. `source` is only used in error messages.
pub fn read_table<R: Read>(reader: R, source: &Path) -> EdaResult<Table> {
    let load_error = |e: csv::Error| EdaError::Load {
        path: source.to_path_buf(),
        message: e.to_string(),
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(load_error)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // Index columns written by dataframe libraries have an empty header.
            if h.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                h.trim().to_string()
            }
        })
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in csv_reader.records() {
        let record = record.map_err(load_error)?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::from_raw(name, raw))
        .collect();

    Ok(Table::new(columns))
}

/// Convert a millisecond column to seconds.
///
/// A missing column is left alone. A column holding anything but numbers is
/// a load error against `source`.
pub fn millis_to_seconds(table: &Table, column: &str, source: &Path) -> EdaResult<Table> {
    let Some(col) = table.column(column) else {
        debug!("No '{}' column to convert to seconds", column);
        return Ok(table.clone());
    };

    if col.kind != ColumnKind::Numeric {
        return Err(EdaError::Load {
            path: source.to_path_buf(),
            message: format!(
                "column '{}' is {}, expected milliseconds",
                column, col.kind
            ),
        });
    }

    let converted = Column {
        name: col.name.clone(),
        kind: ColumnKind::Numeric,
        values: col
            .values
            .iter()
            .map(|v| match v {
                Value::Number(ms) => Value::Number(ms / 1000.0),
                other => other.clone(),
            })
            .collect(),
    };

    Ok(table.with_column(converted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read(data: &str) -> EdaResult<Table> {
        read_table(data.as_bytes(), Path::new("inline.csv"))
    }

    #[test]
    fn test_read_table_infers_kinds() {
        let table = read(
            "participant_id,citation_design,task_duration,show_more_clicked\n\
             1,icon,5000,True\n\
             2,domain,,False\n",
        )
        .unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column("participant_id").map(|c| c.kind),
            Some(ColumnKind::Numeric)
        );
        assert_eq!(
            table.column("citation_design").map(|c| c.kind),
            Some(ColumnKind::Text)
        );
        assert_eq!(
            table.column("show_more_clicked").map(|c| c.kind),
            Some(ColumnKind::Boolean)
        );
        assert_eq!(table.row(1)[2], &Value::Missing);
    }

    #[test]
    fn test_unnamed_index_column() {
        let table = read(",participant_id\n0,7\n1,8\n").unwrap();
        assert_eq!(table.column_names(), vec!["Unnamed: 0", "participant_id"]);
    }

    #[test]
    fn test_ragged_rows_fail() {
        let result = read("a,b\n1,2\n3\n");
        assert!(matches!(result, Err(EdaError::Load { .. })));
    }

    #[test]
    fn test_missing_file_fails() {
        let result = load_table(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(EdaError::Load { .. })));
    }

    #[test]
    fn test_load_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "participant_id,clicks").unwrap();
        writeln!(file, "1,2").unwrap();
        writeln!(file, "1,4").unwrap();

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_millis_to_seconds() {
        let table = read("task_duration,clicks\n5000,1\n,2\n").unwrap();
        let converted =
            millis_to_seconds(&table, "task_duration", Path::new("inline.csv")).unwrap();

        let durations = &converted.column("task_duration").unwrap().values;
        assert_eq!(durations[0], Value::Number(5.0));
        assert_eq!(durations[1], Value::Missing);
        assert_eq!(converted.column_names(), table.column_names());

        // source table is untouched
        assert_eq!(
            table.column("task_duration").unwrap().values[0],
            Value::Number(5000.0)
        );
    }

    #[test]
    fn test_millis_to_seconds_without_column() {
        let table = read("clicks\n1\n").unwrap();
        let converted =
            millis_to_seconds(&table, "task_duration", Path::new("inline.csv")).unwrap();
        assert_eq!(converted, table);
    }

    #[test]
    fn test_millis_to_seconds_rejects_text() {
        let table = read("participant_id,task_duration\n1,5000\n1,abc\n").unwrap();
        let result = millis_to_seconds(&table, "task_duration", Path::new("tasks.csv"));

        match result {
            Err(EdaError::Load { path, message }) => {
                assert_eq!(path, Path::new("tasks.csv"));
                assert!(message.contains("task_duration"));
            }
            other => panic!("expected a load error, got {:?}", other),
        }
    }

    #[test]
    fn test_infinite_cells_are_missing() {
        let table = read("task_duration\ninf\n5000\n-Infinity\n").unwrap();
        let column = table.column("task_duration").unwrap();

        assert_eq!(column.kind, ColumnKind::Numeric);
        assert_eq!(
            column.values,
            vec![Value::Missing, Value::Number(5000.0), Value::Missing]
        );
    }
}
