//! Output routines
//!
//! Console rendering of experiment tables, rotation of the backup copy of
//! the observation file, and assembly of the generation-tagged output table
//! (recommended rows plus the campaign's derived bookkeeping columns).

use crate::error::{Error, Result};
use crate::routines::datafile::{Table, Value};
use crate::routines::recommend::Point;
use crate::routines::settings::Settings;
use std::fs;
use std::path::{Path, PathBuf};

/// The result of one generation run
#[derive(Debug)]
pub struct Generation {
    /// Past experiments plus the newly recommended batch
    pub table: Table,
    /// Number of newly recommended experiments
    pub proposed: usize,
    /// Where the combined table was written
    pub output_path: PathBuf,
    /// Where the pre-run observation file was copied, if backup ran
    pub backup_path: Option<PathBuf>,
}

/// Render a table as fixed-width text with a 1-based `N` index column.
///
/// Floats are shown with six decimal places, matching the console view the
/// lab works from.
pub fn render_table(table: &Table, title: &str) -> String {
    fn cell_text(cell: Option<&Value>) -> String {
        match cell {
            None => String::new(),
            Some(Value::Float(float)) => format!("{:.6}", float),
            Some(Value::Int(integer)) => integer.to_string(),
            Some(Value::Text(text)) => text.clone(),
        }
    }

    let mut header: Vec<String> = vec!["N".to_string()];
    header.extend(table.columns().iter().cloned());

    let mut body: Vec<Vec<String>> = Vec::with_capacity(table.len());
    for (index, row) in table.rows().iter().enumerate() {
        let mut line = vec![(index + 1).to_string()];
        line.extend(row.iter().map(|cell| cell_text(cell.as_ref())));
        body.push(line);
    }

    let mut widths: Vec<usize> = header.iter().map(|text| text.len()).collect();
    for line in &body {
        for (column, text) in line.iter().enumerate() {
            widths[column] = widths[column].max(text.len());
        }
    }

    let format_line = |line: &[String]| {
        line.iter()
            .enumerate()
            .map(|(column, text)| format!("{:<width$}", text, width = widths[column]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut rendered = String::new();
    rendered.push_str(title);
    rendered.push('\n');
    rendered.push_str(&format_line(&header));
    rendered.push('\n');
    rendered.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for line in &body {
        rendered.push('\n');
        rendered.push_str(&format_line(line));
    }
    rendered
}

/// Sibling path of the generation-tagged output table
pub fn output_path(data: &Path, generation: u32) -> PathBuf {
    sibling(data, &format!("G{}_", generation))
}

/// Sibling path of the backup copy
pub fn backup_path(data: &Path) -> PathBuf {
    sibling(data, "backup_")
}

fn sibling(data: &Path, prefix: &str) -> PathBuf {
    let name = data
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data.csv".to_string());
    data.with_file_name(format!("{}{}", prefix, name))
}

/// Copy the pre-run observation file to `backup_<file>`, replacing any
/// stale backup. A missing input means there is nothing to rotate.
pub fn rotate_backup(data: &Path) -> Result<Option<PathBuf>> {
    if !data.exists() {
        tracing::debug!("No observation file at {:?}, skipping backup", data);
        return Ok(None);
    }
    let backup = backup_path(data);
    if backup.exists() {
        fs::remove_file(&backup)?;
    }
    fs::copy(data, &backup)?;
    tracing::info!("Backed up {:?} to {:?}", data, backup);
    Ok(Some(backup))
}

/// Append the recommended batch to the table, with derived columns.
///
/// New rows get every declared parameter from their candidate point,
/// objective cells left empty, the `gen` tag and their 1-based `number`
/// within the batch, and the schedule complement column when configured.
/// Inverse-transformed real-unit concentration columns (`<param>_inv`) are
/// recomputed for all rows when pharmacology is present.
pub fn append_candidates(table: &mut Table, samples: &[Point], settings: &Settings) -> Result<()> {
    let parameter_names = settings.parameter_names();
    for name in &parameter_names {
        table.ensure_column(name);
    }
    let gen_column = table.ensure_column("gen");
    let number_column = table.ensure_column("number");
    let derived_column = match &settings.schedule {
        Some(schedule) => schedule
            .derived
            .as_ref()
            .map(|name| (table.ensure_column(name), schedule.param.clone(), schedule.window)),
        None => None,
    };

    for (offset, sample) in samples.iter().enumerate() {
        let row_index = table.len();
        table.push_row(Vec::new());
        for name in &parameter_names {
            let value = sample
                .get(name)
                .ok_or_else(|| Error::MissingColumn(name.clone()))?;
            let column = table.ensure_column(name);
            table.set(row_index, column, value.clone());
        }
        table.set(
            row_index,
            gen_column,
            Value::Int(i64::from(settings.general.generation)),
        );
        table.set(row_index, number_column, Value::Int(offset as i64 + 1));
        if let Some((column, param, window)) = &derived_column {
            let t0 = sample
                .get(param)
                .and_then(Value::as_int)
                .ok_or_else(|| Error::MissingColumn(param.clone()))?;
            table.set(row_index, *column, Value::Int(window - t0));
        }
    }

    if let Some(pharmacology) = &settings.pharmacology {
        for drug in &pharmacology.drugs {
            let source = table
                .column_index(&drug.param)
                .ok_or_else(|| Error::MissingColumn(drug.param.clone()))?;
            let target = table.ensure_column(&format!("{}_inv", drug.param));
            for row in 0..table.len() {
                let normalized = table.rows()[row][source]
                    .as_ref()
                    .and_then(Value::as_f64);
                if let Some(normalized) = normalized {
                    table.set(row, target, Value::Float(drug.inverse(normalized)));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::settings::{General, Goal, Objectives, Parameters, Schedule, Settings};

    fn settings() -> Settings {
        Settings {
            general: General {
                generation: 2,
                seed: 42,
                sampling_strategies: vec![0.5],
            },
            parameters: Parameters::new()
                .add_categorical("seq", ["a", "b"])
                .add_discrete("t0", 1, 47),
            objectives: Objectives::new().add("cv", Goal::Min, 0.4, true),
            schedule: Some(Schedule {
                param: "t0".to_string(),
                window: 48,
                threshold: Some(12),
                derived: Some("t1".to_string()),
            }),
            ..Settings::default()
        }
    }

    fn sample(seq: &str, t0: i64) -> Point {
        let mut point = Point::new();
        point.insert("seq".to_string(), Value::Text(seq.to_string()));
        point.insert("t0".to_string(), Value::Int(t0));
        point
    }

    #[test]
    fn appended_rows_carry_generation_bookkeeping() {
        let settings = settings();
        let mut table = Table::with_columns(vec![
            "seq".to_string(),
            "t0".to_string(),
            "cv".to_string(),
        ]);
        table.push_row(vec![
            Some(Value::Text("a".to_string())),
            Some(Value::Int(20)),
            Some(Value::Float(0.6)),
        ]);

        append_candidates(&mut table, &[sample("b", 14), sample("a", 30)], &settings).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1, "gen"), Some(&Value::Int(2)));
        assert_eq!(table.get(1, "number"), Some(&Value::Int(1)));
        assert_eq!(table.get(2, "number"), Some(&Value::Int(2)));
        assert_eq!(table.get(1, "t1"), Some(&Value::Int(34)));
        assert_eq!(table.get(2, "t1"), Some(&Value::Int(18)));
        // objective stays unmeasured, prior rows untouched
        assert_eq!(table.get(1, "cv"), None);
        assert_eq!(table.get(0, "cv"), Some(&Value::Float(0.6)));
        assert_eq!(table.get(0, "gen"), None);
    }

    #[test]
    fn missing_sample_parameter_is_an_error() {
        let settings = settings();
        let mut table = Table::with_columns(vec!["seq".to_string(), "t0".to_string()]);
        let mut incomplete = Point::new();
        incomplete.insert("seq".to_string(), Value::Text("a".to_string()));
        assert!(matches!(
            append_candidates(&mut table, &[incomplete], &settings),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn rendering_is_fixed_width_with_index() {
        let mut table = Table::with_columns(vec!["conc0".to_string(), "cv".to_string()]);
        table.push_row(vec![Some(Value::Float(0.25)), Some(Value::Float(0.45))]);
        table.push_row(vec![Some(Value::Float(0.5)), None]);

        let rendered = render_table(&table, "Past Experiments");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Past Experiments");
        assert!(lines[1].starts_with("N"));
        assert!(lines[1].contains("conc0"));
        assert!(lines[3].contains("0.250000"));
        assert!(lines[4].starts_with("2"));
    }

    #[test]
    fn sibling_paths_keep_the_directory() {
        let data = Path::new("campaign/data.csv");
        assert_eq!(output_path(data, 4), Path::new("campaign/G4_data.csv"));
        assert_eq!(backup_path(data), Path::new("campaign/backup_data.csv"));
    }
}
