//! Campaign entrypoints

use crate::error::Result;
use crate::routines::datafile::Table;
use crate::routines::output::{self, Generation};
use crate::routines::recommend::Recommender;
use crate::routines::settings::Settings;
use std::path::Path;
use std::time::Instant;

/// Run one generation of the campaign.
///
/// The single parameterized workflow behind every experiment round: load the
/// observation table, drop rows with missing parameter values, hand the
/// observations to the recommender, append the recommended batch with its
/// derived bookkeeping columns, rotate the backup copy and write the
/// generation-tagged output table.
///
/// The recommender is an injected dependency; the same campaign settings can
/// drive the external optimizer or the in-crate
/// [QuasiRandom](crate::routines::recommend::sobol::QuasiRandom) fallback.
pub fn run<R: Recommender>(settings: &Settings, recommender: &R) -> Result<Generation> {
    let now = Instant::now();
    settings.validate()?;

    let data_path = Path::new(&settings.paths.data);
    let parameter_names = settings.parameter_names();
    let objective_names = settings.objective_names();

    let mut table = if data_path.exists() {
        Table::parse(data_path)?
    } else {
        tracing::warn!(
            "No observation file at {:?}, starting a fresh campaign",
            data_path
        );
        let mut columns = parameter_names.clone();
        columns.extend(objective_names.iter().cloned());
        Table::with_columns(columns)
    };
    tracing::info!(
        "Loaded {} past experiments from {:?}",
        table.len(),
        data_path
    );

    let dropped = table.drop_missing(&parameter_names)?;
    if dropped > 0 {
        tracing::warn!("Dropped {} rows with missing parameter values", dropped);
    }

    println!("\n{}\n", output::render_table(&table, "Past Experiments"));

    let observations = table.observations(&parameter_names, &objective_names)?;
    let samples = recommender.recommend(&observations, &settings.general.sampling_strategies)?;
    tracing::info!("Recommender proposed {} new experiments", samples.len());

    output::append_candidates(&mut table, &samples, settings)?;
    println!(
        "{}\n",
        output::render_table(&table.tail(samples.len()), "Proposed Experiments")
    );

    let backup_path = if settings.output.backup {
        output::rotate_backup(data_path)?
    } else {
        tracing::debug!("Backup rotation is disabled");
        None
    };

    let output_path = output::output_path(data_path, settings.general.generation);
    table.write_csv(&output_path)?;
    tracing::info!(
        "Wrote {} experiments to {:?} in {:.2?}",
        table.len(),
        output_path,
        now.elapsed()
    );

    Ok(Generation {
        table,
        proposed: samples.len(),
        output_path,
        backup_path,
    })
}
