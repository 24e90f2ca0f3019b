//! Sequential dosing-schedule campaign.
//!
//! The search space is the order of addition and the time of the first
//! dose; the chronological constraint keeps the first addition inside the
//! assay window, and the complement time `t1` is derived for the bench
//! protocol.

use anyhow::Result;
use doseloop::prelude::*;

fn main() -> Result<()> {
    let settings = Settings {
        general: General {
            generation: 1,
            seed: 100_700,
            sampling_strategies: vec![-1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 0.75, 1.0],
        },
        parameters: Parameters::new()
            .add_categorical("seq", ["a", "b"])
            .add_discrete("t0", 1, 47),
        objectives: Objectives::new().add("cv", Goal::Min, 0.4, true),
        pharmacology: None,
        constraints: Vec::new(),
        schedule: Some(Schedule {
            param: "t0".to_string(),
            window: 48,
            threshold: Some(12),
            derived: Some("t1".to_string()),
        }),
        paths: Paths {
            data: "data.csv".to_string(),
        },
        output: Output { backup: false },
        log: Log::default(),
    };

    setup_log(&settings)?;

    let feasibility = Feasibility::from_settings(&settings)?;
    let recommender =
        QuasiRandom::new(settings.parameters.clone(), settings.general.seed)
            .with_feasibility(feasibility);

    let generation = run(&settings, &recommender)?;
    tracing::info!(
        "Generation {} proposed {} experiments, written to {:?}",
        settings.general.generation,
        generation.proposed,
        generation.output_path
    );
    Ok(())
}
