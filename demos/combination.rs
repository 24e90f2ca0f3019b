//! Concurrent two-drug combination campaign.
//!
//! Mirrors a generation-4 round of an olaparib + I-BET762 screen: both
//! concentrations dosed together on a normalized log scale, candidates
//! restricted to the region where the predicted combined viability stays
//! above threshold.

use anyhow::Result;
use doseloop::prelude::*;

fn main() -> Result<()> {
    let settings = Settings {
        general: General {
            generation: 4,
            seed: 100_700,
            sampling_strategies: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
        },
        parameters: Parameters::new()
            .add_continuous("conc0", 0.0, 1.0)
            .add_continuous("conc1", 0.0, 1.0),
        objectives: Objectives::new()
            .add("ci", Goal::Min, -0.15, true)
            .add("cv_exp", Goal::Min, 0.5, true),
        pharmacology: Some(Pharmacology {
            drugs: vec![
                Drug {
                    name: "olaparib".to_string(),
                    param: "conc0".to_string(),
                    emax: 0.34,
                    hill: 1.53,
                    ec50: 123.0,
                    low: 10.0,
                    high: 1000.0,
                    stock: 1000.0,
                },
                Drug {
                    name: "ibet762".to_string(),
                    param: "conc1".to_string(),
                    emax: 0.35,
                    hill: 3.42,
                    ec50: 468.0,
                    low: 0.01,
                    high: 300.0,
                    stock: 500.0,
                },
            ],
        }),
        constraints: vec![ConstraintSpec::Viability {
            threshold: 0.3,
            admissible: Side::Above,
        }],
        schedule: None,
        paths: Paths {
            data: "data.csv".to_string(),
        },
        output: Output::default(),
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
