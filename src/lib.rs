//! Closed-loop batch recommendation for drug-combination dose-finding
//! campaigns.
//!
//! Each generation of a campaign loads the accumulated observation table,
//! asks a [Recommender](crate::routines::recommend::Recommender) for the
//! next batch of experiments, filters candidates through pharmacological
//! feasibility predicates ([constraints]), and writes the extended table
//! back out with a backup of the previous round. The optimizer itself is an
//! external collaborator consumed through the narrow recommend interface;
//! this crate supplies the campaign plumbing around it.

pub mod constraints;
pub mod entrypoints;
pub mod error;
pub mod routines;

pub mod prelude {
    pub use crate::constraints::response::{hill, norm_conc_inverse, Drug};
    pub use crate::constraints::{
        Feasibility, KnownConstraint, ScheduleConstraint, Side, TotalConcentrationConstraint,
        ViabilityConstraint,
    };
    pub use crate::entrypoints::run;
    pub use crate::error::{Error, Result};
    pub use crate::routines::datafile::{Observation, Table, Value};
    pub use crate::routines::logger::setup_log;
    pub use crate::routines::output::{render_table, Generation};
    pub use crate::routines::recommend::{sobol::QuasiRandom, Point, Recommender};
    pub use crate::routines::settings::{
        ConstraintSpec, General, Goal, Log, Objective, Objectives, Output, Parameter,
        ParameterType, Parameters, Paths, Pharmacology, Schedule, Settings,
    };
}
