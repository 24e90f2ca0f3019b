//! Candidate recommendation
//!
//! The external Bayesian optimizer is consumed through the narrow interface
//! in this module: past observations and a list of sampling strategies go
//! in, one recommended candidate point per strategy comes out. Everything
//! heavier than that (surrogate modeling, acquisition optimization,
//! feasibility-aware sampling) lives behind an implementation of
//! [Recommender], out of scope for this crate.

pub mod sobol;

use crate::error::{Error, Result};
use crate::routines::datafile::{Observation, Value};
use std::collections::HashMap;

/// A candidate parameter point in the recommender's representation
pub type Point = HashMap<String, Value>;

/// A source of recommended experiments.
///
/// Implementations receive their configuration (parameter schema,
/// feasibility predicate) at construction and return one candidate per
/// sampling strategy.
pub trait Recommender {
    fn recommend(
        &self,
        observations: &[Observation],
        sampling_strategies: &[f64],
    ) -> Result<Vec<Point>>;
}

/// Numeric view of a named point entry, or [Error::MissingColumn]
pub fn require_f64(point: &Point, name: &str) -> Result<f64> {
    point
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::MissingColumn(name.to_string()))
}

/// Integer view of a named point entry, or [Error::MissingColumn]
pub fn require_int(point: &Point, name: &str) -> Result<i64> {
    point
        .get(name)
        .and_then(Value::as_int)
        .ok_or_else(|| Error::MissingColumn(name.to_string()))
}
