//! Feasibility-aware quasi-random recommendation
//!
//! [QuasiRandom] scales a seeded Sobol sequence into the declared parameter
//! domains and rejects points the feasibility conjunction refuses. It is the
//! in-crate stand-in for the external optimizer: exploration-only, blind to
//! past observations, suitable for campaign bootstrap, demos and tests.

use crate::constraints::Feasibility;
use crate::error::{Error, Result};
use crate::routines::datafile::{Observation, Value};
use crate::routines::recommend::{Point, Recommender};
use crate::routines::settings::{Parameter, ParameterType, Parameters};
use sobol_burley::sample;

pub struct QuasiRandom {
    parameters: Parameters,
    feasibility: Feasibility,
    seed: u32,
    max_attempts: u32,
}

impl QuasiRandom {
    pub fn new(parameters: Parameters, seed: u32) -> Self {
        Self {
            parameters,
            feasibility: Feasibility::new(),
            seed,
            max_attempts: 10_000,
        }
    }

    /// Reject candidates this conjunction refuses
    pub fn with_feasibility(mut self, feasibility: Feasibility) -> Self {
        self.feasibility = feasibility;
        self
    }

    /// Cap on rejected draws per candidate before giving up
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    fn scale(parameter: &Parameter, unit: f64) -> Value {
        match parameter.kind {
            ParameterType::Continuous => {
                Value::Float(parameter.low + unit * (parameter.high - parameter.low))
            }
            ParameterType::Discrete => {
                Value::Int((parameter.low + unit * (parameter.high - parameter.low)).round() as i64)
            }
            ParameterType::Categorical => {
                let count = parameter.categories.len();
                let index = ((unit * count as f64) as usize).min(count - 1);
                Value::Text(parameter.categories[index].clone())
            }
        }
    }

    fn point_at(&self, index: u32) -> Point {
        let mut point = Point::new();
        for (dimension, parameter) in self.parameters.iter().enumerate() {
            let unit = sample(index, dimension as u32, self.seed) as f64;
            point.insert(parameter.name.clone(), Self::scale(parameter, unit));
        }
        point
    }
}

impl Recommender for QuasiRandom {
    fn recommend(
        &self,
        _observations: &[Observation],
        sampling_strategies: &[f64],
    ) -> Result<Vec<Point>> {
        let mut points = Vec::with_capacity(sampling_strategies.len());
        let mut index: u32 = 0;
        for strategy in sampling_strategies {
            let mut attempts: u32 = 0;
            let point = loop {
                let candidate = self.point_at(index);
                index = index.wrapping_add(1);
                attempts += 1;
                if self.feasibility.is_admissible(&candidate)? {
                    break candidate;
                }
                if attempts >= self.max_attempts {
                    return Err(Error::InfeasibleRegion { attempts });
                }
            };
            if attempts > 1 {
                tracing::debug!(
                    "strategy {:.3}: accepted a candidate after {} rejected draws",
                    strategy,
                    attempts - 1
                );
            }
            points.push(point);
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ScheduleConstraint;

    fn schema() -> Parameters {
        Parameters::new()
            .add_continuous("conc0", 0.0, 1.0)
            .add_discrete("t0", 1, 47)
            .add_categorical("seq", ["a", "b"])
    }

    #[test]
    fn recommends_one_point_per_strategy() {
        let recommender = QuasiRandom::new(schema(), 42);
        let points = recommender.recommend(&[], &[0.25, 0.5, 0.75]).unwrap();
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn points_respect_the_declared_domains() {
        let recommender = QuasiRandom::new(schema(), 42);
        for point in recommender.recommend(&[], &[0.1, 0.2, 0.3, 0.4, 0.5]).unwrap() {
            let conc0 = point["conc0"].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&conc0));
            let t0 = point["t0"].as_int().unwrap();
            assert!((1..=47).contains(&t0));
            let seq = point["seq"].as_str().unwrap();
            assert!(seq == "a" || seq == "b");
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let first = QuasiRandom::new(schema(), 7).recommend(&[], &[0.5, 0.5]).unwrap();
        let second = QuasiRandom::new(schema(), 7).recommend(&[], &[0.5, 0.5]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejected_candidates_are_resampled() {
        let feasibility = Feasibility::new().add(ScheduleConstraint::new("t0", 12, 48));
        let recommender = QuasiRandom::new(schema(), 42).with_feasibility(feasibility);
        for point in recommender.recommend(&[], &[0.2, 0.4, 0.6, 0.8]).unwrap() {
            let t0 = point["t0"].as_int().unwrap();
            assert!((12..=36).contains(&t0), "t0 = {}", t0);
        }
    }

    #[test]
    fn exhausted_feasible_region_is_an_error() {
        // threshold > window / 2 admits nothing
        let feasibility = Feasibility::new().add(ScheduleConstraint::new("t0", 100, 48));
        let recommender = QuasiRandom::new(schema(), 42)
            .with_feasibility(feasibility)
            .with_max_attempts(50);
        assert!(matches!(
            recommender.recommend(&[], &[0.5]),
            Err(Error::InfeasibleRegion { attempts: 50 })
        ));
    }
}
