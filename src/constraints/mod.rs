//! Known constraints
//!
//! Feasibility predicates supplied to the recommender to exclude candidate
//! points from scientifically invalid or redundant regions before they are
//! proposed. Each predicate is pure: it reads a candidate point in the
//! optimizer's normalized representation and answers admissible or not.

pub mod response;

use crate::error::{Error, Result};
use crate::routines::recommend::{require_f64, require_int, Point};
use crate::routines::settings::{ConstraintSpec, Settings};
use self::response::Drug;
use serde::{Deserialize, Serialize};

/// The side of a threshold on which a candidate is admissible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Above,
    Below,
}

impl Side {
    fn permits(&self, value: f64, threshold: f64) -> bool {
        match self {
            Side::Above => value > threshold,
            Side::Below => value < threshold,
        }
    }
}

/// A feasibility predicate over candidate parameter points
pub trait KnownConstraint {
    /// Whether the candidate lies in the admissible region
    fn is_admissible(&self, point: &Point) -> Result<bool>;
}

/// Admissibility by predicted combined cell viability.
///
/// Each drug's normalized concentration is inverted to real units and pushed
/// through its Hill curve; the per-drug viabilities combine multiplicatively
/// (Bliss independence). The candidate is admissible iff the combined
/// viability lies on the permitted side of the threshold.
pub struct ViabilityConstraint {
    drugs: Vec<Drug>,
    threshold: f64,
    admissible: Side,
}

impl ViabilityConstraint {
    pub fn new(drugs: Vec<Drug>, threshold: f64, admissible: Side) -> Self {
        Self {
            drugs,
            threshold,
            admissible,
        }
    }

    /// Predicted combined viability at the candidate point
    pub fn viability(&self, point: &Point) -> Result<f64> {
        let mut combined = 1.0;
        for drug in &self.drugs {
            let normalized = require_f64(point, &drug.param)?;
            combined *= drug.viability(drug.inverse(normalized))?;
        }
        Ok(combined)
    }
}

impl KnownConstraint for ViabilityConstraint {
    fn is_admissible(&self, point: &Point) -> Result<bool> {
        Ok(self
            .admissible
            .permits(self.viability(point)?, self.threshold))
    }
}

/// Admissibility by total combined drug concentration.
///
/// Sums the real-unit concentrations as fractions of their stock
/// concentration and scales by the campaign dilution factor, instead of
/// evaluating viability.
pub struct TotalConcentrationConstraint {
    drugs: Vec<Drug>,
    threshold: f64,
    dilution: f64,
    admissible: Side,
}

impl TotalConcentrationConstraint {
    pub fn new(drugs: Vec<Drug>, threshold: f64, dilution: f64, admissible: Side) -> Self {
        Self {
            drugs,
            threshold,
            dilution,
            admissible,
        }
    }

    /// Stock-normalized concentration total at the candidate point
    pub fn total(&self, point: &Point) -> Result<f64> {
        let mut total = 0.0;
        for drug in &self.drugs {
            let normalized = require_f64(point, &drug.param)?;
            total += drug.inverse(normalized) / drug.stock;
        }
        Ok(total / self.dilution)
    }
}

impl KnownConstraint for TotalConcentrationConstraint {
    fn is_admissible(&self, point: &Point) -> Result<bool> {
        Ok(self.admissible.permits(self.total(point)?, self.threshold))
    }
}

/// Admissibility of a time-of-addition value in a two-stage dosing schedule.
///
/// The discrete time `t0` is admissible iff it lies in
/// `[threshold, window - threshold]`.
pub struct ScheduleConstraint {
    param: String,
    threshold: i64,
    window: i64,
}

impl ScheduleConstraint {
    pub fn new(param: impl Into<String>, threshold: i64, window: i64) -> Self {
        Self {
            param: param.into(),
            threshold,
            window,
        }
    }
}

impl KnownConstraint for ScheduleConstraint {
    fn is_admissible(&self, point: &Point) -> Result<bool> {
        let t0 = require_int(point, &self.param)?;
        Ok(t0 >= self.threshold && t0 <= self.window - self.threshold)
    }
}

/// Conjunction of known constraints.
///
/// An empty conjunction admits every point.
#[derive(Default)]
pub struct Feasibility {
    constraints: Vec<Box<dyn KnownConstraint + Send + Sync>>,
}

impl Feasibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, constraint: impl KnownConstraint + Send + Sync + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Whether every constraint admits the candidate
    pub fn is_admissible(&self, point: &Point) -> Result<bool> {
        for constraint in &self.constraints {
            if !constraint.is_admissible(point)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Build the conjunction declared by the campaign settings.
    ///
    /// Constraints over dose-response curves require the `pharmacology`
    /// section; a schedule with a chronological threshold contributes a
    /// [ScheduleConstraint].
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut feasibility = Feasibility::new();
        for spec in &settings.constraints {
            let drugs = settings
                .pharmacology
                .as_ref()
                .ok_or_else(|| {
                    Error::InvalidConfiguration(
                        "dose-response constraints require a pharmacology section".to_string(),
                    )
                })?
                .drugs
                .clone();
            match spec {
                ConstraintSpec::Viability {
                    threshold,
                    admissible,
                } => {
                    feasibility =
                        feasibility.add(ViabilityConstraint::new(drugs, *threshold, *admissible));
                }
                ConstraintSpec::TotalConcentration {
                    threshold,
                    dilution,
                    admissible,
                } => {
                    feasibility = feasibility.add(TotalConcentrationConstraint::new(
                        drugs,
                        *threshold,
                        *dilution,
                        *admissible,
                    ));
                }
            }
        }
        if let Some(schedule) = &settings.schedule {
            if let Some(threshold) = schedule.threshold {
                feasibility = feasibility.add(ScheduleConstraint::new(
                    schedule.param.clone(),
                    threshold,
                    schedule.window,
                ));
            }
        }
        Ok(feasibility)
    }
}

impl KnownConstraint for Feasibility {
    fn is_admissible(&self, point: &Point) -> Result<bool> {
        Feasibility::is_admissible(self, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routines::datafile::Value;

    fn drugs() -> Vec<Drug> {
        vec![
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
        ]
    }

    fn point(conc0: f64, conc1: f64) -> Point {
        let mut point = Point::new();
        point.insert("conc0".to_string(), Value::Float(conc0));
        point.insert("conc1".to_string(), Value::Float(conc1));
        point
    }

    #[test]
    fn viability_is_product_of_per_drug_curves() {
        let drugs = drugs();
        let constraint = ViabilityConstraint::new(drugs.clone(), 0.3, Side::Above);
        let candidate = point(0.4, 0.7);

        let expected = drugs[0]
            .viability(drugs[0].inverse(0.4))
            .unwrap()
            * drugs[1].viability(drugs[1].inverse(0.7)).unwrap();
        let combined = constraint.viability(&candidate).unwrap();
        assert!((combined - expected).abs() < 1e-12);
    }

    #[test]
    fn viability_threshold_sides() {
        // Low doses leave viability near 1, high doses drive it down
        let permissive = ViabilityConstraint::new(drugs(), 0.5, Side::Above);
        assert!(permissive.is_admissible(&point(0.0, 0.0)).unwrap());
        assert!(!permissive.is_admissible(&point(1.0, 1.0)).unwrap());

        let lethal_only = ViabilityConstraint::new(drugs(), 0.5, Side::Below);
        assert!(!lethal_only.is_admissible(&point(0.0, 0.0)).unwrap());
        assert!(lethal_only.is_admissible(&point(1.0, 1.0)).unwrap());
    }

    #[test]
    fn viability_missing_parameter_is_an_error() {
        let constraint = ViabilityConstraint::new(drugs(), 0.3, Side::Above);
        let mut candidate = Point::new();
        candidate.insert("conc0".to_string(), Value::Float(0.5));
        assert!(matches!(
            constraint.is_admissible(&candidate),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn total_concentration_scales_with_dose() {
        let constraint = TotalConcentrationConstraint::new(drugs(), 0.33, 1.73, Side::Below);
        // At the lower bounds the stock fractions are tiny
        assert!(constraint.is_admissible(&point(0.0, 0.0)).unwrap());
        // At the upper bounds they exceed the threshold
        let total = constraint.total(&point(1.0, 1.0)).unwrap();
        assert!(total > 0.33);
        assert!(!constraint.is_admissible(&point(1.0, 1.0)).unwrap());
    }

    #[test]
    fn schedule_window_is_exact() {
        let constraint = ScheduleConstraint::new("t0", 12, 48);
        for t0 in 1..=48 {
            let mut candidate = Point::new();
            candidate.insert("t0".to_string(), Value::Int(t0));
            let admissible = constraint.is_admissible(&candidate).unwrap();
            assert_eq!(admissible, (12..=36).contains(&t0), "t0 = {}", t0);
        }
    }

    #[test]
    fn empty_feasibility_admits_everything() {
        let feasibility = Feasibility::new();
        assert!(feasibility.is_empty());
        assert!(feasibility.is_admissible(&point(0.5, 0.5)).unwrap());
    }

    #[test]
    fn conjunction_requires_all_members() {
        let feasibility = Feasibility::new()
            .add(ViabilityConstraint::new(drugs(), 0.5, Side::Above))
            .add(ScheduleConstraint::new("t0", 12, 48));

        let mut candidate = point(0.0, 0.0);
        candidate.insert("t0".to_string(), Value::Int(24));
        assert!(feasibility.is_admissible(&candidate).unwrap());

        candidate.insert("t0".to_string(), Value::Int(40));
        assert!(!feasibility.is_admissible(&candidate).unwrap());
    }
}
