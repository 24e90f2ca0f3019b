//! Dose-response transformations
//!
//! Closed-form pharmacological curves used by the feasibility predicates:
//! the Hill viability model and the inverse of the log-scale concentration
//! normalization the optimizer works in.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Map a normalized concentration back to real-world units.
///
/// The optimizer represents concentrations on a [0, 1] scale; the real
/// concentration is recovered by inverting the log-scale normalization:
/// `10^(x * (log10(high) - log10(low)) + log10(low))`.
///
/// The map is monotonic, with `x = 0` giving `low` and `x = 1` giving `high`.
/// Bounds must satisfy `0 < low < high`, which is enforced when the campaign
/// configuration is validated.
pub fn norm_conc_inverse(x: f64, low: f64, high: f64) -> f64 {
    let low_log = low.log10();
    let high_log = high.log10();
    10f64.powf(x * (high_log - low_log) + low_log)
}

/// Evaluate the Hill dose-response curve at concentration `c`.
///
/// `viability(c) = 1 + (emax - 1) / (1 + (ec50 / c)^h)`
///
/// At `c = ec50` the value is `(1 + emax) / 2` regardless of the slope `h`;
/// the curve tends to 1 as `c -> 0` and to `emax` as `c -> inf`.
///
/// A non-positive or non-finite concentration is outside the model domain
/// and returns [Error::NumericDomain]. Validated configurations cannot
/// produce one: a normalized value of 0 inverts to the lower concentration
/// bound, which is strictly positive.
pub fn hill(c: f64, emax: f64, h: f64, ec50: f64) -> Result<f64> {
    if !c.is_finite() || c <= 0.0 {
        return Err(Error::NumericDomain(format!(
            "concentration {} is outside the Hill model domain",
            c
        )));
    }
    let viability = 1.0 + (emax - 1.0) / ((ec50 / c).powf(h) + 1.0);
    if !viability.is_finite() {
        return Err(Error::NumericDomain(format!(
            "Hill curve diverged at concentration {}",
            c
        )));
    }
    Ok(viability)
}

/// One drug of the combination under study.
///
/// Carries the fitted Hill coefficients, the real-unit concentration bounds
/// used for log-scale normalization, and the stock concentration. The
/// original analysis scripts baked these values into each predicate; here
/// they are an explicit, immutable configuration value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drug {
    /// Drug name, for diagnostics only
    pub name: String,
    /// The normalized concentration parameter this drug is dosed by
    pub param: String,
    /// Maximal-effect viability (the lower plateau of the curve)
    pub emax: f64,
    /// Hill slope
    pub hill: f64,
    /// Half-maximal effective concentration, in real units
    pub ec50: f64,
    /// Lower concentration bound, in real units
    pub low: f64,
    /// Upper concentration bound, in real units
    pub high: f64,
    /// Stock concentration, in real units
    pub stock: f64,
}

impl Drug {
    /// Real-unit concentration for a normalized value in [0, 1]
    pub fn inverse(&self, normalized: f64) -> f64 {
        norm_conc_inverse(normalized, self.low, self.high)
    }

    /// Predicted viability at a real-unit concentration
    pub fn viability(&self, concentration: f64) -> Result<f64> {
        hill(concentration, self.emax, self.hill, self.ec50)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.param.is_empty() {
            return Err(Error::InvalidConfiguration(
                "drug name and parameter must be non-empty".to_string(),
            ));
        }
        if !(self.low > 0.0 && self.high > self.low) {
            return Err(Error::InvalidConfiguration(format!(
                "drug {}: concentration bounds must satisfy 0 < low < high, got [{}, {}]",
                self.name, self.low, self.high
            )));
        }
        if !(self.ec50 > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "drug {}: ec50 must be positive, got {}",
                self.name, self.ec50
            )));
        }
        if !(self.stock > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "drug {}: stock concentration must be positive, got {}",
                self.name, self.stock
            )));
        }
        if !self.emax.is_finite() || !self.hill.is_finite() {
            return Err(Error::InvalidConfiguration(format!(
                "drug {}: Hill coefficients must be finite",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn olaparib() -> Drug {
        Drug {
            name: "olaparib".to_string(),
            param: "conc0".to_string(),
            emax: 0.34,
            hill: 1.53,
            ec50: 123.0,
            low: 10.0,
            high: 1000.0,
            stock: 1000.0,
        }
    }

    #[test]
    fn inverse_transform_hits_bounds() {
        let drug = olaparib();
        assert!((drug.inverse(0.0) - 10.0).abs() < 1e-9);
        assert!((drug.inverse(1.0) - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn inverse_transform_is_monotonic() {
        let drug = olaparib();
        let mut previous = drug.inverse(0.0);
        for step in 1..=20 {
            let current = drug.inverse(step as f64 / 20.0);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn hill_at_ec50_is_midpoint() {
        for h in [0.5, 1.0, 1.53, 3.42] {
            let v = hill(123.0, 0.34, h, 123.0).unwrap();
            assert!((v - (1.0 + 0.34) / 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn hill_limits() {
        let drug = olaparib();
        let near_zero = drug.viability(drug.ec50 * 1e-9).unwrap();
        assert!((near_zero - 1.0).abs() < 1e-6);
        let saturated = drug.viability(drug.ec50 * 1e9).unwrap();
        assert!((saturated - drug.emax).abs() < 1e-6);
    }

    #[test]
    fn hill_rejects_nonpositive_concentration() {
        assert!(matches!(
            hill(0.0, 0.34, 1.53, 123.0),
            Err(Error::NumericDomain(_))
        ));
        assert!(matches!(
            hill(-1.0, 0.34, 1.53, 123.0),
            Err(Error::NumericDomain(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_bounds() {
        let mut drug = olaparib();
        drug.low = 0.0;
        assert!(matches!(
            drug.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
