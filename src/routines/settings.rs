//! Campaign settings
//!
//! The declarative configuration of one experiment campaign: the parameter
//! and objective schema handed to the recommender, the pharmacological fit
//! data behind the feasibility predicates, and the file/log/output knobs.
//!
//! Settings are read from a JSON configuration file (with `DOSELOOP_*`
//! environment overrides) or constructed in-process; either way they are
//! validated before a run starts.

use crate::constraints::response::Drug;
use crate::constraints::Side;
use crate::error::{Error, Result};
use config::Config as eConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Contains all settings for a campaign generation
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// General run configuration
    pub general: General,
    /// Parameters the recommender searches over
    pub parameters: Parameters,
    /// Objectives measured by the experiments
    pub objectives: Objectives,
    /// Fitted dose-response data, required by dose-response constraints
    pub pharmacology: Option<Pharmacology>,
    /// Declarative feasibility constraints
    pub constraints: Vec<ConstraintSpec>,
    /// Two-stage dosing schedule, if the campaign has one
    pub schedule: Option<Schedule>,
    /// File locations
    pub paths: Paths,
    /// Output configuration
    pub output: Output,
    /// Logging configuration
    pub log: Log,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            general: General::default(),
            parameters: Parameters::new(),
            objectives: Objectives::new(),
            pharmacology: None,
            constraints: Vec::new(),
            schedule: None,
            paths: Paths::default(),
            output: Output::default(),
            log: Log::default(),
        }
    }
}

impl Settings {
    /// Read and validate settings from a JSON configuration file.
    ///
    /// Values can be overridden through the environment, e.g.
    /// `DOSELOOP_GENERAL_GENERATION=5`.
    pub fn read(path: impl Into<String>) -> Result<Settings> {
        let settings_path = path.into();
        let parsed = eConfig::builder()
            .add_source(config::File::with_name(&settings_path).format(config::FileFormat::Json))
            .add_source(config::Environment::with_prefix("DOSELOOP").separator("_"))
            .build()?;
        let settings: Settings = parsed.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.names()
    }

    pub fn objective_names(&self) -> Vec<String> {
        self.objectives.names()
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.parameters.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least one parameter must be declared".to_string(),
            ));
        }
        if self.objectives.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least one objective must be declared".to_string(),
            ));
        }
        if self.general.sampling_strategies.is_empty() {
            return Err(Error::InvalidConfiguration(
                "at least one sampling strategy is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for parameter in self.parameters.iter() {
            if parameter.name.is_empty() {
                return Err(Error::InvalidConfiguration(
                    "parameter names must be non-empty".to_string(),
                ));
            }
            if !names.insert(parameter.name.clone()) {
                return Err(Error::InvalidConfiguration(format!(
                    "duplicate parameter name '{}'",
                    parameter.name
                )));
            }
            parameter.validate()?;
        }

        let mut objective_names = HashSet::new();
        for objective in self.objectives.iter() {
            if objective.name.is_empty() {
                return Err(Error::InvalidConfiguration(
                    "objective names must be non-empty".to_string(),
                ));
            }
            if !objective_names.insert(objective.name.clone()) {
                return Err(Error::InvalidConfiguration(format!(
                    "duplicate objective name '{}'",
                    objective.name
                )));
            }
        }

        if let Some(pharmacology) = &self.pharmacology {
            for drug in &pharmacology.drugs {
                drug.validate()?;
                match self.parameters.get(&drug.param) {
                    Some(parameter) if parameter.kind == ParameterType::Continuous => {}
                    Some(_) => {
                        return Err(Error::InvalidConfiguration(format!(
                            "drug {} is dosed by '{}', which is not a continuous parameter",
                            drug.name, drug.param
                        )))
                    }
                    None => {
                        return Err(Error::InvalidConfiguration(format!(
                            "drug {} is dosed by undeclared parameter '{}'",
                            drug.name, drug.param
                        )))
                    }
                }
            }
        }

        if !self.constraints.is_empty() && self.pharmacology.is_none() {
            return Err(Error::InvalidConfiguration(
                "dose-response constraints require a pharmacology section".to_string(),
            ));
        }

        if let Some(schedule) = &self.schedule {
            if self.parameters.get(&schedule.param).is_none() {
                return Err(Error::InvalidConfiguration(format!(
                    "schedule refers to undeclared parameter '{}'",
                    schedule.param
                )));
            }
            if schedule.window <= 0 {
                return Err(Error::InvalidConfiguration(format!(
                    "schedule window must be positive, got {}",
                    schedule.window
                )));
            }
            if let Some(threshold) = schedule.threshold {
                if threshold < 0 || threshold > schedule.window - threshold {
                    return Err(Error::InvalidConfiguration(format!(
                        "schedule threshold {} leaves no admissible window of {}",
                        threshold, schedule.window
                    )));
                }
            }
        }

        Ok(())
    }
}

/// General run configuration
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct General {
    /// Generation tag, used in the output filename and the `gen` column
    pub generation: u32,
    /// Seed for the recommender
    pub seed: u32,
    /// Explore/exploit balances, one recommended candidate per entry
    pub sampling_strategies: Vec<f64>,
}

impl Default for General {
    fn default() -> Self {
        General {
            generation: 0,
            seed: 23,
            sampling_strategies: Vec::new(),
        }
    }
}

/// The parameter type understood by the recommender
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Continuous,
    Discrete,
    Categorical,
}

/// One declared parameter
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    /// Lower bound (continuous and discrete)
    #[serde(default)]
    pub low: f64,
    /// Upper bound (continuous and discrete)
    #[serde(default)]
    pub high: f64,
    /// Category set (categorical)
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Parameter {
    fn validate(&self) -> Result<()> {
        match self.kind {
            ParameterType::Continuous => {
                if !(self.low.is_finite() && self.high.is_finite() && self.low < self.high) {
                    return Err(Error::InvalidConfiguration(format!(
                        "parameter {}: continuous bounds must satisfy low < high, got [{}, {}]",
                        self.name, self.low, self.high
                    )));
                }
            }
            ParameterType::Discrete => {
                if self.low.fract() != 0.0 || self.high.fract() != 0.0 {
                    return Err(Error::InvalidConfiguration(format!(
                        "parameter {}: discrete bounds must be integral, got [{}, {}]",
                        self.name, self.low, self.high
                    )));
                }
                if self.low > self.high {
                    return Err(Error::InvalidConfiguration(format!(
                        "parameter {}: discrete bounds must satisfy low <= high, got [{}, {}]",
                        self.name, self.low, self.high
                    )));
                }
            }
            ParameterType::Categorical => {
                if self.categories.is_empty() {
                    return Err(Error::InvalidConfiguration(format!(
                        "parameter {}: category set must be non-empty",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The ordered parameter schema
#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(transparent)]
pub struct Parameters {
    parameters: Vec<Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Parameters {
            parameters: Vec::new(),
        }
    }

    pub fn add_continuous(mut self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            kind: ParameterType::Continuous,
            low,
            high,
            categories: Vec::new(),
        });
        self
    }

    pub fn add_discrete(mut self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            kind: ParameterType::Discrete,
            low: low as f64,
            high: high as f64,
            categories: Vec::new(),
        });
        self
    }

    pub fn add_categorical<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            kind: ParameterType::Categorical,
            low: 0.0,
            high: 0.0,
            categories: categories.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|parameter| parameter.name.clone())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// The optimization goal of an objective
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Min,
    Max,
}

/// One declared objective
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct Objective {
    pub name: String,
    pub goal: Goal,
    #[serde(default)]
    pub tolerance: f64,
    #[serde(default)]
    pub absolute: bool,
}

/// The ordered objective schema; order matters to the recommender
#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(transparent)]
pub struct Objectives {
    objectives: Vec<Objective>,
}

impl Objectives {
    pub fn new() -> Self {
        Objectives {
            objectives: Vec::new(),
        }
    }

    pub fn add(mut self, name: impl Into<String>, goal: Goal, tolerance: f64, absolute: bool) -> Self {
        self.objectives.push(Objective {
            name: name.into(),
            goal,
            tolerance,
            absolute,
        });
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.objectives
            .iter()
            .map(|objective| objective.name.clone())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Objective> {
        self.objectives.iter()
    }

    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }
}

/// Fitted dose-response data for the drug combination
#[derive(Debug, Deserialize, Clone, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Pharmacology {
    pub drugs: Vec<Drug>,
}

/// A declarative feasibility constraint
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintSpec {
    /// Combined Hill viability against a threshold
    Viability { threshold: f64, admissible: Side },
    /// Stock-normalized total concentration against a threshold
    TotalConcentration {
        threshold: f64,
        dilution: f64,
        admissible: Side,
    },
}

/// Two-stage dosing schedule configuration
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Schedule {
    /// Time-of-addition parameter, e.g. `t0`
    pub param: String,
    /// Total assay window, in hours
    pub window: i64,
    /// Chronological margin; when present, `t0` must lie in
    /// `[threshold, window - threshold]`
    #[serde(default)]
    pub threshold: Option<i64>,
    /// Name of the derived complement column (`window - t0`), e.g. `t1`
    #[serde(default)]
    pub derived: Option<String>,
}

/// File locations
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Paths {
    /// The observation table of past experiments
    pub data: String,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            data: "data.csv".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Output {
    /// Whether to rotate a backup copy of the observation file before
    /// writing. One campaign variant runs with this disabled.
    pub backup: bool,
}

impl Default for Output {
    fn default() -> Self {
        Output { backup: true }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Log {
    /// Log level, defaults to `info`
    pub level: String,
    /// Optional log file, truncated at startup
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Settings {
        Settings {
            general: General {
                generation: 1,
                seed: 42,
                sampling_strategies: vec![0.5],
            },
            parameters: Parameters::new().add_continuous("conc0", 0.0, 1.0),
            objectives: Objectives::new().add("cv", Goal::Min, 0.4, true),
            ..Settings::default()
        }
    }

    #[test]
    fn minimal_settings_validate() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn empty_parameters_are_rejected() {
        let mut settings = minimal();
        settings.parameters = Parameters::new();
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let mut settings = minimal();
        settings.parameters = Parameters::new()
            .add_continuous("conc0", 0.0, 1.0)
            .add_continuous("conc0", 0.0, 1.0);
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut settings = minimal();
        settings.parameters = Parameters::new().add_continuous("conc0", 1.0, 0.0);
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn constraints_require_pharmacology() {
        let mut settings = minimal();
        settings.constraints = vec![ConstraintSpec::Viability {
            threshold: 0.3,
            admissible: Side::Above,
        }];
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn schedule_threshold_must_leave_a_window() {
        let mut settings = minimal();
        settings.parameters = Parameters::new()
            .add_continuous("conc0", 0.0, 1.0)
            .add_discrete("t0", 1, 47);
        settings.schedule = Some(Schedule {
            param: "t0".to_string(),
            window: 48,
            threshold: Some(30),
            derived: None,
        });
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn settings_serialize_to_json() {
        let json = serde_json::to_string(&minimal()).unwrap();
        assert!(json.contains("\"general\""));
        assert!(json.contains("\"parameters\""));
        let deserialized: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.general.generation, 1);
    }
}
