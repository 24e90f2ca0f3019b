//! Error types for doseloop

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// doseloop error types
#[derive(Error, Debug)]
pub enum Error {
    /// The campaign configuration is inconsistent or incomplete
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A numeric operation left its mathematical domain
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    /// The observation file extension is neither csv nor xls/xlsx
    #[error("unsupported observation file format: {0}")]
    UnsupportedFormat(String),

    /// A declared column is absent from a table or candidate point
    #[error("column '{0}' not found")]
    MissingColumn(String),

    /// The feasibility predicate rejected every drawn candidate
    #[error("no admissible candidate found after {attempts} draws")]
    InfeasibleRegion {
        /// Number of rejected draws before giving up
        attempts: u32,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet error
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Configuration file error
    #[error("configuration file error: {0}")]
    Config(#[from] config::ConfigError),
}
