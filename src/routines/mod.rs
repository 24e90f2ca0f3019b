// Routines for ingesting tabular experiment data
pub mod datafile;
// Routines for logging
pub mod logger;
// Routines for output
pub mod output;
// Routines for candidate recommendation
pub mod recommend;
// Routines for settings
pub mod settings;
