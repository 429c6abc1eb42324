use std::fmt;

use crate::model::Side;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error in the recon config.
    ConfigParse(String),
    /// Config validation error (empty field name, bad sheet name, etc.).
    ConfigValidation(String),
    /// One of the two record sets was never loaded.
    MissingInput { side: Side },
    /// TOML parse / deserialization error in a decisions file.
    DecisionsParse(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingInput { side } => {
                write!(f, "{side} record set is missing")
            }
            Self::DecisionsParse(msg) => write!(f, "decisions parse error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
