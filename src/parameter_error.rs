//! Error handling for chain and option loaders

use std::io;
use thiserror::Error;

/// Unified error to report failures during both YAML and URDF/XACRO parsing.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("IO Error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("Missing Field: {0}")]
    MissingField(String),

    #[error("Wrong angle representation: {0}")]
    WrongAngle(String),

    #[error("Invalid Length: expected {expected}, found {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("XML Processing Error: {0}")]
    XmlProcessingError(String),

    /// Only joints rotating about a single principal axis are supported.
    #[error("Unsupported joint axis: {0}")]
    UnsupportedAxis(String),

    #[error("Kinematics Configuration Error: {0}")]
    KinematicsConfigurationError(String),
}
