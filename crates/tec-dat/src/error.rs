//! Error types for tec-dat

use thiserror::Error;

/// Structural defect found while reading a Tecplot file.
///
/// The reader stops at the first defect; no partial mesh is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("missing variables")]
    MissingVariables,

    #[error("missing ZONE header")]
    MissingZone,

    #[error("missing N/E in zone header")]
    MissingDimensions,

    #[error("unsupported zone type: {0}")]
    UnsupportedZoneType(String),

    #[error("invalid VARLOCATION: {0}")]
    InvalidVarLocation(String),

    #[error("data underflow: {section} needs {needed} values, only {available} remain")]
    DataUnderflow {
        section: String,
        needed: usize,
        available: usize,
    },

    #[error("connectivity index {value} in element {element} is outside 1..={num_nodes}")]
    ConnectivityOutOfRange {
        element: usize,
        value: f64,
        num_nodes: usize,
    },
}
