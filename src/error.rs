use thiserror::Error;

use crate::volume::VolumeId;

/// Top-level error type for the geotrack navigation kernel.
#[derive(Debug, Error)]
pub enum GeotrackError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Errors raised while constructing solids, transforms, or the volume tree.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("transform is not orthonormal: {0}")]
    NotOrthonormal(String),

    #[error("volume {0} is not defined")]
    UnknownVolume(VolumeId),

    #[error("placement cycle through volume '{0}'")]
    PlacementCycle(String),
}

/// Caller contract violations reported by the track view.
///
/// These never depend on the geometry data: each one means the calling
/// transport loop issued an operation out of order.
#[derive(Debug, Error, PartialEq)]
pub enum NavigationError {
    #[error("track is outside the world volume")]
    Outside,

    #[error("no step has been computed since the last state change")]
    NoStepComputed,

    #[error("step of {distance} exceeds the computed limit {limit}")]
    StepTooLong { distance: f64, limit: f64 },

    #[error("invalid step distance {0}")]
    InvalidDistance(f64),

    #[error("track is not on a boundary")]
    NotOnBoundary,

    #[error("computed step does not end on a boundary")]
    NoBoundaryAhead,

    #[error("boundary was already crossed")]
    AlreadyCrossed,

    #[error("direction {0:?} is not a unit vector")]
    InvalidDirection([f64; 3]),

    #[error("position {0:?} is not finite")]
    InvalidPosition([f64; 3]),
}

/// Errors raised while rendering diagnostic output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize geometry output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`GeotrackError`].
pub type Result<T> = std::result::Result<T, GeotrackError>;
