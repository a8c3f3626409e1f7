pub mod error;
pub mod geometry;
pub mod math;
pub mod navigation;
pub mod units;
pub mod volume;

#[cfg(test)]
mod testing;

pub use error::{GeometryError, GeotrackError, NavigationError, OutputError, Result};
pub use navigation::{BoundarySide, NavStatus, Step, TrackView};
pub use units::{GeometryOptions, UnitSystem};
pub use volume::{GeoParamsOutput, GeometryBuilder, GeometryParams, Label, VolumeId};
