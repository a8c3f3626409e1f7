//! Length units at the API boundary.
//!
//! Everything inside the crate is stored in millimetres. Builder inputs and
//! track-view arguments are converted on the way in, results on the way out.

use serde::Serialize;

/// Unit system used by callers for lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Centimetres.
    #[default]
    Cgs,
    /// Metres.
    Si,
    /// Millimetres, the internal unit.
    Clhep,
}

impl UnitSystem {
    /// Number of internal units (mm) in one external length unit.
    #[must_use]
    pub fn length_scale(self) -> f64 {
        match self {
            UnitSystem::Cgs => 10.0,
            UnitSystem::Si => 1000.0,
            UnitSystem::Clhep => 1.0,
        }
    }

    /// Converts an external length to millimetres.
    #[must_use]
    pub fn to_internal(self, length: f64) -> f64 {
        length * self.length_scale()
    }

    /// Converts a length in millimetres to the external unit.
    #[must_use]
    pub fn to_external(self, length: f64) -> f64 {
        length / self.length_scale()
    }
}

/// Options fixed when the geometry is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryOptions {
    /// Units for every length passed in or returned.
    pub units: UnitSystem,
    /// Warn when a daughter's bounding box pokes out of its mother's.
    pub check_extrusion: bool,
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            units: UnitSystem::Cgs,
            check_extrusion: true,
        }
    }
}

impl GeometryOptions {
    #[must_use]
    pub fn with_units(units: UnitSystem) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }
}
