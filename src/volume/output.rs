use serde::Serialize;

use crate::error::{OutputError, Result};

use super::{GeometryParams, VolumeId};

/// Diagnostic summary of a built geometry.
#[derive(Debug, Clone, Serialize)]
pub struct GeoParamsOutput {
    /// World bounding box in external units, `[lower, upper]`.
    pub bbox: [[f64; 3]; 2],
    pub supports_safety: bool,
    pub volumes: VolumeLabels,
}

/// Canonical volume labels indexed by [`VolumeId`].
#[derive(Debug, Clone, Serialize)]
pub struct VolumeLabels {
    pub label: Vec<String>,
}

impl GeoParamsOutput {
    #[must_use]
    pub fn new(params: &GeometryParams) -> Self {
        let bbox = params.bbox();
        let label = (0..params.num_volumes())
            .filter_map(|i| params.id_to_label(VolumeId::new(i)))
            .map(ToString::to_string)
            .collect();
        Self {
            bbox: [bbox.min.coords.into(), bbox.max.coords.into()],
            supports_safety: true,
            volumes: VolumeLabels { label },
        }
    }

    /// Renders the summary as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self).map_err(OutputError::from)?)
    }
}
