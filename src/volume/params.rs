use slotmap::SlotMap;

use crate::geometry::SolidShape;
use crate::math::{Aabb, Transform};
use crate::units::UnitSystem;

use super::{Label, VolumeData, VolumeId};

slotmap::new_key_type! {
    /// Identifier of a placed volume instance.
    pub(crate) struct NodeId;
}

/// One placed instance of a logical volume.
#[derive(Debug, Clone)]
pub(crate) struct VolumeNode {
    pub volume: VolumeId,
    pub parent: Option<NodeId>,
    pub daughters: Vec<NodeId>,
    /// Maps the solid's canonical frame to the global frame, reflection
    /// included.
    pub transform: Transform,
    /// Global bounding box of the instance.
    pub bbox: Aabb,
}

/// Immutable geometry shared by all track views.
///
/// Lengths are stored in millimetres; accessors convert to the unit system
/// chosen at build time.
#[derive(Debug)]
pub struct GeometryParams {
    units: UnitSystem,
    volumes: Vec<VolumeData>,
    labels: Vec<Label>,
    nodes: SlotMap<NodeId, VolumeNode>,
    world: NodeId,
}

impl GeometryParams {
    pub(crate) fn new(
        units: UnitSystem,
        volumes: Vec<VolumeData>,
        nodes: SlotMap<NodeId, VolumeNode>,
        world: NodeId,
    ) -> Self {
        let labels = volumes.iter().map(VolumeData::canonical_label).collect();
        Self {
            units,
            volumes,
            labels,
            nodes,
            world,
        }
    }

    /// Unit system of every length accepted or returned.
    #[must_use]
    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// Bounding box of the world volume in external units.
    #[must_use]
    pub fn bbox(&self) -> Aabb {
        self.nodes[self.world]
            .bbox
            .scaled(1.0 / self.units.length_scale())
    }

    /// Number of logical volumes, including unplaced and reflected ones.
    #[must_use]
    pub fn num_volumes(&self) -> usize {
        self.volumes.len()
    }

    /// Number of placed volume instances.
    #[must_use]
    pub fn num_placed(&self) -> usize {
        self.nodes.len()
    }

    /// Canonical label of a volume; reflected copies report their source's
    /// name.
    #[must_use]
    pub fn id_to_label(&self, id: VolumeId) -> Option<&Label> {
        self.labels.get(id.index())
    }

    /// Looks up a volume by bare name or by `name@ext`. The first match in
    /// definition order wins.
    #[must_use]
    pub fn find_volume(&self, name: &str) -> Option<VolumeId> {
        self.labels
            .iter()
            .position(|l| l.name == name || (!l.ext.is_empty() && l.to_string() == name))
            .map(VolumeId::new)
    }

    /// Definition of a logical volume.
    #[must_use]
    pub fn volume(&self, id: VolumeId) -> Option<&VolumeData> {
        self.volumes.get(id.index())
    }

    pub(crate) fn world(&self) -> NodeId {
        self.world
    }

    pub(crate) fn node(&self, id: NodeId) -> &VolumeNode {
        &self.nodes[id]
    }

    pub(crate) fn solid(&self, node: &VolumeNode) -> &SolidShape {
        &self.volumes[node.volume.index()].solid
    }

    pub(crate) fn to_internal(&self, length: f64) -> f64 {
        self.units.to_internal(length)
    }

    pub(crate) fn to_external(&self, length: f64) -> f64 {
        self.units.to_external(length)
    }
}
