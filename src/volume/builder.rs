use std::sync::Arc;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::error::{GeometryError, Result};
use crate::geometry::{Solid, SolidShape};
use crate::math::{surface_tolerance, Transform};
use crate::units::GeometryOptions;

use super::{
    GeometryParams, Label, NodeId, Placement, Reflection, VolumeData, VolumeId, VolumeNode,
    REFLECTED_SUFFIX,
};

/// Collects volume definitions and placements, then expands them into a
/// [`GeometryParams`].
///
/// Every length passed in is in the unit system of the builder's
/// [`GeometryOptions`].
#[derive(Debug, Default)]
pub struct GeometryBuilder {
    options: GeometryOptions,
    volumes: Vec<VolumeData>,
}

/// Visit state for the placement cycle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Open,
    Done,
}

impl GeometryBuilder {
    #[must_use]
    pub fn new(options: GeometryOptions) -> Self {
        Self {
            options,
            volumes: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &GeometryOptions {
        &self.options
    }

    /// Defines a new logical volume and returns its ID.
    pub fn add_volume(
        &mut self,
        label: impl Into<Label>,
        shape: impl Into<SolidShape>,
    ) -> VolumeId {
        let shape = shape.into().scaled(self.options.units.length_scale());
        self.push(VolumeData {
            label: label.into(),
            solid: Arc::new(shape),
            reflection: Reflection::Direct,
            daughters: Vec::new(),
        })
    }

    /// Defines the mirror image of `source` through `mirror`.
    ///
    /// The new volume shares the source's solid and copies its current
    /// daughter placements; its name gets a `_refl` suffix, which is
    /// stripped again by [`GeometryParams::id_to_label`].
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is unknown or already reflected, or if
    /// `mirror` is not an improper transform.
    pub fn add_reflected(&mut self, source: VolumeId, mirror: &Transform) -> Result<VolumeId> {
        if !mirror.is_reflection() {
            return Err(GeometryError::Degenerate(
                "mirror transform does not reverse handedness".into(),
            )
            .into());
        }
        let src = self.volume(source)?;
        if src.reflection.is_reflected() {
            return Err(GeometryError::Degenerate(format!(
                "volume '{}' is already a reflection",
                src.label
            ))
            .into());
        }
        let data = VolumeData {
            label: Label::with_ext(
                format!("{}{REFLECTED_SUFFIX}", src.label.name),
                src.label.ext.clone(),
            ),
            solid: Arc::clone(&src.solid),
            reflection: Reflection::Reflected(mirror.scaled(self.options.units.length_scale())),
            daughters: src.daughters.clone(),
        };
        Ok(self.push(data))
    }

    /// Places `daughter` inside `mother`.
    ///
    /// # Errors
    ///
    /// Returns an error if either volume is unknown or if a volume is
    /// placed inside itself.
    pub fn place(
        &mut self,
        mother: VolumeId,
        daughter: VolumeId,
        transform: &Transform,
    ) -> Result<()> {
        self.volume(daughter)?;
        if mother == daughter {
            let label = self.volume(mother)?.label.to_string();
            return Err(GeometryError::PlacementCycle(label).into());
        }
        let transform = transform.scaled(self.options.units.length_scale());
        let mother = self
            .volumes
            .get_mut(mother.index())
            .ok_or(GeometryError::UnknownVolume(mother))?;
        mother.daughters.push(Placement { daughter, transform });
        Ok(())
    }

    /// Expands the volume hierarchy below `world` into placed instances.
    ///
    /// # Errors
    ///
    /// Returns an error if `world` is unknown or the placements form a cycle.
    pub fn build(self, world: VolumeId) -> Result<GeometryParams> {
        self.volume(world)?;
        self.check_acyclic(world)?;

        let mut nodes: SlotMap<NodeId, VolumeNode> = SlotMap::with_key();
        let mut placed = vec![false; self.volumes.len()];

        let world_transform = Self::reflection_of(&self.volumes[world.index()]);
        let world_node = nodes.insert(VolumeNode {
            volume: world,
            parent: None,
            daughters: Vec::new(),
            bbox: world_transform.to_parent_bbox(&self.volumes[world.index()].solid.bounding_box()),
            transform: world_transform,
        });
        placed[world.index()] = true;

        let extrusions = if self.options.check_extrusion {
            self.check_extrusions()
        } else {
            0
        };
        let mut stack = vec![world_node];
        while let Some(node_id) = stack.pop() {
            let (volume, frame) = {
                let node = &nodes[node_id];
                (node.volume, node.transform.clone())
            };
            let mother = &self.volumes[volume.index()];
            let mut children = Vec::with_capacity(mother.daughters.len());
            for placement in &mother.daughters {
                let daughter = &self.volumes[placement.daughter.index()];
                let local = placement.transform.then(&Self::reflection_of(daughter));
                let transform = frame.then(&local);
                let child = nodes.insert(VolumeNode {
                    volume: placement.daughter,
                    parent: Some(node_id),
                    daughters: Vec::new(),
                    bbox: transform.to_parent_bbox(&daughter.solid.bounding_box()),
                    transform,
                });
                placed[placement.daughter.index()] = true;
                children.push(child);
            }
            stack.extend(children.iter().rev().copied());
            nodes[node_id].daughters = children;
        }

        for (data, was_placed) in self.volumes.iter().zip(&placed) {
            if !was_placed {
                warn!(volume = %data.label, "volume is defined but never placed");
            }
        }

        debug!(
            volumes = self.volumes.len(),
            placed = nodes.len(),
            extrusions,
            world = %self.volumes[world.index()].label,
            "built geometry"
        );

        Ok(GeometryParams::new(
            self.options.units,
            self.volumes,
            nodes,
            world_node,
        ))
    }

    fn push(&mut self, data: VolumeData) -> VolumeId {
        let id = VolumeId::new(self.volumes.len());
        self.volumes.push(data);
        id
    }

    fn volume(&self, id: VolumeId) -> Result<&VolumeData> {
        self.volumes
            .get(id.index())
            .ok_or_else(|| GeometryError::UnknownVolume(id).into())
    }

    fn reflection_of(data: &VolumeData) -> Transform {
        match &data.reflection {
            Reflection::Direct => Transform::identity(),
            Reflection::Reflected(mirror) => mirror.clone(),
        }
    }

    /// Warns once per placement whose daughter bounding box is not inside
    /// the mother's, both taken in the mother's frame.
    fn check_extrusions(&self) -> usize {
        let mut count = 0;
        for mother in &self.volumes {
            let mother_bbox = mother.solid.bounding_box();
            let tol = surface_tolerance(mother_bbox.max_extent());
            for placement in &mother.daughters {
                let daughter = &self.volumes[placement.daughter.index()];
                let local = placement.transform.then(&Self::reflection_of(daughter));
                let bbox = local.to_parent_bbox(&daughter.solid.bounding_box());
                if !mother_bbox.encloses(&bbox, tol) {
                    count += 1;
                    warn!(
                        daughter = %daughter.label,
                        mother = %mother.label,
                        "daughter bounding box extends outside its mother"
                    );
                }
            }
        }
        count
    }

    /// Depth-first walk over the placement graph, without recursion.
    fn check_acyclic(&self, world: VolumeId) -> Result<()> {
        let mut marks = vec![Mark::Unvisited; self.volumes.len()];
        let mut stack: Vec<(VolumeId, usize)> = vec![(world, 0)];
        marks[world.index()] = Mark::Open;
        while let Some(top) = stack.last_mut() {
            let (volume, next) = *top;
            top.1 += 1;
            if let Some(placement) = self.volumes[volume.index()].daughters.get(next) {
                let child = placement.daughter;
                match marks[child.index()] {
                    Mark::Open => {
                        return Err(GeometryError::PlacementCycle(
                            self.volumes[child.index()].label.to_string(),
                        )
                        .into());
                    }
                    Mark::Unvisited => {
                        marks[child.index()] = Mark::Open;
                        stack.push((child, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[volume.index()] = Mark::Done;
                stack.pop();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::GeotrackError;
    use crate::geometry::{Cuboid, Sphere};
    use crate::math::Vector3;
    use crate::testing::capture_logs;
    use crate::units::UnitSystem;
    use tracing::Level;

    fn cm() -> GeometryBuilder {
        GeometryBuilder::new(GeometryOptions::default())
    }

    #[test]
    fn shapes_and_placements_are_scaled_to_mm() {
        let mut b = cm();
        let ball = b.add_volume("Ball", Sphere::new(1.0).unwrap());
        let world = b.add_volume("World", Cuboid::new(5.0, 5.0, 5.0).unwrap());
        b.place(world, ball, &Transform::translation(2.0, 0.0, 0.0)).unwrap();
        let geo = b.build(world).unwrap();
        let world_node = geo.node(geo.world());
        let ball_node = geo.node(world_node.daughters[0]);
        assert!((ball_node.bbox.min.x - 10.0).abs() < 1e-12);
        assert!((ball_node.bbox.max.x - 30.0).abs() < 1e-12);
        assert!((geo.bbox().max.x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_volume_is_rejected() {
        let mut b = cm();
        let world = b.add_volume("World", Cuboid::new(5.0, 5.0, 5.0).unwrap());
        let err = b
            .place(world, VolumeId::new(7), &Transform::identity())
            .unwrap_err();
        assert!(matches!(
            err,
            GeotrackError::Geometry(GeometryError::UnknownVolume(id)) if id == VolumeId::new(7)
        ));
        assert!(b.build(VolumeId::new(3)).is_err());
    }

    #[test]
    fn placement_cycle_is_rejected() {
        let mut b = cm();
        let a = b.add_volume("A", Cuboid::new(5.0, 5.0, 5.0).unwrap());
        let c = b.add_volume("C", Cuboid::new(4.0, 4.0, 4.0).unwrap());
        assert!(b.place(a, a, &Transform::identity()).is_err());
        b.place(a, c, &Transform::identity()).unwrap();
        b.place(c, a, &Transform::identity()).unwrap();
        let err = b.build(a).unwrap_err();
        assert!(matches!(
            err,
            GeotrackError::Geometry(GeometryError::PlacementCycle(_))
        ));
    }

    #[test]
    fn shared_daughter_is_not_a_cycle() {
        let mut b = GeometryBuilder::new(GeometryOptions::with_units(UnitSystem::Clhep));
        let leaf = b.add_volume("Leaf", Sphere::new(1.0).unwrap());
        let mid = b.add_volume("Mid", Cuboid::new(2.0, 2.0, 2.0).unwrap());
        let world = b.add_volume("World", Cuboid::new(10.0, 10.0, 10.0).unwrap());
        b.place(mid, leaf, &Transform::identity()).unwrap();
        b.place(world, mid, &Transform::translation(-5.0, 0.0, 0.0)).unwrap();
        b.place(world, mid, &Transform::translation(5.0, 0.0, 0.0)).unwrap();
        b.place(world, leaf, &Transform::translation(0.0, 5.0, 0.0)).unwrap();
        let geo = b.build(world).unwrap();
        assert_eq!(geo.num_placed(), 6);
    }

    #[test]
    fn reflected_volume_shares_solid() {
        let mut b = cm();
        let arm = b.add_volume(Label::with_ext("Arm", "0x1"), Cuboid::new(1.0, 1.0, 1.0).unwrap());
        let mirror = Transform::reflection(Vector3::x()).unwrap();
        let refl = b.add_reflected(arm, &mirror).unwrap();
        assert!(b.add_reflected(arm, &Transform::identity()).is_err());
        assert!(b.add_reflected(refl, &mirror).is_err());
        let world = b.add_volume("World", Cuboid::new(5.0, 5.0, 5.0).unwrap());
        b.place(world, arm, &Transform::translation(-2.0, 0.0, 0.0)).unwrap();
        b.place(world, refl, &Transform::translation(2.0, 0.0, 0.0)).unwrap();
        let geo = b.build(world).unwrap();

        let label = geo.id_to_label(refl).unwrap();
        assert_eq!(label.name, "Arm");
        assert_eq!(label.ext, "0x1");
        assert_eq!(geo.volume(refl).unwrap().label.name, "Arm_refl");
        assert!(Arc::ptr_eq(
            &geo.volume(arm).unwrap().solid,
            &geo.volume(refl).unwrap().solid
        ));
        assert_eq!(geo.find_volume("Arm"), Some(arm));
    }

    #[test]
    fn clean_build_emits_no_warnings() {
        let (result, events) = capture_logs(|| {
            let mut b = cm();
            let inner = b.add_volume("Inner", Sphere::new(1.0).unwrap());
            let world = b.add_volume("World", Cuboid::new(5.0, 5.0, 5.0).unwrap());
            b.place(world, inner, &Transform::identity()).unwrap();
            b.build(world)
        });
        assert!(result.is_ok());
        assert!(events.iter().all(|(level, _)| *level != Level::WARN));
        assert!(events
            .iter()
            .any(|(level, msg)| *level == Level::DEBUG && msg.contains("built geometry")));
    }

    #[test]
    fn extrusion_and_unplaced_volumes_warn() {
        let (result, events) = capture_logs(|| {
            let mut b = cm();
            let big = b.add_volume("Big", Cuboid::new(3.0, 3.0, 3.0).unwrap());
            let _orphan = b.add_volume("Orphan", Sphere::new(1.0).unwrap());
            let world = b.add_volume("World", Cuboid::new(5.0, 5.0, 5.0).unwrap());
            b.place(world, big, &Transform::translation(4.0, 0.0, 0.0)).unwrap();
            b.build(world)
        });
        assert!(result.is_ok());
        let warnings: Vec<_> = events
            .iter()
            .filter(|(level, _)| *level == Level::WARN)
            .map(|(_, msg)| msg.as_str())
            .collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|m| m.contains("extends outside") && m.contains("Big")));
        assert!(warnings.iter().any(|m| m.contains("never placed") && m.contains("Orphan")));
    }

    #[test]
    fn extrusion_check_can_be_disabled() {
        let (_, events) = capture_logs(|| {
            let mut b = GeometryBuilder::new(GeometryOptions {
                check_extrusion: false,
                ..GeometryOptions::default()
            });
            let big = b.add_volume("Big", Cuboid::new(3.0, 3.0, 3.0).unwrap());
            let world = b.add_volume("World", Cuboid::new(5.0, 5.0, 5.0).unwrap());
            b.place(world, big, &Transform::translation(4.0, 0.0, 0.0)).unwrap();
            b.build(world)
        });
        assert!(events.iter().all(|(level, _)| *level != Level::WARN));
    }
}
