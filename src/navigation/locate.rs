//! Resolution of the placed volume that owns a point, given the direction
//! the track is heading.
//!
//! Surface points are assigned to whichever volume the ray goes into, so a
//! track sitting exactly on a shared surface always ends up in the volume
//! its next step travels through.

use crate::geometry::Solid;
use crate::math::{surface_tolerance, Point3, Vector3};
use crate::volume::{GeometryParams, NodeId};

/// Whether the ray at `pos` heads into the solid of `node`.
fn enters(params: &GeometryParams, node: NodeId, pos: &Point3, dir: &Vector3) -> bool {
    let n = params.node(node);
    params.solid(n).enters(
        &n.transform.to_local_point(pos),
        &n.transform.to_local_dir(dir),
    )
}

/// Descends from `start` into the innermost daughter the ray goes into.
pub(crate) fn descend(
    params: &GeometryParams,
    start: NodeId,
    pos: &Point3,
    dir: &Vector3,
) -> NodeId {
    let mut current = start;
    'levels: loop {
        for &daughter in &params.node(current).daughters {
            let bbox = &params.node(daughter).bbox;
            if bbox.contains(pos, surface_tolerance(bbox.max_extent()))
                && enters(params, daughter, pos, dir)
            {
                current = daughter;
                continue 'levels;
            }
        }
        return current;
    }
}

/// Finds the placed volume for an absolute position, or `None` outside the
/// world.
pub(crate) fn locate(params: &GeometryParams, pos: &Point3, dir: &Vector3) -> Option<NodeId> {
    let world = params.world();
    enters(params, world, pos, dir).then(|| descend(params, world, pos, dir))
}

/// Resolves the volume entered after stopping on a boundary of `from`.
///
/// The track stays in `from` (descending into any daughter it goes into)
/// unless it heads out along the outward normal by more than the
/// tolerance; otherwise each ancestor is tried in turn. Leaving the world
/// yields `None`.
pub(crate) fn cross(
    params: &GeometryParams,
    from: NodeId,
    pos: &Point3,
    dir: &Vector3,
) -> Option<NodeId> {
    let mut current = Some(from);
    while let Some(node) = current {
        if enters(params, node, pos, dir) {
            return Some(descend(params, node, pos, dir));
        }
        current = params.node(node).parent;
    }
    None
}
