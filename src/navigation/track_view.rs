use crate::error::{NavigationError, Result};
use crate::geometry::Solid;
use crate::math::{is_soft_unit_vector, surface_tolerance, Point3, Vector3};
use crate::volume::{GeometryParams, NodeId, VolumeId};

use super::locate;
use super::state::{BoundarySide, NavState, NavStatus, Step, Transition};

/// Navigation view of one track through a shared geometry.
///
/// Lengths passed in and returned use the geometry's unit system.
/// Operations that need a current volume fail with
/// [`NavigationError::Outside`] once the track has left the world.
#[derive(Debug, Clone)]
pub struct TrackView<'a> {
    params: &'a GeometryParams,
    state: NavState,
}

impl<'a> TrackView<'a> {
    /// Creates a view and locates `pos`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is not finite or `dir` is not a unit
    /// vector.
    pub fn new(params: &'a GeometryParams, pos: Point3, dir: Vector3) -> Result<Self> {
        let mut view = Self {
            params,
            state: NavState::outside(pos, dir),
        };
        view.initialize(pos, dir)?;
        Ok(view)
    }

    /// Relocates the track from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if `pos` is not finite or `dir` is not a unit
    /// vector.
    pub fn initialize(&mut self, pos: Point3, dir: Vector3) -> Result<()> {
        check_position(&pos)?;
        check_direction(&dir)?;
        let pos = self.to_internal_point(&pos);
        let node = locate::locate(self.params, &pos, &dir);
        self.state.apply(Transition::Locate { pos, dir, node });
        Ok(())
    }

    /// Distance to the next boundary along the current direction, or
    /// `max_step` if none is closer.
    ///
    /// The result is cached; calling again with the same or a larger limit
    /// reuses a cached boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the track is outside or `max_step` is not
    /// positive.
    pub fn find_next_step(&mut self, max_step: f64) -> Result<Step> {
        let node = self.current_node()?;
        if max_step.is_nan() || max_step <= 0.0 {
            return Err(NavigationError::InvalidDistance(max_step).into());
        }
        let limit = self.params.to_internal(max_step);
        if let Some(cached) = self.state.next_step() {
            if cached.boundary && cached.distance <= limit {
                return Ok(self.to_external_step(cached));
            }
        }
        let step = self.compute_step(node, limit);
        self.state.cache_step(step);
        Ok(self.to_external_step(step))
    }

    /// Lower bound on the distance to any boundary, capped at `max_safety`.
    ///
    /// # Errors
    ///
    /// Returns an error if the track is outside or `max_safety` is negative.
    pub fn find_safety(&self, max_safety: f64) -> Result<f64> {
        let node_id = self.current_node()?;
        if max_safety.is_nan() || max_safety < 0.0 {
            return Err(NavigationError::InvalidDistance(max_safety).into());
        }
        if self.state.boundary().is_some() {
            return Ok(0.0);
        }
        let pos = self.state.pos();
        let node = self.params.node(node_id);
        let mut safety = self
            .params
            .solid(node)
            .safety_to_out(&node.transform.to_local_point(pos))
            .min(self.params.to_internal(max_safety));
        for &daughter in &node.daughters {
            let dn = self.params.node(daughter);
            if dn.bbox.distance_lower_bound(pos) >= safety {
                continue;
            }
            let s = self
                .params
                .solid(dn)
                .safety_to_in(&dn.transform.to_local_point(pos));
            safety = safety.min(s);
        }
        Ok(self.params.to_external(safety.max(0.0)))
    }

    /// Moves along the current direction without reaching a boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if no step was computed since the last state
    /// change, or if `distance` is negative or would reach the computed
    /// boundary (or exceed the computed limit).
    pub fn move_internal(&mut self, distance: f64) -> Result<()> {
        self.current_node()?;
        if !distance.is_finite() || distance < 0.0 {
            return Err(NavigationError::InvalidDistance(distance).into());
        }
        let next = self.state.next_step().ok_or(NavigationError::NoStepComputed)?;
        let d = self.params.to_internal(distance);
        let too_long = if next.boundary {
            d >= next.distance
        } else {
            d > next.distance + surface_tolerance(next.distance)
        };
        if too_long {
            return Err(NavigationError::StepTooLong {
                distance,
                limit: self.params.to_external(next.distance),
            }
            .into());
        }
        let pos = self.state.pos() + self.state.dir() * d;
        self.state.apply(Transition::Move {
            pos,
            boundary: None,
        });
        Ok(())
    }

    /// Jumps to `pos`, which the caller guarantees lies in the current
    /// volume and not on any of its boundaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the track is outside or `pos` is not finite.
    pub fn move_internal_to(&mut self, pos: Point3) -> Result<()> {
        self.current_node()?;
        check_position(&pos)?;
        let pos = self.to_internal_point(&pos);
        self.state.apply(Transition::Move {
            pos,
            boundary: None,
        });
        Ok(())
    }

    /// Moves exactly onto the boundary found by the last
    /// [`find_next_step`](Self::find_next_step).
    ///
    /// # Errors
    ///
    /// Returns an error if no step was computed or it does not end on a
    /// boundary.
    pub fn move_to_boundary(&mut self) -> Result<()> {
        self.current_node()?;
        let next = self.state.next_step().ok_or(NavigationError::NoStepComputed)?;
        if !next.boundary {
            return Err(NavigationError::NoBoundaryAhead.into());
        }
        let pos = self.state.pos() + self.state.dir() * next.distance;
        self.state.apply(Transition::Move {
            pos,
            boundary: Some(BoundarySide::Exiting),
        });
        Ok(())
    }

    /// Resolves the volume on the far side of the boundary the track sits
    /// on.
    ///
    /// # Errors
    ///
    /// Returns an error if the track is not on a boundary it has yet to
    /// cross.
    pub fn cross_boundary(&mut self) -> Result<()> {
        let node = self.current_node()?;
        match self.state.boundary() {
            None => return Err(NavigationError::NotOnBoundary.into()),
            Some(BoundarySide::Entered) => return Err(NavigationError::AlreadyCrossed.into()),
            Some(BoundarySide::Exiting) => {}
        }
        let next = locate::cross(self.params, node, self.state.pos(), self.state.dir());
        self.state.apply(Transition::Cross { node: next });
        Ok(())
    }

    /// Changes direction in place, keeping the boundary side.
    ///
    /// # Errors
    ///
    /// Returns an error if the track is outside or `dir` is not a unit
    /// vector.
    pub fn set_dir(&mut self, dir: Vector3) -> Result<()> {
        self.current_node()?;
        check_direction(&dir)?;
        self.state.apply(Transition::SetDirection(dir));
        Ok(())
    }

    #[must_use]
    pub fn is_outside(&self) -> bool {
        self.state.node().is_none()
    }

    #[must_use]
    pub fn is_on_boundary(&self) -> bool {
        self.state.boundary().is_some()
    }

    /// Logical volume of the current placed volume.
    #[must_use]
    pub fn volume_id(&self) -> Option<VolumeId> {
        self.state.node().map(|n| self.params.node(n).volume)
    }

    #[must_use]
    pub fn status(&self) -> NavStatus {
        match (self.volume_id(), self.state.boundary()) {
            (None, _) => NavStatus::Outside,
            (Some(id), None) => NavStatus::Inside(id),
            (Some(id), Some(side)) => NavStatus::OnBoundary(id, side),
        }
    }

    #[must_use]
    pub fn pos(&self) -> Point3 {
        Point3::from(self.state.pos().coords / self.params.units().length_scale())
    }

    #[must_use]
    pub fn dir(&self) -> Vector3 {
        *self.state.dir()
    }

    #[must_use]
    pub fn params(&self) -> &'a GeometryParams {
        self.params
    }

    fn current_node(&self) -> Result<NodeId> {
        Ok(self.state.node().ok_or(NavigationError::Outside)?)
    }

    fn to_internal_point(&self, pos: &Point3) -> Point3 {
        Point3::from(pos.coords * self.params.units().length_scale())
    }

    fn to_external_step(&self, step: Step) -> Step {
        Step {
            distance: self.params.to_external(step.distance),
            boundary: step.boundary,
        }
    }

    /// Nearest of: leaving the current volume, or entering one of its
    /// direct daughters. Daughters win ties.
    fn compute_step(&self, node_id: NodeId, limit: f64) -> Step {
        let pos = self.state.pos();
        let dir = self.state.dir();
        let node = self.params.node(node_id);
        let exit = self.params.solid(node).distance_to_out(
            &node.transform.to_local_point(pos),
            &node.transform.to_local_dir(dir),
            limit,
        );
        let mut step = Step {
            distance: exit.distance,
            boundary: exit.hit,
        };
        for &daughter in &node.daughters {
            let dn = self.params.node(daughter);
            let tol = surface_tolerance(dn.bbox.max_extent());
            if !dn.bbox.intersects_ray(pos, dir, step.distance, tol) {
                continue;
            }
            let entry = self.params.solid(dn).distance_to_in(
                &dn.transform.to_local_point(pos),
                &dn.transform.to_local_dir(dir),
                step.distance,
            );
            if entry.hit && entry.distance <= step.distance {
                step = Step {
                    distance: entry.distance,
                    boundary: true,
                };
            }
        }
        step
    }
}

fn check_position(pos: &Point3) -> Result<()> {
    if pos.coords.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(NavigationError::InvalidPosition([pos.x, pos.y, pos.z]).into())
    }
}

fn check_direction(dir: &Vector3) -> Result<()> {
    if is_soft_unit_vector(dir) {
        Ok(())
    } else {
        Err(NavigationError::InvalidDirection([dir.x, dir.y, dir.z]).into())
    }
}
