use crate::math::{Point3, Vector3};
use crate::volume::{NodeId, VolumeId};

/// Result of a next-step query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Distance to travel, never more than the requested limit.
    pub distance: f64,
    /// Whether `distance` ends on a volume boundary.
    pub boundary: bool,
}

/// Which side of a boundary a track sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySide {
    /// Moved onto the surface of the current volume's exit (or a
    /// daughter's entry); the crossing has not been resolved yet.
    Exiting,
    /// Crossed; the current volume is the one just entered.
    Entered,
}

/// Logical state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStatus {
    Outside,
    Inside(VolumeId),
    OnBoundary(VolumeId, BoundarySide),
}

/// The only ways a navigation state changes.
#[derive(Debug, Clone)]
pub(crate) enum Transition {
    /// Initialization from an absolute position.
    Locate {
        pos: Point3,
        dir: Vector3,
        node: Option<NodeId>,
    },
    /// Translation within the current volume.
    Move {
        pos: Point3,
        boundary: Option<BoundarySide>,
    },
    SetDirection(Vector3),
    /// Boundary resolution; `None` means the world was left.
    Cross { node: Option<NodeId> },
}

/// Position, direction, placed node and boundary flag of one track, plus
/// the last computed step. All lengths in millimetres.
#[derive(Debug, Clone)]
pub(crate) struct NavState {
    pos: Point3,
    dir: Vector3,
    node: Option<NodeId>,
    boundary: Option<BoundarySide>,
    next: Option<Step>,
}

impl NavState {
    pub fn outside(pos: Point3, dir: Vector3) -> Self {
        Self {
            pos,
            dir,
            node: None,
            boundary: None,
            next: None,
        }
    }

    /// Applies a transition. Every transition invalidates the cached step.
    pub fn apply(&mut self, transition: Transition) {
        self.next = None;
        match transition {
            Transition::Locate { pos, dir, node } => {
                self.pos = pos;
                self.dir = dir;
                self.node = node;
                self.boundary = None;
            }
            Transition::Move { pos, boundary } => {
                self.pos = pos;
                self.boundary = boundary;
            }
            Transition::SetDirection(dir) => {
                self.dir = dir;
            }
            Transition::Cross { node } => {
                self.node = node;
                self.boundary = node.map(|_| BoundarySide::Entered);
            }
        }
    }

    pub fn cache_step(&mut self, step: Step) {
        self.next = Some(step);
    }

    pub fn pos(&self) -> &Point3 {
        &self.pos
    }

    pub fn dir(&self) -> &Vector3 {
        &self.dir
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn boundary(&self) -> Option<BoundarySide> {
        self.boundary
    }

    pub fn next_step(&self) -> Option<Step> {
        self.next
    }
}
