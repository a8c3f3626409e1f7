//! Volume definitions and the immutable placed-volume tree.
//!
//! Logical volumes (a solid, a label and the placements of their
//! daughters) are collected by [`GeometryBuilder`] and expanded by
//! [`GeometryBuilder::build`] into [`GeometryParams`], an arena of placed
//! nodes shared read-only by every track view.

mod builder;
mod output;
mod params;

pub use builder::GeometryBuilder;
pub use output::GeoParamsOutput;
pub use params::GeometryParams;
pub(crate) use params::{NodeId, VolumeNode};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::geometry::SolidShape;
use crate::math::Transform;

/// Name suffix carried by the mirrored copy of a volume.
pub(crate) const REFLECTED_SUFFIX: &str = "_refl";

/// Dense index of a logical volume, assigned in definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VolumeId(usize);

impl VolumeId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Volume name plus an optional uniquifying extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Label {
    pub name: String,
    pub ext: String,
}

impl Label {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ext: String::new(),
        }
    }

    #[must_use]
    pub fn with_ext(name: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
        }
    }

    /// Splits a trailing pointer-style `0x...` extension off `name`, as in
    /// `World0xdeadbeef`.
    #[must_use]
    pub fn from_suffixed(name: &str) -> Self {
        if let Some(pos) = name.rfind("0x") {
            let digits = &name[pos + 2..];
            if pos > 0 && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return Self::with_ext(&name[..pos], &name[pos..]);
            }
        }
        Self::new(name)
    }

    /// Label with the reflected-copy suffix removed from the name.
    #[must_use]
    pub fn canonical(&self) -> Label {
        match self.name.strip_suffix(REFLECTED_SUFFIX) {
            Some(base) if !base.is_empty() => Label::with_ext(base, self.ext.clone()),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ext.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.ext)
        }
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::new(name)
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Label::new(name)
    }
}

/// Whether a volume is the mirror image of its solid.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reflection {
    #[default]
    Direct,
    /// Improper transform applied between the placement frame and the
    /// solid's canonical frame.
    Reflected(Transform),
}

impl Reflection {
    #[must_use]
    pub fn is_reflected(&self) -> bool {
        matches!(self, Reflection::Reflected(_))
    }
}

/// Placement of a daughter volume inside its mother's frame.
#[derive(Debug, Clone)]
pub struct Placement {
    pub daughter: VolumeId,
    pub transform: Transform,
}

/// A logical volume: solid, label and daughter placements.
///
/// The solid is shared between a volume and its reflected copy.
#[derive(Debug, Clone)]
pub struct VolumeData {
    pub label: Label,
    pub solid: Arc<SolidShape>,
    pub reflection: Reflection,
    pub daughters: Vec<Placement>,
}

impl VolumeData {
    /// Label reported to callers: reflected copies answer with the name of
    /// the volume they mirror.
    #[must_use]
    pub fn canonical_label(&self) -> Label {
        if self.reflection.is_reflected() {
            self.label.canonical()
        } else {
            self.label.clone()
        }
    }
}
