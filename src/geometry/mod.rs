pub mod solid;

pub use solid::{
    BooleanOp, BooleanSolid, Cuboid, Intersection, PointClassification, Solid, SolidShape, Sphere,
    Tube,
};
