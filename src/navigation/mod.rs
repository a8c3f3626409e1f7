//! Track navigation through a built geometry.
//!
//! A [`TrackView`] borrows an immutable [`GeometryParams`] and owns the
//! state of a single track: position, direction, current placed volume,
//! boundary flag and the last computed step. Crossing resolution lives in
//! the crate-private `locate` module.
//!
//! [`GeometryParams`]: crate::volume::GeometryParams

mod locate;
mod state;
mod track_view;

pub use state::{BoundarySide, NavStatus, Step};
pub use track_view::TrackView;
