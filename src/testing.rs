//! Shared fixtures for the crate's unit tests.

#![allow(clippy::unwrap_used)]

use std::io;
use std::sync::{Arc, Mutex};

use tracing::Level;

use crate::geometry::{Cuboid, Sphere};
use crate::math::{Point3, Transform, Vector3};
use crate::navigation::TrackView;
use crate::units::{GeometryOptions, UnitSystem};
use crate::volume::{GeometryBuilder, GeometryParams, Label};

/// Four nested levels: eight envelopes around the origin, each holding a
/// box that holds a sphere. Built in centimetres.
pub(crate) fn four_levels() -> GeometryParams {
    four_levels_in(UnitSystem::Cgs)
}

/// The same geometry described in another unit system.
pub(crate) fn four_levels_in(units: UnitSystem) -> GeometryParams {
    // Centimetres expressed in `units`
    let cm = |x: f64| x * 10.0 / units.length_scale();

    let mut b = GeometryBuilder::new(GeometryOptions::with_units(units));
    let shape2 = b.add_volume("Shape2", Sphere::new(cm(5.0)).unwrap());
    let shape1 = b.add_volume("Shape1", Cuboid::new(cm(6.0), cm(6.0), cm(6.0)).unwrap());
    let envelope = b.add_volume(
        "Envelope",
        Cuboid::new(cm(7.0), cm(8.0), cm(9.0)).unwrap(),
    );
    let world = b.add_volume(
        Label::from_suffixed("World0xdeadbeef"),
        Cuboid::new(cm(24.0), cm(24.0), cm(24.0)).unwrap(),
    );
    b.place(shape1, shape2, &Transform::identity()).unwrap();
    b.place(envelope, shape1, &Transform::identity()).unwrap();
    for x in [-10.0, 10.0] {
        for y in [-10.0, 10.0] {
            for z in [-10.0, 10.0] {
                b.place(world, envelope, &Transform::translation(cm(x), cm(y), cm(z)))
                    .unwrap();
            }
        }
    }
    b.build(world).unwrap()
}

/// Volumes visited, distances travelled and mid-segment safeties along a
/// straight line until the track leaves the world.
#[derive(Debug, Default)]
pub(crate) struct TrackResult {
    pub volumes: Vec<String>,
    pub distances: Vec<f64>,
    pub halfway_safeties: Vec<f64>,
}

pub(crate) fn track(params: &GeometryParams, pos: Point3, dir: Vector3) -> TrackResult {
    let mut view = TrackView::new(params, pos, dir).unwrap();
    let mut result = TrackResult::default();
    while let Some(id) = view.volume_id() {
        result
            .volumes
            .push(params.id_to_label(id).unwrap().name.clone());
        let step = view.find_next_step(f64::INFINITY).unwrap();
        assert!(step.boundary, "unbounded step in {}", result.volumes.len());
        result.distances.push(step.distance);

        view.move_internal(step.distance / 2.0).unwrap();
        result
            .halfway_safeties
            .push(view.find_safety(f64::INFINITY).unwrap());

        view.find_next_step(f64::INFINITY).unwrap();
        view.move_to_boundary().unwrap();
        view.cross_boundary().unwrap();
    }
    result
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a thread-local subscriber and returns its result along
/// with each emitted event as (level, formatted line).
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<(Level, String)>) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("geotrack=debug"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().unwrap().clone();
    let events = String::from_utf8(bytes)
        .unwrap()
        .lines()
        .filter_map(|line| {
            let level = line.split_whitespace().next()?.parse::<Level>().ok()?;
            Some((level, line.to_owned()))
        })
        .collect();
    (result, events)
}
