//! Deterministic fake host services.
//!
//! Available in this crate's unit tests and, through the `testing` feature,
//! to downstream crates' tests. The fakes model a flat walkable plane at
//! `y = 0` with optional walls (blocking paths), unwalkable regions (blocking
//! projection) and solid boxes (blocking sight).
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use glam::Vec3;

use crate::cover::{CandidateId, CoverCandidate, CoverStatus};
use crate::env::{GeometryQuery, NavMesh, OverlapBuffer, SightOracle};
use crate::geometry::{Bounds, Geometry, GeometryId};

static TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn` so expected warnings stay visible.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Shared in-memory sink for [`capture_logs`].
#[derive(Clone, Debug, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.0.lock().map_err(|_| io::Error::other("log buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a thread-local subscriber and returns its result together
/// with every `warn` and `error` line it emitted.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .without_time()
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = buffer
        .0
        .lock()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    (result, logs)
}

/// Flat navigation mesh at `y = 0`.
#[derive(Debug, Default)]
pub struct FakeNavMesh {
    walls: Vec<(Vec3, Vec3)>,
    unwalkable: Vec<Bounds>,
    path_queries: AtomicUsize,
}

impl FakeNavMesh {
    pub fn flat() -> Self {
        Self::default()
    }

    /// Adds a wall segment (horizontal, infinite height) that no path crosses.
    pub fn with_wall(mut self, a: Vec3, b: Vec3) -> Self {
        self.walls.push((a, b));
        self
    }

    /// Marks a horizontal region as off-mesh.
    pub fn with_unwalkable(mut self, bounds: Bounds) -> Self {
        self.unwalkable.push(bounds);
        self
    }

    /// Number of `path_exists`/`path_length` queries answered so far.
    pub fn path_queries(&self) -> usize {
        self.path_queries.load(Ordering::Relaxed)
    }

    fn walkable(&self, point: Vec3) -> bool {
        !self.unwalkable.iter().any(|b| {
            let (min, max) = (b.min(), b.max());
            point.x >= min.x && point.x <= max.x && point.z >= min.z && point.z <= max.z
        })
    }

    fn crosses_wall(&self, start: Vec3, end: Vec3) -> bool {
        self.walls
            .iter()
            .any(|&(a, b)| segments_intersect_2d(start, end, a, b))
    }
}

impl NavMesh for FakeNavMesh {
    fn project(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let snapped = Vec3::new(point.x, 0.0, point.z);
        (point.y.abs() <= radius && self.walkable(snapped)).then_some(snapped)
    }

    fn path_exists(&self, start: Vec3, end: Vec3) -> bool {
        self.path_queries.fetch_add(1, Ordering::Relaxed);
        self.walkable(start) && self.walkable(end) && !self.crosses_wall(start, end)
    }
}

/// Static geometry world answering sphere overlaps.
#[derive(Debug, Default)]
pub struct FakeGeometryWorld {
    items: Vec<Geometry>,
    queries: AtomicUsize,
}

impl FakeGeometryWorld {
    pub fn new(items: Vec<Geometry>) -> Self {
        Self {
            items,
            queries: AtomicUsize::new(0),
        }
    }

    /// Adds a box resting on the ground at `(x, z)`.
    pub fn with_box(mut self, id: u32, x: f32, z: f32, size: Vec3) -> Self {
        self.items.push(ground_box(id, x, z, size));
        self
    }

    pub fn items(&self) -> &[Geometry] {
        &self.items
    }

    /// Number of overlap queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl GeometryQuery for FakeGeometryWorld {
    fn overlap(&self, origin: Vec3, radius: f32, out: &mut OverlapBuffer) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        for item in &self.items {
            let closest = origin.clamp(item.bounds.min(), item.bounds.max());
            if closest.distance_squared(origin) <= radius * radius && out.try_push(*item).is_err() {
                break;
            }
        }
    }
}

/// Sight oracle where solid boxes block rays.
#[derive(Debug, Default)]
pub struct FakeSight {
    blockers: Vec<Bounds>,
}

impl FakeSight {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn from_geometry(items: &[Geometry]) -> Self {
        Self {
            blockers: items.iter().map(|g| g.bounds).collect(),
        }
    }
}

impl SightOracle for FakeSight {
    fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self
            .blockers
            .iter()
            .any(|b| !b.is_degenerate() && segment_hits_box(from, to, b))
    }
}

/// Builds a box geometry resting on the ground.
pub fn ground_box(id: u32, x: f32, z: f32, size: Vec3) -> Geometry {
    Geometry::new(
        GeometryId(id),
        Bounds::new(Vec3::new(x, size.y * 0.5, z), size),
    )
}

/// Builds a pooled-looking candidate without running the analyzer.
pub fn candidate(geometry: u32, position: Vec3, path_length: f32, score: f32) -> CoverCandidate {
    CoverCandidate {
        id: CandidateId(0),
        geometry: GeometryId(geometry),
        bounds: Bounds::new(position + Vec3::new(0.0, 0.5, 0.0), Vec3::ONE),
        position,
        path_length,
        straight_status: CoverStatus::None,
        path_status: CoverStatus::None,
        cover_value: score,
        pose_height: 1.6,
        is_safe_path: true,
        spotted_until: None,
        is_bad: false,
        occupant: None,
    }
}

/// Slab test for a segment against an axis-aligned box.
fn segment_hits_box(from: Vec3, to: Vec3, bounds: &Bounds) -> bool {
    let (min, max) = (bounds.min(), bounds.max());
    let dir = to - from;
    let mut t_enter = 0.0_f32;
    let mut t_exit = 1.0_f32;

    for axis in 0..3 {
        let (o, d, lo, hi) = (from[axis], dir[axis], min[axis], max[axis]);
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }
        let (mut t0, mut t1) = ((lo - o) / d, (hi - o) / d);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return false;
        }
    }
    true
}

fn segments_intersect_2d(p1: Vec3, p2: Vec3, q1: Vec3, q2: Vec3) -> bool {
    let cross = |a: Vec3, b: Vec3, c: Vec3| (b.x - a.x) * (c.z - a.z) - (b.z - a.z) * (c.x - a.x);
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    (d1 * d2 < 0.0) && (d3 * d4 < 0.0)
}
