//! Test-point lattice over a zone's bounds.
use glam::Vec3;

use crate::config::ExtractionConfig;
use crate::geometry::Bounds;

/// Search radius for a zone: half its smallest side, capped. Flat or
/// point-like zones get the configured default.
pub fn search_radius(bounds: &Bounds, config: &ExtractionConfig) -> f32 {
    let radius = bounds.min_extent() * 0.5;
    if radius > 0.0 {
        return radius.min(config.max_search_radius);
    }
    tracing::warn!(
        size = ?bounds.size,
        fallback = config.default_search_radius,
        "zone has a zero-length side, using default search radius"
    );
    config.default_search_radius
}

/// Lattice of test points inset by `radius` from the bounds.
///
/// Spacing is `2 * radius / density`. The density is halved while the point
/// count exceeds the cap and the density floor allows it.
pub fn build_lattice(bounds: &Bounds, radius: f32, config: &ExtractionConfig) -> Vec<Vec3> {
    let mut density = config.initial_density;
    let mut counts = axis_counts(bounds, radius, density);

    while total(counts) > config.max_test_points && density > config.min_density {
        density = (density * 0.5).max(config.min_density);
        counts = axis_counts(bounds, radius, density);
    }
    tracing::trace!(density, points = total(counts), "lattice sized");

    let (min, max) = (bounds.min() + Vec3::splat(radius), bounds.max() - Vec3::splat(radius));
    let axis_values = |axis: usize| -> Vec<f32> {
        match counts[axis] {
            None => vec![bounds.center[axis]],
            Some(n) => {
                let step = (max[axis] - min[axis]) / n as f32;
                (0..=n).map(|i| min[axis] + step * i as f32).collect()
            }
        }
    };
    let (xs, ys, zs) = (axis_values(0), axis_values(1), axis_values(2));

    let mut points = Vec::with_capacity(xs.len() * ys.len() * zs.len());
    for &x in &xs {
        for &y in &ys {
            for &z in &zs {
                points.push(Vec3::new(x, y, z));
            }
        }
    }
    if points.is_empty() {
        points.push(bounds.center);
    }
    points
}

/// Interval count per axis, or `None` for axes too short to hold an inset
/// span (they contribute a single centre layer).
fn axis_counts(bounds: &Bounds, radius: f32, density: f32) -> [Option<usize>; 3] {
    let spacing = 2.0 * radius / density;
    [0, 1, 2].map(|axis| {
        let span = bounds.size[axis] - 2.0 * radius;
        (span > 0.0).then(|| ((span / spacing).ceil() as usize).max(1))
    })
}

fn total(counts: [Option<usize>; 3]) -> usize {
    counts.iter().map(|c| c.map_or(1, |n| n + 1)).product()
}
