//! Anti-clustering visit order for projected test points.
use glam::Vec3;

/// Orders `points` by alternately taking the nearest and then the farthest
/// point from the previous pick, starting from `start`.
///
/// The result is reversed so that popping it yields that order.
pub fn anti_cluster_stack(mut points: Vec<Vec3>, start: Vec3) -> Vec<Vec3> {
    let mut ordered = Vec::with_capacity(points.len());
    let mut reference = start;
    let mut nearest = true;

    while !points.is_empty() {
        let by_distance = |a: &(usize, &Vec3), b: &(usize, &Vec3)| {
            a.1.distance_squared(reference)
                .total_cmp(&b.1.distance_squared(reference))
        };
        let pick = if nearest {
            points.iter().enumerate().min_by(by_distance)
        } else {
            points.iter().enumerate().max_by(by_distance)
        };
        let Some((index, _)) = pick else { break };

        let point = points.swap_remove(index);
        ordered.push(point);
        reference = point;
        nearest = !nearest;
    }

    ordered.reverse();
    ordered
}
