//! Batched line-of-sight checks.
//!
//! Queries are independent, so they fan out over the rayon pool and the
//! results are joined, in input order, before returning.
use glam::Vec3;
use rayon::prelude::*;
use tactics_core::{AgentId, SightOracle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SightQuery {
    pub agent: AgentId,
    pub from: Vec3,
    pub to: Vec3,
}

/// Evaluates every query; `true` means the line is unobstructed.
pub fn batch_line_of_sight(sight: &dyn SightOracle, queries: &[SightQuery]) -> Vec<(AgentId, bool)> {
    queries
        .par_iter()
        .map(|q| (q.agent, sight.line_of_sight(q.from, q.to)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::testing::{FakeSight, ground_box};

    #[test]
    fn preserves_order_and_respects_blockers() {
        let wall = ground_box(1, 5.0, 0.0, Vec3::new(1.0, 3.0, 10.0));
        let sight = FakeSight::from_geometry(&[wall]);
        let eye = Vec3::new(0.0, 1.6, 0.0);
        let queries = vec![
            SightQuery {
                agent: AgentId(1),
                from: eye,
                to: Vec3::new(10.0, 1.6, 0.0),
            },
            SightQuery {
                agent: AgentId(2),
                from: eye,
                to: Vec3::new(-10.0, 1.6, 0.0),
            },
        ];

        let results = batch_line_of_sight(&sight, &queries);
        assert_eq!(results, vec![(AgentId(1), false), (AgentId(2), true)]);
    }
}
