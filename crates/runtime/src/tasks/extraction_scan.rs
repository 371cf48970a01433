//! World-scope perpetual extraction search.
use scheduler::{Step, Task};
use tactics_core::{
    DepartureSchedule, ExtractionResolver, ExtractionZone, SimTime, SpatialEnv, SpawnMarker,
    TacticalError, ZoneStep,
};

pub struct ExtractionTaskContext<'a> {
    pub env: SpatialEnv<'a>,
    pub now: SimTime,
    pub zones: &'a [ExtractionZone],
    pub spawns: &'a [SpawnMarker],
    pub resolver: &'a mut ExtractionResolver,
    pub departures: &'a DepartureSchedule,
}

/// Steps every usable zone once per pass, one zone per step.
#[derive(Debug)]
pub struct ExtractionScanTask {
    interval: f32,
    next: usize,
    validated: usize,
    failures: usize,
    passes: u64,
}

impl ExtractionScanTask {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            next: 0,
            validated: 0,
            failures: 0,
            passes: 0,
        }
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }
}

impl<'a> Task<ExtractionTaskContext<'a>> for ExtractionScanTask {
    fn step(&mut self, ctx: &mut ExtractionTaskContext<'a>) -> Step {
        if self.next == 0 {
            ctx.resolver.retain_zones(ctx.zones);
            self.validated = 0;
            self.failures = 0;
        }

        let Some(zone) = ctx.zones.get(self.next) else {
            self.next = 0;
            self.passes += 1;
            tracing::debug!(
                zones = ctx.zones.len(),
                validated = self.validated,
                failures = self.failures,
                "extraction pass complete"
            );
            return Step::Sleep(self.interval);
        };
        self.next += 1;

        if !ctx.resolver.is_usable(zone, ctx.departures, ctx.now) {
            tracing::trace!(zone = %zone.id, status = %zone.status, "zone not usable");
            return Step::Yield;
        }
        match ctx.resolver.step_zone(ctx.env, zone, ctx.spawns) {
            Ok(step) => {
                if matches!(step, ZoneStep::Validated(_)) {
                    self.validated += 1;
                }
                tracing::trace!(zone = %zone.id, ?step, "zone stepped");
            }
            Err(error) => {
                self.failures += 1;
                tracing::warn!(zone = %zone.id, %error, code = error.error_code(), "zone step failed");
            }
        }
        Step::Yield
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use scheduler::TaskSlot;
    use tactics_core::testing::{FakeGeometryWorld, FakeNavMesh, FakeSight};
    use tactics_core::{Bounds, ExtractionConfig, ZoneId, ZoneStatus};

    use super::*;

    #[test]
    fn pass_steps_usable_zones_then_sleeps() {
        let zones = vec![
            ExtractionZone::new(ZoneId(1), "road", Bounds::new(Vec3::new(40.0, 1.0, 0.0), Vec3::splat(4.0))),
            ExtractionZone::new(ZoneId(2), "bunker", Bounds::new(Vec3::new(-40.0, 1.0, 0.0), Vec3::splat(4.0)))
                .with_status(ZoneStatus::NotPresent),
        ];
        let spawns = vec![SpawnMarker { position: Vec3::ZERO }];
        let nav = FakeNavMesh::flat();
        let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let mut resolver = ExtractionResolver::new(ExtractionConfig::default());
        let departures = DepartureSchedule::new(0.2);
        let mut slot = TaskSlot::new(ExtractionScanTask::new(10.0));

        let mut ctx = ExtractionTaskContext {
            env: SpatialEnv::new(&nav, &world, &sight),
            now: SimTime::ZERO,
            zones: &zones,
            spawns: &spawns,
            resolver: &mut resolver,
            departures: &departures,
        };
        assert_eq!(slot.poll(&mut ctx, 0.0), Some(Step::Yield));
        assert_eq!(slot.poll(&mut ctx, 0.0), Some(Step::Yield));
        assert_eq!(slot.poll(&mut ctx, 0.0), Some(Step::Sleep(10.0)));
        assert_eq!(slot.poll(&mut ctx, 5.0), None);
        assert_eq!(slot.task().passes(), 1);

        assert!(resolver.validated_position(ZoneId(1)).is_some());
        assert!(resolver.candidate(ZoneId(2)).is_none());
    }
}
