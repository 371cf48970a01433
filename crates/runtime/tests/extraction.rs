use glam::Vec3;
use scheduler::Step;
use tactics_core::testing::{FakeGeometryWorld, FakeNavMesh, FakeSight, init_tracing};
use tactics_core::{
    AgentId, Audience, Bounds, CombatDecision, ErrorSeverity, ExfilKind, ExtractionError,
    ExtractionZone, Faction, Requirements, SimTime, SpatialEnv, SpawnMarker, SquadId,
    TacticalError, ZoneId, ZoneStatus,
};
use tactics_runtime::{AgentInfo, RuntimeError, TacticalRuntime};

fn zone(id: u32, x: f32, size: Vec3) -> ExtractionZone {
    ExtractionZone::new(ZoneId(id), format!("zone-{id}"), Bounds::new(Vec3::new(x, size.y * 0.5, 0.0), size))
}

fn spawns() -> Vec<SpawnMarker> {
    vec![
        SpawnMarker { position: Vec3::new(0.0, 0.0, 0.0) },
        SpawnMarker { position: Vec3::new(0.0, 30.0, 5.0) },
    ]
}

/// Ticks until the extraction scan task finishes a pass.
fn run_extraction_pass(runtime: &mut TacticalRuntime, env: SpatialEnv<'_>, now: f32) {
    for _ in 0..100 {
        match runtime.tick(env, SimTime(now)).extraction_step {
            Some(Step::Yield) => continue,
            _ => return,
        }
    }
    panic!("extraction pass did not finish at t={now}");
}

#[test]
fn flat_zone_is_searched_with_default_radius_and_validated() {
    init_tracing();
    let nav = FakeNavMesh::flat();
    let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
    let env = SpatialEnv::new(&nav, &world, &sight);
    let mut runtime = TacticalRuntime::builder()
        .zones(vec![zone(1, 40.0, Vec3::new(2.0, 0.0, 4.0))])
        .spawns(spawns())
        .build()
        .expect("default config is valid");

    run_extraction_pass(&mut runtime, env, 0.0);

    let position = runtime.validated_extraction(ZoneId(1)).expect("zone validated");
    assert_eq!(position, Vec3::new(40.0, 0.0, 0.0));
    assert_eq!(nav.path_queries(), 1);
}

#[test]
fn validating_an_unsearched_zone_is_an_internal_error() {
    init_tracing();
    let nav = FakeNavMesh::flat();
    let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
    let env = SpatialEnv::new(&nav, &world, &sight);
    let mut runtime = TacticalRuntime::builder()
        .zones(vec![zone(1, 40.0, Vec3::new(8.0, 2.0, 8.0))])
        .spawns(spawns())
        .build()
        .expect("default config is valid");

    let err = runtime.validate_extraction(env, ZoneId(1)).unwrap_err();
    assert!(matches!(err, RuntimeError::Extraction(ExtractionError::NotTracked(ZoneId(1)))));
    assert_eq!(err.severity(), ErrorSeverity::Internal);
    assert_eq!(err.error_code(), "EXTRACTION_NOT_TRACKED");

    run_extraction_pass(&mut runtime, env, 0.0);
    assert!(runtime.validate_extraction(env, ZoneId(1)).expect("zone was stepped"));
}

#[test]
fn validated_zones_are_not_rechecked() {
    let nav = FakeNavMesh::flat();
    let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
    let env = SpatialEnv::new(&nav, &world, &sight);
    let mut runtime = TacticalRuntime::builder()
        .zones(vec![zone(1, 40.0, Vec3::new(8.0, 2.0, 8.0))])
        .spawns(spawns())
        .build()
        .expect("default config is valid");

    run_extraction_pass(&mut runtime, env, 0.0);
    let first = runtime.validated_extraction(ZoneId(1));
    let queries = nav.path_queries();
    assert!(first.is_some());

    run_extraction_pass(&mut runtime, env, 10.0);
    run_extraction_pass(&mut runtime, env, 20.0);
    assert_eq!(runtime.validated_extraction(ZoneId(1)), first);
    assert_eq!(nav.path_queries(), queries);
}

#[test]
fn zone_is_never_validated_without_a_path() {
    let nav = FakeNavMesh::flat().with_wall(Vec3::new(30.0, 0.0, -50.0), Vec3::new(30.0, 0.0, 50.0));
    let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
    let env = SpatialEnv::new(&nav, &world, &sight);
    let mut runtime = TacticalRuntime::builder()
        .zones(vec![zone(1, 40.0, Vec3::new(8.0, 2.0, 8.0))])
        .spawns(spawns())
        .build()
        .expect("default config is valid");

    for pass in 0..4 {
        run_extraction_pass(&mut runtime, env, pass as f32 * 10.0);
        assert_eq!(runtime.validated_extraction(ZoneId(1)), None);
    }
    assert_eq!(nav.path_queries(), 4);
}

#[test]
fn excluded_zones_are_never_assigned() {
    let nav = FakeNavMesh::flat();
    let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
    let env = SpatialEnv::new(&nav, &world, &sight);
    let cube = Vec3::splat(4.0);
    let mut runtime = TacticalRuntime::builder()
        .zones(vec![
            zone(1, 40.0, cube).with_status(ZoneStatus::NotPresent),
            zone(2, 50.0, cube).with_requirements(Requirements::TRAIN),
            zone(3, 60.0, cube)
                .with_requirements(Requirements::WORLD_EVENT)
                .with_status(ZoneStatus::UncompleteRequirements),
            zone(4, 70.0, cube).with_audience(Audience::Scav),
            zone(5, 80.0, cube).with_requirements(Requirements::PAYMENT),
        ])
        .spawns(spawns())
        .build()
        .expect("default config is valid");
    runtime
        .register_agent(AgentInfo::new(AgentId(1), Faction::Pmc, Vec3::ZERO))
        .expect("agent registers");
    runtime
        .register_agent(AgentInfo::new(AgentId(2), Faction::Scav, Vec3::ZERO))
        .expect("agent registers");

    run_extraction_pass(&mut runtime, env, 0.0);
    assert_eq!(runtime.validated_extraction(ZoneId(1)), None);
    assert_eq!(runtime.validated_extraction(ZoneId(2)), None);

    let pmc = runtime.find_extraction(env, AgentId(1)).expect("pmc may extract");
    assert_eq!(pmc.map(|a| a.zone), Some(ZoneId(5)));
    let scav = runtime.find_extraction(env, AgentId(2)).expect("scav may extract");
    assert_eq!(scav.map(|a| a.zone), Some(ZoneId(4)));
}

#[test]
fn shared_timer_departure_is_committed_once() {
    let nav = FakeNavMesh::flat();
    let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
    let env = SpatialEnv::new(&nav, &world, &sight);
    let mut runtime = TacticalRuntime::builder()
        .zones(vec![zone(1, 40.0, Vec3::splat(4.0)).with_kind(ExfilKind::SharedTimer, 6.0)])
        .spawns(spawns())
        .build()
        .expect("default config is valid");
    for id in 1..=2 {
        runtime
            .register_agent(AgentInfo::new(AgentId(id), Faction::Pmc, Vec3::new(0.0, 0.0, id as f32)))
            .expect("agent registers");
    }

    run_extraction_pass(&mut runtime, env, 0.0);
    let first = runtime
        .find_extraction(env, AgentId(1))
        .expect("pmc may extract")
        .expect("zone available");
    runtime.tick(env, SimTime(1.5));
    let second = runtime
        .find_extraction(env, AgentId(2))
        .expect("pmc may extract")
        .expect("zone available");

    assert_eq!(first.departs_at, second.departs_at);
    let remaining = runtime.departure_remaining(ZoneId(1)).expect("committed");
    assert!((remaining - 4.7).abs() < 1e-4);

    // Under a second left: the zone is no longer offered to newcomers.
    runtime
        .register_agent(AgentInfo::new(AgentId(3), Faction::Pmc, Vec3::ZERO))
        .expect("agent registers");
    runtime.tick(env, SimTime(5.5));
    assert_eq!(runtime.find_extraction(env, AgentId(3)).expect("pmc may extract"), None);
}

#[test]
fn squad_follows_leader_and_bosses_stay() {
    let nav = FakeNavMesh::flat();
    let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
    let env = SpatialEnv::new(&nav, &world, &sight);
    let mut runtime = TacticalRuntime::builder()
        .zones(vec![zone(1, 40.0, Vec3::splat(4.0)), zone(2, -40.0, Vec3::splat(4.0))])
        .spawns(spawns())
        .seed(11)
        .build()
        .expect("default config is valid");
    for id in 1..=3 {
        runtime
            .register_agent(AgentInfo::new(AgentId(id), Faction::Pmc, Vec3::ZERO).in_squad(SquadId(9)))
            .expect("agent registers");
    }
    runtime
        .register_agent(AgentInfo::new(AgentId(4), Faction::Boss, Vec3::ZERO))
        .expect("agent registers");
    runtime
        .update_agent(AgentId(4), Vec3::ZERO, None, CombatDecision::None)
        .expect("agent exists");

    run_extraction_pass(&mut runtime, env, 0.0);

    let leader = runtime
        .find_extraction(env, AgentId(1))
        .expect("pmc may extract")
        .expect("zone available");
    for follower in [AgentId(2), AgentId(3)] {
        let copy = runtime
            .find_extraction(env, follower)
            .expect("pmc may extract")
            .expect("leader has a zone");
        assert_eq!(copy.zone, leader.zone);
        assert!((copy.position.distance(leader.position) - 2.0).abs() < 1e-3);
    }

    assert!(matches!(
        runtime.find_extraction(env, AgentId(4)),
        Err(RuntimeError::ExtractionNotAllowed { faction: Faction::Boss, .. })
    ));
}
