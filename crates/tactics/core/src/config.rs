//! Tunable parameters for the cover and extraction searches.
//!
//! Every value has a `DEFAULT_*` constant so hosts can reason about the
//! baseline without constructing a config. With the `serde` feature the
//! structs deserialize from partial documents; missing fields keep their
//! defaults.
use crate::error::{ErrorSeverity, TacticalError};

/// Invalid configuration detected by [`SearchConfig::validate`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cover pool capacity must be at least 1")]
    ZeroCapacity,

    #[error("cover pool maturity {maturity} must be below capacity {capacity}")]
    MaturityNotBelowCapacity { maturity: usize, capacity: usize },

    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("resort distance {resort} must not exceed rescan distance {rescan}")]
    ResortExceedsRescan { resort: f32, rescan: f32 },

    #[error("minimum pose height {min} must be below standing height {standing}")]
    PoseHeightRange { min: f32, standing: f32 },

    #[error("minimum lattice density {min} must not exceed initial density {initial}")]
    DensityRange { min: f32, initial: f32 },
}

impl TacticalError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroCapacity => "CONFIG_ZERO_CAPACITY",
            Self::MaturityNotBelowCapacity { .. } => "CONFIG_MATURITY",
            Self::NonPositive { .. } => "CONFIG_NON_POSITIVE",
            Self::ResortExceedsRescan { .. } => "CONFIG_RESORT_DISTANCE",
            Self::PoseHeightRange { .. } => "CONFIG_POSE_HEIGHT",
            Self::DensityRange { .. } => "CONFIG_DENSITY",
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Top-level configuration for one session.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchConfig {
    pub cover: CoverConfig,
    pub extraction: ExtractionConfig,
}

impl SearchConfig {
    /// Checks cross-field constraints that the types cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cover.validate()?;
        self.extraction.validate()
    }
}

/// Parameters of the per-agent cover search.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CoverConfig {
    /// Maximum number of candidates held by one pool.
    pub capacity: usize,
    /// Pool size up to which every analysed candidate is admitted.
    pub maturity: usize,
    /// Radius of the static-geometry overlap query.
    pub scan_radius: f32,
    /// Origin movement that triggers a fresh overlap query.
    pub rescan_distance: f32,
    /// Origin movement that triggers a re-sort of the cached hits.
    pub resort_distance: f32,
    /// Origin movement that triggers a new admission pass on a healthy pool.
    pub admission_distance: f32,
    /// Pools smaller than this always run an admission pass.
    pub min_healthy_pool: usize,
    /// Probing radius substituted for zero-sized geometry.
    pub default_probe_radius: f32,
    /// Extra distance between the geometry edge and the cover position.
    pub agent_clearance: f32,
    /// Eye height of a standing agent.
    pub standing_height: f32,
    /// Lowest eye height an agent can take behind cover.
    pub min_pose_height: f32,
    /// Height decrement between visibility probes.
    pub probe_step: f32,
    /// Cover closer than this to the threat is rejected.
    pub min_threat_distance: f32,
    /// A straight route passing closer than this to the threat is unsafe.
    pub safe_path_threat_distance: f32,
    /// Seconds a spotted position stays suppressed.
    pub spotted_period: f32,
    /// Distance within which a position matches a spotted entry.
    pub spotted_proximity: f32,
    /// Minimum seconds between spotted-entry cleanups.
    pub spotted_cleanup_interval: f32,
    /// Seconds between scan passes after a pass found cover.
    pub update_interval: f32,
    /// Seconds before retrying after a pass found nothing.
    pub retry_delay: f32,
    /// Geometry items analysed per step while the pool is still empty.
    pub empty_pool_batch: usize,
    /// Distance at or under which the agent counts as in cover.
    pub in_cover_distance: f32,
    /// Upper bound of the "close to cover" band.
    pub close_distance: f32,
    /// Upper bound of the "mid range to cover" band.
    pub mid_distance: f32,
    /// Agent distance from the fallback point beyond which it is dropped.
    pub fallback_reset_distance: f32,
    /// Seconds after a drop before the fallback point is recomputed.
    pub fallback_reset_delay: f32,
}

impl CoverConfig {
    pub const DEFAULT_CAPACITY: usize = 10;
    pub const DEFAULT_MATURITY: usize = 7;
    pub const DEFAULT_SCAN_RADIUS: f32 = 35.0;
    pub const DEFAULT_RESCAN_DISTANCE: f32 = 3.0;
    pub const DEFAULT_RESORT_DISTANCE: f32 = 1.4;
    pub const DEFAULT_ADMISSION_DISTANCE: f32 = 5.0;
    pub const DEFAULT_MIN_HEALTHY_POOL: usize = 5;
    pub const DEFAULT_PROBE_RADIUS: f32 = 0.5;
    pub const DEFAULT_AGENT_CLEARANCE: f32 = 0.6;
    pub const DEFAULT_STANDING_HEIGHT: f32 = 1.6;
    pub const DEFAULT_MIN_POSE_HEIGHT: f32 = 0.5;
    pub const DEFAULT_PROBE_STEP: f32 = 0.25;
    pub const DEFAULT_MIN_THREAT_DISTANCE: f32 = 8.0;
    pub const DEFAULT_SAFE_PATH_THREAT_DISTANCE: f32 = 5.0;
    pub const DEFAULT_SPOTTED_PERIOD: f32 = 10.0;
    pub const DEFAULT_SPOTTED_PROXIMITY: f32 = 2.0;
    pub const DEFAULT_SPOTTED_CLEANUP_INTERVAL: f32 = 1.0;
    pub const DEFAULT_UPDATE_INTERVAL: f32 = 1.0;
    pub const DEFAULT_RETRY_DELAY: f32 = 3.0;
    pub const DEFAULT_EMPTY_POOL_BATCH: usize = 5;
    pub const DEFAULT_IN_COVER_DISTANCE: f32 = 1.0;
    pub const DEFAULT_CLOSE_DISTANCE: f32 = 5.0;
    pub const DEFAULT_MID_DISTANCE: f32 = 20.0;
    pub const DEFAULT_FALLBACK_RESET_DISTANCE: f32 = 35.0;
    pub const DEFAULT_FALLBACK_RESET_DELAY: f32 = 3.0;

    pub fn new() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            maturity: Self::DEFAULT_MATURITY,
            scan_radius: Self::DEFAULT_SCAN_RADIUS,
            rescan_distance: Self::DEFAULT_RESCAN_DISTANCE,
            resort_distance: Self::DEFAULT_RESORT_DISTANCE,
            admission_distance: Self::DEFAULT_ADMISSION_DISTANCE,
            min_healthy_pool: Self::DEFAULT_MIN_HEALTHY_POOL,
            default_probe_radius: Self::DEFAULT_PROBE_RADIUS,
            agent_clearance: Self::DEFAULT_AGENT_CLEARANCE,
            standing_height: Self::DEFAULT_STANDING_HEIGHT,
            min_pose_height: Self::DEFAULT_MIN_POSE_HEIGHT,
            probe_step: Self::DEFAULT_PROBE_STEP,
            min_threat_distance: Self::DEFAULT_MIN_THREAT_DISTANCE,
            safe_path_threat_distance: Self::DEFAULT_SAFE_PATH_THREAT_DISTANCE,
            spotted_period: Self::DEFAULT_SPOTTED_PERIOD,
            spotted_proximity: Self::DEFAULT_SPOTTED_PROXIMITY,
            spotted_cleanup_interval: Self::DEFAULT_SPOTTED_CLEANUP_INTERVAL,
            update_interval: Self::DEFAULT_UPDATE_INTERVAL,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            empty_pool_batch: Self::DEFAULT_EMPTY_POOL_BATCH,
            in_cover_distance: Self::DEFAULT_IN_COVER_DISTANCE,
            close_distance: Self::DEFAULT_CLOSE_DISTANCE,
            mid_distance: Self::DEFAULT_MID_DISTANCE,
            fallback_reset_distance: Self::DEFAULT_FALLBACK_RESET_DISTANCE,
            fallback_reset_delay: Self::DEFAULT_FALLBACK_RESET_DELAY,
        }
    }

    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.maturity >= self.capacity {
            return Err(ConfigError::MaturityNotBelowCapacity {
                maturity: self.maturity,
                capacity: self.capacity,
            });
        }
        positive("cover.scan_radius", self.scan_radius)?;
        positive("cover.rescan_distance", self.rescan_distance)?;
        positive("cover.resort_distance", self.resort_distance)?;
        positive("cover.default_probe_radius", self.default_probe_radius)?;
        positive("cover.probe_step", self.probe_step)?;
        positive("cover.spotted_period", self.spotted_period)?;
        positive("cover.spotted_proximity", self.spotted_proximity)?;
        positive("cover.update_interval", self.update_interval)?;
        positive("cover.retry_delay", self.retry_delay)?;
        positive("cover.fallback_reset_distance", self.fallback_reset_distance)?;
        if self.resort_distance > self.rescan_distance {
            return Err(ConfigError::ResortExceedsRescan {
                resort: self.resort_distance,
                rescan: self.rescan_distance,
            });
        }
        if self.min_pose_height >= self.standing_height {
            return Err(ConfigError::PoseHeightRange {
                min: self.min_pose_height,
                standing: self.standing_height,
            });
        }
        Ok(())
    }
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of the world-scope extraction search and assignment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractionConfig {
    /// Search radius used when a zone's bounds have a zero-length side.
    pub default_search_radius: f32,
    /// Upper clamp on the search radius derived from the bounds.
    pub max_search_radius: f32,
    /// Added to the search radius when projecting test points.
    pub projection_margin: f32,
    /// Starting lattice density (points per search diameter).
    pub initial_density: f32,
    /// Density below which the lattice is no longer thinned.
    pub min_density: f32,
    /// Lattice size above which the density is halved.
    pub max_test_points: usize,
    /// Radius around the zone's nominal position searched for spawn markers.
    /// When no marker lies inside it, every marker is ranked.
    pub spawn_search_radius: f32,
    /// Multiplier applied to vertical displacement when ranking spawns.
    pub vertical_weight: f32,
    /// Seconds between extraction scan passes.
    pub scan_interval: f32,
    /// Added to a shared-timer departure when it is committed.
    pub shared_timer_margin: f32,
    /// Zones departing sooner than this are not selectable.
    pub min_departure_remaining: f32,
    /// Seconds an agent waits after a failed assignment.
    pub retry_delay: f32,
    /// Extraction points closer than this to the agent are not selectable.
    pub min_distance_to_extraction: f32,
    /// Lateral offset radius applied to squad followers.
    pub squad_offset_radius: f32,
    /// Radius used to re-snap a follower's offset point.
    pub squad_snap_radius: f32,
}

impl ExtractionConfig {
    pub const DEFAULT_SEARCH_RADIUS: f32 = 3.0;
    pub const DEFAULT_MAX_SEARCH_RADIUS: f32 = 5.0;
    pub const DEFAULT_PROJECTION_MARGIN: f32 = 0.5;
    pub const DEFAULT_INITIAL_DENSITY: f32 = 1.0;
    pub const DEFAULT_MIN_DENSITY: f32 = 0.125;
    pub const DEFAULT_MAX_TEST_POINTS: usize = 64;
    pub const DEFAULT_SPAWN_SEARCH_RADIUS: f32 = 150.0;
    pub const DEFAULT_VERTICAL_WEIGHT: f32 = 3.0;
    pub const DEFAULT_SCAN_INTERVAL: f32 = 10.0;
    pub const DEFAULT_SHARED_TIMER_MARGIN: f32 = 0.2;
    pub const DEFAULT_MIN_DEPARTURE_REMAINING: f32 = 1.0;
    pub const DEFAULT_RETRY_DELAY: f32 = 10.0;
    pub const DEFAULT_MIN_DISTANCE_TO_EXTRACTION: f32 = 10.0;
    pub const DEFAULT_SQUAD_OFFSET_RADIUS: f32 = 2.0;
    pub const DEFAULT_SQUAD_SNAP_RADIUS: f32 = 1.0;

    pub fn new() -> Self {
        Self {
            default_search_radius: Self::DEFAULT_SEARCH_RADIUS,
            max_search_radius: Self::DEFAULT_MAX_SEARCH_RADIUS,
            projection_margin: Self::DEFAULT_PROJECTION_MARGIN,
            initial_density: Self::DEFAULT_INITIAL_DENSITY,
            min_density: Self::DEFAULT_MIN_DENSITY,
            max_test_points: Self::DEFAULT_MAX_TEST_POINTS,
            spawn_search_radius: Self::DEFAULT_SPAWN_SEARCH_RADIUS,
            vertical_weight: Self::DEFAULT_VERTICAL_WEIGHT,
            scan_interval: Self::DEFAULT_SCAN_INTERVAL,
            shared_timer_margin: Self::DEFAULT_SHARED_TIMER_MARGIN,
            min_departure_remaining: Self::DEFAULT_MIN_DEPARTURE_REMAINING,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            min_distance_to_extraction: Self::DEFAULT_MIN_DISTANCE_TO_EXTRACTION,
            squad_offset_radius: Self::DEFAULT_SQUAD_OFFSET_RADIUS,
            squad_snap_radius: Self::DEFAULT_SQUAD_SNAP_RADIUS,
        }
    }

    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("extraction.default_search_radius", self.default_search_radius)?;
        positive("extraction.max_search_radius", self.max_search_radius)?;
        positive("extraction.initial_density", self.initial_density)?;
        positive("extraction.min_density", self.min_density)?;
        positive("extraction.scan_interval", self.scan_interval)?;
        positive("extraction.retry_delay", self.retry_delay)?;
        if self.min_density > self.initial_density {
            return Err(ConfigError::DensityRange {
                min: self.min_density,
                initial: self.initial_density,
            });
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}
