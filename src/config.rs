//! Mapping configuration.
//!
//! Every value has a default, so a configuration file only needs to name
//! what it changes. Values may be overridden from the environment, see
//! [`MapperConfig::with_env_overrides`].

use crate::costing::TravelCostType;
use crate::network::{Mode, ModeSet};

use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Overrides [`MapperConfig::num_threads`].
pub const ENV_NUM_THREADS: &str = "PTMAPPER_NUM_THREADS";

/// Overrides [`MapperConfig::node_search_radius`].
pub const ENV_NODE_SEARCH_RADIUS: &str = "PTMAPPER_NODE_SEARCH_RADIUS";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("node search radius must be positive, got {0}")]
    InvalidSearchRadius(f64),

    #[error("mode {mode}: maximum candidate distance must not be negative, got {distance}")]
    InvalidCandidateDistance { mode: Mode, distance: f64 },

    #[error("mode {0}: maximum candidate count must be at least one")]
    ZeroCandidateCount(Mode),

    #[error("{name} must be positive, got {value}")]
    NonPositiveFactor { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    NegativeValue { name: &'static str, value: f64 },

    #[error("worker pool needs at least one thread")]
    ZeroThreads,

    #[error("could not parse environment variable {name}={value}")]
    InvalidEnvironment { name: &'static str, value: String },
}

/// Candidate search parameters for one schedule mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeParams {
    /// The network modes a route of this schedule mode may travel on.
    pub network_modes: ModeSet,

    /// Links further than this from a stop are never candidates.
    pub max_candidate_distance: f64,

    /// The number of candidates after which only near-ties are admitted.
    pub max_candidate_count: usize,

    /// Slack applied to the distance of the last regular candidate.
    pub distance_tolerance_factor: f64,

    /// Skip the search, giving every stop its own loop link.
    pub artificial_links_only: bool,
}

impl Default for ModeParams {
    fn default() -> Self {
        Self {
            network_modes: ModeSet::new(),
            max_candidate_distance: 90.0,
            max_candidate_count: 6,
            distance_tolerance_factor: 1.6,
            artificial_links_only: false,
        }
    }
}

impl ModeParams {
    pub fn new<'a>(network_modes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            network_modes: crate::network::modes(network_modes),
            ..Self::default()
        }
    }

    pub fn artificial() -> Self {
        Self {
            artificial_links_only: true,
            ..Self::default()
        }
    }

    pub fn max_candidate_distance(self, max_candidate_distance: f64) -> Self {
        Self {
            max_candidate_distance,
            ..self
        }
    }

    pub fn max_candidate_count(self, max_candidate_count: usize) -> Self {
        Self {
            max_candidate_count,
            ..self
        }
    }

    pub fn distance_tolerance_factor(self, distance_tolerance_factor: f64) -> Self {
        Self {
            distance_tolerance_factor,
            ..self
        }
    }
}

/// Multipliers applied to a link depending on its distance to the route's shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "profile", rename_all = "snake_case")]
pub enum ShapeBiasConfig {
    /// Rewards links within `near_distance`, ramping linearly up to a
    /// penalty of `far_factor` at `far_distance` and beyond.
    Graded {
        near_distance: f64,
        far_distance: f64,
        near_factor: f64,
        far_factor: f64,
    },

    /// Rewards links within `near_distance`, leaving all others untouched.
    Simple { near_distance: f64, near_factor: f64 },
}

impl Default for ShapeBiasConfig {
    fn default() -> Self {
        ShapeBiasConfig::Graded {
            near_distance: 20.0,
            far_distance: 100.0,
            near_factor: 0.85,
            far_factor: 3.0,
        }
    }
}

impl ShapeBiasConfig {
    pub fn simple() -> Self {
        ShapeBiasConfig::Simple {
            near_distance: 20.0,
            near_factor: 0.8,
        }
    }

    /// The cost multiplier for a link `distance` away from the shape.
    pub fn multiplier(&self, distance: f64) -> f64 {
        match *self {
            ShapeBiasConfig::Graded {
                near_distance,
                far_distance,
                near_factor,
                far_factor,
            } => {
                if distance < near_distance {
                    near_factor
                } else if distance >= far_distance {
                    far_factor
                } else {
                    let ramp = (distance - near_distance) / (far_distance - near_distance);
                    near_factor + (far_factor - near_factor) * ramp
                }
            }
            ShapeBiasConfig::Simple {
                near_distance,
                near_factor,
            } => {
                if distance < near_distance {
                    near_factor
                } else {
                    1.0
                }
            }
        }
    }
}

/// Decorations applied upon the base link cost of every router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostingConfig {
    /// Applied by routers built for a route shape. No bias when absent.
    pub shape_bias: Option<ShapeBiasConfig>,

    /// Added to the link reversing the link a path query departs from.
    pub u_turn_penalty: f64,

    /// Multiplier for links known to be travelled by the schedule mode.
    pub osm_route_bonus: f64,

    /// Weight of a candidate's distance to its stop in its own cost.
    /// A weight of `1` adds twice the distance, `0` disables the bias.
    pub candidate_distance_weight: f64,
}

impl Default for CostingConfig {
    fn default() -> Self {
        Self {
            shape_bias: Some(ShapeBiasConfig::default()),
            u_turn_penalty: 0.0,
            osm_route_bonus: 1.0,
            candidate_distance_weight: 0.0,
        }
    }
}

/// Links an operator assigns to a stop facility by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualCandidates {
    pub facility_id: String,

    /// Schedule modes the override applies to. Empty applies to all.
    #[serde(default)]
    pub schedule_modes: ModeSet,

    pub link_ids: Vec<String>,

    /// Discard the computed candidates instead of extending them.
    #[serde(default)]
    pub replace: bool,
}

impl ManualCandidates {
    pub fn new<'a>(facility_id: impl Into<String>, link_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            facility_id: facility_id.into(),
            schedule_modes: ModeSet::new(),
            link_ids: link_ids.into_iter().map(String::from).collect(),
            replace: false,
        }
    }

    pub fn replacing(self) -> Self {
        Self {
            replace: true,
            ..self
        }
    }

    pub fn for_modes<'a>(self, modes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            schedule_modes: crate::network::modes(modes),
            ..self
        }
    }

    pub fn applies_to(&self, facility: &str, mode: &Mode) -> bool {
        self.facility_id == facility
            && (self.schedule_modes.is_empty() || self.schedule_modes.contains(mode))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Radius around a stop in which network nodes are collected.
    pub node_search_radius: f64,

    pub travel_cost_type: TravelCostType,

    /// Size of the worker pool. Defaults to the available parallelism.
    pub num_threads: usize,

    /// Candidate search parameters, by schedule mode.
    pub mode_params: FxHashMap<Mode, ModeParams>,

    pub costing: CostingConfig,

    /// Build one router per route shape, rather than per schedule mode.
    pub route_by_shape: bool,

    pub manual_candidates: Vec<ManualCandidates>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            node_search_radius: 500.0,
            travel_cost_type: TravelCostType::default(),
            num_threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            mode_params: FxHashMap::default(),
            costing: CostingConfig::default(),
            route_by_shape: false,
            manual_candidates: Vec::new(),
        }
    }
}

impl MapperConfig {
    pub fn with_mode(mut self, schedule_mode: &str, params: ModeParams) -> Self {
        self.mode_params.insert(Mode::from(schedule_mode), params);
        self
    }

    pub fn with_search_radius(self, node_search_radius: f64) -> Self {
        Self {
            node_search_radius,
            ..self
        }
    }

    pub fn with_cost_type(self, travel_cost_type: TravelCostType) -> Self {
        Self {
            travel_cost_type,
            ..self
        }
    }

    pub fn with_threads(self, num_threads: usize) -> Self {
        Self { num_threads, ..self }
    }

    pub fn with_costing(self, costing: CostingConfig) -> Self {
        Self { costing, ..self }
    }

    pub fn with_route_by_shape(self, route_by_shape: bool) -> Self {
        Self {
            route_by_shape,
            ..self
        }
    }

    pub fn with_manual_candidates(mut self, manual: ManualCandidates) -> Self {
        self.manual_candidates.push(manual);
        self
    }

    /// The parameters of a schedule mode, if any were configured.
    pub fn params(&self, schedule_mode: &Mode) -> Option<&ModeParams> {
        self.mode_params.get(schedule_mode)
    }

    /// Applies overrides given in the environment, loading a `.env`
    /// file from the working directory first if one is present.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_err() {
            debug!("No .env file loaded");
        }

        let mut config = self;

        if let Some(threads) = read_env::<usize>(ENV_NUM_THREADS)? {
            config.num_threads = threads;
        }

        if let Some(radius) = read_env::<f64>(ENV_NODE_SEARCH_RADIUS)? {
            config.node_search_radius = radius;
        }

        Ok(config)
    }

    /// Rejects values the mapper cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_search_radius.is_nan() || self.node_search_radius <= 0.0 {
            return Err(ConfigError::InvalidSearchRadius(self.node_search_radius));
        }

        if self.num_threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        for (mode, params) in &self.mode_params {
            if params.max_candidate_distance < 0.0 || params.max_candidate_distance.is_nan() {
                return Err(ConfigError::InvalidCandidateDistance {
                    mode: mode.clone(),
                    distance: params.max_candidate_distance,
                });
            }

            let tolerance = params.distance_tolerance_factor;
            if tolerance.is_nan() || tolerance < 0.0 {
                return Err(ConfigError::NegativeValue {
                    name: "distance_tolerance_factor",
                    value: tolerance,
                });
            }

            if params.max_candidate_count == 0 && !params.artificial_links_only {
                return Err(ConfigError::ZeroCandidateCount(mode.clone()));
            }

            if params.max_candidate_distance > self.node_search_radius {
                warn!(
                    "Mode {mode} admits candidates up to {} away, beyond the node search radius of {}",
                    params.max_candidate_distance, self.node_search_radius
                );
            }
        }

        let costing = &self.costing;
        positive("osm_route_bonus", costing.osm_route_bonus)?;
        non_negative("u_turn_penalty", costing.u_turn_penalty)?;
        non_negative("candidate_distance_weight", costing.candidate_distance_weight)?;

        match costing.shape_bias {
            Some(ShapeBiasConfig::Graded {
                near_distance,
                far_distance,
                near_factor,
                far_factor,
            }) => {
                positive("shape_bias.near_factor", near_factor)?;
                positive("shape_bias.far_factor", far_factor)?;
                non_negative("shape_bias.near_distance", near_distance)?;
                positive("shape_bias.far_distance - near_distance", far_distance - near_distance)?;
            }
            Some(ShapeBiasConfig::Simple {
                near_distance,
                near_factor,
            }) => {
                positive("shape_bias.near_factor", near_factor)?;
                non_negative("shape_bias.near_distance", near_distance)?;
            }
            None => {}
        }

        Ok(())
    }
}

fn read_env<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvironment { name, value }),
        Err(_) => Ok(None),
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveFactor { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeValue { name, value })
    }
}
