use crate::candidate::{
    assign_priorities, reduce_single_file, separate, CandidateError, LinkCandidate, LinkCandidates,
    RawSet,
};
use crate::config::{MapperConfig, ModeParams};
use crate::diagnostics::{Counter, Diagnostics};
use crate::network::{Mode, Network, Scan, SearchBounds};
use crate::schedule::{Schedule, StopKey, StopOccurrence, TransitLine, TransitRoute};

use geo::Point;
use log::{debug, info};
use measure_time::debug_time;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::Level;

/// Produces the candidates of every stop occurrence in a schedule.
pub trait CandidateBuilder {
    /// Builds the candidates of every route in the schedule.
    ///
    /// Loop links fabricated for stops without a candidate are
    /// inserted into the `network`, hence it is borrowed mutably.
    fn build(&self, network: &mut Network, schedule: &Schedule) -> crate::Result<CandidateStore>;
}

/// The candidates of every stop occurrence, by occurrence key.
#[derive(Debug, Default)]
pub struct CandidateStore {
    candidates: FxHashMap<StopKey, LinkCandidates>,
}

impl CandidateStore {
    pub fn get_candidates(&self, stop: &StopOccurrence) -> Option<&LinkCandidates> {
        self.candidates.get(stop.key())
    }

    pub fn get(&self, key: &str) -> Option<&LinkCandidates> {
        self.candidates.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StopKey, &LinkCandidates)> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub(crate) fn insert(&mut self, key: StopKey, candidates: LinkCandidates) {
        self.candidates.insert(key, candidates);
    }

    pub(crate) fn take(&mut self, key: &StopKey) -> Option<LinkCandidates> {
        self.candidates.remove(key)
    }
}

/// A stop occurrence whose raw candidates have been refined,
/// awaiting scoring.
#[derive(Debug)]
pub(crate) struct PendingStop {
    pub occurrence: StopOccurrence,
    pub position: Point,
    pub schedule_mode: Mode,
    pub params: ModeParams,
    pub set: RawSet,
}

impl PendingStop {
    fn needs_loop_link(&self) -> bool {
        self.params.artificial_links_only || self.set.is_empty()
    }
}

/// The [`CandidateBuilder`] searching the network for each stop,
/// as configured by a [`MapperConfig`]. Building fails early should
/// the configuration not validate.
#[derive(Debug)]
pub struct LinkCandidateBuilder {
    pub(crate) config: MapperConfig,
    pub(crate) diagnostics: Arc<Diagnostics>,
}

impl LinkCandidateBuilder {
    pub fn new(config: MapperConfig, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The parameters of a schedule mode. A mode without parameters may
    /// travel no network mode, leaving its stops with loop links only.
    pub(crate) fn params(&self, schedule_mode: &Mode) -> Cow<'_, ModeParams> {
        match self.config.params(schedule_mode) {
            Some(params) => Cow::Borrowed(params),
            None => {
                self.diagnostics.warn(format!(
                    "No mode parameters configured for schedule mode {schedule_mode}, \
                    its stops can only be served by loop links"
                ));
                Cow::Owned(ModeParams::default())
            }
        }
    }

    /// The raw candidates of a single stop occurrence.
    fn raw_candidates(
        &self,
        network: &Network,
        occurrence: &StopOccurrence,
        position: Point,
        params: &ModeParams,
    ) -> RawSet {
        if params.artificial_links_only {
            return RawSet::default();
        }

        let facility = occurrence.facility();
        if let Some(link_ref) = &facility.link_ref {
            match network.link_ix(link_ref) {
                Some(link) => return RawSet::preassigned(network, link, &position),
                None => self.diagnostics.warn(format!(
                    "Stop facility {} references unknown link {link_ref}, searching instead",
                    facility.id
                )),
            }
        }

        let bounds = SearchBounds {
            search_radius: self.config.node_search_radius,
            max_count: params.max_candidate_count,
            tolerance_factor: params.distance_tolerance_factor,
            max_distance: params.max_candidate_distance,
        };

        let hits = network.find_closest_links_bounded(&position, bounds, Some(&params.network_modes));
        RawSet::searched(network, hits)
    }

    /// Searches, separates and reduces the raw candidates of every stop of a route.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::DEBUG, skip_all, fields(route = %route.id)))]
    pub(crate) fn route_candidates(
        &self,
        network: &Network,
        line: &TransitLine,
        route: &TransitRoute,
    ) -> Result<Vec<PendingStop>, CandidateError> {
        let params = self.params(&route.transport_mode);

        let mut pending = route
            .occurrences(&line.id)
            .into_iter()
            .map(|occurrence| {
                let position = occurrence.position().ok_or_else(|| CandidateError::MissingCoordinate {
                    facility: occurrence.facility().id.clone(),
                    route: route.id.clone(),
                })?;

                let set = self.raw_candidates(network, &occurrence, position, &params);

                Ok(PendingStop {
                    occurrence,
                    position,
                    schedule_mode: route.transport_mode.clone(),
                    params: params.clone().into_owned(),
                    set,
                })
            })
            .collect::<Result<Vec<_>, CandidateError>>()?;

        for index in 1..pending.len() {
            let (before, after) = pending.split_at_mut(index);
            if let (Some(previous), Some(current)) = (before.last_mut(), after.first_mut()) {
                separate(network, &mut previous.set, &mut current.set)?;
            }
        }

        pending
            .iter_mut()
            .for_each(|stop| reduce_single_file(network, &mut stop.set));

        Ok(pending)
    }

    /// Scores the refined stops, fabricating loop links where required.
    /// Must run sequentially, as it may insert into the network.
    fn score(&self, network: &mut Network, pending: &[PendingStop]) -> crate::Result<CandidateStore> {
        let mut store = CandidateStore::default();

        for stop in pending {
            let facility = stop.occurrence.facility();

            let links = if stop.needs_loop_link() {
                if !stop.params.artificial_links_only {
                    self.diagnostics.increment(Counter::EmptySearches);
                    self.diagnostics.warn(format!(
                        "No link candidates found for stop facility {}, using a loop link",
                        facility.id
                    ));
                }

                let existing = network.existing_loop_link(&facility.id);
                let link = network.loop_link(&facility.id, stop.position, &stop.params.network_modes)?;

                if existing.is_none() {
                    self.diagnostics.increment(Counter::LoopLinks);
                }

                vec![link]
            } else {
                stop.set.links().collect()
            };

            let mut candidates = links
                .into_iter()
                .map(|link| LinkCandidate::new(network, link, &stop.occurrence, stop.position))
                .collect::<Vec<_>>();

            assign_priorities(&mut candidates);
            store.insert(Arc::clone(stop.occurrence.key()), LinkCandidates::new(candidates));
        }

        Ok(store)
    }
}

impl CandidateBuilder for LinkCandidateBuilder {
    #[cfg_attr(feature = "tracing", tracing::instrument(level = Level::INFO, skip_all))]
    fn build(&self, network: &mut Network, schedule: &Schedule) -> crate::Result<CandidateStore> {
        debug_time!("candidate generation");
        self.config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads)
            .build()?;

        let routes = schedule.routes().collect::<Vec<_>>();
        info!(
            "Generating candidates for {} routes on {} threads",
            routes.len(),
            pool.current_num_threads()
        );

        let pending = {
            debug_time!("candidate search");
            let network: &Network = network;

            pool.install(|| {
                routes
                    .par_iter()
                    .map(|(line, route)| self.route_candidates(network, line, route))
                    .collect::<Result<Vec<_>, CandidateError>>()
            })?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
        };

        let mut store = {
            debug_time!("candidate scoring");
            self.score(network, &pending)?
        };

        self.apply_overrides(network, &pending, &mut store);

        debug!("Generated candidates for {} stop occurrences", store.len());
        Ok(store)
    }
}
