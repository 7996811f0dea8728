//! The transit schedule, as handed over by the feed parsers.
//!
//! Only the parts the mapper consumes are modelled: the ordered stops of
//! every route, their facilities and offsets, the route's schedule mode
//! and its optional shape reference.

#[doc(hidden)]
pub mod occurrence;


#[doc(inline)]
pub use occurrence::*;

use crate::network::Mode;

use geo::Point;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A physical stop (or platform), served by any number of routes.
#[derive(Debug, Clone, PartialEq)]
pub struct StopFacility {
    pub id: String,
    pub name: Option<String>,

    /// The projected position of the facility. Candidate search cannot
    /// work without one, so an absent position is a configuration error.
    pub position: Option<Point>,

    /// The parent station (stop area) the facility belongs to.
    pub parent_station: Option<String>,

    /// A link the facility was already assigned to, by link identifier.
    pub link_ref: Option<String>,
}

impl StopFacility {
    pub fn new(id: impl Into<String>, position: Option<Point>) -> Self {
        Self {
            id: id.into(),
            name: None,
            position,
            parent_station: None,
            link_ref: None,
        }
    }

    pub fn with_link_ref(self, link: impl Into<String>) -> Self {
        Self {
            link_ref: Some(link.into()),
            ..self
        }
    }

    pub fn with_parent_station(self, station: impl Into<String>) -> Self {
        Self {
            parent_station: Some(station.into()),
            ..self
        }
    }
}

/// A stop within a route's stop sequence. Offsets are in seconds,
/// relative to the departure of the route from its first stop.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub facility: Arc<StopFacility>,
    pub arrival_offset: Option<f64>,
    pub departure_offset: Option<f64>,
}

impl RouteStop {
    pub fn new(
        facility: Arc<StopFacility>,
        arrival_offset: Option<f64>,
        departure_offset: Option<f64>,
    ) -> Self {
        Self {
            facility,
            arrival_offset,
            departure_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitRoute {
    pub id: String,
    pub transport_mode: Mode,
    pub stops: Vec<RouteStop>,

    /// Identifier of the GTFS shape the route follows, if known.
    pub shape_id: Option<String>,
}

impl TransitRoute {
    pub fn new(id: impl Into<String>, transport_mode: Mode, stops: Vec<RouteStop>) -> Self {
        Self {
            id: id.into(),
            transport_mode,
            stops,
            shape_id: None,
        }
    }

    pub fn with_shape(self, shape: impl Into<String>) -> Self {
        Self {
            shape_id: Some(shape.into()),
            ..self
        }
    }

    /// The stop occurrences of the route, in stop-sequence order.
    pub fn occurrences(&self, line_id: &str) -> Vec<StopOccurrence> {
        self.stops
            .iter()
            .map(|stop| StopOccurrence::new(line_id, &self.id, stop.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitLine {
    pub id: String,
    pub routes: Vec<TransitRoute>,
}

impl TransitLine {
    pub fn new(id: impl Into<String>, routes: Vec<TransitRoute>) -> Self {
        Self {
            id: id.into(),
            routes,
        }
    }
}

/// The schedule, holding lines by identifier so that
/// iteration (and therefore every result) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    lines: BTreeMap<String, TransitLine>,
    facilities: FxHashMap<String, Arc<StopFacility>>,
}

impl Schedule {
    /// Adds a line, registering the facilities its routes stop at.
    /// A line with an existing identifier is replaced.
    pub fn add_line(&mut self, line: TransitLine) {
        line.routes
            .iter()
            .flat_map(|route| route.stops.iter())
            .for_each(|stop| {
                self.facilities
                    .entry(stop.facility.id.clone())
                    .or_insert_with(|| Arc::clone(&stop.facility));
            });

        self.lines.insert(line.id.clone(), line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &TransitLine> {
        self.lines.values()
    }

    /// Every route, paired with its line, ordered by (line id, route order).
    pub fn routes(&self) -> impl Iterator<Item = (&TransitLine, &TransitRoute)> {
        self.lines
            .values()
            .flat_map(|line| line.routes.iter().map(move |route| (line, route)))
    }

    pub fn facility(&self, id: &str) -> Option<&Arc<StopFacility>> {
        self.facilities.get(id)
    }

    pub fn facilities(&self) -> impl Iterator<Item = &Arc<StopFacility>> {
        self.facilities.values()
    }

    pub fn route_count(&self) -> usize {
        self.lines.values().map(|line| line.routes.len()).sum()
    }
}
