use crate::schedule::{RouteStop, StopFacility};

use geo::Point;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The identity of a [`StopOccurrence`].
pub type StopKey = Arc<str>;

/// One occurrence of a stop within a route's stop sequence.
///
/// The same facility may be served more than once by a route (for example,
/// a loop line), and each occurrence receives its own candidate set.
/// Hence, the identity is composed of the line, route, facility and both
/// offsets, rather than the facility alone.
#[derive(Debug, Clone)]
pub struct StopOccurrence {
    key: StopKey,

    pub line_id: Arc<str>,
    pub route_id: Arc<str>,
    pub stop: RouteStop,
}

impl StopOccurrence {
    pub fn new(line_id: &str, route_id: &str, stop: RouteStop) -> Self {
        let offset = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| escape(&v.to_string()));

        let key = format!(
            "{}.{}.{}.{}.{}",
            escape(line_id),
            escape(route_id),
            escape(&stop.facility.id),
            offset(stop.arrival_offset),
            offset(stop.departure_offset)
        );

        Self {
            key: Arc::from(key),
            line_id: Arc::from(line_id),
            route_id: Arc::from(route_id),
            stop,
        }
    }

    #[inline]
    pub fn key(&self) -> &StopKey {
        &self.key
    }

    #[inline]
    pub fn facility(&self) -> &StopFacility {
        &self.stop.facility
    }

    /// The position of the stop's facility, if it has one.
    #[inline]
    pub fn position(&self) -> Option<Point> {
        self.stop.facility.position
    }

    /// The time at which the vehicle leaves the stop, falling back to its arrival.
    pub fn departure(&self) -> Option<f64> {
        self.stop.departure_offset.or(self.stop.arrival_offset)
    }

    /// The time at which the vehicle reaches the stop, falling back to its departure.
    pub fn arrival(&self) -> Option<f64> {
        self.stop.arrival_offset.or(self.stop.departure_offset)
    }
}

/// Escapes the separator of a key component, so that distinct
/// components never compose the same key.
fn escape(component: &str) -> String {
    component.replace('\\', "\\\\").replace('.', "\\.")
}

impl PartialEq for StopOccurrence {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for StopOccurrence {}

impl Hash for StopOccurrence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Display for StopOccurrence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}
