use chrono::{DateTime, Utc};

use crate::foundation::error::{TracemapError, TracemapResult};
use crate::geo::projection;

/// Coordinate system a [`Position`] is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PositionUnit {
    /// EPSG:4326 WGS 84 (degrees latitude/longitude).
    Wgs84,
    /// EPSG:3857 WGS 84 / Pseudo-Mercator (meters).
    Mercator,
    /// Canvas pixels (row/column, y grows downward).
    Pixel,
}

/// An immutable timestamped point in one coordinate system.
///
/// `coord1` is the latitude-like axis (latitude degrees, mercator y, or pixel
/// row), `coord2` the longitude-like axis (longitude degrees, mercator x, or
/// pixel column).
///
/// When a position is produced by a unit transform it owns the original as
/// `derived_from`, forming an acyclic ancestry chain. Converting back to an
/// earlier unit walks that chain; a unit that is not reachable through the
/// chain (and not computable, see [`Position::get_wgs84`]) is an error.
#[derive(Clone, Debug, PartialEq)]
pub struct Position {
    time: DateTime<Utc>,
    coord1: f64,
    coord2: f64,
    unit: PositionUnit,
    dilution_of_precision: f64,
    derived_from: Option<Box<Position>>,
}

impl Position {
    pub fn new(time: DateTime<Utc>, coord1: f64, coord2: f64, unit: PositionUnit) -> Self {
        Self {
            time,
            coord1,
            coord2,
            unit,
            dilution_of_precision: 0.0,
            derived_from: None,
        }
    }

    pub fn with_dop(
        time: DateTime<Utc>,
        coord1: f64,
        coord2: f64,
        unit: PositionUnit,
        dilution_of_precision: f64,
    ) -> Self {
        Self {
            dilution_of_precision,
            ..Self::new(time, coord1, coord2, unit)
        }
    }

    /// A position produced by transforming `parent` into another unit.
    pub fn derived(
        time: DateTime<Utc>,
        coord1: f64,
        coord2: f64,
        unit: PositionUnit,
        parent: Position,
    ) -> Self {
        Self {
            derived_from: Some(Box::new(parent)),
            ..Self::new(time, coord1, coord2, unit)
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn coord1(&self) -> f64 {
        self.coord1
    }

    pub fn coord2(&self) -> f64 {
        self.coord2
    }

    pub fn unit(&self) -> PositionUnit {
        self.unit
    }

    /// Fix quality from GPS, 0 when unknown.
    pub fn dilution_of_precision(&self) -> f64 {
        self.dilution_of_precision
    }

    pub fn derived_from(&self) -> Option<&Position> {
        self.derived_from.as_deref()
    }

    /// Squared distance in this position's own units, no square root taken.
    pub fn distance_square(&self, other: &Position) -> f64 {
        let d1 = self.coord1 - other.coord1;
        let d2 = self.coord2 - other.coord2;
        d1 * d1 + d2 * d2
    }

    /// Walks the derivation chain to the nearest Mercator position.
    pub fn get_mercator(&self) -> TracemapResult<&Position> {
        let mut current = Some(self);
        while let Some(p) = current {
            if p.unit == PositionUnit::Mercator {
                return Ok(p);
            }
            current = p.derived_from.as_deref();
        }
        Err(TracemapError::unit_conversion(format!(
            "can't derive mercator position, this={self}"
        )))
    }

    /// Walks the derivation chain to the nearest WGS84 position. If none
    /// exists but a Mercator ancestor does, the WGS84 coordinates are
    /// computed from it via the inverse projection instead of failing.
    pub fn get_wgs84(&self) -> TracemapResult<Position> {
        let mut current = Some(self);
        while let Some(p) = current {
            if p.unit == PositionUnit::Wgs84 {
                return Ok(p.clone());
            }
            current = p.derived_from.as_deref();
        }
        if let Ok(mercator) = self.get_mercator() {
            return Ok(projection::from_mercator_to_wgs84(mercator));
        }
        Err(TracemapError::unit_conversion(format!(
            "can't derive WGS84 position, this={self}"
        )))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {} [{:?}]",
            self.time, self.coord1, self.coord2, self.unit
        )
    }
}
