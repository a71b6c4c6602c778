use crate::foundation::error::{TracemapError, TracemapResult};
use crate::geo::position::Position;

/// An axis-aligned box in a single coordinate system.
///
/// `min < max` must hold on both axes; violating that is a caller bug (an
/// empty or inverted input track), caught at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> TracemapResult<Self> {
        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(TracemapError::invalid_bounding_box(format!(
                "min must be < max on both axes: lat [{min_lat}, {max_lat}], lon [{min_lon}, {max_lon}]"
            )));
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// The smallest box containing every point. All points must share one
    /// coordinate system; a degenerate (single-point or collinear) set fails
    /// the `min < max` check.
    pub fn from_positions(points: &[Position]) -> TracemapResult<Self> {
        if points.is_empty() {
            return Err(TracemapError::invalid_bounding_box(
                "no points to compute a bounding box from",
            ));
        }
        let mut min_lat = f64::INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        for p in points {
            min_lat = min_lat.min(p.coord1());
            max_lat = max_lat.max(p.coord1());
            min_lon = min_lon.min(p.coord2());
            max_lon = max_lon.max(p.coord2());
        }
        Self::new(min_lat, min_lon, max_lat, max_lon)
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn middle_lat(&self) -> f64 {
        self.lat_span() / 2.0 + self.min_lat
    }

    pub fn middle_lon(&self) -> f64 {
        self.lon_span() / 2.0 + self.min_lon
    }

    /// Corners as (lat, lon) pairs.
    pub fn upper_left(&self) -> (f64, f64) {
        (self.max_lat, self.min_lon)
    }

    pub fn upper_right(&self) -> (f64, f64) {
        (self.max_lat, self.max_lon)
    }

    pub fn lower_left(&self) -> (f64, f64) {
        (self.min_lat, self.min_lon)
    }

    pub fn lower_right(&self) -> (f64, f64) {
        (self.min_lat, self.max_lon)
    }
}
