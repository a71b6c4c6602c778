//! WGS84 <-> Pseudo-Mercator (EPSG:3857) conversion.
//!
//! Formulas per <https://wiki.openstreetmap.org/wiki/Mercator>, valid up to
//! roughly 85.05 degrees of latitude.

use std::f64::consts::PI;

use crate::foundation::error::{TracemapError, TracemapResult};
use crate::geo::position::{Position, PositionUnit};

/// Equatorial radius in meters.
pub const EARTH_RADIUS_M: f64 = 6378137.0;

/// Equatorial circumference in meters.
pub const CIRCUMFERENCE_M: f64 = 2.0 * PI * EARTH_RADIUS_M;

pub fn lat_to_y(lat_deg: f64) -> f64 {
    (PI / 4.0 + lat_deg.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M
}

pub fn lon_to_x(lon_deg: f64) -> f64 {
    lon_deg.to_radians() * EARTH_RADIUS_M
}

pub fn y_to_lat(y: f64) -> f64 {
    ((y / EARTH_RADIUS_M).exp().atan() * 2.0 - PI / 2.0).to_degrees()
}

pub fn x_to_lon(x: f64) -> f64 {
    (x / EARTH_RADIUS_M).to_degrees()
}

/// Projects a WGS84 position into Mercator meters. The result owns the
/// input as its derivation ancestor.
pub fn to_mercator(pos: &Position) -> TracemapResult<Position> {
    if pos.unit() != PositionUnit::Wgs84 {
        return Err(TracemapError::unit_conversion(format!(
            "to_mercator expects a WGS84 position, this={pos}"
        )));
    }
    Ok(Position::derived(
        pos.time(),
        lat_to_y(pos.coord1()),
        lon_to_x(pos.coord2()),
        PositionUnit::Mercator,
        pos.clone(),
    ))
}

/// Inverse of [`to_mercator`].
pub fn from_mercator_to_wgs84(pos: &Position) -> Position {
    Position::derived(
        pos.time(),
        y_to_lat(pos.coord1()),
        x_to_lon(pos.coord2()),
        PositionUnit::Wgs84,
        pos.clone(),
    )
}

/// Approximate ground distance between two positions in meters.
///
/// Takes the Euclidean distance in Mercator meters and divides it by a
/// Simpson's-rule average of the secant of latitude at the endpoints,
/// correcting Mercator's latitude-dependent stretch. Not geodesically exact:
/// empirically within a few percent over spans of tens of kilometers.
pub fn distance_meters(a: &Position, b: &Position) -> TracemapResult<f64> {
    let ma = a.get_mercator()?;
    let mb = b.get_mercator()?;
    let lat_a = a.get_wgs84()?.coord1().to_radians();
    let lat_b = b.get_wgs84()?.coord1().to_radians();

    fn sec(x: f64) -> f64 {
        1.0 / x.cos()
    }
    let factor = (sec(lat_a) + sec(lat_b) + 4.0 * sec((lat_a + lat_b) / 2.0)) / 6.0;

    let dx = ma.coord2() - mb.coord2();
    let dy = ma.coord1() - mb.coord1();
    Ok((dx * dx + dy * dy).sqrt() / factor)
}
