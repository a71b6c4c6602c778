pub mod merge;
pub mod simplify;

use chrono::{DateTime, Utc};

use crate::geo::position::{Position, PositionUnit};

/// One record of the JSON track interchange format: a WGS84 fix with an
/// optional dilution-of-precision value (0 when the source had none).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub dilution_of_precision: f64,
}

impl TrackPoint {
    pub fn into_position(self) -> Position {
        Position::with_dop(
            self.time,
            self.latitude,
            self.longitude,
            PositionUnit::Wgs84,
            self.dilution_of_precision,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_point_deserializes_without_dop() {
        let p: TrackPoint = serde_json::from_str(
            r#"{"time": "2019-07-07T12:00:00Z", "latitude": 44.5, "longitude": 33.4}"#,
        )
        .unwrap();
        assert_eq!(p.dilution_of_precision, 0.0);
        let pos = p.into_position();
        assert_eq!(pos.unit(), PositionUnit::Wgs84);
        assert_eq!(pos.coord1(), 44.5);
        assert_eq!(pos.coord2(), 33.4);
    }
}
