use chrono::{TimeZone, Utc};
use tracemap::{distance_meters, from_mercator_to_wgs84, to_mercator, Position, PositionUnit};

fn wgs(lat: f64, lon: f64) -> Position {
    let t = Utc.with_ymd_and_hms(2019, 7, 7, 12, 0, 0).unwrap();
    Position::new(t, lat, lon, PositionUnit::Wgs84)
}

#[test]
fn crimea_scenario_projects_to_known_mercator_values() {
    let p = to_mercator(&wgs(44.5, 33.4)).unwrap();
    assert!((p.coord1() - 5543147.20).abs() < 0.01, "y={}", p.coord1());
    assert!((p.coord2() - 3718070.99).abs() < 0.01, "x={}", p.coord2());
}

#[test]
fn southern_hemisphere_mirrors_the_projection() {
    let p = to_mercator(&wgs(-44.5, -33.4)).unwrap();
    assert!((p.coord1() + 5543147.20).abs() < 0.01, "y={}", p.coord1());
    assert!((p.coord2() + 3718070.99).abs() < 0.01, "x={}", p.coord2());
}

#[test]
fn inverse_projection_recovers_the_scenario_coordinates() {
    let t = Utc.with_ymd_and_hms(2019, 7, 7, 12, 0, 0).unwrap();
    let m = Position::new(t, 5543147.20, 3718070.99, PositionUnit::Mercator);
    let p = from_mercator_to_wgs84(&m);
    assert!((p.coord1() - 44.5).abs() < 1e-7);
    assert!((p.coord2() - 33.4).abs() < 1e-7);
}

#[test]
fn projection_round_trips_across_the_valid_latitude_range() {
    for lat_i in -85..=85 {
        for lon_i in (-180..=180).step_by(15) {
            let lat = f64::from(lat_i);
            let lon = f64::from(lon_i).clamp(-179.99, 179.99);
            let projected = to_mercator(&wgs(lat, lon)).unwrap();
            // Round-trip through the computed inverse, not the stored
            // ancestor, to exercise the formulas.
            let back = from_mercator_to_wgs84(&Position::new(
                projected.time(),
                projected.coord1(),
                projected.coord2(),
                PositionUnit::Mercator,
            ));
            assert!(
                (back.coord1() - lat).abs() < 1e-7,
                "lat {lat} -> {}",
                back.coord1()
            );
            assert!(
                (back.coord2() - lon).abs() < 1e-7,
                "lon {lon} -> {}",
                back.coord2()
            );
        }
    }
}

#[test]
fn distance_approximates_a_meridian_tenth_degree() {
    // 0.1 degree of latitude is about 11.1 km anywhere on the ellipsoid;
    // the Mercator/secant approximation should land within a few percent.
    let a = to_mercator(&wgs(44.45, 33.4)).unwrap();
    let b = to_mercator(&wgs(44.55, 33.4)).unwrap();
    let d = distance_meters(&a, &b).unwrap();
    assert!((d - 11_113.0).abs() < 350.0, "d={d}");
}

#[test]
fn distance_is_symmetric() {
    let a = to_mercator(&wgs(44.5, 33.4)).unwrap();
    let b = to_mercator(&wgs(44.9, 34.1)).unwrap();
    let d1 = distance_meters(&a, &b).unwrap();
    let d2 = distance_meters(&b, &a).unwrap();
    assert!((d1 - d2).abs() < 1e-9);
}
