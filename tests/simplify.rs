use chrono::{Duration, TimeZone, Utc};
use tracemap::{skip_too_close, smooth_chaikin, Position, PositionUnit};

fn px(seconds: i64, y: f64, x: f64) -> Position {
    let t = Utc.with_ymd_and_hms(2019, 7, 7, 12, 0, 0).unwrap() + Duration::seconds(seconds);
    Position::new(t, y, x, PositionUnit::Pixel)
}

#[test]
fn decimation_then_smoothing_keeps_endpoints_and_chronology() {
    // A noisy staircase: clusters of near-duplicate fixes along an L shape.
    let mut points = Vec::new();
    for i in 0..200i64 {
        let along = i as f64;
        let (y, x) = if i < 100 { (0.0, along) } else { (along - 100.0, 100.0) };
        points.push(px(i, y + (i % 3) as f64 * 0.1, x));
    }
    let first = points[0].clone();
    let last = points[points.len() - 1].clone();

    let decimated = skip_too_close(points, 7.0);
    assert!(decimated.len() < 200);
    for pair in decimated.windows(2) {
        assert!(pair[1].distance_square(&pair[0]) > 49.0);
    }

    let smoothed = smooth_chaikin(decimated, 0.75, 3);
    assert_eq!(smoothed.first(), Some(&first));
    assert_eq!(smoothed.last(), Some(&last));
    for pair in smoothed.windows(2) {
        assert!(pair[0].time() <= pair[1].time());
    }
}

#[test]
fn smoothing_cuts_the_corner_inside_the_hull() {
    // A right angle through (0, 100); after corner cutting no point should
    // still sit at the apex, and everything stays inside the angle's hull.
    let points = vec![px(0, 0.0, 0.0), px(10, 0.0, 100.0), px(20, 100.0, 100.0)];
    let smoothed = smooth_chaikin(points, 0.75, 2);

    assert!(smoothed
        .iter()
        .all(|p| !(p.coord1() == 0.0 && p.coord2() == 100.0)));
    for p in &smoothed {
        assert!((0.0..=100.0).contains(&p.coord1()), "{p}");
        assert!((0.0..=100.0).contains(&p.coord2()), "{p}");
    }
}

#[test]
fn stationary_noise_collapses_to_one_point() {
    // Standing still: GPS jitter within a couple of pixels.
    let points: Vec<_> = (0..50)
        .map(|i| px(i, (i % 2) as f64, (i % 3) as f64))
        .collect();
    let decimated = skip_too_close(points, 7.0);
    assert_eq!(decimated.len(), 1);
}

#[test]
fn zero_threshold_keeps_distinct_points() {
    let points = vec![px(0, 0.0, 0.0), px(1, 0.0, 1.0), px(2, 0.0, 2.0)];
    assert_eq!(skip_too_close(points.clone(), 0.0), points);
}
