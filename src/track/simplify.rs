//! Path simplification: distance decimation followed by Chaikin smoothing.
//!
//! Both passes run on pixel-space polylines. Decimation is intentionally
//! lossy: fewer points mean fewer draw/encode operations and smoother
//! Chaikin output.

use chrono::{DateTime, Duration, Utc};

use crate::geo::position::Position;

/// Drops every point whose squared distance to the last *kept* point is at
/// or below `threshold_px` squared. The first point is always kept; no
/// square root is taken.
pub fn skip_too_close(points: Vec<Position>, threshold_px: f64) -> Vec<Position> {
    let threshold_sq = threshold_px * threshold_px;
    let mut kept: Vec<Position> = Vec::with_capacity(points.len());
    for point in points {
        match kept.last() {
            Some(last) if point.distance_square(last) <= threshold_sq => {}
            _ => kept.push(point),
        }
    }
    kept
}

/// Classic Chaikin corner cutting.
///
/// Each iteration keeps the first and last point and replaces every interior
/// consecutive pair with two points at fractions `ratio` and `1 - ratio`
/// along the segment, interpolating time alongside the coordinates so the
/// smoothed track stays chronological. The count-stabilized early exit is
/// unreachable for inputs of 3 or more points (corner cutting strictly grows
/// the list), so `max_iterations` is the effective termination bound.
pub fn smooth_chaikin(points: Vec<Position>, ratio: f64, max_iterations: u32) -> Vec<Position> {
    if points.len() < 2 {
        return points;
    }

    let mut output = points;
    let mut iterations = 0;
    loop {
        let input = output;
        output = Vec::with_capacity(input.len() * 2);
        output.push(input[0].clone());
        for window in input.windows(3) {
            debug_assert_eq!(window[0].unit(), window[1].unit());
            output.push(interpolate(&window[0], &window[1], ratio));
            output.push(interpolate(&window[1], &window[2], 1.0 - ratio));
        }
        output.push(input[input.len() - 1].clone());
        iterations += 1;
        if output.len() == input.len() || iterations >= max_iterations {
            break;
        }
    }
    output
}

fn interpolate(a: &Position, b: &Position, t: f64) -> Position {
    Position::new(
        lerp_time(a.time(), b.time(), t),
        (b.coord1() - a.coord1()) * t + a.coord1(),
        (b.coord2() - a.coord2()) * t + a.coord2(),
        a.unit(),
    )
}

fn lerp_time(a: DateTime<Utc>, b: DateTime<Utc>, t: f64) -> DateTime<Utc> {
    let millis = (b - a).num_milliseconds() as f64 * t;
    a + Duration::milliseconds(millis.round() as i64)
}
