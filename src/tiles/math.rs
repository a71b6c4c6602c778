//! Slippy-map tile arithmetic over the Mercator plane.
//!
//! Tiles are 256x256, `2^zoom` per axis; tile (0, 0) is the north-west
//! corner. All linear measures are Mercator meters.

use crate::foundation::error::TracemapResult;
use crate::geo::bbox::BoundingBox;
use crate::geo::projection::CIRCUMFERENCE_M;

pub const TILE_SIZE: u32 = 256;
pub const MAX_ZOOM: u8 = 19;

const METERS_PER_TILE_AT_ZERO_WIDTH: f64 = CIRCUMFERENCE_M;
// The Mercator plane is square but tile providers cut it off at ~85.05
// degrees of latitude, so a zoom-0 tile covers slightly less map height.
const METERS_PER_TILE_AT_ZERO_HEIGHT: f64 = (85.05 / 90.0) * CIRCUMFERENCE_M;

/// One 256x256 slippy-map tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub x: i64,
    pub y: i64,
    pub zoom: u8,
}

impl TileKey {
    /// Whether the tile exists: x and y both within `[0, 2^zoom)`.
    /// Out-of-range keys (pole regions, wrapped x) get the black-tile
    /// sentinel instead of a URL.
    pub fn in_range(&self) -> bool {
        let per_axis = 1i64 << self.zoom;
        (0..per_axis).contains(&self.x) && (0..per_axis).contains(&self.y)
    }
}

fn tile_span_m(zoom: u8) -> f64 {
    CIRCUMFERENCE_M / f64::powi(2.0, i32::from(zoom))
}

pub fn tile_x(zoom: u8, x_mercator: f64) -> i64 {
    ((x_mercator + CIRCUMFERENCE_M / 2.0) / tile_span_m(zoom)).floor() as i64
}

pub fn tile_y(zoom: u8, y_mercator: f64) -> i64 {
    ((CIRCUMFERENCE_M / 2.0 - y_mercator) / tile_span_m(zoom)).floor() as i64
}

/// Mercator meters covered by one pixel at this zoom.
pub fn units_per_pixel(zoom: u8) -> f64 {
    tile_span_m(zoom) / f64::from(TILE_SIZE)
}

/// The Mercator bounding box of one tile; inverse of [`tile_x`]/[`tile_y`].
pub fn tile_bounding_box(key: &TileKey) -> TracemapResult<BoundingBox> {
    let span = tile_span_m(key.zoom);
    let half = CIRCUMFERENCE_M / 2.0;
    BoundingBox::new(
        half - (key.y + 1) as f64 * span,
        key.x as f64 * span - half,
        half - key.y as f64 * span,
        (key.x + 1) as f64 * span - half,
    )
}

/// The Mercator region a canvas of the given pixel size shows at `zoom`,
/// centered on the middle of `focus`. One canvas pixel covers exactly
/// [`units_per_pixel`] meters, so tiles blit at their native 256px size and
/// the imagery lines up with anything drawn on the canvas.
pub fn canvas_bounding_box(
    focus: &BoundingBox,
    zoom: u8,
    width_px: u32,
    height_px: u32,
) -> TracemapResult<BoundingBox> {
    let upp = units_per_pixel(zoom);
    let half_w = f64::from(width_px) / 2.0 * upp;
    let half_h = f64::from(height_px) / 2.0 * upp;
    BoundingBox::new(
        focus.middle_lat() - half_h,
        focus.middle_lon() - half_w,
        focus.middle_lat() + half_h,
        focus.middle_lon() + half_w,
    )
}

/// The largest zoom level at which `bbox` still fits into a canvas of the
/// given pixel dimensions.
///
/// Computed independently per axis (log2 of how many zoom-0 tiles the box
/// spans versus how many tiles the canvas offers) and then taking the
/// minimum: the larger of the two would overflow one axis. Floored and
/// clamped to `[0, MAX_ZOOM]`.
pub fn optimal_zoom(bbox: &BoundingBox, width_px: u32, height_px: u32) -> u8 {
    let tiles_width = f64::from(width_px) / f64::from(TILE_SIZE);
    let tiles_height = f64::from(height_px) / f64::from(TILE_SIZE);

    let scale_factor_width = METERS_PER_TILE_AT_ZERO_WIDTH / bbox.lon_span() * tiles_width;
    let width_zoom = scale_factor_width.log2();
    let scale_factor_height = METERS_PER_TILE_AT_ZERO_HEIGHT / bbox.lat_span() * tiles_height;
    let height_zoom = scale_factor_height.log2();

    tracing::debug!(width_zoom, height_zoom, "desired zoom per axis");

    let zoom = width_zoom.min(height_zoom).floor();
    if zoom.is_nan() || zoom < 0.0 {
        return 0;
    }
    (zoom as u64).min(u64::from(MAX_ZOOM)) as u8
}
