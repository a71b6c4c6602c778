//! The raster canvas: composites map tiles and draws the track on top.

use std::collections::HashMap;

use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use rusttype::{Font, Scale};

use crate::foundation::error::{TracemapError, TracemapResult};
use crate::geo::bbox::BoundingBox;
use crate::geo::position::{Position, PositionUnit};

const LINE_THICKNESS: i32 = 5;

/// Stroke state for one color, created lazily on first use.
#[derive(Clone, Copy, Debug)]
struct Pen {
    color: Rgba<u8>,
    thickness: i32,
}

/// Owns the pixel buffer for one render job.
///
/// The bounding box (Mercator meters) defines the affine map between
/// projected coordinates and pixels; image y grows downward while latitude
/// grows upward, so y is inverted. Nothing outside the mapper mutates the
/// buffer.
pub struct Mapper {
    width: u32,
    height: u32,
    bbox: BoundingBox,
    units_per_pixel_width: f64,
    units_per_pixel_height: f64,
    buffer: RgbaImage,
    pens: HashMap<[u8; 4], Pen>,
    stash: Option<RgbaImage>,
    font: Option<Font<'static>>,
    font_scale: Scale,
}

impl Mapper {
    pub fn new(width: u32, height: u32, bbox: BoundingBox, font: Option<Font<'static>>) -> Self {
        let units_per_pixel_width = bbox.lon_span() / f64::from(width);
        let units_per_pixel_height = bbox.lat_span() / f64::from(height);
        let font_size = (f64::from(height) / 70.0) as f32;
        Self {
            width,
            height,
            bbox,
            units_per_pixel_width,
            units_per_pixel_height,
            buffer: RgbaImage::new(width, height),
            pens: HashMap::new(),
            stash: None,
            font,
            font_scale: Scale::uniform(font_size),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    // Rounded to the nearest pixel so coordinates that land on a pixel
    // boundary up to float noise (tile edges in particular) stay exact.
    fn project_x(&self, lon: f64) -> i64 {
        ((lon - self.bbox.min_lon()) / self.units_per_pixel_width).round() as i64
    }

    fn project_y(&self, lat: f64) -> i64 {
        i64::from(self.height)
            - ((lat - self.bbox.min_lat()) / self.units_per_pixel_height).round() as i64
    }

    /// Pixel column of a Mercator or already-Pixel position.
    pub fn pixel_x(&self, position: &Position) -> i64 {
        if position.unit() == PositionUnit::Pixel {
            return position.coord2() as i64;
        }
        self.project_x(position.coord2())
    }

    /// Pixel row of a Mercator or already-Pixel position.
    pub fn pixel_y(&self, position: &Position) -> i64 {
        if position.unit() == PositionUnit::Pixel {
            return position.coord1() as i64;
        }
        self.project_y(position.coord1())
    }

    /// Blits a tile at its projected offset; parts outside the canvas are
    /// clipped.
    pub fn draw_tile(&mut self, tile_bbox: &BoundingBox, tile: &RgbaImage) {
        let x = self.project_x(tile_bbox.min_lon());
        let y = self.project_y(tile_bbox.max_lat());
        imageops::overlay(&mut self.buffer, tile, x, y);
    }

    /// Draws a straight segment between two points with the memoized pen for
    /// `color`.
    pub fn draw_line(&mut self, from: &Position, to: &Position, color: Rgba<u8>) {
        let pen = *self.pens.entry(color.0).or_insert(Pen {
            color,
            thickness: LINE_THICKNESS,
        });
        let (x1, y1) = (self.pixel_x(from) as f32, self.pixel_y(from) as f32);
        let (x2, y2) = (self.pixel_x(to) as f32, self.pixel_y(to) as f32);

        // Thickness by drawing parallel 1px segments offset on both axes;
        // square caps are fine at these stroke widths.
        let r = pen.thickness / 2;
        for offset in -r..=r {
            let o = offset as f32;
            draw_line_segment_mut(&mut self.buffer, (x1 + o, y1), (x2 + o, y2), pen.color);
            draw_line_segment_mut(&mut self.buffer, (x1, y1 + o), (x2, y2 + o), pen.color);
        }
    }

    /// Renders overlay text in black at the left edge, `y_offset` pixels
    /// down. Requires a font to have been configured.
    pub fn write_text(&mut self, text: &str, y_offset: i32) -> TracemapResult<()> {
        let font = self.font.as_ref().ok_or_else(|| {
            TracemapError::validation("no font configured, can't render overlay text")
        })?;
        draw_text_mut(
            &mut self.buffer,
            Rgba([0, 0, 0, 255]),
            0,
            y_offset,
            self.font_scale,
            font,
            text,
        );
        Ok(())
    }

    /// Snapshots the buffer into the single stash slot, replacing any
    /// previous snapshot. Used to roll back transient per-frame overlays.
    pub fn stash(&mut self) {
        self.stash = Some(self.buffer.clone());
    }

    pub fn is_stashed(&self) -> bool {
        self.stash.is_some()
    }

    /// Restores and clears the stashed snapshot, if any.
    pub fn stash_pop(&mut self) {
        if let Some(snapshot) = self.stash.take() {
            self.buffer = snapshot;
        }
    }

    /// An owned copy of the raw RGBA bytes; callers keep it while the canvas
    /// mutates further, so it must not alias the live buffer.
    pub fn pixel_buffer(&self) -> Vec<u8> {
        self.buffer.as_raw().clone()
    }

    pub fn save_png(&self, path: &std::path::Path) -> TracemapResult<()> {
        self.buffer.save(path).map_err(|e| {
            TracemapError::validation(format!("failed to save image '{}': {e}", path.display()))
        })
    }

    /// Batch-converts a Mercator polyline to Pixel positions, each owning
    /// its Mercator original so it can be projected back later.
    pub fn to_pixel_positions(&self, points: &[Position]) -> Vec<Position> {
        points
            .iter()
            .map(|p| {
                Position::derived(
                    p.time(),
                    self.project_y(p.coord1()) as f64,
                    self.project_x(p.coord2()) as f64,
                    PositionUnit::Pixel,
                    p.clone(),
                )
            })
            .collect()
    }

    /// Inverse of the pixel projection, for points that were interpolated in
    /// pixel space and have no Mercator ancestor of their own. Approximate
    /// to within one pixel's worth of meters.
    pub fn pixel_to_mercator(&self, position: &Position) -> TracemapResult<Position> {
        if position.unit() != PositionUnit::Pixel {
            return Err(TracemapError::unit_conversion(format!(
                "pixel_to_mercator expects a Pixel position, this={position}"
            )));
        }
        Ok(Position::derived(
            position.time(),
            (f64::from(self.height) - position.coord1()) * self.units_per_pixel_height
                + self.bbox.min_lat(),
            position.coord2() * self.units_per_pixel_width + self.bbox.min_lon(),
            PositionUnit::Mercator,
            position.clone(),
        ))
    }
}
