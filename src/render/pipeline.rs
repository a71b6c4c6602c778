//! The end-to-end render job: positions in, stills and video out.

use chrono::{DateTime, Utc};
use rusttype::Font;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::encode::ffmpeg::{EncodeConfig, FfmpegEncoder};
use crate::foundation::error::{TracemapError, TracemapResult};
use crate::geo::bbox::BoundingBox;
use crate::geo::position::Position;
use crate::geo::projection;
use crate::render::mapper::Mapper;
use crate::render::pacer::FramePacer;
use crate::tiles::fetch::TileFetcher;
use crate::tiles::math::{self, TileKey};
use crate::track::simplify;

#[derive(Clone, Debug)]
pub struct RenderStats {
    /// Polyline length after decimation and smoothing.
    pub point_count: usize,
    pub frames_written: u32,
    pub total_distance_meters: f64,
}

/// Renders one chronological WGS84 track according to `config`.
///
/// Positions with a dilution of precision at or beyond the configured
/// maximum are discarded up front; fewer than two surviving points is an
/// error the caller may treat as skippable.
pub fn render_track(points: Vec<Position>, config: &RenderConfig) -> TracemapResult<RenderStats> {
    config.validate()?;

    let before = points.len();
    let points: Vec<Position> = points
        .into_iter()
        .filter(|p| {
            p.dilution_of_precision() < config.max_dilution_of_precision
                && p.dilution_of_precision() > -0.01
        })
        .collect();
    if points.len() < before {
        info!(
            kept = points.len(),
            dropped = before - points.len(),
            "filtered noisy fixes by dilution of precision"
        );
    }
    if points.len() < 2 {
        return Err(TracemapError::InsufficientPoints { got: points.len() });
    }

    let mercator = points
        .iter()
        .map(projection::to_mercator)
        .collect::<TracemapResult<Vec<_>>>()?;
    let track_bbox = BoundingBox::from_positions(&mercator)?;
    let zoom = math::optimal_zoom(&track_bbox, config.video.width, config.video.height);
    // The canvas shows the tile-scale region around the track: one canvas
    // pixel per tile pixel, so the blitted imagery and the drawn path share
    // one coordinate mapping. The track bbox only picks zoom and center.
    let canvas_bbox =
        math::canvas_bounding_box(&track_bbox, zoom, config.video.width, config.video.height)?;
    info!(zoom, points = mercator.len(), "rendering track");

    let font = load_font(config)?;
    let mut mapper = Mapper::new(config.video.width, config.video.height, canvas_bbox.clone(), font);

    let fetcher = TileFetcher::new(&config.tile_cache_directory, &config.tile_url_template)?;
    draw_tile_grid(&mut mapper, &canvas_bbox, zoom, &fetcher)?;

    if let Some(path) = &config.stills.empty_map_path {
        mapper.save_png(path)?;
        info!(path = %path.display(), "empty map saved");
    }

    let pixels = mapper.to_pixel_positions(&mercator);
    let pixels = simplify::skip_too_close(pixels, config.min_pixel_proximity);
    let pixels =
        simplify::smooth_chaikin(pixels, config.chaikin.ratio, config.chaikin.max_iterations);
    debug!(points = pixels.len(), "simplified polyline");

    let mut encoder = if config.video.produce_video {
        Some(FfmpegEncoder::new(EncodeConfig {
            width: config.video.width,
            height: config.video.height,
            fps: config.video.framerate,
            out_path: config.video.output_path.clone(),
            overwrite: true,
        })?)
    } else {
        None
    };

    let colors = config.day_colors_rgba()?;
    let mut color_index = 0usize;
    let mut last_day = pixels[0].time().date_naive();
    let mut pacer = FramePacer::new(
        pixels.len(),
        config.video.duration_secs,
        config.video.framerate,
    );
    let mut total_distance_meters = 0.0;
    let mut frames_written = 0u32;

    for i in 1..pixels.len() {
        let previous = mapper.pixel_to_mercator(&pixels[i - 1])?;
        let current = mapper.pixel_to_mercator(&pixels[i])?;
        total_distance_meters += projection::distance_meters(&previous, &current)?;

        let day = pixels[i].time().date_naive();
        if day != last_day {
            last_day = day;
            color_index = (color_index + 1) % colors.len();
        }

        // Roll back last frame's overlay before extending the track.
        if mapper.is_stashed() {
            mapper.stash_pop();
        }
        mapper.draw_line(&pixels[i - 1], &pixels[i], colors[color_index]);

        // Overlay rendering (and its full-buffer stash) only happens for the
        // frames the pacer actually captures.
        if let Some(encoder) = encoder.as_mut() {
            if pacer.should_capture(i) {
                let frame = capture_with_overlays(
                    &mut mapper,
                    config,
                    total_distance_meters,
                    pixels[i].time(),
                )?;
                encoder.encode_frame(&frame)?;
                frames_written += 1;
            }
        }
    }

    if mapper.is_stashed() {
        mapper.stash_pop();
    }
    // The total distance stays baked into the final frame and the still.
    if config.display_distance {
        mapper.write_text(&format_distance(total_distance_meters), 0)?;
    }

    if let Some(enc) = encoder.as_mut() {
        let last_frame = mapper.pixel_buffer();
        for _ in 0..config.video.repeat_last_frame_count {
            enc.encode_frame(&last_frame)?;
            frames_written += 1;
        }
    }
    if let Some(enc) = encoder.take() {
        enc.finish()?;
        info!(path = %config.video.output_path.display(), "video saved");
    }

    if let Some(path) = &config.stills.populated_map_path {
        mapper.save_png(path)?;
        info!(path = %path.display(), "populated map saved");
    }

    info!(
        points = pixels.len(),
        frames_written,
        total_distance_meters,
        yield_interval = pacer.yield_interval(),
        "render complete"
    );
    Ok(RenderStats {
        point_count: pixels.len(),
        frames_written,
        total_distance_meters,
    })
}

/// Fetches and blits every tile intersecting the canvas region. The canvas
/// scale equals the tile scale at `zoom`, so each tile lands at its native
/// 256px size and the grid covers the canvas with no gaps. Keys past the
/// world edge resolve to the black-tile sentinel.
fn draw_tile_grid(
    mapper: &mut Mapper,
    canvas_bbox: &BoundingBox,
    zoom: u8,
    fetcher: &TileFetcher,
) -> TracemapResult<()> {
    let first_x = math::tile_x(zoom, canvas_bbox.min_lon());
    let last_x = math::tile_x(zoom, canvas_bbox.max_lon());
    let first_y = math::tile_y(zoom, canvas_bbox.max_lat());
    let last_y = math::tile_y(zoom, canvas_bbox.min_lat());

    for y in first_y..=last_y {
        for x in first_x..=last_x {
            let key = TileKey { x, y, zoom };
            let tile = fetcher.fetch_tile(&key)?;
            mapper.draw_tile(&math::tile_bounding_box(&key)?, &tile);
        }
    }
    Ok(())
}

/// Renders the enabled overlay text and returns the frame bytes to encode.
/// Overlay drawing is stashed first so the next segment draw rolls it back.
fn capture_with_overlays(
    mapper: &mut Mapper,
    config: &RenderConfig,
    total_distance_meters: f64,
    time: DateTime<Utc>,
) -> TracemapResult<Vec<u8>> {
    if config.display_distance || config.display_datetime {
        mapper.stash();
    }
    if config.display_distance {
        mapper.write_text(&format_distance(total_distance_meters), 0)?;
    }
    if config.display_datetime {
        let label = time.format("%m/%d %H:%M").to_string();
        mapper.write_text(&label, config.video.height as i32 - 100)?;
    }
    Ok(mapper.pixel_buffer())
}

fn format_distance(meters: f64) -> String {
    format!("{:.0}km", meters / 1000.0)
}

fn load_font(config: &RenderConfig) -> TracemapResult<Option<Font<'static>>> {
    let Some(path) = &config.font_path else {
        return Ok(None);
    };
    let bytes = std::fs::read(path).map_err(|e| {
        TracemapError::validation(format!("failed to read font '{}': {e}", path.display()))
    })?;
    let font = Font::try_from_vec(bytes).ok_or_else(|| {
        TracemapError::validation(format!("failed to parse font '{}'", path.display()))
    })?;
    Ok(Some(font))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::position::PositionUnit;
    use crate::geo::projection::{lat_to_y, lon_to_x};
    use crate::tiles::math::TILE_SIZE;
    use chrono::TimeZone;
    use image::{Rgba, RgbaImage};

    fn wgs(lat: f64, lon: f64, dop: f64) -> Position {
        let t = Utc.with_ymd_and_hms(2019, 7, 7, 12, 0, 0).unwrap();
        Position::with_dop(t, lat, lon, PositionUnit::Wgs84, dop)
    }

    fn mercator(lat: f64, lon: f64) -> Position {
        let t = Utc.with_ymd_and_hms(2019, 7, 7, 12, 0, 0).unwrap();
        Position::new(t, lat, lon, PositionUnit::Mercator)
    }

    // A ~0.2 x 0.4 degree track region at 1080p, like a day of city riding.
    fn city_canvas() -> (BoundingBox, u8) {
        let track = BoundingBox::new(
            lat_to_y(44.0),
            lon_to_x(33.0),
            lat_to_y(44.2),
            lon_to_x(33.4),
        )
        .unwrap();
        let zoom = math::optimal_zoom(&track, 1920, 1080);
        let canvas = math::canvas_bounding_box(&track, zoom, 1920, 1080).unwrap();
        (canvas, zoom)
    }

    #[test]
    fn a_tile_occupies_its_native_size_on_the_canvas() {
        let (canvas, zoom) = city_canvas();
        let mapper = Mapper::new(1920, 1080, canvas.clone(), None);
        let key = TileKey {
            x: math::tile_x(zoom, canvas.middle_lon()),
            y: math::tile_y(zoom, canvas.middle_lat()),
            zoom,
        };
        let tile_bbox = math::tile_bounding_box(&key).unwrap();

        let width_px = mapper.pixel_x(&mercator(0.0, tile_bbox.max_lon()))
            - mapper.pixel_x(&mercator(0.0, tile_bbox.min_lon()));
        let height_px = mapper.pixel_y(&mercator(tile_bbox.min_lat(), 0.0))
            - mapper.pixel_y(&mercator(tile_bbox.max_lat(), 0.0));
        assert_eq!(width_px, i64::from(TILE_SIZE), "tile width on canvas");
        assert_eq!(height_px, i64::from(TILE_SIZE), "tile height on canvas");
    }

    #[test]
    fn the_tile_grid_covers_the_whole_canvas() {
        let (canvas, zoom) = city_canvas();
        let first_x = math::tile_x(zoom, canvas.min_lon());
        let last_x = math::tile_x(zoom, canvas.max_lon());
        let first_y = math::tile_y(zoom, canvas.max_lat());
        let last_y = math::tile_y(zoom, canvas.min_lat());

        let left = math::tile_bounding_box(&TileKey { x: first_x, y: first_y, zoom }).unwrap();
        let right = math::tile_bounding_box(&TileKey { x: last_x, y: last_y, zoom }).unwrap();
        assert!(left.min_lon() <= canvas.min_lon());
        assert!(right.max_lon() >= canvas.max_lon());
        assert!(left.max_lat() >= canvas.max_lat());
        assert!(right.min_lat() <= canvas.min_lat());

        // Enough native-size tiles per axis to span the canvas.
        assert!((last_x - first_x + 1) * i64::from(TILE_SIZE) >= 1920);
        assert!((last_y - first_y + 1) * i64::from(TILE_SIZE) >= 1080);
    }

    #[test]
    fn renders_a_still_from_a_cached_world_tile() {
        // A track spanning a third of the globe forces zoom 0, where the
        // whole grid is the single (0, 0) tile; pre-seeding it in the cache
        // lets the full pipeline run without any network access.
        let dir = tempfile::tempdir().unwrap();
        let tile = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([10, 90, 10, 255]));
        tile.save(dir.path().join("http---tiles-test-0-0-0-png.png"))
            .unwrap();

        let mut cfg = RenderConfig::default();
        cfg.video.produce_video = false;
        cfg.video.width = 64;
        cfg.video.height = 64;
        cfg.tile_cache_directory = dir.path().to_path_buf();
        cfg.tile_url_template = "http://tiles.test/{z}/{x}/{y}.png".to_string();
        cfg.stills.populated_map_path = Some(dir.path().join("map.png"));

        let points = vec![wgs(0.0, 0.0, 0.0), wgs(60.0, 120.0, 0.0)];
        let stats = render_track(points, &cfg).unwrap();
        assert_eq!(stats.point_count, 2);
        assert_eq!(stats.frames_written, 0);
        assert!(stats.total_distance_meters > 0.0);
        assert!(cfg.stills.populated_map_path.as_ref().unwrap().exists());
    }

    #[test]
    fn frame_capture_without_overlays_leaves_no_snapshot() {
        let cfg = RenderConfig::default();
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 2000.0).unwrap();
        let mut mapper = Mapper::new(200, 100, bbox, None);
        let t = Utc.with_ymd_and_hms(2019, 7, 7, 12, 0, 0).unwrap();

        let frame = capture_with_overlays(&mut mapper, &cfg, 1234.0, t).unwrap();
        assert_eq!(frame, mapper.pixel_buffer());
        assert!(!mapper.is_stashed());
    }

    #[test]
    fn frame_capture_with_overlays_requires_a_font() {
        let mut cfg = RenderConfig::default();
        cfg.display_distance = true;
        let bbox = BoundingBox::new(0.0, 0.0, 1000.0, 2000.0).unwrap();
        let mut mapper = Mapper::new(200, 100, bbox, None);
        let t = Utc.with_ymd_and_hms(2019, 7, 7, 12, 0, 0).unwrap();

        assert!(capture_with_overlays(&mut mapper, &cfg, 1234.0, t).is_err());
    }

    #[test]
    fn too_few_points_is_a_skippable_error() {
        let cfg = RenderConfig::default();
        let err = render_track(vec![wgs(44.5, 33.4, 0.0)], &cfg).unwrap_err();
        assert!(matches!(
            err,
            TracemapError::InsufficientPoints { got: 1 }
        ));
    }

    #[test]
    fn noisy_fixes_are_filtered_before_rendering() {
        let cfg = RenderConfig::default();
        // Both points exceed the DOP cutoff, leaving nothing to render.
        let points = vec![wgs(44.5, 33.4, 25.0), wgs(44.6, 33.5, 30.0)];
        let err = render_track(points, &cfg).unwrap_err();
        assert!(matches!(
            err,
            TracemapError::InsufficientPoints { got: 0 }
        ));
    }

    #[test]
    fn distance_label_rounds_to_whole_kilometers() {
        assert_eq!(format_distance(12_345.0), "12km");
        assert_eq!(format_distance(1_500.0), "2km");
        assert_eq!(format_distance(0.0), "0km");
    }
}
