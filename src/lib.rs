//! tracemap turns a time-ordered sequence of GPS positions into a rendered
//! map: a still image and/or an MP4 video tracing the path over fetched map
//! tiles.
//!
//! # Pipeline overview
//!
//! 1. **Merge**: fold pre-sorted point sources into one chronological track
//! 2. **Project**: WGS84 -> Mercator, bounding box, optimal zoom level
//! 3. **Compose**: fetch tiles through the on-disk cache onto the canvas
//! 4. **Simplify**: distance decimation, then Chaikin corner cutting
//! 5. **Draw & encode**: per-day colored segments, paced into `ffmpeg`
//!
//! The pipeline is a strictly sequential batch job: the canvas owns its
//! pixel buffer exclusively and all tile I/O is inline blocking.
#![forbid(unsafe_code)]

pub mod config;
pub mod encode;
pub mod foundation;
pub mod geo;
pub mod render;
pub mod tiles;
pub mod track;

pub use config::{ChaikinSettings, RenderConfig, StillSettings, VideoSettings};
pub use encode::ffmpeg::{is_ffmpeg_on_path, EncodeConfig, FfmpegEncoder};
pub use foundation::error::{TracemapError, TracemapResult};
pub use geo::bbox::BoundingBox;
pub use geo::position::{Position, PositionUnit};
pub use geo::projection::{
    distance_meters, from_mercator_to_wgs84, to_mercator, CIRCUMFERENCE_M, EARTH_RADIUS_M,
};
pub use render::mapper::Mapper;
pub use render::pacer::FramePacer;
pub use render::pipeline::{render_track, RenderStats};
pub use tiles::fetch::{TileFetcher, BLACK_TILE_SENTINEL};
pub use tiles::math::{
    canvas_bounding_box, optimal_zoom, tile_bounding_box, tile_x, tile_y, units_per_pixel,
    TileKey, MAX_ZOOM, TILE_SIZE,
};
pub use track::merge::{merge, merge_all, Merge};
pub use track::simplify::{skip_too_close, smooth_chaikin};
pub use track::TrackPoint;
