//! Tile acquisition with a content-addressed on-disk cache.
//!
//! Cache-or-fetch only: a cached file is served forever (tile imagery is
//! effectively immutable), a miss does one blocking HTTP GET and persists the
//! bytes. No retries; a failed fetch aborts the render job.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::foundation::error::{TracemapError, TracemapResult};
use crate::tiles::math::{TileKey, TILE_SIZE};

/// Sentinel "URL" for tiles outside the tile grid (pole regions, wrapped x).
/// Fetching it returns an all-black tile without touching disk or network.
pub const BLACK_TILE_SENTINEL: &str = "BLACKTILE";

pub struct TileFetcher {
    cache_dir: PathBuf,
    url_template: String,
    client: reqwest::blocking::Client,
}

impl TileFetcher {
    /// `url_template` takes `{x}`, `{y}` and `{z}` placeholders.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        url_template: impl Into<String>,
    ) -> TracemapResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("tracemap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TracemapError::tile_fetch(format!("failed to build http client: {e}")))?;
        Ok(Self {
            cache_dir: cache_dir.into(),
            url_template: url_template.into(),
            client,
        })
    }

    /// The URL for a tile, or the black-tile sentinel when the key is
    /// outside `[0, 2^zoom)` on either axis.
    pub fn tile_url(&self, key: &TileKey) -> String {
        if !key.in_range() {
            return BLACK_TILE_SENTINEL.to_string();
        }
        self.url_template
            .replace("{x}", &key.x.to_string())
            .replace("{y}", &key.y.to_string())
            .replace("{z}", &key.zoom.to_string())
    }

    pub fn fetch_tile(&self, key: &TileKey) -> TracemapResult<RgbaImage> {
        self.fetch(&self.tile_url(key))
    }

    /// Resolves a tile URL (or the sentinel) to a bitmap via the cache.
    pub fn fetch(&self, url: &str) -> TracemapResult<RgbaImage> {
        if url == BLACK_TILE_SENTINEL {
            return Ok(RgbaImage::from_pixel(
                TILE_SIZE,
                TILE_SIZE,
                Rgba([0, 0, 0, 255]),
            ));
        }

        let path = self.cache_dir.join(cache_file_name(url));
        if path.exists() {
            debug!(url, path = %path.display(), "tile cache hit");
            let img = image::open(&path).map_err(|e| {
                TracemapError::tile_fetch(format!(
                    "failed to decode cached tile '{}': {e}",
                    path.display()
                ))
            })?;
            return Ok(img.to_rgba8());
        }

        debug!(url, path = %path.display(), "tile cache miss, fetching");
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TracemapError::tile_fetch(format!("GET {url} failed: {e}")))?;
        let bytes = response
            .bytes()
            .map_err(|e| TracemapError::tile_fetch(format!("reading body of {url} failed: {e}")))?;

        std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
            TracemapError::tile_fetch(format!(
                "failed to create cache directory '{}': {e}",
                self.cache_dir.display()
            ))
        })?;
        std::fs::write(&path, &bytes).map_err(|e| {
            TracemapError::tile_fetch(format!(
                "failed to cache tile at '{}': {e}",
                path.display()
            ))
        })?;

        let img = image::load_from_memory(&bytes)
            .map_err(|e| TracemapError::tile_fetch(format!("failed to decode tile {url}: {e}")))?;
        Ok(img.to_rgba8())
    }
}

/// Filesystem-safe cache key: every non-alphanumeric byte becomes `-`.
fn cache_file_name(url: &str) -> String {
    let mut name: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    name.push_str(".png");
    name
}
