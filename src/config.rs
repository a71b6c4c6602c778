//! Render job configuration, deserialized from a JSON project file.

use std::path::PathBuf;

use image::Rgba;

use crate::foundation::error::{TracemapError, TracemapResult};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub produce_video: bool,
    /// How long the produced video should run, in seconds.
    pub duration_secs: f64,
    pub framerate: u32,
    pub width: u32,
    pub height: u32,
    /// How often the finished map is repeated at the end so the video
    /// lingers on it.
    pub repeat_last_frame_count: u32,
    pub output_path: PathBuf,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            produce_video: true,
            duration_secs: 4.5,
            framerate: 30,
            width: 1920,
            height: 1080,
            repeat_last_frame_count: 60,
            output_path: PathBuf::from("map.mp4"),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChaikinSettings {
    /// How close to the vertex the cut corner begins; between 0.6 and 0.95
    /// works well visually.
    pub ratio: f64,
    /// Depending on line thickness, 3 is usually enough.
    pub max_iterations: u32,
}

impl Default for ChaikinSettings {
    fn default() -> Self {
        Self {
            ratio: 0.75,
            max_iterations: 3,
        }
    }
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StillSettings {
    /// Where to save the tiles-only map, if anywhere.
    pub empty_map_path: Option<PathBuf>,
    /// Where to save the map with the full track drawn, if anywhere.
    pub populated_map_path: Option<PathBuf>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub video: VideoSettings,
    pub chaikin: ChaikinSettings,
    pub stills: StillSettings,
    /// Pixel radius within which consecutive points collapse into one.
    pub min_pixel_proximity: f64,
    /// Fixes with a DOP at or above this are discarded (0 = unknown passes).
    pub max_dilution_of_precision: f64,
    /// Track color per calendar day, cycled; hex `#RRGGBB` strings.
    pub day_colors: Vec<String>,
    /// Tile cache, shareable between projects.
    pub tile_cache_directory: PathBuf,
    /// Takes `{x}`, `{y}` and `{z}` placeholders.
    pub tile_url_template: String,
    /// TrueType font used for the distance/date overlay; required when
    /// either display flag is on.
    pub font_path: Option<PathBuf>,
    pub display_distance: bool,
    pub display_datetime: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            video: VideoSettings::default(),
            chaikin: ChaikinSettings::default(),
            stills: StillSettings::default(),
            min_pixel_proximity: 7.0,
            max_dilution_of_precision: 10.0,
            day_colors: vec![
                "#E6194B".to_string(),
                "#3CB44B".to_string(),
                "#4363D8".to_string(),
                "#F58231".to_string(),
                "#911EB4".to_string(),
            ],
            tile_cache_directory: PathBuf::from("tile-cache"),
            tile_url_template: "http://mt1.google.com/vt/lyrs=m&x={x}&y={y}&z={z}".to_string(),
            font_path: None,
            display_distance: false,
            display_datetime: false,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> TracemapResult<()> {
        if self.video.width == 0 || self.video.height == 0 {
            return Err(TracemapError::validation("canvas width/height must be > 0"));
        }
        if self.video.produce_video {
            if self.video.duration_secs <= 0.0 {
                return Err(TracemapError::validation("video duration must be > 0"));
            }
            if self.video.framerate == 0 {
                return Err(TracemapError::validation("video framerate must be > 0"));
            }
        }
        if !(self.chaikin.ratio > 0.0 && self.chaikin.ratio < 1.0) {
            return Err(TracemapError::validation(
                "chaikin ratio must be strictly between 0 and 1",
            ));
        }
        if self.min_pixel_proximity < 0.0 {
            return Err(TracemapError::validation(
                "min_pixel_proximity must not be negative",
            ));
        }
        if self.day_colors.is_empty() {
            return Err(TracemapError::validation("day_colors must not be empty"));
        }
        self.day_colors_rgba()?;
        if (self.display_distance || self.display_datetime) && self.font_path.is_none() {
            return Err(TracemapError::validation(
                "font_path is required when display_distance or display_datetime is set",
            ));
        }
        if !self.tile_url_template.contains("{x}")
            || !self.tile_url_template.contains("{y}")
            || !self.tile_url_template.contains("{z}")
        {
            return Err(TracemapError::validation(
                "tile_url_template must contain {x}, {y} and {z} placeholders",
            ));
        }
        Ok(())
    }

    pub fn day_colors_rgba(&self) -> TracemapResult<Vec<Rgba<u8>>> {
        self.day_colors.iter().map(|c| parse_hex_color(c)).collect()
    }
}

/// Parses `#RRGGBB` into an opaque color.
pub fn parse_hex_color(hex: &str) -> TracemapResult<Rgba<u8>> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TracemapError::validation(format!(
            "invalid color '{hex}', expected #RRGGBB"
        )));
    }
    let parse =
        |s: &str| u8::from_str_radix(s, 16).map_err(|e| TracemapError::validation(e.to_string()));
    Ok(Rgba([
        parse(&digits[0..2])?,
        parse(&digits[2..4])?,
        parse(&digits[4..6])?,
        255,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        RenderConfig::default().validate().unwrap();
    }

    #[test]
    fn json_roundtrip() {
        let cfg = RenderConfig::default();
        let s = serde_json::to_string_pretty(&cfg).unwrap();
        let de: RenderConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(de.video.width, 1920);
        assert_eq!(de.day_colors, cfg.day_colors);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let de: RenderConfig = serde_json::from_str(r#"{"min_pixel_proximity": 3.5}"#).unwrap();
        assert_eq!(de.min_pixel_proximity, 3.5);
        assert_eq!(de.video.framerate, 30);
    }

    #[test]
    fn validate_rejects_empty_palette() {
        let mut cfg = RenderConfig::default();
        cfg.day_colors.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_overlays_without_font() {
        let mut cfg = RenderConfig::default();
        cfg.display_distance = true;
        assert!(cfg.validate().is_err());
        cfg.font_path = Some(PathBuf::from("DejaVuSans.ttf"));
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_url_template() {
        let mut cfg = RenderConfig::default();
        cfg.tile_url_template = "http://tiles/{x}/{y}".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_chaikin_ratio() {
        let mut cfg = RenderConfig::default();
        cfg.chaikin.ratio = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex_color("#FF0080").unwrap(), Rgba([255, 0, 128, 255]));
        assert_eq!(parse_hex_color("00ff00").unwrap(), Rgba([0, 255, 0, 255]));
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#GG0000").is_err());
    }
}
