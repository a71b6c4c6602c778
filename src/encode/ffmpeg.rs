//! MP4 encoding by piping raw RGBA frames to the system `ffmpeg` binary.

use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::foundation::error::{TracemapError, TracemapResult};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> TracemapResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TracemapError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(TracemapError::validation("encode fps must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // We target yuv420p output for maximum player compatibility.
            return Err(TracemapError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> TracemapResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams opaque RGBA8 frames into an `ffmpeg` child process producing an
/// H.264 MP4. `ffmpeg` must be on PATH; we use the system binary rather than
/// linking FFmpeg to avoid native dev header/lib requirements.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> TracemapResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(TracemapError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(TracemapError::validation(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            TracemapError::validation(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            TracemapError::validation("failed to open ffmpeg stdin (unexpected)")
        })?;

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
        })
    }

    /// Writes one frame of `width * height * 4` RGBA bytes.
    pub fn encode_frame(&mut self, frame: &[u8]) -> TracemapResult<()> {
        let expected = (self.cfg.width * self.cfg.height * 4) as usize;
        if frame.len() != expected {
            return Err(TracemapError::validation(format!(
                "frame size mismatch: got {} bytes, expected {expected}",
                frame.len()
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(TracemapError::validation(
                "ffmpeg encoder is already finalized",
            ));
        };

        use std::io::Write as _;
        stdin.write_all(frame).map_err(|e| {
            TracemapError::validation(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    pub fn finish(mut self) -> TracemapResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            TracemapError::validation(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TracemapError::validation(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
