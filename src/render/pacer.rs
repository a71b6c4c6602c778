/// Decides which path segments become video frames.
///
/// With `N` polyline points, a `duration`-second target and framerate `F`,
/// a frame is captured every `max(1, N / (duration * F))` points, with the
/// fractional remainder carried forward. The frame count is thus bounded by
/// `duration * F` no matter how many points exist, while every segment is
/// still drawn onto the canvas -- only capture is throttled.
#[derive(Clone, Debug)]
pub struct FramePacer {
    yield_interval: f64,
    next_frame: f64,
}

impl FramePacer {
    pub fn new(point_count: usize, duration_secs: f64, framerate: u32) -> Self {
        let yield_interval =
            (point_count as f64 / (duration_secs * f64::from(framerate))).max(1.0);
        Self {
            yield_interval,
            next_frame: 1.0,
        }
    }

    pub fn yield_interval(&self) -> f64 {
        self.yield_interval
    }

    /// Whether the frame at this running point index should be captured.
    /// Advances the internal threshold when it is.
    pub fn should_capture(&mut self, point_index: usize) -> bool {
        if (point_index as f64) < self.next_frame {
            return false;
        }
        self.next_frame += self.yield_interval;
        true
    }
}
