use anyhow::{Result, anyhow};

/// Zoom bands that drive semantic zoom.
///
/// Above `cue_min` the range splits into three bands:
/// `[cue_min, expand_min)` is the enter cue, `[expand_min, expand_min + exit_cue_range)`
/// is the exit cue and everything from `expand_min + exit_cue_range` up is deep focus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomThresholds {
    pub cue_min: f32,
    pub expand_min: f32,
    pub exit_cue_range: f32,
}

impl ZoomThresholds {
    pub const CUE_MIN: f32 = 0.85;
    pub const EXPAND_MIN: f32 = 1.1;
    pub const EXIT_CUE_RANGE: f32 = 0.12;

    pub fn new(cue_min: f32, expand_min: f32, exit_cue_range: f32) -> Result<Self> {
        if !(cue_min.is_finite() && expand_min.is_finite() && exit_cue_range.is_finite()) {
            return Err(anyhow!("zoom thresholds must be finite numbers"));
        }
        if cue_min <= 0.0 {
            return Err(anyhow!("cue zoom ({cue_min}) must be positive"));
        }
        if cue_min >= expand_min {
            return Err(anyhow!(
                "cue zoom ({cue_min}) must be below expand zoom ({expand_min})"
            ));
        }
        if exit_cue_range < 0.0 {
            return Err(anyhow!(
                "exit cue range ({exit_cue_range}) must not be negative"
            ));
        }

        Ok(Self {
            cue_min,
            expand_min,
            exit_cue_range,
        })
    }

    pub fn deep_min(&self) -> f32 {
        self.expand_min + self.exit_cue_range
    }

    pub fn in_cue_band(&self, zoom: f32) -> bool {
        zoom >= self.cue_min && zoom < self.expand_min
    }

    pub fn in_exit_cue_band(&self, zoom: f32) -> bool {
        zoom >= self.expand_min && zoom < self.deep_min()
    }

    pub fn in_deep_band(&self, zoom: f32) -> bool {
        zoom >= self.deep_min()
    }
}

impl Default for ZoomThresholds {
    fn default() -> Self {
        Self {
            cue_min: Self::CUE_MIN,
            expand_min: Self::EXPAND_MIN,
            exit_cue_range: Self::EXIT_CUE_RANGE,
        }
    }
}
