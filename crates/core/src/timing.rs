//! Frame timing constants shared by the frame loop and the frontend.
//!
//! The CPU reports cost in machine cycles (one machine cycle is four clock
//! ticks). A frame loop accumulates those costs against a per-frame budget.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reference clock in Hz.
pub const CLOCK_HZ: u32 = 4_194_304;

/// Display refresh rate in hundredths of a hertz (59.73 Hz).
pub const REFRESH_CENTI_HZ: u32 = 5973;

/// 419430400 / 5973, truncated.
pub const CYCLES_PER_FRAME: u32 = (CLOCK_HZ as u64 * 100 / REFRESH_CENTI_HZ as u64) as u32;

pub const SCANLINES_PER_FRAME: u32 = 154;
pub const CYCLES_PER_SCANLINE: u32 = 114;

/// How a frame's cycle budget is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameTiming {
    /// Clock rate divided by refresh rate.
    #[default]
    Refresh,
    /// Scanline count times cycles per scanline.
    Scanline,
}

impl FrameTiming {
    pub const fn budget(self) -> u32 {
        match self {
            FrameTiming::Refresh => CYCLES_PER_FRAME,
            FrameTiming::Scanline => SCANLINES_PER_FRAME * CYCLES_PER_SCANLINE,
        }
    }
}

/// Wall-clock length of one displayed frame.
pub const fn frame_duration() -> Duration {
    Duration::from_nanos(100_000_000_000 / REFRESH_CENTI_HZ as u64)
}
