//! Trailing average volume and relative volume (RVOL).

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSignal {
    pub current_volume: u64,
    /// Truncated mean of up to `period` bars before the current one.
    pub avg_volume: Option<u64>,
    /// `current / avg`; `None` with fewer than two bars or a zero average.
    pub volume_ratio: Option<f64>,
}

/// Compute the volume signal for the last bar of an ascending slice.
///
/// The current bar is excluded from its own average.
pub fn volume_signal(bars: &[Bar], period: usize) -> VolumeSignal {
    let Some((current, history)) = bars.split_last() else {
        return VolumeSignal {
            current_volume: 0,
            avg_volume: None,
            volume_ratio: None,
        };
    };

    let current_volume = current.volume;
    let take = period.min(history.len());
    if take == 0 {
        return VolumeSignal {
            current_volume,
            avg_volume: None,
            volume_ratio: None,
        };
    }

    let window = &history[history.len() - take..];
    let total: u128 = window.iter().map(|b| b.volume as u128).sum();
    let avg = (total / take as u128) as u64;

    let volume_ratio = if avg == 0 {
        None
    } else {
        Some(current_volume as f64 / avg as f64)
    };

    VolumeSignal {
        current_volume,
        avg_volume: Some(avg),
        volume_ratio,
    }
}
