//! Two-point linear calibration for analog soil probes.
//!
//! `dry_raw` maps to 0 % and `wet_raw` to 100 %.  Either ordering works:
//! capacitive probes read *lower* when wet, resistive ones *higher*.
//! The result is always clamped into `0..=100`.

use super::clamp_percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    wet_raw: u16,
    dry_raw: u16,
}

/// A raw reading mapped onto the percentage scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalised {
    pub percent: f32,
    pub clamped: bool,
}

impl Calibration {
    pub const fn new(wet_raw: u16, dry_raw: u16) -> Self {
        Self { wet_raw, dry_raw }
    }

    pub fn to_percent(&self, raw: u16) -> Normalised {
        let span = f32::from(self.wet_raw) - f32::from(self.dry_raw);
        if span == 0.0 {
            return Normalised { percent: 0.0, clamped: true };
        }
        let linear = (f32::from(raw) - f32::from(self.dry_raw)) / span * 100.0;
        let (percent, clamped) = clamp_percent(linear);
        Normalised { percent, clamped }
    }
}
