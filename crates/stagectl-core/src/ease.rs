//! Ease functions for transitions
//!
//! Names are matched case-insensitively and ignore separators and an optional
//! `ease` prefix, so `InOutQuad`, `in-out-quad` and `easeInOutQuad` all select
//! the same curve.

use std::f32::consts::PI;
use std::str::FromStr;

use crate::error::RenderError;

/// Easing curve mapping progress `t` in 0..=1 onto 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EaseFunction {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InSine,
    OutSine,
    InOutSine,
    /// Hermite smoothstep: 3t² - 2t³
    Smooth,
    /// Jump to the target at the very end
    Step,
}

impl EaseFunction {
    /// Apply the curve. `t` is clamped to 0..=1.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EaseFunction::Linear => t,
            EaseFunction::InQuad => t * t,
            EaseFunction::OutQuad => t * (2.0 - t),
            EaseFunction::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            EaseFunction::InCubic => t * t * t,
            EaseFunction::OutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            EaseFunction::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            EaseFunction::InSine => 1.0 - (t * PI / 2.0).cos(),
            EaseFunction::OutSine => (t * PI / 2.0).sin(),
            EaseFunction::InOutSine => -0.5 * ((PI * t).cos() - 1.0),
            EaseFunction::Smooth => t * t * (3.0 - 2.0 * t),
            EaseFunction::Step => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Interpolate between two DMX values at progress `t`
    pub fn interpolate(self, from: u8, to: u8, t: f32) -> u8 {
        let eased = self.apply(t);
        let value = f32::from(from) + (f32::from(to) - f32::from(from)) * eased;
        value.round().clamp(0.0, 255.0) as u8
    }
}

impl FromStr for EaseFunction {
    type Err = RenderError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let key = normalized.strip_prefix("ease").unwrap_or(&normalized);

        let ease = match key {
            "" | "linear" => EaseFunction::Linear,
            "inquad" => EaseFunction::InQuad,
            "outquad" => EaseFunction::OutQuad,
            "inoutquad" => EaseFunction::InOutQuad,
            "incubic" => EaseFunction::InCubic,
            "outcubic" => EaseFunction::OutCubic,
            "inoutcubic" => EaseFunction::InOutCubic,
            "insine" => EaseFunction::InSine,
            "outsine" => EaseFunction::OutSine,
            "inoutsine" => EaseFunction::InOutSine,
            "smooth" | "smoothstep" => EaseFunction::Smooth,
            "step" => EaseFunction::Step,
            _ => return Err(RenderError::UnknownEaseFunction(name.to_string())),
        };
        Ok(ease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EaseFunction; 12] = [
        EaseFunction::Linear,
        EaseFunction::InQuad,
        EaseFunction::OutQuad,
        EaseFunction::InOutQuad,
        EaseFunction::InCubic,
        EaseFunction::OutCubic,
        EaseFunction::InOutCubic,
        EaseFunction::InSine,
        EaseFunction::OutSine,
        EaseFunction::InOutSine,
        EaseFunction::Smooth,
        EaseFunction::Step,
    ];

    #[test]
    fn test_endpoints() {
        for ease in ALL {
            assert!(ease.apply(0.0).abs() < 1e-5, "{:?} at 0", ease);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-5, "{:?} at 1", ease);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("linear".parse::<EaseFunction>(), Ok(EaseFunction::Linear));
        assert_eq!("InOutQuad".parse::<EaseFunction>(), Ok(EaseFunction::InOutQuad));
        assert_eq!("ease-out-sine".parse::<EaseFunction>(), Ok(EaseFunction::OutSine));
        assert_eq!(
            "bouncy".parse::<EaseFunction>(),
            Err(RenderError::UnknownEaseFunction("bouncy".to_string()))
        );
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(EaseFunction::Linear.interpolate(0, 255, 0.5), 128);
        assert_eq!(EaseFunction::Linear.interpolate(200, 100, 1.0), 100);
        assert_eq!(EaseFunction::Step.interpolate(10, 20, 0.99), 10);
        assert!(EaseFunction::InQuad.interpolate(0, 100, 0.5) < 50);
    }
}
