//! Generative background field.
//!
//! A prism-like interference pattern of three travelling sine waves, sampled
//! per cell and mapped onto a density palette. A fixed per-cell grain drawn
//! from a seeded RNG breaks up the banding. Purely cosmetic: it never takes
//! input and is always drawn underneath page content.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const PALETTE: &[u8] = b" .:-=+*#%@";
const GRAIN_ROWS: usize = 64;

/// Speed multiplier applied to elapsed time.
pub const TIME_SCALE: f32 = 0.6;
/// Amplitude of the per-cell grain.
pub const NOISE: f32 = 0.15;

#[derive(Debug, Clone)]
pub struct Backdrop {
    width: usize,
    phases: [f32; 3],
    grain: Vec<f32>,
}

impl Backdrop {
    /// A backdrop `width` columns wide. The same seed always yields the same
    /// field.
    pub fn new(width: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let phases = [
            rng.random_range(0.0..std::f32::consts::TAU),
            rng.random_range(0.0..std::f32::consts::TAU),
            rng.random_range(0.0..std::f32::consts::TAU),
        ];
        let grain = (0..width.max(1) * GRAIN_ROWS)
            .map(|_| rng.random::<f32>() - 0.5)
            .collect();
        Self {
            width,
            phases,
            grain,
        }
    }

    /// Intensity in `0.0..=1.0` of cell (`x`, `y`) at time `t` seconds.
    fn intensity(&self, x: usize, y: usize, t: f32) -> f32 {
        let (xf, yf) = (x as f32, y as f32 * 2.0);
        let t = t * TIME_SCALE;
        let wave = (xf * 0.21 + t + self.phases[0]).sin()
            + (yf * 0.37 - t * 1.3 + self.phases[1]).sin()
            + ((xf + yf) * 0.11 + t * 0.7 + self.phases[2]).sin();
        let base = (wave + 3.0) / 6.0;
        let grain = self.grain[(y % GRAIN_ROWS) * self.width.max(1) + x % self.width.max(1)];
        (base + grain * NOISE * 2.0).clamp(0.0, 1.0)
    }

    /// Row `y` of the field at `elapsed`, exactly `width` ASCII characters.
    pub fn row(&self, y: usize, elapsed: Duration) -> String {
        let t = elapsed.as_secs_f32();
        (0..self.width)
            .map(|x| {
                let level = self.intensity(x, y, t);
                let index = ((level * (PALETTE.len() - 1) as f32).round() as usize)
                    .min(PALETTE.len() - 1);
                PALETTE[index] as char
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_width() {
        let backdrop = Backdrop::new(42, 1);
        for y in 0..5 {
            assert_eq!(backdrop.row(y, Duration::from_millis(250)).len(), 42);
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = Backdrop::new(30, 99);
        let b = Backdrop::new(30, 99);
        let t = Duration::from_secs(3);
        assert_eq!(a.row(0, t), b.row(0, t));
        assert_eq!(a.row(7, t), b.row(7, t));
    }

    #[test]
    fn test_field_moves_over_time() {
        let backdrop = Backdrop::new(60, 5);
        let frames: Vec<String> = (0..4)
            .map(|s| backdrop.row(2, Duration::from_secs(s)))
            .collect();
        assert!(frames.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_only_palette_characters() {
        let backdrop = Backdrop::new(50, 3);
        let row = backdrop.row(10, Duration::from_secs(2));
        assert!(row.bytes().all(|b| PALETTE.contains(&b)));
    }

    #[test]
    fn test_zero_width() {
        let backdrop = Backdrop::new(0, 3);
        assert_eq!(backdrop.row(0, Duration::ZERO), "");
    }
}
