use backdrop_common::Euler;
use std::f32::consts::TAU;

/// Continuous yaw spin with a gentle, clock-driven pitch wobble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    /// Radians added to yaw per frame.
    pub yaw_step: f32,
    /// Peak pitch in radians.
    pub pitch_amplitude: f32,
    /// Angular rate of the wobble, in radians per millisecond.
    pub pitch_rate: f64,
}

impl Default for Spin {
    fn default() -> Self {
        Self {
            yaw_step: 0.01,
            pitch_amplitude: 0.1,
            pitch_rate: 0.001,
        }
    }
}

impl Spin {
    /// Pitch at `elapsed_ms`. Depends on the clock only, never on frame count.
    pub fn pitch_at(&self, elapsed_ms: f64) -> f32 {
        ((elapsed_ms * self.pitch_rate).sin() * self.pitch_amplitude as f64) as f32
    }

    /// Yaw one frame after `yaw`, wrapped into `[0, 2π)`.
    pub fn advance_yaw(&self, yaw: f32) -> f32 {
        (yaw + self.yaw_step).rem_euclid(TAU)
    }

    /// Apply one frame to `rotation`.
    pub fn apply(&self, rotation: &mut Euler, elapsed_ms: f64) {
        rotation.y = self.advance_yaw(rotation.y);
        rotation.x = self.pitch_at(elapsed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_matches_formula_and_is_bounded() {
        let spin = Spin::default();
        for t in [0.0, 1.0, 250.0, 1570.8, 10_000.0, 86_400_000.0] {
            let expected = ((t * 0.001_f64).sin() * 0.1) as f32;
            let pitch = spin.pitch_at(t);
            assert!((pitch - expected).abs() < 1e-7);
            assert!((-0.1..=0.1).contains(&pitch));
        }
        assert_eq!(spin.pitch_at(0.0), 0.0);
    }

    #[test]
    fn pitch_is_pure_in_time() {
        let spin = Spin::default();
        let mut rotation = Euler::default();
        spin.apply(&mut rotation, 1234.0);
        let first = rotation.x;
        for _ in 0..50 {
            spin.apply(&mut rotation, 1234.0);
        }
        assert_eq!(rotation.x, first);
    }

    #[test]
    fn yaw_accumulates_per_frame() {
        let spin = Spin::default();
        let mut yaw = 0.0;
        for n in 1..=100 {
            let next = spin.advance_yaw(yaw);
            assert!(next > yaw);
            yaw = next;
            assert!((yaw - 0.01 * n as f32).abs() < 1e-4);
        }
        assert!((yaw - 1.0).abs() < 1e-4);
    }

    #[test]
    fn yaw_wraps_past_full_turn() {
        let spin = Spin::default();
        let mut yaw = 0.0;
        for _ in 0..700 {
            yaw = spin.advance_yaw(yaw);
        }
        assert!((yaw - (7.0 - TAU)).abs() < 1e-3);
        assert!((0.0..TAU).contains(&yaw));
    }
}
