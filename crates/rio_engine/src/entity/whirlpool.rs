//! Vortex that drags the player in and wears them down

use rio_math::Vec2;

pub const WHIRLPOOL_DRIFT: f32 = 28.8;
/// Sensor radius in px
pub const WHIRLPOOL_RADIUS: f32 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Whirlpool {
    /// Pull reaches this far from the center (px)
    pub pull_radius: f32,
    /// Pull at the center (px/s² on a unit mass), falling off linearly to zero at the rim
    pub pull_strength: f32,
    pub damage_per_second: f32,
    /// Minimum spacing between damage ticks
    pub damage_interval_ms: f32,
    /// Visual spin (rad/s)
    pub rotation_speed: f32,
    pub drift: f32,
    damage_timer_ms: f32,
}

impl Default for Whirlpool {
    fn default() -> Self {
        Self::new()
    }
}

impl Whirlpool {
    pub fn new() -> Self {
        Self {
            pull_radius: 100.0,
            pull_strength: 400.0,
            damage_per_second: 5.0,
            damage_interval_ms: 200.0,
            rotation_speed: 3.0,
            drift: WHIRLPOOL_DRIFT,
            damage_timer_ms: 0.0,
        }
    }

    /// Force pulling `target` toward `center`, or `None` outside the pull radius.
    pub fn pull_force(&self, center: Vec2, target: Vec2) -> Option<Vec2> {
        let offset = center - target;
        let distance = offset.length();
        if distance > self.pull_radius {
            return None;
        }
        if distance == 0.0 {
            return Some(Vec2::ZERO);
        }

        let strength = self.pull_strength * (1.0 - distance / self.pull_radius);
        Some(offset / distance * strength)
    }

    /// Damage for this call if the interval has elapsed, restarting the interval.
    pub fn try_damage_tick(&mut self) -> Option<f32> {
        if self.damage_timer_ms < self.damage_interval_ms {
            return None;
        }
        self.damage_timer_ms = 0.0;
        Some(self.damage_per_second * self.damage_interval_ms / 1000.0)
    }

    pub(crate) fn tick(&mut self, delta_ms: f32) {
        self.damage_timer_ms += delta_ms.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pull_outside_radius() {
        let w = Whirlpool::new();
        assert!(w.pull_force(Vec2::ZERO, Vec2::new(101.0, 0.0)).is_none());
    }

    #[test]
    fn test_pull_falls_off_linearly() {
        let w = Whirlpool::new();
        let near = w.pull_force(Vec2::ZERO, Vec2::new(25.0, 0.0)).unwrap();
        let far = w.pull_force(Vec2::ZERO, Vec2::new(75.0, 0.0)).unwrap();
        assert_relative_eq!(near.length(), 300.0, epsilon = 1e-3);
        assert_relative_eq!(far.length(), 100.0, epsilon = 1e-3);
        // Points back toward the center
        assert!(near.x < 0.0);
        assert_relative_eq!(
            w.pull_force(Vec2::ZERO, Vec2::new(100.0, 0.0)).unwrap().length(),
            0.0
        );
    }

    #[test]
    fn test_damage_rate_limited() {
        let mut w = Whirlpool::new();
        assert!(w.try_damage_tick().is_none());
        w.tick(150.0);
        assert!(w.try_damage_tick().is_none());
        w.tick(60.0);
        assert_relative_eq!(w.try_damage_tick().unwrap(), 1.0);
        assert!(w.try_damage_tick().is_none());
    }
}
