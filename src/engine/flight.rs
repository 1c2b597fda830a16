// Bee flight path: a three-phase state machine advanced once per simulation tick.
//
//   Orbiting ──(angle in (350, 360))──▶ Overflying ──(step ≥ max)──▶ Returning
//      ▲                                                                │
//      └─────────────(radius and height within tolerance, snap)────────┘
//
// All increments are per tick, never per second. The renderer reads a
// `BeePose` snapshot after the tick and never touches the controller itself.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};

/// Overflight height moves this fraction of the way to its target each tick.
const OVERFLIGHT_HEIGHT_SMOOTHING: f32 = 0.1;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Tunable constants of the flight path. Angles in degrees, speeds in degrees per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightParams {
    pub orbit_radius: f32,
    pub orbit_height: f32,
    pub orbit_angular_speed: f32,
    pub overflight_angular_speed: f32,
    /// Closest approach to the stem, reached at the middle of the overflight.
    pub min_overflight_radius: f32,
    /// Peak height of the overflight arc, above the flower head.
    pub max_overflight_height: f32,
    pub max_overflight_steps: u32,
    /// Exponential-decay factor in (0, 1] used while returning to the orbit.
    pub return_smoothing: f32,
    /// Orbiting switches to Overflying once the angle passes this value.
    pub overflight_window_start: f32,
    /// The overflight always starts from the orbit point at this angle.
    pub overflight_entry_angle: f32,
    /// Returning ends once both radius and height are closer than this.
    pub return_tolerance: f32,
    /// Nose-up pitch held while settling back into the orbit.
    pub return_pitch: f32,
}

impl Default for FlightParams {
    fn default() -> Self {
        Self {
            orbit_radius: 2.5,
            orbit_height: 2.0,
            orbit_angular_speed: 1.0,
            overflight_angular_speed: 1.2,
            min_overflight_radius: 1.0,
            max_overflight_height: 4.5,
            max_overflight_steps: 120,
            return_smoothing: 0.1,
            overflight_window_start: 350.0,
            overflight_entry_angle: 359.9,
            return_tolerance: 0.05,
            return_pitch: 10.0,
        }
    }
}

// ============================================================================
// PHASE + POSE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightPhase {
    Orbiting,
    Overflying,
    Returning,
}

impl FlightPhase {
    pub fn label(self) -> &'static str {
        match self {
            FlightPhase::Orbiting => "orbiting",
            FlightPhase::Overflying => "overflying",
            FlightPhase::Returning => "returning",
        }
    }
}

/// Immutable per-frame snapshot handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeePose {
    pub position: Vec3,
    /// Heading in degrees around +Y.
    pub yaw: f32,
    /// Nose tilt in degrees around the bee's local X axis.
    pub pitch: f32,
    pub phase: FlightPhase,
}

impl BeePose {
    /// Yaw applied first, then pitch in the yawed frame.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw.to_radians()) * Quat::from_rotation_x(self.pitch.to_radians())
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Owns the bee's continuous flight state. One instance lives for the whole run.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct FlightController {
    params: FlightParams,
    phase: FlightPhase,
    angle: f32,
    radius: f32,
    height: f32,
    position: Vec3,
    overflight_step: u32,
}

impl Default for FlightController {
    fn default() -> Self {
        Self::new(FlightParams::default())
    }
}

impl FlightController {
    /// Start orbiting at angle 0 with the orbit radius and height.
    pub fn new(params: FlightParams) -> Self {
        let mut controller = Self {
            params,
            phase: FlightPhase::Orbiting,
            angle: 0.0,
            radius: params.orbit_radius,
            height: params.orbit_height,
            position: Vec3::ZERO,
            overflight_step: 0,
        };
        controller.position = controller.position_at(controller.angle);
        controller
    }

    pub fn params(&self) -> &FlightParams { &self.params }
    pub fn phase(&self) -> FlightPhase { self.phase }
    pub fn angle(&self) -> f32 { self.angle }
    pub fn radius(&self) -> f32 { self.radius }
    pub fn height(&self) -> f32 { self.height }
    pub fn position(&self) -> Vec3 { self.position }
    pub fn overflight_step(&self) -> u32 { self.overflight_step }

    /// Advance the flight by exactly one tick.
    pub fn advance(&mut self) {
        match self.phase {
            FlightPhase::Orbiting => self.advance_orbiting(),
            FlightPhase::Overflying => self.advance_overflying(),
            FlightPhase::Returning => self.advance_returning(),
        }
    }

    /// Pose derived from the current state. Yaw follows the orbit tangent in every phase.
    pub fn pose(&self) -> BeePose {
        let pitch = match self.phase {
            FlightPhase::Orbiting => 0.0,
            FlightPhase::Overflying => {
                let progress = self.progress();
                if progress < 0.5 {
                    -30.0 * progress / 0.5
                } else {
                    30.0 * (progress - 0.5) / 0.5
                }
            }
            FlightPhase::Returning => self.params.return_pitch,
        };

        BeePose {
            position: self.position,
            yaw: self.angle + 90.0,
            pitch,
            phase: self.phase,
        }
    }

    fn advance_orbiting(&mut self) {
        let p = self.params;

        self.angle += p.orbit_angular_speed;
        if self.angle >= 360.0 {
            self.angle -= 360.0;
        }
        self.radius = p.orbit_radius;
        self.height = p.orbit_height;
        self.overflight_step = 0;
        self.position = self.position_at(self.angle);

        if self.angle > p.overflight_window_start && self.angle < 360.0 {
            // Fixed start point, independent of where this tick landed.
            self.position = self.position_at(p.overflight_entry_angle);
            self.enter(FlightPhase::Overflying);
        }
    }

    fn advance_overflying(&mut self) {
        let p = self.params;

        self.angle += p.overflight_angular_speed;

        let factor = (self.progress() * std::f32::consts::PI).sin();

        // Uses the previous tick's radius as the baseline, so the radius only
        // ever closes in on the minimum during the maneuver.
        self.radius = p.min_overflight_radius + (self.radius - p.min_overflight_radius) * (1.0 - factor);

        let target_height = p.orbit_height + (p.max_overflight_height - p.orbit_height) * factor;
        self.height += (target_height - self.height) * OVERFLIGHT_HEIGHT_SMOOTHING;

        self.position = self.position_at(self.angle);
        self.overflight_step += 1;

        if self.overflight_step >= p.max_overflight_steps {
            self.enter(FlightPhase::Returning);
        }
    }

    fn advance_returning(&mut self) {
        let p = self.params;

        self.radius += (p.orbit_radius - self.radius) * p.return_smoothing;
        self.height += (p.orbit_height - self.height) * p.return_smoothing;

        let radius_error = (p.orbit_radius - self.radius).abs() / p.orbit_radius;
        self.angle += p.orbit_angular_speed * (0.5 + 0.5 * (1.0 - radius_error));

        self.position = self.position_at(self.angle);

        if (self.radius - p.orbit_radius).abs() < p.return_tolerance
            && (self.height - p.orbit_height).abs() < p.return_tolerance
        {
            self.angle = 0.0;
            self.radius = p.orbit_radius;
            self.height = p.orbit_height;
            self.position = self.position_at(self.angle);
            self.enter(FlightPhase::Orbiting);
        }
    }

    fn enter(&mut self, phase: FlightPhase) {
        log::debug!(
            "bee flight: {} -> {} (angle {:.1}, radius {:.3}, height {:.3})",
            self.phase.label(),
            phase.label(),
            self.angle,
            self.radius,
            self.height,
        );
        self.phase = phase;
    }

    /// Overflight progress in [0, 1].
    fn progress(&self) -> f32 {
        self.overflight_step as f32 / self.params.max_overflight_steps as f32
    }

    fn position_at(&self, angle_deg: f32) -> Vec3 {
        let a = angle_deg.to_radians();
        Vec3::new(a.sin() * self.radius, self.height, a.cos() * self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Enough ticks for several full cycles with default parameters.
    const LONG_RUN: usize = 5_000;

    fn advance_until(c: &mut FlightController, phase: FlightPhase, limit: usize) -> usize {
        for n in 1..=limit {
            c.advance();
            if c.phase() == phase {
                return n;
            }
        }
        panic!("never reached {phase:?} within {limit} ticks");
    }

    #[test]
    fn starts_orbiting_at_angle_zero() {
        let c = FlightController::default();
        assert_eq!(c.phase(), FlightPhase::Orbiting);
        assert_eq!(c.angle(), 0.0);
        assert_eq!(c.radius(), 2.5);
        assert_eq!(c.height(), 2.0);
        assert!((c.position() - Vec3::new(0.0, 2.0, 2.5)).length() < 1e-6);
    }

    #[test]
    fn full_cycle_snaps_back_to_exact_orbit() {
        let mut c = FlightController::default();
        advance_until(&mut c, FlightPhase::Overflying, 1_000);
        advance_until(&mut c, FlightPhase::Returning, 1_000);
        advance_until(&mut c, FlightPhase::Orbiting, 1_000);

        assert_eq!(c.angle(), 0.0);
        assert_eq!(c.radius(), c.params().orbit_radius);
        assert_eq!(c.height(), c.params().orbit_height);
        assert_eq!(c.overflight_step(), c.params().max_overflight_steps);
    }

    #[test]
    fn overflight_starts_after_351_ticks() {
        let mut c = FlightController::default();
        for _ in 0..350 {
            c.advance();
        }
        assert_eq!(c.phase(), FlightPhase::Orbiting);

        c.advance();
        assert_eq!(c.phase(), FlightPhase::Overflying);
        assert_eq!(c.overflight_step(), 0);

        // Entry point is the orbit point at 359.9°, not at the 351° the tick landed on.
        let a = 359.9_f32.to_radians();
        let expected = Vec3::new(a.sin() * 2.5, 2.0, a.cos() * 2.5);
        assert!((c.position() - expected).length() < 1e-5);
    }

    #[test]
    fn returning_starts_after_overflight_steps() {
        let mut c = FlightController::default();
        let max = c.params().max_overflight_steps as usize;
        for _ in 0..351 + max - 1 {
            c.advance();
        }
        assert_eq!(c.phase(), FlightPhase::Overflying);

        c.advance();
        assert_eq!(c.phase(), FlightPhase::Returning);
    }

    #[test]
    fn orbit_angle_stays_normalized() {
        let mut c = FlightController::default();
        for _ in 0..LONG_RUN {
            c.advance();
            if c.phase() == FlightPhase::Orbiting {
                assert!((0.0..360.0).contains(&c.angle()), "angle {}", c.angle());
            }
        }
    }

    #[test]
    fn orbit_angle_wraps_when_window_never_matches() {
        // 25° steps from 0 land on 350 and then 375 -> 15, skipping the open window.
        let params = FlightParams { orbit_angular_speed: 25.0, ..FlightParams::default() };
        let mut c = FlightController::new(params);
        for _ in 0..15 {
            c.advance();
        }
        assert_eq!(c.phase(), FlightPhase::Orbiting);
        assert!((c.angle() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn overflight_step_is_bounded_and_reset_once_per_entry() {
        let mut c = FlightController::default();
        let max = c.params().max_overflight_steps;
        let mut entries = 0;
        let mut previous = c.phase();

        for _ in 0..LONG_RUN {
            c.advance();
            if c.phase() == FlightPhase::Overflying {
                assert!(c.overflight_step() <= max);
                if previous == FlightPhase::Orbiting {
                    entries += 1;
                    assert_eq!(c.overflight_step(), 0);
                }
            }
            previous = c.phase();
        }
        assert!(entries >= 2, "only {entries} overflights in {LONG_RUN} ticks");
    }

    #[test]
    fn phases_cycle_in_order() {
        let mut c = FlightController::default();
        let mut previous = c.phase();
        for _ in 0..LONG_RUN {
            c.advance();
            let next = c.phase();
            if next != previous {
                let allowed = matches!(
                    (previous, next),
                    (FlightPhase::Orbiting, FlightPhase::Overflying)
                        | (FlightPhase::Overflying, FlightPhase::Returning)
                        | (FlightPhase::Returning, FlightPhase::Orbiting)
                );
                assert!(allowed, "illegal transition {previous:?} -> {next:?}");
            }
            previous = next;
        }
    }

    #[test]
    fn radius_stays_positive() {
        let mut c = FlightController::default();
        for _ in 0..LONG_RUN {
            c.advance();
            assert!(c.radius() > 0.0);
        }
    }

    #[test]
    fn overflight_radius_uses_previous_tick_as_baseline() {
        let mut c = FlightController::default();
        advance_until(&mut c, FlightPhase::Overflying, 1_000);

        let p = *c.params();
        let mut expected = c.radius();
        while c.phase() == FlightPhase::Overflying {
            let t = c.overflight_step() as f32 / p.max_overflight_steps as f32;
            let factor = (t * std::f32::consts::PI).sin();
            expected = p.min_overflight_radius + (expected - p.min_overflight_radius) * (1.0 - factor);
            c.advance();
            assert!((c.radius() - expected).abs() < 1e-6);
        }
        // Closing in never reverses, so the maneuver ends at the minimum radius.
        assert!((c.radius() - p.min_overflight_radius).abs() < 1e-3);
    }

    #[test]
    fn overflight_climbs_above_the_orbit() {
        let mut c = FlightController::default();
        advance_until(&mut c, FlightPhase::Overflying, 1_000);
        let mut peak = c.height();
        while c.phase() == FlightPhase::Overflying {
            c.advance();
            peak = peak.max(c.height());
        }
        assert!(peak > 3.5, "peak height {peak}");
        assert!(peak < c.params().max_overflight_height);
    }

    #[test]
    fn identical_controllers_stay_identical() {
        let mut a = FlightController::default();
        let mut b = FlightController::default();
        for _ in 0..LONG_RUN {
            a.advance();
            b.advance();
        }
        assert_eq!(a, b);
        assert_eq!(a.pose(), b.pose());
    }

    #[test]
    fn pose_follows_phase() {
        let mut c = FlightController::default();
        let pose = c.pose();
        assert_eq!(pose.yaw, 90.0);
        assert_eq!(pose.pitch, 0.0);

        advance_until(&mut c, FlightPhase::Overflying, 1_000);
        let max = c.params().max_overflight_steps;

        let mut min_pitch = 0.0_f32;
        let mut max_pitch = 0.0_f32;
        while c.phase() == FlightPhase::Overflying {
            let pose = c.pose();
            assert_eq!(pose.yaw, c.angle() + 90.0);
            if c.overflight_step() < max / 2 {
                assert!(pose.pitch <= 0.0);
            } else {
                assert!(pose.pitch >= 0.0);
            }
            min_pitch = min_pitch.min(pose.pitch);
            max_pitch = max_pitch.max(pose.pitch);
            c.advance();
        }
        assert!(min_pitch <= -29.0 && min_pitch >= -30.0);
        assert!(max_pitch >= 29.0 && max_pitch <= 30.0);

        assert_eq!(c.phase(), FlightPhase::Returning);
        assert_eq!(c.pose().pitch, 10.0);
    }

    #[test]
    fn pose_rotation_turns_local_x_onto_heading() {
        let pose = BeePose { position: Vec3::ZERO, yaw: 90.0, pitch: 0.0, phase: FlightPhase::Orbiting };
        let forward = pose.rotation() * Vec3::X;
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
    }
}
