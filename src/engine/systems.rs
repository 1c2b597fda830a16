// ECS systems run once per frame, in order: advance_flight, then follow_flight.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use super::components::*;
use super::flight::FlightController;

/// Run the flight state machine once per tick owed this frame.
pub fn advance_flight(mut flight: ResMut<FlightController>, ticks: Res<SimulationTicks>) {
    for _ in 0..ticks.0 {
        flight.advance();
    }
}

/// Place every bee part from this frame's pose snapshot.
pub fn follow_flight(flight: Res<FlightController>, mut parts: Query<(&BeePart, &mut Transform)>) {
    let pose = flight.pose();
    let rotation = pose.rotation();

    for (part, mut transform) in parts.iter_mut() {
        transform.position = pose.position + rotation * part.offset;
        transform.rotation = rotation;
    }
}

/// Schedule holding the per-frame simulation systems.
/// Single-threaded: the flight controller is only ever touched from the simulation thread.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((advance_flight, follow_flight).chain());
    schedule
}
