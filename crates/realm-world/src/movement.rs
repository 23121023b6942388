//! Movement integrator: advances a moving character along its path.
//!
//! Each tick a character has a budget of `speed * delta` units. The budget
//! is spent across as many waypoints as it covers, so a fast character never
//! lags one tick per waypoint. Reaching a waypoint snaps the position onto it
//! exactly. Left-over budget is discarded at the end of the tick.

use realm_types::{MovementState, Vec2};

use crate::entity::Character;

/// What an integration step did to a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementOutcome {
    /// The character was not moving.
    Stationary,
    /// The character moved and still has waypoints ahead.
    Advanced,
    /// The character reached the end of its route and is now idle.
    Arrived,
}

/// Advance `character` (standing at `position`) by one tick of
/// `delta_seconds`.
pub fn integrate(position: &mut Vec2, character: &mut Character, delta_seconds: f64) -> MovementOutcome {
    if character.state() != MovementState::Moving {
        return MovementOutcome::Stationary;
    }

    let Some(mut next) = character.path().front().copied() else {
        // Moving with nothing to follow is inconsistent; settle it.
        character.go_idle();
        return MovementOutcome::Arrived;
    };

    let mut budget = character.speed * delta_seconds;

    loop {
        let offset = next - *position;
        let distance = offset.length();

        if budget < distance {
            if let Some(direction) = offset.normalized() {
                *position = *position + direction * budget;
            }
            return MovementOutcome::Advanced;
        }

        budget -= distance;
        *position = next;
        character.path_mut().pop_front();

        if let Some(&following) = character.path().front() {
            next = following;
            continue;
        }

        match character.take_pending_path() {
            Some(pending) if !pending.is_empty() => {
                *character.path_mut() = pending;
                match character.path().front() {
                    Some(&first) => next = first,
                    None => break,
                }
            }
            _ => break,
        }
    }

    character.go_idle();
    MovementOutcome::Arrived
}
