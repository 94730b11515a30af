use std::collections::VecDeque;
use std::time::Duration;

use crate::net::Input;

pub type EntityId = u32;

/// Units per second.
pub const DEFAULT_ENTITY_SPEED: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPosition {
    pub timestamp: Duration,
    pub position: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub position: f32,
    pub speed: f32,
    /// Authoritative samples of a remote entity, oldest first.
    pub position_buffer: VecDeque<TimedPosition>,
}

impl Entity {
    pub fn new(id: EntityId, speed: f32) -> Self {
        Self {
            id,
            position: 0.0,
            speed,
            position_buffer: VecDeque::new(),
        }
    }

    pub fn spawned_at(id: EntityId, position: f32, speed: f32) -> Self {
        Self {
            position,
            ..Self::new(id, speed)
        }
    }

    pub fn apply_input(&mut self, input: &Input) {
        self.position += input.displacement * self.speed;
    }

    pub fn push_sample(&mut self, timestamp: Duration, position: f32) {
        self.position_buffer.push_back(TimedPosition {
            timestamp,
            position,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(sequence: u32, displacement: f32) -> Input {
        Input {
            sequence,
            entity_id: 0,
            displacement,
        }
    }

    #[test]
    fn apply_input_scales_by_speed() {
        let mut entity = Entity::spawned_at(0, -3.0, DEFAULT_ENTITY_SPEED);
        entity.apply_input(&input(0, 0.02));
        assert!((entity.position - -2.8).abs() < 1e-5);

        entity.apply_input(&input(1, -0.05));
        assert!((entity.position - -3.3).abs() < 1e-5);
    }

    #[test]
    fn inputs_accumulate_to_speed_times_sum() {
        let displacements = [0.016, 0.02, -0.011, 0.033, -0.004, 0.02];
        let mut entity = Entity::spawned_at(1, 3.0, 4.0);

        for (seq, d) in displacements.iter().enumerate() {
            entity.apply_input(&input(seq as u32, *d));
        }

        let expected = 3.0 + 4.0 * displacements.iter().sum::<f32>();
        assert!((entity.position - expected).abs() < 1e-5);
    }

    #[test]
    fn apply_input_does_not_clamp() {
        let mut entity = Entity::spawned_at(0, 0.0, DEFAULT_ENTITY_SPEED);
        entity.apply_input(&input(0, -100.0));
        assert_eq!(entity.position, -1000.0);
    }
}
