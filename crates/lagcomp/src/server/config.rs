use crate::entity::{DEFAULT_ENTITY_SPEED, EntityId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl WorldBounds {
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
    };

    pub fn clamp(&self, position: f32) -> f32 {
        let position = self.min.map_or(position, |min| position.max(min));
        self.max.map_or(position, |max| position.min(max))
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min: Some(-5.0),
            max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub world_bounds: WorldBounds,
    pub entity_speed: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 10,
            world_bounds: WorldBounds::default(),
            entity_speed: DEFAULT_ENTITY_SPEED,
        }
    }
}

pub type SpawnPolicy = Box<dyn Fn(EntityId) -> f32>;

const SPAWN_POINTS: [f32; 2] = [-3.0, 3.0];

/// Players 0 and 1 face each other at -3 and 3; later joiners line up to the
/// right, two units apart.
pub fn default_spawn(id: EntityId) -> f32 {
    match SPAWN_POINTS.get(id as usize) {
        Some(position) => *position,
        None => 3.0 + 2.0 * (id - 1) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_only_clamp_below() {
        let bounds = WorldBounds::default();
        assert_eq!(bounds.clamp(-7.5), -5.0);
        assert_eq!(bounds.clamp(-5.0), -5.0);
        assert_eq!(bounds.clamp(1000.0), 1000.0);
    }

    #[test]
    fn upper_bound_is_optional() {
        let bounds = WorldBounds {
            min: Some(-1.0),
            max: Some(1.0),
        };
        assert_eq!(bounds.clamp(2.0), 1.0);
        assert_eq!(bounds.clamp(0.25), 0.25);
        assert_eq!(WorldBounds::UNBOUNDED.clamp(-1e6), -1e6);
    }

    #[test]
    fn spawn_table() {
        assert_eq!(default_spawn(0), -3.0);
        assert_eq!(default_spawn(1), 3.0);
        assert_eq!(default_spawn(2), 5.0);
        assert_eq!(default_spawn(3), 7.0);
    }
}
