use crate::net::Input;

/// Decides whether the server should apply an input at all. Rejected inputs
/// are dropped without acknowledgement.
pub trait InputPolicy {
    fn accept(&self, input: &Input) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl InputPolicy for AcceptAll {
    fn accept(&self, _input: &Input) -> bool {
        true
    }
}

/// Rejects samples covering more time than a client could plausibly have
/// held a key for between two of its ticks.
#[derive(Debug, Clone, Copy)]
pub struct MaxDisplacement {
    pub max_step: f32,
}

impl MaxDisplacement {
    pub const DEFAULT_MAX_STEP: f32 = 1.0 / 40.0;

    pub fn new(max_step: f32) -> Self {
        Self { max_step }
    }
}

impl Default for MaxDisplacement {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_STEP)
    }
}

impl InputPolicy for MaxDisplacement {
    fn accept(&self, input: &Input) -> bool {
        input.displacement.abs() <= self.max_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(displacement: f32) -> Input {
        Input {
            sequence: 0,
            entity_id: 0,
            displacement,
        }
    }

    #[test]
    fn accept_all_accepts_anything() {
        assert!(AcceptAll.accept(&input(1e6)));
    }

    #[test]
    fn max_displacement_checks_magnitude() {
        let policy = MaxDisplacement::default();
        assert!(policy.accept(&input(0.02)));
        assert!(policy.accept(&input(-0.025)));
        assert!(!policy.accept(&input(0.03)));
        assert!(!policy.accept(&input(-0.5)));
    }
}
