use std::collections::VecDeque;

use crate::entity::Entity;
use crate::net::Input;

/// Inputs sent to the server that it has not acknowledged yet, in send order.
#[derive(Debug, Default, Clone)]
pub struct PendingInputs {
    inputs: VecDeque<Input>,
}

impl PendingInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, input: Input) {
        debug_assert!(
            self.inputs
                .back()
                .is_none_or(|last| last.sequence < input.sequence),
            "pending inputs must have increasing sequence numbers"
        );
        self.inputs.push_back(input);
    }

    /// Drops every input the server has already applied and replays the rest
    /// on top of the authoritative position already set on `entity`.
    pub fn reconcile(&mut self, entity: &mut Entity, last_processed: Option<u32>) {
        if let Some(ack) = last_processed {
            while self.inputs.front().is_some_and(|input| input.sequence <= ack) {
                self.inputs.pop_front();
            }
        }
        for input in &self.inputs {
            entity.apply_input(input);
        }
    }

    pub fn clear(&mut self) {
        self.inputs.clear();
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Input> {
        self.inputs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DEFAULT_ENTITY_SPEED;

    fn pending(displacements: &[f32]) -> PendingInputs {
        let mut pending = PendingInputs::new();
        for (seq, d) in displacements.iter().enumerate() {
            pending.push(Input {
                sequence: seq as u32,
                entity_id: 0,
                displacement: *d,
            });
        }
        pending
    }

    #[test]
    fn reconcile_keeps_only_unacknowledged_inputs() {
        let displacements = [0.02, 0.02, -0.01, 0.03, 0.015];
        let mut pending = pending(&displacements);
        let mut entity = Entity::spawned_at(0, 1.5, DEFAULT_ENTITY_SPEED);

        pending.reconcile(&mut entity, Some(2));

        let kept: Vec<u32> = pending.iter().map(|i| i.sequence).collect();
        assert_eq!(kept, vec![3, 4]);
        let expected = 1.5 + DEFAULT_ENTITY_SPEED * (0.03 + 0.015);
        assert!((entity.position - expected).abs() < 1e-5);
    }

    #[test]
    fn reconcile_without_ack_replays_everything() {
        let mut pending = pending(&[0.1, 0.1]);
        let mut entity = Entity::spawned_at(0, 0.0, DEFAULT_ENTITY_SPEED);

        pending.reconcile(&mut entity, None);

        assert_eq!(pending.len(), 2);
        assert!((entity.position - 2.0).abs() < 1e-5);
    }

    #[test]
    fn reconcile_with_everything_acknowledged_empties_the_queue() {
        let mut pending = pending(&[0.1, 0.1, 0.1]);
        let mut entity = Entity::spawned_at(0, 4.0, DEFAULT_ENTITY_SPEED);

        pending.reconcile(&mut entity, Some(10));

        assert!(pending.is_empty());
        assert_eq!(entity.position, 4.0);
    }
}
