mod config;
mod interpolation;
mod prediction;

use std::time::Duration;

pub use config::ClientConfig;
pub use interpolation::interpolate;
pub use prediction::PendingInputs;

use crate::clock::SharedClock;
use crate::entity::{DEFAULT_ENTITY_SPEED, Entity, EntityId};
use crate::error::Result;
use crate::input::InputSource;
use crate::net::{EntityState, Input, LinkHandle, Payload, WorldStateSnapshot};
use crate::render::SharedSink;
use crate::server::Server;
use crate::simulation::TickSchedule;

struct ServerLink {
    link: LinkHandle,
    tick_interval: Duration,
}

pub struct Client {
    config: ClientConfig,
    clock: SharedClock,
    sink: SharedSink,
    input: Box<dyn InputSource>,
    schedule: TickSchedule,
    inbound: LinkHandle,
    server: Option<ServerLink>,
    entity_id: Option<EntityId>,
    entity_speed: f32,
    entities: Vec<Entity>,
    pending: PendingInputs,
    next_sequence: u32,
    last_input_at: Option<Duration>,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        clock: SharedClock,
        input: impl InputSource + 'static,
        sink: SharedSink,
    ) -> Result<Self> {
        let config = config.normalized();
        let schedule = TickSchedule::new(config.tick_rate)?;
        Ok(Self {
            inbound: LinkHandle::new(clock.clone()),
            config,
            clock,
            sink,
            input: Box::new(input),
            schedule,
            server: None,
            entity_id: None,
            entity_speed: DEFAULT_ENTITY_SPEED,
            entities: Vec::new(),
            pending: PendingInputs::new(),
            next_sequence: 0,
            last_input_at: None,
        })
    }

    pub fn connect(&mut self, server: &mut Server) -> EntityId {
        let connection = server.connect(self.inbound.clone(), self.config.lag);
        log::info!(
            "connected as entity {} (server at {} Hz)",
            connection.entity_id,
            connection.server_tick_rate
        );

        self.entity_id = Some(connection.entity_id);
        self.entity_speed = connection.entity_speed;
        self.server = Some(ServerLink {
            link: connection.server_link,
            tick_interval: Duration::from_nanos(
                1_000_000_000 / u64::from(connection.server_tick_rate.max(1)),
            ),
        });
        connection.entity_id
    }

    /// Runs one update if the tick is due. Returns whether it ran.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.schedule.poll(self.clock.now()) {
            return Ok(false);
        }

        self.process_server_messages()?;

        let Some(entity_id) = self.entity_id else {
            return Ok(true);
        };

        self.process_inputs(entity_id)?;

        if self.config.interpolation {
            self.interpolate_entities(entity_id);
        }

        self.sink
            .borrow_mut()
            .render(entity_id + 1, &self.entities)?;
        Ok(true)
    }

    fn process_server_messages(&mut self) -> Result<()> {
        // Snapshots only make sense relative to our own entity.
        let Some(own_id) = self.entity_id else {
            return Ok(());
        };

        while let Some(payload) = self.inbound.receive()? {
            match payload {
                Payload::WorldState(snapshot) => self.apply_world_state(own_id, snapshot),
                other => {
                    log::warn!("client {} dropped unexpected {} message", own_id, other.kind());
                }
            }
        }
        Ok(())
    }

    fn apply_world_state(&mut self, own_id: EntityId, snapshot: WorldStateSnapshot) {
        let now = self.clock.now();
        for state in snapshot.entities {
            if state.entity_id == own_id {
                self.apply_own_state(state);
            } else {
                let entity = shadow(&mut self.entities, &state, self.entity_speed);
                if self.config.interpolation {
                    entity.push_sample(now, state.position);
                } else {
                    entity.position = state.position;
                }
            }
        }
    }

    fn apply_own_state(&mut self, state: EntityState) {
        let entity = shadow(&mut self.entities, &state, self.entity_speed);
        entity.position = state.position;

        if self.config.reconciliation {
            self.pending.reconcile(entity, state.last_processed_input);
        } else {
            self.pending.clear();
        }
    }

    fn process_inputs(&mut self, entity_id: EntityId) -> Result<()> {
        let now = self.clock.now();
        let dt = self
            .last_input_at
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_input_at = Some(now);

        let Some(direction) = self.input.sample().direction() else {
            return Ok(());
        };
        let Some(server) = &self.server else {
            return Ok(());
        };

        let input = Input {
            sequence: self.next_sequence,
            entity_id,
            displacement: direction * dt.as_secs_f32(),
        };
        self.next_sequence += 1;

        server.link.send(self.config.lag, input)?;
        log::trace!(
            "entity {} sent input #{} ({:+.4})",
            entity_id,
            input.sequence,
            input.displacement
        );

        if self.config.prediction {
            // Before the first snapshot there is no shadow to predict on; the
            // input stays pending and is replayed once one arrives.
            if let Some(entity) = self.entities.get_mut(entity_id as usize) {
                entity.apply_input(&input);
            }
        }

        self.pending.push(input);
        Ok(())
    }

    fn interpolate_entities(&mut self, own_id: EntityId) {
        let Some(server) = &self.server else {
            return;
        };
        let Some(render_ts) = self.clock.now().checked_sub(server.tick_interval) else {
            return;
        };

        for entity in self.entities.iter_mut().filter(|e| e.id != own_id) {
            if let Some(position) = interpolate(&mut entity.position_buffer, render_ts) {
                entity.position = position;
            }
        }
    }

    pub fn set_prediction(&mut self, enabled: bool) {
        self.config.prediction = enabled;
        self.config.reconciliation &= enabled;
        log::debug!("prediction {}", on_off(enabled));
    }

    /// Has no effect while prediction is off.
    pub fn set_reconciliation(&mut self, enabled: bool) {
        self.config.reconciliation = enabled && self.config.prediction;
        log::debug!("reconciliation {}", on_off(self.config.reconciliation));
    }

    pub fn set_interpolation(&mut self, enabled: bool) {
        self.config.interpolation = enabled;
        if !enabled {
            for entity in &mut self.entities {
                entity.position_buffer.clear();
            }
        }
        log::debug!("interpolation {}", on_off(enabled));
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id as usize)
    }

    pub fn pending_inputs(&self) -> &PendingInputs {
        &self.pending
    }

    pub fn pending_input_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }
}

/// Local copy of the entity `state` describes. A first sighting creates it
/// where the server says it is, along with placeholders for any lower ids not
/// seen yet.
///
/// Placeholders sit at 0 and are rendered like any other entity until a
/// snapshot describes them. Snapshots list every connected entity, so a gap
/// only appears if one arrives out of id order.
fn shadow<'a>(entities: &'a mut Vec<Entity>, state: &EntityState, speed: f32) -> &'a mut Entity {
    let index = state.entity_id as usize;
    if entities.len() <= index {
        log::debug!("tracking entity {}", state.entity_id);
        while entities.len() < index {
            let id = entities.len() as EntityId;
            entities.push(Entity::new(id, speed));
        }
        entities.push(Entity::spawned_at(state.entity_id, state.position, speed));
    }
    &mut entities[index]
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::input::{HeldKeys, MoveKeys};
    use crate::render::RenderSink;
    use crate::server::ServerConfig;

    struct NullSink;

    impl RenderSink for NullSink {
        fn render(&mut self, _viewer: u32, _entities: &[Entity]) -> Result<()> {
            Ok(())
        }
    }

    struct Rig {
        clock: Rc<ManualClock>,
        server: Server,
        client: Client,
        keys: HeldKeys,
    }

    fn rig(config: ClientConfig) -> Rig {
        let clock = Rc::new(ManualClock::new());
        let sink: SharedSink = Rc::new(RefCell::new(NullSink));
        let mut server = Server::new(ServerConfig::default(), clock.clone(), sink.clone()).unwrap();
        let keys = HeldKeys::new();
        let mut client = Client::new(config, clock.clone(), keys.clone(), sink).unwrap();
        client.connect(&mut server);
        Rig {
            clock,
            server,
            client,
            keys,
        }
    }

    fn state(entity_id: EntityId, position: f32, ack: Option<u32>) -> EntityState {
        EntityState {
            entity_id,
            position,
            last_processed_input: ack,
        }
    }

    fn deliver(client: &Client, entities: Vec<EntityState>) {
        client
            .inbound
            .send(Duration::ZERO, WorldStateSnapshot { entities })
            .unwrap();
    }

    fn predicting() -> ClientConfig {
        ClientConfig {
            prediction: true,
            reconciliation: true,
            ..Default::default()
        }
    }

    #[test]
    fn first_input_has_zero_displacement() {
        let mut rig = rig(predicting());
        rig.keys.set(MoveKeys::POSITIVE);

        rig.client.tick().unwrap();
        let first = *rig.client.pending_inputs().iter().next().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.displacement, 0.0);

        rig.clock.advance(Duration::from_millis(20));
        rig.client.tick().unwrap();
        let second = *rig.client.pending_inputs().iter().nth(1).unwrap();
        assert_eq!(second.sequence, 1);
        assert!((second.displacement - 0.02).abs() < 1e-6);
    }

    #[test]
    fn idle_ticks_consume_no_sequence_numbers() {
        let mut rig = rig(ClientConfig::default());

        rig.client.tick().unwrap();
        rig.clock.advance(Duration::from_millis(20));
        rig.client.tick().unwrap();
        assert_eq!(rig.client.pending_input_count(), 0);

        rig.keys.set(MoveKeys::NEGATIVE);
        rig.clock.advance(Duration::from_millis(20));
        rig.client.tick().unwrap();

        let input = *rig.client.pending_inputs().iter().next().unwrap();
        assert_eq!(input.sequence, 0);
        assert!((input.displacement - -0.02).abs() < 1e-6);
    }

    #[test]
    fn reconciliation_replays_unacknowledged_inputs() {
        let mut rig = rig(predicting());
        for seq in 0..5 {
            rig.client.pending.push(Input {
                sequence: seq,
                entity_id: 0,
                displacement: 0.01 * (seq + 1) as f32,
            });
        }

        deliver(&rig.client, vec![state(0, 1.0, Some(2)), state(1, 3.0, None)]);
        rig.client.process_server_messages().unwrap();

        let kept: Vec<u32> = rig.client.pending_inputs().iter().map(|i| i.sequence).collect();
        assert_eq!(kept, vec![3, 4]);
        let expected = 1.0 + DEFAULT_ENTITY_SPEED * (0.04 + 0.05);
        assert!((rig.client.entity(0).unwrap().position - expected).abs() < 1e-5);
    }

    #[test]
    fn without_reconciliation_pending_inputs_are_cleared() {
        let mut rig = rig(ClientConfig {
            prediction: true,
            reconciliation: false,
            ..Default::default()
        });
        for seq in 0..3 {
            rig.client.pending.push(Input {
                sequence: seq,
                entity_id: 0,
                displacement: 0.02,
            });
        }

        deliver(&rig.client, vec![state(0, 0.5, None)]);
        rig.client.process_server_messages().unwrap();

        assert_eq!(rig.client.pending_input_count(), 0);
        assert_eq!(rig.client.entity(0).unwrap().position, 0.5);
    }

    #[test]
    fn remote_entities_snap_without_interpolation() {
        let mut rig = rig(ClientConfig {
            interpolation: false,
            ..Default::default()
        });

        deliver(&rig.client, vec![state(0, -3.0, None), state(1, 2.5, None)]);
        rig.client.process_server_messages().unwrap();

        let remote = rig.client.entity(1).unwrap();
        assert_eq!(remote.position, 2.5);
        assert!(remote.position_buffer.is_empty());
    }

    #[test]
    fn remote_entities_are_buffered_with_interpolation() {
        let mut rig = rig(ClientConfig::default());
        rig.clock.set(Duration::from_millis(40));

        deliver(&rig.client, vec![state(1, 2.5, None)]);
        rig.client.process_server_messages().unwrap();

        let remote = rig.client.entity(1).unwrap();
        assert_eq!(remote.position, 2.5);
        assert_eq!(remote.position_buffer.len(), 1);
        assert_eq!(remote.position_buffer[0].timestamp, Duration::from_millis(40));
    }

    #[test]
    fn unseen_ids_are_created_densely() {
        let mut rig = rig(ClientConfig::default());

        deliver(&rig.client, vec![state(3, 1.0, None)]);
        rig.client.process_server_messages().unwrap();

        let ids: Vec<EntityId> = rig.client.entities().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(rig.client.entity(1).unwrap().position, 0.0);
        assert_eq!(rig.client.entity(3).unwrap().position, 1.0);

        deliver(&rig.client, vec![state(1, -2.0, None)]);
        rig.client.process_server_messages().unwrap();
        let described = rig.client.entity(1).unwrap();
        assert_eq!(described.position_buffer.back().map(|s| s.position), Some(-2.0));
    }

    #[test]
    fn snapshots_wait_until_connected() {
        let clock = Rc::new(ManualClock::new());
        let sink: SharedSink = Rc::new(RefCell::new(NullSink));
        let mut client =
            Client::new(ClientConfig::default(), clock.clone(), HeldKeys::new(), sink).unwrap();

        deliver(&client, vec![state(0, 1.0, None)]);
        assert!(client.tick().unwrap());
        assert!(client.entities().is_empty());
        assert_eq!(client.pending_inbound(), 1);
    }

    #[test]
    fn stray_inputs_are_ignored() {
        let mut rig = rig(ClientConfig::default());
        rig.client.inbound.send(
            Duration::ZERO,
            Input {
                sequence: 0,
                entity_id: 0,
                displacement: 1.0,
            },
        )
        .unwrap();
        rig.client.process_server_messages().unwrap();
        assert!(rig.client.entities().is_empty());
        assert_eq!(rig.client.pending_inbound(), 0);
    }

    #[test]
    fn reconciliation_cannot_outlive_prediction() {
        let mut rig = rig(predicting());
        assert!(rig.client.config().reconciliation);

        rig.client.set_prediction(false);
        assert!(!rig.client.config().reconciliation);

        rig.client.set_reconciliation(true);
        assert!(!rig.client.config().reconciliation);

        rig.client.set_prediction(true);
        rig.client.set_reconciliation(true);
        assert!(rig.client.config().reconciliation);
    }

    #[test]
    fn disabling_interpolation_drops_buffers() {
        let mut rig = rig(ClientConfig::default());
        deliver(&rig.client, vec![state(1, 2.5, None)]);
        rig.client.process_server_messages().unwrap();

        rig.client.set_interpolation(false);
        assert!(rig.client.entity(1).unwrap().position_buffer.is_empty());
    }

    #[test]
    fn inputs_reach_the_server_after_the_lag() {
        let mut rig = rig(ClientConfig {
            lag: Duration::from_millis(100),
            ..Default::default()
        });
        rig.keys.set(MoveKeys::POSITIVE);
        rig.client.tick().unwrap();
        rig.clock.advance(Duration::from_millis(20));
        rig.client.tick().unwrap();
        assert_eq!(rig.server.stats().pending_inbound, 2);

        rig.clock.set(Duration::from_millis(110));
        rig.server.tick().unwrap();
        assert_eq!(rig.server.last_processed_input(0), Some(0));

        rig.clock.set(Duration::from_millis(210));
        rig.server.tick().unwrap();
        assert_eq!(rig.server.last_processed_input(0), Some(1));
    }
}
