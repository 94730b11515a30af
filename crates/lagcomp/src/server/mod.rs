mod config;
mod validation;

use std::time::Duration;

pub use config::{ServerConfig, SpawnPolicy, WorldBounds, default_spawn};
pub use validation::{AcceptAll, InputPolicy, MaxDisplacement};

use crate::clock::SharedClock;
use crate::entity::{Entity, EntityId};
use crate::error::Result;
use crate::net::{Input, LinkHandle, Payload, WorldStateSnapshot};
use crate::render::{SERVER_VIEWER, SharedSink};
use crate::simulation::TickSchedule;

/// What a client learns when it connects.
#[derive(Clone)]
pub struct Connection {
    pub entity_id: EntityId,
    pub server_link: LinkHandle,
    pub server_tick_rate: u32,
    pub entity_speed: f32,
}

struct ClientLink {
    link: LinkHandle,
    lag: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub ticks: u64,
    pub client_count: usize,
    pub pending_inbound: usize,
    pub inputs_applied: u64,
    pub inputs_rejected: u64,
}

pub struct Server {
    config: ServerConfig,
    clock: SharedClock,
    sink: SharedSink,
    schedule: TickSchedule,
    inbound: LinkHandle,
    clients: Vec<ClientLink>,
    entities: Vec<Entity>,
    last_processed_input: Vec<Option<u32>>,
    spawn: SpawnPolicy,
    input_policy: Box<dyn InputPolicy>,
    stats: ServerStats,
}

impl Server {
    pub fn new(config: ServerConfig, clock: SharedClock, sink: SharedSink) -> Result<Self> {
        let schedule = TickSchedule::new(config.tick_rate)?;
        Ok(Self {
            inbound: LinkHandle::new(clock.clone()),
            config,
            clock,
            sink,
            schedule,
            clients: Vec::new(),
            entities: Vec::new(),
            last_processed_input: Vec::new(),
            spawn: Box::new(default_spawn),
            input_policy: Box::new(AcceptAll),
            stats: ServerStats::default(),
        })
    }

    pub fn with_spawn_policy(mut self, spawn: impl Fn(EntityId) -> f32 + 'static) -> Self {
        self.spawn = Box::new(spawn);
        self
    }

    pub fn with_input_policy(mut self, policy: impl InputPolicy + 'static) -> Self {
        self.input_policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Registers a client by its inbound link and creates its entity.
    pub fn connect(&mut self, link: LinkHandle, lag: Duration) -> Connection {
        let entity_id = self.clients.len() as EntityId;
        let position = (self.spawn)(entity_id);

        self.clients.push(ClientLink { link, lag });
        self.entities.push(Entity::spawned_at(
            entity_id,
            position,
            self.config.entity_speed,
        ));
        self.last_processed_input.push(None);

        log::debug!(
            "client connected as entity {} at {:.2} with {:?} lag",
            entity_id,
            position,
            lag
        );

        Connection {
            entity_id,
            server_link: self.inbound.clone(),
            server_tick_rate: self.schedule.tick_rate(),
            entity_speed: self.config.entity_speed,
        }
    }

    /// Runs one update if the tick is due. Returns whether it ran.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.schedule.poll(self.clock.now()) {
            return Ok(false);
        }

        self.process_inputs()?;
        self.send_world_state()?;
        self.stats.ticks += 1;

        self.sink
            .borrow_mut()
            .render(SERVER_VIEWER, &self.entities)?;
        Ok(true)
    }

    fn process_inputs(&mut self) -> Result<()> {
        while let Some(payload) = self.inbound.receive()? {
            match payload {
                Payload::Input(input) => self.apply_input(input),
                other => {
                    log::warn!("server dropped unexpected {} message", other.kind());
                }
            }
        }
        Ok(())
    }

    fn apply_input(&mut self, input: Input) {
        let id = input.entity_id as usize;
        let Some(entity) = self.entities.get_mut(id) else {
            log::warn!("input #{} for unknown entity {}", input.sequence, input.entity_id);
            return;
        };

        if !self.input_policy.accept(&input) {
            log::debug!(
                "rejected input #{} from entity {} (displacement {})",
                input.sequence,
                input.entity_id,
                input.displacement
            );
            self.stats.inputs_rejected += 1;
            return;
        }

        entity.apply_input(&input);
        entity.position = self.config.world_bounds.clamp(entity.position);

        let ack = &mut self.last_processed_input[id];
        *ack = Some(ack.map_or(input.sequence, |seq| seq.max(input.sequence)));
        self.stats.inputs_applied += 1;

        log::trace!(
            "entity {} applied input #{} -> {:.3}",
            input.entity_id,
            input.sequence,
            entity.position
        );
    }

    fn send_world_state(&self) -> Result<()> {
        let snapshot = WorldStateSnapshot::capture(&self.entities, &self.last_processed_input);
        for client in &self.clients {
            client.link.send(client.lag, snapshot.clone())?;
        }
        Ok(())
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id as usize)
    }

    pub fn last_processed_input(&self, id: EntityId) -> Option<u32> {
        self.last_processed_input.get(id as usize).copied().flatten()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            client_count: self.clients.len(),
            pending_inbound: self.inbound.len(),
            ..self.stats
        }
    }
}
