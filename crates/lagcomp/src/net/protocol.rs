use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::entity::{Entity, EntityId};
use crate::error::{Error, Result};

/// A pre-integrated movement sample. `displacement` is elapsed seconds signed
/// by direction; the receiver multiplies it by the entity's speed.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Input {
    pub sequence: u32,
    pub entity_id: EntityId,
    pub displacement: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct EntityState {
    pub entity_id: EntityId,
    pub position: f32,
    /// Highest input sequence the server has applied; `None` before the first.
    /// Not seeded with 0, which would acknowledge input #0 before it arrives.
    pub last_processed_input: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WorldStateSnapshot {
    pub entities: Vec<EntityState>,
}

impl WorldStateSnapshot {
    pub fn capture<'a>(
        entities: impl IntoIterator<Item = &'a Entity>,
        acks: &[Option<u32>],
    ) -> Self {
        let entities = entities
            .into_iter()
            .map(|entity| EntityState {
                entity_id: entity.id,
                position: entity.position,
                last_processed_input: acks.get(entity.id as usize).copied().flatten(),
            })
            .collect();
        Self { entities }
    }

    pub fn get(&self, entity_id: EntityId) -> Option<&EntityState> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum Payload {
    Input(Input),
    WorldState(WorldStateSnapshot),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Input(_) => "input",
            Payload::WorldState(_) => "world state",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(Error::Encode)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut aligned = AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);
        rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(Error::Decode)
    }
}

impl From<Input> for Payload {
    fn from(input: Input) -> Self {
        Payload::Input(input)
    }
}

impl From<WorldStateSnapshot> for Payload {
    fn from(snapshot: WorldStateSnapshot) -> Self {
        Payload::WorldState(snapshot)
    }
}
