use rkyv::rancor;

use crate::entity::EntityId;
use crate::render::ViewerId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tick rate must be at least 1 Hz, got {rate}")]
    InvalidTickRate { rate: u32 },
    #[error("render sink has no view for viewer {viewer}")]
    UnknownViewer { viewer: ViewerId },
    #[error("viewer {viewer} cannot display entity {entity}")]
    UnknownEntity { viewer: ViewerId, entity: EntityId },
    #[error("payload encoding failed: {0}")]
    Encode(rancor::Error),
    #[error("payload decoding failed: {0}")]
    Decode(rancor::Error),
}
