pub mod client;
pub mod clock;
pub mod entity;
pub mod error;
pub mod input;
pub mod net;
pub mod render;
pub mod server;
pub mod simulation;

pub use client::{Client, ClientConfig, PendingInputs};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use entity::{DEFAULT_ENTITY_SPEED, Entity, EntityId, TimedPosition};
pub use error::{Error, Result};
pub use input::{HeldKeys, InputSource, MoveKeys};
pub use net::{
    EntityState, Input, LagNetwork, LinkHandle, NetworkStats, Payload, WorldStateSnapshot,
};
pub use render::{RenderSink, SharedSink, ViewerId, SERVER_VIEWER};
pub use server::{
    AcceptAll, Connection, InputPolicy, MaxDisplacement, Server, ServerConfig, ServerStats,
    SpawnPolicy, WorldBounds, default_spawn,
};
pub use simulation::TickSchedule;
