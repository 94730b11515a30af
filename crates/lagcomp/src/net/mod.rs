mod lag_network;
mod protocol;

pub use lag_network::{LagNetwork, LinkHandle, NetworkStats};
pub use protocol::{EntityState, Input, Payload, WorldStateSnapshot};
