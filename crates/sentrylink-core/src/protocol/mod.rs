//! Wire protocol: inbound frames decoded once by the transport layer, and
//! outbound frame constructors used by the router and its components.

pub mod inbound;
pub mod outbound;

pub use inbound::{GameInfoWire, Inbound};
