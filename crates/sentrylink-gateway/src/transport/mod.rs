//! WS transport: upgrade handler, per-socket read/write loop, wire codec.

pub mod codec;
pub mod ws;
