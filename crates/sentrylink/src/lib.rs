//! Top-level facade crate for sentrylink.
//!
//! Re-exports core types and the gateway library so users can depend on a
//! single crate.

pub mod core {
    pub use sentrylink_core::*;
}

pub mod gateway {
    pub use sentrylink_gateway::*;
}
