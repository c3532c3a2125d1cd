//! Tunnel protocol types shared between the agent configuration core and the
//! controller-facing transport.

mod identity;

pub use identity::AgentInfo;
