//! Ports: the session the engine talks through, the sub-protocols it
//! delegates to, and the strategies concrete flows inject.

pub mod outbound;
pub mod session;
pub mod strategy;
