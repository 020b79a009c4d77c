//! System orchestration, startup, and shutdown logic.

pub mod desk_system;
pub mod tracing;

pub use self::desk_system::*;
pub use self::tracing::*;
