//! Shared tracing setup for the workspace binaries.

mod tracing;

pub use self::tracing::{LogFormat, init, init_with_level};

/// Alias kept for binaries that call it by its long name.
pub use self::tracing::init as init_tracing;
