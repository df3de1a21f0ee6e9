//! Cross-platform chat abstractions (one adapter today; more later).

pub mod port;
pub mod throttled;
pub mod types;
