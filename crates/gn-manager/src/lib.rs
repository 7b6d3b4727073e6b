//! GN Manager casting core.
//!
//! Library behind the GN event logistics service: who may be cast
//! (registration status), what can be cast (the role registry), every draft
//! casting hypothesis (proposal columns and their scored assignments), and
//! the matcher that turns those scores into the definitive casting.

pub mod casting;
pub mod config;
pub mod error;
pub mod telemetry;
