//! Electricity cost from cumulative energy counters.

pub mod api;
pub mod config;
pub mod core;
pub mod prelude;
pub mod quantity;
