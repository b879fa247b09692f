//! Simulation core for a top-down wave-survival shooter.
//!
//! Everything under this crate is pure game logic driven by an explicit
//! [`entities::SimulationState`]; terminal I/O lives in the binary.

pub mod combat;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod input;
pub mod movement;
pub mod persistence;
pub mod pickups;
pub mod progression;
pub mod registry;
pub mod services;
pub mod snapshot;
pub mod waves;
