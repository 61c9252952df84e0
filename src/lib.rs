//! Chunked flow-field pathfinding, line-of-sight and region tracking for
//! RTS-style games, as a plugin for the Bevy game engine
//!

pub mod nav;
pub mod plugin;
pub mod region;

pub mod prelude;
