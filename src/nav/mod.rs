//! Chunked flow-field navigation. The map is partitioned into a grid of
//! chunks, each holding a fixed `FIELD_RES_R x FIELD_RES_C` tile grid, and
//! every chunk exists once per navigation layer (ground, water, air). Three
//! field layers cooperate to move crowds of units:
//!
//! * [crate::prelude::CostField] - static terrain cost per tile, always in
//!   memory. `1` is open ground, up to `254` increasingly awkward terrain,
//!   `255` impassable. Dynamic state (obstruction reference counts and
//!   per-faction occupancy masks) lives next to it in the
//!   [crate::prelude::NavChunk]
//! * [crate::prelude::IntegrationField] - accumulated cost from a set of
//!   seed tiles, built on demand by a Dijkstra wavefront over the four
//!   orthogonal neighbours of each tile. Ephemeral: it exists to feed the
//!   flow derivation and is dropped afterwards
//! * [crate::prelude::FlowField] - one movement direction per tile pointing
//!   at its cheapest neighbour, the artefact actors actually follow.
//!   Diagonal directions are only taken when both flanking orthogonal tiles
//!   were reachable, so nobody clips wall corners
//!
//! ## Useful definitions
//!
//! * Chunk - a `FIELD_RES_R x FIELD_RES_C` slice of the map and the unit of
//!   field computation, addressed by [crate::prelude::ChunkID]
//! * Layer - an independent chunk grid for one movement medium; a ground
//!   chunk and an air chunk at the same coordinate share nothing
//! * Portal - a run of tiles along a shared chunk edge that is traversable
//!   on both sides, linking the two chunks. A path across the map is a
//!   sequence of portals, and each chunk's flow field routes towards the
//!   next portal of the sequence
//! * Target - what a field routes towards: a tile, a portal, a set of
//!   portals or "the enemies near this chunk"
//! * Seed / initial frontier - the tiles an integration wavefront starts
//!   from at cost zero, produced from the target description
//! * Island - a connected component of passable tiles; local islands are
//!   per-chunk, global islands join local ones across portals. Used to spot
//!   unreachable targets before wasting a full field build on them
//! * LOS field - per-tile visibility flags from a target tile, with shadow
//!   lines cast behind obstacle silhouettes; lets actors near the goal walk
//!   straight at it instead of following field directions
//!
//! Field updates for distinct `(chunk, layer, target)` triples are
//! independent: they read shared chunk data and write caller-owned buffers,
//! so a job system may run any number of them in parallel between chunk
//! mutations
//!

pub mod chunk;
pub mod entities;
pub mod fields;
pub mod geometry;
pub mod queue;
pub mod target;
pub mod utilities;
pub mod world;
