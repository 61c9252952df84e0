//! What a flow field routes towards and how each kind of target turns into
//! the initial wavefront. A target description fans out into groups of seed
//! tiles: the group keeps hold of the portal it came from (when it came from
//! one) so the flow derivation can point those seeds across the chunk
//! boundary afterwards
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Description of the "enemies within the chunk" target variant
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemiesDesc {
	/// Chunk being routed within
	pub chunk: ChunkID,
	/// World-space position of the map origin
	pub map_pos: Vec3,
	/// Faction of the mover hunting the enemies
	pub faction: u8,
}

/// What a flow field routes towards
#[derive(Clone, Debug, PartialEq)]
pub enum FieldTarget {
	/// A single tile inside the chunk
	Tile(FieldCell),
	/// One portal of the chunk; seeds cover the portal's tile run
	Portal(Portal),
	/// Several portals of the chunk, bit `i` selecting portal `i`
	PortalMask(u64),
	/// Every tile under a hostile entity in or near the chunk
	Enemies(EnemiesDesc),
}

impl FieldTarget {
	/// Tag of the variant used in [FlowFieldId] composition
	pub fn tag(&self) -> u8 {
		match self {
			FieldTarget::Tile(_) => 0,
			FieldTarget::Portal(_) => 1,
			FieldTarget::PortalMask(_) => 2,
			FieldTarget::Enemies(_) => 3,
		}
	}
}

/// One group of seed tiles of the initial wavefront, retaining the portal
/// that produced it for the boundary fix-up
#[derive(Clone, Debug)]
pub struct Frontier {
	/// Portal the seeds belong to when the target selects portals
	pub portal: Option<Portal>,
	/// Seed tiles, pushed at integration zero
	pub seeds: Vec<FieldCell>,
}

/// Resolve a target description into seed groups. Seeds are restricted to
/// tiles that are passable for the mover unless `ignore_blockers` is set.
/// `faction` drives the enemy-occupancy passability exception and is
/// independent of the faction an [FieldTarget::Enemies] variant hunts for
pub fn resolve_frontier(
	target: &FieldTarget,
	chunk: &NavChunk,
	chunk_id: ChunkID,
	geometry: &MapGeometry,
	queries: &dyn EntityQueries,
	ignore_blockers: bool,
	faction: Option<u8>,
) -> Vec<Frontier> {
	let enemies = faction.map(|f| queries.enemy_factions(f)).unwrap_or(0);
	match target {
		FieldTarget::Tile(cell) => {
			if ignore_blockers || chunk.tile_passable(*cell, enemies) {
				vec![Frontier {
					portal: None,
					seeds: vec![*cell],
				}]
			} else {
				Vec::new()
			}
		}
		FieldTarget::Portal(portal) => vec![portal_frontier(portal, chunk, ignore_blockers, enemies)],
		FieldTarget::PortalMask(mask) => {
			let mut groups = Vec::new();
			for (index, portal) in chunk.get_portals().iter().enumerate() {
				if index >= MAX_PORTALS_PER_CHUNK {
					break;
				}
				if mask & (1u64 << index) != 0 {
					groups.push(portal_frontier(portal, chunk, ignore_blockers, enemies));
				}
			}
			groups
		}
		FieldTarget::Enemies(desc) => {
			debug_assert!(desc.chunk == chunk_id);
			vec![Frontier {
				portal: None,
				seeds: enemies_frontier(desc, chunk_id, geometry, queries),
			}]
		}
	}
}

/// Seeds of a single portal: the passable tiles of its run
fn portal_frontier(
	portal: &Portal,
	chunk: &NavChunk,
	ignore_blockers: bool,
	enemies: u16,
) -> Frontier {
	let mut seeds = Vec::new();
	for cell in portal.cells() {
		debug_assert!(
			chunk.cost(cell) != COST_IMPASSABLE,
			"Portal tile {:?} has impassable terrain",
			cell
		);
		if ignore_blockers || chunk.tile_passable(cell, enemies) {
			seeds.push(cell);
		}
	}
	Frontier {
		portal: Some(portal.clone()),
		seeds,
	}
}

/// Seeds of an enemies target: every tile of the chunk lying under a hostile,
/// combat-worthy, currently revealed entity near the chunk, in row-major
/// order. Buildings contribute the tiles under their footprint box, units
/// the tiles under their selection disc
fn enemies_frontier(
	desc: &EnemiesDesc,
	chunk_id: ChunkID,
	geometry: &MapGeometry,
	queries: &dyn EntityQueries,
) -> Vec<FieldCell> {
	let bounds = geometry.chunk_bounds(desc.map_pos, chunk_id);
	let xz_min = Vec2::new(
		bounds.x - bounds.width - SEARCH_BUFFER,
		bounds.z - SEARCH_BUFFER,
	);
	let xz_max = Vec2::new(bounds.x + SEARCH_BUFFER, bounds.z + bounds.height + SEARCH_BUFFER);
	let mut candidates = Vec::new();
	queries.ents_in_rect(xz_min, xz_max, &mut candidates);
	let player_mask = queries.player_controllable_mask();
	let mut marked = [[false; FIELD_RES_C]; FIELD_RES_R];
	for ent in candidates {
		let other = queries.faction_id(ent);
		if other == desc.faction {
			continue;
		}
		if !queries.combatable(ent) {
			continue;
		}
		if queries.diplomacy_state(desc.faction, other) != DiplomacyState::War {
			continue;
		}
		if !queries.fog_obj_visible(player_mask, ent) {
			continue;
		}
		let covered = match queries.current_obb(ent) {
			Some(obb) => geometry.tiles_under_obb(desc.map_pos, chunk_id, &obb),
			None => geometry.tiles_under_circle(
				desc.map_pos,
				chunk_id,
				queries.get_xz(ent),
				queries.selection_radius(ent),
			),
		};
		for cell in covered {
			marked[cell.get_row()][cell.get_column()] = true;
		}
	}
	let mut seeds = Vec::new();
	for (row, columns) in marked.iter().enumerate() {
		for (column, mark) in columns.iter().enumerate() {
			if *mark {
				seeds.push(FieldCell::new(row, column));
			}
		}
	}
	seeds
}
