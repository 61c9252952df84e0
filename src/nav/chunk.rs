//! Per-chunk navigation data. A [NavChunk] couples the static terrain costs
//! of a chunk with the dynamic state layered on top of them: reference
//! counts of blocking entities, per-faction occupancy bitmasks, island
//! connectivity labels and the portals that link the chunk to its neighbours
//!

use bevy::prelude::*;

use crate::prelude::*;

/// A navigatable link between two orthogonally adjacent chunks. The owning
/// half covers an inclusive, axis-aligned run of tiles along one chunk edge
/// and mirrors a matching run inside the connected chunk; together the two
/// halves form a bidirectional link. Portal tiles are always traversable in
/// the static cost grid
#[derive(Clone, Debug, PartialEq, Eq, Reflect)]
pub struct Portal {
	/// Chunk that owns this half of the link
	chunk: ChunkID,
	/// Inclusive endpoints of the tile run along the owning chunk's edge
	endpoints: [FieldCell; 2],
	/// Chunk the link crosses into
	connected_chunk: ChunkID,
	/// Endpoints of the mirrored run inside the connected chunk
	connected_endpoints: [FieldCell; 2],
}

impl Portal {
	/// Create a new instance of [Portal]
	pub fn new(
		chunk: ChunkID,
		endpoints: [FieldCell; 2],
		connected_chunk: ChunkID,
		connected_endpoints: [FieldCell; 2],
	) -> Self {
		Portal {
			chunk,
			endpoints,
			connected_chunk,
			connected_endpoints,
		}
	}
	/// Get the chunk owning this half of the link
	pub fn get_chunk(&self) -> ChunkID {
		self.chunk
	}
	/// Get the inclusive endpoints of the tile run on the owning side
	pub fn get_endpoints(&self) -> [FieldCell; 2] {
		self.endpoints
	}
	/// Get the chunk the link crosses into
	pub fn get_connected_chunk(&self) -> ChunkID {
		self.connected_chunk
	}
	/// Get the inclusive endpoints of the mirrored run on the connected side
	pub fn get_connected_endpoints(&self) -> [FieldCell; 2] {
		self.connected_endpoints
	}
	/// Every tile of the run on the owning side, in row-major order
	pub fn cells(&self) -> Vec<FieldCell> {
		cells_between(self.endpoints)
	}
	/// Every tile of the mirrored run on the connected side, aligned
	/// index-for-index with [Portal::cells]
	pub fn connected_cells(&self) -> Vec<FieldCell> {
		cells_between(self.connected_endpoints)
	}
}

/// Expand inclusive run endpoints into the tiles they span
fn cells_between(endpoints: [FieldCell; 2]) -> Vec<FieldCell> {
	let r0 = endpoints[0].get_row().min(endpoints[1].get_row());
	let r1 = endpoints[0].get_row().max(endpoints[1].get_row());
	let c0 = endpoints[0].get_column().min(endpoints[1].get_column());
	let c1 = endpoints[0].get_column().max(endpoints[1].get_column());
	let mut cells = Vec::with_capacity((r1 - r0 + 1) * (c1 - c0 + 1));
	for row in r0..=r1 {
		for column in c0..=c1 {
			cells.push(FieldCell::new(row, column));
		}
	}
	cells
}

/// Navigation data of a single chunk on one layer
#[derive(Clone)]
pub struct NavChunk {
	/// Static terrain cost of every tile
	cost_base: CostField,
	/// Reference count of dynamic obstructions (buildings, reserved tiles)
	/// per tile
	blockers: [[u16; FIELD_RES_C]; FIELD_RES_R],
	/// Bit `f` set when faction `f` currently occupies the tile
	factions: [[u16; FIELD_RES_C]; FIELD_RES_R],
	/// Map-global connectivity label per tile, [ISLAND_NONE] when impassable
	islands: [[u16; FIELD_RES_C]; FIELD_RES_R],
	/// Chunk-local connectivity label per tile, [ISLAND_NONE] when impassable
	local_islands: [[u16; FIELD_RES_C]; FIELD_RES_R],
	/// Outgoing portals, at most [MAX_PORTALS_PER_CHUNK]
	portals: Vec<Portal>,
}

impl Default for NavChunk {
	fn default() -> Self {
		let mut chunk = NavChunk {
			cost_base: CostField::default(),
			blockers: [[0; FIELD_RES_C]; FIELD_RES_R],
			factions: [[0; FIELD_RES_C]; FIELD_RES_R],
			islands: [[ISLAND_NONE; FIELD_RES_C]; FIELD_RES_R],
			local_islands: [[ISLAND_NONE; FIELD_RES_C]; FIELD_RES_R],
			portals: Vec::new(),
		};
		chunk.rebuild_local_islands();
		chunk
	}
}

impl NavChunk {
	/// Get a reference to the static cost grid
	pub fn get_cost_base(&self) -> &CostField {
		&self.cost_base
	}
	/// Static terrain cost of a tile
	pub fn cost(&self, cell: FieldCell) -> u8 {
		self.cost_base.get_field_cell_value(cell)
	}
	/// Overwrite the static terrain cost of a tile. Island labels are stale
	/// until [NavChunk::rebuild_local_islands] runs again
	pub fn set_cost(&mut self, value: u8, cell: FieldCell) {
		self.cost_base.set_field_cell_value(value, cell);
	}
	/// Number of dynamic obstructions currently covering a tile
	pub fn blocker_count(&self, cell: FieldCell) -> u16 {
		self.blockers[cell.get_row()][cell.get_column()]
	}
	/// Record `count` additional obstructions covering a tile
	pub fn add_blockers(&mut self, cell: FieldCell, count: u16) {
		self.blockers[cell.get_row()][cell.get_column()] += count;
	}
	/// Release `count` obstructions from a tile. The count must not exceed
	/// the obstructions currently recorded
	pub fn remove_blockers(&mut self, cell: FieldCell, count: u16) {
		let current = self.blockers[cell.get_row()][cell.get_column()];
		assert!(
			current >= count,
			"Removing {} blockers from tile {:?} holding {}",
			count,
			cell,
			current
		);
		self.blockers[cell.get_row()][cell.get_column()] = current - count;
	}
	/// Bitmask of factions currently occupying a tile
	pub fn factions_at(&self, cell: FieldCell) -> u16 {
		self.factions[cell.get_row()][cell.get_column()]
	}
	/// Set or clear a faction's occupancy bit on a tile
	pub fn set_faction_occupancy(&mut self, faction: u8, cell: FieldCell, occupied: bool) {
		debug_assert!((faction as usize) < MAX_FACTIONS);
		let bit = 1u16 << faction;
		if occupied {
			self.factions[cell.get_row()][cell.get_column()] |= bit;
		} else {
			self.factions[cell.get_row()][cell.get_column()] &= !bit;
		}
	}
	/// Whether a tile can be traversed. A tile passes when its terrain cost
	/// is not [COST_IMPASSABLE] and no obstruction covers it. A tile whose
	/// obstructions all belong to factions in `enemies` still passes: hostile
	/// occupants are attack targets, not walls
	pub fn tile_passable(&self, cell: FieldCell, enemies: u16) -> bool {
		if self.cost(cell) == COST_IMPASSABLE {
			return false;
		}
		if self.blocker_count(cell) == 0 {
			return true;
		}
		let occupiers = self.factions_at(cell);
		enemies != 0 && occupiers != 0 && (occupiers & !enemies) == 0
	}
	/// Whether a tile is traversable on the static cost grid alone, ignoring
	/// dynamic obstructions. Portal discovery and island labelling use this
	pub fn statically_passable(&self, cell: FieldCell) -> bool {
		self.cost(cell) != COST_IMPASSABLE
	}
	/// Map-global island label of a tile
	pub fn island_at(&self, cell: FieldCell) -> u16 {
		self.islands[cell.get_row()][cell.get_column()]
	}
	/// Overwrite the map-global island label of a tile
	pub(crate) fn set_island(&mut self, value: u16, cell: FieldCell) {
		self.islands[cell.get_row()][cell.get_column()] = value;
	}
	/// Chunk-local island label of a tile
	pub fn local_island_at(&self, cell: FieldCell) -> u16 {
		self.local_islands[cell.get_row()][cell.get_column()]
	}
	/// Get the outgoing portals of the chunk
	pub fn get_portals(&self) -> &Vec<Portal> {
		&self.portals
	}
	/// Replace the outgoing portals of the chunk
	pub(crate) fn set_portals(&mut self, portals: Vec<Portal>) {
		debug_assert!(portals.len() <= MAX_PORTALS_PER_CHUNK);
		self.portals = portals;
	}
	/// Append an outgoing portal
	pub(crate) fn push_portal(&mut self, portal: Portal) {
		debug_assert!(self.portals.len() < MAX_PORTALS_PER_CHUNK);
		self.portals.push(portal);
	}
	/// Relabel the chunk-local islands. Tiles are grouped by 4-connected
	/// reachability over tiles that are free of impassable terrain and
	/// obstructions; labels count up from zero and impassable tiles keep
	/// [ISLAND_NONE]. Global labels are stale afterwards until the owning
	/// world reconciles them across portals
	pub fn rebuild_local_islands(&mut self) {
		self.local_islands = [[ISLAND_NONE; FIELD_RES_C]; FIELD_RES_R];
		let mut next_label: u16 = 0;
		for row in 0..FIELD_RES_R {
			for column in 0..FIELD_RES_C {
				let cell = FieldCell::new(row, column);
				if !self.tile_passable(cell, 0) || self.local_island_at(cell) != ISLAND_NONE {
					continue;
				}
				// flood fill the component this tile belongs to
				let mut stack = vec![cell];
				self.local_islands[row][column] = next_label;
				while let Some(current) = stack.pop() {
					for neighbour in Ordinal::get_orthogonal_cell_neighbours(current) {
						if self.local_island_at(neighbour) == ISLAND_NONE
							&& self.tile_passable(neighbour, 0)
						{
							self.local_islands[neighbour.get_row()][neighbour.get_column()] =
								next_label;
							stack.push(neighbour);
						}
					}
				}
				next_label += 1;
			}
		}
	}
}
