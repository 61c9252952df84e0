//! Shared coordinate types, the direction type and the sizing constants used
//! by every field layer
//!

use bevy::prelude::*;

/// Number of tile rows in every chunk field array
pub const FIELD_RES_R: usize = 64;
/// Number of tile columns in every chunk field array
pub const FIELD_RES_C: usize = 64;
/// Terrain cost marking a tile that can never be pathed through
pub const COST_IMPASSABLE: u8 = 255;
/// Upper bound on concurrently active factions, one bit each in the per-tile
/// occupancy masks
pub const MAX_FACTIONS: usize = 16;
/// Island label of tiles that belong to no island (impassable terrain)
pub const ISLAND_NONE: u16 = u16::MAX;
/// Upper bound on outgoing portals per chunk, one bit each in a portal mask
pub const MAX_PORTALS_PER_CHUNK: usize = 64;
/// World-unit inflation applied around a chunk when searching for enemies
pub const SEARCH_BUFFER: f32 = 64.0;

/// Coordinate of a tile within a chunk's `FIELD_RES_R x FIELD_RES_C` grid
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct FieldCell {
	/// Row index, `0..FIELD_RES_R`
	row: u8,
	/// Column index, `0..FIELD_RES_C`
	column: u8,
}

impl FieldCell {
	/// Create a new instance of [FieldCell]
	pub fn new(row: usize, column: usize) -> Self {
		debug_assert!(
			row < FIELD_RES_R && column < FIELD_RES_C,
			"Tile ({}, {}) is outside the {}x{} field",
			row,
			column,
			FIELD_RES_R,
			FIELD_RES_C
		);
		FieldCell {
			row: row as u8,
			column: column as u8,
		}
	}
	/// Get the row index of the tile
	pub fn get_row(&self) -> usize {
		self.row as usize
	}
	/// Get the column index of the tile
	pub fn get_column(&self) -> usize {
		self.column as usize
	}
	/// Sum of the row and column distances to `other`
	pub fn manhattan_distance(&self, other: FieldCell) -> usize {
		self.get_row().abs_diff(other.get_row()) + self.get_column().abs_diff(other.get_column())
	}
}

/// Coordinate of a chunk on the map's chunk grid
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct ChunkID {
	/// Chunk row index
	row: u8,
	/// Chunk column index
	column: u8,
}

impl ChunkID {
	/// Create a new instance of [ChunkID]
	pub fn new(row: usize, column: usize) -> Self {
		debug_assert!(
			row < u8::MAX as usize && column < u8::MAX as usize,
			"Chunk ({}, {}) cannot be addressed with 8-bit coordinates",
			row,
			column
		);
		ChunkID {
			row: row as u8,
			column: column as u8,
		}
	}
	/// Get the chunk row index
	pub fn get_row(&self) -> usize {
		self.row as usize
	}
	/// Get the chunk column index
	pub fn get_column(&self) -> usize {
		self.column as usize
	}
}

/// The navigation layer a chunk grid lives on. Every chunk coordinate exists
/// once per layer and layers never exchange flow
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub enum NavLayer {
	/// Ground-bound movement
	#[default]
	Ground = 0,
	/// Surface-water movement
	Water = 1,
	/// Airborne movement
	Air = 2,
}

impl NavLayer {
	/// The 4-bit encoding of the layer used in [crate::prelude::FlowFieldId]
	pub fn bits(self) -> u8 {
		self as u8
	}
	/// Recover a layer from its 4-bit encoding
	pub fn from_bits(bits: u8) -> Option<NavLayer> {
		match bits {
			0 => Some(NavLayer::Ground),
			1 => Some(NavLayer::Water),
			2 => Some(NavLayer::Air),
			_ => None,
		}
	}
}

/// Convenience way of accessing the 4 sides of a chunk, the 4 sides of a tile
/// and the 8 directions of movement within a [crate::prelude::FlowField]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash, Reflect)]
pub enum Ordinal {
	North,
	East,
	South,
	West,
	NorthEast,
	SouthEast,
	SouthWest,
	NorthWest,
	/// Special case, used to indicate a tile without a direction (the target
	/// itself, or a tile no update has reached)
	#[default]
	Zero,
}

impl Ordinal {
	/// Based on a tile's `(row, column)` position find its orthogonally
	/// adjacent neighbours based on the field bounds (up to 4)
	pub fn get_orthogonal_cell_neighbours(cell: FieldCell) -> Vec<FieldCell> {
		let mut neighbours = Vec::new();
		if cell.get_row() > 0 {
			neighbours.push(FieldCell::new(cell.get_row() - 1, cell.get_column())); // northern cell
		}
		if cell.get_column() < FIELD_RES_C - 1 {
			neighbours.push(FieldCell::new(cell.get_row(), cell.get_column() + 1)); // eastern cell
		}
		if cell.get_row() < FIELD_RES_R - 1 {
			neighbours.push(FieldCell::new(cell.get_row() + 1, cell.get_column())); // southern cell
		}
		if cell.get_column() > 0 {
			neighbours.push(FieldCell::new(cell.get_row(), cell.get_column() - 1)); // western cell
		}
		neighbours
	}
	/// Find the neighbour of a tile in the given direction, `None` when that
	/// would leave the field
	pub fn get_cell_neighbour(cell: FieldCell, ordinal: Ordinal) -> Option<FieldCell> {
		let (dr, dc) = ordinal.grid_offset();
		let row = cell.get_row() as i32 + dr;
		let column = cell.get_column() as i32 + dc;
		if row < 0 || row >= FIELD_RES_R as i32 || column < 0 || column >= FIELD_RES_C as i32 {
			return None;
		}
		Some(FieldCell::new(row as usize, column as usize))
	}
	/// For two tiles next to each other find the [Ordinal] pointing from the
	/// `source` to the `target`
	pub fn cell_to_cell_direction(target: FieldCell, source: FieldCell) -> Self {
		let dr = target.get_row() as i32 - source.get_row() as i32;
		let dc = target.get_column() as i32 - source.get_column() as i32;
		match (dr, dc) {
			(-1, 0) => Ordinal::North,
			(-1, 1) => Ordinal::NorthEast,
			(0, 1) => Ordinal::East,
			(1, 1) => Ordinal::SouthEast,
			(1, 0) => Ordinal::South,
			(1, -1) => Ordinal::SouthWest,
			(0, -1) => Ordinal::West,
			(-1, -1) => Ordinal::NorthWest,
			_ => panic!(
				"Tile {:?} is not orthogonally or diagonally adjacent to {:?}",
				target, source
			),
		}
	}
	/// For two chunks next to each other find the [Ordinal] pointing from the
	/// `source` to the `target`. Only orthogonally adjacent chunks share an
	/// edge so diagonal pairs produce `None`
	pub fn chunk_to_chunk_direction(target: ChunkID, source: ChunkID) -> Option<Self> {
		let dr = target.get_row() as i32 - source.get_row() as i32;
		let dc = target.get_column() as i32 - source.get_column() as i32;
		match (dr, dc) {
			(-1, 0) => Some(Ordinal::North),
			(0, 1) => Some(Ordinal::East),
			(1, 0) => Some(Ordinal::South),
			(0, -1) => Some(Ordinal::West),
			_ => {
				error!(
					"Chunk {:?} is not orthogonally adjacent to {:?}",
					target, source
				);
				None
			}
		}
	}
	/// Returns the opposite [Ordinal] of the current
	pub fn inverse(&self) -> Ordinal {
		match self {
			Ordinal::North => Ordinal::South,
			Ordinal::East => Ordinal::West,
			Ordinal::South => Ordinal::North,
			Ordinal::West => Ordinal::East,
			Ordinal::NorthEast => Ordinal::SouthWest,
			Ordinal::SouthEast => Ordinal::NorthWest,
			Ordinal::SouthWest => Ordinal::NorthEast,
			Ordinal::NorthWest => Ordinal::SouthEast,
			Ordinal::Zero => Ordinal::Zero,
		}
	}
	/// The `(row, column)` grid delta of one step in this direction
	pub fn grid_offset(&self) -> (i32, i32) {
		match self {
			Ordinal::North => (-1, 0),
			Ordinal::East => (0, 1),
			Ordinal::South => (1, 0),
			Ordinal::West => (0, -1),
			Ordinal::NorthEast => (-1, 1),
			Ordinal::SouthEast => (1, 1),
			Ordinal::SouthWest => (1, -1),
			Ordinal::NorthWest => (-1, -1),
			Ordinal::Zero => (0, 0),
		}
	}
	/// Index encoding of the direction, `0..=8` with `Zero` as `0`
	pub fn dir_index(&self) -> u8 {
		match self {
			Ordinal::Zero => 0,
			Ordinal::North => 1,
			Ordinal::NorthEast => 2,
			Ordinal::East => 3,
			Ordinal::SouthEast => 4,
			Ordinal::South => 5,
			Ordinal::SouthWest => 6,
			Ordinal::West => 7,
			Ordinal::NorthWest => 8,
		}
	}
	/// Recover a direction from its index encoding
	pub fn from_dir_index(index: u8) -> Ordinal {
		match index {
			0 => Ordinal::Zero,
			1 => Ordinal::North,
			2 => Ordinal::NorthEast,
			3 => Ordinal::East,
			4 => Ordinal::SouthEast,
			5 => Ordinal::South,
			6 => Ordinal::SouthWest,
			7 => Ordinal::West,
			8 => Ordinal::NorthWest,
			_ => panic!("Direction index {} is not a recognised direction", index),
		}
	}
	/// Unit vector of movement across the world `x-z` plane. World `x`
	/// decreases as the column index grows and world `z` grows with the row
	/// index, so east carries a negative `x` component. Diagonals have unit
	/// magnitude with `±1/√2` components
	pub fn to_xz_vector(&self) -> Vec2 {
		/// Component magnitude of a unit diagonal
		const DIAG: f32 = std::f32::consts::FRAC_1_SQRT_2;
		match self {
			Ordinal::North => Vec2::new(0.0, -1.0),
			Ordinal::East => Vec2::new(-1.0, 0.0),
			Ordinal::South => Vec2::new(0.0, 1.0),
			Ordinal::West => Vec2::new(1.0, 0.0),
			Ordinal::NorthEast => Vec2::new(-DIAG, -DIAG),
			Ordinal::SouthEast => Vec2::new(-DIAG, DIAG),
			Ordinal::SouthWest => Vec2::new(DIAG, DIAG),
			Ordinal::NorthWest => Vec2::new(DIAG, -DIAG),
			Ordinal::Zero => Vec2::ZERO,
		}
	}
}
