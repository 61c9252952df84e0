//! A [LOSField] marks which tiles of a chunk can see a target tile. A
//! wavefront expands from the target (or from the shared edge of the
//! previously computed neighbouring chunk when the target lies further along
//! the path) and marks each tile it reaches as visible
//!
//! When the wavefront meets an impassable tile that forms a silhouette
//! corner, a shadow line is cast from the corner directly away from the
//! target using an integer Bresenham walk; tiles on the line are flagged as
//! wavefront-blocked and the wavefront never expands through them, so
//! visibility cannot bend around obstacles. After propagation every
//! wavefront-blocked tile forces its whole 3x3 neighbourhood invisible,
//! giving the shadows a one-tile conservative border
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Flags a tile the target can be seen from
pub const LOS_BITS_VISIBLE: u8 = 0b0000_0001;
/// Flags a tile on a shadow line cast by an impassable corner
pub const LOS_BITS_WAVE_BLOCKED: u8 = 0b0000_0010;

/// Per-tile visibility flags of one chunk for one target
#[derive(Clone)]
pub struct LOSField {
	/// Chunk the field describes
	chunk: ChunkID,
	/// Visibility flag bits for every tile
	field: [[u8; FIELD_RES_C]; FIELD_RES_R],
}

impl Field<u8> for LOSField {
	/// Get a reference to the field array
	fn get(&self) -> &[[u8; FIELD_RES_C]; FIELD_RES_R] {
		&self.field
	}
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: FieldCell) -> u8 {
		self.field[field_cell.get_row()][field_cell.get_column()]
	}
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: u8, field_cell: FieldCell) {
		self.field[field_cell.get_row()][field_cell.get_column()] = value;
	}
}

impl LOSField {
	/// Create a new [LOSField] for a chunk with every flag cleared
	pub fn new(chunk: ChunkID) -> Self {
		LOSField {
			chunk,
			field: [[0; FIELD_RES_C]; FIELD_RES_R],
		}
	}
	/// Get the chunk the field describes
	pub fn get_chunk(&self) -> ChunkID {
		self.chunk
	}
	/// Whether the target can be seen from a tile
	pub fn visible(&self, cell: FieldCell) -> bool {
		self.get_field_cell_value(cell) & LOS_BITS_VISIBLE != 0
	}
	/// Whether a tile lies on a shadow line
	pub fn wavefront_blocked(&self, cell: FieldCell) -> bool {
		self.get_field_cell_value(cell) & LOS_BITS_WAVE_BLOCKED != 0
	}
	/// Propagate visibility over the chunk. `target` is the global
	/// descriptor of the tile being pathed to; when the target lies in this
	/// chunk the wavefront seeds there, otherwise `previous` must hold the
	/// already-computed field of the orthogonally adjacent predecessor chunk
	/// on the path and the shared edge is inherited from it. All flags are
	/// cleared before propagation
	pub fn calculate(
		&mut self,
		target: (ChunkID, FieldCell),
		chunk: &NavChunk,
		geometry: &MapGeometry,
		map_pos: Vec3,
		previous: Option<&LOSField>,
	) {
		self.field = [[0; FIELD_RES_C]; FIELD_RES_R];
		let (target_chunk, target_cell) = target;
		let target_center = geometry.tile_center(map_pos, target_chunk, target_cell);
		let mut integration = IntegrationField::default();
		let mut frontier: PriorityQueue<FieldCell> =
			PriorityQueue::with_capacity(FIELD_RES_R * FIELD_RES_C / 8);
		if self.chunk == target_chunk {
			self.field[target_cell.get_row()][target_cell.get_column()] |= LOS_BITS_VISIBLE;
			integration.set_field_cell_value(0.0, target_cell);
			frontier.push(0.0, target_cell);
		} else {
			let previous = previous.unwrap_or_else(|| {
				panic!(
					"Visibility in chunk {:?} away from the target chunk {:?} requires the predecessor's field",
					self.chunk, target_chunk
				)
			});
			self.inherit_shared_edge(
				previous,
				geometry,
				map_pos,
				target_center,
				&mut integration,
				&mut frontier,
			);
		}
		self.propagate(chunk, geometry, map_pos, target_center, integration, frontier);
		self.pad_wavefront();
	}
	/// Copy the visibility flags along the edge shared with the predecessor
	/// chunk. Inherited shadow tiles re-cast their shadow lines into this
	/// chunk and inherited visible tiles seed the wavefront at zero
	fn inherit_shared_edge(
		&mut self,
		previous: &LOSField,
		geometry: &MapGeometry,
		map_pos: Vec3,
		target_center: Vec2,
		integration: &mut IntegrationField,
		frontier: &mut PriorityQueue<FieldCell>,
	) {
		let direction = Ordinal::chunk_to_chunk_direction(previous.get_chunk(), self.chunk)
			.unwrap_or_else(|| {
				panic!(
					"Chunk {:?} shares no edge with predecessor {:?}",
					self.chunk,
					previous.get_chunk()
				)
			});
		// cell pairs are aligned index-for-index across the shared edge
		let pairs: Vec<(FieldCell, FieldCell)> = match direction {
			Ordinal::North => (0..FIELD_RES_C)
				.map(|c| (FieldCell::new(0, c), FieldCell::new(FIELD_RES_R - 1, c)))
				.collect(),
			Ordinal::South => (0..FIELD_RES_C)
				.map(|c| (FieldCell::new(FIELD_RES_R - 1, c), FieldCell::new(0, c)))
				.collect(),
			Ordinal::East => (0..FIELD_RES_R)
				.map(|r| (FieldCell::new(r, FIELD_RES_C - 1), FieldCell::new(r, 0)))
				.collect(),
			Ordinal::West => (0..FIELD_RES_R)
				.map(|r| (FieldCell::new(r, 0), FieldCell::new(r, FIELD_RES_C - 1)))
				.collect(),
			_ => unreachable!("chunk_to_chunk_direction only yields cardinals"),
		};
		for (own_cell, previous_cell) in pairs {
			let flags = previous.get_field_cell_value(previous_cell);
			self.set_field_cell_value(flags, own_cell);
			if flags & LOS_BITS_WAVE_BLOCKED != 0 {
				self.cast_shadow_line(geometry, map_pos, target_center, own_cell);
			}
			if flags & LOS_BITS_VISIBLE != 0 {
				integration.set_field_cell_value(0.0, own_cell);
				frontier.push(0.0, own_cell);
			}
		}
	}
	/// Expand the visibility wavefront over passable tiles with a unit step
	/// cost. Impassable tiles stop the wavefront; the ones forming
	/// silhouette corners cast shadow lines
	fn propagate(
		&mut self,
		chunk: &NavChunk,
		geometry: &MapGeometry,
		map_pos: Vec3,
		target_center: Vec2,
		mut integration: IntegrationField,
		mut frontier: PriorityQueue<FieldCell>,
	) {
		while let Some(current) = frontier.pop() {
			for neighbour in Ordinal::get_orthogonal_cell_neighbours(current) {
				if self.wavefront_blocked(neighbour) {
					continue;
				}
				if los_blocked(chunk, neighbour) {
					if is_los_corner(chunk, neighbour) {
						self.cast_shadow_line(geometry, map_pos, target_center, neighbour);
					}
					continue;
				}
				let total = integration.get_field_cell_value(current) + 1.0;
				if total < integration.get_field_cell_value(neighbour) {
					integration.set_field_cell_value(total, neighbour);
					self.field[neighbour.get_row()][neighbour.get_column()] |= LOS_BITS_VISIBLE;
					if !frontier.contains(neighbour) {
						frontier.push(total, neighbour);
					}
				}
			}
		}
	}
	/// Flag the tiles on the line running from `corner` directly away from
	/// the target until the line leaves the chunk. The line direction comes
	/// from the world-space tile centres; its slope components are quantised
	/// to integer deltas (1000 steps per unit) for the Bresenham walk. Rows
	/// grow with world `z`, so the `z` component's sign is flipped to step
	/// rows away from the target
	fn cast_shadow_line(
		&mut self,
		geometry: &MapGeometry,
		map_pos: Vec3,
		target_center: Vec2,
		corner: FieldCell,
	) {
		let corner_center = geometry.tile_center(map_pos, self.chunk, corner);
		let slope = (target_center - corner_center).normalize_or_zero();
		let dx = (slope.x.abs() * 1000.0) as i64;
		let dy = -((slope.y.abs() * 1000.0) as i64);
		let sx: i64 = if slope.x > 0.0 {
			1
		} else if slope.x < 0.0 {
			-1
		} else {
			0
		};
		let sy: i64 = if slope.y > 0.0 {
			-1
		} else if slope.y < 0.0 {
			1
		} else {
			0
		};
		let mut err = dx + dy;
		let mut row = corner.get_row() as i64;
		let mut column = corner.get_column() as i64;
		while row >= 0 && row < FIELD_RES_R as i64 && column >= 0 && column < FIELD_RES_C as i64 {
			self.field[row as usize][column as usize] |= LOS_BITS_WAVE_BLOCKED;
			if sx == 0 && sy == 0 {
				// corner sits on the target centre, no line to draw
				break;
			}
			let e2 = 2 * err;
			if e2 >= dy {
				err += dy;
				column += sx;
			}
			if e2 <= dx {
				err += dx;
				row += sy;
			}
		}
	}
	/// Force the 3x3 neighbourhood of every shadow tile invisible, giving
	/// shadow lines a one-tile conservative border
	fn pad_wavefront(&mut self) {
		for row in 0..FIELD_RES_R {
			for column in 0..FIELD_RES_C {
				if self.field[row][column] & LOS_BITS_WAVE_BLOCKED == 0 {
					continue;
				}
				for dr in -1i32..=1 {
					for dc in -1i32..=1 {
						let r = row as i32 + dr;
						let c = column as i32 + dc;
						if r < 0 || r >= FIELD_RES_R as i32 || c < 0 || c >= FIELD_RES_C as i32 {
							continue;
						}
						self.field[r as usize][c as usize] &= !LOS_BITS_VISIBLE;
					}
				}
			}
		}
	}
}

/// Whether a tile stops the visibility wavefront (impassable terrain or any
/// obstruction, with no faction exception)
fn los_blocked(chunk: &NavChunk, cell: FieldCell) -> bool {
	chunk.cost(cell) == COST_IMPASSABLE || chunk.blocker_count(cell) > 0
}

/// Whether a blocked tile is a silhouette corner that casts a shadow line. A
/// corner has exactly one of its vertical neighbour pair blocked, or exactly
/// one of its horizontal pair, or stands isolated with both in-bounds pairs
/// fully clear. Tiles interior to a wall are not corners
fn is_los_corner(chunk: &NavChunk, cell: FieldCell) -> bool {
	let r = cell.get_row();
	let c = cell.get_column();
	let vertical = if r > 0 && r < FIELD_RES_R - 1 {
		Some((
			los_blocked(chunk, FieldCell::new(r - 1, c)),
			los_blocked(chunk, FieldCell::new(r + 1, c)),
		))
	} else {
		None
	};
	let horizontal = if c > 0 && c < FIELD_RES_C - 1 {
		Some((
			los_blocked(chunk, FieldCell::new(r, c - 1)),
			los_blocked(chunk, FieldCell::new(r, c + 1)),
		))
	} else {
		None
	};
	if let Some((above, below)) = vertical {
		if above ^ below {
			return true;
		}
	}
	if let Some((west, east)) = horizontal {
		if west ^ east {
			return true;
		}
	}
	matches!(vertical, Some((false, false))) && matches!(horizontal, Some((false, false)))
}

#[cfg(test)]
mod tests {
	use super::*;

	/// A single-chunk map with one world unit per tile
	fn unit_geometry() -> MapGeometry {
		MapGeometry::new(1, 1, FIELD_RES_C as f32, FIELD_RES_R as f32)
	}

	#[test]
	fn open_chunk_fully_visible() {
		let chunk = NavChunk::default();
		let geometry = unit_geometry();
		let id = ChunkID::new(0, 0);
		let mut los = LOSField::new(id);
		los.calculate((id, FieldCell::new(7, 7)), &chunk, &geometry, Vec3::ZERO, None);
		for row in 0..FIELD_RES_R {
			for column in 0..FIELD_RES_C {
				let cell = FieldCell::new(row, column);
				assert!(los.visible(cell));
				assert!(!los.wavefront_blocked(cell));
			}
		}
	}
	#[test]
	fn lone_blocker_is_a_corner() {
		let mut chunk = NavChunk::default();
		chunk.add_blockers(FieldCell::new(4, 4), 1);
		assert!(is_los_corner(&chunk, FieldCell::new(4, 4)));
	}
	#[test]
	fn wall_interior_is_not_a_corner() {
		let mut chunk = NavChunk::default();
		for row in 0..=4 {
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(row, 3));
		}
		assert!(!is_los_corner(&chunk, FieldCell::new(2, 3)));
		// the free end of the wall is one
		assert!(is_los_corner(&chunk, FieldCell::new(4, 3)));
	}
	#[test]
	fn lone_blocker_casts_diagonal_shadow() {
		let mut chunk = NavChunk::default();
		chunk.add_blockers(FieldCell::new(4, 4), 1);
		let geometry = unit_geometry();
		let id = ChunkID::new(0, 0);
		let mut los = LOSField::new(id);
		los.calculate((id, FieldCell::new(7, 7)), &chunk, &geometry, Vec3::ZERO, None);
		for step in 0..=4 {
			let cell = FieldCell::new(4 - step, 4 - step);
			assert!(los.wavefront_blocked(cell), "no shadow at {:?}", cell);
		}
		// padded neighbourhood of every shadow tile is invisible
		for step in 0..=4usize {
			let row = 4 - step;
			let column = 4 - step;
			for dr in -1i32..=1 {
				for dc in -1i32..=1 {
					let r = row as i32 + dr;
					let c = column as i32 + dc;
					if r < 0 || c < 0 {
						continue;
					}
					assert!(!los.visible(FieldCell::new(r as usize, c as usize)));
				}
			}
		}
		// tiles with a clear line stay visible
		assert!(los.visible(FieldCell::new(7, 0)));
		assert!(los.visible(FieldCell::new(0, 7)));
	}
	#[test]
	fn padding_law_holds() {
		let mut chunk = NavChunk::default();
		chunk.add_blockers(FieldCell::new(10, 10), 1);
		chunk.set_cost(COST_IMPASSABLE, FieldCell::new(30, 5));
		let geometry = unit_geometry();
		let id = ChunkID::new(0, 0);
		let mut los = LOSField::new(id);
		los.calculate((id, FieldCell::new(20, 20)), &chunk, &geometry, Vec3::ZERO, None);
		for row in 0..FIELD_RES_R {
			for column in 0..FIELD_RES_C {
				if !los.wavefront_blocked(FieldCell::new(row, column)) {
					continue;
				}
				for dr in -1i32..=1 {
					for dc in -1i32..=1 {
						let r = row as i32 + dr;
						let c = column as i32 + dc;
						if r < 0 || r >= FIELD_RES_R as i32 || c < 0 || c >= FIELD_RES_C as i32 {
							continue;
						}
						assert!(!los.visible(FieldCell::new(r as usize, c as usize)));
					}
				}
			}
		}
	}
	#[test]
	#[should_panic]
	fn remote_target_without_predecessor_panics() {
		let chunk = NavChunk::default();
		let geometry = MapGeometry::new(1, 2, FIELD_RES_C as f32, FIELD_RES_R as f32);
		let mut los = LOSField::new(ChunkID::new(0, 1));
		los.calculate(
			(ChunkID::new(0, 0), FieldCell::new(7, 7)),
			&chunk,
			&geometry,
			Vec3::ZERO,
			None,
		);
	}
}
