//! An `IntegrationField` is a 2D array of `f32` values giving the accumulated
//! cost of reaching each tile from a set of seed tiles. Seeds start at zero
//! and a Dijkstra wavefront expands outwards over the four orthogonal
//! neighbours of each popped tile, adding the terrain cost of every step.
//! Tiles the wavefront cannot enter keep `f32::INFINITY`
//!
//! Diagonal movement is deliberately absent here; diagonals are reconsidered
//! when the [crate::prelude::FlowField] is derived, where a corner-safety rule
//! applies. The resulting field is deterministic for a given seed set and
//! cost grid because the per-step arithmetic is integer-exact
//!

use crate::prelude::*;

/// How the wavefront decides which neighbours it may relax
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum IntegrationMode {
	/// Expand through passable tiles. Dynamic obstructions make a tile
	/// impassable unless `ignore_blockers` is set; tiles occupied purely by
	/// factions in `enemies` stay passable either way
	Passable {
		/// Bitmask of factions hostile to the mover
		enemies: u16,
		/// Treat obstructed tiles as open, used when a target is fully
		/// blocked and a field is still required
		ignore_blockers: bool,
	},
	/// Relax only impassable tiles with a unit step cost, producing a
	/// tile-distance from the passable border. The escape flow for units
	/// trapped inside obstructions consumes this
	ImpassableOnly,
}

/// Accumulated cost of reaching each tile of a chunk from the seed tiles
#[derive(Clone)]
pub struct IntegrationField([[f32; FIELD_RES_C]; FIELD_RES_R]);

impl Default for IntegrationField {
	fn default() -> Self {
		IntegrationField([[f32::INFINITY; FIELD_RES_C]; FIELD_RES_R])
	}
}

impl Field<f32> for IntegrationField {
	/// Get a reference to the field array
	fn get(&self) -> &[[f32; FIELD_RES_C]; FIELD_RES_R] {
		&self.0
	}
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: FieldCell) -> f32 {
		self.0[field_cell.get_row()][field_cell.get_column()]
	}
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: f32, field_cell: FieldCell) {
		self.0[field_cell.get_row()][field_cell.get_column()] = value;
	}
}

impl IntegrationField {
	/// Reset every tile to the unreached sentinel
	pub fn reset(&mut self) {
		self.0 = [[f32::INFINITY; FIELD_RES_C]; FIELD_RES_R];
	}
	/// Expand a wavefront from `seeds` over the chunk. Seeds are set to zero
	/// and pushed at priority zero; each popped tile relaxes its orthogonal
	/// neighbours that `mode` admits, re-queueing a neighbour only when it is
	/// not already waiting
	pub fn build(&mut self, chunk: &NavChunk, seeds: &[FieldCell], mode: IntegrationMode) {
		let mut frontier: PriorityQueue<FieldCell> =
			PriorityQueue::with_capacity(FIELD_RES_R * FIELD_RES_C / 8);
		for seed in seeds.iter() {
			self.set_field_cell_value(0.0, *seed);
			frontier.push(0.0, *seed);
		}
		while let Some(current) = frontier.pop() {
			for neighbour in Ordinal::get_orthogonal_cell_neighbours(current) {
				let Some(step) = step_cost(chunk, neighbour, mode) else {
					continue;
				};
				let total = self.get_field_cell_value(current) + step as f32;
				if total < self.get_field_cell_value(neighbour) {
					self.set_field_cell_value(total, neighbour);
					if !frontier.contains(neighbour) {
						frontier.push(total, neighbour);
					}
				}
			}
		}
	}
}

/// Cost of stepping onto `cell` under `mode`, `None` when the wavefront must
/// not enter it
fn step_cost(chunk: &NavChunk, cell: FieldCell, mode: IntegrationMode) -> Option<u8> {
	match mode {
		IntegrationMode::Passable {
			enemies,
			ignore_blockers,
		} => {
			let cost = chunk.cost(cell);
			if cost == COST_IMPASSABLE {
				return None;
			}
			if !ignore_blockers && !chunk.tile_passable(cell, enemies) {
				return None;
			}
			Some(cost)
		}
		IntegrationMode::ImpassableOnly => {
			if chunk.tile_passable(cell, 0) {
				None
			} else {
				Some(1)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Open-field expansion with no hostile factions
	const OPEN: IntegrationMode = IntegrationMode::Passable {
		enemies: 0,
		ignore_blockers: false,
	};

	#[test]
	fn open_field_is_manhattan() {
		let chunk = NavChunk::default();
		let mut field = IntegrationField::default();
		let seed = FieldCell::new(4, 4);
		field.build(&chunk, &[seed], OPEN);
		assert_eq!(0.0, field.get_field_cell_value(seed));
		assert_eq!(8.0, field.get_field_cell_value(FieldCell::new(0, 0)));
		assert_eq!(4.0, field.get_field_cell_value(FieldCell::new(4, 0)));
		assert_eq!(
			(FIELD_RES_R - 5) as f32 + (FIELD_RES_C - 5) as f32,
			field.get_field_cell_value(FieldCell::new(FIELD_RES_R - 1, FIELD_RES_C - 1))
		);
	}
	#[test]
	fn walls_are_never_relaxed() {
		let mut chunk = NavChunk::default();
		for row in 0..FIELD_RES_R {
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(row, 10));
		}
		let mut field = IntegrationField::default();
		field.build(&chunk, &[FieldCell::new(5, 20)], OPEN);
		for row in 0..FIELD_RES_R {
			assert!(field
				.get_field_cell_value(FieldCell::new(row, 10))
				.is_infinite());
		}
	}
	#[test]
	fn enclosed_interior_stays_unreached() {
		let mut chunk = NavChunk::default();
		// a closed ring of walls around (5,5)..(7,7)
		for i in 4..=8 {
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(4, i));
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(8, i));
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(i, 4));
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(i, 8));
		}
		let mut field = IntegrationField::default();
		field.build(&chunk, &[FieldCell::new(0, 0)], OPEN);
		assert!(field
			.get_field_cell_value(FieldCell::new(6, 6))
			.is_infinite());
		assert!(field
			.get_field_cell_value(FieldCell::new(20, 20))
			.is_finite());
	}
	#[test]
	fn expensive_terrain_accumulates() {
		let mut chunk = NavChunk::default();
		chunk.set_cost(10, FieldCell::new(0, 1));
		let mut field = IntegrationField::default();
		field.build(&chunk, &[FieldCell::new(0, 0)], OPEN);
		// the wavefront still enters the marsh, it just pays for it
		assert_eq!(10.0, field.get_field_cell_value(FieldCell::new(0, 1)));
		// two plain steps beat one expensive one
		assert_eq!(2.0, field.get_field_cell_value(FieldCell::new(1, 1)));
	}
	#[test]
	fn blockers_block_unless_ignored() {
		let mut chunk = NavChunk::default();
		for row in 0..FIELD_RES_R {
			chunk.add_blockers(FieldCell::new(row, 10), 1);
		}
		let mut field = IntegrationField::default();
		field.build(&chunk, &[FieldCell::new(5, 20)], OPEN);
		assert!(field
			.get_field_cell_value(FieldCell::new(5, 0))
			.is_infinite());

		let mut ignoring = IntegrationField::default();
		ignoring.build(
			&chunk,
			&[FieldCell::new(5, 20)],
			IntegrationMode::Passable {
				enemies: 0,
				ignore_blockers: true,
			},
		);
		assert!(ignoring
			.get_field_cell_value(FieldCell::new(5, 0))
			.is_finite());
	}
	#[test]
	fn impassable_only_measures_border_distance() {
		let mut chunk = NavChunk::default();
		for row in 2..=4 {
			for column in 2..=4 {
				chunk.add_blockers(FieldCell::new(row, column), 1);
			}
		}
		// seed the passable ring around the obstruction
		let seeds = vec![
			FieldCell::new(1, 3),
			FieldCell::new(3, 1),
			FieldCell::new(3, 5),
			FieldCell::new(5, 3),
		];
		let mut field = IntegrationField::default();
		field.build(&chunk, &seeds, IntegrationMode::ImpassableOnly);
		assert_eq!(1.0, field.get_field_cell_value(FieldCell::new(2, 3)));
		assert_eq!(2.0, field.get_field_cell_value(FieldCell::new(3, 3)));
		// passable tiles beyond the seeds are never relaxed
		assert!(field
			.get_field_cell_value(FieldCell::new(10, 10))
			.is_infinite());
	}
	#[test]
	fn rebuild_is_idempotent() {
		let mut chunk = NavChunk::default();
		chunk.set_cost(COST_IMPASSABLE, FieldCell::new(3, 3));
		chunk.set_cost(9, FieldCell::new(2, 2));
		let seeds = [FieldCell::new(7, 7)];
		let mut first = IntegrationField::default();
		first.build(&chunk, &seeds, OPEN);
		let mut second = IntegrationField::default();
		second.build(&chunk, &seeds, OPEN);
		assert_eq!(first.get(), second.get());
	}
}
