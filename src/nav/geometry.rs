//! World-space layout of the chunk grid. Maps the map's `x-z` plane onto
//! chunk and tile coordinates and rasterises entity footprints onto tiles
//!
//! The map origin sits at the corner of chunk `(0, 0)` and world `x`
//! *decreases* as column indices grow while world `z` grows with row indices.
//! Every bound computed here keeps that convention: the `x` of a [Bounds] is
//! its maximal-`x` edge and the area spans `[x - width, x]` by
//! `[z, z + height]`
//!

use bevy::prelude::*;

use crate::prelude::*;

/// An axis-aligned area of the world `x-z` plane. `x` is the maximal-`x`
/// edge, `z` the minimal-`z` edge
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Maximal-`x` edge of the area
	pub x: f32,
	/// Minimal-`z` edge of the area
	pub z: f32,
	/// Extent towards negative `x`
	pub width: f32,
	/// Extent towards positive `z`
	pub height: f32,
}

impl Bounds {
	/// Whether a point of the `x-z` plane lies within the area
	pub fn contains(&self, point: Vec2) -> bool {
		point.x <= self.x
			&& point.x >= self.x - self.width
			&& point.y >= self.z
			&& point.y <= self.z + self.height
	}
	/// Centre of the area
	pub fn center(&self) -> Vec2 {
		Vec2::new(self.x - self.width / 2.0, self.z + self.height / 2.0)
	}
}

/// An oriented bounding box on the world `x-z` plane, the footprint shape of
/// building entities
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
	/// World-space centre
	pub center: Vec2,
	/// Perpendicular unit-length local axes
	pub axes: [Vec2; 2],
	/// Half-extent along each local axis
	pub half_lengths: [f32; 2],
}

impl Obb {
	/// An axis-aligned box of the given half-extents
	pub fn axis_aligned(center: Vec2, half_x: f32, half_z: f32) -> Self {
		Obb {
			center,
			axes: [Vec2::X, Vec2::Y],
			half_lengths: [half_x, half_z],
		}
	}
	/// The four corner points of the box
	pub fn corners(&self) -> [Vec2; 4] {
		let a = self.axes[0] * self.half_lengths[0];
		let b = self.axes[1] * self.half_lengths[1];
		[
			self.center + a + b,
			self.center + a - b,
			self.center - a - b,
			self.center - a + b,
		]
	}
	/// Whether the box overlaps an axis-aligned area, by the separating axis
	/// test over the two world axes and the two box axes
	pub fn intersects_bounds(&self, bounds: &Bounds) -> bool {
		let rect = [
			Vec2::new(bounds.x, bounds.z),
			Vec2::new(bounds.x - bounds.width, bounds.z),
			Vec2::new(bounds.x - bounds.width, bounds.z + bounds.height),
			Vec2::new(bounds.x, bounds.z + bounds.height),
		];
		let corners = self.corners();
		let axes = [Vec2::X, Vec2::Y, self.axes[0], self.axes[1]];
		for axis in axes.iter() {
			let (min_a, max_a) = project(&corners, *axis);
			let (min_b, max_b) = project(&rect, *axis);
			if max_a < min_b || max_b < min_a {
				return false;
			}
		}
		true
	}
}

/// Project points onto an axis and return the covered interval
fn project(points: &[Vec2; 4], axis: Vec2) -> (f32, f32) {
	let mut min = f32::INFINITY;
	let mut max = f32::NEG_INFINITY;
	for point in points.iter() {
		let d = point.dot(axis);
		min = min.min(d);
		max = max.max(d);
	}
	(min, max)
}

/// Dimensions of the chunk grid and the world-space size of one chunk
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapGeometry {
	/// Chunks along the map's `z` (row) axis
	chunk_rows: usize,
	/// Chunks along the map's `x` (column) axis
	chunk_cols: usize,
	/// World-unit width of one chunk along `x`
	chunk_x_dim: f32,
	/// World-unit depth of one chunk along `z`
	chunk_z_dim: f32,
}

impl MapGeometry {
	/// Create a new instance of [MapGeometry]. Panics when either chunk
	/// count is zero or either world dimension is not positive
	pub fn new(chunk_rows: usize, chunk_cols: usize, chunk_x_dim: f32, chunk_z_dim: f32) -> Self {
		if chunk_rows == 0 || chunk_cols == 0 {
			panic!(
				"Map of {}x{} chunks cannot exist",
				chunk_rows, chunk_cols
			);
		}
		if chunk_x_dim <= 0.0 || chunk_z_dim <= 0.0 {
			panic!(
				"Chunk world dimensions ({}, {}) must be positive",
				chunk_x_dim, chunk_z_dim
			);
		}
		MapGeometry {
			chunk_rows,
			chunk_cols,
			chunk_x_dim,
			chunk_z_dim,
		}
	}
	/// Chunks along the map's `z` (row) axis
	pub fn get_chunk_rows(&self) -> usize {
		self.chunk_rows
	}
	/// Chunks along the map's `x` (column) axis
	pub fn get_chunk_cols(&self) -> usize {
		self.chunk_cols
	}
	/// World-unit width of one tile along `x`
	pub fn tile_x_dim(&self) -> f32 {
		self.chunk_x_dim / FIELD_RES_C as f32
	}
	/// World-unit depth of one tile along `z`
	pub fn tile_z_dim(&self) -> f32 {
		self.chunk_z_dim / FIELD_RES_R as f32
	}
	/// Whether a chunk coordinate addresses a chunk of this map
	pub fn chunk_in_bounds(&self, chunk: ChunkID) -> bool {
		chunk.get_row() < self.chunk_rows && chunk.get_column() < self.chunk_cols
	}
	/// The neighbouring chunk in a cardinal direction, `None` at the map edge
	pub fn chunk_neighbour(&self, chunk: ChunkID, ordinal: Ordinal) -> Option<ChunkID> {
		let (dr, dc) = ordinal.grid_offset();
		let row = chunk.get_row() as i32 + dr;
		let column = chunk.get_column() as i32 + dc;
		if row < 0 || row >= self.chunk_rows as i32 || column < 0 || column >= self.chunk_cols as i32
		{
			return None;
		}
		Some(ChunkID::new(row as usize, column as usize))
	}
	/// World-space area of a chunk. World `x` decreases with the column
	/// index so the chunk's maximal-`x` edge is offset by
	/// `-(column * chunk_x_dim)` from the map origin
	pub fn chunk_bounds(&self, map_pos: Vec3, chunk: ChunkID) -> Bounds {
		Bounds {
			x: map_pos.x - chunk.get_column() as f32 * self.chunk_x_dim,
			z: map_pos.z + chunk.get_row() as f32 * self.chunk_z_dim,
			width: self.chunk_x_dim,
			height: self.chunk_z_dim,
		}
	}
	/// World-space area of a single tile
	pub fn tile_bounds(&self, map_pos: Vec3, chunk: ChunkID, cell: FieldCell) -> Bounds {
		let chunk_bounds = self.chunk_bounds(map_pos, chunk);
		Bounds {
			x: chunk_bounds.x - cell.get_column() as f32 * self.tile_x_dim(),
			z: chunk_bounds.z + cell.get_row() as f32 * self.tile_z_dim(),
			width: self.tile_x_dim(),
			height: self.tile_z_dim(),
		}
	}
	/// World-space centre of a single tile
	pub fn tile_center(&self, map_pos: Vec3, chunk: ChunkID, cell: FieldCell) -> Vec2 {
		self.tile_bounds(map_pos, chunk, cell).center()
	}
	/// The chunk and tile under a point of the `x-z` plane, `None` when the
	/// point lies off the map
	pub fn tile_at_point(&self, map_pos: Vec3, point: Vec2) -> Option<(ChunkID, FieldCell)> {
		let global_column = ((map_pos.x - point.x) / self.tile_x_dim()).floor();
		let global_row = ((point.y - map_pos.z) / self.tile_z_dim()).floor();
		if global_column < 0.0
			|| global_row < 0.0
			|| global_column >= (self.chunk_cols * FIELD_RES_C) as f32
			|| global_row >= (self.chunk_rows * FIELD_RES_R) as f32
		{
			return None;
		}
		let global_column = global_column as usize;
		let global_row = global_row as usize;
		let chunk = ChunkID::new(global_row / FIELD_RES_R, global_column / FIELD_RES_C);
		let cell = FieldCell::new(global_row % FIELD_RES_R, global_column % FIELD_RES_C);
		Some((chunk, cell))
	}
	/// Every tile of `chunk` whose area touches the disc, in row-major order
	pub fn tiles_under_circle(
		&self,
		map_pos: Vec3,
		chunk: ChunkID,
		center: Vec2,
		radius: f32,
	) -> Vec<FieldCell> {
		let mut tiles = Vec::new();
		let radius_sq = radius * radius;
		for (row, column) in self.candidate_range(
			map_pos,
			chunk,
			Vec2::new(center.x - radius, center.y - radius),
			Vec2::new(center.x + radius, center.y + radius),
		) {
			let bounds = self.tile_bounds(map_pos, chunk, FieldCell::new(row, column));
			// closest point of the tile rectangle to the disc centre
			let closest = Vec2::new(
				center.x.clamp(bounds.x - bounds.width, bounds.x),
				center.y.clamp(bounds.z, bounds.z + bounds.height),
			);
			if closest.distance_squared(center) <= radius_sq {
				tiles.push(FieldCell::new(row, column));
			}
		}
		tiles
	}
	/// Every tile of `chunk` whose area touches the oriented box, in
	/// row-major order
	pub fn tiles_under_obb(&self, map_pos: Vec3, chunk: ChunkID, obb: &Obb) -> Vec<FieldCell> {
		let corners = obb.corners();
		let mut min = corners[0];
		let mut max = corners[0];
		for corner in corners.iter().skip(1) {
			min = min.min(*corner);
			max = max.max(*corner);
		}
		let mut tiles = Vec::new();
		for (row, column) in self.candidate_range(map_pos, chunk, min, max) {
			let bounds = self.tile_bounds(map_pos, chunk, FieldCell::new(row, column));
			if obb.intersects_bounds(&bounds) {
				tiles.push(FieldCell::new(row, column));
			}
		}
		tiles
	}
	/// Row-major `(row, column)` tiles of `chunk` whose areas can touch the
	/// axis-aligned area spanning `min..max`
	fn candidate_range(
		&self,
		map_pos: Vec3,
		chunk: ChunkID,
		min: Vec2,
		max: Vec2,
	) -> Vec<(usize, usize)> {
		let chunk_bounds = self.chunk_bounds(map_pos, chunk);
		// columns grow towards negative x, so the maximal x maps to the
		// smallest column
		let first_column = ((chunk_bounds.x - max.x) / self.tile_x_dim()).floor() as i64;
		let last_column = ((chunk_bounds.x - min.x) / self.tile_x_dim()).floor() as i64;
		let first_row = ((min.y - chunk_bounds.z) / self.tile_z_dim()).floor() as i64;
		let last_row = ((max.y - chunk_bounds.z) / self.tile_z_dim()).floor() as i64;
		let first_column = first_column.clamp(0, FIELD_RES_C as i64 - 1) as usize;
		let last_column = last_column.clamp(0, FIELD_RES_C as i64 - 1) as usize;
		let first_row = first_row.clamp(0, FIELD_RES_R as i64 - 1) as usize;
		let last_row = last_row.clamp(0, FIELD_RES_R as i64 - 1) as usize;
		let mut range = Vec::new();
		for row in first_row..=last_row {
			for column in first_column..=last_column {
				range.push((row, column));
			}
		}
		range
	}
}
