//! A [FlowField] is a 2D array of movement directions derived from an
//! [IntegrationField]. Each tile holds the [Ordinal] pointing at its
//! cheapest reachable neighbour, so a crowd of actors can follow the field
//! towards the target without any per-actor path search
//!
//! Diagonal directions obey a corner rule: a diagonal neighbour is only a
//! candidate when both orthogonal neighbours flanking the shared corner were
//! reached by the integration pass, which stops actors cutting through the
//! corner of a wall. Orthogonal directions win ties over diagonals, scanned
//! `N, S, E, W` then `NW, NE, SW, SE`
//!

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::prelude::*;

/// Per-tile movement directions of one chunk routed at one target
#[derive(Clone)]
pub struct FlowField {
	/// Chunk the field routes within
	chunk: ChunkID,
	/// Target the most recent update routed towards, `None` before the first
	/// update and for escape flows that have no field target
	target: Option<FieldTarget>,
	/// Direction of travel for every tile
	field: [[Ordinal; FIELD_RES_C]; FIELD_RES_R],
}

impl Field<Ordinal> for FlowField {
	/// Get a reference to the field array
	fn get(&self) -> &[[Ordinal; FIELD_RES_C]; FIELD_RES_R] {
		&self.field
	}
	/// Retrieve a field cell value
	fn get_field_cell_value(&self, field_cell: FieldCell) -> Ordinal {
		self.field[field_cell.get_row()][field_cell.get_column()]
	}
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: Ordinal, field_cell: FieldCell) {
		self.field[field_cell.get_row()][field_cell.get_column()] = value;
	}
}

impl FlowField {
	/// Create a new [FlowField] for a chunk with every tile set to
	/// [Ordinal::Zero]. Buffers must be recreated (or freshly updated) when
	/// switching between unrelated targets; an update only writes tiles its
	/// wavefront reached
	pub fn new(chunk: ChunkID) -> Self {
		FlowField {
			chunk,
			target: None,
			field: [[Ordinal::Zero; FIELD_RES_C]; FIELD_RES_R],
		}
	}
	/// Get the chunk the field routes within
	pub fn get_chunk(&self) -> ChunkID {
		self.chunk
	}
	/// Get the target of the most recent update
	pub fn get_target(&self) -> Option<&FieldTarget> {
		self.target.as_ref()
	}
	/// Record the target an update routed towards
	pub(crate) fn set_target(&mut self, target: FieldTarget) {
		self.target = Some(target);
	}
	/// Derive the direction of every tile the integration wavefront reached.
	/// Seed tiles (integration zero) are written as [Ordinal::Zero]; tiles
	/// the wavefront never reached are left untouched so that a multi-pass
	/// update can populate disjoint islands of one buffer
	pub fn calculate(&mut self, integration: &IntegrationField) {
		for row in 0..FIELD_RES_R {
			for column in 0..FIELD_RES_C {
				let cell = FieldCell::new(row, column);
				let cost = integration.get_field_cell_value(cell);
				if cost.is_infinite() {
					continue;
				}
				if cost == 0.0 {
					self.set_field_cell_value(Ordinal::Zero, cell);
					continue;
				}
				self.set_field_cell_value(flow_dir(integration, cell), cell);
			}
		}
	}
	/// Point every seed tile of a portal across the chunk boundary, in the
	/// cardinal direction of the connected chunk. Without this a unit
	/// arriving on a portal tile would stop on the boundary instead of
	/// carrying on into the next chunk
	pub fn apply_portal_fixup(&mut self, portal: &Portal, seeds: &[FieldCell]) {
		let Some(direction) =
			Ordinal::chunk_to_chunk_direction(portal.get_connected_chunk(), self.chunk)
		else {
			return;
		};
		for seed in seeds.iter() {
			self.set_field_cell_value(direction, *seed);
		}
	}
	/// Build an escape flow for a start tile buried inside an obstruction.
	/// A breadth-first walk over the blocked tiles surrounding `start`
	/// collects the first passable fringe it meets; that fringe seeds an
	/// [IntegrationMode::ImpassableOnly] wavefront and the blocked tiles are
	/// given directions towards it. A fully impassable chunk leaves the
	/// field unchanged
	pub fn calculate_to_nearest_pathable(
		&mut self,
		chunk: &NavChunk,
		start: FieldCell,
		enemies: u16,
	) {
		if chunk.tile_passable(start, enemies) {
			return;
		}
		let mut visited = [[false; FIELD_RES_C]; FIELD_RES_R];
		let mut queue = VecDeque::new();
		let mut seeds = Vec::new();
		visited[start.get_row()][start.get_column()] = true;
		queue.push_back(start);
		while let Some(current) = queue.pop_front() {
			for neighbour in Ordinal::get_orthogonal_cell_neighbours(current) {
				if visited[neighbour.get_row()][neighbour.get_column()] {
					continue;
				}
				visited[neighbour.get_row()][neighbour.get_column()] = true;
				if chunk.tile_passable(neighbour, enemies) {
					// fringe tile, collect it but do not walk past it
					seeds.push(neighbour);
				} else {
					queue.push_back(neighbour);
				}
			}
		}
		if seeds.is_empty() {
			return;
		}
		let mut integration = IntegrationField::default();
		integration.build(chunk, &seeds, IntegrationMode::ImpassableOnly);
		self.calculate(&integration);
	}
}

/// Pick the direction of the cheapest neighbour of `cell`. Orthogonal
/// neighbours are always candidates; a diagonal is a candidate only when both
/// orthogonals flanking its corner hold finite integration. The scan order
/// breaks ties in favour of orthogonals
fn flow_dir(integration: &IntegrationField, cell: FieldCell) -> Ordinal {
	let field = integration.get();
	let r = cell.get_row();
	let c = cell.get_column();
	let mut min_cost = f32::INFINITY;
	if r > 0 {
		min_cost = min_cost.min(field[r - 1][c]);
	}
	if r < FIELD_RES_R - 1 {
		min_cost = min_cost.min(field[r + 1][c]);
	}
	if c < FIELD_RES_C - 1 {
		min_cost = min_cost.min(field[r][c + 1]);
	}
	if c > 0 {
		min_cost = min_cost.min(field[r][c - 1]);
	}
	let nw_open = r > 0 && c > 0 && field[r - 1][c].is_finite() && field[r][c - 1].is_finite();
	let ne_open = r > 0
		&& c < FIELD_RES_C - 1
		&& field[r - 1][c].is_finite()
		&& field[r][c + 1].is_finite();
	let sw_open = r < FIELD_RES_R - 1
		&& c > 0
		&& field[r + 1][c].is_finite()
		&& field[r][c - 1].is_finite();
	let se_open = r < FIELD_RES_R - 1
		&& c < FIELD_RES_C - 1
		&& field[r + 1][c].is_finite()
		&& field[r][c + 1].is_finite();
	if nw_open {
		min_cost = min_cost.min(field[r - 1][c - 1]);
	}
	if ne_open {
		min_cost = min_cost.min(field[r - 1][c + 1]);
	}
	if sw_open {
		min_cost = min_cost.min(field[r + 1][c - 1]);
	}
	if se_open {
		min_cost = min_cost.min(field[r + 1][c + 1]);
	}
	if min_cost.is_infinite() {
		return Ordinal::Zero;
	}
	if r > 0 && field[r - 1][c] == min_cost {
		return Ordinal::North;
	}
	if r < FIELD_RES_R - 1 && field[r + 1][c] == min_cost {
		return Ordinal::South;
	}
	if c < FIELD_RES_C - 1 && field[r][c + 1] == min_cost {
		return Ordinal::East;
	}
	if c > 0 && field[r][c - 1] == min_cost {
		return Ordinal::West;
	}
	if nw_open && field[r - 1][c - 1] == min_cost {
		return Ordinal::NorthWest;
	}
	if ne_open && field[r - 1][c + 1] == min_cost {
		return Ordinal::NorthEast;
	}
	if sw_open && field[r + 1][c - 1] == min_cost {
		return Ordinal::SouthWest;
	}
	if se_open && field[r + 1][c + 1] == min_cost {
		return Ordinal::SouthEast;
	}
	Ordinal::Zero
}

/// Stable 64-bit identity of a `(chunk, target, layer)` field request, used
/// as the key of flow-field caches. Bit layout:
///
/// ```text
/// [63:60] layer    [59:56] target tag    [55:16] target payload
/// [15:8]  chunk row    [7:0] chunk column
/// ```
///
/// The payload lane carries the tile coordinate for a tile target, both
/// portal endpoints for a portal target, the folded portal mask for a mask
/// target and the hunting faction for an enemies target
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect)]
pub struct FlowFieldId(u64);

impl FlowFieldId {
	/// Compose the identity of a field request
	pub fn new(chunk: ChunkID, target: &FieldTarget, layer: NavLayer) -> Self {
		let mut id = ((layer.bits() as u64) & 0xF) << 60;
		id |= ((target.tag() as u64) & 0xF) << 56;
		match target {
			FieldTarget::Tile(cell) => {
				id |= (cell.get_row() as u64) << 24;
				id |= (cell.get_column() as u64) << 16;
			}
			FieldTarget::Portal(portal) => {
				let [first, second] = portal.get_endpoints();
				id |= (first.get_row() as u64) << 40;
				id |= (first.get_column() as u64) << 32;
				id |= (second.get_row() as u64) << 24;
				id |= (second.get_column() as u64) << 16;
			}
			FieldTarget::PortalMask(mask) => {
				// fold the high bits down so the whole mask participates
				id |= ((mask ^ (mask >> 40)) & 0xFF_FFFF_FFFF) << 16;
			}
			FieldTarget::Enemies(desc) => {
				id |= (desc.faction as u64) << 16;
			}
		}
		id |= (chunk.get_row() as u64) << 8;
		id |= chunk.get_column() as u64;
		FlowFieldId(id)
	}
	/// The raw 64-bit identity
	pub fn get(&self) -> u64 {
		self.0
	}
	/// Recover the navigation layer the identity was composed with
	pub fn layer(&self) -> NavLayer {
		let bits = ((self.0 >> 60) & 0xF) as u8;
		match NavLayer::from_bits(bits) {
			Some(layer) => layer,
			None => panic!("Field identity {:#x} carries unknown layer bits", self.0),
		}
	}
	/// Recover the chunk coordinate the identity was composed with
	pub fn chunk(&self) -> ChunkID {
		ChunkID::new(((self.0 >> 8) & 0xFF) as usize, (self.0 & 0xFF) as usize)
	}
}
