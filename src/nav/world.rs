//! The owning context of all navigation state. A [NavigationWorld] holds the
//! chunk grid of every navigation layer together with the world-space
//! geometry, and exposes the update operations the rest of the game calls:
//! flow-field updates for each target kind, the fallback builders for stuck
//! or island-mismatched movers and line-of-sight field construction
//!
//! Many updates may run concurrently on disjoint `(chunk, layer, target)`
//! triples: the update operations only read chunk data and each writes its
//! own caller-supplied output buffer. Mutating chunk state (costs, blockers,
//! portals, islands) must not overlap with updates reading it
//!

use std::collections::BTreeMap;
use std::collections::HashMap;

use bevy::prelude::*;

use crate::prelude::*;

/// Chunk grids per navigation layer plus the world-space layout, the context
/// every navigation operation works against
#[derive(Component)]
pub struct NavigationWorld {
	/// Chunk/tile world-space layout
	geometry: MapGeometry,
	/// World-space position of the map origin (the maximal-`x`, minimal-`z`
	/// corner of chunk `(0, 0)`)
	map_pos: Vec3,
	/// Chunk data per layer, row-major by chunk coordinate
	layers: BTreeMap<NavLayer, Vec<NavChunk>>,
}

impl NavigationWorld {
	/// Create a new instance of [NavigationWorld] with default (open) chunk
	/// grids for each requested layer
	pub fn new(geometry: MapGeometry, map_pos: Vec3, layers: &[NavLayer]) -> Self {
		let chunk_count = geometry.get_chunk_rows() * geometry.get_chunk_cols();
		let mut layer_map = BTreeMap::new();
		for layer in layers.iter() {
			layer_map.insert(*layer, vec![NavChunk::default(); chunk_count]);
		}
		NavigationWorld {
			geometry,
			map_pos,
			layers: layer_map,
		}
	}
	/// Get the world-space layout
	pub fn get_geometry(&self) -> &MapGeometry {
		&self.geometry
	}
	/// Get the world-space position of the map origin
	pub fn get_map_pos(&self) -> Vec3 {
		self.map_pos
	}
	/// Row-major storage index of a chunk
	fn chunk_index(&self, chunk: ChunkID) -> usize {
		chunk.get_row() * self.geometry.get_chunk_cols() + chunk.get_column()
	}
	/// Get a chunk of a layer. Addressing a missing layer or a chunk outside
	/// the map is a programmer error and panics
	pub fn chunk(&self, layer: NavLayer, chunk: ChunkID) -> &NavChunk {
		if !self.geometry.chunk_in_bounds(chunk) {
			panic!(
				"Chunk {:?} lies outside the {}x{} chunk grid",
				chunk,
				self.geometry.get_chunk_rows(),
				self.geometry.get_chunk_cols()
			);
		}
		let index = self.chunk_index(chunk);
		match self.layers.get(&layer) {
			Some(chunks) => &chunks[index],
			None => panic!("Navigation layer {:?} does not exist", layer),
		}
	}
	/// Get a mutable chunk of a layer, with the same addressing rules as
	/// [NavigationWorld::chunk]
	pub fn chunk_mut(&mut self, layer: NavLayer, chunk: ChunkID) -> &mut NavChunk {
		if !self.geometry.chunk_in_bounds(chunk) {
			panic!(
				"Chunk {:?} lies outside the {}x{} chunk grid",
				chunk,
				self.geometry.get_chunk_rows(),
				self.geometry.get_chunk_cols()
			);
		}
		let index = self.chunk_index(chunk);
		match self.layers.get_mut(&layer) {
			Some(chunks) => &mut chunks[index],
			None => panic!("Navigation layer {:?} does not exist", layer),
		}
	}
	/// Rediscover the portals of every chunk of a layer. Each shared chunk
	/// edge is scanned for runs of tiles traversable on both sides of the
	/// static cost grids; every run becomes a mirrored portal pair
	pub fn rebuild_portals(&mut self, layer: NavLayer) {
		let rows = self.geometry.get_chunk_rows();
		let cols = self.geometry.get_chunk_cols();
		let chunks = match self.layers.get_mut(&layer) {
			Some(chunks) => chunks,
			None => panic!("Navigation layer {:?} does not exist", layer),
		};
		for chunk in chunks.iter_mut() {
			chunk.set_portals(Vec::new());
		}
		// pairs of (owning chunk storage index, portal) discovered by the scan
		let mut discovered: Vec<(usize, Portal)> = Vec::new();
		for chunk_row in 0..rows {
			for chunk_col in 0..cols {
				let own = ChunkID::new(chunk_row, chunk_col);
				let own_index = chunk_row * cols + chunk_col;
				// eastern boundary
				if chunk_col + 1 < cols {
					let other = ChunkID::new(chunk_row, chunk_col + 1);
					let other_index = chunk_row * cols + chunk_col + 1;
					let open = |k: usize| {
						chunks[own_index].statically_passable(FieldCell::new(k, FIELD_RES_C - 1))
							&& chunks[other_index].statically_passable(FieldCell::new(k, 0))
					};
					for (start, end) in boundary_runs(FIELD_RES_R, open) {
						let portal = Portal::new(
							own,
							[
								FieldCell::new(start, FIELD_RES_C - 1),
								FieldCell::new(end, FIELD_RES_C - 1),
							],
							other,
							[FieldCell::new(start, 0), FieldCell::new(end, 0)],
						);
						let mirror = Portal::new(
							other,
							[FieldCell::new(start, 0), FieldCell::new(end, 0)],
							own,
							[
								FieldCell::new(start, FIELD_RES_C - 1),
								FieldCell::new(end, FIELD_RES_C - 1),
							],
						);
						discovered.push((own_index, portal));
						discovered.push((other_index, mirror));
					}
				}
				// southern boundary
				if chunk_row + 1 < rows {
					let other = ChunkID::new(chunk_row + 1, chunk_col);
					let other_index = (chunk_row + 1) * cols + chunk_col;
					let open = |k: usize| {
						chunks[own_index].statically_passable(FieldCell::new(FIELD_RES_R - 1, k))
							&& chunks[other_index].statically_passable(FieldCell::new(0, k))
					};
					for (start, end) in boundary_runs(FIELD_RES_C, open) {
						let portal = Portal::new(
							own,
							[
								FieldCell::new(FIELD_RES_R - 1, start),
								FieldCell::new(FIELD_RES_R - 1, end),
							],
							other,
							[FieldCell::new(0, start), FieldCell::new(0, end)],
						);
						let mirror = Portal::new(
							other,
							[FieldCell::new(0, start), FieldCell::new(0, end)],
							own,
							[
								FieldCell::new(FIELD_RES_R - 1, start),
								FieldCell::new(FIELD_RES_R - 1, end),
							],
						);
						discovered.push((own_index, portal));
						discovered.push((other_index, mirror));
					}
				}
			}
		}
		for (index, portal) in discovered {
			chunks[index].push_portal(portal);
		}
	}
	/// Relabel the islands of a layer. Every chunk's local islands are
	/// rebuilt first, then local islands connected by a portal run are
	/// unioned and each resulting component receives one global label
	pub fn rebuild_islands(&mut self, layer: NavLayer) {
		let cols = self.geometry.get_chunk_cols();
		let chunks = match self.layers.get_mut(&layer) {
			Some(chunks) => chunks,
			None => panic!("Navigation layer {:?} does not exist", layer),
		};
		for chunk in chunks.iter_mut() {
			chunk.rebuild_local_islands();
		}
		let mut union = IslandUnion::default();
		for (index, chunk) in chunks.iter().enumerate() {
			for portal in chunk.get_portals().iter() {
				let other = portal.get_connected_chunk();
				let other_index = other.get_row() * cols + other.get_column();
				for (cell, connected_cell) in
					portal.cells().into_iter().zip(portal.connected_cells())
				{
					let own_label = chunk.local_island_at(cell);
					let other_label = chunks[other_index].local_island_at(connected_cell);
					if own_label != ISLAND_NONE && other_label != ISLAND_NONE {
						union.union((index, own_label), (other_index, other_label));
					}
				}
			}
		}
		// number the components and stamp the global labels
		let mut assigned: HashMap<(usize, u16), u16> = HashMap::new();
		let mut next_label: u16 = 0;
		for index in 0..chunks.len() {
			for row in 0..FIELD_RES_R {
				for column in 0..FIELD_RES_C {
					let cell = FieldCell::new(row, column);
					let local = chunks[index].local_island_at(cell);
					if local == ISLAND_NONE {
						chunks[index].set_island(ISLAND_NONE, cell);
						continue;
					}
					let root = union.find((index, local));
					let label = *assigned.entry(root).or_insert_with(|| {
						let label = next_label;
						debug_assert!(label != ISLAND_NONE);
						next_label += 1;
						label
					});
					chunks[index].set_island(label, cell);
				}
			}
		}
	}
	/// Route a chunk towards a target: resolve the target into seed tiles,
	/// integrate, derive the flow directions and point portal seeds across
	/// the boundary. A target that resolves to no seeds (fully blocked)
	/// leaves the buffer untouched; callers fall back to
	/// [NavigationWorld::flow_field_update_island_to_nearest]
	pub fn flow_field_update(
		&self,
		chunk_id: ChunkID,
		layer: NavLayer,
		faction: Option<u8>,
		target: &FieldTarget,
		queries: &dyn EntityQueries,
		field: &mut FlowField,
	) {
		let chunk = self.chunk(layer, chunk_id);
		let groups = resolve_frontier(
			target,
			chunk,
			chunk_id,
			&self.geometry,
			queries,
			false,
			faction,
		);
		let seeds: Vec<FieldCell> = groups
			.iter()
			.flat_map(|group| group.seeds.iter().copied())
			.collect();
		if seeds.is_empty() {
			return;
		}
		let enemies = faction.map(|f| queries.enemy_factions(f)).unwrap_or(0);
		let mut integration = IntegrationField::default();
		integration.build(
			chunk,
			&seeds,
			IntegrationMode::Passable {
				enemies,
				ignore_blockers: false,
			},
		);
		field.set_target(target.clone());
		field.calculate(&integration);
		for group in groups.iter() {
			if let Some(portal) = &group.portal {
				field.apply_portal_fixup(portal, &group.seeds);
			}
		}
	}
	/// Build an escape flow for a mover stuck on an impassable tile, towards
	/// the nearest walkable perimeter
	pub fn flow_field_update_to_nearest_pathable(
		&self,
		chunk_id: ChunkID,
		layer: NavLayer,
		start: FieldCell,
		faction: Option<u8>,
		queries: &dyn EntityQueries,
		field: &mut FlowField,
	) {
		let chunk = self.chunk(layer, chunk_id);
		let enemies = faction.map(|f| queries.enemy_factions(f)).unwrap_or(0);
		field.calculate_to_nearest_pathable(chunk, start, enemies);
	}
	/// Route a chunk towards a target whose natural seeds lie on a different
	/// local island than the mover. Each natural seed is walked outwards to
	/// the closest tiles belonging to the mover's local island (and the
	/// seed's global island), and those tiles reseed a normal update. When
	/// the target resolves to no seeds at all, or no reachable reseed
	/// exists, the update retries with dynamic obstructions ignored
	pub fn flow_field_update_island_to_nearest(
		&self,
		local_island: u16,
		chunk_id: ChunkID,
		layer: NavLayer,
		faction: Option<u8>,
		target: &FieldTarget,
		queries: &dyn EntityQueries,
		field: &mut FlowField,
	) {
		debug_assert!(local_island != ISLAND_NONE);
		let chunk = self.chunk(layer, chunk_id);
		let groups = resolve_frontier(
			target,
			chunk,
			chunk_id,
			&self.geometry,
			queries,
			false,
			faction,
		);
		let natural: Vec<FieldCell> = groups
			.iter()
			.flat_map(|group| group.seeds.iter().copied())
			.collect();
		if natural.is_empty() {
			self.update_ignoring_blockers(chunk, chunk_id, faction, target, queries, field);
			return;
		}
		let mut best_distance = usize::MAX;
		let mut reseeded: Vec<FieldCell> = Vec::new();
		for seed in natural.iter() {
			collect_island_reseeds(
				chunk,
				*seed,
				local_island,
				&mut best_distance,
				&mut reseeded,
			);
		}
		if reseeded.is_empty() {
			self.update_ignoring_blockers(chunk, chunk_id, faction, target, queries, field);
			return;
		}
		let enemies = faction.map(|f| queries.enemy_factions(f)).unwrap_or(0);
		let mut integration = IntegrationField::default();
		integration.build(
			chunk,
			&reseeded,
			IntegrationMode::Passable {
				enemies,
				ignore_blockers: false,
			},
		);
		field.set_target(target.clone());
		field.calculate(&integration);
		for group in groups.iter() {
			if let Some(portal) = &group.portal {
				field.apply_portal_fixup(portal, &group.seeds);
			}
		}
	}
	/// Last-resort update for a fully blocked target: resolve and integrate
	/// with dynamic obstructions ignored so the mover at least presses up
	/// against the obstruction
	fn update_ignoring_blockers(
		&self,
		chunk: &NavChunk,
		chunk_id: ChunkID,
		faction: Option<u8>,
		target: &FieldTarget,
		queries: &dyn EntityQueries,
		field: &mut FlowField,
	) {
		let groups = resolve_frontier(
			target,
			chunk,
			chunk_id,
			&self.geometry,
			queries,
			true,
			faction,
		);
		let seeds: Vec<FieldCell> = groups
			.iter()
			.flat_map(|group| group.seeds.iter().copied())
			.collect();
		if seeds.is_empty() {
			return;
		}
		let enemies = faction.map(|f| queries.enemy_factions(f)).unwrap_or(0);
		let mut integration = IntegrationField::default();
		integration.build(
			chunk,
			&seeds,
			IntegrationMode::Passable {
				enemies,
				ignore_blockers: true,
			},
		);
		field.set_target(target.clone());
		field.calculate(&integration);
		for group in groups.iter() {
			if let Some(portal) = &group.portal {
				field.apply_portal_fixup(portal, &group.seeds);
			}
		}
	}
	/// Build the visibility field of a chunk for a target tile. When the
	/// chunk is not the target's chunk, `previous` must hold the field of
	/// the orthogonally adjacent predecessor chunk on the path
	pub fn los_field_create(
		&self,
		chunk_id: ChunkID,
		layer: NavLayer,
		target: (ChunkID, FieldCell),
		previous: Option<&LOSField>,
		field: &mut LOSField,
	) {
		debug_assert!(field.get_chunk() == chunk_id);
		let chunk = self.chunk(layer, chunk_id);
		field.calculate(target, chunk, &self.geometry, self.map_pos, previous);
	}
}

/// Inclusive `(start, end)` index runs for which `open` holds, scanning
/// `0..len`
fn boundary_runs(len: usize, open: impl Fn(usize) -> bool) -> Vec<(usize, usize)> {
	let mut runs = Vec::new();
	let mut start: Option<usize> = None;
	for k in 0..len {
		if open(k) {
			if start.is_none() {
				start = Some(k);
			}
		} else if let Some(s) = start.take() {
			runs.push((s, k - 1));
		}
	}
	if let Some(s) = start {
		runs.push((s, len - 1));
	}
	runs
}

/// Walk breadth-first shells outwards from `seed` until a shell contains
/// tiles of the requested local island (and of the seed's global island when
/// the seed has one). Those tiles join `reseeded` when they match the best
/// Manhattan distance found so far across all seeds
fn collect_island_reseeds(
	chunk: &NavChunk,
	seed: FieldCell,
	local_island: u16,
	best_distance: &mut usize,
	reseeded: &mut Vec<FieldCell>,
) {
	let seed_island = chunk.island_at(seed);
	let mut visited = [[false; FIELD_RES_C]; FIELD_RES_R];
	visited[seed.get_row()][seed.get_column()] = true;
	let mut shell = vec![seed];
	while !shell.is_empty() {
		let mut candidates = Vec::new();
		for cell in shell.iter() {
			if chunk.local_island_at(*cell) == local_island
				&& (seed_island == ISLAND_NONE || chunk.island_at(*cell) == seed_island)
			{
				candidates.push(*cell);
			}
		}
		if !candidates.is_empty() {
			for cell in candidates {
				let distance = seed.manhattan_distance(cell);
				if distance < *best_distance {
					*best_distance = distance;
					reseeded.clear();
					reseeded.push(cell);
				} else if distance == *best_distance && !reseeded.contains(&cell) {
					reseeded.push(cell);
				}
			}
			return;
		}
		let mut next = Vec::new();
		for cell in shell.iter() {
			for neighbour in Ordinal::get_orthogonal_cell_neighbours(*cell) {
				if !visited[neighbour.get_row()][neighbour.get_column()] {
					visited[neighbour.get_row()][neighbour.get_column()] = true;
					next.push(neighbour);
				}
			}
		}
		shell = next;
	}
}

/// Union-find over `(chunk index, local island label)` nodes used to join
/// local islands across portals into global islands
#[derive(Default)]
struct IslandUnion {
	/// Parent pointer of each node; absent nodes are their own parent
	parent: HashMap<(usize, u16), (usize, u16)>,
}

impl IslandUnion {
	/// Representative node of the component containing `node`
	fn find(&mut self, node: (usize, u16)) -> (usize, u16) {
		let mut current = node;
		while let Some(parent) = self.parent.get(&current).copied() {
			if parent == current {
				break;
			}
			// path halving
			let grandparent = self.parent.get(&parent).copied().unwrap_or(parent);
			self.parent.insert(current, grandparent);
			current = parent;
		}
		current
	}
	/// Join the components containing the two nodes
	fn union(&mut self, a: (usize, u16), b: (usize, u16)) {
		let root_a = self.find(a);
		let root_b = self.find(b);
		if root_a != root_b {
			self.parent.insert(root_a, root_b);
		}
	}
}
