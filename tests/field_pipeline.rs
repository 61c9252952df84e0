//! End-to-end flow-field builds through [NavigationWorld]
//!

use bevy::prelude::*;
use bevy_chunk_nav::prelude::*;
use rand::prelude::*;

/// A single-chunk ground-layer world with one world unit per tile
fn single_chunk_world() -> NavigationWorld {
	let geometry = MapGeometry::new(1, 1, FIELD_RES_C as f32, FIELD_RES_R as f32);
	NavigationWorld::new(geometry, Vec3::ZERO, &[NavLayer::Ground])
}

#[test]
fn open_field_tile_target() {
	let world = single_chunk_world();
	let queries = EntityIndex::default();
	let chunk_id = ChunkID::new(0, 0);
	let target = FieldTarget::Tile(FieldCell::new(4, 4));
	let mut field = FlowField::new(chunk_id);
	world.flow_field_update(chunk_id, NavLayer::Ground, None, &target, &queries, &mut field);
	assert_eq!(
		Ordinal::SouthEast,
		field.get_field_cell_value(FieldCell::new(0, 0))
	);
	assert_eq!(
		Ordinal::East,
		field.get_field_cell_value(FieldCell::new(4, 0))
	);
	assert_eq!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(4, 4))
	);
}

#[test]
fn wall_forces_detour() {
	let mut world = single_chunk_world();
	{
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		for row in 0..=4 {
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(row, 3));
		}
	}
	let queries = EntityIndex::default();
	let chunk_id = ChunkID::new(0, 0);
	let target = FieldTarget::Tile(FieldCell::new(2, 6));
	let mut field = FlowField::new(chunk_id);
	world.flow_field_update(chunk_id, NavLayer::Ground, None, &target, &queries, &mut field);
	// west of the wall everything funnels south around its free end
	assert_eq!(
		Ordinal::South,
		field.get_field_cell_value(FieldCell::new(2, 2))
	);
	assert_eq!(
		Ordinal::East,
		field.get_field_cell_value(FieldCell::new(5, 2))
	);
	let far_west = field.get_field_cell_value(FieldCell::new(2, 0));
	assert!(
		far_west == Ordinal::South || far_west == Ordinal::SouthEast,
		"expected a southward direction at (2,0), got {:?}",
		far_west
	);
	// wall tiles are never assigned a direction
	assert_eq!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(2, 3))
	);
}

#[test]
fn portal_target_points_across_boundary() {
	let geometry = MapGeometry::new(2, 1, FIELD_RES_C as f32, FIELD_RES_R as f32);
	let mut world = NavigationWorld::new(geometry, Vec3::ZERO, &[NavLayer::Ground]);
	{
		// close the shared edge except columns 3..=5 of the southern chunk
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(1, 0));
		for column in 0..FIELD_RES_C {
			if !(3..=5).contains(&column) {
				chunk.set_cost(COST_IMPASSABLE, FieldCell::new(0, column));
			}
		}
	}
	world.rebuild_portals(NavLayer::Ground);
	let chunk_id = ChunkID::new(1, 0);
	let portal = {
		let chunk = world.chunk(NavLayer::Ground, chunk_id);
		assert_eq!(1, chunk.get_portals().len());
		let portal = chunk.get_portals()[0].clone();
		assert_eq!(
			[FieldCell::new(0, 3), FieldCell::new(0, 5)],
			portal.get_endpoints()
		);
		portal
	};
	let queries = EntityIndex::default();
	let target = FieldTarget::Portal(portal);
	let mut field = FlowField::new(chunk_id);
	world.flow_field_update(chunk_id, NavLayer::Ground, None, &target, &queries, &mut field);
	for column in 3..=5 {
		assert_eq!(
			Ordinal::North,
			field.get_field_cell_value(FieldCell::new(0, column))
		);
	}
	assert_eq!(
		Ordinal::North,
		field.get_field_cell_value(FieldCell::new(7, 4))
	);
}

#[test]
fn portal_mask_unions_frontiers() {
	let geometry = MapGeometry::new(1, 2, FIELD_RES_C as f32, FIELD_RES_R as f32);
	let mut world = NavigationWorld::new(geometry, Vec3::ZERO, &[NavLayer::Ground]);
	{
		// split the shared edge into two portals
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		for row in 20..=40 {
			chunk.set_cost(COST_IMPASSABLE, FieldCell::new(row, FIELD_RES_C - 1));
		}
	}
	world.rebuild_portals(NavLayer::Ground);
	let chunk_id = ChunkID::new(0, 0);
	assert_eq!(
		2,
		world.chunk(NavLayer::Ground, chunk_id).get_portals().len()
	);
	let queries = EntityIndex::default();
	let target = FieldTarget::PortalMask(0b11);
	let mut field = FlowField::new(chunk_id);
	world.flow_field_update(chunk_id, NavLayer::Ground, None, &target, &queries, &mut field);
	// seeds of both portals point east into the neighbour after fix-up
	assert_eq!(
		Ordinal::East,
		field.get_field_cell_value(FieldCell::new(5, FIELD_RES_C - 1))
	);
	assert_eq!(
		Ordinal::East,
		field.get_field_cell_value(FieldCell::new(50, FIELD_RES_C - 1))
	);
	// interior tiles flow towards the nearest portal
	assert_ne!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(30, 0))
	);
}

#[test]
fn trapped_unit_escapes_blockers() {
	let mut world = single_chunk_world();
	{
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		for row in 2..=4 {
			for column in 2..=4 {
				chunk.add_blockers(FieldCell::new(row, column), 1);
			}
		}
	}
	let queries = EntityIndex::default();
	let chunk_id = ChunkID::new(0, 0);
	let mut field = FlowField::new(chunk_id);
	world.flow_field_update_to_nearest_pathable(
		chunk_id,
		NavLayer::Ground,
		FieldCell::new(3, 3),
		None,
		&queries,
		&mut field,
	);
	// the trapped centre flows outward
	assert_eq!(
		Ordinal::North,
		field.get_field_cell_value(FieldCell::new(3, 3))
	);
	// every blocked edge tile points at the adjacent perimeter
	assert_eq!(
		Ordinal::North,
		field.get_field_cell_value(FieldCell::new(2, 3))
	);
	assert_eq!(
		Ordinal::West,
		field.get_field_cell_value(FieldCell::new(3, 2))
	);
	// perimeter tiles seeded at zero stay directionless
	assert_eq!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(1, 3))
	);
	assert_eq!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(3, 1))
	);
}

#[test]
fn island_mismatch_reseeds_to_nearest() {
	let geometry = MapGeometry::new(1, 2, FIELD_RES_C as f32, FIELD_RES_R as f32);
	let mut world = NavigationWorld::new(geometry, Vec3::ZERO, &[NavLayer::Ground]);
	{
		// wall across the full width of the western chunk splits it in two,
		// but both halves stay globally connected through the eastern chunk
		let west = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		for column in 0..FIELD_RES_C {
			west.set_cost(COST_IMPASSABLE, FieldCell::new(32, column));
		}
	}
	world.rebuild_portals(NavLayer::Ground);
	world.rebuild_islands(NavLayer::Ground);
	let chunk_id = ChunkID::new(0, 0);
	let (mover_island, target_island) = {
		let west = world.chunk(NavLayer::Ground, chunk_id);
		(
			west.local_island_at(FieldCell::new(40, 5)),
			west.local_island_at(FieldCell::new(5, 5)),
		)
	};
	assert_ne!(mover_island, target_island);
	let queries = EntityIndex::default();
	let target = FieldTarget::Tile(FieldCell::new(5, 5));
	let mut field = FlowField::new(chunk_id);
	world.flow_field_update_island_to_nearest(
		mover_island,
		chunk_id,
		NavLayer::Ground,
		None,
		&target,
		&queries,
		&mut field,
	);
	// the southern half flows towards the reseeded tile just south of the
	// wall, directly below the unreachable target
	assert_eq!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(33, 5))
	);
	assert_eq!(
		Ordinal::North,
		field.get_field_cell_value(FieldCell::new(40, 5))
	);
	// the target's own half is untouched by the reseeded wavefront
	assert_eq!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(5, 5))
	);
}

#[test]
fn fully_blocked_target_retries_ignoring_blockers() {
	let mut world = single_chunk_world();
	{
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		// a building squats on the target tile and its surroundings
		for row in 9..=11 {
			for column in 9..=11 {
				chunk.add_blockers(FieldCell::new(row, column), 1);
			}
		}
	}
	world.rebuild_islands(NavLayer::Ground);
	let chunk_id = ChunkID::new(0, 0);
	let mover_island = world
		.chunk(NavLayer::Ground, chunk_id)
		.local_island_at(FieldCell::new(0, 0));
	let queries = EntityIndex::default();
	let target = FieldTarget::Tile(FieldCell::new(10, 10));
	let mut field = FlowField::new(chunk_id);
	world.flow_field_update_island_to_nearest(
		mover_island,
		chunk_id,
		NavLayer::Ground,
		None,
		&target,
		&queries,
		&mut field,
	);
	// with obstructions ignored the flow presses up against the building
	assert_eq!(
		Ordinal::Zero,
		field.get_field_cell_value(FieldCell::new(10, 10))
	);
	assert_eq!(
		Ordinal::SouthEast,
		field.get_field_cell_value(FieldCell::new(0, 0))
	);
}

#[test]
fn update_is_idempotent() {
	let mut world = single_chunk_world();
	{
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		chunk.set_cost(COST_IMPASSABLE, FieldCell::new(10, 10));
		chunk.set_cost(30, FieldCell::new(12, 12));
	}
	let queries = EntityIndex::default();
	let chunk_id = ChunkID::new(0, 0);
	let target = FieldTarget::Tile(FieldCell::new(20, 20));
	let mut first = FlowField::new(chunk_id);
	world.flow_field_update(chunk_id, NavLayer::Ground, None, &target, &queries, &mut first);
	let mut second = FlowField::new(chunk_id);
	world.flow_field_update(
		chunk_id,
		NavLayer::Ground,
		None,
		&target,
		&queries,
		&mut second,
	);
	assert_eq!(first.get(), second.get());
}

#[test]
fn enemy_occupied_tiles_admit_the_wavefront() {
	let mut world = single_chunk_world();
	{
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		// hostile units camp on a full column
		for row in 0..FIELD_RES_R {
			chunk.add_blockers(FieldCell::new(row, 10), 1);
			chunk.set_faction_occupancy(2, FieldCell::new(row, 10), true);
		}
	}
	let mut queries = EntityIndex::default();
	queries.set_diplomacy(0, 2, DiplomacyState::War);
	let chunk_id = ChunkID::new(0, 0);
	let target = FieldTarget::Tile(FieldCell::new(5, 20));
	// without a faction the occupied column is a wall
	let mut neutral = FlowField::new(chunk_id);
	world.flow_field_update(
		chunk_id,
		NavLayer::Ground,
		None,
		&target,
		&queries,
		&mut neutral,
	);
	assert_eq!(
		Ordinal::Zero,
		neutral.get_field_cell_value(FieldCell::new(5, 0))
	);
	// a faction at war with the campers walks straight at them
	let mut hostile = FlowField::new(chunk_id);
	world.flow_field_update(
		chunk_id,
		NavLayer::Ground,
		Some(0),
		&target,
		&queries,
		&mut hostile,
	);
	assert_eq!(
		Ordinal::East,
		hostile.get_field_cell_value(FieldCell::new(5, 0))
	);
}

#[test]
fn directions_always_descend_integration() {
	let mut rng = StdRng::seed_from_u64(0x5eed);
	for _ in 0..8 {
		let mut chunk = NavChunk::default();
		let target = FieldCell::new(
			rng.random_range(0..FIELD_RES_R),
			rng.random_range(0..FIELD_RES_C),
		);
		for _ in 0..600 {
			let cell = FieldCell::new(
				rng.random_range(0..FIELD_RES_R),
				rng.random_range(0..FIELD_RES_C),
			);
			if cell != target {
				chunk.set_cost(COST_IMPASSABLE, cell);
			}
		}
		let mut integration = IntegrationField::default();
		integration.build(
			&chunk,
			&[target],
			IntegrationMode::Passable {
				enemies: 0,
				ignore_blockers: false,
			},
		);
		let mut field = FlowField::new(ChunkID::new(0, 0));
		field.calculate(&integration);
		for row in 0..FIELD_RES_R {
			for column in 0..FIELD_RES_C {
				let cell = FieldCell::new(row, column);
				let here = integration.get_field_cell_value(cell);
				let dir = field.get_field_cell_value(cell);
				if !here.is_finite() || here == 0.0 || dir == Ordinal::Zero {
					continue;
				}
				let (dr, dc) = dir.grid_offset();
				let next = FieldCell::new(
					(row as i32 + dr) as usize,
					(column as i32 + dc) as usize,
				);
				let there = integration.get_field_cell_value(next);
				assert!(
					there < here,
					"direction {:?} at {:?} climbs from {} to {}",
					dir,
					cell,
					here,
					there
				);
				// diagonals must have both flanking orthogonals reached
				if dr != 0 && dc != 0 {
					let row_side =
						integration.get_field_cell_value(FieldCell::new((row as i32 + dr) as usize, column));
					let col_side =
						integration.get_field_cell_value(FieldCell::new(row, (column as i32 + dc) as usize));
					assert!(row_side.is_finite() && col_side.is_finite());
				}
			}
		}
	}
}
