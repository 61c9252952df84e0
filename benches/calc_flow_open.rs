//! Measure a FlowField generation for a chunk of uniform costs (hence open -
//! open space)
//!

use bevy::prelude::*;
use bevy_chunk_nav::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Build a single-chunk world and route it at a far-corner tile
fn flow_field_open(c: &mut Criterion) {
	let geometry = MapGeometry::new(1, 1, FIELD_RES_C as f32, FIELD_RES_R as f32);
	let world = NavigationWorld::new(geometry, Vec3::ZERO, &[NavLayer::Ground]);
	let queries = EntityIndex::default();
	let chunk_id = ChunkID::new(0, 0);
	let target = FieldTarget::Tile(FieldCell::new(FIELD_RES_R - 1, FIELD_RES_C - 1));
	c.bench_function("calc_flow_open", |b| {
		b.iter(|| {
			let mut field = FlowField::new(chunk_id);
			world.flow_field_update(
				black_box(chunk_id),
				NavLayer::Ground,
				None,
				black_box(&target),
				&queries,
				&mut field,
			);
			black_box(field);
		})
	});
}

criterion_group!(benches, flow_field_open);
criterion_main!(benches);
