//! Measure a LOSField generation for a chunk scattered with obstacles, each
//! casting a shadow line
//!

use bevy::prelude::*;
use bevy_chunk_nav::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Build a single-chunk world with a grid of lone blockers
fn los_field_shadows(c: &mut Criterion) {
	let geometry = MapGeometry::new(1, 1, FIELD_RES_C as f32, FIELD_RES_R as f32);
	let mut world = NavigationWorld::new(geometry, Vec3::ZERO, &[NavLayer::Ground]);
	{
		let chunk = world.chunk_mut(NavLayer::Ground, ChunkID::new(0, 0));
		for row in (8..FIELD_RES_R).step_by(16) {
			for column in (8..FIELD_RES_C).step_by(16) {
				chunk.add_blockers(FieldCell::new(row, column), 1);
			}
		}
	}
	let chunk_id = ChunkID::new(0, 0);
	let target = (chunk_id, FieldCell::new(32, 32));
	c.bench_function("calc_los_shadow", |b| {
		b.iter(|| {
			let mut los = LOSField::new(chunk_id);
			world.los_field_create(
				black_box(chunk_id),
				NavLayer::Ground,
				black_box(target),
				None,
				&mut los,
			);
			black_box(los);
		})
	});
}

criterion_group!(benches, los_field_shadows);
criterion_main!(benches);
