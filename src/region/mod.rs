//! Named 2D areas of the map that track which entities currently stand
//! inside them. Regions are registered under unique names, can be moved, and
//! a per-tick update recomputes their occupancy through the entity query
//! surface, emitting entered/exited deltas computed as the difference of the
//! previous and current sorted membership sets
//!
//! The registry owns every region and every emitted payload; nothing here is
//! global state and the game decides where the registry lives (typically as
//! a component next to its [crate::prelude::EntityIndex])
//!

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use bevy::prelude::*;

use crate::prelude::*;

/// The footprint shape of a region on the `x-z` plane
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RegionShape {
	/// A disc of the given radius
	Circle {
		/// Disc radius in world units
		radius: f32,
	},
	/// An axis-aligned rectangle of the given side lengths, centred on the
	/// region position
	Rectangle {
		/// Side length along world `x`
		xlen: f32,
		/// Side length along world `z`
		zlen: f32,
	},
}

/// One named area and its membership state
#[derive(Clone, Debug)]
struct Region {
	/// Footprint shape
	shape: RegionShape,
	/// World-space centre position
	pos: Vec2,
	/// Entities inside the region as of the latest update
	curr_ents: BTreeSet<EntityId>,
}

impl Region {
	/// Whether a point of the `x-z` plane lies inside the region
	fn contains(&self, point: Vec2) -> bool {
		match self.shape {
			RegionShape::Circle { radius } => self.pos.distance_squared(point) <= radius * radius,
			RegionShape::Rectangle { xlen, zlen } => {
				(point.x - self.pos.x).abs() <= xlen / 2.0
					&& (point.y - self.pos.y).abs() <= zlen / 2.0
			}
		}
	}
}

/// Whether an entity counts for region membership; corpses and scripting
/// markers never do
fn membership_eligible(queries: &dyn EntityQueries, ent: EntityId) -> bool {
	!queries.zombie(ent) && !queries.marker(ent)
}

/// Which way an entity crossed a region boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionEventKind {
	/// The entity was outside last tick and is inside now
	Entered,
	/// The entity was inside last tick and is outside now
	Exited,
}

/// An owned membership-change payload produced by [RegionRegistry::update]
#[derive(Clone, Debug, PartialEq)]
pub struct RegionEvent {
	/// Name of the region whose membership changed
	pub region: String,
	/// Entity that crossed the boundary
	pub entity: EntityId,
	/// Direction of the crossing
	pub kind: RegionEventKind,
}

/// All registered regions, keyed by their unique names
#[derive(Component, Default)]
pub struct RegionRegistry {
	/// Regions by name
	regions: BTreeMap<String, Region>,
}

impl RegionRegistry {
	/// Register a disc region. Returns false without touching state when the
	/// name is already taken
	pub fn add_circle(&mut self, name: &str, pos: Vec2, radius: f32) -> bool {
		self.add(name, pos, RegionShape::Circle { radius })
	}
	/// Register a rectangular region. Returns false without touching state
	/// when the name is already taken
	pub fn add_rectangle(&mut self, name: &str, pos: Vec2, xlen: f32, zlen: f32) -> bool {
		self.add(name, pos, RegionShape::Rectangle { xlen, zlen })
	}
	/// Shared insertion path of the shape-specific registrations
	fn add(&mut self, name: &str, pos: Vec2, shape: RegionShape) -> bool {
		if self.regions.contains_key(name) {
			warn!("Region name {:?} is already registered", name);
			return false;
		}
		self.regions.insert(
			name.to_owned(),
			Region {
				shape,
				pos,
				curr_ents: BTreeSet::new(),
			},
		);
		true
	}
	/// Remove a region. Returns false when no region has the name
	pub fn remove(&mut self, name: &str) -> bool {
		self.regions.remove(name).is_some()
	}
	/// Move a region. Membership catches up on the next update. Returns
	/// false when no region has the name
	pub fn set_pos(&mut self, name: &str, pos: Vec2) -> bool {
		match self.regions.get_mut(name) {
			Some(region) => {
				region.pos = pos;
				true
			}
			None => false,
		}
	}
	/// Centre position of a region, `None` when no region has the name
	pub fn get_pos(&self, name: &str) -> Option<Vec2> {
		self.regions.get(name).map(|region| region.pos)
	}
	/// Entities inside a region as of the latest update; empty for unknown
	/// names
	pub fn get_ents(&self, name: &str) -> Vec<EntityId> {
		match self.regions.get(name) {
			Some(region) => region.curr_ents.iter().copied().collect(),
			None => Vec::new(),
		}
	}
	/// Whether an entity stood inside a region as of the latest update
	pub fn contains_ent(&self, name: &str, ent: EntityId) -> bool {
		match self.regions.get(name) {
			Some(region) => region.curr_ents.contains(&ent),
			None => false,
		}
	}
	/// Whether a point of the `x-z` plane lies inside a region
	pub fn contains_point(&self, name: &str, point: Vec2) -> bool {
		match self.regions.get(name) {
			Some(region) => region.contains(point),
			None => false,
		}
	}
	/// Recompute the membership of every region from the entity positions
	/// and append one event per boundary crossing since the previous update
	pub fn update(&mut self, queries: &dyn EntityQueries, events: &mut Vec<RegionEvent>) {
		for (name, region) in self.regions.iter_mut() {
			let mut inside = Vec::new();
			match region.shape {
				RegionShape::Circle { radius } => {
					queries.ents_in_circle(region.pos, radius, &mut inside);
				}
				RegionShape::Rectangle { xlen, zlen } => {
					let half = Vec2::new(xlen / 2.0, zlen / 2.0);
					queries.ents_in_rect(region.pos - half, region.pos + half, &mut inside);
				}
			}
			let current: BTreeSet<EntityId> = inside
				.into_iter()
				.filter(|ent| membership_eligible(queries, *ent))
				.collect();
			for entered in current.difference(&region.curr_ents) {
				events.push(RegionEvent {
					region: name.clone(),
					entity: *entered,
					kind: RegionEventKind::Entered,
				});
			}
			for exited in region.curr_ents.difference(&current) {
				events.push(RegionEvent {
					region: name.clone(),
					entity: *exited,
					kind: RegionEventKind::Exited,
				});
			}
			region.curr_ents = current;
		}
	}
}
