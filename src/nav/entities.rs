//! The query surface of the entity system consumed by the navigation core.
//! The core never owns entities; it only asks where they are, what faction
//! they belong to and whether they matter for a given query. Games implement
//! [EntityQueries] over their own entity storage; the bundled [EntityIndex]
//! is a straightforward implementation for games without one (and for tests)
//!

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::prelude::*;

/// Opaque handle of a game entity known to the position index
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect)]
pub struct EntityId(pub u32);

/// Diplomatic stance between two factions
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Reflect)]
pub enum DiplomacyState {
	/// The factions leave each other alone
	#[default]
	Peace,
	/// The factions attack each other on sight
	War,
}

/// The entity/position/diplomacy queries the navigation core consumes
pub trait EntityQueries {
	/// Collect the entities whose position lies within an axis-aligned area
	/// of the `x-z` plane, returning how many were written
	fn ents_in_rect(&self, xz_min: Vec2, xz_max: Vec2, out: &mut Vec<EntityId>) -> usize;
	/// Collect the entities whose position lies within a disc of the `x-z`
	/// plane, returning how many were written
	fn ents_in_circle(&self, center: Vec2, radius: f32, out: &mut Vec<EntityId>) -> usize;
	/// World `x-z` position of an entity. Panics for unknown entities
	fn get_xz(&self, ent: EntityId) -> Vec2;
	/// Footprint box of a building entity, `None` for units
	fn current_obb(&self, ent: EntityId) -> Option<Obb>;
	/// Selection disc radius of a unit entity
	fn selection_radius(&self, ent: EntityId) -> f32;
	/// Faction the entity belongs to
	fn faction_id(&self, ent: EntityId) -> u8;
	/// Whether the entity takes part in combat
	fn combatable(&self, ent: EntityId) -> bool;
	/// Whether the entity is a corpse awaiting cleanup
	fn zombie(&self, ent: EntityId) -> bool;
	/// Whether the entity is a scripting marker with no physical presence
	fn marker(&self, ent: EntityId) -> bool;
	/// Diplomatic stance between two factions
	fn diplomacy_state(&self, a: u8, b: u8) -> DiplomacyState;
	/// Bitmask of the factions under player control
	fn player_controllable_mask(&self) -> u16;
	/// Whether the entity is visible under the union of the fog-of-war masks
	/// of the factions in `mask`
	fn fog_obj_visible(&self, mask: u16, ent: EntityId) -> bool;
	/// Bitmask of the factions at war with `faction`
	fn enemy_factions(&self, faction: u8) -> u16 {
		let mut enemies = 0u16;
		for other in 0..MAX_FACTIONS as u8 {
			if other != faction && self.diplomacy_state(faction, other) == DiplomacyState::War {
				enemies |= 1 << other;
			}
		}
		enemies
	}
}

/// Everything the index tracks about one entity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityRecord {
	/// World `x-z` position
	pub xz: Vec2,
	/// Owning faction
	pub faction: u8,
	/// Whether the entity takes part in combat
	pub combatable: bool,
	/// Whether the entity is a corpse awaiting cleanup
	pub zombie: bool,
	/// Whether the entity is a scripting marker with no physical presence
	pub marker: bool,
	/// Selection disc radius (units)
	pub selection_radius: f32,
	/// Footprint box (buildings)
	pub obb: Option<Obb>,
	/// Factions whose fog-of-war currently reveals the entity
	pub fog_mask: u16,
}

impl Default for EntityRecord {
	fn default() -> Self {
		EntityRecord {
			xz: Vec2::ZERO,
			faction: 0,
			combatable: false,
			zombie: false,
			marker: false,
			selection_radius: 1.0,
			obb: None,
			fog_mask: u16::MAX,
		}
	}
}

/// A plain entity position index implementing [EntityQueries] with linear
/// area scans. Entity counts near one chunk are small enough that bucketing
/// has never shown up in profiles
#[derive(Component, Default)]
pub struct EntityIndex {
	/// Tracked entities keyed by handle
	records: BTreeMap<EntityId, EntityRecord>,
	/// Diplomatic stance for every faction pair
	diplomacy: [[DiplomacyState; MAX_FACTIONS]; MAX_FACTIONS],
	/// Bitmask of the factions under player control
	player_mask: u16,
}

impl EntityIndex {
	/// Track an entity, replacing any record already held for it
	pub fn insert(&mut self, ent: EntityId, record: EntityRecord) {
		self.records.insert(ent, record);
	}
	/// Stop tracking an entity
	pub fn remove(&mut self, ent: EntityId) -> bool {
		self.records.remove(&ent).is_some()
	}
	/// Get the record of an entity
	pub fn get(&self, ent: EntityId) -> Option<&EntityRecord> {
		self.records.get(&ent)
	}
	/// Get a mutable record of an entity
	pub fn get_mut(&mut self, ent: EntityId) -> Option<&mut EntityRecord> {
		self.records.get_mut(&ent)
	}
	/// Move an entity to a new `x-z` position
	pub fn set_xz(&mut self, ent: EntityId, xz: Vec2) -> bool {
		match self.records.get_mut(&ent) {
			Some(record) => {
				record.xz = xz;
				true
			}
			None => false,
		}
	}
	/// Set the diplomatic stance of a faction pair, symmetrically
	pub fn set_diplomacy(&mut self, a: u8, b: u8, state: DiplomacyState) {
		self.diplomacy[a as usize][b as usize] = state;
		self.diplomacy[b as usize][a as usize] = state;
	}
	/// Set the bitmask of player-controlled factions
	pub fn set_player_mask(&mut self, mask: u16) {
		self.player_mask = mask;
	}
	/// Fetch a record, panicking for unknown entities: queries against
	/// untracked handles are programmer errors
	fn record(&self, ent: EntityId) -> &EntityRecord {
		match self.records.get(&ent) {
			Some(record) => record,
			None => panic!("Entity {:?} is not tracked by the index", ent),
		}
	}
}

impl EntityQueries for EntityIndex {
	fn ents_in_rect(&self, xz_min: Vec2, xz_max: Vec2, out: &mut Vec<EntityId>) -> usize {
		let before = out.len();
		for (ent, record) in self.records.iter() {
			if record.xz.x >= xz_min.x
				&& record.xz.x <= xz_max.x
				&& record.xz.y >= xz_min.y
				&& record.xz.y <= xz_max.y
			{
				out.push(*ent);
			}
		}
		out.len() - before
	}
	fn ents_in_circle(&self, center: Vec2, radius: f32, out: &mut Vec<EntityId>) -> usize {
		let before = out.len();
		let radius_sq = radius * radius;
		for (ent, record) in self.records.iter() {
			if record.xz.distance_squared(center) <= radius_sq {
				out.push(*ent);
			}
		}
		out.len() - before
	}
	fn get_xz(&self, ent: EntityId) -> Vec2 {
		self.record(ent).xz
	}
	fn current_obb(&self, ent: EntityId) -> Option<Obb> {
		self.record(ent).obb
	}
	fn selection_radius(&self, ent: EntityId) -> f32 {
		self.record(ent).selection_radius
	}
	fn faction_id(&self, ent: EntityId) -> u8 {
		self.record(ent).faction
	}
	fn combatable(&self, ent: EntityId) -> bool {
		self.record(ent).combatable
	}
	fn zombie(&self, ent: EntityId) -> bool {
		self.record(ent).zombie
	}
	fn marker(&self, ent: EntityId) -> bool {
		self.record(ent).marker
	}
	fn diplomacy_state(&self, a: u8, b: u8) -> DiplomacyState {
		self.diplomacy[a as usize][b as usize]
	}
	fn player_controllable_mask(&self) -> u16 {
		self.player_mask
	}
	fn fog_obj_visible(&self, mask: u16, ent: EntityId) -> bool {
		self.record(ent).fog_mask & mask != 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn rect_query_filters_by_position() {
		let mut index = EntityIndex::default();
		index.insert(
			EntityId(1),
			EntityRecord {
				xz: Vec2::new(1.0, 1.0),
				..Default::default()
			},
		);
		index.insert(
			EntityId(2),
			EntityRecord {
				xz: Vec2::new(50.0, 50.0),
				..Default::default()
			},
		);
		let mut out = Vec::new();
		let written = index.ents_in_rect(Vec2::ZERO, Vec2::new(10.0, 10.0), &mut out);
		assert_eq!(1, written);
		assert_eq!(vec![EntityId(1)], out);
	}
	#[test]
	fn circle_query_uses_distance() {
		let mut index = EntityIndex::default();
		index.insert(
			EntityId(1),
			EntityRecord {
				xz: Vec2::new(3.0, 4.0),
				..Default::default()
			},
		);
		let mut out = Vec::new();
		index.ents_in_circle(Vec2::ZERO, 5.0, &mut out);
		assert_eq!(1, out.len());
		out.clear();
		index.ents_in_circle(Vec2::ZERO, 4.9, &mut out);
		assert!(out.is_empty());
	}
	#[test]
	fn diplomacy_is_symmetric() {
		let mut index = EntityIndex::default();
		index.set_diplomacy(1, 2, DiplomacyState::War);
		assert_eq!(DiplomacyState::War, index.diplomacy_state(2, 1));
		assert_eq!(DiplomacyState::Peace, index.diplomacy_state(1, 3));
	}
	#[test]
	fn enemy_factions_mask_from_diplomacy() {
		let mut index = EntityIndex::default();
		index.set_diplomacy(0, 2, DiplomacyState::War);
		index.set_diplomacy(0, 5, DiplomacyState::War);
		let actual = (1 << 2) | (1 << 5);
		assert_eq!(actual, index.enemy_factions(0));
		assert_eq!(1, index.enemy_factions(2));
	}
	#[test]
	fn fog_mask_gates_visibility() {
		let mut index = EntityIndex::default();
		index.insert(
			EntityId(7),
			EntityRecord {
				fog_mask: 0b0010,
				..Default::default()
			},
		);
		assert!(index.fog_obj_visible(0b0010, EntityId(7)));
		assert!(!index.fog_obj_visible(0b0001, EntityId(7)));
	}
}
