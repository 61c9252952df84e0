//! Defines the Bevy [Plugin] wiring the navigation core into an app: the
//! events games use to request flow fields and observe region crossings, the
//! per-frame systems servicing them and the bundle assembling all navigation
//! state on one entity
//!

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::prelude::*;

/// An entity crossed into a region since the previous tick
#[derive(Event, Clone, Debug)]
pub struct EventEnteredRegion {
	/// Name of the region
	pub region: String,
	/// Entity that entered
	pub entity: EntityId,
}

/// An entity crossed out of a region since the previous tick
#[derive(Event, Clone, Debug)]
pub struct EventExitedRegion {
	/// Name of the region
	pub region: String,
	/// Entity that exited
	pub entity: EntityId,
}

/// Request a flow field to be built into the cache
#[derive(Event, Clone, Debug)]
pub struct EventFlowFieldRequest {
	/// Chunk to route within
	pub chunk: ChunkID,
	/// Navigation layer of the chunk
	pub layer: NavLayer,
	/// Faction of the mover, driving the enemy-occupancy passability
	/// exception
	pub faction: Option<u8>,
	/// What to route towards
	pub target: FieldTarget,
}

/// Built [FlowField]s keyed by their [FlowFieldId] so that any number of
/// actors sharing a `(chunk, target, layer)` triple read the same field
#[derive(Component, Default)]
pub struct FlowFieldCache(BTreeMap<FlowFieldId, FlowField>);

impl FlowFieldCache {
	/// Get a [FlowField] by identity. Returns [None] if the cache doesn't
	/// contain a record
	pub fn get_field(&self, id: FlowFieldId) -> Option<&FlowField> {
		self.0.get(&id)
	}
	/// Insert a [FlowField] under its identity
	pub fn insert_field(&mut self, id: FlowFieldId, field: FlowField) {
		self.0.insert(id, field);
	}
	/// Remove a [FlowField] (when chunk data changed and it needs
	/// regenerating)
	pub fn remove_field(&mut self, id: FlowFieldId) {
		self.0.remove(&id);
	}
	/// Number of cached fields
	pub fn len(&self) -> usize {
		self.0.len()
	}
	/// Whether the cache holds no fields
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// All navigation state of one map on one entity
#[derive(Bundle)]
pub struct ChunkNavBundle {
	/// Chunk grids and world geometry
	pub world: NavigationWorld,
	/// Entity position/diplomacy/fog index
	pub entities: EntityIndex,
	/// Named occupancy-tracking regions
	pub regions: RegionRegistry,
	/// Built flow fields keyed by identity
	pub cache: FlowFieldCache,
}

impl ChunkNavBundle {
	/// Create a new instance of [ChunkNavBundle] with open chunk grids for
	/// the given layers
	pub fn new(geometry: MapGeometry, map_pos: Vec3, layers: &[NavLayer]) -> Self {
		ChunkNavBundle {
			world: NavigationWorld::new(geometry, map_pos, layers),
			entities: EntityIndex::default(),
			regions: RegionRegistry::default(),
			cache: FlowFieldCache::default(),
		}
	}
}

/// Tick every region registry against its entity index and forward the
/// membership deltas as events
pub fn update_regions(
	mut registries: Query<(&mut RegionRegistry, &EntityIndex)>,
	mut entered: EventWriter<EventEnteredRegion>,
	mut exited: EventWriter<EventExitedRegion>,
) {
	for (mut registry, index) in registries.iter_mut() {
		let mut events = Vec::new();
		registry.update(index, &mut events);
		for event in events {
			match event.kind {
				RegionEventKind::Entered => {
					entered.write(EventEnteredRegion {
						region: event.region,
						entity: event.entity,
					});
				}
				RegionEventKind::Exited => {
					exited.write(EventExitedRegion {
						region: event.region,
						entity: event.entity,
					});
				}
			}
		}
	}
}

/// Build every requested flow field that is not already cached
pub fn process_flow_field_requests(
	mut requests: EventReader<EventFlowFieldRequest>,
	mut caches: Query<(&NavigationWorld, &EntityIndex, &mut FlowFieldCache)>,
) {
	for request in requests.read() {
		for (world, index, mut cache) in caches.iter_mut() {
			let id = FlowFieldId::new(request.chunk, &request.target, request.layer);
			if cache.get_field(id).is_some() {
				continue;
			}
			let mut field = FlowField::new(request.chunk);
			world.flow_field_update(
				request.chunk,
				request.layer,
				request.faction,
				&request.target,
				index,
				&mut field,
			);
			cache.insert_field(id, field);
		}
	}
}

/// Registers the navigation events and the per-frame systems
pub struct ChunkNavPlugin;

impl Plugin for ChunkNavPlugin {
	fn build(&self, app: &mut App) {
		app.add_event::<EventEnteredRegion>()
			.add_event::<EventExitedRegion>()
			.add_event::<EventFlowFieldRequest>()
			.add_systems(Update, (update_regions, process_flow_field_requests));
	}
}
