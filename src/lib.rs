pub use cgmath;
pub use effect::{EffectKind, TransientEffect};
pub use envelope::{
    build_corridor, build_envelope, edge_envelope, Envelope, EnvelopeParams, Location, Progress,
};
pub use error::GraphError;
pub use graph::{GraphParams, SpatialEdge, SpatialGraph, SpatialVertex};
pub use index::CorridorIndex;
pub use marker::{Marker, MarkerEvent};
pub use simulation::{Controls, Simulation};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;
pub use vehicle::{
    Observation, Vehicle, VehicleAttributes, FLAG_DAMAGED, FLAG_OFF_TRACK, MAX_VISITED_LOCATIONS,
};
pub use world::{GenerationTask, World, WorldConfig, WorldGenerator, WORLD_STAGES};

mod debug;
pub mod effect;
pub mod envelope;
mod error;
pub mod graph;
mod index;
mod marker;
pub mod math;
mod simulation;
mod util;
mod vehicle;
pub mod world;

new_key_type! {
    /// Unique ID of a vertex of a [SpatialGraph].
    pub struct VertexId;
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
