//! The procedurally generated world: roads, their borders and the scenery around them.

use crate::envelope::{
    build_corridor, build_envelope, Envelope, EnvelopeParams, Location, Progress, ENVELOPE_STAGES,
};
use crate::error::GraphError;
use crate::graph::{GraphParams, SpatialGraph};
use crate::math::Point2d;
use crate::util::Interval;
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;

pub use scenery::{House, SceneryParams, Tree, HOUSE_SIZES, TREE_SIZES};

mod scenery;

/// The number of progress stages of [World::generate]:
/// the graph, the envelope stages and the scenery.
pub const WORLD_STAGES: usize = ENVELOPE_STAGES + 2;

/// The parameters of world generation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldConfig {
    pub graph: GraphParams,
    pub envelope: EnvelopeParams,
    pub scenery: SceneryParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let graph = GraphParams::default();
        Self {
            graph,
            envelope: EnvelopeParams {
                bounds: Interval::new(-graph.half_width, graph.half_width),
                ..Default::default()
            },
            scenery: Default::default(),
        }
    }
}

impl WorldConfig {
    /// The road width in m.
    pub fn road_width(&self) -> f64 {
        self.envelope.width
    }

    /// The smallest radius of nearest segment queries, in m.
    pub fn query_radius_floor(&self) -> f64 {
        self.graph.half_width / 10.0
    }
}

/// A road network along with everything built around it.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    roads: SpatialGraph,
    borders: Arc<Envelope>,
    anchors: Vec<Point2d>,
    houses: Vec<House>,
    trees: Vec<Tree>,
}

impl World {
    /// Generates a random world.
    ///
    /// # Parameters
    /// * `rng` - The source of randomness
    /// * `config` - The world parameters
    /// * `progress` - Advanced by [WORLD_STAGES] stages as generation proceeds
    pub fn generate(
        rng: &mut impl Rng,
        config: &WorldConfig,
        progress: Option<&Progress>,
    ) -> Result<Self, GraphError> {
        info!("Generating world");
        let roads = SpatialGraph::generate_random(rng, &config.graph)?;
        if let Some(progress) = progress {
            progress.advance();
        }

        let (borders, anchors) = build_envelope(&roads, &config.envelope, progress);

        let houses = scenery::place_houses(rng, &anchors, &borders, &config.scenery);
        let trees = scenery::place_trees(rng, &anchors, &borders, &config.scenery);
        if let Some(progress) = progress {
            progress.advance();
        }
        info!(
            "Generated world with {} border segments, {} houses and {} trees",
            borders.segments().len(),
            houses.len(),
            trees.len()
        );

        Ok(Self {
            config: *config,
            roads,
            borders: Arc::new(borders),
            anchors,
            houses,
            trees,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The road network.
    pub fn roads(&self) -> &SpatialGraph {
        &self.roads
    }

    /// The envelope around every road.
    pub fn borders(&self) -> &Arc<Envelope> {
        &self.borders
    }

    /// The grid points lying outside of every road.
    pub fn anchors(&self) -> &[Point2d] {
        &self.anchors
    }

    pub fn houses(&self) -> &[House] {
        &self.houses
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Builds a corridor along the shortest path from a random junction to the junction
    /// farthest from it which can be reached.
    /// Returns `None` if the chosen junction is isolated.
    pub fn random_corridor(&self, rng: &mut impl Rng) -> Option<Envelope> {
        let start = *self.roads.vertex_ids().choose(rng)?;
        let stop = self.roads.farthest_reachable(start)?;
        let path = self.roads.shortest_path(start, stop)?;
        info!("Generating corridor with {} edges", path.edges().len());
        Some(build_corridor(&path, &self.config.envelope, None))
    }

    /// Builds a corridor from one location to another, through the junctions nearest to each.
    ///
    /// The corridor starts on `a`'s segment and ends on `b`'s segment.
    /// Returns `None` if there is no route between the two.
    pub fn corridor_between(&self, a: Location, b: Location) -> Option<Envelope> {
        let start = self.roads.nearest_vertex(a.segment.closest_end(a.point))?;
        let stop = self.roads.nearest_vertex(b.segment.closest_end(b.point))?;
        let mut path = self.roads.shortest_path(start, stop)?;

        if path.first_segment() != Some(a.segment) {
            path.prepend_vertex(a.segment.farthest_end(a.point));
        }
        if path.last_segment() != Some(b.segment) {
            path.append_vertex(b.segment.farthest_end(b.point));
        }
        info!("Generating corridor with {} edges", path.edges().len());
        Some(build_corridor(&path, &self.config.envelope, None))
    }
}

/// Generates worlds on a background thread.
pub struct WorldGenerator;

impl WorldGenerator {
    /// Starts generating a world from the given seed.
    pub fn spawn(config: WorldConfig, seed: u64) -> GenerationTask {
        let progress = Arc::new(Progress::new(WORLD_STAGES));
        let handle = {
            let progress = progress.clone();
            std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                World::generate(&mut rng, &config, Some(progress.as_ref()))
            })
        };
        GenerationTask { progress, handle }
    }
}

/// A world being generated in the background.
pub struct GenerationTask {
    progress: Arc<Progress>,
    handle: JoinHandle<Result<World, GraphError>>,
}

impl GenerationTask {
    /// The fraction of generation completed, between 0 and 1.
    pub fn progress(&self) -> f64 {
        self.progress.fraction()
    }

    /// Whether generation has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the world to be generated.
    ///
    /// # Panics
    /// Panics if the generating thread panicked.
    pub fn join(self) -> Result<World, GraphError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
