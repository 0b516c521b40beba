#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::{debug_circle, debug_polygon};
use crate::effect::TransientEffect;
use crate::envelope::{Envelope, Location};
use crate::marker::{Marker, MarkerEvent};
use crate::vehicle::{Observation, Vehicle, VehicleAttributes};
use crate::{VehicleId, VehicleSet};
use log::{debug, trace};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Agents slower than this, in km/h, are culled.
const MIN_AGENT_SPEED: f64 = 5.0;

/// The length of the lap marker along the road, in m.
const LAP_MARKER_HEIGHT: f64 = 2.0;

/// The driving inputs of an agent for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Controls {
    /// The throttle between -1 and 1.
    pub throttle: f64,
    /// The steering between -1 and 1, positive is anticlockwise.
    pub steering: f64,
}

/// A batch of agents learning to drive along a shared corridor.
///
/// Each tick, the caller reads the agents' observations, feeds back their controls with
/// [Simulation::apply_controls], advances the simulation with [Simulation::step]
/// and ranks the surviving agents with [Simulation::select_best].
pub struct Simulation {
    /// The attributes of every agent.
    attributes: VehicleAttributes,
    /// The smallest radius of the agents' nearest segment queries, in m.
    min_radius: f64,
    /// The corridor the agents drive in.
    corridor: Arc<Envelope>,
    /// The agents being simulated.
    agents: VehicleSet,
    /// The marker counting laps of the best agent.
    marker: Option<Marker>,
    /// The effects currently playing.
    effects: Vec<TransientEffect>,
    /// The best agent, as of the last call to `select_best`.
    best_agent: Option<VehicleId>,
    /// The spawn location of the best agent, as of the last call to `select_best`.
    last_spawn_location: Option<Location>,
    /// Whether `last_spawn_location` changed during the last call to `select_best`.
    spawn_location_changed: bool,
    /// The number of resets.
    episode: usize,
    /// The number of laps completed by the best agent.
    lap: usize,
    /// The number of steps since the last reset.
    frame: usize,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a simulation without agents.
    ///
    /// # Parameters
    /// * `corridor` - The corridor the agents drive in
    /// * `attributes` - The attributes of every agent
    /// * `min_radius` - The smallest radius of the agents' nearest segment queries, in m
    pub fn new(corridor: Arc<Envelope>, attributes: VehicleAttributes, min_radius: f64) -> Self {
        Self {
            attributes,
            min_radius,
            corridor,
            agents: Default::default(),
            marker: None,
            effects: vec![],
            best_agent: None,
            last_spawn_location: None,
            spawn_location_changed: false,
            episode: 0,
            lap: 0,
            frame: 0,
            #[cfg(feature = "debug")]
            debug: Default::default(),
        }
    }

    /// Replaces every agent with `count` new agents at the start of the corridor.
    pub fn spawn_agents(&mut self, count: usize) {
        debug!("Spawning {} agents", count);
        self.agents.clear();
        self.best_agent = None;
        for _ in 0..count {
            self.agents.insert(Vehicle::new(
                self.attributes,
                self.corridor.clone(),
                self.min_radius,
            ));
        }
    }

    /// Moves the simulation to a new corridor, respawning every agent at its start.
    pub fn set_corridor(&mut self, corridor: Arc<Envelope>) {
        self.corridor = corridor;
        self.last_spawn_location = None;
        self.spawn_location_changed = false;
        self.marker = None;
        self.spawn_agents(self.agents.len());
    }

    /// The corridor the agents drive in.
    pub fn corridor(&self) -> &Arc<Envelope> {
        &self.corridor
    }

    /// Applies the controls of every agent, in the order of [Simulation::iter_agents].
    ///
    /// # Panics
    /// Panics if there isn't exactly one set of controls per agent.
    pub fn apply_controls(&mut self, controls: &[Controls]) {
        assert_eq!(
            controls.len(),
            self.agents.len(),
            "Expected one set of controls per agent"
        );
        for (agent, controls) in self.agents.values_mut().zip(controls) {
            agent.push_throttle(controls.throttle);
            agent.turn_wheel(controls.steering);
        }
    }

    /// Advances the simulation by one tick.
    ///
    /// Live agents are updated first, then the lap marker checks the best agent,
    /// then the effects play out. Finally, every live agent which is no longer viable
    /// loses all its life and explodes.
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    pub fn step(&mut self, dt: f64) {
        for agent in self.agents.values_mut().filter(|agent| agent.is_alive()) {
            agent.update(dt);
        }

        self.update_marker();

        for effect in &mut self.effects {
            effect.update();
        }
        self.effects.retain(TransientEffect::is_alive);

        let max_life = self.attributes.max_life;
        for (id, agent) in &mut self.agents {
            if agent.is_alive() && !agent.is_viable(MIN_AGENT_SPEED) {
                trace!("Agent {:?} crashed", id);
                agent.hit(max_life);
                self.effects.push(TransientEffect::explosion(agent.position()));
            }
        }

        self.frame += 1;

        if let Some(marker) = &self.marker {
            debug_polygon("marker", marker.polygon());
        }
        for effect in &self.effects {
            debug_circle("explosion", effect.position(), effect.radius());
        }

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Counts a lap whenever the best agent enters the lap marker.
    fn update_marker(&mut self) {
        let (marker, best) = match (&self.marker, self.best_agent) {
            (Some(marker), Some(best)) => (marker, best),
            _ => return,
        };
        let agent = match self.agents.get(best) {
            Some(agent) => agent,
            None => return,
        };
        let event = marker.crossing(agent.prev_position(), agent.curr_position());
        if event == Some(MarkerEvent::Enter) {
            self.lap += 1;
            debug!("Lap {} completed", self.lap);
        }
    }

    /// Ranks the live agents, returning the one with the highest score.
    ///
    /// The spawn location of the best agent is remembered, and every agent
    /// respawns there on the next [Simulation::reset].
    pub fn select_best(&mut self, score: impl Fn(&Vehicle) -> f64) -> Option<VehicleId> {
        self.best_agent = self
            .agents
            .iter()
            .filter(|(_, agent)| agent.is_alive())
            .map(|(id, agent)| (id, score(agent)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);

        if let Some(best) = self.best_agent {
            let spawn = self.agents[best].spawn_location();
            self.spawn_location_changed = self.last_spawn_location != Some(spawn);
            self.last_spawn_location = Some(spawn);
        }
        self.best_agent
    }

    /// Starts a new episode: every agent respawns at the best agent's last spawn location,
    /// the effects are cleared and a lap marker is placed at the spawn location.
    pub fn reset(&mut self) {
        for agent in self.agents.values_mut() {
            agent.reset(self.last_spawn_location);
        }
        self.effects.clear();
        self.best_agent = None;
        self.episode += 1;
        self.frame = 0;

        let width = 0.5 * self.corridor.width();
        self.marker = self.agents.values().next().map(|agent| {
            Marker::new(
                agent.spawn_location(),
                width,
                LAP_MARKER_HEIGHT,
                Some(agent.heading()),
            )
        });
        debug!("Starting episode {}", self.episode);
    }

    /// Whether every agent has crashed.
    pub fn is_terminated(&self) -> bool {
        self.agents.values().all(|agent| !agent.is_alive())
    }

    /// The observations of every agent, in the order of [Simulation::iter_agents].
    pub fn observations(&self) -> Vec<Observation> {
        self.agents.values().map(Vehicle::observation).collect()
    }

    /// Returns an iterator over all the agents.
    pub fn iter_agents(&self) -> impl Iterator<Item = (VehicleId, &Vehicle)> {
        self.agents.iter()
    }

    /// Gets a reference to the agent with the given ID.
    pub fn get_agent(&self, id: VehicleId) -> &Vehicle {
        &self.agents[id]
    }

    /// The number of agents, alive or not.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// The best agent, as of the last call to [Simulation::select_best].
    pub fn best_agent(&self) -> Option<VehicleId> {
        self.best_agent
    }

    /// The spawn location agents will respawn at.
    pub fn last_spawn_location(&self) -> Option<Location> {
        self.last_spawn_location
    }

    /// Whether the last call to [Simulation::select_best] moved the spawn location.
    pub fn has_spawn_location_changed(&self) -> bool {
        self.spawn_location_changed
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn effects(&self) -> &[TransientEffect] {
        &self.effects
    }

    /// The number of laps completed by the best agent.
    pub fn lap(&self) -> usize {
        self.lap
    }

    /// The number of resets so far.
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// The number of steps since the last reset.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::envelope::build_corridor;
    use crate::graph::SpatialGraph;
    use crate::math::Point2d;

    const DT: f64 = 1.0 / 60.0;

    fn simulation(agents: usize) -> Simulation {
        let mut path = SpatialGraph::new();
        let ids = [(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (300.0, 0.0)]
            .map(|(x, y)| path.add_vertex(Point2d::new(x, y)));
        for pair in ids.windows(2) {
            path.add_edge(pair[0], pair[1]);
        }
        let corridor = Arc::new(build_corridor(&path, &Default::default(), None));
        let mut sim = Simulation::new(corridor, Default::default(), 50.0);
        sim.spawn_agents(agents);
        sim.reset();
        sim
    }

    fn full_throttle(sim: &mut Simulation) {
        let controls = vec![
            Controls {
                throttle: 1.0,
                steering: 0.0,
            };
            sim.agent_count()
        ];
        sim.apply_controls(&controls);
    }

    #[test]
    fn slow_agents_are_culled() {
        let mut sim = simulation(3);
        assert_eq!(sim.observations().len(), 3);
        assert!(sim.marker().is_some());

        // Standing still is not viable
        sim.apply_controls(&[Controls::default(); 3]);
        sim.step(DT);
        assert!(sim.is_terminated());
        assert_eq!(sim.effects().len(), 3);
        assert_eq!(sim.select_best(|agent| agent.total_distance_km()), None);

        // The explosions fade out
        for _ in 0..30 {
            sim.step(DT);
        }
        assert!(sim.effects().is_empty());
    }

    #[test]
    fn best_agent_sets_spawn_location() {
        let mut sim = simulation(2);
        // Get up to speed while ranked by distance
        full_throttle(&mut sim);
        let ids = sim.iter_agents().map(|(id, _)| id).collect::<Vec<_>>();

        let mut frames = 0;
        while sim.get_agent(ids[0]).position().x < 150.0 {
            sim.step(DT);
            assert!(!sim.is_terminated());
            assert!(sim.select_best(|agent| agent.total_distance_km()).is_some());
            frames += 1;
            assert!(frames < 1000);
        }

        // The agents are now on the second segment, so they respawn at the first
        let spawn = sim.last_spawn_location().unwrap();
        assert_eq!(spawn.point, Point2d::new(1.0, 0.0));

        sim.reset();
        assert_eq!(sim.episode(), 2);
        assert_eq!(sim.frame(), 0);
        assert!(sim.best_agent().is_none());
        for (_, agent) in sim.iter_agents() {
            assert!(agent.is_alive());
            assert!((agent.position().x - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn laps_are_counted_at_the_marker() {
        let mut sim = simulation(1);
        full_throttle(&mut sim);
        sim.step(DT);
        sim.select_best(|agent| agent.total_distance_km());

        // Move the marker ahead of the agent
        let marker = sim.marker().unwrap().clone();
        let location = Location {
            segment: marker.location().segment,
            point: Point2d::new(50.0, 0.0),
        };
        sim.marker = Some(Marker::new(location, marker.width(), marker.height(), None));

        while sim.get_agent(sim.best_agent().unwrap()).position().x < 60.0 {
            sim.step(DT);
            sim.select_best(|agent| agent.total_distance_km());
        }
        assert_eq!(sim.lap(), 1);
    }

    #[cfg(feature = "debug")]
    #[test]
    fn debug_frame_shows_marker_and_explosions() {
        let mut sim = simulation(1);
        sim.apply_controls(&[Controls::default()]);
        sim.step(DT);

        let frame = sim.debug();
        let shapes = frame.as_array().unwrap();
        let named = |name: &str| shapes.iter().filter(|shape| shape["name"] == name).count();
        assert_eq!(named("marker"), 1);
        assert_eq!(named("explosion"), 1);
        assert_eq!(named("vehicle"), 1);
    }

    #[test]
    #[should_panic]
    fn controls_must_match_agents() {
        let mut sim = simulation(2);
        sim.apply_controls(&[Controls::default()]);
    }
}
