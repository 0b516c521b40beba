use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use road_sim::{Controls, GraphError, Simulation, WorldConfig, WorldGenerator};

const NUM_AGENTS: usize = 100;
const NUM_FRAMES: u32 = 1000;
const DT: f64 = 1.0 / 60.0;

fn main() -> Result<(), GraphError> {
    println!("Generating world...");
    let task = WorldGenerator::spawn(WorldConfig::default(), 42);
    while !task.is_finished() {
        println!("{:.0}%", 100.0 * task.progress());
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    let world = task.join()?;

    let mut rng = StdRng::seed_from_u64(42);
    let corridor = match (0..100).find_map(|_| world.random_corridor(&mut rng)) {
        Some(corridor) => Arc::new(corridor),
        None => {
            println!("No road leads anywhere");
            return Ok(());
        }
    };
    let config = world.config();
    let mut sim = Simulation::new(
        corridor,
        Default::default(),
        config.query_radius_floor(),
    );
    sim.spawn_agents(NUM_AGENTS);
    sim.reset();

    println!("Simulating...");
    loop {
        let start = Instant::now();
        for _ in 0..NUM_FRAMES {
            if sim.is_terminated() {
                sim.reset();
            }
            let controls = sim
                .observations()
                .iter()
                .map(|obs| {
                    // Steer away from the side closing in
                    let (right, left) = obs.rays.split_at(obs.rays.len() / 2);
                    Controls {
                        throttle: 1.0 - obs.speed,
                        steering: right.iter().sum::<f64>() - left.iter().sum::<f64>(),
                    }
                })
                .collect::<Vec<_>>();
            sim.apply_controls(&controls);
            sim.step(DT);
            sim.select_best(|agent| agent.total_distance_km());
        }
        let frame = start.elapsed() / NUM_FRAMES;
        println!(
            "Avg. frame: {:?} --> {:.1}x speedup (episode {}, lap {}, {} alive)",
            frame,
            DT / frame.as_secs_f64(),
            sim.episode(),
            sim.lap(),
            sim.iter_agents().filter(|(_, agent)| agent.is_alive()).count(),
        )
    }
}
