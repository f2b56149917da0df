//! Starting configurations for the multi-start solver.
//!
//! A handful of hand-picked archetypes reliably land on the common solution branches
//! (elbow up or down, wrist flipped, base turned around). Random configurations inside
//! the joint limits then cover whatever the archetypes miss. The random part comes from
//! a seeded generator so the same options always produce the same seeds.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::constraints::Constraints;
use crate::kinematic_traits::Joints;
use crate::solver::SolverOptions;

/// Archetype configurations of a UR style arm.
pub const PREDEFINED_SEEDS: [Joints; 8] = [
    [0.0, -FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2, -FRAC_PI_2, 0.0], // Ready
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],                           // Home
    [0.0, -FRAC_PI_2, -FRAC_PI_2, 0.0, FRAC_PI_2, 0.0],       // Elbow up
    [PI, -FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2, 0.0],  // Rear
    [0.0, -FRAC_PI_4, FRAC_PI_4, -FRAC_PI_2, -FRAC_PI_2, 0.0], // Mid
    [PI, -FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2, FRAC_PI_2, 0.0],  // Rear elbow
    [0.0, -PI, FRAC_PI_2, 0.0, -FRAC_PI_2, PI],               // Flip
    [-PI, -FRAC_PI_2, FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2, 0.0], // Left rear
];

/// Seeds for one solve: `options.predefined_seeds` archetypes projected into the limits,
/// followed by `options.random_seeds` uniform samples inside the limits.
pub fn generate_seeds(limits: &Constraints, options: &SolverOptions) -> Vec<Joints> {
    let predefined = options.predefined_seeds.min(PREDEFINED_SEEDS.len());
    let mut seeds = Vec::with_capacity(predefined + options.random_seeds);

    seeds.extend(PREDEFINED_SEEDS[..predefined].iter().map(|seed| limits.clamp(seed)));

    let mut rng = StdRng::seed_from_u64(options.random_seed);
    seeds.extend((0..options.random_seeds).map(|_| limits.sample(&mut rng)));

    seeds
}
