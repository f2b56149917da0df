//! Forward kinematics and multi-start inverse kinematics for six joint serial arms
//! described as URDF style joint chains.
//!
//! Closed form solvers only exist for particular geometries. This crate instead solves
//! inverse kinematics numerically, for any chain of six revolute joints about principal axes,
//! and tries hard to find every solution, not just the nearest one: a damped least squares
//! (Levenberg-Marquardt) optimization is started from many seeds in parallel, and the
//! converged configurations are filtered, deduplicated and ordered.
//!
//! # Features
//!
//! - Forward kinematics of the end effector and all joint frames.
//! - Multi-start inverse kinematics returning all distinct configurations within joint limits.
//!   Results are deterministic: the random seeds come from a seeded generator.
//! - Solutions are cross-checked with forward kinematics, and angles are normalized where
//!   joint limits allow it.
//! - To follow a trajectory, the previous joint positions can be given; they are tried first
//!   and solutions are sorted by proximity to them (closest first).
//! - The robot can be equipped with the tool and placed on the base, solving for the
//!   tool center point rather than the flange.
//! - Long running solves can be cancelled from another thread.
//! - Universal Robots UR3, UR5 and UR10 presets, chains from URDF and solver options from YAML.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rs_multistart_ik::chain::ChainModel;
//! use rs_multistart_ik::kinematic_traits::Kinematics;
//! use rs_multistart_ik::solver::{MultiStartSolver, SolverOptions};
//!
//! let robot = Arc::new(ChainModel::ur3());
//! let target = robot.forward(&[0.5, -0.8, 1.2, -0.5, -0.9, 0.3]);
//!
//! let solver = MultiStartSolver::new(robot, SolverOptions::default());
//! let solutions = solver.solve_default(&target).expect("valid input");
//! assert!(!solutions.is_empty());
//! rs_multistart_ik::utils::dump_solutions(&solutions);
//! ```

pub mod kinematic_traits;
pub mod error;
pub mod constraints;
pub mod chain;
pub mod pose;
pub mod jacobian;
pub mod seeds;
pub mod solver;

pub mod parameters;
pub mod parameters_robots;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;

#[path = "utils/utils.rs"]
pub mod utils;

pub mod tool;

#[cfg(feature = "allow_filesystem")]
pub mod urdf;
#[cfg(feature = "allow_filesystem")]
pub mod parameter_error;
