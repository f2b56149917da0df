//! Command line front end: forward kinematics and multi-start inverse kinematics for
//! the UR3 preset or a robot read from URDF.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use tracing::Level;
use rs_multistart_ik::chain::{joints_from_slice, ChainModel};
use rs_multistart_ik::kinematic_traits::{Joints, Kinematics, Pose};
use rs_multistart_ik::solver::{MultiStartSolver, SolverOptions};
use rs_multistart_ik::urdf::from_urdf_file;
use rs_multistart_ik::utils::{dump_joints, dump_pose, dump_solutions};

/// Forward and inverse kinematics of a six joint arm.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// More output: -v for debug, -vv for trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// URDF or XACRO file with the robot. UR3 is used if not given.
    #[arg(long, global = true)]
    urdf: Option<PathBuf>,

    /// YAML file with solver options.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the end effector pose and joint frame positions.
    Fk {
        /// Six joint angles, radians unless --degrees.
        #[arg(num_args = 6, required = true, allow_negative_numbers = true)]
        joints: Vec<f64>,

        /// Angles are in degrees.
        #[arg(long)]
        degrees: bool,
    },

    /// Find all joint configurations reaching the pose.
    Ik {
        /// Take the target pose from forward kinematics of these joint angles.
        #[arg(long, num_args = 6, allow_negative_numbers = true, conflicts_with_all = ["xyz", "rpy"])]
        joints: Option<Vec<f64>>,

        /// Target position, meters.
        #[arg(long, num_args = 3, allow_negative_numbers = true, requires = "rpy")]
        xyz: Option<Vec<f64>>,

        /// Target orientation as roll, pitch, yaw about fixed x, y, z.
        #[arg(long, num_args = 3, allow_negative_numbers = true, requires = "xyz")]
        rpy: Option<Vec<f64>>,

        /// Angles (joints and rpy) are in degrees.
        #[arg(long)]
        degrees: bool,

        /// Seed of the random seed generator.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn angles(values: &[f64], degrees: bool) -> Vec<f64> {
    values.iter().map(|v| if degrees { v.to_radians() } else { *v }).collect()
}

fn load_robot(cli: &Cli) -> Result<ChainModel> {
    match &cli.urdf {
        Some(path) => from_urdf_file(path, &None)
            .with_context(|| format!("Failed to load robot from {}", path.display())),
        None => Ok(ChainModel::ur3()),
    }
}

fn load_options(cli: &Cli) -> Result<SolverOptions> {
    match &cli.config {
        Some(path) => SolverOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to load solver options from {}", path.display())),
        None => Ok(SolverOptions::default()),
    }
}

fn forward(robot: &ChainModel, joints: &[f64], degrees: bool) -> Result<()> {
    let joints: Joints = joints_from_slice(&angles(joints, degrees))?;
    print!("Joints (degrees): ");
    dump_joints(&joints);
    print!("End effector: ");
    dump_pose(&robot.forward(&joints));
    println!("Joint frames:");
    for (name, pose) in robot.joint_names().iter().zip(robot.link_transforms(&joints).iter()) {
        let p = pose.translation.vector;
        println!("  {:>20}: {:9.5} {:9.5} {:9.5}", name, p.x, p.y, p.z);
    }
    Ok(())
}

fn target_pose(robot: &ChainModel, joints: &Option<Vec<f64>>, xyz: &Option<Vec<f64>>,
               rpy: &Option<Vec<f64>>, degrees: bool) -> Result<Pose> {
    match (joints, xyz, rpy) {
        (Some(joints), _, _) => Ok(robot.forward(&joints_from_slice(&angles(joints, degrees))?)),
        (None, Some(xyz), Some(rpy)) => {
            let rpy = angles(rpy, degrees);
            Ok(Isometry3::from_parts(
                Translation3::new(xyz[0], xyz[1], xyz[2]),
                UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]),
            ))
        }
        _ => bail!("Target must be given either with --joints or with --xyz and --rpy"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let robot = load_robot(&cli)?;
    match &cli.command {
        Commands::Fk { joints, degrees } => forward(&robot, joints, *degrees),
        Commands::Ik { joints, xyz, rpy, degrees, seed } => {
            let mut options = load_options(&cli)?;
            if let Some(seed) = seed {
                options.random_seed = *seed;
            }
            let target = target_pose(&robot, joints, xyz, rpy, *degrees)?;
            print!("Target: ");
            dump_pose(&target);

            let solver = MultiStartSolver::new(Arc::new(robot), options);
            let solutions = solver.solve_default(&target)?;
            println!("{} distinct solutions (degrees):", solutions.len());
            dump_solutions(&solutions);
            Ok(())
        }
    }
}
