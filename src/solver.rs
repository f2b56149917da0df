//! Multi-start damped least squares (Levenberg-Marquardt) inverse kinematics.
//!
//! The pose of a six axis arm is generally reachable by several joint configurations
//! (up to eight for a UR style arm, infinitely many at singularities). A single local
//! optimization only finds the branch nearest to its starting point, so the solver
//! starts one independent local optimization from each of many seeds, collects the
//! ones that converge, drops those outside the joint limits, merges duplicates and
//! returns the distinct configurations in a deterministic order.
//!
//! Every local optimization iterates:
//!
//! ```text
//! e  = [p_target - p ; axis_angle(R_target * R^T)]
//! J  = d pose / d q                     (finite differences)
//! (J^T J + lambda I) dq = J^T e         (damped normal equations)
//! q' = clamp(q + dq)                    (projection to joint limits)
//! ```
//!
//! A step that reduces |e| is accepted and lowers `lambda`, otherwise it is rejected and
//! `lambda` is raised. Seeds share nothing but the immutable robot model and run in
//! parallel on the rayon pool.

extern crate nalgebra as na;

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use na::{Matrix6, Vector6};
use rayon::prelude::*;
use tracing::{debug, trace};
use crate::chain::joints_from_slice;
use crate::constraints::Constraints;
use crate::error::IkError;
use crate::jacobian::compute_jacobian;
use crate::kinematic_traits::{Joints, Kinematics, Pose, JOINTS_AT_ZERO};
use crate::pose::{orientation_error, pose_error, position_error, validate_pose};
use crate::seeds::{generate_seeds, PREDEFINED_SEEDS};
use crate::utils::{joints_to_vector6, normalize_angle, vector6_to_joints};

/// Configuration of the solver. All fields have defaults, so normally only
/// the fields of interest need to be given:
/// ```
/// use rs_multistart_ik::solver::SolverOptions;
/// let options = SolverOptions { random_seeds: 64, ..SolverOptions::default() };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Number of archetype seeds to use, at most 8.
    pub predefined_seeds: usize,

    /// Number of random seeds drawn inside the joint limits.
    pub random_seeds: usize,

    /// Seed of the random generator. The same seed always produces the same solutions.
    pub random_seed: u64,

    /// Iteration cap of a single local optimization.
    pub max_iterations: usize,

    /// Position error (meters) below which a seed is converged.
    pub position_tolerance: f64,

    /// Orientation error (radians) below which a seed is converged.
    pub orientation_tolerance: f64,

    /// Joint perturbation for the finite difference Jacobian, radians.
    pub jacobian_epsilon: f64,

    /// Damping (lambda) at the start of every local optimization.
    pub initial_damping: f64,

    /// Multiplier applied to lambda after a rejected step, must be above 1.
    pub damping_increase: f64,

    /// Multiplier applied to lambda after an accepted step, must be in (0, 1).
    pub damping_decrease: f64,

    /// Lambda never goes below this value.
    pub min_damping: f64,

    /// The seed is abandoned when lambda would exceed this value.
    pub max_damping: f64,

    /// Solutions closer than this in every joint (radians) are the same solution.
    pub dedup_tolerance: f64,

    /// Wrap solution angles into (-pi, pi] where the wrapped value is still inside the limits.
    pub normalize_angles: bool,

    /// Solve seeds on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            predefined_seeds: PREDEFINED_SEEDS.len(),
            random_seeds: 24,
            random_seed: 42,
            max_iterations: 100,
            position_tolerance: 1e-6,
            orientation_tolerance: 1e-5,
            jacobian_epsilon: 1e-6,
            initial_damping: 1e-3,
            damping_increase: 10.0,
            damping_decrease: 0.1,
            min_damping: 1e-9,
            max_damping: 1e6,
            dedup_tolerance: 0.05,
            normalize_angles: true,
            parallel: true,
        }
    }
}

impl SolverOptions {
    /// Total number of seeds a solve without a previous configuration will use.
    pub fn seed_count(&self) -> usize {
        self.predefined_seeds.min(PREDEFINED_SEEDS.len()) + self.random_seeds
    }

    pub fn validate(&self) -> Result<(), IkError> {
        fn positive(name: &str, value: f64) -> Result<(), IkError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(IkError::InvalidOptions(format!("{} must be positive and finite, got {}", name, value)))
            }
        }

        if self.predefined_seeds > PREDEFINED_SEEDS.len() {
            return Err(IkError::InvalidOptions(format!(
                "predefined_seeds must not exceed {}, got {}", PREDEFINED_SEEDS.len(), self.predefined_seeds)));
        }
        if self.max_iterations == 0 {
            return Err(IkError::InvalidOptions("max_iterations must be at least 1".to_string()));
        }
        positive("position_tolerance", self.position_tolerance)?;
        positive("orientation_tolerance", self.orientation_tolerance)?;
        positive("jacobian_epsilon", self.jacobian_epsilon)?;
        positive("initial_damping", self.initial_damping)?;
        positive("min_damping", self.min_damping)?;
        positive("max_damping", self.max_damping)?;
        if !(self.damping_increase.is_finite() && self.damping_increase > 1.0) {
            return Err(IkError::InvalidOptions(format!(
                "damping_increase must be above 1, got {}", self.damping_increase)));
        }
        if !(self.damping_decrease > 0.0 && self.damping_decrease < 1.0) {
            return Err(IkError::InvalidOptions(format!(
                "damping_decrease must be in (0, 1), got {}", self.damping_decrease)));
        }
        if self.min_damping > self.max_damping {
            return Err(IkError::InvalidOptions(format!(
                "min_damping {} is above max_damping {}", self.min_damping, self.max_damping)));
        }
        if !(self.dedup_tolerance.is_finite() && self.dedup_tolerance >= 0.0) {
            return Err(IkError::InvalidOptions(format!(
                "dedup_tolerance must be non-negative, got {}", self.dedup_tolerance)));
        }
        Ok(())
    }

    fn converged(&self, error: &Vector6<f64>) -> bool {
        position_error(error) < self.position_tolerance
            && orientation_error(error) < self.orientation_tolerance
    }
}

/// One configuration reaching the target pose.
#[derive(Debug, Clone, PartialEq)]
pub struct IkSolution {
    /// Joint angles, radians.
    pub joints: Joints,

    /// Pose the robot actually takes with these joints.
    pub pose: Pose,

    /// Distance between achieved and target position, meters.
    pub position_error: f64,

    /// Angle between achieved and target orientation, radians.
    pub orientation_error: f64,

    /// All joints are inside the limits used for the solve.
    pub within_limits: bool,

    /// Iterations the local optimization took.
    pub iterations: usize,

    /// Index of the seed this solution was found from.
    pub seed_index: usize,
}

impl IkSolution {
    /// Combined position and orientation error.
    pub fn residual(&self) -> f64 {
        self.position_error.hypot(self.orientation_error)
    }

    /// Sum of absolute joint differences to the given configuration, radians.
    pub fn displacement(&self, reference: &Joints) -> f64 {
        self.joints.iter().zip(reference.iter()).map(|(a, b)| (a - b).abs()).sum()
    }

    /// True if every joint differs less than `tolerance` from the other solution.
    pub fn same_configuration(&self, other: &Joints, tolerance: f64) -> bool {
        self.joints.iter().zip(other.iter()).all(|(a, b)| (a - b).abs() < tolerance)
    }
}

/// Distinct solutions of one solve, ordered. Empty if the target is not reachable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionSet {
    solutions: Vec<IkSolution>,
}

impl SolutionSet {
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IkSolution> {
        self.solutions.iter()
    }

    /// The first solution in the order of the set.
    pub fn best(&self) -> Option<&IkSolution> {
        self.solutions.first()
    }

    pub fn get(&self, index: usize) -> Option<&IkSolution> {
        self.solutions.get(index)
    }

    pub fn as_slice(&self) -> &[IkSolution] {
        &self.solutions
    }

    /// Joint values of all solutions, in order.
    pub fn joints(&self) -> Vec<Joints> {
        self.solutions.iter().map(|s| s.joints).collect()
    }
}

impl IntoIterator for SolutionSet {
    type Item = IkSolution;
    type IntoIter = std::vec::IntoIter<IkSolution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.into_iter()
    }
}

impl<'a> IntoIterator for &'a SolutionSet {
    type Item = &'a IkSolution;
    type IntoIter = std::slice::Iter<'a, IkSolution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.iter()
    }
}

/// Allows to abandon a running solve from another thread. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Relaxed)
    }
}

/// Inverse kinematics for any robot implementing `Kinematics`, including robots with
/// tool and base.
/// ```
/// use std::sync::Arc;
/// use rs_multistart_ik::chain::ChainModel;
/// use rs_multistart_ik::kinematic_traits::Kinematics;
/// use rs_multistart_ik::solver::{MultiStartSolver, SolverOptions};
///
/// let robot = Arc::new(ChainModel::ur3());
/// let target = robot.forward(&[0.5, -0.8, 1.2, -0.5, -0.9, 0.3]);
/// let solver = MultiStartSolver::new(robot.clone(), SolverOptions::default());
/// let solutions = solver.solve_default(&target).expect("valid input");
/// for solution in &solutions {
///     assert!(solution.position_error < 1e-5);
/// }
/// ```
#[derive(Clone)]
pub struct MultiStartSolver {
    robot: Arc<dyn Kinematics>,
    options: SolverOptions,
}

impl MultiStartSolver {
    pub fn new(robot: Arc<dyn Kinematics>, options: SolverOptions) -> Self {
        MultiStartSolver { robot, options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn robot(&self) -> &Arc<dyn Kinematics> {
        &self.robot
    }

    /// Finds all distinct configurations reaching the target inside the given limits,
    /// ordered by closeness to the all-zero configuration.
    pub fn solve(&self, target: &Pose, limits: &Constraints) -> Result<SolutionSet, IkError> {
        self.run(target, limits, None, &JOINTS_AT_ZERO, None)
    }

    /// As `solve`, using the joint limits of the robot.
    pub fn solve_default(&self, target: &Pose) -> Result<SolutionSet, IkError> {
        self.solve(target, &self.robot.constraints())
    }

    /// As `solve`, when the robot is currently at `previous`. The previous configuration
    /// is tried as the first seed and solutions are ordered by closeness to it.
    pub fn solve_continuing(&self, target: &Pose, limits: &Constraints, previous: &Joints)
                            -> Result<SolutionSet, IkError> {
        joints_from_slice(previous)?;
        self.run(target, limits, Some(*previous), previous, None)
    }

    /// As `solve`, ordered by closeness to `reference`, and abandoned with `IkError::Cancelled`
    /// when the token is cancelled before the solve completes.
    pub fn solve_cancellable(&self, target: &Pose, limits: &Constraints, reference: &Joints,
                             cancel: &CancelToken) -> Result<SolutionSet, IkError> {
        joints_from_slice(reference)?;
        self.run(target, limits, None, reference, Some(cancel))
    }

    /// Single local optimization from the given seed, without deduplication. Returns None
    /// if the seed does not converge.
    pub fn solve_from_seed(&self, target: &Pose, limits: &Constraints, seed: &Joints)
                           -> Result<Option<IkSolution>, IkError> {
        self.validate(target, limits)?;
        joints_from_slice(seed)?;
        Ok(optimize_seed(self.robot.as_ref(), target, limits, seed, 0, &self.options, None))
    }

    fn validate(&self, target: &Pose, limits: &Constraints) -> Result<(), IkError> {
        self.options.validate()?;
        limits.validate()?;
        validate_pose(target)
    }

    fn run(&self, target: &Pose, limits: &Constraints, previous: Option<Joints>,
           reference: &Joints, cancel: Option<&CancelToken>) -> Result<SolutionSet, IkError> {
        self.validate(target, limits)?;

        let mut seeds = Vec::with_capacity(self.options.seed_count() + 1);
        if let Some(previous) = previous {
            seeds.push(limits.clamp(&previous));
        }
        seeds.extend(generate_seeds(limits, &self.options));

        let robot = self.robot.as_ref();
        let options = &self.options;
        let candidates: Vec<Option<IkSolution>> = if options.parallel {
            seeds.par_iter().enumerate()
                .map(|(index, seed)| optimize_seed(robot, target, limits, seed, index, options, cancel))
                .collect()
        } else {
            seeds.iter().enumerate()
                .map(|(index, seed)| optimize_seed(robot, target, limits, seed, index, options, cancel))
                .collect()
        };

        if cancel.is_some_and(|token| token.is_cancelled()) {
            debug!("IK solve cancelled");
            return Err(IkError::Cancelled);
        }

        let converged: Vec<IkSolution> = candidates.into_iter().flatten().collect();
        let converged_count = converged.len();
        let within_limits: Vec<IkSolution> = converged.into_iter()
            .filter(|solution| solution.within_limits)
            .collect();
        let mut solutions = deduplicate(within_limits, options.dedup_tolerance);
        order_solutions(&mut solutions, reference);

        debug!(seeds = seeds.len(), converged = converged_count, distinct = solutions.len(),
            "IK solve finished");

        Ok(SolutionSet { solutions })
    }
}

/// Solves IK for the target with the given limits and options. Convenience for
/// `MultiStartSolver::new(robot, options).solve(target, limits)`.
pub fn solve(robot: Arc<dyn Kinematics>, target: &Pose, limits: &Constraints, options: &SolverOptions)
             -> Result<SolutionSet, IkError> {
    MultiStartSolver::new(robot, options.clone()).solve(target, limits)
}

/// Damped least squares step: solves (J^T J + lambda I) dq = J^T e.
/// For positive lambda the system matrix is positive definite, LU is only the fallback
/// when rounding breaks Cholesky.
fn damped_step(jacobian: &Matrix6<f64>, error: &Vector6<f64>, lambda: f64) -> Option<Vector6<f64>> {
    let jt = jacobian.transpose();
    let system = jt * jacobian + Matrix6::identity() * lambda;
    let rhs = jt * error;
    let step = match system.cholesky() {
        Some(cholesky) => cholesky.solve(&rhs),
        None => system.lu().solve(&rhs)?,
    };
    if step.iter().all(|v| v.is_finite()) {
        Some(step)
    } else {
        None
    }
}

/// Local Levenberg-Marquardt optimization from one seed.
fn optimize_seed(robot: &dyn Kinematics, target: &Pose, limits: &Constraints, seed: &Joints,
                 seed_index: usize, options: &SolverOptions, cancel: Option<&CancelToken>)
                 -> Option<IkSolution> {
    let mut q = limits.clamp(seed);
    let mut error = pose_error(&robot.forward(&q), target);
    let mut lambda = options.initial_damping;
    let mut jacobian: Option<Matrix6<f64>> = None;
    let mut iterations = 0;

    while iterations < options.max_iterations && !options.converged(&error) {
        if cancel.is_some_and(|token| token.is_cancelled()) {
            return None;
        }
        iterations += 1;

        let j = *jacobian.get_or_insert_with(|| compute_jacobian(robot, &q, options.jacobian_epsilon));
        let accepted = match damped_step(&j, &error, lambda) {
            Some(step) => {
                let candidate = limits.clamp(&vector6_to_joints(joints_to_vector6(q) + step));
                let candidate_error = pose_error(&robot.forward(&candidate), target);
                if candidate_error.norm() < error.norm() {
                    q = candidate;
                    error = candidate_error;
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        if accepted {
            jacobian = None;
            lambda = (lambda * options.damping_decrease).max(options.min_damping);
        } else {
            lambda *= options.damping_increase;
            if lambda > options.max_damping {
                break;
            }
        }
    }

    if !options.converged(&error) {
        trace!(seed_index, iterations, position_error = position_error(&error),
            orientation_error = orientation_error(&error), "seed did not converge");
        return None;
    }

    let joints = if options.normalize_angles {
        normalize_within(&q, limits)
    } else {
        q
    };

    // Verify the final configuration with forward kinematics again, normalization
    // changes the values.
    let pose = robot.forward(&joints);
    let error = pose_error(&pose, target);
    if !options.converged(&error) {
        trace!(seed_index, "seed lost convergence after normalization");
        return None;
    }

    trace!(seed_index, iterations, ?joints, "seed converged");
    Some(IkSolution {
        joints,
        pose,
        position_error: position_error(&error),
        orientation_error: orientation_error(&error),
        within_limits: limits.compliant(&joints),
        iterations,
        seed_index,
    })
}

/// Wraps every angle into (-pi, pi] if the wrapped value is still inside the limits.
fn normalize_within(joints: &Joints, limits: &Constraints) -> Joints {
    std::array::from_fn(|i| {
        let wrapped = normalize_angle(joints[i]);
        if wrapped >= limits.from[i] && wrapped <= limits.to[i] {
            wrapped
        } else {
            joints[i]
        }
    })
}

/// Keeps the solutions no closer than `tolerance` to any better one. Candidates are taken by
/// ascending residual, so no kept pair is ever within `tolerance` in every joint.
fn deduplicate(mut candidates: Vec<IkSolution>, tolerance: f64) -> Vec<IkSolution> {
    candidates.sort_by(|a, b| {
        a.residual().total_cmp(&b.residual())
            .then_with(|| compare_joints(&a.joints, &b.joints))
    });
    let mut distinct: Vec<IkSolution> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !distinct.iter().any(|kept| kept.same_configuration(&candidate.joints, tolerance)) {
            distinct.push(candidate);
        }
    }
    distinct
}

/// Ascending total joint displacement from the reference, then ascending residual,
/// then joint values.
fn order_solutions(solutions: &mut [IkSolution], reference: &Joints) {
    solutions.sort_by(|a, b| {
        a.displacement(reference).total_cmp(&b.displacement(reference))
            .then_with(|| a.residual().total_cmp(&b.residual()))
            .then_with(|| compare_joints(&a.joints, &b.joints))
    });
}

fn compare_joints(a: &Joints, b: &Joints) -> Ordering {
    a.iter().zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}
