//! Common types and the `Kinematics` trait shared by the chain model, tool/base wrappers
//! and the solver.

extern crate nalgebra as na;

use na::Isometry3;
use crate::constraints::Constraints;

/// Pose is used a pose of the robot tcp. It contains both Cartesian position and rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.0);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Six rotary joints of the robot with angles in radians, base to tip.
pub type Joints = [f64; 6];

/// Accumulated transforms of all six joint frames, base to tip. The last one is
/// the end effector pose.
pub type LinkPoses = [Pose; 6];

/// For providing the joint values when there is no better guess.
pub const JOINTS_AT_ZERO: Joints = [0.0; 6];

/// Forward kinematics of a six axis serial arm. Implementations must be pure:
/// the same joint values always produce the same poses, so that a single instance
/// can be shared by all seeds of the multi-start solver.
pub trait Kinematics: Send + Sync {
    /// Pose of the end effector for the given joint angles. Angles outside the joint
    /// limits are accepted.
    fn forward(&self, qs: &Joints) -> Pose;

    /// Poses of all joint frames, base to tip, as needed to place link meshes.
    fn forward_with_joint_poses(&self, qs: &Joints) -> LinkPoses;

    /// Joint limits of this robot.
    fn constraints(&self) -> Constraints;
}
