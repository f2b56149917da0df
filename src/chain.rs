//! Kinematic chain of six revolute joints, composed the way URDF composes them:
//! every joint first applies its fixed origin transform (relative to the parent link),
//! then rotates about its own axis by the joint angle.
//!
//! ```text
//! T = O1 * R1(q1) * O2 * R2(q2) * ... * O6 * R6(q6)
//! ```
//!
//! The model holds no mutable state, every call is a pure function of the joint values.

extern crate nalgebra as na;

use na::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use crate::constraints::Constraints;
use crate::error::IkError;
use crate::kinematic_traits::{Joints, Kinematics, LinkPoses, Pose};

/// Principal axis the joint rotates about, in the joint's own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(&self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    /// Interprets URDF axis vector like `0 -1 0`. Returns the axis and the direction
    /// (+1 or -1), or None if the vector is not aligned with exactly one principal axis.
    pub fn from_vector(xyz: &[f64; 3]) -> Option<(Axis, f64)> {
        match *xyz {
            [x, 0.0, 0.0] if x != 0.0 => Some((Axis::X, x.signum())),
            [0.0, y, 0.0] if y != 0.0 => Some((Axis::Y, y.signum())),
            [0.0, 0.0, z] if z != 0.0 => Some((Axis::Z, z.signum())),
            _ => None,
        }
    }
}

/// One revolute joint of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct JointSpec {
    pub name: String,

    /// Fixed transform from the parent link frame to this joint frame.
    pub origin: Isometry3<f64>,

    /// Rotation axis in the joint frame.
    pub axis: Axis,

    /// +1.0 to rotate positively about the axis, -1.0 for the reversed axis.
    pub direction: f64,

    /// Lower rotation limit, radians.
    pub lower: f64,

    /// Upper rotation limit, radians.
    pub upper: f64,
}

impl JointSpec {
    pub fn new(name: &str, origin: Isometry3<f64>, axis: Axis, lower: f64, upper: f64) -> Self {
        JointSpec {
            name: name.to_string(),
            origin,
            axis,
            direction: 1.0,
            lower,
            upper,
        }
    }

    /// Builds the joint from the URDF `<origin xyz=".." rpy=".."/>` notation. Roll, pitch
    /// and yaw are applied about the fixed X, Y and Z axes in this order.
    pub fn from_urdf_origin(name: &str, xyz: [f64; 3], rpy: [f64; 3],
                            axis: Axis, direction: f64, lower: f64, upper: f64) -> Self {
        let origin = Isometry3::from_parts(
            Translation3::new(xyz[0], xyz[1], xyz[2]),
            UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2]),
        );
        JointSpec {
            name: name.to_string(),
            origin,
            axis,
            direction,
            lower,
            upper,
        }
    }

    /// Rotation this joint makes at the given angle.
    pub fn motion(&self, angle: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&self.axis.unit(), self.direction * angle)
    }

    /// Transform from the parent link frame to the child link frame at the given angle.
    pub fn transform(&self, angle: f64) -> Isometry3<f64> {
        self.origin * Isometry3::from_parts(Translation3::identity(), self.motion(angle))
    }
}

/// Geometric description of the six joint arm, ordered base to tip.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainModel {
    joints: [JointSpec; 6],
}

impl ChainModel {
    pub fn new(joints: [JointSpec; 6]) -> Self {
        ChainModel { joints }
    }

    pub fn joints(&self) -> &[JointSpec; 6] {
        &self.joints
    }

    pub fn joint_names(&self) -> Vec<&str> {
        self.joints.iter().map(|j| j.name.as_str()).collect()
    }

    /// End effector pose for the given joint angles. Angles are not clamped to limits.
    pub fn forward(&self, qs: &Joints) -> Pose {
        self.joints.iter().zip(qs.iter())
            .fold(Pose::identity(), |pose, (joint, &q)| pose * joint.transform(q))
    }

    /// Accumulated pose of every joint frame, base to tip. The last element is the
    /// same as `forward`.
    pub fn link_transforms(&self, qs: &Joints) -> LinkPoses {
        let mut poses: LinkPoses = [Pose::identity(); 6];
        let mut pose = Pose::identity();
        for (i, joint) in self.joints.iter().enumerate() {
            pose *= joint.transform(qs[i]);
            poses[i] = pose;
        }
        poses
    }

    /// As `forward` but accepts joint values of unchecked length, as they come from
    /// user interfaces or files.
    pub fn forward_slice(&self, qs: &[f64]) -> Result<Pose, IkError> {
        Ok(self.forward(&joints_from_slice(qs)?))
    }

    /// As `link_transforms` but accepts joint values of unchecked length.
    pub fn link_transforms_slice(&self, qs: &[f64]) -> Result<LinkPoses, IkError> {
        Ok(self.link_transforms(&joints_from_slice(qs)?))
    }
}

impl Kinematics for ChainModel {
    fn forward(&self, qs: &Joints) -> Pose {
        ChainModel::forward(self, qs)
    }

    fn forward_with_joint_poses(&self, qs: &Joints) -> LinkPoses {
        self.link_transforms(qs)
    }

    fn constraints(&self) -> Constraints {
        Constraints::new(
            std::array::from_fn(|i| self.joints[i].lower),
            std::array::from_fn(|i| self.joints[i].upper),
        )
    }
}

/// Checks length and finiteness of joint values.
pub fn joints_from_slice(qs: &[f64]) -> Result<Joints, IkError> {
    let joints: Joints = qs.try_into()
        .map_err(|_| IkError::InvalidLength { expected: 6, found: qs.len() })?;
    if let Some(i) = joints.iter().position(|q| !q.is_finite()) {
        return Err(IkError::NonFinite(format!("joint {} is {}", i + 1, joints[i])));
    }
    Ok(joints)
}
