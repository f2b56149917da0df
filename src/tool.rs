//! Provides tool and base for the robot.
//! Both Tool and Base take arbitrary implementation of Kinematics and are such
//! implementations themselves. Hence, they can be cascaded, like base, having the robot,
//! that robot having a tool, and the solver works with the tool center point directly:
//! ```
//! use std::sync::Arc;
//! use nalgebra::{Isometry3, Translation3, UnitQuaternion};
//! use rs_multistart_ik::chain::ChainModel;
//! use rs_multistart_ik::kinematic_traits::{Joints, Kinematics, Pose};
//! let robot_alone = ChainModel::ur3();
//!
//! // Half meter high pedestal
//! let pedestal = 0.5;
//! let base_translation = Isometry3::from_parts(
//!   Translation3::new(0.0, 0.0, pedestal).into(),
//!   UnitQuaternion::identity(),
//! );
//!
//! let robot_with_base = rs_multistart_ik::tool::Base {
//!   robot: Arc::new(robot_alone),
//!   base: base_translation,
//! };
//!
//! // Gripper extends 15 cm along the flange axis (y of the UR wrist 3 frame)
//! let gripper = 0.15;
//! let tool_translation = Isometry3::from_parts(
//!   Translation3::new(0.0, gripper, 0.0).into(),
//!   UnitQuaternion::identity(),
//! );
//!
//! let robot_complete = rs_multistart_ik::tool::Tool {
//!   robot: Arc::new(robot_with_base),
//!   tool: tool_translation,
//! };
//!
//! let joints: Joints = [0.0, -1.2, 1.0, 0.3, 0.0, 0.5]; // Joints are alias of [f64; 6]
//! let tcp_pose: Pose = robot_complete.forward(&joints);
//! println!("The gripper tip is at: {:?}", tcp_pose);
//! ```

extern crate nalgebra as na;

use std::sync::Arc;
use na::Isometry3;
use crate::constraints::Constraints;
use crate::kinematic_traits::{Joints, Kinematics, LinkPoses, Pose};

/// Defines the fixed tool that can be attached to the last joint (joint 6) of robot.
/// The tool moves with the robot, providing additional translation and, if needed,
/// rotation. Solving inverse kinematics for the Tool solves for the tool center point.
#[derive(Clone)]
pub struct Tool {
    pub robot: Arc<dyn Kinematics>,  // The robot

    /// Transformation from the robot's tip joint to the tool's TCP.
    pub tool: Isometry3<f64>,
}

/// Defines the fixed base that can hold the robot.
/// The base moves the robot to its installed location, providing also rotation if
/// required (physical robots work well and may be installed upside down, or at some
/// angle like 45 degrees).
#[derive(Clone)]
pub struct Base {
    pub robot: Arc<dyn Kinematics>,  // The robot

    /// Transformation from the world origin to the robots base.
    pub base: Isometry3<f64>,
}

impl Kinematics for Tool {
    fn forward(&self, qs: &Joints) -> Pose {
        self.robot.forward(qs) * self.tool
    }

    /// Joint frames are not affected by the tool, only the last pose is the tool center point.
    fn forward_with_joint_poses(&self, qs: &Joints) -> LinkPoses {
        let mut poses = self.robot.forward_with_joint_poses(qs);
        poses[5] *= self.tool;
        poses
    }

    fn constraints(&self) -> Constraints {
        self.robot.constraints()
    }
}

impl Kinematics for Base {
    fn forward(&self, qs: &Joints) -> Pose {
        self.base * self.robot.forward(qs)
    }

    fn forward_with_joint_poses(&self, qs: &Joints) -> LinkPoses {
        self.robot.forward_with_joint_poses(qs).map(|pose| self.base * pose)
    }

    fn constraints(&self) -> Constraints {
        self.robot.constraints()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion};
    use crate::chain::ChainModel;

    /// Asserts that two `Translation3<f64>` instances are approximately equal within a given tolerance.
    pub(crate) fn assert_diff(a: &Translation3<f64>, b: &Translation3<f64>, expected_diff: [f64; 3], epsilon: f64) {
        let actual_diff = a.vector - b.vector;

        assert!(
            (actual_diff.x - expected_diff[0]).abs() <= epsilon,
            "X difference is not as expected: actual difference = {}, expected difference = {}",
            actual_diff.x, expected_diff[0]
        );
        assert!(
            (actual_diff.y - expected_diff[1]).abs() <= epsilon,
            "Y difference is not as expected: actual difference = {}, expected difference = {}",
            actual_diff.y, expected_diff[1]
        );
        assert!(
            (actual_diff.z - expected_diff[2]).abs() <= epsilon,
            "Z difference is not as expected: actual difference = {}, expected difference = {}",
            actual_diff.z, expected_diff[2]
        );
    }

    fn diff(robot_without: &dyn Kinematics, robot_with: &dyn Kinematics, joints: &[f64; 6]) -> (Pose, Pose) {
        let tcp_without_tool = robot_without.forward(joints);
        let tcp_with_tool = robot_with.forward(joints);
        (tcp_without_tool, tcp_with_tool)
    }

    fn translation(x: f64, y: f64, z: f64) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
    }

    #[test]
    fn test_tool() {
        let robot_without_tool = ChainModel::ur3();

        // Tool extends 0.1 m along the flange axis, y of the wrist 3 frame
        let robot_with_tool = Tool {
            robot: Arc::new(robot_without_tool.clone()),
            tool: translation(0.0, 0.1, 0.0),
        };

        // At zero the flange axis of UR3 points along world y
        let joints = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let (tcp_without_tool, tcp_with_tool) = diff(&robot_without_tool, &robot_with_tool, &joints);
        assert_diff(&tcp_with_tool.translation, &tcp_without_tool.translation, [0., 0.1, 0.], 1E-9);

        // Rotating J6 turns about the tool axis, offset stays
        let joints = [0.0, 0.0, 0.0, 0.0, 0.0, PI / 6.0];
        let (tcp_without_tool, tcp_with_tool) = diff(&robot_without_tool, &robot_with_tool, &joints);
        assert_diff(&tcp_with_tool.translation, &tcp_without_tool.translation, [0., 0.1, 0.], 1E-9);

        // Rotating base joint 90 degrees brings the tool axis to -x
        let joints = [PI / 2.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let (tcp_without_tool, tcp_with_tool) = diff(&robot_without_tool, &robot_with_tool, &joints);
        assert_diff(&tcp_with_tool.translation, &tcp_without_tool.translation, [-0.1, 0.0, 0.], 1E-9);
    }

    #[test]
    fn test_base() {
        let robot_without_base = ChainModel::ur3();

        // 1 meter high pedestal
        let robot_with_base = Base {
            robot: Arc::new(robot_without_base.clone()),
            base: translation(0.0, 0.0, 1.0),
        };

        let joints = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let (tcp_without_base, tcp_with_base) = diff(&robot_without_base, &robot_with_base, &joints);
        assert_diff(&tcp_with_base.translation, &tcp_without_base.translation, [0., 0., 1.], 1E-9);

        // Rotate base joint around, the offset does not change.
        let joints = [PI / 3.0, -0.5, 0.7, 0.0, PI / 2.0, 0.0];
        let (tcp_without_base, tcp_with_base) = diff(&robot_without_base, &robot_with_base, &joints);
        assert_diff(&tcp_with_base.translation, &tcp_without_base.translation, [0.0, 0.0, 1.0], 1E-9);
    }

    #[test]
    fn test_joint_poses_through_base_and_tool() {
        let robot = ChainModel::ur3();
        let complete = Tool {
            robot: Arc::new(Base {
                robot: Arc::new(robot.clone()),
                base: translation(0.3, 0.0, 0.2),
            }),
            tool: translation(0.0, 0.0, 0.05),
        };

        let joints = [0.2, -0.4, 0.9, -0.3, 0.5, 0.1];
        let alone = robot.forward_with_joint_poses(&joints);
        let poses = complete.forward_with_joint_poses(&joints);

        for i in 0..5 {
            assert_diff(&poses[i].translation, &alone[i].translation, [0.3, 0.0, 0.2], 1E-9);
        }
        let tcp = complete.forward(&joints);
        assert!((poses[5].translation.vector - tcp.translation.vector).norm() < 1E-12);
        assert_eq!(complete.constraints(), robot.constraints());
    }
}
