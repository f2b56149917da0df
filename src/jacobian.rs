extern crate nalgebra as na;

use na::{Matrix6, Vector3};
use crate::kinematic_traits::{Joints, Kinematics};

/// Function to compute the Jacobian matrix for a given robot and joint configuration
///
/// # Arguments
///
/// * `robot` - A reference to the robot implementing the Kinematics trait
/// * `joints` - A reference to the joint configuration
/// * `epsilon` - A small value used for numerical differentiation
///
/// # Returns
///
/// A 6x6 matrix representing the Jacobian
///
/// Each column corresponds to a joint, and each row corresponds to a degree of freedom
/// of the end-effector: three rows of position change and three rows of rotation
/// (axis times angle), both per radian of the joint. Forward differences are used,
/// so the joint is only perturbed in the positive direction. This is the derivative of
/// the pose, the derivative of the pose error (target minus current) is its negation.
///
/// Seeds of the solver already run in parallel so the columns are computed sequentially.
pub fn compute_jacobian<K: Kinematics + ?Sized>(robot: &K, joints: &Joints, epsilon: f64) -> Matrix6<f64> {
    let mut jacobian = Matrix6::zeros();
    let current_pose = robot.forward(joints);
    let current_position = current_pose.translation.vector;
    let current_orientation = current_pose.rotation;

    for i in 0..6 {
        let mut perturbed_qs = *joints;
        perturbed_qs[i] += epsilon;
        let perturbed_pose = robot.forward(&perturbed_qs);

        let delta_position: Vector3<f64> =
            (perturbed_pose.translation.vector - current_position) / epsilon;
        let delta_orientation: Vector3<f64> =
            (perturbed_pose.rotation * current_orientation.inverse()).scaled_axis() / epsilon;

        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&delta_position);
        jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&delta_orientation);
    }

    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{Isometry3, Translation3, UnitQuaternion};
    use crate::chain::ChainModel;
    use crate::constraints::Constraints;
    use crate::kinematic_traits::{LinkPoses, Pose};

    const EPSILON: f64 = 1e-6;

    /// Example implementation of the Kinematics trait for a single rotary joint robot
    /// When the first joint rotates, it affects the Y-position and the Z-orientation of the end-effector.
    /// The derivative of the Y-position with respect to the first joint should be 1.
    /// The derivative of the Z-orientation with respect to the first joint should be 1.
    /// No other joint affects the end-effector in this simple robot model.
    pub struct SingleRotaryJointRobot;

    impl Kinematics for SingleRotaryJointRobot {
        fn forward(&self, qs: &Joints) -> Pose {
            // Forward kinematics for a single rotary joint robot
            let angle = qs[0];
            let rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, angle);
            let translation = Translation3::new(angle.cos(), angle.sin(), 0.0);
            Isometry3::from_parts(translation, rotation)
        }

        fn forward_with_joint_poses(&self, qs: &Joints) -> LinkPoses {
            [self.forward(qs); 6]
        }

        fn constraints(&self) -> Constraints {
            Constraints::unlimited()
        }
    }

    fn assert_matrix_approx_eq(left: &Matrix6<f64>, right: &Matrix6<f64>, epsilon: f64) {
        for i in 0..6 {
            for j in 0..6 {
                assert!((left[(i, j)] - right[(i, j)]).abs() < epsilon, "left[{0},{1}] = {2} is not approximately equal to right[{0},{1}] = {3}", i, j, left[(i, j)], right[(i, j)]);
            }
        }
    }

    #[test]
    fn test_compute_jacobian() {
        let robot = SingleRotaryJointRobot;
        let joints: Joints = [0.0; 6];
        let jacobian = compute_jacobian(&robot, &joints, EPSILON);
        let mut expected_jacobian = Matrix6::zeros();

        expected_jacobian[(0, 0)] = 0.0; // No effect on X position
        expected_jacobian[(1, 0)] = 1.0; // Y position is affected by the first joint
        expected_jacobian[(2, 0)] = 0.0; // No effect on Z position

        expected_jacobian[(3, 0)] = 0.0; // No effect on X orientation
        expected_jacobian[(4, 0)] = 0.0; // No effect on Y orientation
        expected_jacobian[(5, 0)] = 1.0; // Z orientation is affected by the first joint

        assert_matrix_approx_eq(&jacobian, &expected_jacobian, EPSILON);
    }

    #[test]
    fn test_base_joint_of_ur3() {
        // At zero, the base joint swings the whole arm about the vertical axis:
        // dp/dq1 = z x p, rotation rate is 1 about z
        let robot = ChainModel::ur3();
        let joints: Joints = [0.0; 6];
        let p = robot.forward(&joints).translation.vector;
        let jacobian = compute_jacobian(&robot, &joints, EPSILON);
        assert!((jacobian[(0, 0)] + p.y).abs() < 1e-5);
        assert!((jacobian[(1, 0)] - p.x).abs() < 1e-5);
        assert!(jacobian[(2, 0)].abs() < 1e-5);
        assert!((jacobian[(5, 0)] - 1.0).abs() < 1e-5);
    }
}
