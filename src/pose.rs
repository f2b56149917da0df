//! Construction of validated target poses and the 6-vector pose error the solver minimizes.

extern crate nalgebra as na;

use na::{Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3, Vector6};
use crate::error::IkError;
use crate::kinematic_traits::Pose;

/// How far from orthonormal the rotation part of a matrix may be.
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// How far from 1.0 the norm of the pose quaternion may be.
const QUATERNION_NORM_TOLERANCE: f64 = 1e-6;

/// Builds the pose from a 4x4 homogeneous transform. The upper left 3x3 block must be a
/// proper rotation (orthonormal, determinant +1) and the bottom row must be `0 0 0 1`.
pub fn pose_from_matrix(matrix: &Matrix4<f64>) -> Result<Pose, IkError> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(IkError::NonFinite(format!("transform matrix {}", matrix)));
    }
    let bottom = matrix.fixed_view::<1, 4>(3, 0);
    let expected_bottom = [0.0, 0.0, 0.0, 1.0];
    if bottom.iter().zip(expected_bottom.iter()).any(|(a, b)| (a - b).abs() > ORTHONORMAL_TOLERANCE) {
        return Err(IkError::NotARotation(format!("bottom row must be 0 0 0 1, got {}", bottom)));
    }
    let rotation: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
    let position: Vector3<f64> = matrix.fixed_view::<3, 1>(0, 3).into_owned();
    pose_from_parts(&position, &rotation)
}

/// Builds the pose from position and rotation matrix, checking the matrix is a proper rotation.
pub fn pose_from_parts(position: &Vector3<f64>, rotation: &Matrix3<f64>) -> Result<Pose, IkError> {
    if position.iter().chain(rotation.iter()).any(|v| !v.is_finite()) {
        return Err(IkError::NonFinite("position or rotation".to_string()));
    }
    let deviation = (rotation.transpose() * rotation - Matrix3::identity()).norm();
    if deviation > ORTHONORMAL_TOLERANCE {
        return Err(IkError::NotARotation(format!(
            "rotation matrix is not orthonormal (|R^T R - I| = {:.3e})", deviation)));
    }
    let determinant = rotation.determinant();
    if determinant < 0.0 {
        return Err(IkError::NotARotation(format!(
            "rotation matrix is a reflection (det = {:.6})", determinant)));
    }
    let rotation = Rotation3::from_matrix_unchecked(*rotation);
    Ok(Pose::from_parts(
        Translation3::from(*position),
        UnitQuaternion::from_rotation_matrix(&rotation),
    ))
}

/// Checks the pose is usable as a solver target. Isometry built with `new_unchecked`
/// may carry non-unit quaternion, and nothing prevents NaN.
pub fn validate_pose(pose: &Pose) -> Result<(), IkError> {
    let q = pose.rotation.quaternion();
    if pose.translation.vector.iter().any(|v| !v.is_finite()) || q.coords.iter().any(|v| !v.is_finite()) {
        return Err(IkError::NonFinite(format!("pose {}", pose)));
    }
    let norm = q.norm();
    if (norm - 1.0).abs() > QUATERNION_NORM_TOLERANCE {
        return Err(IkError::NotARotation(format!("quaternion norm is {}", norm)));
    }
    Ok(())
}

/// Error of `current` pose relative to `target`: first three components are the position
/// difference, last three are the rotation from current to target as axis times angle.
pub fn pose_error(current: &Pose, target: &Pose) -> Vector6<f64> {
    let dp = target.translation.vector - current.translation.vector;
    let dw = (target.rotation * current.rotation.inverse()).scaled_axis();
    Vector6::new(dp.x, dp.y, dp.z, dw.x, dw.y, dw.z)
}

/// Position part of the pose error, meters.
pub fn position_error(error: &Vector6<f64>) -> f64 {
    error.fixed_rows::<3>(0).norm()
}

/// Orientation part of the pose error, radians.
pub fn orientation_error(error: &Vector6<f64>) -> f64 {
    error.fixed_rows::<3>(3).norm()
}
