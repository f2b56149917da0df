//! Defines the dimensions of the Universal Robots style arm

pub mod ur_kinematics {
    use std::f64::consts::{FRAC_PI_2, PI};
    use crate::chain::{Axis, ChainModel, JointSpec};

    /// Dimensions as named in the `ur_description` xacro files. See
    /// [parameters_robots.rs](parameters_robots.rs) for concrete robot models.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Parameters {
        /// Height of the shoulder above the base (shoulder_pan_joint z offset).
        pub d1: f64,

        /// Lateral offset of the shoulder lift joint (y).
        pub shoulder_offset: f64,

        /// Length of the upper arm, shoulder to elbow.
        pub upper_arm_length: f64,

        /// Lateral offset of the elbow joint (y), usually negative.
        pub elbow_offset: f64,

        /// Length of the forearm, elbow to wrist 1.
        pub forearm_length: f64,

        /// Wrist 1 offset; the wrist 1 to wrist 2 distance is `d4 - elbow_offset - shoulder_offset`.
        pub d4: f64,

        /// Wrist 2 to wrist 3 distance.
        pub d5: f64,

        /// Lower joint limits, radians.
        pub from: [f64; 6],

        /// Upper joint limits, radians.
        pub to: [f64; 6],
    }

    impl Parameters {
        /// Distance between wrist 1 and wrist 2 joints along y.
        pub fn wrist_1_length(&self) -> f64 {
            self.d4 - self.elbow_offset - self.shoulder_offset
        }

        /// Builds the joint chain exactly as the URDF generated from `ur.urdf.xacro` does.
        pub fn to_chain(&self) -> ChainModel {
            ChainModel::new([
                JointSpec::from_urdf_origin("shoulder_pan_joint",
                    [0.0, 0.0, self.d1], [0.0, 0.0, 0.0],
                    Axis::Z, 1.0, self.from[0], self.to[0]),
                JointSpec::from_urdf_origin("shoulder_lift_joint",
                    [0.0, self.shoulder_offset, 0.0], [0.0, FRAC_PI_2, 0.0],
                    Axis::Y, 1.0, self.from[1], self.to[1]),
                JointSpec::from_urdf_origin("elbow_joint",
                    [0.0, self.elbow_offset, self.upper_arm_length], [0.0, 0.0, 0.0],
                    Axis::Y, 1.0, self.from[2], self.to[2]),
                JointSpec::from_urdf_origin("wrist_1_joint",
                    [0.0, 0.0, self.forearm_length], [0.0, FRAC_PI_2, 0.0],
                    Axis::Y, 1.0, self.from[3], self.to[3]),
                JointSpec::from_urdf_origin("wrist_2_joint",
                    [0.0, self.wrist_1_length(), 0.0], [0.0, 0.0, 0.0],
                    Axis::Z, 1.0, self.from[4], self.to[4]),
                JointSpec::from_urdf_origin("wrist_3_joint",
                    [0.0, 0.0, self.d5], [0.0, 0.0, 0.0],
                    Axis::Y, 1.0, self.from[5], self.to[5]),
            ])
        }
    }

    /// Full turn both ways, as `ur_description` limits all UR joints.
    pub(crate) const FULL_TURN_FROM: [f64; 6] = [-2.0 * PI; 6];
    pub(crate) const FULL_TURN_TO: [f64; 6] = [2.0 * PI; 6];
}
