//! Hardcoded dimensions for a few robots, values from ROS-Industrial `ur_description`

pub mod ur_kinematics {
    use crate::chain::ChainModel;
    use crate::parameters::ur_kinematics::{Parameters, FULL_TURN_FROM, FULL_TURN_TO};

    #[allow(dead_code)]
    impl Parameters {
        pub fn ur3() -> Self {
            Parameters {
                d1: 0.1519,
                shoulder_offset: 0.1198,
                upper_arm_length: 0.24365,
                elbow_offset: -0.0925,
                forearm_length: 0.21325,
                d4: 0.11235,
                d5: 0.08535,
                from: FULL_TURN_FROM,
                to: FULL_TURN_TO,
            }
        }

        pub fn ur5() -> Self {
            Parameters {
                d1: 0.089159,
                shoulder_offset: 0.13585,
                upper_arm_length: 0.425,
                elbow_offset: -0.1197,
                forearm_length: 0.39225,
                d4: 0.10915,
                d5: 0.09465,
                from: FULL_TURN_FROM,
                to: FULL_TURN_TO,
            }
        }

        pub fn ur10() -> Self {
            Parameters {
                d1: 0.1273,
                shoulder_offset: 0.220941,
                upper_arm_length: 0.612,
                elbow_offset: -0.1719,
                forearm_length: 0.5723,
                d4: 0.163941,
                d5: 0.1157,
                from: FULL_TURN_FROM,
                to: FULL_TURN_TO,
            }
        }
    }

    impl ChainModel {
        /// UR3, the reference robot of this crate.
        pub fn ur3() -> Self {
            Parameters::ur3().to_chain()
        }

        pub fn ur5() -> Self {
            Parameters::ur5().to_chain()
        }

        pub fn ur10() -> Self {
            Parameters::ur10().to_chain()
        }
    }
}
