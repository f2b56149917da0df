use std::f64::consts::PI;
use rand::Rng;
use crate::error::IkError;
use crate::kinematic_traits::Joints;

/// Rotation limits of the six joints. Unlike a wrap-around range, the limits are a plain
/// interval: the joint may turn from `from` to `to` through every angle in between,
/// and values like 350 degrees and -10 degrees are different positions of the joint
/// (this matters for robots that can turn more than a full circle).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    /// Lower limit, radians
    pub from: Joints,

    /// Upper limit, radians. Must not be less than the lower limit.
    pub to: Joints,
}

impl Constraints {
    pub fn new(from: Joints, to: Joints) -> Self {
        Constraints { from, to }
    }

    /// Full turn in both directions for every joint.
    pub fn unlimited() -> Self {
        Constraints {
            from: [-2.0 * PI; 6],
            to: [2.0 * PI; 6],
        }
    }

    /// Checks that all limits are finite and not reversed.
    pub fn validate(&self) -> Result<(), IkError> {
        for i in 0..6 {
            if !self.from[i].is_finite() || !self.to[i].is_finite() {
                return Err(IkError::InvalidLimits(format!(
                    "joint {} limits must be finite, got [{}, {}]", i + 1, self.from[i], self.to[i])));
            }
            if self.from[i] > self.to[i] {
                return Err(IkError::InvalidLimits(format!(
                    "joint {} lower limit {} is above upper limit {}", i + 1, self.from[i], self.to[i])));
            }
        }
        Ok(())
    }

    pub fn compliant(&self, angles: &Joints) -> bool {
        (0..6).all(|i| angles[i] >= self.from[i] && angles[i] <= self.to[i])
    }

    /// Projects the angles into the limits, joint by joint.
    pub fn clamp(&self, angles: &Joints) -> Joints {
        std::array::from_fn(|i| angles[i].clamp(self.from[i], self.to[i]))
    }

    pub fn filter(&self, angles: &[Joints]) -> Vec<Joints> {
        angles.iter()
            .filter(|angle_array| self.compliant(angle_array))
            .cloned()
            .collect()
    }

    /// Draws joint values uniformly inside the limits. A joint with equal limits
    /// always gets that single value.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Joints {
        std::array::from_fn(|i| {
            if self.from[i] < self.to[i] {
                rng.gen_range(self.from[i]..=self.to[i])
            } else {
                self.from[i]
            }
        })
    }

    /// Constraints allowing at most `half_width` of deviation from `around` for every joint,
    /// but never leaving these constraints. Useful to ask for solutions of a single branch.
    pub fn narrowed_around(&self, around: &Joints, half_width: f64) -> Constraints {
        let around = self.clamp(around);
        Constraints {
            from: std::array::from_fn(|i| (around[i] - half_width).max(self.from[i])),
            to: std::array::from_fn(|i| (around[i] + half_width).min(self.to[i])),
        }
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_within_limits() {
        let angles = [0.1 * PI, 0.2 * PI, 0.3 * PI, 0.4 * PI, 0.5 * PI, 0.6 * PI];
        let from = [0.0, 0.15 * PI, 0.25 * PI, 0.35 * PI, 0.45 * PI, 0.55 * PI];
        let to = [0.2 * PI, 0.3 * PI, 0.4 * PI, 0.5 * PI, 0.6 * PI, 0.7 * PI];
        let limits = Constraints::new(from, to);
        assert!(limits.compliant(&angles));
    }

    #[test]
    fn test_limits_are_inclusive() {
        let from = [-1.0; 6];
        let to = [1.0; 6];
        let limits = Constraints::new(from, to);
        assert!(limits.compliant(&from));
        assert!(limits.compliant(&to));
    }

    #[test]
    fn test_no_wrap_around() {
        // 1.9 PI is the same direction as -0.1 PI but is outside [-0.5 PI, 0.5 PI]
        let angles = [1.9 * PI, 0.0, 0.0, 0.0, 0.0, 0.0];
        let limits = Constraints::new([-0.5 * PI; 6], [0.5 * PI; 6]);
        assert!(!limits.compliant(&angles));
    }

    #[test]
    fn test_clamp() {
        let limits = Constraints::new([-1.0; 6], [1.0; 6]);
        let clamped = limits.clamp(&[-3.0, -1.0, 0.5, 1.0, 2.0, 0.0]);
        assert_eq!(clamped, [-1.0, -1.0, 0.5, 1.0, 1.0, 0.0]);
        assert!(limits.compliant(&clamped));
    }

    #[test]
    fn test_validate() {
        assert!(Constraints::unlimited().validate().is_ok());
        let mut reversed = Constraints::unlimited();
        reversed.from[2] = 1.0;
        reversed.to[2] = -1.0;
        assert!(matches!(reversed.validate(), Err(IkError::InvalidLimits(_))));
        let mut infinite = Constraints::unlimited();
        infinite.to[0] = f64::INFINITY;
        assert!(matches!(infinite.validate(), Err(IkError::InvalidLimits(_))));
    }

    #[test]
    fn test_sample_inside() {
        let limits = Constraints::new([-0.1, 0.0, 1.0, -PI, 0.5, 0.5],
                                      [0.1, 2.0, 1.5, PI, 0.7, 0.5]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let sample = limits.sample(&mut rng);
            assert!(limits.compliant(&sample), "Sample {:?} outside limits", sample);
            assert_eq!(sample[5], 0.5);
        }
    }

    #[test]
    fn test_narrowed_around() {
        let limits = Constraints::new([-1.0; 6], [1.0; 6]);
        let narrow = limits.narrowed_around(&[0.0, 0.95, -0.95, 0.5, 2.0, 0.0], 0.1);
        assert!((narrow.from[0] + 0.1).abs() < 1e-12);
        assert!((narrow.to[0] - 0.1).abs() < 1e-12);
        assert_eq!(narrow.to[1], 1.0);
        assert_eq!(narrow.from[2], -1.0);
        assert!((narrow.from[4] - 0.9).abs() < 1e-12);
        assert_eq!(narrow.to[4], 1.0);
        assert!(narrow.validate().is_ok());
    }

    #[test]
    fn test_filter_angles() {
        let from = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let to = [PI / 2.0, PI / 2.0, PI / 2.0, PI / 2.0, PI / 2.0, PI / 2.0];
        let angles = vec![
            [PI / 3.0, PI / 4.0, PI / 6.0, PI / 3.0, PI / 4.0, PI / 6.0], // Should be retained
            [PI, 2.0 * PI, PI, PI, PI, PI], // Should be removed
        ];

        let limits = Constraints::new(from, to);
        let filtered_angles = limits.filter(&angles);
        assert_eq!(filtered_angles.len(), 1);
        assert_eq!(filtered_angles[0], [PI / 3.0, PI / 4.0, PI / 6.0, PI / 3.0, PI / 4.0, PI / 6.0]);
    }
}
