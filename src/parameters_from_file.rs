//! Reads solver options from YAML file (optional)

use std::path::Path;
use tracing::debug;
use yaml_rust2::{Yaml, YamlLoader};
use crate::parameter_error::ParameterError;
use crate::solver::SolverOptions;

impl SolverOptions {
    /// Read the solver options from YAML file. Every field can be given, missing ones keep
    /// their defaults. The fields may be at the top level or under `ik_solver`:
    /// ```yaml
    /// ik_solver:
    ///   random_seeds: 64
    ///   random_seed: 7
    ///   position_tolerance: 1.0e-7
    ///   max_damping: 1000000
    ///   parallel: false
    /// ```
    /// Integers are accepted where reals are expected. Unknown keys are ignored.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// As `from_yaml_file`, from the YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let docs = YamlLoader::load_from_str(contents)
            .map_err(|e| ParameterError::ParseError(e.to_string()))?;

        let mut options = SolverOptions::default();
        let Some(doc) = docs.first() else {
            return Ok(options);
        };
        let section = match &doc["ik_solver"] {
            Yaml::BadValue => doc,
            section => section,
        };
        let hash = match section {
            Yaml::Hash(hash) => hash,
            Yaml::Null => return Ok(options),
            other => return Err(ParameterError::ParseError(
                format!("expected mapping of solver options, found {:?}", other))),
        };

        for (key, value) in hash.iter() {
            let Some(key) = key.as_str() else {
                continue;
            };
            match key {
                "predefined_seeds" => options.predefined_seeds = read_count(key, value)?,
                "random_seeds" => options.random_seeds = read_count(key, value)?,
                "random_seed" => options.random_seed = read_count(key, value)? as u64,
                "max_iterations" => options.max_iterations = read_count(key, value)?,
                "position_tolerance" => options.position_tolerance = read_real(key, value)?,
                "orientation_tolerance" => options.orientation_tolerance = read_real(key, value)?,
                "jacobian_epsilon" => options.jacobian_epsilon = read_real(key, value)?,
                "initial_damping" => options.initial_damping = read_real(key, value)?,
                "damping_increase" => options.damping_increase = read_real(key, value)?,
                "damping_decrease" => options.damping_decrease = read_real(key, value)?,
                "min_damping" => options.min_damping = read_real(key, value)?,
                "max_damping" => options.max_damping = read_real(key, value)?,
                "dedup_tolerance" => options.dedup_tolerance = read_real(key, value)?,
                "normalize_angles" => options.normalize_angles = read_bool(key, value)?,
                "parallel" => options.parallel = read_bool(key, value)?,
                _ => debug!(key, "unknown solver option ignored"),
            }
        }

        options.validate().map_err(|e| ParameterError::ParseError(e.to_string()))?;
        Ok(options)
    }

    /// Convert to string yaml representation, readable by `from_yaml_str`.
    pub fn to_yaml(&self) -> String {
        format!(
            "ik_solver:\n  \
              predefined_seeds: {}\n  \
              random_seeds: {}\n  \
              random_seed: {}\n  \
              max_iterations: {}\n  \
              position_tolerance: {:e}\n  \
              orientation_tolerance: {:e}\n  \
              jacobian_epsilon: {:e}\n  \
              initial_damping: {:e}\n  \
              damping_increase: {:e}\n  \
              damping_decrease: {:e}\n  \
              min_damping: {:e}\n  \
              max_damping: {:e}\n  \
              dedup_tolerance: {:e}\n  \
              normalize_angles: {}\n  \
              parallel: {}\n",
            self.predefined_seeds,
            self.random_seeds,
            self.random_seed,
            self.max_iterations,
            self.position_tolerance,
            self.orientation_tolerance,
            self.jacobian_epsilon,
            self.initial_damping,
            self.damping_increase,
            self.damping_decrease,
            self.min_damping,
            self.max_damping,
            self.dedup_tolerance,
            self.normalize_angles,
            self.parallel,
        )
    }
}

fn read_real(key: &str, value: &Yaml) -> Result<f64, ParameterError> {
    match value {
        Yaml::Integer(i) => Ok(*i as f64),
        Yaml::Real(_) => value.as_f64()
            .ok_or_else(|| ParameterError::ParseError(format!("{}: not a number: {:?}", key, value))),
        _ => Err(ParameterError::ParseError(format!("{}: expected number, found {:?}", key, value))),
    }
}

fn read_count(key: &str, value: &Yaml) -> Result<usize, ParameterError> {
    match value {
        Yaml::Integer(i) if *i >= 0 => Ok(*i as usize),
        _ => Err(ParameterError::ParseError(format!(
            "{}: expected non-negative integer, found {:?}", key, value))),
    }
}

fn read_bool(key: &str, value: &Yaml) -> Result<bool, ParameterError> {
    value.as_bool()
        .ok_or_else(|| ParameterError::ParseError(format!("{}: expected true or false, found {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_gives_defaults() {
        assert_eq!(SolverOptions::from_yaml_str("").unwrap(), SolverOptions::default());
        assert_eq!(SolverOptions::from_yaml_str("ik_solver:\n").unwrap(), SolverOptions::default());
    }

    #[test]
    fn test_top_level_keys_and_integers_as_reals() {
        let options = SolverOptions::from_yaml_str(
            "random_seeds: 10\nmax_damping: 1000\ndedup_tolerance: 0.1\nfuture_option: 3\n").unwrap();
        assert_eq!(options.random_seeds, 10);
        assert_eq!(options.max_damping, 1000.0);
        assert_eq!(options.dedup_tolerance, 0.1);
        assert_eq!(options.predefined_seeds, 8);
    }

    #[test]
    fn test_to_yaml_reads_back() {
        let options = SolverOptions {
            random_seeds: 3,
            random_seed: 99,
            position_tolerance: 2.5e-7,
            parallel: false,
            ..SolverOptions::default()
        };
        assert_eq!(SolverOptions::from_yaml_str(&options.to_yaml()).unwrap(), options);
    }

    #[test]
    fn test_invalid_values() {
        for yaml in ["random_seeds: -1", "position_tolerance: fast", "parallel: 3",
            "damping_increase: 0.5", "- 1\n- 2"] {
            assert!(matches!(SolverOptions::from_yaml_str(yaml), Err(ParameterError::ParseError(_))),
                    "{} must be rejected", yaml);
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(SolverOptions::from_yaml_file("src/tests/data/no_such_file.yaml"),
            Err(ParameterError::IoError(_))));
    }
}
