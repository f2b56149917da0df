//! Reads the joint chain from URDF (optional). XACRO files also work as long as the
//! joint elements carry numeric values or the simple angle expressions listed in `parse_value`.

extern crate sxd_document;

use std::collections::HashSet;
use std::fs::read_to_string;
use std::path::Path;
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use regex::Regex;
use sxd_document::{dom, parser, QName};
use tracing::debug;
use crate::chain::{Axis, ChainModel, JointSpec};
use crate::parameter_error::ParameterError;
use crate::parameters::ur_kinematics::{FULL_TURN_FROM, FULL_TURN_TO};

/// Reads the chain from URDF or XACRO file.
///
/// # Parameters
/// - `path`: the location of URDF or XACRO file to load from.
/// - `joint_names`: names of the six actuated joints, base to tip. If None, the chain
///   is found by walking from the root link (see `from_urdf`).
///
/// # Example
/// ```
/// use rs_multistart_ik::kinematic_traits::Kinematics;
/// let robot = rs_multistart_ik::urdf::from_urdf_file("src/tests/data/ur3.urdf", &None)
///     .expect("UR3 URDF must load");
/// println!("{:?}", robot.forward(&[0.0; 6]));
/// ```
pub fn from_urdf_file<P: AsRef<Path>>(path: P, joint_names: &Option<[&str; 6]>)
                                      -> Result<ChainModel, ParameterError> {
    let xml_content = read_to_string(path)?;
    from_urdf(xml_content, joint_names)
}

/// Parses URDF XML content into the six joint chain.
///
/// Without explicit names, the chain starts at the root link (the link that is never a child)
/// and follows parent-child relations, preferring the branch with most actuated joints
/// if the tree branches. Fixed joints on the way are folded into the origin of the next
/// actuated joint. The first six revolute or continuous joints form the chain; anything
/// after the sixth is ignored.
///
/// Explicit names are needed when the file describes several robots or the tree is
/// otherwise ambiguous. Named joints are taken as they are, without folding fixed joints.
///
/// ```
/// use rs_multistart_ik::urdf::from_urdf;
/// // Exactly this string would fail. Working URDF fragment would be too long for this example.
/// let xml_data = String::from("<robot><joint ...></joint></robot>");
/// let joints = ["lf_joint_0", "lf_joint_1", "lf_joint_2", "lf_joint_3", "lf_joint_4", "lf_joint_5"];
/// match from_urdf(xml_data, &Some(joints)) {
///     Ok(chain) => println!("Chain {:?}", chain.joint_names()),
///     Err(e) => println!("Error processing URDF: {}", e),
/// }
/// ```
pub fn from_urdf(xml_content: String, joint_names: &Option<[&str; 6]>) -> Result<ChainModel, ParameterError> {
    let joints = process_joints(&xml_content)?;

    let chain = match joint_names {
        Some(names) => named_chain(&joints, names)?,
        None => walk_chain(&joints)?,
    };

    let model = build_chain(&chain)?;
    debug!(joints = ?model.joint_names(), "URDF chain loaded");
    Ok(model)
}

#[derive(Debug, Clone, PartialEq)]
enum JointType {
    Revolute,
    Continuous,
    Fixed,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
struct JointData {
    name: String,
    joint_type: JointType,
    parent: Option<String>,
    child: Option<String>,
    xyz: [f64; 3],
    rpy: [f64; 3],
    axis: [f64; 3],
    limits: Option<(f64, f64)>,
}

impl JointData {
    fn actuated(&self) -> bool {
        matches!(self.joint_type, JointType::Revolute | JointType::Continuous)
    }

    fn origin(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(self.xyz[0], self.xyz[1], self.xyz[2]),
            UnitQuaternion::from_euler_angles(self.rpy[0], self.rpy[1], self.rpy[2]),
        )
    }

    fn to_spec(&self, origin: Isometry3<f64>, index: usize) -> Result<JointSpec, ParameterError> {
        let (axis, direction) = Axis::from_vector(&self.axis)
            .ok_or_else(|| ParameterError::UnsupportedAxis(format!(
                "joint {} rotates about {:?}, only x, y or z axes are supported", self.name, self.axis)))?;

        let (lower, upper) = match (&self.joint_type, self.limits) {
            (JointType::Revolute, Some(limits)) => limits,
            _ => (FULL_TURN_FROM[index], FULL_TURN_TO[index]),
        };
        if !(lower <= upper) {
            return Err(ParameterError::KinematicsConfigurationError(format!(
                "joint {} has lower limit {} above upper limit {}", self.name, lower, upper)));
        }

        let mut spec = JointSpec::new(&self.name, origin, axis, lower, upper);
        spec.direction = direction;
        Ok(spec)
    }
}

fn process_joints(xml: &str) -> Result<Vec<JointData>, ParameterError> {
    let package = parser::parse(xml)
        .map_err(|e| ParameterError::XmlProcessingError(format!("Failed to parse XML: {}", e)))?;
    let document = package.as_document();

    // Access the root element
    let root_element = document.root().children().into_iter()
        .find_map(|e| e.element())
        .ok_or_else(|| ParameterError::XmlProcessingError("No root element found".to_string()))?;

    let mut joints = Vec::new();
    collect_joints(root_element, &mut joints)?;
    Ok(joints)
}

// Recursive function to collect joint data in document order
fn collect_joints(element: dom::Element, joints: &mut Vec<JointData>) -> Result<(), ParameterError> {
    let joint_tag = QName::new("joint");

    for child in element.children().into_iter().filter_map(|e| e.element()) {
        if child.name() == joint_tag {
            joints.push(read_joint(child)?);
        }
        collect_joints(child, joints)?;
    }

    Ok(())
}

fn child_element<'d>(element: dom::Element<'d>, tag: &str) -> Option<dom::Element<'d>> {
    let tag = QName::new(tag);
    element.children().into_iter()
        .find_map(|e| e.element().filter(|el| el.name() == tag))
}

fn read_joint(element: dom::Element) -> Result<JointData, ParameterError> {
    let name = element.attribute("name")
        .map(|attr| attr.value().to_string())
        .unwrap_or_else(|| "Unnamed".to_string());

    let joint_type = match element.attribute("type").map(|attr| attr.value()) {
        Some("revolute") | None => JointType::Revolute,
        Some("continuous") => JointType::Continuous,
        Some("fixed") => JointType::Fixed,
        Some(other) => JointType::Other(other.to_string()),
    };

    let link = |tag: &str| child_element(element, tag)
        .and_then(|e| e.attribute("link"))
        .map(|attr| attr.value().to_string());

    let origin = child_element(element, "origin");
    let xyz = match origin.and_then(|o| o.attribute("xyz")) {
        Some(attr) => parse_triple(attr.value(), &name)?,
        None => [0.0; 3],
    };
    let rpy = match origin.and_then(|o| o.attribute("rpy")) {
        Some(attr) => parse_triple(attr.value(), &name)?,
        None => [0.0; 3],
    };
    // URDF default axis is x
    let axis = match child_element(element, "axis").and_then(|a| a.attribute("xyz")) {
        Some(attr) => parse_triple(attr.value(), &name)?,
        None => [1.0, 0.0, 0.0],
    };
    let limits = child_element(element, "limit").map(get_limits).transpose()?.flatten();

    Ok(JointData {
        parent: link("parent"),
        child: link("child"),
        name,
        joint_type,
        xyz,
        rpy,
        axis,
        limits,
    })
}

fn parse_triple(attr_value: &str, joint: &str) -> Result<[f64; 3], ParameterError> {
    let values: Vec<f64> = attr_value.split_whitespace()
        .map(parse_value)
        .collect::<Result<_, _>>()?;
    values.try_into().map_err(|values: Vec<f64>| ParameterError::ParseError(format!(
        "joint {}: expected three values, found {} in '{}'", joint, values.len(), attr_value)))
}

/// Parses plain numbers (radians for angles) and the xacro expressions
/// `${radians(deg)}`, `${pi}`, `${-pi}`, `${pi/n}`, `${-pi/n}` and `${k*pi}`.
fn parse_value(attr_value: &str) -> Result<f64, ParameterError> {
    let radians = Regex::new(r"^\$\{radians\((-?\d+(\.\d+)?)\)\}$")
        .map_err(|_| ParameterError::ParseError("Invalid regex pattern".to_string()))?;
    let pi_fraction = Regex::new(r"^\$\{\s*(-?)\s*pi\s*(/\s*(\d+(\.\d+)?))?\s*\}$")
        .map_err(|_| ParameterError::ParseError("Invalid regex pattern".to_string()))?;
    let pi_multiple = Regex::new(r"^\$\{\s*(-?\d+(\.\d+)?)\s*\*\s*pi\s*\}$")
        .map_err(|_| ParameterError::ParseError("Invalid regex pattern".to_string()))?;

    let wrong = || ParameterError::WrongAngle(attr_value.to_string());
    let value = attr_value.trim();

    if let Some(caps) = radians.captures(value) {
        let degrees: f64 = caps[1].parse().map_err(|_| wrong())?;
        Ok(degrees.to_radians())
    } else if let Some(caps) = pi_fraction.captures(value) {
        let sign = if &caps[1] == "-" { -1.0 } else { 1.0 };
        let divisor: f64 = match caps.get(3) {
            Some(d) => d.as_str().parse().map_err(|_| wrong())?,
            None => 1.0,
        };
        if divisor == 0.0 {
            return Err(wrong());
        }
        Ok(sign * std::f64::consts::PI / divisor)
    } else if let Some(caps) = pi_multiple.captures(value) {
        let factor: f64 = caps[1].parse().map_err(|_| wrong())?;
        Ok(factor * std::f64::consts::PI)
    } else {
        value.parse().map_err(|_| wrong())
    }
}

/// Limits of the joint, or None if the limit element does not define both bounds
/// (continuous joints only give effort and velocity).
fn get_limits(element: dom::Element) -> Result<Option<(f64, f64)>, ParameterError> {
    match (element.attribute("lower"), element.attribute("upper")) {
        (Some(lower), Some(upper)) => Ok(Some((parse_value(lower.value())?, parse_value(upper.value())?))),
        _ => Ok(None),
    }
}

fn named_chain<'a>(joints: &'a [JointData], names: &[&str; 6]) -> Result<Vec<&'a JointData>, ParameterError> {
    names.iter().map(|name| {
        let joint = joints.iter().find(|j| j.name == *name)
            .ok_or_else(|| ParameterError::MissingField(format!("joint {} not found", name)))?;
        if !joint.actuated() {
            return Err(ParameterError::KinematicsConfigurationError(format!(
                "joint {} is {:?}, must be revolute or continuous", name, joint.joint_type)));
        }
        Ok(joint)
    }).collect()
}

/// Number of actuated joints on the longest path down from this joint.
fn actuated_below(joint: &JointData, joints: &[JointData], depth: usize) -> usize {
    let own = usize::from(joint.actuated());
    if depth > joints.len() {
        return own;
    }
    let below = joints.iter()
        .filter(|j| j.parent.is_some() && j.parent == joint.child)
        .map(|j| actuated_below(j, joints, depth + 1))
        .max()
        .unwrap_or(0);
    own + below
}

fn walk_chain(joints: &[JointData]) -> Result<Vec<&JointData>, ParameterError> {
    let children: HashSet<&str> = joints.iter().filter_map(|j| j.child.as_deref()).collect();
    let root = joints.iter()
        .filter_map(|j| j.parent.as_deref())
        .find(|parent| !children.contains(parent))
        .ok_or_else(|| ParameterError::KinematicsConfigurationError(
            "no root link found, every parent link is also a child".to_string()))?;

    let mut chain: Vec<&JointData> = Vec::new();
    let mut link = root;
    loop {
        // On ties the joint that comes first in the file wins.
        let next = joints.iter()
            .filter(|j| j.parent.as_deref() == Some(link))
            .rev()
            .max_by_key(|j| actuated_below(j, joints, 0));
        let Some(joint) = next else {
            break;
        };
        chain.push(joint);
        if chain.iter().filter(|j| j.actuated()).count() == 6 || chain.len() > joints.len() {
            break;
        }
        match joint.child.as_deref() {
            Some(child) => link = child,
            None => break,
        }
    }
    Ok(chain)
}

fn build_chain(chain: &[&JointData]) -> Result<ChainModel, ParameterError> {
    let mut pending = Isometry3::identity();
    let mut specs: Vec<JointSpec> = Vec::with_capacity(6);

    for joint in chain {
        let origin = pending * joint.origin();
        match &joint.joint_type {
            JointType::Revolute | JointType::Continuous => {
                specs.push(joint.to_spec(origin, specs.len())?);
                pending = Isometry3::identity();
            }
            JointType::Fixed => pending = origin,
            JointType::Other(kind) => {
                return Err(ParameterError::KinematicsConfigurationError(format!(
                    "joint {} of type {} is not supported, only revolute, continuous and fixed",
                    joint.name, kind)));
            }
        }
    }

    let specs: [JointSpec; 6] = specs.try_into()
        .map_err(|specs: Vec<JointSpec>| ParameterError::InvalidLength { expected: 6, found: specs.len() })?;
    Ok(ChainModel::new(specs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("1.5").unwrap(), 1.5);
        assert_eq!(parse_value("-2").unwrap(), -2.0);
        assert!((parse_value("${radians(90)}").unwrap() - PI / 2.0).abs() < 1e-12);
        assert!((parse_value("${radians(-45.5)}").unwrap() + 45.5_f64.to_radians()).abs() < 1e-12);
        assert!((parse_value("${pi}").unwrap() - PI).abs() < 1e-12);
        assert!((parse_value("${-pi}").unwrap() + PI).abs() < 1e-12);
        assert!((parse_value("${pi/2}").unwrap() - PI / 2.0).abs() < 1e-12);
        assert!((parse_value("${-pi/2}").unwrap() + PI / 2.0).abs() < 1e-12);
        assert!((parse_value("${2*pi}").unwrap() - 2.0 * PI).abs() < 1e-12);
        assert!(matches!(parse_value("${tau}"), Err(ParameterError::WrongAngle(_))));
        assert!(matches!(parse_value("abc"), Err(ParameterError::WrongAngle(_))));
    }

    #[test]
    fn test_process_joints() {
        let xml = r#"
            <robot>
                <joint name="joint2" type="continuous">
                    <origin xyz="4.0 5.0 6.0" rpy="0 ${pi/2} 0"></origin>
                    <axis xyz="0 0 1"/>
                    <limit effort="0" velocity="3.67"/>
                </joint>
                <joint name="joint1" type="revolute">
                    <origin xyz="1.0 2.0 3.0"></origin>
                    <parent link="a"/>
                    <child link="b"/>
                    <axis xyz="0 -1 0"/>
                    <limit lower="-3.14" upper="${radians(180)}" effort="0" velocity="3.67"/>
                </joint>
            </robot>
        "#;

        let joints = process_joints(xml).expect("Failed to process XML joints");
        assert_eq!(joints.len(), 2, "Should have extracted two joints");

        let j2 = &joints[0];
        assert_eq!(j2.name, "joint2");
        assert_eq!(j2.joint_type, JointType::Continuous);
        assert_eq!(j2.xyz, [4.0, 5.0, 6.0]);
        assert!((j2.rpy[1] - PI / 2.0).abs() < 1e-12);
        assert_eq!(j2.limits, None);
        assert_eq!(j2.parent, None);

        let j1 = &joints[1];
        assert_eq!(j1.axis, [0.0, -1.0, 0.0]);
        assert_eq!(j1.parent.as_deref(), Some("a"));
        assert_eq!(j1.child.as_deref(), Some("b"));
        let (lower, upper) = j1.limits.expect("limits given");
        assert_eq!(lower, -3.14);
        assert!((upper - PI).abs() < 1e-12);
    }

    fn joint_xml(name: &str, kind: &str, parent: &str, child: &str, xyz: &str, axis: &str) -> String {
        format!(r#"<joint name="{}" type="{}">
                  <origin xyz="{}" rpy="0 0 0"/>
                  <parent link="{}"/>
                  <child link="{}"/>
                  <axis xyz="{}"/>
                  <limit lower="-2.5" upper="2.5" effort="0" velocity="2.6"/>
                </joint>"#, name, kind, xyz, parent, child, axis)
    }

    #[test]
    fn test_walk_folds_fixed_joints() {
        let xml = format!("<robot>{}</robot>", [
            joint_xml("j1", "revolute", "base", "l1", "0 0 0.3", "0 0 1"),
            // Side branch without actuated joints must not be followed
            joint_xml("sensor_mount", "fixed", "l1", "sensor", "0.5 0 0", "1 0 0"),
            joint_xml("adapter", "fixed", "l1", "l1a", "0 0 0.1", "1 0 0"),
            joint_xml("j2", "revolute", "l1a", "l2", "0 0 0.2", "0 1 0"),
            joint_xml("j3", "revolute", "l2", "l3", "0 0 0.4", "0 -1 0"),
            joint_xml("j4", "continuous", "l3", "l4", "0.1 0 0", "1 0 0"),
            joint_xml("j5", "revolute", "l4", "l5", "0.1 0 0", "0 1 0"),
            joint_xml("j6", "revolute", "l5", "l6", "0.1 0 0", "1 0 0"),
            joint_xml("tip", "fixed", "l6", "tool0", "0.2 0 0", "1 0 0"),
        ].join("\n"));

        let chain = from_urdf(xml, &None).expect("chain must load");
        assert_eq!(chain.joint_names(), vec!["j1", "j2", "j3", "j4", "j5", "j6"]);

        let joints = chain.joints();
        // Adapter folded into j2
        assert!((joints[1].origin.translation.vector.z - 0.3).abs() < 1e-12);
        assert_eq!(joints[2].direction, -1.0);
        assert_eq!(joints[2].axis, Axis::Y);
        // Continuous joint gets the full turn
        assert_eq!(joints[3].lower, -2.0 * PI);
        assert_eq!(joints[4].upper, 2.5);

        // Tip after the sixth joint is not part of the chain
        let tcp = chain.forward(&[0.0; 6]);
        assert!((tcp.translation.vector.x - 0.3).abs() < 1e-12);
        assert!((tcp.translation.vector.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_named_joints_pick_one_of_two_robots() {
        let mut parts = Vec::new();
        for (prefix, height) in [("right", "0.95"), ("left", "0.45")] {
            parts.push(joint_xml(&format!("{}_joint_0", prefix), "revolute",
                                 &format!("{}_base", prefix), &format!("{}_l1", prefix), &format!("0 0 {}", height), "0 0 1"));
            for i in 1..6 {
                parts.push(joint_xml(&format!("{}_joint_{}", prefix, i), "revolute",
                                     &format!("{}_l{}", prefix, i), &format!("{}_l{}", prefix, i + 1), "0.1 0 0", "0 1 0"));
            }
        }
        let xml = format!("<robot>{}</robot>", parts.join("\n"));

        let names = ["left_joint_0", "left_joint_1", "left_joint_2",
            "left_joint_3", "left_joint_4", "left_joint_5"];
        let chain = from_urdf(xml.clone(), &Some(names)).expect("Failed to parse chain");
        assert_eq!(chain.joints()[0].origin.translation.vector.z, 0.45);

        let missing = ["left_joint_0", "left_joint_1", "left_joint_2",
            "left_joint_3", "left_joint_4", "left_joint_9"];
        assert!(matches!(from_urdf(xml, &Some(missing)), Err(ParameterError::MissingField(_))));
    }

    #[test]
    fn test_too_short_chain() {
        let xml = format!("<robot>{}</robot>", [
            joint_xml("j1", "revolute", "base", "l1", "0 0 0.3", "0 0 1"),
            joint_xml("j2", "revolute", "l1", "l2", "0 0 0.2", "0 1 0"),
        ].join("\n"));
        assert!(matches!(from_urdf(xml, &None), Err(ParameterError::InvalidLength { expected: 6, found: 2 })));
    }

    #[test]
    fn test_unsupported_axis_and_type() {
        let diagonal = format!("<robot>{}</robot>",
                               joint_xml("j1", "revolute", "base", "l1", "0 0 0.3", "0 1 1"));
        assert!(matches!(from_urdf(diagonal, &None), Err(ParameterError::UnsupportedAxis(_))));

        let prismatic = format!("<robot>{}</robot>",
                                joint_xml("j1", "prismatic", "base", "l1", "0 0 0.3", "0 0 1"));
        assert!(matches!(from_urdf(prismatic, &None), Err(ParameterError::KinematicsConfigurationError(_))));
    }

    #[test]
    fn test_broken_xml() {
        assert!(matches!(from_urdf("<robot><joint".to_string(), &None),
            Err(ParameterError::XmlProcessingError(_))));
    }
}
