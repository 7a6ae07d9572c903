//! Build script for bundled rig validation
//!
//! This script runs at compile time and validates every rig JSON file so that
//! a broken hierarchy or an out-of-range joint limit fails the build instead of
//! failing at load time.

// Include the shared constraint limits
#[path = "src/limits.rs"]
mod limits;

use glam::Vec3;
use limits::{check_cone_degrees, check_twist_degrees};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Cone {
    x_positive: Option<f32>,
    x_negative: Option<f32>,
    y_positive: Option<f32>,
    y_negative: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Constraint {
    cone: Cone,
    twist_limit: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RigBone {
    name: String,
    parent: Option<String>,
    position: Vec3,
    constraint: Option<Constraint>,
}

#[derive(Debug, Deserialize)]
struct Rig {
    name: String,
    bones: Vec<RigBone>,
}

/// Validate the bones of a rig, in declaration order
fn validate_bones(bones: &[RigBone]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut declared: HashSet<&str> = HashSet::new();

    for bone in bones {
        if let Some(parent) = &bone.parent {
            if !declared.contains(parent.as_str()) {
                errors.push(format!(
                    "  {}: parent {} is not declared before it",
                    bone.name, parent
                ));
            }
        }
        if !declared.insert(bone.name.as_str()) {
            errors.push(format!("  {}: duplicate bone name", bone.name));
        }
        if !bone.position.is_finite() {
            errors.push(format!("  {}: position is not finite", bone.name));
        }

        let Some(constraint) = &bone.constraint else {
            continue;
        };
        let cone = [
            ("x_positive", constraint.cone.x_positive),
            ("x_negative", constraint.cone.x_negative),
            ("y_positive", constraint.cone.y_positive),
            ("y_negative", constraint.cone.y_negative),
        ];
        for (side, value) in cone {
            if let Some(problem) = value.and_then(check_cone_degrees) {
                errors.push(format!("  {} cone.{}: {}", bone.name, side, problem));
            }
        }
        if let Some(problem) = constraint.twist_limit.and_then(check_twist_degrees) {
            errors.push(format!("  {}: {}", bone.name, problem));
        }
    }

    errors
}

/// Validate a rig file
fn validate_rig_file(path: &Path) -> Result<(), String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let rig: Rig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    let errors = validate_bones(&rig.bones);
    if errors.is_empty() {
        println!(
            "cargo:warning=✓ {} validated ({} bones)",
            rig.name,
            rig.bones.len()
        );
        Ok(())
    } else {
        Err(format!("Rig '{}' is invalid:\n{}", rig.name, errors.join("\n")))
    }
}

fn main() {
    let rig_dir = Path::new("assets/rigs");

    if !rig_dir.exists() {
        println!("cargo:warning=Rig directory not found, skipping validation");
        return;
    }

    // Rerun if shared limits change
    println!("cargo:rerun-if-changed=src/limits.rs");

    let mut has_errors = false;

    if let Ok(entries) = fs::read_dir(rig_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                println!("cargo:rerun-if-changed={}", path.display());

                if let Err(e) = validate_rig_file(&path) {
                    println!("cargo:warning=VALIDATION ERROR: {}", e);
                    has_errors = true;
                }
            }
        }
    }

    if has_errors {
        panic!("Rig validation failed! Fix the bone hierarchy or joint limits in the rig files.");
    }

    println!("cargo:rerun-if-changed={}", rig_dir.display());
}
