//! Scope to test spec translation.
//!
//! A test spec is the dotted identifier `load_tests.py` reads from
//! `TEST_SPECS`, e.g. `/repo/bigbingo/config_test.py` under `/repo` becomes
//! `bigbingo.config_test`.

use std::path::MAIN_SEPARATOR;

use crate::{
    Environment, LaunchDescriptor, MAX_TEST_SIZE, MAX_TEST_SIZE_VAR, RUNNER_SCRIPT,
    TEST_SPECS_VAR, TestScope, error::ProducerError,
};

const PYTHON_SUFFIX: &str = ".py";

/// Turn an absolute path to a file or directory into a dot-separated path
/// relative to `project_root`.
///
/// Containment is a literal string prefix check on the path.
fn path_spec(path: &str, project_root: &str) -> Result<String, ProducerError> {
    let relative = path
        .strip_prefix(project_root)
        .ok_or_else(|| ProducerError::OutOfProject {
            path: path.to_string(),
            project_root: project_root.to_string(),
        })?;
    let relative = relative.strip_prefix(MAIN_SEPARATOR).unwrap_or(relative);
    let relative = relative.strip_suffix(PYTHON_SUFFIX).unwrap_or(relative);
    Ok(relative.replace(MAIN_SEPARATOR, "."))
}

/// Compute the dotted test spec for `scope`.
pub fn compute_test_spec(scope: &TestScope, project_root: &str) -> Result<String, ProducerError> {
    let base = path_spec(scope.path(), project_root)?;
    let spec = match scope {
        TestScope::Folder { .. } | TestScope::Script { .. } => base,
        TestScope::Class { class_name, .. } => format!("{base}.{class_name}"),
        TestScope::Method {
            class_name,
            method_name,
            ..
        } => format!("{base}.{class_name}.{method_name}"),
        TestScope::Function { method_name, .. } => format!("{base}.{method_name}"),
    };
    log::debug!("{} {} -> {spec}", scope.kind(), scope.path());
    Ok(spec)
}

/// Assemble the runner launch for `scope`.
pub fn build_launch_descriptor(
    scope: &TestScope,
    project_root: &str,
) -> Result<LaunchDescriptor, ProducerError> {
    let test_spec = compute_test_spec(scope, project_root)?;
    let environment = Environment::from([
        (TEST_SPECS_VAR.to_string(), test_spec.clone()),
        (MAX_TEST_SIZE_VAR.to_string(), MAX_TEST_SIZE.to_string()),
    ]);
    Ok(LaunchDescriptor {
        script_path: format!("{project_root}/{RUNNER_SCRIPT}"),
        working_directory: project_root.to_string(),
        environment,
        test_spec,
    })
}

/// Whether `existing` launches the same process `scope` would.
///
/// Only the script path and the environment are compared; the stored spec
/// and working directory are ignored.
#[must_use]
pub fn is_equivalent(existing: &LaunchDescriptor, scope: &TestScope, project_root: &str) -> bool {
    match build_launch_descriptor(scope, project_root) {
        Ok(fresh) => {
            existing.script_path == fresh.script_path && existing.environment == fresh.environment
        }
        Err(e) => {
            log::debug!("not equivalent: {e}");
            false
        }
    }
}
