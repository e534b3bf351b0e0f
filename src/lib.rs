//! testspec-launch - rewrite "run test" requests into `tools/load_tests.py`
//! launches selected through the `TEST_SPECS` environment variable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::ProducerError;

pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod producer;
pub mod translator;

/// Runner entry point, relative to the project root.
pub const RUNNER_SCRIPT: &str = "tools/load_tests.py";
/// Environment variable holding the dotted test spec.
pub const TEST_SPECS_VAR: &str = "TEST_SPECS";
/// Environment variable holding the test size category.
pub const MAX_TEST_SIZE_VAR: &str = "MAX_TEST_SIZE";
/// Size category passed to every launch.
pub const MAX_TEST_SIZE: &str = "huge";

// --- Core Types ---

pub type FilePath = String;
pub type Environment = BTreeMap<String, String>;

/// Granularity of a run request.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    Folder,
    Script,
    Class,
    Method,
    Function,
}

impl TestKind {
    #[must_use]
    pub fn requires_class_name(self) -> bool {
        matches!(self, Self::Class | Self::Method)
    }

    #[must_use]
    pub fn requires_method_name(self) -> bool {
        matches!(self, Self::Method | Self::Function)
    }
}

/// What to run. Each variant carries exactly the names its kind needs.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TestScope {
    Folder {
        path: FilePath,
    },
    Script {
        path: FilePath,
    },
    Class {
        path: FilePath,
        class_name: String,
    },
    Method {
        path: FilePath,
        class_name: String,
        method_name: String,
    },
    Function {
        path: FilePath,
        method_name: String,
    },
}

impl TestScope {
    /// Build a scope from loose parts, as a CLI or host would supply them.
    pub fn from_parts(
        kind: TestKind,
        path: FilePath,
        class_name: Option<String>,
        method_name: Option<String>,
    ) -> Result<Self, ProducerError> {
        for (label, name) in [("class", &class_name), ("method", &method_name)] {
            if name.as_deref().is_some_and(str::is_empty) {
                return Err(ProducerError::InvalidScope {
                    kind,
                    reason: format!("empty {label} name"),
                });
            }
        }

        let has_class = class_name.is_some();
        let has_method = method_name.is_some();
        match (kind, class_name, method_name) {
            (TestKind::Folder, None, None) => Ok(Self::Folder { path }),
            (TestKind::Script, None, None) => Ok(Self::Script { path }),
            (TestKind::Class, Some(class_name), None) => Ok(Self::Class { path, class_name }),
            (TestKind::Method, Some(class_name), Some(method_name)) => Ok(Self::Method {
                path,
                class_name,
                method_name,
            }),
            (TestKind::Function, None, Some(method_name)) => {
                Ok(Self::Function { path, method_name })
            }
            _ => Err(ProducerError::InvalidScope {
                kind,
                reason: format!(
                    "expected {}, got {}",
                    describe_names(kind.requires_class_name(), kind.requires_method_name()),
                    describe_names(has_class, has_method)
                ),
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> TestKind {
        match self {
            Self::Folder { .. } => TestKind::Folder,
            Self::Script { .. } => TestKind::Script,
            Self::Class { .. } => TestKind::Class,
            Self::Method { .. } => TestKind::Method,
            Self::Function { .. } => TestKind::Function,
        }
    }

    /// The folder or script the scope lives in.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Folder { path }
            | Self::Script { path }
            | Self::Class { path, .. }
            | Self::Method { path, .. }
            | Self::Function { path, .. } => path,
        }
    }
}

fn describe_names(class: bool, method: bool) -> &'static str {
    match (class, method) {
        (false, false) => "no class or method name",
        (true, false) => "a class name only",
        (false, true) => "a method name only",
        (true, true) => "a class name and a method name",
    }
}

/// Everything needed to start the runner process.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct LaunchDescriptor {
    pub script_path: FilePath,
    pub working_directory: FilePath,
    pub environment: Environment,
    pub test_spec: String,
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn names(kind: TestKind) -> (Option<String>, Option<String>) {
        (
            kind.requires_class_name().then(|| "BTest".to_string()),
            kind.requires_method_name().then(|| "test_x".to_string()),
        )
    }

    #[test]
    fn test_from_parts_accepts_exact_field_sets() {
        for kind in TestKind::iter() {
            let (class_name, method_name) = names(kind);
            let scope =
                TestScope::from_parts(kind, "/repo/a/b_test.py".into(), class_name, method_name)
                    .unwrap();
            assert_eq!(scope.kind(), kind);
            assert_eq!(scope.path(), "/repo/a/b_test.py");
        }
    }

    #[test]
    fn test_from_parts_rejects_partial_field_sets() {
        for kind in TestKind::iter() {
            let (class_name, method_name) = names(kind);
            let flipped = [
                (class_name.clone(), method_name.is_none().then(|| "m".to_string())),
                (class_name.is_none().then(|| "C".to_string()), method_name.clone()),
            ];
            for (class_name, method_name) in flipped {
                let result = TestScope::from_parts(kind, "/repo/x.py".into(), class_name, method_name);
                assert!(
                    matches!(result, Err(ProducerError::InvalidScope { kind: k, .. }) if k == kind),
                    "{kind} accepted a mismatched field set"
                );
            }
        }
    }

    #[test]
    fn test_from_parts_rejects_empty_names() {
        let result = TestScope::from_parts(
            TestKind::Class,
            "/repo/x.py".into(),
            Some(String::new()),
            None,
        );
        assert!(matches!(result, Err(ProducerError::InvalidScope { .. })));
    }

    #[test]
    fn test_kind_parses_case_insensitively() {
        assert_eq!("Method".parse::<TestKind>().unwrap(), TestKind::Method);
        assert_eq!("function".parse::<TestKind>().unwrap(), TestKind::Function);
        assert!("module".parse::<TestKind>().is_err());
        assert_eq!(TestKind::Folder.to_string(), "folder");
    }

    #[test]
    fn test_scope_serializes_with_kind_tag() {
        let scope = TestScope::Method {
            path: "/repo/a/b_test.py".into(),
            class_name: "BTest".into(),
            method_name: "test_x".into(),
        };
        let value = serde_json::to_value(&scope).unwrap();
        assert_eq!(value["kind"], "method");
        assert_eq!(value["class_name"], "BTest");
        let back: TestScope = serde_json::from_value(value).unwrap();
        assert_eq!(back, scope);
    }
}
