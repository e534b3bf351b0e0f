//! Run configuration producer.
//!
//! Hosts call a [`RunConfigurationProducer`] whenever the user asks to run
//! tests at some location. [`LoadTestsProducer`] answers by pointing the run
//! at `tools/load_tests.py` instead of the stock unittest runner, since those
//! tests need imports and global state that only the loader sets up.

use serde::{Deserialize, Serialize};

use crate::{LaunchDescriptor, TestScope, translator};

/// Framework name announced to the host while producing configurations.
/// No stock framework has this name, so the host hides its own unittest
/// entry.
pub const FRAMEWORK_NAME: &str = "KAUnittests";

const STOCK_LABEL: &str = "Unittest";
const LABEL: &str = "KA Test";

/// Process-wide "selected test framework" setting owned by the host.
pub trait FrameworkSelector {
    /// Idempotent.
    fn select_framework(&self, name: &str);
}

/// Selector for hosts without a competing framework entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSelector;

impl FrameworkSelector for NoopSelector {
    fn select_framework(&self, name: &str) {
        log::trace!("framework selection ignored: {name}");
    }
}

/// What the host knows about the location the user wants to run.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Default)]
pub struct ConfigurationContext {
    /// Module the location belongs to, if the host resolved one.
    pub module: Option<String>,
    pub project_root: Option<String>,
    /// Scope resolved by the host's test discovery.
    pub scope: Option<TestScope>,
    /// Name the host would give a stock unittest configuration.
    #[serde(default)]
    pub suggested_name: String,
}

/// A configuration handed back to the host.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
pub struct RunConfiguration {
    pub name: String,
    pub name_changed_by_user: bool,
    pub launch: LaunchDescriptor,
}

/// Capability interface a host expects from a configuration producer.
pub trait RunConfigurationProducer {
    /// Whether the producer offers a menu entry at `location`.
    fn is_available(&self, location: &str) -> bool;

    /// Whether `folder` may serve as the root of a folder run.
    fn is_test_folder(&self, folder: &str, project_root: &str) -> bool;

    /// Produce a configuration for `context`, or `None` to let the host fall
    /// back to whatever else handles the request.
    fn setup_configuration_from_context(
        &self,
        context: &ConfigurationContext,
    ) -> Option<RunConfiguration>;

    /// Whether `configuration` already covers `context`, so the host can
    /// reuse it instead of creating a new one.
    fn is_configuration_from_context(
        &self,
        configuration: &RunConfiguration,
        context: &ConfigurationContext,
    ) -> bool;
}

/// Producer launching `tools/load_tests.py` with `TEST_SPECS`.
#[derive(Debug, Default, Clone)]
pub struct LoadTestsProducer<S = NoopSelector> {
    selector: S,
}

impl<S: FrameworkSelector> LoadTestsProducer<S> {
    pub fn new(selector: S) -> Self {
        Self { selector }
    }

    /// The resolved scope and root, once the host has supplied both.
    fn target<'a>(&self, context: &'a ConfigurationContext) -> Option<(&'a TestScope, &'a str)> {
        let scope = context.scope.as_ref()?;
        let project_root = context.project_root.as_deref()?;
        if let TestScope::Folder { path } = scope {
            if !self.is_test_folder(path, project_root) {
                return None;
            }
        }
        Some((scope, project_root))
    }
}

/// Rename a stock unittest label, e.g. `Unittest b_test.BTest` becomes
/// `KA Test b_test.BTest`.
fn relabel(suggested_name: &str) -> String {
    suggested_name.replacen(STOCK_LABEL, LABEL, 1)
}

impl<S: FrameworkSelector> RunConfigurationProducer for LoadTestsProducer<S> {
    fn is_available(&self, _location: &str) -> bool {
        true
    }

    fn is_test_folder(&self, _folder: &str, _project_root: &str) -> bool {
        true
    }

    fn setup_configuration_from_context(
        &self,
        context: &ConfigurationContext,
    ) -> Option<RunConfiguration> {
        if context.module.is_none() {
            return None;
        }
        self.selector.select_framework(FRAMEWORK_NAME);

        let (scope, project_root) = self.target(context)?;
        let launch = match translator::build_launch_descriptor(scope, project_root) {
            Ok(launch) => launch,
            Err(e) => {
                log::debug!("declining configuration: {e}");
                return None;
            }
        };
        log::info!("configured {} for {}", launch.test_spec, scope.path());

        Some(RunConfiguration {
            name: relabel(&context.suggested_name),
            name_changed_by_user: true,
            launch,
        })
    }

    fn is_configuration_from_context(
        &self,
        configuration: &RunConfiguration,
        context: &ConfigurationContext,
    ) -> bool {
        if context.module.is_none() {
            return false;
        }
        self.target(context).is_some_and(|(scope, project_root)| {
            translator::is_equivalent(&configuration.launch, scope, project_root)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct RecordingSelector {
        selected: RefCell<Vec<String>>,
    }

    impl FrameworkSelector for &RecordingSelector {
        fn select_framework(&self, name: &str) {
            self.selected.borrow_mut().push(name.to_string());
        }
    }

    fn context_for(scope: TestScope) -> ConfigurationContext {
        ConfigurationContext {
            module: Some("webapp".into()),
            project_root: Some("/repo".into()),
            scope: Some(scope),
            suggested_name: "Unittest b_test.BTest".into(),
        }
    }

    fn class_scope() -> TestScope {
        TestScope::Class {
            path: "/repo/a/b_test.py".into(),
            class_name: "BTest".into(),
        }
    }

    #[test]
    fn test_always_available() {
        let producer = LoadTestsProducer::<NoopSelector>::default();
        assert!(producer.is_available("/anywhere/at/all.py"));
        assert!(producer.is_test_folder("/repo/not_a_test_dir", "/repo"));
    }

    #[test]
    fn test_setup_produces_relabelled_configuration() {
        let selector = RecordingSelector::default();
        let producer = LoadTestsProducer::new(&selector);

        let configuration = producer
            .setup_configuration_from_context(&context_for(class_scope()))
            .unwrap();

        assert_eq!(configuration.name, "KA Test b_test.BTest");
        assert!(configuration.name_changed_by_user);
        assert_eq!(configuration.launch.test_spec, "a.b_test.BTest");
        assert_eq!(configuration.launch.script_path, "/repo/tools/load_tests.py");
        assert_eq!(*selector.selected.borrow(), vec![FRAMEWORK_NAME.to_string()]);
    }

    #[test]
    fn test_setup_declines_without_module() {
        let selector = RecordingSelector::default();
        let producer = LoadTestsProducer::new(&selector);
        let mut context = context_for(class_scope());
        context.module = None;

        assert!(producer.setup_configuration_from_context(&context).is_none());
        assert!(selector.selected.borrow().is_empty());
    }

    #[test]
    fn test_setup_declines_without_scope_but_still_selects() {
        let selector = RecordingSelector::default();
        let producer = LoadTestsProducer::new(&selector);
        let mut context = context_for(class_scope());
        context.scope = None;

        assert!(producer.setup_configuration_from_context(&context).is_none());
        assert_eq!(selector.selected.borrow().len(), 1);
    }

    #[test]
    fn test_setup_declines_out_of_project() {
        let producer = LoadTestsProducer::<NoopSelector>::default();
        let context = context_for(TestScope::Script {
            path: "/other/x_test.py".into(),
        });
        assert!(producer.setup_configuration_from_context(&context).is_none());
    }

    #[test]
    fn test_setup_accepts_any_folder() {
        let producer = LoadTestsProducer::<NoopSelector>::default();
        let configuration = producer
            .setup_configuration_from_context(&context_for(TestScope::Folder {
                path: "/repo/a/b".into(),
            }))
            .unwrap();
        assert_eq!(configuration.launch.test_spec, "a.b");
    }

    #[test]
    fn test_relabel_replaces_first_occurrence_only() {
        assert_eq!(relabel("Unittest Unittest"), "KA Test Unittest");
        assert_eq!(relabel("tests in a"), "tests in a");
    }

    #[test]
    fn test_is_configuration_from_context() {
        let producer = LoadTestsProducer::<NoopSelector>::default();
        let context = context_for(class_scope());
        let configuration = producer.setup_configuration_from_context(&context).unwrap();

        assert!(producer.is_configuration_from_context(&configuration, &context));

        let other = context_for(TestScope::Method {
            path: "/repo/a/b_test.py".into(),
            class_name: "BTest".into(),
            method_name: "test_x".into(),
        });
        assert!(!producer.is_configuration_from_context(&configuration, &other));

        let mut unresolved = context.clone();
        unresolved.scope = None;
        assert!(!producer.is_configuration_from_context(&configuration, &unresolved));
    }
}
