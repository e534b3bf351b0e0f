//! Subcommands of the `testspec-launch` binary.

use std::{
    io::{self, Write},
    path::Path,
    process::ExitCode,
};

use clap::Subcommand;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    LaunchDescriptor, TestKind, TestScope,
    config::{Config, OutputFormat, resolve_path},
    error::ProducerError,
    translator,
};

/// Words made only of these characters are printed without shell quotes.
static SHELL_SAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_@%+=:,./-]+$").expect("valid shell-safe pattern"));

const INTERPRETER: &str = "python";

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the dotted test spec for a scope
    Spec(ScopeArgs),
    /// Print the launch descriptor for a scope
    Launch(ScopeArgs),
    /// Check whether an existing descriptor launches the same run as a scope
    Check(CheckArgs),
}

/// Arguments describing what to run.
#[derive(clap::Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Scope kind: folder, script, class, method or function
    pub kind: TestKind,

    /// Folder or script containing the tests
    pub path: String,

    /// Test class, for class and method scopes
    #[arg(long = "class")]
    pub class_name: Option<String>,

    /// Test method or function, for method and function scopes
    #[arg(long = "method")]
    pub method_name: Option<String>,
}

impl ScopeArgs {
    /// Build the scope, resolving a relative path against `cwd`.
    pub fn scope(&self, cwd: &Path) -> Result<TestScope, ProducerError> {
        let path = resolve_path(cwd, &self.path).to_string_lossy().to_string();
        TestScope::from_parts(
            self.kind,
            path,
            self.class_name.clone(),
            self.method_name.clone(),
        )
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Existing descriptor as JSON, `-` for stdin
    #[arg(long)]
    pub existing: String,
}

/// How a command ended, short of an error.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Outcome {
    Done,
    /// `check` found the descriptors launch different runs.
    Different,
    /// The scope lies outside the project; nothing was produced.
    Declined,
}

impl Outcome {
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Done => ExitCode::SUCCESS,
            Self::Different => ExitCode::from(1),
            Self::Declined => ExitCode::from(2),
        }
    }
}

/// Exit code for failures other than the outcomes above.
pub const ERROR_EXIT_CODE: u8 = 3;

pub fn handle<W: Write>(
    command: &Command,
    config: &Config,
    cwd: &Path,
    out: &mut W,
) -> Result<Outcome, ProducerError> {
    let root = config.project_root.as_str();
    match command {
        Command::Spec(args) => {
            let scope = args.scope(cwd)?;
            decline_out_of_project(translator::compute_test_spec(&scope, root), |spec| {
                writeln!(out, "{spec}")
            })
        }
        Command::Launch(args) => {
            let scope = args.scope(cwd)?;
            decline_out_of_project(
                translator::build_launch_descriptor(&scope, root),
                |descriptor| writeln!(out, "{}", render(&descriptor, config.format)?),
            )
        }
        Command::Check(args) => {
            let scope = args.scope.scope(cwd)?;
            let existing = read_descriptor(&args.existing, cwd)?;
            if translator::is_equivalent(&existing, &scope, root) {
                writeln!(out, "equivalent")?;
                Ok(Outcome::Done)
            } else {
                writeln!(out, "different")?;
                Ok(Outcome::Different)
            }
        }
    }
}

/// Emit a translation result, turning an out-of-project scope into a
/// declined outcome instead of an error.
fn decline_out_of_project<T>(
    result: Result<T, ProducerError>,
    emit: impl FnOnce(T) -> io::Result<()>,
) -> Result<Outcome, ProducerError> {
    match result {
        Ok(value) => {
            emit(value)?;
            Ok(Outcome::Done)
        }
        Err(e) if e.is_out_of_project() => {
            log::warn!("declining: {e}");
            Ok(Outcome::Declined)
        }
        Err(e) => Err(e),
    }
}

fn read_descriptor(source: &str, cwd: &Path) -> Result<LaunchDescriptor, ProducerError> {
    let content = if source == "-" {
        io::read_to_string(io::stdin())?
    } else {
        std::fs::read_to_string(resolve_path(cwd, source))?
    };
    Ok(serde_json::from_str(&content)?)
}

/// Render a descriptor for printing.
pub fn render(descriptor: &LaunchDescriptor, format: OutputFormat) -> io::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(descriptor)?),
        OutputFormat::Shell => {
            let assignments = descriptor
                .environment
                .iter()
                .map(|(key, value)| format!("{key}={}", shell_quote(value)))
                .collect::<Vec<_>>()
                .join(" ");
            Ok(format!(
                "cd {} && {assignments} {INTERPRETER} {}",
                shell_quote(&descriptor.working_directory),
                shell_quote(&descriptor.script_path)
            ))
        }
        OutputFormat::Env => Ok(descriptor
            .environment
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Quote `word` for a POSIX shell when it contains anything unusual.
fn shell_quote(word: &str) -> String {
    if SHELL_SAFE.is_match(word) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
