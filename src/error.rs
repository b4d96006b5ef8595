// The miette/thiserror derive macros generate code that triggers false
// positive unused_assignments warnings on enum variant fields.
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Failures that end a workflow.
///
/// External command failures are reported with the exact command line and
/// exit status so the operator can diagnose the underlying tool directly.
#[derive(Debug, Error, Diagnostic)]
pub enum DeployError {
    #[error("{tool} is not available")]
    #[diagnostic(code(stackup::missing_prerequisite))]
    MissingPrerequisite {
        tool: String,
        #[help]
        remedy: String,
    },

    #[error("command `{command}` failed ({})", describe_code(.code))]
    #[diagnostic(code(stackup::command_failed))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("could not launch `{command}`")]
    #[diagnostic(code(stackup::command_spawn))]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no services selected")]
    #[diagnostic(
        code(stackup::no_services),
        help("pick at least one service, or choose a predefined profile")
    )]
    NoServicesSelected,
}

impl DeployError {
    /// Process exit status to use when this error terminates the program.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {code}"),
        None => "terminated by signal".to_string(),
    }
}
