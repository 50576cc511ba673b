use std::io;
use std::process::{ExitCode, ExitStatus};

use thiserror::Error;

/// Terminal failures of a launch. None of these are retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("expected exactly two arguments: <local_port> <subdomain>")]
    Usage,

    #[error("PageKite failed to start: {0}")]
    SpawnFailed(#[source] io::Error),

    #[error("PageKite failed with error: {status}")]
    ChildFailed { status: ExitStatus },

    #[error("lost track of the PageKite process: {0}")]
    Wait(#[source] io::Error),
}

impl LaunchError {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}
