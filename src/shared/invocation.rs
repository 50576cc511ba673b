use std::ffi::{OsStr, OsString};

use tokio::process::Command;

/// Interpreter used to run the tunnel script.
#[cfg(windows)]
const PYTHON: &str = "python";
#[cfg(not(windows))]
const PYTHON: &str = "python3";

/// The tunnel script, resolved against the working directory.
const PAGEKITE_SCRIPT: &str = "pagekite.py";

/// The two arguments forwarded to the tunnel program. Neither is validated,
/// not even as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The local port to expose.
    pub local_port: OsString,

    /// The public name, usually `<name>.pagekite.me`.
    pub subdomain: OsString,
}

impl Invocation {
    pub fn new(local_port: impl Into<OsString>, subdomain: impl Into<OsString>) -> Self {
        Self {
            local_port: local_port.into(),
            subdomain: subdomain.into(),
        }
    }

    pub fn public_url(&self) -> String {
        format!("https://{}", self.subdomain.to_string_lossy())
    }

    /// Lines printed before the tunnel program is spawned.
    pub fn status(&self) -> String {
        format!(
            "Starting PageKite tunnel...\n\
             Local port: {}\n\
             Public URL: {}\n\
             Press Ctrl+C to stop\n",
            self.local_port.to_string_lossy(),
            self.public_url(),
        )
    }

    /// Usage text shown when the argument count is wrong.
    pub fn usage(bin: &str) -> String {
        format!(
            "Usage: {bin} <local_port> <subdomain.pagekite.me>\n\
             Example: {bin} 11434 myapp.pagekite.me\n\
             Example: {bin} 8080 blog.pagekite.me\n"
        )
    }
}

/// The external command that performs the tunneling.
///
/// The invocation's port and subdomain are appended after the leading
/// arguments when the command is built.
#[derive(Debug, Clone)]
pub struct TunnelProgram {
    program: OsString,
    args: Vec<OsString>,
}

impl TunnelProgram {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    /// Add a leading argument, placed before the forwarded pair.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub(crate) fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&invocation.local_port)
            .arg(&invocation.subdomain)
            .kill_on_drop(true);
        cmd
    }
}

impl Default for TunnelProgram {
    /// `python3 pagekite.py`, run from the current directory.
    fn default() -> Self {
        TunnelProgram::new(PYTHON).arg(PAGEKITE_SCRIPT)
    }
}
