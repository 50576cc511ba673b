use std::env;
use std::ffi::OsString;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use kitewrap::{interrupted, Invocation, LaunchError, Launcher, TunnelProgram};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const BIN_NAME: &str = env!("CARGO_BIN_NAME");

#[derive(Parser, Debug)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// The local port to expose.
    #[clap(value_name = "LOCAL_PORT")]
    local_port: OsString,

    /// The public PageKite name, e.g. myapp.pagekite.me.
    #[clap(value_name = "SUBDOMAIN")]
    subdomain: OsString,
}

impl Args {
    /// Accept exactly two raw arguments, whatever they look like.
    ///
    /// The count is taken before clap sees anything, and the pair is handed
    /// over behind `--` so that flags and escapes are plain values.
    fn from_argv(argv: Vec<OsString>) -> Option<Self> {
        let [bin, local_port, subdomain]: [OsString; 3] = argv.try_into().ok()?;

        match Args::try_parse_from([bin, "--".into(), local_port, subdomain]) {
            Ok(args) => Some(args),
            Err(err) => {
                debug!(kind = ?err.kind(), "rejected arguments");
                None
            }
        }
    }
}

impl From<Args> for Invocation {
    fn from(args: Args) -> Self {
        Invocation::new(args.local_port, args.subdomain)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .try_init()
        .map_err(anyhow::Error::msg)?;

    let Some(args) = Args::from_argv(env::args_os().collect()) else {
        print!("{}", Invocation::usage(BIN_NAME));
        return Ok(LaunchError::Usage.exit_code());
    };

    let interrupt = interrupted().context("unable to listen for interrupts")?;
    let launcher = Launcher::new(TunnelProgram::default(), args.into());
    debug!(invocation = ?launcher.invocation(), "launching");

    let code = match launcher.run(&mut io::stdout(), interrupt).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            println!("{err}");
            err.exit_code()
        }
    };

    Ok(code)
}
