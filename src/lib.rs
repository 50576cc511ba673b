//! Launch the PageKite tunnel script as a supervised child process.

mod clients;
mod error;
mod shared;

pub use clients::launcher::{Launcher, Outcome};
pub use error::LaunchError;
pub use shared::invocation::{Invocation, TunnelProgram};
pub use shared::signal::interrupted;
