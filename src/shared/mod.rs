pub mod invocation;
pub mod signal;
