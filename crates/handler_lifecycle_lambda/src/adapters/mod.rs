pub mod invocation;
pub mod logging;
