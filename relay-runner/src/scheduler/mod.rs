//! Scheduler layer for the runner
//!
//! This layer hands run plans to a bounded pool of workers and gathers
//! their terminal results. It never touches files or processes itself.

pub mod dispatcher;

pub use dispatcher::{DispatchReport, Dispatcher};
