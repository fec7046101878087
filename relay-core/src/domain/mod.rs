//! Core domain types
//!
//! These types describe a sweep of independent runs: who a run is, which
//! stages it executes, and how it ended. They are shared between the
//! runner (which executes plans) and the CLI (which builds plans and
//! reports results).

pub mod identity;
pub mod plan;
pub mod result;
pub mod stage;
pub mod state;
