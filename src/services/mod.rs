//! Deployment services: the orchestrator and its convergence waiter.

pub mod convergence_waiter;
pub mod deployer;

pub use convergence_waiter::{ConvergenceWaiter, WaitOutcome};
pub use deployer::Deployer;
