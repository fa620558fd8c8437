//! Concurrency primitives for shipmap.
//!
//! - [`TaskScheduler`] runs independent tasks on a fixed-size pool of tokio
//!   workers that drain one shared queue.
//! - [`DependencyTracker`] counts the build steps that still need the original
//!   artifacts and tells the deletion step when none are left.
//!
//! Both are plain values owned by their caller; there is no global state.

pub mod scheduler;
pub mod tracker;

pub use scheduler::{TaskScheduler, DEFAULT_WORKERS};
pub use tracker::{ClearSignal, DependencyGuard, DependencyToken, DependencyTracker};
